//! Core-pinned thread spawning for the dual-core ESP32.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread::spawn` creates a
//! FreeRTOS task pinned to a specific CPU core with explicit priority and
//! stack size. On non-ESP targets, falls back to plain thread spawn.
//!
//! EnvNode pins the acquisition loop to the APP core (1) at a higher
//! priority than the dispatch loop on the PRO core (0), so sensor
//! freshness is never starved by a stalled network transaction.
//!
//! # ESP-IDF Threading Model
//!
//! ESP-IDF implements `std::thread` via pthreads, thin wrappers around
//! FreeRTOS tasks. `esp_pthread_set_cfg()` sets thread-local configuration
//! that applies to the *next* `pthread_create()` from the calling thread,
//! so the config→spawn pair must not be interleaved with other thread
//! creation on the same thread.

/// CPU core identifiers for the dual-core ESP32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU) — protocol stacks (Wi-Fi, lwIP) and the dispatch loop.
    Pro = 0,
    /// Core 1 (APP_CPU) — sensor acquisition.
    App = 1,
}

/// Spawn a thread pinned to a specific core with explicit priority and stack.
///
/// The `name` parameter must be a null-terminated string (e.g. `"acq\0"`).
/// On non-ESP targets, ignores `core` and `priority`, using only `stack_kb`.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> std::thread::JoinHandle<()> {
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = priority as i32;
        cfg.stack_size = (stack_kb * 1024) as i32;
        cfg.thread_name = name.as_ptr() as *const _;
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        assert!(
            ret == esp_idf_sys::ESP_OK as i32,
            "esp_pthread_set_cfg failed: {ret}"
        );
    }

    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name,
        core,
        priority,
        stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .spawn(f)
        .expect("spawn_on_core: thread creation failed")
}

/// Simulation fallback — ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> std::thread::JoinHandle<()> {
    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' (sim, no core pinning, stack={}KB)",
        display_name,
        stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
        .expect("spawn_on_core(sim): thread creation failed")
}
