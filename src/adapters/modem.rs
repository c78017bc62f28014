//! GSM modem adapter (SIM800-class, AT command set in text mode).
//!
//! Implements [`ModemPort`].
//!
//! The AT exchange is the same on every target; only the byte transport
//! differs, so the serial line sits behind the small [`SerialLink`]
//! trait. On `espidf` that is the UART driver set up by
//! [`crate::drivers::hw_init`]; on the host it is a scripted link used
//! by the tests.
//!
//! One SMS is four phases, each "send a line, collect bytes until the
//! expected token shows up or the phase budget runs out":
//!
//! | send                  | expect    | failure maps to            |
//! |-----------------------|-----------|----------------------------|
//! | `AT`                  | `OK`      | [`ModemError::Handshake`]  |
//! | `AT+CMGF=1`           | `OK`      | [`ModemError::TextMode`]   |
//! | `AT+CMGS="<number>"`  | `>`       | [`ModemError::Prompt`]     |
//! | body + `Ctrl-Z`       | `+CMGS:`  | [`ModemError::Delivery`]   |

use std::time::{Duration, Instant};

use log::{debug, info};

use crate::ports::ModemPort;
use crate::ModemError;

/// SMS message submit terminator (Ctrl-Z).
const CTRL_Z: u8 = 0x1A;

/// Cap on accumulated modem response bytes per phase.
const RESPONSE_CAP: usize = 256;

/// Byte-level serial line to the modem.
pub trait SerialLink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ModemError>;

    /// Read whatever is pending, waiting at most `timeout_ms` for the
    /// first byte. Returns the number of bytes placed in `buf`; zero
    /// means the wait timed out.
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, ModemError>;
}

pub struct Sim800Adapter<L: SerialLink> {
    link: L,
    phase_timeout_ms: u32,
}

impl<L: SerialLink> Sim800Adapter<L> {
    pub fn new(link: L, phase_timeout_ms: u32) -> Self {
        Self {
            link,
            phase_timeout_ms,
        }
    }

    /// Send `command` (CR-LF terminated unless `raw`), then collect the
    /// response until `expect` appears. `err` is the phase's failure.
    fn exchange(
        &mut self,
        command: &[u8],
        raw: bool,
        expect: &str,
        err: ModemError,
    ) -> Result<(), ModemError> {
        self.link.write(command)?;
        if !raw {
            self.link.write(b"\r\n")?;
        }

        let deadline = Instant::now() + Duration::from_millis(u64::from(self.phase_timeout_ms));
        let mut response: heapless::Vec<u8, RESPONSE_CAP> = heapless::Vec::new();
        let mut chunk = [0u8; 64];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!(
                    "modem: timed out waiting for {expect:?}, got {:?}",
                    String::from_utf8_lossy(&response)
                );
                return Err(err);
            }

            let n = self
                .link
                .read(&mut chunk, remaining.as_millis().min(u128::from(u32::MAX)) as u32)?;
            for &b in &chunk[..n] {
                // A full buffer without the token counts as a failure,
                // same as a timeout.
                if response.push(b).is_err() {
                    return Err(err);
                }
            }

            if String::from_utf8_lossy(&response).contains(expect) {
                return Ok(());
            }
        }
    }
}

impl<L: SerialLink> ModemPort for Sim800Adapter<L> {
    fn send_sms(&mut self, number: &str, body: &str) -> Result<(), ModemError> {
        self.exchange(b"AT", false, "OK", ModemError::Handshake)?;
        self.exchange(b"AT+CMGF=1", false, "OK", ModemError::TextMode)?;

        let submit = format!("AT+CMGS=\"{number}\"");
        self.exchange(submit.as_bytes(), false, ">", ModemError::Prompt)?;

        let mut payload = body.as_bytes().to_vec();
        payload.push(CTRL_Z);
        self.exchange(&payload, true, "+CMGS:", ModemError::Delivery)?;

        info!("modem: SMS accepted for {number}");
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Platform links
// ───────────────────────────────────────────────────────────────

/// UART link over the driver installed at boot.
#[cfg(target_os = "espidf")]
pub struct UartLink {
    port: i32,
}

#[cfg(target_os = "espidf")]
impl UartLink {
    pub fn new(port: i32) -> Self {
        Self { port }
    }
}

#[cfg(target_os = "espidf")]
impl SerialLink for UartLink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ModemError> {
        use esp_idf_svc::sys::uart_write_bytes;

        let written = unsafe {
            uart_write_bytes(self.port, bytes.as_ptr().cast(), bytes.len())
        };
        if written < 0 || written as usize != bytes.len() {
            return Err(ModemError::Io);
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, ModemError> {
        use esp_idf_svc::sys::{uart_read_bytes, TickType_t};

        let ticks: TickType_t = timeout_ms / 10; // portTICK_PERIOD_MS with 100 Hz tick
        let n = unsafe {
            uart_read_bytes(self.port, buf.as_mut_ptr().cast(), buf.len() as u32, ticks)
        };
        if n < 0 {
            return Err(ModemError::Io);
        }
        Ok(n as usize)
    }
}

/// Scripted link for host tests: every `write` is recorded, reads are
/// served from a queue of canned responses (one per exchange).
#[cfg(not(target_os = "espidf"))]
pub struct ScriptedLink {
    pub written: Vec<Vec<u8>>,
    responses: std::collections::VecDeque<Vec<u8>>,
}

#[cfg(not(target_os = "espidf"))]
impl ScriptedLink {
    pub fn new(responses: &[&str]) -> Self {
        Self {
            written: Vec::new(),
            responses: responses.iter().map(|r| r.as_bytes().to_vec()).collect(),
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl SerialLink for ScriptedLink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ModemError> {
        self.written.push(bytes.to_vec());
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, ModemError> {
        match self.responses.front_mut() {
            Some(next) => {
                let n = next.len().min(buf.len());
                buf[..n].copy_from_slice(&next[..n]);
                next.drain(..n);
                if next.is_empty() {
                    self.responses.pop_front();
                }
                Ok(n)
            }
            // Queue exhausted: behave like a silent modem.
            None => Ok(0),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
