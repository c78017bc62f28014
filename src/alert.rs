//! Alert dispatcher — maps active action slots to outbound SMS.
//!
//! A slot triggers when its mailbox value equals the literal `"ON"` —
//! case-sensitive exact match; `"on"`, `"OFF"`, empty, anything else is a
//! no-op. Alerting is level-triggered: a slot that still reads `"ON"` on
//! the next cycle fires again. There is no already-alerted suppression;
//! clearing the flag on the backend is what stops the alarm.

use log::{info, warn};

use crate::mailbox::{CommandMailbox, ACTION_COUNT};
use crate::ports::ModemPort;

/// The one value that triggers an alert.
pub const TRIGGER: &str = "ON";

/// Fixed message body per action slot, 1-based.
const MESSAGES: [&str; ACTION_COUNT] = [
    "EnvNode alert 1: motion threshold exceeded",
    "EnvNode alert 2: contactless temperature out of range",
    "EnvNode alert 3: humidity out of range",
    "EnvNode alert 4: air quality degraded",
    "EnvNode alert 5: manual check requested",
];

pub struct AlertDispatcher {
    number: String,
}

impl AlertDispatcher {
    pub fn new(alert_number: &str) -> Self {
        Self {
            number: alert_number.to_owned(),
        }
    }

    /// Fire one SMS per triggered slot. Each transaction is synchronous
    /// and blocks until the modem confirms or times out; a failed send is
    /// logged and not retried. Returns the number of attempted sends.
    pub fn dispatch(&self, mailbox: &CommandMailbox, modem: &mut impl ModemPort) -> usize {
        let mut fired = 0;
        for index in 1..=ACTION_COUNT {
            if mailbox.value(index) != Some(TRIGGER) {
                continue;
            }
            fired += 1;
            info!("alert: action_{index} is ON, sending SMS");
            match modem.send_sms(&self.number, MESSAGES[index - 1]) {
                Ok(()) => info!("alert: action_{index} SMS delivered"),
                Err(e) => warn!("alert: action_{index} SMS failed: {e}"),
            }
        }
        fired
    }
}
