//! Diagnostics channel for the area pipeline. The manager reports
//! incomplete relations and end-of-pass summaries through [message!];
//! the embedder decides where those lines go by installing a
//! [Messenger] once. Until one is installed, messages are dropped.

use crate::utils::{Error, Result};

use std::sync::OnceLock;

pub trait Messenger: Sync + Send {
    fn message(&self, message: &str);
}

static MESSENGER: OnceLock<Box<dyn Messenger>> = OnceLock::new();

struct SilentMessenger;

impl Messenger for SilentMessenger {
    fn message(&self, _message: &str) {}
}

/// Install the messenger. Only the first call wins; later calls fail.
pub fn set_messenger(messenger: Box<dyn Messenger>) -> Result<()> {
    MESSENGER
        .set(messenger)
        .map_err(|_| Error::Other(String::from("messenger already set")))
}

pub fn messenger() -> &'static dyn Messenger {
    static SILENT: SilentMessenger = SilentMessenger;
    match MESSENGER.get() {
        Some(m) => m.as_ref(),
        None => &SILENT,
    }
}

/// Messenger printing each diagnostic line to stdout.
pub struct StdoutMessenger;

impl Messenger for StdoutMessenger {
    fn message(&self, message: &str) {
        for l in message.split('\n') {
            println!("osmareas: {}", l);
        }
    }
}

pub fn register_stdout_messenger() -> Result<()> {
    set_messenger(Box::new(StdoutMessenger))
}

/// Format a diagnostic and hand it to the installed [Messenger].
#[macro_export]
macro_rules! message {
    ($($arg:tt)*) => {
        $crate::logging::messenger().message(&format!($($arg)*))
    };
}
