//! Low-supply alert delivery.
//!
//! A failed notification never undoes the dose that triggered it; the
//! failure is logged and reported through the return value only.

use crate::{LowSupply, Result};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Notification channel offered by the host
pub trait AlertChannel {
    fn notify(&mut self, alert: &LowSupply) -> Result<()>;
}

/// Deliver an alert, swallowing channel failures.
///
/// Returns whether the channel accepted the alert.
pub fn dispatch(channel: &mut dyn AlertChannel, alert: &LowSupply) -> bool {
    tracing::info!(
        "Low supply: {} has {} remaining",
        alert.name,
        alert.remaining
    );
    match channel.notify(alert) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to deliver low-supply alert for {}: {}", alert.name, e);
            false
        }
    }
}

/// Prints alerts to a terminal or any other writer
pub struct ConsoleAlerts<W> {
    out: W,
}

impl ConsoleAlerts<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> ConsoleAlerts<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> AlertChannel for ConsoleAlerts<W> {
    fn notify(&mut self, alert: &LowSupply) -> Result<()> {
        writeln!(self.out, "⚠ {}: {}", LowSupply::TITLE, alert.message())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Queues alerts for the host UI to show as an in-app message.
///
/// Clones share one queue.
#[derive(Clone, Debug, Default)]
pub struct InAppAlerts {
    pending: Rc<RefCell<Vec<LowSupply>>>,
}

impl InAppAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain alerts not yet shown
    pub fn take_pending(&self) -> Vec<LowSupply> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }
}

impl AlertChannel for InAppAlerts {
    fn notify(&mut self, alert: &LowSupply) -> Result<()> {
        self.pending.borrow_mut().push(alert.clone());
        Ok(())
    }
}

/// Tries the primary channel, falling back when it errors
pub struct FallbackAlerts<P, F> {
    primary: P,
    fallback: F,
}

impl<P: AlertChannel, F: AlertChannel> FallbackAlerts<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: AlertChannel, F: AlertChannel> AlertChannel for FallbackAlerts<P, F> {
    fn notify(&mut self, alert: &LowSupply) -> Result<()> {
        match self.primary.notify(alert) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::debug!("Primary alert channel failed ({}), using fallback", e);
                self.fallback.notify(alert)
            }
        }
    }
}
