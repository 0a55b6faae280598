//! Alert dispatcher
//!
//! Applies maintenance-mode suppression and per-kind cooldown before handing
//! a formatted message to the notification transport. The dispatcher is the
//! single owner of the cooldown state; in the running process it lives on
//! the notifier thread and receives requests over a channel.

use crate::alerts::cooldown::CooldownTracker;
use crate::alerts::slack::Notifier;
use crate::config::MaintenanceScope;
use crate::error::NotifyError;
use crate::events::AlertKind;
use chrono::{DateTime, Utc};
use log::info;

/// Decides whether an alert is delivered, suppressed, or fails
pub struct AlertDispatcher {
    cooldown: CooldownTracker,
    maintenance_mode: bool,
    maintenance_scope: MaintenanceScope,
    notifier: Box<dyn Notifier>,
}

impl AlertDispatcher {
    pub fn new(
        cooldown_secs: u64,
        maintenance_mode: bool,
        maintenance_scope: MaintenanceScope,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            cooldown: CooldownTracker::new(cooldown_secs),
            maintenance_mode,
            maintenance_scope,
            notifier,
        }
    }

    /// Dispatch one alert
    ///
    /// Returns `Ok(true)` when the message was delivered, `Ok(false)` when
    /// it was suppressed by maintenance mode or cooldown, and `Err` when the
    /// transport failed. A delivery failure does not advance the cooldown
    /// clock, so the next qualifying event may retry.
    pub fn dispatch(&mut self, kind: AlertKind, message: &str) -> Result<bool, NotifyError> {
        self.dispatch_at(kind, message, Utc::now())
    }

    /// Dispatch one alert at a specific time
    ///
    /// This is primarily used for testing with controlled timestamps.
    pub fn dispatch_at(
        &mut self,
        kind: AlertKind,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, NotifyError> {
        if self.suppressed_by_maintenance(kind) {
            info!("Maintenance mode: suppressed {} alert", kind);
            return Ok(false);
        }

        if !self.cooldown.can_send_at(kind, now) {
            let elapsed = self.cooldown.elapsed_secs(kind, now).unwrap_or(0);
            info!("Cooldown: skipping {} alert (sent {}s ago)", kind, elapsed);
            return Ok(false);
        }

        self.notifier.notify(kind, message)?;
        self.cooldown.record_at(kind, now);
        info!("Delivered {} alert", kind);
        Ok(true)
    }

    fn suppressed_by_maintenance(&self, kind: AlertKind) -> bool {
        if !self.maintenance_mode {
            return false;
        }
        match self.maintenance_scope {
            MaintenanceScope::All => true,
            MaintenanceScope::Failover => kind == AlertKind::Failover,
        }
    }
}
