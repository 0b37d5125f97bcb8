use eduhub_types::events::{Notification, NotificationLevel};
use tracing::{error, info};

/// Where user-facing toasts go. The UI layer supplies its own sink.
pub trait Toasts: Send + Sync {
    fn show(&self, notification: Notification);
}

/// Writes toasts to the log, for headless clients.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogToasts;

impl Toasts for LogToasts {
    fn show(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => error!(target: "eduhub::toast", "{}", notification.message),
            _ => info!(target: "eduhub::toast", "{}", notification.message),
        }
    }
}
