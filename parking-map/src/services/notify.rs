/// Notification permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Default,
    Granted,
    Denied,
    Unsupported,
}

/// Best-effort user notifications.
///
/// `alert` is the in-context fallback and must always reach the user.
pub trait Notifier: Send + Sync {
    fn permission(&self) -> Permission;
    fn request_permission(&self) -> Permission;
    fn notify(&self, title: &str, body: &str);
    fn alert(&self, message: &str);
}

/// Notifier for headless runs: everything goes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn permission(&self) -> Permission {
        Permission::Unsupported
    }

    fn request_permission(&self) -> Permission {
        Permission::Unsupported
    }

    fn notify(&self, title: &str, body: &str) {
        tracing::info!(title, body, "notification");
    }

    fn alert(&self, message: &str) {
        tracing::warn!(message, "alert");
    }
}
