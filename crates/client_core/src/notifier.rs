#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
    Warning,
}

/// Transient user-facing message sink. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, level: NotificationLevel);
}
