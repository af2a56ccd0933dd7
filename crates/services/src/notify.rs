/// How prominently a notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// A short user-facing message, e.g. a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
}

impl Notice {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

/// Presentation seam for notices. Implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Forwards notices to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Info => tracing::info!(target: "notice", "{}", notice.message),
            Severity::Error => tracing::warn!(target: "notice", "{}", notice.message),
        }
    }
}
