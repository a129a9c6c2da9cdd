//! Notification surface: transient toasts and blocking dialogs.
//!
//! The engine never renders anything itself. Hosts implement [`Notifier`]
//! on top of whatever UI they have.

use std::fmt;

use async_trait::async_trait;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    /// Confirm / cancel.
    Confirm,
    /// Single acknowledge button; the answer is ignored.
    Acknowledge,
}

/// A modal dialog the user must answer before the flow continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub title: String,
    pub message: String,
}

impl Dialog {
    pub fn confirm(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Confirm,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn acknowledge(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Acknowledge,
            title: title.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show_toast(&self, severity: Severity, title: &str, message: Option<&str>);

    /// Show `dialog` and wait for the answer; `true` means confirmed.
    async fn show_blocking_dialog(&self, dialog: Dialog) -> bool;
}

#[cfg(any(test, feature = "test-helpers"))]
pub use recording::{RecordingNotifier, Toast};

#[cfg(any(test, feature = "test-helpers"))]
mod recording {
    use std::sync::{Mutex, MutexGuard, PoisonError};

    use async_trait::async_trait;

    use super::{Dialog, Notifier, Severity};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Toast {
        pub severity: Severity,
        pub title: String,
        pub message: Option<String>,
    }

    #[derive(Debug)]
    struct Log {
        toasts: Vec<Toast>,
        dialogs: Vec<Dialog>,
        confirm: bool,
    }

    /// Records everything shown and answers confirmations with a scripted value.
    #[derive(Debug)]
    pub struct RecordingNotifier {
        log: Mutex<Log>,
    }

    impl Default for RecordingNotifier {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RecordingNotifier {
        /// A notifier that confirms every dialog.
        pub fn new() -> Self {
            Self {
                log: Mutex::new(Log {
                    toasts: Vec::new(),
                    dialogs: Vec::new(),
                    confirm: true,
                }),
            }
        }

        /// A notifier that declines every confirmation.
        pub fn declining() -> Self {
            let notifier = Self::new();
            notifier.set_confirm(false);
            notifier
        }

        fn log(&self) -> MutexGuard<'_, Log> {
            self.log.lock().unwrap_or_else(PoisonError::into_inner)
        }

        pub fn set_confirm(&self, confirm: bool) {
            self.log().confirm = confirm;
        }

        pub fn toasts(&self) -> Vec<Toast> {
            self.log().toasts.clone()
        }

        pub fn dialogs(&self) -> Vec<Dialog> {
            self.log().dialogs.clone()
        }

        pub fn last_toast(&self) -> Option<Toast> {
            self.log().toasts.last().cloned()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn show_toast(&self, severity: Severity, title: &str, message: Option<&str>) {
            self.log().toasts.push(Toast {
                severity,
                title: title.to_string(),
                message: message.map(str::to_string),
            });
        }

        async fn show_blocking_dialog(&self, dialog: Dialog) -> bool {
            let mut log = self.log();
            log.dialogs.push(dialog);
            log.confirm
        }
    }
}
