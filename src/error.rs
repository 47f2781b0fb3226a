use thiserror::Error;
use tracing::{error, warn};

/// Error severity for UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,     // informational, nothing to fix
    Warning,  // recoverable, the feature degrades to inaction
    Error,    // operation failed
    Critical, // requires user action (e.g. grant a permission)
}

/// Failure classes every core operation reports into.
///
/// None of these terminate the process; each one degrades to inaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Accessibility or screen recording not granted
    PermissionDenied,
    /// A click, focused element or geometry match did not resolve
    ResolutionMiss,
    /// Event tap or hot-key registration was refused by the OS
    ResourceExhaustion,
    /// Settings or I/O problems
    Configuration,
}

/// Domain-specific errors for MacTools
#[derive(Error, Debug)]
pub enum MacToolsError {
    #[error("{capability} permission has not been granted")]
    PermissionDenied { capability: &'static str },

    #[error("could not create event tap for {feature}")]
    EventTap { feature: &'static str },

    #[error("hot key registration failed for '{shortcut}': {message}")]
    HotKey { shortcut: String, message: String },

    #[error("accessibility call {call} failed with AXError {code}")]
    Accessibility { call: String, code: i32 },

    #[error("window capture failed: {0}")]
    Capture(String),

    #[error("AppleScript failed: {0}")]
    AppleScript(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings I/O failed for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl MacToolsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::EventTap { .. } | Self::HotKey { .. } => ErrorKind::ResourceExhaustion,
            Self::Accessibility { .. }
            | Self::Capture(_)
            | Self::AppleScript(_) => ErrorKind::ResolutionMiss,
            Self::Config(_) | Self::Json(_) | Self::Io { .. } => ErrorKind::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::PermissionDenied { .. } => ErrorSeverity::Critical,
            Self::EventTap { .. } => ErrorSeverity::Critical,
            Self::HotKey { .. } => ErrorSeverity::Error,
            Self::Accessibility { .. } => ErrorSeverity::Warning,
            Self::Capture(_) => ErrorSeverity::Info,
            Self::AppleScript(_) => ErrorSeverity::Warning,
            Self::Config(_) => ErrorSeverity::Warning,
            Self::Json(_) => ErrorSeverity::Warning,
            Self::Io { .. } => ErrorSeverity::Error,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied { capability } => format!(
                "MacTools needs the {} permission. Grant it in System Settings > Privacy & Security.",
                capability
            ),
            Self::EventTap { feature } => format!(
                "{} could not listen for input. Grant Accessibility access and turn it on again.",
                feature
            ),
            Self::HotKey { shortcut, .. } => {
                format!("The shortcut {} is already in use or reserved", shortcut)
            }
            Self::Accessibility { call, .. } => format!("Window operation {} failed", call),
            Self::Capture(msg) => format!("Could not capture window: {}", msg),
            Self::AppleScript(_) => "System Events did not respond".to_string(),
            Self::Config(msg) => format!("Settings issue: {}", msg),
            Self::Json(e) => format!("Settings file is malformed: {}", e),
            Self::Io { path, .. } => format!("Could not access {}", path),
        }
    }

    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MacToolsError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use mactools::error::ResultExt;
///
/// // Keep running with defaults if the settings file can't be written
/// settings.save(&path).log_err();
///
/// // Log as warning for expected failures
/// let icon = workspace.app_icon(pid).warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

/// Panic in debug mode, log error in release mode.
///
/// Use for "impossible" states that should crash during development
/// but gracefully degrade in production, such as an OS-facing call made
/// off the main thread.
///
/// ```ignore
/// if !is_main_thread() {
///     debug_panic!("AX call {} made off the main thread", call);
/// }
/// ```
#[macro_export]
macro_rules! debug_panic {
    ( $($fmt_arg:tt)* ) => {
        if cfg!(debug_assertions) {
            panic!( $($fmt_arg)* );
        } else {
            tracing::error!("IMPOSSIBLE STATE: {}", format_args!($($fmt_arg)*));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_taxonomy() {
        let denied = MacToolsError::PermissionDenied {
            capability: "Accessibility",
        };
        assert_eq!(denied.kind(), ErrorKind::PermissionDenied);
        assert_eq!(denied.severity(), ErrorSeverity::Critical);

        let tap = MacToolsError::EventTap {
            feature: "Dock click minimizer",
        };
        assert_eq!(tap.kind(), ErrorKind::ResourceExhaustion);

        let miss = MacToolsError::Capture("window closed".to_string());
        assert_eq!(miss.kind(), ErrorKind::ResolutionMiss);
        assert_eq!(miss.severity(), ErrorSeverity::Info);
    }

    #[test]
    fn test_user_message_mentions_shortcut() {
        let err = MacToolsError::HotKey {
            shortcut: "⌘⇧T".to_string(),
            message: "AlreadyRegistered".to_string(),
        };
        assert!(err.user_message().contains("⌘⇧T"));
    }

    #[test]
    fn test_log_err_returns_none_on_error() {
        let result: std::result::Result<u32, &str> = Err("boom");
        assert_eq!(result.log_err(), None);
        let ok: std::result::Result<u32, &str> = Ok(7);
        assert_eq!(ok.warn_on_err(), Some(7));
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<u32, serde_json::Error> = serde_json::from_str("nope");
        let err: MacToolsError = parse.unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
