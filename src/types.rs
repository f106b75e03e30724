//! Configuration types.

/// What an implicit release (drop) does when the release policy fails.
///
/// Drop cannot return an error, so the failure is either reported through
/// `tracing`, swallowed, or treated as fatal. Use
/// [`OwningHandle::close`](crate::OwningHandle::close) to receive the error
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropFailure {
    /// Emit an `error` event and continue.
    #[default]
    Log,
    /// Discard the error silently.
    Ignore,
    /// Abort the process.
    Abort,
}

impl DropFailure {
    /// Apply this mode to a failed implicit release.
    pub(crate) fn handle(self, err: &crate::Error) {
        match self {
            DropFailure::Log => {
                tracing::error!(error = %err, "release policy failed during drop");
            }
            DropFailure::Ignore => {}
            DropFailure::Abort => {
                tracing::error!(error = %err, "release policy failed during drop, aborting");
                std::process::abort();
            }
        }
    }
}

impl std::str::FromStr for DropFailure {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "log" => Ok(DropFailure::Log),
            "ignore" => Ok(DropFailure::Ignore),
            "abort" => Ok(DropFailure::Abort),
            other => Err(crate::Error::InvalidArgument(format!(
                "unknown drop failure mode: {other}"
            ))),
        }
    }
}
