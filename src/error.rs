/// Broad failure category; decides the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments or configuration.
    Usage,
    /// Filesystem read/write failures.
    Io,
    /// Input data that can't be used (empty, wrong shape, missing columns).
    Data,
    /// Upstream API unreachable or unusable.
    Network,
    /// A processor, trainer, or evaluator was used before it had state.
    NotFitted,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Usage | ErrorKind::Io => 2,
            ErrorKind::Data => 3,
            ErrorKind::Network => 4,
            ErrorKind::NotFitted => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Usage, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Data, message)
    }

    /// `what` names the component, e.g. "Scaler" or "Model".
    pub fn not_fitted(what: &str, hint: &str) -> Self {
        Self::new(ErrorKind::NotFitted, format!("{what} has not been fitted. {hint}"))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_fitted_maps_to_its_own_exit_code() {
        let err = AppError::not_fitted("Scaler", "Call prepare_features first.");
        assert_eq!(err.kind(), ErrorKind::NotFitted);
        assert_eq!(err.exit_code(), 5);
        assert_eq!(err.to_string(), "Scaler has not been fitted. Call prepare_features first.");
    }
}
