use super::Error;

/// Error when a formula function has no code-generation rule for a backend in
/// the requested mode.
///
/// Fatal when a generated column is required; otherwise the field definition
/// falls back to a plain column.
#[derive(Debug)]
pub(super) struct UnsupportedFunctionError {
    func: Box<str>,
    flavor: Box<str>,
}

impl std::error::Error for UnsupportedFunctionError {}

impl core::fmt::Display for UnsupportedFunctionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "function `{}` is not supported in generated columns on {}",
            self.func, self.flavor
        )
    }
}

impl Error {
    /// Creates an unsupported function error.
    pub fn unsupported_function(func: impl Into<String>, flavor: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnsupportedFunction(
            UnsupportedFunctionError {
                func: func.into().into(),
                flavor: flavor.into().into(),
            },
        ))
    }

    /// Returns `true` if this error is an unsupported function error.
    pub fn is_unsupported_function(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::UnsupportedFunction(_)))
    }
}
