use super::Error;

/// Error when a formula expression cannot be parsed or is malformed
/// (unknown function, wrong number of arguments).
#[derive(Debug)]
pub(super) struct InvalidFormulaError {
    message: Box<str>,
}

impl std::error::Error for InvalidFormulaError {}

impl core::fmt::Display for InvalidFormulaError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid formula: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid formula error.
    pub fn invalid_formula(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidFormula(InvalidFormulaError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid formula error.
    pub fn is_invalid_formula(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::InvalidFormula(_)))
    }
}
