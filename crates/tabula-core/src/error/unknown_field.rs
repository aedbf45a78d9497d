use super::Error;

/// Error when a formula or option payload references a field that does not
/// exist (or has been deleted).
#[derive(Debug)]
pub(super) struct UnknownFieldError {
    field: Box<str>,
}

impl std::error::Error for UnknownFieldError {}

impl core::fmt::Display for UnknownFieldError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "unknown field `{}`", self.field)
    }
}

impl Error {
    /// Creates an unknown field error.
    pub fn unknown_field(field: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnknownField(UnknownFieldError {
            field: field.into().into(),
        }))
    }

    /// Returns `true` if this error is an unknown field error.
    pub fn is_unknown_field(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::UnknownField(_)))
    }
}
