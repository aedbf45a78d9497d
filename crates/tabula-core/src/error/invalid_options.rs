use super::Error;

/// Error when a field's JSON-encoded options cannot be parsed.
#[derive(Debug)]
pub(super) struct InvalidOptionsError {
    field: Box<str>,
    source: serde_json::Error,
}

impl std::error::Error for InvalidOptionsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl core::fmt::Display for InvalidOptionsError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "invalid options for field `{}`: {}",
            self.field, self.source
        )
    }
}

impl Error {
    /// Creates an invalid options error for `field`.
    pub fn invalid_options(field: impl Into<String>, source: serde_json::Error) -> Error {
        Error::from(super::ErrorKind::InvalidOptions(InvalidOptionsError {
            field: field.into().into(),
            source,
        }))
    }

    /// Returns `true` if this error is an invalid options error.
    pub fn is_invalid_options(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::InvalidOptions(_)))
    }
}
