use super::Error;

/// A mapping input could not be found: an existing table, a column of an existing
/// table, a base class map, or a class referenced by name.
#[derive(Debug)]
pub(super) struct MissingResolution {
    message: Box<str>,
}

impl std::error::Error for MissingResolution {}

impl core::fmt::Display for MissingResolution {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "missing resolution: {}", self.message)
    }
}

impl Error {
    /// Creates a missing resolution error.
    pub fn missing_resolution(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::MissingResolution(MissingResolution {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a missing resolution error.
    pub fn is_missing_resolution(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::MissingResolution(_)))
    }
}
