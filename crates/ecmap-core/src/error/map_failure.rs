use super::Error;

/// Unrecoverable failure while mapping one class.
///
/// Aborts the class being processed and, with it, the whole schema import.
#[derive(Debug)]
pub(super) struct MapFailure {
    message: Box<str>,
}

impl std::error::Error for MapFailure {}

impl core::fmt::Display for MapFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "map failure: {}", self.message)
    }
}

impl Error {
    /// Creates a map failure error.
    pub fn map_failure(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::MapFailure(MapFailure {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a map failure.
    pub fn is_map_failure(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::MapFailure(_)))
    }
}
