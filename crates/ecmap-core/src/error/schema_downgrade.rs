use super::Error;

/// The requested schema would remove a persisted column or change its type
/// incompatibly. Destructive schema changes are never applied.
#[derive(Debug)]
pub(super) struct SchemaDowngrade {
    message: Box<str>,
}

impl std::error::Error for SchemaDowngrade {}

impl core::fmt::Display for SchemaDowngrade {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "unsupported schema downgrade: {}", self.message)
    }
}

impl Error {
    /// Creates a schema downgrade error.
    pub fn schema_downgrade(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::SchemaDowngrade(SchemaDowngrade {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a schema downgrade error.
    pub fn is_schema_downgrade(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::SchemaDowngrade(_)))
    }
}
