use super::Error;

/// A view could not be generated, typically because a join target cannot be
/// resolved. Partially generated SQL is never registered.
#[derive(Debug)]
pub(super) struct ViewGeneration {
    message: Box<str>,
}

impl std::error::Error for ViewGeneration {}

impl core::fmt::Display for ViewGeneration {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "view generation failed: {}", self.message)
    }
}

impl Error {
    /// Creates a view generation error.
    pub fn view_generation(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::ViewGeneration(ViewGeneration {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a view generation error.
    pub fn is_view_generation(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::ViewGeneration(_)))
    }
}
