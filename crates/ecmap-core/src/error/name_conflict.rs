use super::Error;

/// A column, index or table name is already taken.
///
/// The property map builder recovers from column conflicts by picking a
/// deterministic alternative name. Every other conflict aborts the import.
#[derive(Debug)]
pub(super) struct NameConflict {
    scope: Box<str>,
    name: Box<str>,
}

impl std::error::Error for NameConflict {}

impl core::fmt::Display for NameConflict {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "name conflict: `{}` already exists in `{}`",
            self.name, self.scope
        )
    }
}

impl Error {
    /// Creates a name conflict error for `name` inside the table `scope`.
    pub fn name_conflict(scope: impl Into<String>, name: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::NameConflict(NameConflict {
            scope: scope.into().into(),
            name: name.into().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a name conflict.
    pub fn is_name_conflict(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::NameConflict(_)))
    }
}
