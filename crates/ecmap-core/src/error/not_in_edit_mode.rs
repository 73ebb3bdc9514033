use super::Error;

/// A structural change was attempted on a table whose edit scope is closed.
#[derive(Debug)]
pub(super) struct NotInEditMode {
    table: Box<str>,
}

impl std::error::Error for NotInEditMode {}

impl core::fmt::Display for NotInEditMode {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "table `{}` is not in edit mode", self.table)
    }
}

impl Error {
    /// Creates a not-in-edit-mode error for `table`.
    pub fn not_in_edit_mode(table: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::NotInEditMode(NotInEditMode {
            table: table.into().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a not-in-edit-mode error.
    pub fn is_not_in_edit_mode(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::NotInEditMode(_)))
    }
}
