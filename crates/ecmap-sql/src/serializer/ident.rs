use super::{Formatter, Params, ToSql};

/// Bracket-quoted identifier.
pub(super) struct Ident<S>(pub(super) S);

impl<S: AsRef<str>> ToSql for Ident<S> {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        f.dst.push('[');
        f.dst.push_str(&self.0.as_ref().replace(']', "]]"));
        f.dst.push(']');
    }
}
