use super::{Ident, Params, ToSql};

use crate::stmt;

impl ToSql for &stmt::ColumnDef {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let name = Ident(&self.name);
        let ty = self.ty.ddl_name();

        fmt!(f, name " " ty);

        if self.primary_key {
            fmt!(f, " PRIMARY KEY");
        } else if self.not_null {
            fmt!(f, " NOT NULL");
        }

        if self.unique {
            fmt!(f, " UNIQUE");
        }

        if let Some(collation) = self.collation.sql_name() {
            fmt!(f, " COLLATE " collation);
        }

        if let Some(default) = &self.default {
            fmt!(f, " DEFAULT (" default ")");
        }

        if let Some(check) = &self.check {
            fmt!(f, " CHECK (" check ")");
        }
    }
}
