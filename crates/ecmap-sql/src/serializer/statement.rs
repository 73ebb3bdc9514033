use super::{Comma, Delimited, Ident, Params, ToSql};

use crate::stmt;
use ecmap_core::schema::db::ForeignKey;

struct ColumnsWithConstraints<'a>(&'a stmt::CreateTable);

impl ToSql for ColumnsWithConstraints<'_> {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let columns = Comma(&self.0.columns);
        fmt!(f, columns);

        if !self.0.primary_key.is_empty() {
            let serializer = f.serializer;
            let key = Comma(
                self.0
                    .primary_key
                    .iter()
                    .map(|column| serializer.column_name(*column)),
            );
            fmt!(f, ", PRIMARY KEY (" key ")");
        }

        for fk in &self.0.foreign_keys {
            fmt!(f, ", " fk);
        }
    }
}

impl ToSql for &ForeignKey {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let serializer = f.serializer;
        let columns = Comma(self.columns.iter().map(|column| serializer.column_name(*column)));
        let table = serializer.table_name(self.referenced_table);
        let referenced = Comma(
            self.referenced_columns
                .iter()
                .map(|column| serializer.column_name(*column)),
        );

        fmt!(f, "FOREIGN KEY (" columns ") REFERENCES " table " (" referenced ")");

        if let Some(action) = self.on_delete {
            fmt!(f, " ON DELETE " action.sql());
        }
        if let Some(action) = self.on_update {
            fmt!(f, " ON UPDATE " action.sql());
        }
    }
}

impl ToSql for &stmt::AddColumn {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let table_name = f.serializer.table_name(self.table);
        let column = &self.column;

        fmt!(f, "ALTER TABLE " table_name " ADD COLUMN " column);
    }
}

impl ToSql for &stmt::CreateIndex {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let serializer = f.serializer;
        let table_name = serializer.table_name(self.on);
        let columns = Comma(self.columns.iter().map(|column| serializer.column_name(*column)));
        let unique = if self.unique { "UNIQUE " } else { "" };
        let filter = self.where_clause.as_ref().map(|expr| (" WHERE ", expr));
        let name = &self.name;

        fmt!(f, "CREATE " unique "INDEX " name " ON " table_name " (" columns ")" filter);
    }
}

impl ToSql for &stmt::CreateTable {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let table = f.serializer.table(self.table);
        let name = Ident(&table.name);
        let temp = if self.temp { "TEMP " } else { "" };
        let columns = ColumnsWithConstraints(self);

        fmt!(f, "CREATE " temp "TABLE " name " (" columns ")");
    }
}

impl ToSql for &stmt::CreateTrigger {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let table_name = f.serializer.table_name(self.on);
        let (timing, event) = (self.timing.sql(), self.event.sql());
        let condition = self.condition.as_ref().map(|expr| (" WHEN ", expr));
        let (name, body) = (&self.name, &self.body);

        fmt!(
            f, "CREATE TRIGGER " name " " timing " " event " ON " table_name condition
            " BEGIN " body " END"
        );
    }
}

impl ToSql for &stmt::CreateView {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let (name, query) = (&self.name, &self.query);
        fmt!(f, "CREATE VIEW " name " AS " query);
    }
}

impl ToSql for &stmt::DropView {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let if_exists = if self.if_exists { "IF EXISTS " } else { "" };
        let name = &self.name;
        fmt!(f, "DROP VIEW " if_exists name);
    }
}

impl ToSql for &stmt::Insert {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let table_name = Ident(&self.table);
        let columns = Comma(self.columns.iter().map(Ident));

        fmt!(f, "INSERT INTO " table_name " (" columns ") VALUES (");

        let mut s = "";
        for value in &self.values {
            let placeholder = f.params.push(value);
            fmt!(f, s placeholder);
            s = ", ";
        }

        fmt!(f, ")");
    }
}

impl ToSql for &stmt::Pragma {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let name = self.name.as_str();
        let argument = self.argument.as_ref().map(|argument| ("(", argument, ")"));
        let value = self.value.as_ref().map(|value| (" = ", value));

        fmt!(f, "PRAGMA " name argument value);
    }
}

impl ToSql for &stmt::Query {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let selects = Delimited(self.selects(), " UNION ALL ");
        fmt!(f, selects);
    }
}

impl ToSql for &stmt::Select {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let projection = Comma(&self.projection);
        let from = self.from.as_ref().map(|source| (" FROM ", source));
        let filter = self.filter.as_ref().map(|expr| (" WHERE ", expr));

        fmt!(f, "SELECT " projection from filter);
    }
}

impl ToSql for &stmt::SelectItem {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let (expr, alias) = (&self.expr, Ident(&self.alias));
        fmt!(f, expr " AS " alias);
    }
}

impl ToSql for &stmt::Source {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, &self.table);

        for join in &self.joins {
            let (table, on) = (&join.table, &join.on);
            fmt!(f, " LEFT JOIN " table " ON " on);
        }
    }
}

impl ToSql for &stmt::TableRef {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let name = Ident(&self.name);
        let alias = self.alias.as_ref().map(|alias| (" ", Ident(alias)));

        fmt!(f, name alias);
    }
}

impl ToSql for &stmt::Statement {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        match self {
            stmt::Statement::AddColumn(stmt) => stmt.to_sql(f),
            stmt::Statement::CreateIndex(stmt) => stmt.to_sql(f),
            stmt::Statement::CreateTable(stmt) => stmt.to_sql(f),
            stmt::Statement::CreateTrigger(stmt) => stmt.to_sql(f),
            stmt::Statement::CreateView(stmt) => stmt.to_sql(f),
            stmt::Statement::DropView(stmt) => stmt.to_sql(f),
            stmt::Statement::Insert(stmt) => stmt.to_sql(f),
            stmt::Statement::Pragma(stmt) => stmt.to_sql(f),
            stmt::Statement::Query(stmt) => stmt.to_sql(f),
        }
    }
}
