use crate::stmt::Statement;

use ecmap_core::{
    driver::LiveColumn,
    schema::db::{ColumnType, Table},
    Error, Result,
};

/// Computes the statements that bring a live table in line with the model.
///
/// `live` is the table's column list as reported by the engine; it is empty
/// when the table does not exist yet. Virtual and pre-existing tables are
/// never touched. Columns are only ever added: a live column the model no
/// longer has, or one whose type changed incompatibly, is a schema downgrade.
pub fn migrate_table(table: &Table, live: &[LiveColumn]) -> Result<Vec<Statement>> {
    if !table.is_owned() || table.persisted_columns().next().is_none() {
        tracing::trace!(table = %table.name, "table not created by the engine; skipping");
        return Ok(vec![]);
    }

    if live.is_empty() {
        tracing::debug!(table = %table.name, "creating table");
        return Ok(vec![Statement::create_table(table)]);
    }

    for live_column in live {
        let Some(column) = table
            .persisted_columns()
            .find(|column| column.name.eq_ignore_ascii_case(&live_column.name))
        else {
            return Err(Error::schema_downgrade(format!(
                "column {}.{} exists in the database but is no longer mapped",
                table.name, live_column.name
            )));
        };

        let live_ty = ColumnType::from_declared(&live_column.declared_type);
        if column.ty != ColumnType::Any && !live_ty.is_compatible(column.ty) {
            return Err(Error::schema_downgrade(format!(
                "column {}.{} is declared {} but is now mapped as {}",
                table.name,
                column.name,
                live_column.declared_type,
                column.ty.ddl_name()
            )));
        }
    }

    let mut ret = vec![];

    for column in table.persisted_columns() {
        let exists = live
            .iter()
            .any(|live_column| live_column.name.eq_ignore_ascii_case(&column.name));

        if !exists {
            tracing::debug!(table = %table.name, column = %column.name, "adding column");
            ret.push(Statement::add_column(table, column));
        }
    }

    Ok(ret)
}
