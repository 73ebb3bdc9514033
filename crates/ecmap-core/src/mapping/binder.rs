use super::{ClassIdSource, ClassMap, ClassMapKind, PropertyMapKind, SchemaMappingSession, CLASS_ID, INSTANCE_ID};
use crate::{
    schema::{db::Table, ec::ClassId},
    stmt::{Insert, Value},
    Error, Result,
};

use std::collections::HashSet;

/// Binds instance values to the columns of a class's primary table.
#[derive(Debug)]
pub struct InsertBinder<'a> {
    session: &'a SchemaMappingSession,
    class_map: &'a ClassMap,
    table: &'a Table,
}

impl<'a> InsertBinder<'a> {
    pub fn new(session: &'a SchemaMappingSession, class: ClassId) -> Result<InsertBinder<'a>> {
        let class_map = session
            .class_map(class)
            .ok_or_else(|| err!("class {class} is not mapped"))?;
        let definition = session.graph().class(class);

        match class_map.kind {
            ClassMapKind::Unmapped | ClassMapKind::Mixin | ClassMapKind::RelationshipEndTable(_) => {
                return Err(Error::unsupported(format!(
                    "instances of {} are not stored as rows of their own",
                    definition.full_name()
                )));
            }
            _ if definition.is_abstract() => {
                return Err(Error::unsupported(format!(
                    "{} is abstract",
                    definition.full_name()
                )));
            }
            _ => {}
        }

        Ok(InsertBinder {
            session,
            class_map,
            table: session.schema().table(class_map.table),
        })
    }

    pub fn table(&self) -> &Table {
        self.table
    }

    /// Builds the insert of one instance. `values` are keyed by access string;
    /// leaves without a value are left to the column default.
    pub fn bind<K, I>(&self, instance_id: i64, values: I) -> Result<Insert>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut insert = Insert::new(&self.table.name);
        let mut seen = HashSet::new();

        let instance_id_column = self
            .table
            .instance_id_column()
            .ok_or_else(|| err!("table `{}` has no instance-id column", self.table.name))?;
        insert.set(&instance_id_column.name, Value::I64(instance_id));

        if let Some(column) = self.table.class_id_column() {
            insert.set(&column.name, Value::I64(self.class_map.class.0 as i64));
        }

        for (access, value) in values {
            let access = access.as_ref();
            if access.eq_ignore_ascii_case(INSTANCE_ID) || access.eq_ignore_ascii_case(CLASS_ID) {
                return Err(err!("`{access}` is assigned by the engine"));
            }
            if !seen.insert(access.to_ascii_lowercase()) {
                return Err(err!("duplicate value for `{access}`"));
            }

            let map = self
                .session
                .find_property_map(self.class_map.class, access)
                .ok_or_else(|| {
                    err!(
                        "class {} has no property `{access}`",
                        self.session.graph().class(self.class_map.class).full_name()
                    )
                })?;

            let (column, value) = match &map.kind {
                PropertyMapKind::Primitive { column, .. } => (*column, value),
                PropertyMapKind::PrimitiveArray { column, .. } => {
                    let value = match value {
                        Value::Null => Value::Null,
                        value @ Value::List(_) => {
                            Value::Bytes(serde_json::to_vec(&value.to_json())?)
                        }
                        other => {
                            return Err(err!("`{access}` expects a list, got {other:?}"));
                        }
                    };
                    (*column, value)
                }
                PropertyMapKind::ConstraintId { column, .. }
                | PropertyMapKind::ConstraintClassId {
                    source: ClassIdSource::Local(column),
                    ..
                } => (*column, value),
                PropertyMapKind::StructTable { .. } => {
                    return Err(Error::unsupported(format!(
                        "struct values (`{access}`) cannot be bound"
                    )));
                }
                _ => {
                    return Err(err!("`{access}` does not bind a single column"));
                }
            };

            if column.table != self.table.id {
                return Err(err!(
                    "`{access}` is stored outside table `{}`",
                    self.table.name
                ));
            }
            insert.set(&self.table.column(column).name, value);
        }

        Ok(insert)
    }
}
