use ecmap_core::schema::db::{
    Collation, ColumnId, ColumnKind, ColumnPersistence, ColumnType, ForeignKeyAction, Schema,
    TableId, TableKind, TriggerEvent, TriggerTiming,
};
use ecmap_sql::{
    serializer::{Params, Placeholder},
    stmt::{Insert, Value},
    Serializer, Statement,
};

use pretty_assertions::assert_eq;

struct NoParams;

impl Params for NoParams {
    fn push(&mut self, _: &Value) -> Placeholder {
        Placeholder(0)
    }
}

fn make_column(
    schema: &mut Schema,
    table: TableId,
    name: &str,
    ty: ColumnType,
    kind: ColumnKind,
) -> ColumnId {
    schema
        .edit(table)
        .unwrap()
        .create_column(Some(name), ty, kind, ColumnPersistence::Persisted)
        .unwrap()
}

/// `Person(ECInstanceId PK, Name)`.
fn make_person(schema: &mut Schema) -> (TableId, ColumnId, ColumnId) {
    let table = schema.create_table("Person", TableKind::Physical).unwrap();
    let id = make_column(schema, table, "ECInstanceId", ColumnType::Long, ColumnKind::INSTANCE_ID);
    let name = make_column(schema, table, "Name", ColumnType::String, ColumnKind::DATA);

    let mut edit = schema.edit(table).unwrap();
    edit.column_mut(id).nullable = false;
    edit.primary_key(true).unwrap().columns.push(id);

    (table, id, name)
}

fn serialize(schema: &Schema, stmt: &Statement) -> String {
    Serializer::sqlite(schema).serialize(stmt, &mut NoParams)
}

#[test]
fn single_integer_key_is_declared_inline() {
    let mut schema = Schema::new();
    let (table, _, name) = make_person(&mut schema);

    {
        let mut edit = schema.edit(table).unwrap();
        let column = edit.column_mut(name);
        column.nullable = false;
        column.unique = true;
        column.collation = Collation::NoCase;
        column.default = Some("'anonymous'".to_string());
        column.check = Some("length([Name]) > 0".to_string());
    }

    let sql = serialize(&schema, &Statement::create_table(schema.table(table)));
    assert_eq!(
        sql,
        "CREATE TABLE [Person] ([ECInstanceId] INTEGER PRIMARY KEY, \
         [Name] TEXT NOT NULL UNIQUE COLLATE NoCase DEFAULT ('anonymous') CHECK (length([Name]) > 0));"
    );
}

#[test]
fn composite_key_and_foreign_keys_are_table_constraints() {
    let mut schema = Schema::new();
    let (person, person_id, _) = make_person(&mut schema);

    let link = schema.create_table("Knows", TableKind::Physical).unwrap();
    let source = make_column(
        &mut schema,
        link,
        "SourceECInstanceId",
        ColumnType::Long,
        ColumnKind::SOURCE_INSTANCE_ID,
    );
    let target = make_column(
        &mut schema,
        link,
        "TargetECInstanceId",
        ColumnType::Long,
        ColumnKind::TARGET_INSTANCE_ID,
    );

    {
        let mut edit = schema.edit(link).unwrap();
        edit.column_mut(source).nullable = false;
        edit.column_mut(target).nullable = false;
        edit.primary_key(true).unwrap().columns.extend([source, target]);

        let fk = edit.create_foreign_key(person);
        fk.add_column(source, person_id);
        fk.on_delete = Some(ForeignKeyAction::Cascade);

        let fk = edit.create_foreign_key(person);
        fk.add_column(target, person_id);
        fk.on_delete = Some(ForeignKeyAction::Cascade);
        fk.on_update = Some(ForeignKeyAction::NoAction);
    }

    let sql = serialize(&schema, &Statement::create_table(schema.table(link)));
    assert_eq!(
        sql,
        "CREATE TABLE [Knows] ([SourceECInstanceId] INTEGER NOT NULL, \
         [TargetECInstanceId] INTEGER NOT NULL, \
         PRIMARY KEY ([SourceECInstanceId], [TargetECInstanceId]), \
         FOREIGN KEY ([SourceECInstanceId]) REFERENCES [Person] ([ECInstanceId]) ON DELETE CASCADE, \
         FOREIGN KEY ([TargetECInstanceId]) REFERENCES [Person] ([ECInstanceId]) \
         ON DELETE CASCADE ON UPDATE NO ACTION);"
    );
}

#[test]
fn virtual_columns_are_not_created() {
    let mut schema = Schema::new();
    let (table, _, _) = make_person(&mut schema);
    schema
        .edit(table)
        .unwrap()
        .create_column(
            Some("Computed"),
            ColumnType::Double,
            ColumnKind::DATA,
            ColumnPersistence::Virtual,
        )
        .unwrap();

    let sql = serialize(&schema, &Statement::create_table(schema.table(table)));
    assert_eq!(
        sql,
        "CREATE TABLE [Person] ([ECInstanceId] INTEGER PRIMARY KEY, [Name] TEXT);"
    );
}

#[test]
fn temp_tables() {
    let mut schema = Schema::new();
    let table = schema.create_table("Scratch", TableKind::Temp).unwrap();
    make_column(&mut schema, table, "Payload", ColumnType::Binary, ColumnKind::DATA);

    let sql = serialize(&schema, &Statement::create_table(schema.table(table)));
    assert_eq!(sql, "CREATE TEMP TABLE [Scratch] ([Payload] BINARY);");
}

#[test]
fn added_columns_drop_unenforceable_constraints() {
    let mut schema = Schema::new();
    let (table, _, _) = make_person(&mut schema);
    let nick = make_column(&mut schema, table, "Nick", ColumnType::String, ColumnKind::DATA);
    let age = make_column(&mut schema, table, "Age", ColumnType::Integer, ColumnKind::DATA);

    {
        let mut edit = schema.edit(table).unwrap();
        let column = edit.column_mut(nick);
        column.unique = true;
        column.nullable = false;

        let column = edit.column_mut(age);
        column.nullable = false;
        column.default = Some("0".to_string());
    }

    let person = schema.table(table);
    let sql: Vec<_> = [nick, age]
        .into_iter()
        .map(|id| serialize(&schema, &Statement::add_column(person, person.column(id))))
        .collect();

    assert_eq!(
        sql,
        [
            "ALTER TABLE [Person] ADD COLUMN [Nick] TEXT;",
            "ALTER TABLE [Person] ADD COLUMN [Age] INTEGER NOT NULL DEFAULT (0);",
        ]
    );
}

#[test]
fn indexes() {
    let mut schema = Schema::new();
    let (table, id, name) = make_person(&mut schema);

    {
        let mut edit = schema.edit(table).unwrap();
        edit.create_index("ix_Person_Name", vec![name], true, Some("[Name] IS NOT NULL".into()))
            .unwrap();
        edit.create_index("ix_Person_Both", vec![id, name], false, None)
            .unwrap();
    }

    let sql: Vec<_> = schema
        .table(table)
        .indexes
        .iter()
        .map(|index| serialize(&schema, &Statement::create_index(index)))
        .collect();

    assert_eq!(
        sql,
        [
            "CREATE UNIQUE INDEX [ix_Person_Name] ON [Person] ([Name]) WHERE [Name] IS NOT NULL;",
            "CREATE INDEX [ix_Person_Both] ON [Person] ([ECInstanceId], [Name]);",
        ]
    );
}

#[test]
fn triggers() {
    let mut schema = Schema::new();
    let (table, _, _) = make_person(&mut schema);

    schema
        .edit(table)
        .unwrap()
        .create_trigger(
            "Person_StructArray_Delete",
            TriggerTiming::After,
            TriggerEvent::Delete,
            None,
            "DELETE FROM [Address] WHERE [Address].[ParentECInstanceId] = OLD.[ECInstanceId];",
        )
        .unwrap();

    let trigger = &schema.table(table).triggers[0];
    let sql = serialize(&schema, &Statement::create_trigger(table, trigger));
    assert_eq!(
        sql,
        "CREATE TRIGGER [Person_StructArray_Delete] AFTER DELETE ON [Person] BEGIN \
         DELETE FROM [Address] WHERE [Address].[ParentECInstanceId] = OLD.[ECInstanceId]; END;"
    );
}

#[test]
fn identifiers_are_bracket_escaped() {
    let mut schema = Schema::new();
    let table = schema.create_table("odd]name", TableKind::Physical).unwrap();
    make_column(&mut schema, table, "a]b", ColumnType::Boolean, ColumnKind::DATA);

    let sql = serialize(&schema, &Statement::create_table(schema.table(table)));
    assert_eq!(sql, "CREATE TABLE [odd]]name] ([a]]b] BOOLEAN);");
}

#[test]
fn pragmas_and_drop_view() {
    let schema = Schema::new();

    assert_eq!(
        serialize(&schema, &Statement::pragma_enable_foreign_keys()),
        "PRAGMA foreign_keys = ON;"
    );
    assert_eq!(
        serialize(&schema, &Statement::pragma_table_info("Person")),
        "PRAGMA table_info([Person]);"
    );
    assert_eq!(
        serialize(&schema, &Statement::drop_view("zoo_Animal_View")),
        "DROP VIEW IF EXISTS [zoo_Animal_View];"
    );
}

#[test]
fn inserts_bind_parameters() {
    let schema = Schema::new();

    let mut insert = Insert::new("Person");
    insert.set("ECInstanceId", 7i64);
    insert.set("Name", "O'Hara");
    insert.set("Photo", Value::Null);

    let mut params = vec![];
    let sql = Serializer::sqlite(&schema).serialize(&insert.into(), &mut params);

    assert_eq!(
        sql,
        "INSERT INTO [Person] ([ECInstanceId], [Name], [Photo]) VALUES (?1, ?2, ?3);"
    );
    assert_eq!(
        params,
        [
            Value::I64(7),
            Value::String("O'Hara".to_string()),
            Value::Null
        ]
    );
}

#[test]
fn ddl_statements_are_flagged() {
    let schema = Schema::new();
    let null_table = schema.null_table();

    assert!(Statement::create_table(null_table).is_ddl());
    assert!(Statement::drop_view("v").is_ddl());
    assert!(!Statement::pragma_enable_foreign_keys().is_ddl());
    assert!(!Statement::from(Insert::new("t")).is_ddl());
}
