use ecmap_core::{
    mapping::Options,
    schema::{
        db::{ColumnType, Schema},
        ec::{
            ClassDef, ClassGraph, ClassMapHint, Ids, MapStrategyHint, PrimitiveType, PropertyDef,
            SchemaDef,
        },
    },
    view::generate_select_view,
    SchemaMappingSession,
};
use ecmap_sql::{
    serializer::{Params, Placeholder},
    stmt::{Expr, Query, Select, Source, Value},
    Serializer, Statement,
};

use pretty_assertions::assert_eq;
use std::sync::Arc;

struct NoParams;

impl Params for NoParams {
    fn push(&mut self, _: &Value) -> Placeholder {
        Placeholder(0)
    }
}

fn make_zoo() -> SchemaMappingSession {
    let def = SchemaDef::new("Zoo")
        .alias("zoo")
        .class(
            ClassDef::entity("Animal")
                .map(
                    ClassMapHint::default()
                        .strategy(MapStrategyHint::TablePerHierarchy)
                        .table_name("AnimalTable"),
                )
                .property(PropertyDef::primitive("Name", PrimitiveType::String)),
        )
        .class(
            ClassDef::entity("Dog")
                .base("Animal")
                .property(PropertyDef::primitive("Breed", PrimitiveType::String)),
        );

    let graph = ClassGraph::build(&[def], &mut Ids::new()).unwrap();
    let mut session = SchemaMappingSession::new(Arc::new(graph), Schema::new(), Options::default());
    session.map_all(&mut ()).unwrap();
    session
}

fn make_select(table: &str) -> Select {
    let mut select = Select::new(Some(Source::table(table)));
    select.item(Expr::column(table, "ECInstanceId"), "ECInstanceId");
    select
}

#[test]
fn derived_class_view_over_a_hierarchy_table() {
    let session = make_zoo();
    let dog = session.graph().find("Zoo:Dog").unwrap().id;

    let view = generate_select_view(&session, dog, true).unwrap();
    let sql = Serializer::sqlite(session.schema())
        .serialize(&Statement::from(view.query.clone()), &mut NoParams);

    assert_eq!(
        sql,
        format!(
            "SELECT [AnimalTable].[ECInstanceId] AS [ECInstanceId], \
             [AnimalTable].[ECClassId] AS [ECClassId], \
             [AnimalTable].[Name] AS [Name], \
             [AnimalTable].[Breed] AS [Breed] \
             FROM [AnimalTable] WHERE [AnimalTable].[ECClassId] IN ({});",
            dog.0
        )
    );
}

#[test]
fn create_view_wraps_the_query() {
    let session = make_zoo();
    let animal = session.graph().find("Zoo:Animal").unwrap().id;

    let view = generate_select_view(&session, animal, true).unwrap();
    let sql = Serializer::sqlite(session.schema())
        .serialize(&Statement::create_view(&view), &mut NoParams);

    assert_eq!(
        sql,
        "CREATE VIEW [zoo_Animal_View] AS \
         SELECT [AnimalTable].[ECInstanceId] AS [ECInstanceId], \
         [AnimalTable].[ECClassId] AS [ECClassId], \
         [AnimalTable].[Name] AS [Name] FROM [AnimalTable];"
    );
}

#[test]
fn joins_and_conjunctions() {
    let mut source = Source::table("Pet");
    source.left_join(
        "Person",
        "SourceECClassPrimaryTable",
        Expr::eq(
            Expr::column("SourceECClassPrimaryTable", "ECInstanceId"),
            Expr::column("Pet", "OwnerId"),
        ),
    );

    let mut select = Select::new(Some(source));
    select.item(Expr::column("Pet", "ECInstanceId"), "ECInstanceId");
    select.item(
        Expr::column("SourceECClassPrimaryTable", "ECClassId"),
        "SourceECClassId",
    );
    select.and_filter(Expr::is_not_null(Expr::column("Pet", "OwnerId")));
    select.and_filter(Expr::in_list(
        Expr::column("Pet", "ECClassId"),
        [Expr::value(1i64), Expr::value(2i64)],
    ));

    let schema = Schema::new();
    assert_eq!(
        Serializer::sqlite(&schema).serialize_query(&Query::Select(select)),
        "SELECT [Pet].[ECInstanceId] AS [ECInstanceId], \
         [SourceECClassPrimaryTable].[ECClassId] AS [SourceECClassId] \
         FROM [Pet] LEFT JOIN [Person] [SourceECClassPrimaryTable] \
         ON [SourceECClassPrimaryTable].[ECInstanceId] = [Pet].[OwnerId] \
         WHERE [Pet].[OwnerId] IS NOT NULL AND [Pet].[ECClassId] IN (1, 2)"
    );
}

#[test]
fn unions_cast_literal_class_ids() {
    let mut vehicles = make_select("Vehicle");
    vehicles.item(Expr::column("Vehicle", "ECClassId"), "ECClassId");

    let mut cars = make_select("Car");
    cars.item(Expr::cast(Value::I64(5), ColumnType::Long), "ECClassId");

    let schema = Schema::new();
    assert_eq!(
        Serializer::sqlite(&schema).serialize_query(&Query::union(vec![vehicles, cars])),
        "SELECT [Vehicle].[ECInstanceId] AS [ECInstanceId], [Vehicle].[ECClassId] AS [ECClassId] \
         FROM [Vehicle] \
         UNION ALL \
         SELECT [Car].[ECInstanceId] AS [ECInstanceId], CAST(5 AS INTEGER) AS [ECClassId] \
         FROM [Car]"
    );
}

#[test]
fn empty_views_select_without_a_table() {
    let mut select = Select::new(None);
    select.item(Expr::null(), "ECInstanceId");
    select.item(Expr::null(), "Label");
    select.and_filter(Expr::always_false());

    let schema = Schema::new();
    assert_eq!(
        Serializer::sqlite(&schema).serialize_query(&Query::Select(select)),
        "SELECT NULL AS [ECInstanceId], NULL AS [Label] WHERE 1 = 0"
    );
}

#[test]
fn literals_are_inlined() {
    let mut select = Select::new(None);
    select.item(Value::from("O'Hara"), "Name");
    select.item(Value::Bytes(vec![0xAB, 0x01]), "Photo");
    select.item(Value::Bool(true), "Alive");
    select.item(Value::F64(2.0), "Weight");
    select.item(Value::I32(-3), "Offset");
    select.item(
        Expr::is_null(Expr::column("Shelf", "ECArrayIndex")),
        "IsRoot",
    );

    let schema = Schema::new();
    assert_eq!(
        Serializer::sqlite(&schema).serialize_query(&Query::Select(select)),
        "SELECT 'O''Hara' AS [Name], X'AB01' AS [Photo], 1 AS [Alive], 2.0 AS [Weight], \
         -3 AS [Offset], [Shelf].[ECArrayIndex] IS NULL AS [IsRoot]"
    );
}

#[test]
fn class_filters_serialize_against_an_alias() {
    let session = make_zoo();
    let dog = session.graph().find("Zoo:Dog").unwrap().id;

    let class_map = session.class_map(dog).unwrap();
    let expr = class_map
        .native_sql_converter(&session)
        .where_clause(false, "a")
        .unwrap();

    assert_eq!(
        Serializer::sqlite(session.schema()).serialize_expr(&expr),
        format!("[a].[ECClassId] IN ({})", dog.0)
    );
}
