use ecmap_core::{
    mapping::Options,
    schema::{
        db::Schema,
        ec::{
            ClassDef, ClassGraph, ClassId, ClassMapHint, ConstraintDef, Ids, MapStrategyHint,
            Multiplicity, PrimitiveType, PropertyDef, RelationshipMapHint, SchemaDef,
        },
    },
    stmt::{Expr, Query, Select, Value},
    view::generate_select_view,
    SchemaMappingSession,
};

use pretty_assertions::assert_eq;
use std::sync::Arc;

fn map_all(def: SchemaDef) -> SchemaMappingSession {
    let graph = ClassGraph::build(&[def], &mut Ids::new()).unwrap();
    let mut session = SchemaMappingSession::new(Arc::new(graph), Schema::new(), Options::default());
    session.map_all(&mut ()).unwrap();
    session
}

fn class(session: &SchemaMappingSession, name: &str) -> ClassId {
    session.graph().find(name).unwrap().id
}

fn class_id(class: ClassId) -> Expr {
    Expr::value(Value::I64(class.0 as i64))
}

fn single(query: &Query) -> &Select {
    match query {
        Query::Select(select) => select,
        Query::Union(selects) => panic!("expected one select, got {}", selects.len()),
    }
}

fn zoo() -> SchemaDef {
    SchemaDef::new("Zoo")
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
        )
}

#[test]
fn hierarchy_view_filters_by_class_id() {
    let session = map_all(zoo());
    let animal = class(&session, "Zoo:Animal");
    let dog = class(&session, "Zoo:Dog");

    let polymorphic = generate_select_view(&session, animal, true).unwrap();
    assert_eq!(polymorphic.name, "zoo_Animal_View");
    assert_eq!(
        polymorphic.column_names().collect::<Vec<_>>(),
        ["ECInstanceId", "ECClassId", "Name"]
    );
    let select = single(&polymorphic.query);
    assert_eq!(select.filter, None);
    assert_eq!(
        select.projection[1].expr,
        Expr::column("AnimalTable", "ECClassId")
    );

    let own = generate_select_view(&session, animal, false).unwrap();
    assert_eq!(
        single(&own.query).filter,
        Some(Expr::in_list(
            Expr::column("AnimalTable", "ECClassId"),
            [class_id(animal)]
        ))
    );

    let dogs = generate_select_view(&session, dog, true).unwrap();
    assert_eq!(
        dogs.column_names().collect::<Vec<_>>(),
        ["ECInstanceId", "ECClassId", "Name", "Breed"]
    );
    assert_eq!(
        single(&dogs.query).filter,
        Some(Expr::in_list(
            Expr::column("AnimalTable", "ECClassId"),
            [class_id(dog)]
        ))
    );
}

#[test]
fn table_per_class_view_unions_tables() {
    let session = map_all(
        SchemaDef::new("Fleet")
            .alias("fl")
            .class(
                ClassDef::entity("Vehicle")
                    .map(ClassMapHint::default().strategy(MapStrategyHint::TablePerClass))
                    .property(PropertyDef::primitive("Name", PrimitiveType::String)),
            )
            .class(
                ClassDef::entity("Car")
                    .base("Vehicle")
                    .property(PropertyDef::primitive("Seats", PrimitiveType::Integer)),
            ),
    );
    let vehicle = class(&session, "Fleet:Vehicle");
    let car = class(&session, "Fleet:Car");

    let view = generate_select_view(&session, vehicle, true).unwrap();
    let Query::Union(selects) = &view.query else {
        panic!("expected a union, got {:?}", view.query);
    };

    let tables: Vec<_> = selects
        .iter()
        .map(|select| select.from.as_ref().unwrap().table.name.as_str())
        .collect();
    assert_eq!(tables, ["fl_Vehicle", "fl_Car"]);

    assert_eq!(selects[1].projection[1].expr, class_id(car));
    assert_eq!(
        selects[1].projection[2].expr,
        Expr::column("fl_Car", "Name")
    );
    assert!(selects.iter().all(|select| select.filter.is_none()));

    let own = generate_select_view(&session, vehicle, false).unwrap();
    assert_eq!(
        single(&own.query).from.as_ref().unwrap().table.name,
        "fl_Vehicle"
    );
}

#[test]
fn end_table_view_joins_the_referenced_table_for_class_ids() {
    let session = map_all(
        SchemaDef::new("Home")
            .alias("hm")
            .class(
                ClassDef::entity("Person")
                    .map(ClassMapHint::default().strategy(MapStrategyHint::TablePerHierarchy)),
            )
            .class(ClassDef::entity("Employee").base("Person"))
            .class(ClassDef::entity("Pet"))
            .class(
                ClassDef::relationship(
                    "Owns",
                    ConstraintDef::new(&["Person"], Multiplicity::ZERO_ONE),
                    ConstraintDef::new(&["Pet"], Multiplicity::ZERO_MANY),
                )
                .map(
                    ClassMapHint::default().relationship(RelationshipMapHint::ForeignKeyOnSource),
                ),
            ),
    );
    let owns = class(&session, "Home:Owns");
    let pet = class(&session, "Home:Pet");

    let view = generate_select_view(&session, owns, true).unwrap();
    assert_eq!(
        view.column_names().collect::<Vec<_>>(),
        [
            "ECInstanceId",
            "ECClassId",
            "SourceECInstanceId",
            "SourceECClassId",
            "TargetECInstanceId",
            "TargetECClassId"
        ]
    );

    let select = single(&view.query);
    let source = select.from.as_ref().unwrap();
    assert_eq!(source.table.name, "hm_Pet");

    let [join] = &source.joins[..] else {
        panic!("expected one join, got {:?}", source.joins);
    };
    assert_eq!(join.table.name, "hm_Person");
    assert_eq!(join.table.alias.as_deref(), Some("SourceECClassPrimaryTable"));
    assert_eq!(
        join.on,
        Expr::eq(
            Expr::column("SourceECClassPrimaryTable", "ECInstanceId"),
            Expr::column("hm_Pet", "ForeignECInstanceId_Owns"),
        )
    );

    let exprs: Vec<_> = select.projection.iter().map(|item| &item.expr).collect();
    assert_eq!(exprs[0], &Expr::column("hm_Pet", "ECInstanceId"));
    assert_eq!(exprs[2], &Expr::column("hm_Pet", "ForeignECInstanceId_Owns"));
    assert_eq!(
        exprs[3],
        &Expr::column("SourceECClassPrimaryTable", "ECClassId")
    );
    assert_eq!(exprs[4], &Expr::column("hm_Pet", "ECInstanceId"));
    assert_eq!(exprs[5], &class_id(pet));

    assert_eq!(
        select.filter,
        Some(Expr::is_not_null(Expr::column(
            "hm_Pet",
            "ForeignECInstanceId_Owns"
        )))
    );
}

#[test]
fn link_table_view_reads_local_class_ids() {
    let session = map_all(
        SchemaDef::new("Zoo")
            .alias("zoo")
            .class(
                ClassDef::entity("Animal")
                    .map(ClassMapHint::default().strategy(MapStrategyHint::TablePerClass)),
            )
            .class(ClassDef::entity("Dog").base("Animal"))
            .class(ClassDef::entity("Keeper"))
            .class(ClassDef::relationship(
                "Feeds",
                ConstraintDef::new(&["Keeper"], Multiplicity::ZERO_MANY),
                ConstraintDef::new(&["Animal"], Multiplicity::ZERO_MANY),
            )),
    );
    let feeds = class(&session, "Zoo:Feeds");
    let keeper = class(&session, "Zoo:Keeper");

    let view = generate_select_view(&session, feeds, true).unwrap();
    let select = single(&view.query);
    let source = select.from.as_ref().unwrap();
    assert_eq!(source.table.name, "zoo_Feeds");
    assert!(source.joins.is_empty(), "{:?}", source.joins);

    let exprs: Vec<_> = select.projection.iter().map(|item| &item.expr).collect();
    assert_eq!(exprs[2], &Expr::column("zoo_Feeds", "SourceECInstanceId"));
    assert_eq!(exprs[3], &class_id(keeper));
    assert_eq!(exprs[4], &Expr::column("zoo_Feeds", "TargetECInstanceId"));
    assert_eq!(exprs[5], &Expr::column("zoo_Feeds", "TargetECClassId"));
}

#[test]
fn mixin_without_implementers_is_empty() {
    let session = map_all(
        SchemaDef::new("Zoo")
            .alias("z")
            .class(ClassDef::mixin("Named").property(PropertyDef::primitive(
                "Label",
                PrimitiveType::String,
            ))),
    );
    let named = class(&session, "Zoo:Named");

    let view = generate_select_view(&session, named, true).unwrap();
    assert_eq!(
        view.column_names().collect::<Vec<_>>(),
        ["ECInstanceId", "ECClassId", "Label"]
    );
    let select = single(&view.query);
    assert!(select.from.is_none());
    assert_eq!(select.filter, Some(Expr::always_false()));
}

#[test]
fn views_expose_points_and_arrays_as_leaves() {
    let session = map_all(
        SchemaDef::new("Geo").alias("geo").class(
            ClassDef::entity("Marker")
                .property(PropertyDef::primitive("At", PrimitiveType::Point2d))
                .property(PropertyDef::primitive_array("Tags", PrimitiveType::String)),
        ),
    );
    let marker = class(&session, "Geo:Marker");

    let view = generate_select_view(&session, marker, false).unwrap();
    assert_eq!(
        view.column_names().collect::<Vec<_>>(),
        ["ECInstanceId", "ECClassId", "At.X", "At.Y", "Tags"]
    );

    let tags = view.columns.last().unwrap();
    assert!(tags.array);
    assert_eq!(tags.ty, PrimitiveType::String);

    let select = single(&view.query);
    assert_eq!(select.projection[2].alias, "At.X");
    assert_eq!(select.projection[2].expr, Expr::column("geo_Marker", "At_X"));
}
