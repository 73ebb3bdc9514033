use ecmap_core::{
    driver::LiveColumn,
    mapping::{ClassIdSource, ClassMapKind, MapStrategy, Options, PropertyMapKind},
    schema::{
        db::{Collation, ColumnKind, ForeignKeyAction, Schema, TriggerEvent, NULL_TABLE_NAME},
        ec::{
            ClassDef, ClassGraph, ClassMapHint, ConstraintDef, Direction, End, Ids, IndexHint,
            MapStrategyHint, Multiplicity, PrimitiveType, PropertyDef, PropertyMapHint,
            RelationshipMapHint, SchemaDef, Strength,
        },
    },
    SchemaMappingSession,
};

use pretty_assertions::assert_eq;
use std::{collections::HashMap, sync::Arc};

fn make_session(def: SchemaDef) -> SchemaMappingSession {
    let graph = ClassGraph::build(&[def], &mut Ids::new()).unwrap();
    SchemaMappingSession::new(Arc::new(graph), Schema::new(), Options::default())
}

fn map_all(def: SchemaDef) -> SchemaMappingSession {
    let mut session = make_session(def);
    session.map_all(&mut ()).unwrap();
    session
}

fn column_names(session: &SchemaMappingSession, table: &str) -> Vec<String> {
    session
        .schema()
        .find_table(table)
        .unwrap()
        .columns()
        .map(|column| column.name.clone())
        .collect()
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
fn table_per_hierarchy_uses_one_table() {
    let session = map_all(zoo());

    let tables: Vec<_> = session
        .schema()
        .tables()
        .map(|table| table.name.as_str())
        .collect();
    assert_eq!(tables, [NULL_TABLE_NAME, "AnimalTable"]);

    assert_eq!(
        column_names(&session, "AnimalTable"),
        ["ECInstanceId", "ECClassId", "Name", "Breed"]
    );

    let table = session.schema().find_table("AnimalTable").unwrap();
    assert!(table.class_id_column().is_some());
    assert!(table.index_by_name("ix_AnimalTable_ecclassid").is_some());
}

#[test]
fn inherited_property_maps_share_columns() {
    let session = map_all(zoo());
    let animal = session.graph().find("Zoo:Animal").unwrap().id;
    let dog = session.graph().find("Zoo:Dog").unwrap().id;

    let base = session.find_property_map(animal, "Name").unwrap();
    let derived = session.find_property_map(dog, "Name").unwrap();
    assert_eq!(base.id, derived.id);
    assert_eq!(base.column(), derived.column());

    let dog_map = session.class_map(dog).unwrap();
    assert_eq!(dog_map.strategy.strategy, MapStrategy::TablePerHierarchy);
    assert_eq!(dog_map.base, Some(animal));
    assert_eq!(
        session.derived_class_maps(animal)[0].class,
        dog,
    );
}

#[test]
fn unmapped_classes_use_the_null_table() {
    let session = map_all(
        SchemaDef::new("Zoo")
            .class(
                ClassDef::entity("Ghost")
                    .abstract_class()
                    .map(ClassMapHint::default().strategy(MapStrategyHint::DoNotMapHierarchy))
                    .property(PropertyDef::primitive("Name", PrimitiveType::String)),
            )
            .class(ClassDef::entity("Poltergeist").base("Ghost")),
    );

    for name in ["Zoo:Ghost", "Zoo:Poltergeist"] {
        let class = session.graph().find(name).unwrap().id;
        let class_map = session.class_map(class).unwrap();
        assert!(class_map.is_unmapped(), "{name}");

        let table = session.schema().table(class_map.table);
        assert_eq!(table.name, NULL_TABLE_NAME);
        assert_eq!(table.persisted_columns().count(), 0);
    }
}

#[test]
fn foreign_key_relationship_is_stored_in_the_end_table() {
    let session = map_all(
        SchemaDef::new("Home")
            .alias("hm")
            .class(ClassDef::entity("Person").property(PropertyDef::primitive(
                "Name",
                PrimitiveType::String,
            )))
            .class(ClassDef::entity("Pet").property(PropertyDef::primitive(
                "Name",
                PrimitiveType::String,
            )))
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

    let tables: Vec<_> = session
        .schema()
        .tables()
        .map(|table| table.name.as_str())
        .collect();
    assert_eq!(tables, [NULL_TABLE_NAME, "hm_Person", "hm_Pet"]);

    let person = session.schema().find_table("hm_Person").unwrap();
    let pet = session.schema().find_table("hm_Pet").unwrap();
    assert_eq!(
        column_names(&session, "hm_Pet"),
        ["ECInstanceId", "Name", "ForeignECInstanceId_Owns"]
    );

    let [fk] = &pet.foreign_keys[..] else {
        panic!("expected one foreign key, got {:?}", pet.foreign_keys);
    };
    assert_eq!(fk.referenced_table, person.id);
    assert_eq!(
        fk.referenced_columns,
        [person.instance_id_column().unwrap().id]
    );
    assert_eq!(
        fk.columns,
        [pet.column_by_name("ForeignECInstanceId_Owns").unwrap().id]
    );
    assert!(pet
        .index_by_name("ix_hm_Pet_fk_ForeignECInstanceId_Owns")
        .is_some());

    let owns = session.graph().find("Home:Owns").unwrap().id;
    let class_map = session.class_map(owns).unwrap();
    assert_eq!(class_map.strategy.strategy, MapStrategy::RelationshipTargetTable);
    assert_eq!(class_map.table, pet.id);
}

#[test]
fn navigation_property_columns_hold_the_foreign_key() {
    let session = map_all(
        SchemaDef::new("Home")
            .alias("hm")
            .class(ClassDef::entity("Person"))
            .class(ClassDef::entity("Pet").property(PropertyDef::navigation(
                "Owner",
                "Owns",
                Direction::Backward,
            )))
            .class(
                ClassDef::relationship(
                    "Owns",
                    ConstraintDef::new(&["Person"], Multiplicity::ZERO_ONE),
                    ConstraintDef::new(&["Pet"], Multiplicity::ZERO_MANY),
                )
                .strength(Strength::Embedding),
            ),
    );

    assert_eq!(
        column_names(&session, "hm_Pet"),
        ["ECInstanceId", "Owner_Id"]
    );

    let pet = session.schema().find_table("hm_Pet").unwrap();
    let owner = pet.column_by_name("Owner_Id").unwrap().id;
    let fk = pet
        .foreign_keys
        .iter()
        .find(|fk| fk.columns == [owner])
        .unwrap();
    assert_eq!(fk.on_delete, Some(ForeignKeyAction::Cascade));

    let owns = session.graph().find("Home:Owns").unwrap().id;
    let end_table = session.class_map(owns).unwrap().end_table().unwrap();
    assert_eq!(end_table.foreign_key_column, owner);
}

#[test]
fn many_to_many_relationship_gets_a_link_table() {
    let session = map_all(
        SchemaDef::new("Lib")
            .alias("lib")
            .class(ClassDef::entity("Book"))
            .class(ClassDef::entity("Author"))
            .class(
                ClassDef::relationship(
                    "WrittenBy",
                    ConstraintDef::new(&["Book"], Multiplicity::ZERO_MANY),
                    ConstraintDef::new(&["Author"], Multiplicity::ZERO_MANY),
                )
                .property(PropertyDef::primitive("Role", PrimitiveType::String)),
            ),
    );

    assert_eq!(
        column_names(&session, "lib_WrittenBy"),
        [
            "ECInstanceId",
            "SourceECInstanceId",
            "TargetECInstanceId",
            "Role"
        ]
    );

    let rel = session.graph().find("Lib:WrittenBy").unwrap().id;
    let class_map = session.class_map(rel).unwrap();
    assert!(matches!(
        class_map.kind,
        ClassMapKind::RelationshipLinkTable(_)
    ));

    let link = session.schema().table(class_map.table);
    assert_eq!(link.foreign_keys.len(), 2);
    assert!(link
        .foreign_keys
        .iter()
        .all(|fk| fk.on_delete == Some(ForeignKeyAction::Cascade)));
}

/// Keepers feed animals; animals are stored table-per-class, so the target
/// end spans `zoo_Animal` and `zoo_Dog`.
fn feeding(relationship: ClassDef) -> SchemaDef {
    SchemaDef::new("Zoo")
        .alias("zoo")
        .class(
            ClassDef::entity("Animal")
                .map(ClassMapHint::default().strategy(MapStrategyHint::TablePerClass))
                .property(PropertyDef::primitive("Name", PrimitiveType::String)),
        )
        .class(ClassDef::entity("Dog").base("Animal"))
        .class(ClassDef::entity("Keeper"))
        .class(relationship)
}

#[test]
fn link_table_stores_class_ids_of_an_end_spanning_tables() {
    let session = map_all(feeding(ClassDef::relationship(
        "Feeds",
        ConstraintDef::new(&["Keeper"], Multiplicity::ZERO_MANY),
        ConstraintDef::new(&["Animal"], Multiplicity::ZERO_MANY),
    )));

    assert_eq!(
        column_names(&session, "zoo_Feeds"),
        [
            "ECInstanceId",
            "SourceECInstanceId",
            "TargetECInstanceId",
            "TargetECClassId"
        ]
    );

    let link = session.schema().find_table("zoo_Feeds").unwrap();
    let target_class_id = link.column_with_kind(ColumnKind::TARGET_CLASS_ID).unwrap();
    assert_eq!(target_class_id.name, "TargetECClassId");
    assert!(!target_class_id.nullable);
    assert!(link.column_with_kind(ColumnKind::SOURCE_CLASS_ID).is_none());

    // Only the keeper end references a single table.
    let keepers = session.schema().find_table("zoo_Keeper").unwrap();
    let [fk] = &link.foreign_keys[..] else {
        panic!("expected one foreign key, got {:?}", link.foreign_keys);
    };
    assert_eq!(fk.referenced_table, keepers.id);

    let feeds = session.graph().find("Zoo:Feeds").unwrap().id;
    let keeper = session.graph().find("Zoo:Keeper").unwrap().id;
    assert_eq!(
        session.find_property_map(feeds, "SourceECClassId").unwrap().kind,
        PropertyMapKind::ConstraintClassId {
            end: End::Source,
            source: ClassIdSource::Literal(keeper),
        }
    );
    assert_eq!(
        session.find_property_map(feeds, "TargetECClassId").unwrap().kind,
        PropertyMapKind::ConstraintClassId {
            end: End::Target,
            source: ClassIdSource::Local(target_class_id.id),
        }
    );
}

#[test]
fn foreign_key_relationship_spanning_tables_falls_back_to_a_link_table() {
    let session = map_all(feeding(ClassDef::relationship(
        "Feeds",
        ConstraintDef::new(&["Keeper"], Multiplicity::ZERO_ONE),
        ConstraintDef::new(&["Animal"], Multiplicity::ZERO_MANY),
    )));

    let feeds = session.graph().find("Zoo:Feeds").unwrap().id;
    let class_map = session.class_map(feeds).unwrap();
    assert_eq!(class_map.strategy.strategy, MapStrategy::LinkTable);
    assert!(matches!(
        class_map.kind,
        ClassMapKind::RelationshipLinkTable(_)
    ));
    assert_eq!(session.schema().table(class_map.table).name, "zoo_Feeds");

    // No foreign-key column lands in the animal tables.
    assert_eq!(column_names(&session, "zoo_Animal"), ["ECInstanceId", "Name"]);
    assert_eq!(column_names(&session, "zoo_Dog"), ["ECInstanceId", "Name"]);
}

#[test]
fn requested_foreign_key_into_several_tables_is_an_error() {
    let mut session = make_session(feeding(
        ClassDef::relationship(
            "Feeds",
            ConstraintDef::new(&["Keeper"], Multiplicity::ZERO_ONE),
            ConstraintDef::new(&["Animal"], Multiplicity::ZERO_MANY),
        )
        .map(ClassMapHint::default().relationship(RelationshipMapHint::ForeignKeyOnSource)),
    ));

    let err = session.map_all(&mut ()).unwrap_err();
    assert!(err.is_map_failure(), "{err}");
    assert_eq!(session.class_maps().len(), 0);
}

#[test]
fn shared_column_keeps_the_first_classes_attributes() {
    let session = map_all(
        SchemaDef::new("Zoo")
            .alias("zoo")
            .class(
                ClassDef::entity("Animal")
                    .map(ClassMapHint::default().strategy(MapStrategyHint::TablePerHierarchy)),
            )
            .class(
                ClassDef::entity("Dog").base("Animal").property(
                    PropertyDef::primitive("Nickname", PrimitiveType::String).map(
                        PropertyMapHint::default()
                            .not_null()
                            .collation(Collation::NoCase),
                    ),
                ),
            )
            .class(
                ClassDef::entity("Cat").base("Animal").property(
                    PropertyDef::primitive("Nickname", PrimitiveType::String)
                        .map(PropertyMapHint::default().collation(Collation::Binary)),
                ),
            ),
    );

    assert_eq!(
        column_names(&session, "zoo_Animal"),
        ["ECInstanceId", "ECClassId", "Nickname"]
    );

    let dog = session.graph().find("Zoo:Dog").unwrap().id;
    let cat = session.graph().find("Zoo:Cat").unwrap().id;
    let column = session.find_property_map(dog, "Nickname").unwrap().column();
    assert_eq!(session.find_property_map(cat, "Nickname").unwrap().column(), column);

    let nickname = session.schema().column(column.unwrap());
    assert!(!nickname.nullable);
    assert_eq!(nickname.collation, Collation::NoCase);
}

#[test]
fn self_embedding_struct_is_rejected_without_mutation() {
    let mut session = make_session(
        SchemaDef::new("Geo")
            .alias("geo")
            .class(ClassDef::entity("Site").property(PropertyDef::primitive(
                "Name",
                PrimitiveType::String,
            )))
            .class(ClassDef::structure("Node").property(PropertyDef::structure("Next", "Node"))),
    );

    let site = session.graph().find("Geo:Site").unwrap().id;
    let node = session.graph().find("Geo:Node").unwrap().id;
    session.map_class(site, &mut ()).unwrap();

    let before = session.schema().clone();
    let err = session.map_class(node, &mut ()).unwrap_err();

    assert!(err.is_map_failure(), "{err}");
    assert_eq!(session.schema(), &before);
    assert!(session.class_map(node).is_none());
}

#[test]
fn classes_sharing_a_table_are_discriminated() {
    let shared = ClassMapHint::default()
        .strategy(MapStrategyHint::SharedTableForThisClass)
        .table_name("Things");

    let session = map_all(
        SchemaDef::new("Inv")
            .class(
                ClassDef::entity("Tool")
                    .map(shared.clone())
                    .property(PropertyDef::primitive("Weight", PrimitiveType::String)),
            )
            .class(
                ClassDef::entity("Part")
                    .map(shared)
                    .property(PropertyDef::primitive("Weight", PrimitiveType::Double)),
            )
            .class(
                ClassDef::entity("Loner")
                    .property(PropertyDef::primitive("Weight", PrimitiveType::Double)),
            ),
    );

    let part = session.graph().find("Inv:Part").unwrap();
    let weight = part.own_property("Weight").unwrap().id;
    let alternate = format!("Weight_{weight}");

    assert_eq!(
        column_names(&session, "Things"),
        ["ECInstanceId", "ECClassId", "Weight", alternate.as_str()]
    );

    let column = session.find_property_map(part.id, "Weight").unwrap().column();
    let things = session.schema().find_table("Things").unwrap();
    assert_eq!(column, Some(things.column_by_name(&alternate).unwrap().id));

    let loner = session.schema().find_table("Inv_Loner").unwrap();
    assert!(loner.class_id_column().is_none());
}

#[test]
fn shared_columns_are_reused_across_siblings() {
    let session = map_all(
        SchemaDef::new("Inv")
            .class(
                ClassDef::entity("Item")
                    .abstract_class()
                    .map(
                        ClassMapHint::default()
                            .strategy(MapStrategyHint::TablePerHierarchy)
                            .shared_columns(),
                    ),
            )
            .class(
                ClassDef::entity("Bolt")
                    .base("Item")
                    .property(PropertyDef::primitive("Size", PrimitiveType::Integer)),
            )
            .class(
                ClassDef::entity("Label")
                    .base("Item")
                    .property(PropertyDef::primitive("Text", PrimitiveType::String)),
            ),
    );

    assert_eq!(
        column_names(&session, "Inv_Item"),
        ["ECInstanceId", "ECClassId", "sc01"]
    );

    let bolt = session.graph().find("Inv:Bolt").unwrap().id;
    let label = session.graph().find("Inv:Label").unwrap().id;
    assert_eq!(
        session.find_property_map(bolt, "Size").unwrap().column(),
        session.find_property_map(label, "Text").unwrap().column()
    );
}

#[test]
fn struct_arrays_get_a_secondary_table_and_trigger() {
    let session = map_all(
        SchemaDef::new("Shop")
            .alias("sh")
            .class(
                ClassDef::structure("Line")
                    .property(PropertyDef::primitive("Qty", PrimitiveType::Integer)),
            )
            .class(
                ClassDef::entity("Order")
                    .property(PropertyDef::primitive("Location", PrimitiveType::Point3d))
                    .property(PropertyDef::struct_array("Lines", "Line")),
            ),
    );

    assert_eq!(
        column_names(&session, "sh_ArrayOfLine"),
        [
            "ECInstanceId",
            "ParentECInstanceId",
            "ECPropertyPathId",
            "ECArrayIndex",
            "Qty"
        ]
    );
    assert_eq!(
        column_names(&session, "sh_Order"),
        ["ECInstanceId", "Location_X", "Location_Y", "Location_Z"]
    );

    let order = session.schema().find_table("sh_Order").unwrap();
    let [trigger] = &order.triggers[..] else {
        panic!("expected one trigger, got {:?}", order.triggers);
    };
    assert_eq!(trigger.name, "sh_Order_DeleteStructArrays");
    assert_eq!(trigger.event, TriggerEvent::Delete);
    assert_eq!(
        trigger.body,
        "DELETE FROM [sh_ArrayOfLine] WHERE [sh_ArrayOfLine].[ParentECInstanceId] = OLD.[ECInstanceId];"
    );

    let order_class = session.graph().find("Shop:Order").unwrap().id;
    let lines = session.find_property_map(order_class, "Lines").unwrap();
    assert!(matches!(
        lines.kind,
        PropertyMapKind::StructTable { array: true, .. }
    ));
    assert!(session.leaves_of(lines.id).is_empty());
}

#[test]
fn inlined_structs_flatten_into_columns() {
    let session = map_all(
        SchemaDef::new("Crm")
            .alias("crm")
            .class(
                ClassDef::structure("Address")
                    .property(PropertyDef::primitive("City", PrimitiveType::String))
                    .property(PropertyDef::primitive("Zip", PrimitiveType::String)),
            )
            .class(
                ClassDef::entity("Customer")
                    .property(PropertyDef::structure("Home", "Address"))
                    .property(PropertyDef::primitive_array("Tags", PrimitiveType::String)),
            ),
    );

    assert_eq!(
        column_names(&session, "crm_Customer"),
        ["ECInstanceId", "Home_City", "Home_Zip", "Tags"]
    );
    assert!(session.schema().find_table("crm_ArrayOfAddress").is_none());
}

#[test]
fn declared_indexes_resolve_to_columns() {
    let session = map_all(
        SchemaDef::new("Crm").alias("crm").class(
            ClassDef::entity("Customer")
                .map(ClassMapHint::default().index(IndexHint::new("ix_customer_name", &["Name"]).unique()))
                .property(PropertyDef::primitive("Name", PrimitiveType::String)),
        ),
    );

    let table = session.schema().find_table("crm_Customer").unwrap();
    let index = table.index_by_name("ix_customer_name").unwrap();
    assert!(index.unique);
    assert_eq!(index.columns, [table.column_by_name("Name").unwrap().id]);
}

#[test]
fn existing_tables_are_looked_up_not_altered() {
    let mut live = HashMap::new();
    live.insert(
        "legacy_people".to_string(),
        vec![
            LiveColumn::new("Id", "INTEGER").primary_key(1),
            LiveColumn::new("FullName", "VARCHAR(80)"),
        ],
    );

    let def = SchemaDef::new("Crm").class(
        ClassDef::entity("Person")
            .map(ClassMapHint::default().existing_table("legacy_people"))
            .property(PropertyDef::primitive("FullName", PrimitiveType::String)),
    );
    let mut session = make_session(def);
    session.map_all(&mut live).unwrap();

    let table = session.schema().find_table("legacy_people").unwrap();
    assert!(table.is_existing());
    assert_eq!(table.instance_id_column().unwrap().name, "Id");
    assert_eq!(
        table.column_by_name("Id").unwrap().kind,
        ColumnKind::INSTANCE_ID
    );

    let missing = SchemaDef::new("Crm").class(
        ClassDef::entity("Person")
            .map(ClassMapHint::default().existing_table("legacy_people"))
            .property(PropertyDef::primitive("Email", PrimitiveType::String)),
    );
    let mut session = make_session(missing);
    let err = session.map_all(&mut live).unwrap_err();
    assert!(err.is_missing_resolution(), "{err}");
}

#[test]
fn conflicting_hierarchy_strategy_is_an_error() {
    let mut session = make_session(
        SchemaDef::new("Zoo")
            .class(
                ClassDef::entity("Animal")
                    .map(ClassMapHint::default().strategy(MapStrategyHint::TablePerHierarchy)),
            )
            .class(
                ClassDef::entity("Dog")
                    .base("Animal")
                    .map(ClassMapHint::default().strategy(MapStrategyHint::TablePerClass)),
            ),
    );

    let err = session.map_all(&mut ()).unwrap_err();
    assert!(err.is_map_failure(), "{err}");
    assert_eq!(session.class_maps().len(), 0);
}

#[test]
fn class_maps_are_cached() {
    let mut session = make_session(zoo());
    let dog = session.graph().find("Zoo:Dog").unwrap().id;

    let first = session.map_class(dog, &mut ()).unwrap().clone();
    let tables = session.schema().tables().len();
    let second = session.map_class(dog, &mut ()).unwrap().clone();

    assert_eq!(first, second);
    assert_eq!(session.schema().tables().len(), tables);

    session.clear();
    assert!(session.class_map(dog).is_none());
    assert_eq!(session.schema().tables().len(), 1);
}
