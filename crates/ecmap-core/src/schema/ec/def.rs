use super::{
    ClassKind, ClassMapHint, Direction, Modifier, Multiplicity, PrimitiveType, PropertyMapHint,
    Strength,
};

use serde::{Deserialize, Serialize};

/// A schema definition document.
///
/// Class references are written either as `Class` (same schema) or as
/// `Schema:Class`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDef {
    pub name: String,

    /// Prefix of default table names. Defaults to the schema name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(default)]
    pub classes: Vec<ClassDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDef {
    pub name: String,

    #[serde(default)]
    pub kind: ClassKind,

    #[serde(default)]
    pub modifier: Modifier,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mixins: Vec<String>,

    #[serde(default)]
    pub properties: Vec<PropertyDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationshipDef>,

    #[serde(default)]
    pub map: ClassMapHint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,

    #[serde(flatten)]
    pub kind: PropertyKindDef,

    #[serde(default)]
    pub map: PropertyMapHint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyKindDef {
    Primitive {
        #[serde(rename = "type")]
        ty: PrimitiveType,
    },
    PrimitiveArray {
        #[serde(rename = "type")]
        ty: PrimitiveType,
    },
    Struct {
        class: String,
    },
    StructArray {
        class: String,
    },
    Navigation {
        relationship: String,
        #[serde(default)]
        direction: Direction,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationshipDef {
    #[serde(default)]
    pub strength: Strength,
    pub source: ConstraintDef,
    pub target: ConstraintDef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintDef {
    pub classes: Vec<String>,
    pub multiplicity: Multiplicity,
    #[serde(default = "default_polymorphic")]
    pub polymorphic: bool,
}

fn default_polymorphic() -> bool {
    true
}

impl SchemaDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            classes: vec![],
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn class(mut self, class: ClassDef) -> Self {
        self.classes.push(class);
        self
    }

    /// The alias, falling back to the schema name.
    pub fn effective_alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl ClassDef {
    fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            modifier: Modifier::None,
            base: None,
            mixins: vec![],
            properties: vec![],
            relationship: None,
            map: ClassMapHint::default(),
        }
    }

    pub fn entity(name: impl Into<String>) -> Self {
        Self::new(name, ClassKind::Entity)
    }

    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(name, ClassKind::Struct)
    }

    pub fn mixin(name: impl Into<String>) -> Self {
        Self::new(name, ClassKind::Mixin)
    }

    pub fn relationship(
        name: impl Into<String>,
        source: ConstraintDef,
        target: ConstraintDef,
    ) -> Self {
        let mut def = Self::new(name, ClassKind::Relationship);
        def.relationship = Some(RelationshipDef {
            strength: Strength::Referencing,
            source,
            target,
        });
        def
    }

    pub fn abstract_class(mut self) -> Self {
        self.modifier = Modifier::Abstract;
        self
    }

    pub fn sealed(mut self) -> Self {
        self.modifier = Modifier::Sealed;
        self
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn mixin_of(mut self, mixin: impl Into<String>) -> Self {
        self.mixins.push(mixin.into());
        self
    }

    pub fn property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    pub fn map(mut self, hint: ClassMapHint) -> Self {
        self.map = hint;
        self
    }

    pub fn strength(mut self, strength: Strength) -> Self {
        if let Some(relationship) = &mut self.relationship {
            relationship.strength = strength;
        }
        self
    }
}

impl PropertyDef {
    fn new(name: impl Into<String>, kind: PropertyKindDef) -> Self {
        Self {
            name: name.into(),
            kind,
            map: PropertyMapHint::default(),
        }
    }

    pub fn primitive(name: impl Into<String>, ty: PrimitiveType) -> Self {
        Self::new(name, PropertyKindDef::Primitive { ty })
    }

    pub fn primitive_array(name: impl Into<String>, ty: PrimitiveType) -> Self {
        Self::new(name, PropertyKindDef::PrimitiveArray { ty })
    }

    pub fn structure(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self::new(
            name,
            PropertyKindDef::Struct {
                class: class.into(),
            },
        )
    }

    pub fn struct_array(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self::new(
            name,
            PropertyKindDef::StructArray {
                class: class.into(),
            },
        )
    }

    pub fn navigation(
        name: impl Into<String>,
        relationship: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self::new(
            name,
            PropertyKindDef::Navigation {
                relationship: relationship.into(),
                direction,
            },
        )
    }

    pub fn map(mut self, hint: PropertyMapHint) -> Self {
        self.map = hint;
        self
    }
}

impl ConstraintDef {
    pub fn new(classes: &[&str], multiplicity: Multiplicity) -> Self {
        Self {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            multiplicity,
            polymorphic: true,
        }
    }

    pub fn exact(mut self) -> Self {
        self.polymorphic = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_kind_is_flattened() {
        let json = r#"{
            "name": "Zoo",
            "classes": [
                {
                    "name": "Animal",
                    "modifier": "abstract",
                    "map": { "strategy": "TablePerHierarchy", "table_name": "AnimalTable" },
                    "properties": [
                        { "name": "Name", "kind": "primitive", "type": "string" },
                        { "name": "Tags", "kind": "primitive_array", "type": "int" }
                    ]
                }
            ]
        }"#;

        let schema: SchemaDef = serde_json::from_str(json).unwrap();
        let animal = &schema.classes[0];

        assert_eq!(animal.modifier, Modifier::Abstract);
        assert_eq!(animal.map.table_name.as_deref(), Some("AnimalTable"));
        assert_eq!(
            animal.properties[1].kind,
            PropertyKindDef::PrimitiveArray {
                ty: PrimitiveType::Integer
            }
        );
        assert_eq!(schema.effective_alias(), "Zoo");
    }
}
