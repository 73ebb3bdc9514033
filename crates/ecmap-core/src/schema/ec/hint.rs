use crate::schema::db::{Collation, ForeignKeyAction};

use serde::{Deserialize, Serialize};

/// Class-level mapping hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassMapHint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<MapStrategyHint>,

    /// Physical table name. Required by `SharedTableForThisClass` and by
    /// `existing_table`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,

    /// Map the class onto a table that already exists in the database.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub existing_table: bool,

    /// Store data properties in untyped shared columns.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub shared_columns: bool,

    /// Overrides whether the strategy is inherited by subclasses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_to_subclasses: Option<bool>,

    /// Name of the instance id (primary key) column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id_column: Option<String>,

    /// How a relationship class is stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationshipMapHint>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ForeignKeyAction>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ForeignKeyAction>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexHint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapStrategyHint {
    DoNotMap,
    DoNotMapHierarchy,
    TablePerHierarchy,
    TableForThisClass,
    TablePerClass,
    InParentTable,
    SharedTableForThisClass,
}

/// Storage of a relationship class.
///
/// `ForeignKeyOnSource` stores a foreign key that references the source end;
/// the column lives in the target end's table. `ForeignKeyOnTarget` is the
/// mirror image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipMapHint {
    ForeignKeyOnSource,
    ForeignKeyOnTarget,
    LinkTable,
}

/// A user-declared index over property access strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexHint {
    pub name: String,

    pub properties: Vec<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,

    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
}

/// Column-level overrides attached to a property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PropertyMapHint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collation: Option<Collation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
}

impl ClassMapHint {
    pub fn strategy(mut self, strategy: MapStrategyHint) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    pub fn existing_table(mut self, name: impl Into<String>) -> Self {
        self.existing_table = true;
        self.table_name = Some(name.into());
        self
    }

    pub fn shared_columns(mut self) -> Self {
        self.shared_columns = true;
        self
    }

    pub fn apply_to_subclasses(mut self, apply: bool) -> Self {
        self.apply_to_subclasses = Some(apply);
        self
    }

    pub fn instance_id_column(mut self, name: impl Into<String>) -> Self {
        self.instance_id_column = Some(name.into());
        self
    }

    pub fn relationship(mut self, hint: RelationshipMapHint) -> Self {
        self.relationship = Some(hint);
        self
    }

    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn index(mut self, index: IndexHint) -> Self {
        self.indexes.push(index);
        self
    }
}

impl IndexHint {
    pub fn new(name: impl Into<String>, properties: &[&str]) -> Self {
        Self {
            name: name.into(),
            properties: properties.iter().map(|p| p.to_string()).collect(),
            unique: false,
            where_clause: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn where_clause(mut self, expr: impl Into<String>) -> Self {
        self.where_clause = Some(expr.into());
        self
    }
}

impl PropertyMapHint {
    pub fn column_name(mut self, name: impl Into<String>) -> Self {
        self.column_name = Some(name.into());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = Some(false);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn collation(mut self, collation: Collation) -> Self {
        self.collation = Some(collation);
        self
    }

    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    pub fn check(mut self, expr: impl Into<String>) -> Self {
        self.check = Some(expr.into());
        self
    }
}
