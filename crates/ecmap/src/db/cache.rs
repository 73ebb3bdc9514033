use crate::catalog::Catalog;

use ecmap_core::schema::ec::SchemaDef;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// The catalog as last loaded, guarding schema-definition lookups.
#[derive(Debug)]
pub(super) struct SchemaCache {
    catalog: Mutex<Catalog>,
}

impl SchemaCache {
    pub(super) fn new(catalog: Catalog) -> SchemaCache {
        SchemaCache {
            catalog: Mutex::new(catalog),
        }
    }

    pub(super) fn snapshot(&self) -> Catalog {
        self.lock().clone()
    }

    pub(super) fn replace(&self, catalog: Catalog) {
        *self.lock() = catalog;
    }

    pub(super) fn definitions(&self) -> Vec<SchemaDef> {
        self.lock().defs.clone()
    }

    pub(super) fn definition(&self, name: &str) -> Option<SchemaDef> {
        self.lock()
            .defs
            .iter()
            .find(|def| def.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Catalog> {
        self.catalog.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
