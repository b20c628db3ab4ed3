//! Integration test support for Kirana.
//!
//! Provides an in-memory [`CatalogStore`] so the migration engine can be
//! exercised end-to-end without a MongoDB instance. Documents are stored as
//! raw BSON and go through the same document-to-row extraction as the
//! production store, so classification semantics match exactly.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kirana-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::Mutex;

use bson::oid::ObjectId;
use bson::{Bson, Document, doc};

use kirana_admin::db::RepositoryError;
use kirana_admin::db::catalog::{child_row, parent_row};
use kirana_core::{CatalogStore, ChildRow, LinkField, MigrationLevel, ParentCollection, ParentRow};

/// In-memory catalog store backed by BSON documents.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    collections: Mutex<HashMap<&'static str, Vec<Document>>>,
}

impl MemoryCatalog {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document into a collection and return its generated id.
    pub fn insert(&self, collection: &'static str, mut document: Document) -> ObjectId {
        let id = ObjectId::new();
        document.insert("_id", id);
        self.collections
            .lock()
            .expect("collections lock")
            .entry(collection)
            .or_default()
            .push(document);
        id
    }

    /// Fetch one document by id.
    #[must_use]
    pub fn find(&self, collection: &str, id: ObjectId) -> Option<Document> {
        self.collections
            .lock()
            .expect("collections lock")
            .get(collection)
            .and_then(|documents| {
                documents
                    .iter()
                    .find(|document| document.get_object_id("_id").is_ok_and(|did| did == id))
                    .cloned()
            })
    }

    /// Current value of one field on one document.
    #[must_use]
    pub fn field(&self, collection: &str, id: ObjectId, field: &str) -> Option<Bson> {
        self.find(collection, id)
            .and_then(|document| document.get(field).cloned())
    }
}

impl CatalogStore for MemoryCatalog {
    type Error = RepositoryError;

    async fn parent_rows(
        &self,
        parent: ParentCollection,
    ) -> Result<Vec<ParentRow>, RepositoryError> {
        let collections = self.collections.lock().expect("collections lock");
        let mut rows = Vec::new();
        for document in collections.get(parent.collection()).into_iter().flatten() {
            if let Some(row) = parent_row(document, parent)? {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    async fn child_batch(
        &self,
        level: MigrationLevel,
        after: Option<ObjectId>,
        limit: usize,
    ) -> Result<Vec<ChildRow>, RepositoryError> {
        let collections = self.collections.lock().expect("collections lock");
        let mut rows = collections
            .get(level.collection())
            .into_iter()
            .flatten()
            .map(|document| child_row(document, level))
            .collect::<Result<Vec<_>, _>>()?;
        rows.sort_by_key(|row| row.id);

        Ok(rows
            .into_iter()
            .filter(|row| after.is_none_or(|boundary| row.id > boundary))
            .take(limit)
            .collect())
    }

    async fn persist_links(
        &self,
        level: MigrationLevel,
        id: ObjectId,
        links: &[(LinkField, ObjectId)],
    ) -> Result<(), RepositoryError> {
        let mut collections = self.collections.lock().expect("collections lock");
        if let Some(document) = collections
            .get_mut(level.collection())
            .and_then(|documents| {
                documents
                    .iter_mut()
                    .find(|document| document.get_object_id("_id").is_ok_and(|did| did == id))
            })
        {
            for (field, parent_id) in links {
                document.insert(field.field_name(), *parent_id);
            }
        }
        Ok(())
    }
}

/// Store whose reads always fail, for exercising fatal-error propagation.
#[derive(Debug, Default)]
pub struct UnreachableCatalog;

impl UnreachableCatalog {
    fn error() -> RepositoryError {
        RepositoryError::DataCorruption("catalog unreachable".to_owned())
    }
}

impl CatalogStore for UnreachableCatalog {
    type Error = RepositoryError;

    async fn parent_rows(
        &self,
        _parent: ParentCollection,
    ) -> Result<Vec<ParentRow>, RepositoryError> {
        Err(Self::error())
    }

    async fn child_batch(
        &self,
        _level: MigrationLevel,
        _after: Option<ObjectId>,
        _limit: usize,
    ) -> Result<Vec<ChildRow>, RepositoryError> {
        Err(Self::error())
    }

    async fn persist_links(
        &self,
        _level: MigrationLevel,
        _id: ObjectId,
        _links: &[(LinkField, ObjectId)],
    ) -> Result<(), RepositoryError> {
        Err(Self::error())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Insert a department with the given legacy code.
pub fn seed_department(store: &MemoryCatalog, code: &str, name: &str) -> ObjectId {
    store.insert(
        "departments",
        doc! { "department_id": code, "department_name": name },
    )
}

/// Insert a category; `dept` is the raw value stored in `dept_id`.
pub fn seed_category(
    store: &MemoryCatalog,
    code: &str,
    name: &str,
    dept: impl Into<Bson>,
) -> ObjectId {
    store.insert(
        "categories",
        doc! { "idcategory_master": code, "category_name": name, "dept_id": dept.into() },
    )
}

/// Insert a sub-category; `category` is the raw value stored in `category_id`.
pub fn seed_sub_category(
    store: &MemoryCatalog,
    code: &str,
    name: &str,
    category: impl Into<Bson>,
) -> ObjectId {
    store.insert(
        "sub_categories",
        doc! {
            "idsub_category_master": code,
            "sub_category_name": name,
            "category_id": category.into(),
        },
    )
}

/// Insert a product with raw values for all three parent links.
pub fn seed_product(
    store: &MemoryCatalog,
    code: &str,
    name: &str,
    dept: impl Into<Bson>,
    category: impl Into<Bson>,
    sub_category: impl Into<Bson>,
) -> ObjectId {
    store.insert(
        "products",
        doc! {
            "p_code": code,
            "product_name": name,
            "dept_id": dept.into(),
            "category_id": category.into(),
            "sub_category_id": sub_category.into(),
        },
    )
}
