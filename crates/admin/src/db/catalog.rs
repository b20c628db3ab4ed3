//! Catalog collection access for the migration engine.
//!
//! Implements [`CatalogStore`] against MongoDB. Child collections are paged
//! by `_id` (`$gt` + ascending sort), so pagination stays stable while the
//! engine rewrites link fields on rows it has already passed.

use bson::oid::ObjectId;
use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::Database;

use kirana_core::{
    CatalogStore, ChildRow, LinkField, MigrationLevel, ParentCollection, ParentRow,
};

use super::RepositoryError;

/// Name used in reports when a document has no display name.
const UNNAMED: &str = "(unnamed)";

/// MongoDB-backed catalog store.
pub struct MongoCatalog {
    db: Database,
}

impl MongoCatalog {
    /// Create a store over the given database.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

impl CatalogStore for MongoCatalog {
    type Error = RepositoryError;

    async fn parent_rows(
        &self,
        parent: ParentCollection,
    ) -> Result<Vec<ParentRow>, RepositoryError> {
        let collection = self.db.collection::<Document>(parent.collection());

        let mut projection = Document::new();
        projection.insert("_id", 1);
        projection.insert(parent.code_field(), 1);

        let mut cursor = collection.find(doc! {}).projection(projection).await?;
        let mut rows = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            if let Some(row) = parent_row(&document, parent)? {
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
        let collection = self.db.collection::<Document>(level.collection());
        let filter = after.map_or_else(Document::new, |id| doc! { "_id": { "$gt": id } });

        let mut cursor = collection
            .find(filter)
            .sort(doc! { "_id": 1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await?;

        let mut rows = Vec::with_capacity(limit);
        while let Some(document) = cursor.try_next().await? {
            rows.push(child_row(&document, level)?);
        }
        Ok(rows)
    }

    async fn persist_links(
        &self,
        level: MigrationLevel,
        id: ObjectId,
        links: &[(LinkField, ObjectId)],
    ) -> Result<(), RepositoryError> {
        if links.is_empty() {
            return Ok(());
        }

        let mut set = Document::new();
        for (field, parent_id) in links {
            set.insert(field.field_name(), *parent_id);
        }

        let collection = self.db.collection::<Document>(level.collection());
        collection
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;
        Ok(())
    }
}

/// Extract a mapping-table row from a parent document.
///
/// A parent whose legacy code is missing or non-string cannot key a mapping
/// table; the row is skipped with a warning, and its children surface as
/// orphans in the report rather than aborting the run.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if the document has no
/// `ObjectId` `_id`.
pub fn parent_row(
    document: &Document,
    parent: ParentCollection,
) -> Result<Option<ParentRow>, RepositoryError> {
    let id = document_id(document, parent.collection())?;
    match document.get(parent.code_field()) {
        Some(Bson::String(code)) => Ok(Some(ParentRow {
            id,
            code: code.clone(),
        })),
        Some(other) => {
            tracing::warn!(
                collection = parent.collection(),
                id = %id,
                found = ?other.element_type(),
                "skipping parent with non-string legacy code"
            );
            Ok(None)
        }
        None => {
            tracing::warn!(
                collection = parent.collection(),
                id = %id,
                field = parent.code_field(),
                "skipping parent with missing legacy code"
            );
            Ok(None)
        }
    }
}

/// Extract a child row (id, display name, raw link values) from a document.
///
/// Link fields absent from the document are omitted from the row - there is
/// nothing to migrate for them. Link values are passed through raw; the
/// engine classifies them.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if the document has no
/// `ObjectId` `_id`.
pub fn child_row(document: &Document, level: MigrationLevel) -> Result<ChildRow, RepositoryError> {
    let id = document_id(document, level.collection())?;
    let name = document
        .get_str(level.name_field())
        .unwrap_or(UNNAMED)
        .to_owned();
    let links = level
        .link_fields()
        .iter()
        .filter_map(|field| {
            document
                .get(field.field_name())
                .map(|value| (*field, value.clone()))
        })
        .collect();

    Ok(ChildRow { id, name, links })
}

fn document_id(document: &Document, collection: &str) -> Result<ObjectId, RepositoryError> {
    document.get_object_id("_id").map_err(|_| {
        RepositoryError::DataCorruption(format!("{collection} document missing ObjectId _id"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_row_with_string_code() {
        let id = ObjectId::new();
        let document = doc! { "_id": id, "department_id": "2", "department_name": "Grocery" };

        let row = parent_row(&document, ParentCollection::Departments)
            .expect("extract")
            .expect("usable row");
        assert_eq!(row.id, id);
        assert_eq!(row.code, "2");
    }

    #[test]
    fn test_parent_row_skips_non_string_code() {
        let document = doc! { "_id": ObjectId::new(), "department_id": 2_i32 };
        let row = parent_row(&document, ParentCollection::Departments).expect("extract");
        assert!(row.is_none());

        let document = doc! { "_id": ObjectId::new() };
        let row = parent_row(&document, ParentCollection::Departments).expect("extract");
        assert!(row.is_none());
    }

    #[test]
    fn test_parent_row_requires_object_id() {
        let document = doc! { "_id": "not-an-object-id", "department_id": "2" };
        let err = parent_row(&document, ParentCollection::Departments).expect_err("corrupt");
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[test]
    fn test_child_row_collects_link_fields() {
        let id = ObjectId::new();
        let dept = ObjectId::new();
        let document = doc! {
            "_id": id,
            "product_name": "Basmati Rice 5kg",
            "p_code": "P-100",
            "dept_id": dept,
            "category_id": "C9",
            // sub_category_id absent on purpose
        };

        let row = child_row(&document, MigrationLevel::Products).expect("extract");
        assert_eq!(row.id, id);
        assert_eq!(row.name, "Basmati Rice 5kg");
        assert_eq!(
            row.links,
            vec![
                (LinkField::DeptId, Bson::ObjectId(dept)),
                (LinkField::CategoryId, Bson::String("C9".to_owned())),
            ]
        );
    }

    #[test]
    fn test_child_row_name_fallback() {
        let document = doc! { "_id": ObjectId::new(), "dept_id": "2" };
        let row = child_row(&document, MigrationLevel::Categories).expect("extract");
        assert_eq!(row.name, UNNAMED);
    }
}
