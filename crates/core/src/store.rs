//! The storage interface the migration engine runs against.
//!
//! The engine never talks to a database directly: it consumes the four
//! catalog collections through this narrow read/update trait. Production
//! binds it to MongoDB (`kirana-admin`); tests bind it to an in-memory
//! implementation (`kirana-integration-tests`).

use std::future::Future;

use bson::Bson;
use bson::oid::ObjectId;

use crate::types::{LinkField, MigrationLevel, ParentCollection};

/// One parent entity: its native id and legacy code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRow {
    /// Native reference id, assigned by the store at creation.
    pub id: ObjectId,
    /// Legacy code, the mapping-table key (`department_id`,
    /// `idcategory_master`, or `idsub_category_master`).
    pub code: String,
}

/// One child entity: native id, display name, and raw link values.
///
/// Link values are raw [`Bson`] on purpose - classification into
/// migrated/unmigrated/unexpected happens in the engine, not the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildRow {
    /// Native reference id.
    pub id: ObjectId,
    /// Human-readable display name, for error reporting.
    pub name: String,
    /// The level's parent-link fields present on the document.
    pub links: Vec<(LinkField, Bson)>,
}

/// Read/update access to the four catalog collections.
///
/// Futures are `Send` so the engine can run inside multithreaded executors
/// (the admin service awaits a run from a request handler).
pub trait CatalogStore {
    /// Store-level failure (connectivity, malformed rows). Fatal to a run;
    /// per-entity problems are never surfaced through this type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Every row of a parent collection, for building its mapping table.
    fn parent_rows(
        &self,
        parent: ParentCollection,
    ) -> impl Future<Output = Result<Vec<ParentRow>, Self::Error>> + Send;

    /// One id-ordered batch of child rows, strictly after `after`.
    ///
    /// Returns at most `limit` rows; an empty batch means the level is
    /// exhausted. Ordering by native id makes pagination stable under the
    /// engine's own updates.
    fn child_batch(
        &self,
        level: MigrationLevel,
        after: Option<ObjectId>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ChildRow>, Self::Error>> + Send;

    /// Persist mapped native references onto one child document.
    ///
    /// Only the listed fields change; the store must not touch anything else
    /// on the document.
    fn persist_links(
        &self,
        level: MigrationLevel,
        id: ObjectId,
        links: &[(LinkField, ObjectId)],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

// A shared reference to a store is a store; lets callers keep inspecting the
// underlying store after handing it to the engine.
impl<S: CatalogStore + Sync> CatalogStore for &S {
    type Error = S::Error;

    fn parent_rows(
        &self,
        parent: ParentCollection,
    ) -> impl Future<Output = Result<Vec<ParentRow>, Self::Error>> + Send {
        (**self).parent_rows(parent)
    }

    fn child_batch(
        &self,
        level: MigrationLevel,
        after: Option<ObjectId>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ChildRow>, Self::Error>> + Send {
        (**self).child_batch(level, after, limit)
    }

    fn persist_links(
        &self,
        level: MigrationLevel,
        id: ObjectId,
        links: &[(LinkField, ObjectId)],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).persist_links(level, id, links)
    }
}
