//! Catalog hierarchy migration engine.
//!
//! Converts legacy-string parent links into native `ObjectId` references,
//! one level at a time:
//!
//! 1. Build the parent level's mapping table (legacy code -> native id).
//! 2. Stream child entities in id-ordered batches; classify each link field
//!    and `$set` the mapped reference where the legacy string resolves.
//! 3. Move to the next level. Levels run strictly in dependency order
//!    (categories, then sub-categories, then products), and the mapping
//!    tables for later levels are re-read from the store after the earlier
//!    level has run rather than reused from memory.
//!
//! Per-entity problems (orphaned codes, unexpected field types) accumulate
//! in the report; only store failures abort a run. Re-running is safe: links
//! that already hold a native reference are skipped by classification, so an
//! interrupted run picks up where it left off.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bson::oid::ObjectId;
use chrono::Utc;
use tracing::{info, instrument, warn};

use kirana_core::{
    CatalogStore, CategoryCode, ChildRow, DepartmentCode, LevelReport, LinkError, LinkErrorKind,
    LinkField, LinkTypeError, MigrationLevel, MigrationReport, ParentCollection, ParentLink,
    SubCategoryCode,
};

/// Default child-batch size; bounds memory on the large product collection.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Tunables for one migration run.
#[derive(Debug, Clone, Copy)]
pub struct MigratorOptions {
    /// Child rows fetched per batch.
    pub batch_size: usize,
    /// Classify and count without persisting anything.
    pub dry_run: bool,
}

impl Default for MigratorOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            dry_run: false,
        }
    }
}

/// Cooperative shutdown flag, checked before each batch.
///
/// Once triggered, no new batch is started; the in-flight batch is completed
/// and flushed, so an interrupt never leaves a half-applied batch behind.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    /// Create an untriggered flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a graceful stop.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The migration engine, generic over its store.
pub struct HierarchyMigrator<S> {
    store: S,
    options: MigratorOptions,
    shutdown: ShutdownFlag,
}

impl<S: CatalogStore> HierarchyMigrator<S> {
    /// Create a migrator over the given store.
    pub fn new(store: S, options: MigratorOptions) -> Self {
        Self {
            store,
            options,
            shutdown: ShutdownFlag::default(),
        }
    }

    /// Attach a shutdown flag (e.g. wired to Ctrl-C).
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: ShutdownFlag) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Run the full migration and return its report.
    ///
    /// # Errors
    ///
    /// Propagates store failures (connectivity, malformed rows). Per-entity
    /// problems never abort the run; they are recorded in the report.
    #[instrument(
        skip(self),
        fields(batch_size = self.options.batch_size, dry_run = self.options.dry_run)
    )]
    pub async fn run(&self) -> Result<MigrationReport, S::Error> {
        let started_at = Utc::now();

        // The department collection is never mutated by migration, so one
        // read serves both the category and product levels.
        let mut maps = LevelMaps {
            departments: self.parent_map(ParentCollection::Departments).await?,
            categories: HashMap::new(),
            sub_categories: HashMap::new(),
        };

        let mut levels = Vec::with_capacity(MigrationLevel::ALL.len());
        let mut interrupted = false;
        for level in MigrationLevel::ALL {
            match level {
                MigrationLevel::Categories => {}
                MigrationLevel::SubCategories => {
                    maps.categories = self.parent_map(ParentCollection::Categories).await?;
                }
                MigrationLevel::Products => {
                    maps.sub_categories = self.parent_map(ParentCollection::SubCategories).await?;
                }
            }

            let report = self.migrate_level(level, &maps).await?;
            info!(
                level = %level,
                total = report.total,
                updated = report.updated,
                skipped = report.skipped,
                errors = report.errors.len(),
                "level finished"
            );
            levels.push(report);

            if self.shutdown.is_triggered() {
                interrupted = true;
                break;
            }
        }

        Ok(MigrationReport {
            levels,
            dry_run: self.options.dry_run,
            interrupted,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Migrate one child level against the current mapping tables.
    async fn migrate_level(
        &self,
        level: MigrationLevel,
        maps: &LevelMaps,
    ) -> Result<LevelReport, S::Error> {
        let mut report = LevelReport::new(level);
        let mut after: Option<ObjectId> = None;

        loop {
            if self.shutdown.is_triggered() {
                break;
            }

            let batch = self
                .store
                .child_batch(level, after, self.options.batch_size)
                .await?;
            let Some(last) = batch.last() else { break };
            after = Some(last.id);
            let exhausted = batch.len() < self.options.batch_size;

            for row in &batch {
                let plan = plan_entity(row, maps);
                if !self.options.dry_run && !plan.updates.is_empty() {
                    self.store.persist_links(level, row.id, &plan.updates).await?;
                }
                absorb(&mut report, row, plan);
            }

            if exhausted {
                break;
            }
        }

        Ok(report)
    }

    /// Build the mapping table for one parent collection.
    async fn parent_map<C>(&self, parent: ParentCollection) -> Result<HashMap<C, ObjectId>, S::Error>
    where
        C: From<String> + Eq + Hash + std::fmt::Display,
    {
        let rows = self.store.parent_rows(parent).await?;
        let mut map = HashMap::with_capacity(rows.len());
        for row in rows {
            let code = C::from(row.code);
            if map.contains_key(&code) {
                // Last occurrence wins, matching a naive full-scan rebuild.
                warn!(collection = %parent, code = %code, "duplicate legacy code in parent collection");
            }
            map.insert(code, row.id);
        }
        Ok(map)
    }
}

/// In-memory mapping tables for the three parent levels.
struct LevelMaps {
    departments: HashMap<DepartmentCode, ObjectId>,
    categories: HashMap<CategoryCode, ObjectId>,
    sub_categories: HashMap<SubCategoryCode, ObjectId>,
}

impl LevelMaps {
    /// Resolve a legacy code against the table for the given link field.
    fn resolve(&self, field: LinkField, code: &str) -> Option<ObjectId> {
        match field {
            LinkField::DeptId => self.departments.get(code).copied(),
            LinkField::CategoryId => self.categories.get(code).copied(),
            LinkField::SubCategoryId => self.sub_categories.get(code).copied(),
        }
    }
}

/// Classified outcome for one entity, before persistence.
#[derive(Debug, Default)]
struct EntityPlan {
    /// Link fields to rewrite with their mapped native ids.
    updates: Vec<(LinkField, ObjectId)>,
    /// Link fields that cannot be migrated, with the reason.
    errors: Vec<(LinkField, LinkErrorKind)>,
}

/// Classify every link field on one child row against the mapping tables.
///
/// Fields already holding a native reference are left alone (idempotence);
/// legacy strings either resolve to an update or record an orphan; any other
/// BSON type records an unexpected-type error.
fn plan_entity(row: &ChildRow, maps: &LevelMaps) -> EntityPlan {
    let mut plan = EntityPlan::default();
    for (field, value) in &row.links {
        match ParentLink::classify(value) {
            Ok(ParentLink::Migrated(_)) => {}
            Ok(ParentLink::Unmigrated(code)) => match maps.resolve(*field, &code) {
                Some(parent_id) => plan.updates.push((*field, parent_id)),
                None => plan
                    .errors
                    .push((*field, LinkErrorKind::Orphan { legacy_id: code })),
            },
            Err(LinkTypeError::UnexpectedType { found }) => plan.errors.push((
                *field,
                LinkErrorKind::UnexpectedType {
                    found: found.to_owned(),
                },
            )),
        }
    }
    plan
}

/// Fold one entity's plan into the level report.
///
/// The entity counts once: updated if any link was persisted (or planned, on
/// dry runs), otherwise errored if any link failed, otherwise skipped. Error
/// entries are recorded per offending field regardless of the bucket.
fn absorb(report: &mut LevelReport, row: &ChildRow, plan: EntityPlan) {
    report.total += 1;
    if !plan.updates.is_empty() {
        report.updated += 1;
    } else if plan.errors.is_empty() {
        report.skipped += 1;
    } else {
        report.errored += 1;
    }

    for (field, kind) in plan.errors {
        report.errors.push(LinkError {
            entity_id: row.id.to_hex(),
            entity_name: row.name.clone(),
            field,
            kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use bson::Bson;

    use super::*;

    fn maps_with_department(code: &str, id: ObjectId) -> LevelMaps {
        let mut departments = HashMap::new();
        departments.insert(DepartmentCode::new(code), id);
        LevelMaps {
            departments,
            categories: HashMap::new(),
            sub_categories: HashMap::new(),
        }
    }

    fn row(links: Vec<(LinkField, Bson)>) -> ChildRow {
        ChildRow {
            id: ObjectId::new(),
            name: "Snacks".to_owned(),
            links,
        }
    }

    #[test]
    fn test_plan_maps_legacy_string() {
        let dept = ObjectId::new();
        let maps = maps_with_department("2", dept);
        let row = row(vec![(LinkField::DeptId, Bson::String("2".to_owned()))]);

        let plan = plan_entity(&row, &maps);
        assert_eq!(plan.updates, vec![(LinkField::DeptId, dept)]);
        assert!(plan.errors.is_empty());
    }

    #[test]
    fn test_plan_reports_orphan() {
        let maps = maps_with_department("2", ObjectId::new());
        let row = row(vec![(LinkField::DeptId, Bson::String("99".to_owned()))]);

        let plan = plan_entity(&row, &maps);
        assert!(plan.updates.is_empty());
        assert_eq!(
            plan.errors,
            vec![(
                LinkField::DeptId,
                LinkErrorKind::Orphan {
                    legacy_id: "99".to_owned()
                }
            )]
        );
    }

    #[test]
    fn test_plan_skips_native_reference() {
        let maps = maps_with_department("2", ObjectId::new());
        let row = row(vec![(LinkField::DeptId, Bson::ObjectId(ObjectId::new()))]);

        let plan = plan_entity(&row, &maps);
        assert!(plan.updates.is_empty());
        assert!(plan.errors.is_empty());
    }

    #[test]
    fn test_plan_reports_unexpected_type() {
        let maps = maps_with_department("2", ObjectId::new());
        let row = row(vec![(LinkField::DeptId, Bson::Int32(2))]);

        let plan = plan_entity(&row, &maps);
        assert_eq!(
            plan.errors,
            vec![(
                LinkField::DeptId,
                LinkErrorKind::UnexpectedType {
                    found: "int32".to_owned()
                }
            )]
        );
    }

    #[test]
    fn test_plan_mixed_product_links() {
        let dept = ObjectId::new();
        let mut maps = maps_with_department("2", dept);
        maps.categories.insert(CategoryCode::new("C9"), ObjectId::new());

        // dept resolves, category already migrated, sub-category orphaned
        let row = row(vec![
            (LinkField::DeptId, Bson::String("2".to_owned())),
            (LinkField::CategoryId, Bson::ObjectId(ObjectId::new())),
            (LinkField::SubCategoryId, Bson::String("SC-404".to_owned())),
        ]);

        let plan = plan_entity(&row, &maps);
        assert_eq!(plan.updates, vec![(LinkField::DeptId, dept)]);
        assert_eq!(
            plan.errors,
            vec![(
                LinkField::SubCategoryId,
                LinkErrorKind::Orphan {
                    legacy_id: "SC-404".to_owned()
                }
            )]
        );
    }

    #[test]
    fn test_absorb_bucket_precedence() {
        let mut report = LevelReport::new(MigrationLevel::Products);
        let entity = row(vec![]);

        // updated wins over errored
        absorb(
            &mut report,
            &entity,
            EntityPlan {
                updates: vec![(LinkField::DeptId, ObjectId::new())],
                errors: vec![(
                    LinkField::CategoryId,
                    LinkErrorKind::Orphan {
                        legacy_id: "C-404".to_owned(),
                    },
                )],
            },
        );
        // error only
        absorb(
            &mut report,
            &entity,
            EntityPlan {
                updates: Vec::new(),
                errors: vec![(
                    LinkField::DeptId,
                    LinkErrorKind::Orphan {
                        legacy_id: "99".to_owned(),
                    },
                )],
            },
        );
        // nothing to do
        absorb(&mut report, &entity, EntityPlan::default());

        assert_eq!(report.total, 3);
        assert_eq!(report.updated, 1);
        assert_eq!(report.errored, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_shutdown_flag() {
        let flag = ShutdownFlag::new();
        assert!(!flag.is_triggered());
        let clone = flag.clone();
        clone.trigger();
        assert!(flag.is_triggered());
    }
}
