//! Migration report types.
//!
//! A run produces one [`MigrationReport`] with a [`LevelReport`] per child
//! level. Counts are per entity; error entries are per offending link field.
//! The report always carries the full error list - truncation is a concern of
//! display sites only, which use [`LevelReport::preview`] and print the total
//! alongside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{LinkField, MigrationLevel};

/// Why a link field could not be migrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkErrorKind {
    /// The legacy code matched no parent entity.
    Orphan {
        /// The offending legacy id, exactly as stored.
        legacy_id: String,
    },
    /// The field held neither a string nor a native reference.
    UnexpectedType {
        /// BSON type name of the offending value.
        found: String,
    },
}

/// One unmigratable link field on one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkError {
    /// Hex representation of the entity's native id.
    pub entity_id: String,
    /// The entity's human-readable display name.
    pub entity_name: String,
    /// The link field that could not be migrated.
    pub field: LinkField,
    #[serde(flatten)]
    pub kind: LinkErrorKind,
}

/// Outcome of one migration level.
///
/// `updated`, `errored`, and `skipped` count entities and are disjoint
/// (an entity that both persisted a link and recorded an error counts as
/// updated); `errors` has one entry per offending link field, so its length
/// can exceed `errored`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelReport {
    /// Which level this report covers.
    pub level: MigrationLevel,
    /// Entities examined.
    pub total: u64,
    /// Entities with at least one link persisted (or planned, on dry runs).
    pub updated: u64,
    /// Entities with no persisted link and at least one error.
    pub errored: u64,
    /// Entities with nothing to do - every link already migrated or absent.
    pub skipped: u64,
    /// Every unmigratable link, one entry per offending field.
    pub errors: Vec<LinkError>,
}

impl LevelReport {
    /// Empty report for a level.
    #[must_use]
    pub const fn new(level: MigrationLevel) -> Self {
        Self {
            level,
            total: 0,
            updated: 0,
            errored: 0,
            skipped: 0,
            errors: Vec::new(),
        }
    }

    /// Whether the level completed without a single error entry.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// At most `limit` error entries, for bounded display.
    ///
    /// The underlying report keeps the full list; callers printing a preview
    /// must also print `errors.len()` so the truncation is visible.
    #[must_use]
    pub fn preview(&self, limit: usize) -> &[LinkError] {
        self.errors.get(..limit.min(self.errors.len())).unwrap_or(&[])
    }
}

/// Outcome of one full migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Per-level outcomes, in the order the levels ran.
    pub levels: Vec<LevelReport>,
    /// True if classification ran without persisting anything.
    pub dry_run: bool,
    /// True if the run stopped early on a shutdown signal. Already-applied
    /// updates stay applied; a re-run resumes safely.
    pub interrupted: bool,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

impl MigrationReport {
    /// Entities updated across all levels.
    #[must_use]
    pub fn total_updated(&self) -> u64 {
        self.levels.iter().map(|level| level.updated).sum()
    }

    /// Error entries across all levels.
    #[must_use]
    pub fn total_errors(&self) -> usize {
        self.levels.iter().map(|level| level.errors.len()).sum()
    }

    /// Whether every level completed without errors.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.levels.iter().all(LevelReport::is_clean)
    }

    /// The report for one level, if that level ran.
    #[must_use]
    pub fn level(&self, level: MigrationLevel) -> Option<&LevelReport> {
        self.levels.iter().find(|report| report.level == level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orphan(entity_id: &str, legacy_id: &str) -> LinkError {
        LinkError {
            entity_id: entity_id.to_owned(),
            entity_name: "Basmati Rice".to_owned(),
            field: LinkField::DeptId,
            kind: LinkErrorKind::Orphan {
                legacy_id: legacy_id.to_owned(),
            },
        }
    }

    fn report_with_errors(count: usize) -> LevelReport {
        let mut report = LevelReport::new(MigrationLevel::Products);
        for i in 0..count {
            report.errors.push(orphan(&format!("id-{i}"), "99"));
        }
        report.errored = count as u64;
        report.total = count as u64;
        report
    }

    #[test]
    fn test_preview_is_bounded_but_list_is_full() {
        let report = report_with_errors(25);
        assert_eq!(report.preview(20).len(), 20);
        assert_eq!(report.errors.len(), 25);
        assert_eq!(report.preview(100).len(), 25);
        assert!(report.preview(0).is_empty());
    }

    #[test]
    fn test_is_clean() {
        assert!(LevelReport::new(MigrationLevel::Categories).is_clean());
        assert!(!report_with_errors(1).is_clean());
    }

    #[test]
    fn test_report_totals() {
        let now = Utc::now();
        let mut categories = LevelReport::new(MigrationLevel::Categories);
        categories.updated = 3;
        let products = report_with_errors(2);

        let report = MigrationReport {
            levels: vec![categories, products],
            dry_run: false,
            interrupted: false,
            started_at: now,
            finished_at: now,
        };

        assert_eq!(report.total_updated(), 3);
        assert_eq!(report.total_errors(), 2);
        assert!(!report.is_clean());
        assert_eq!(
            report
                .level(MigrationLevel::Products)
                .map(|level| level.errors.len()),
            Some(2)
        );
        assert!(report.level(MigrationLevel::SubCategories).is_none());
    }

    #[test]
    fn test_error_entry_json_shape() {
        let entry = orphan("64f0aa", "99");
        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(json["entity_id"], "64f0aa");
        assert_eq!(json["entity_name"], "Basmati Rice");
        assert_eq!(json["field"], "dept_id");
        assert_eq!(json["kind"], "orphan");
        assert_eq!(json["legacy_id"], "99");

        let type_error = LinkError {
            kind: LinkErrorKind::UnexpectedType {
                found: "int32".to_owned(),
            },
            ..entry
        };
        let json = serde_json::to_value(&type_error).expect("serialize");
        assert_eq!(json["kind"], "unexpected_type");
        assert_eq!(json["found"], "int32");
    }
}
