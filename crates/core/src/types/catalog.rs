//! Catalog hierarchy topology.
//!
//! The catalog is a strict four-level hierarchy stored in four collections:
//!
//! ```text
//! departments -> categories -> sub_categories -> products
//! ```
//!
//! Migration runs over the three child levels in dependency order; each
//! level's parent-link fields are resolved against mapping tables built from
//! the parent collections. The enums here name the pieces of that topology so
//! the rest of the workspace never hard-codes a collection or field name.

use serde::{Deserialize, Serialize};

/// The three migration levels, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationLevel {
    Categories,
    SubCategories,
    Products,
}

impl MigrationLevel {
    /// All levels, in the order they must run.
    pub const ALL: [Self; 3] = [Self::Categories, Self::SubCategories, Self::Products];

    /// Collection the level's child entities live in.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::SubCategories => "sub_categories",
            Self::Products => "products",
        }
    }

    /// Field holding the entity's human-readable display name.
    #[must_use]
    pub const fn name_field(self) -> &'static str {
        match self {
            Self::Categories => "category_name",
            Self::SubCategories => "sub_category_name",
            Self::Products => "product_name",
        }
    }

    /// Parent-link fields migrated at this level.
    #[must_use]
    pub const fn link_fields(self) -> &'static [LinkField] {
        match self {
            Self::Categories => &[LinkField::DeptId],
            Self::SubCategories => &[LinkField::CategoryId],
            Self::Products => &[
                LinkField::DeptId,
                LinkField::CategoryId,
                LinkField::SubCategoryId,
            ],
        }
    }
}

impl std::fmt::Display for MigrationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.collection())
    }
}

/// A parent-link field on a child document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkField {
    DeptId,
    CategoryId,
    SubCategoryId,
}

impl LinkField {
    /// BSON field name on the child document.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::DeptId => "dept_id",
            Self::CategoryId => "category_id",
            Self::SubCategoryId => "sub_category_id",
        }
    }

    /// Parent collection the field's mapping table is built from.
    #[must_use]
    pub const fn parent(self) -> ParentCollection {
        match self {
            Self::DeptId => ParentCollection::Departments,
            Self::CategoryId => ParentCollection::Categories,
            Self::SubCategoryId => ParentCollection::SubCategories,
        }
    }
}

impl std::fmt::Display for LinkField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

/// The parent collections mapping tables are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentCollection {
    Departments,
    Categories,
    SubCategories,
}

impl ParentCollection {
    /// Collection the parent entities live in.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Departments => "departments",
            Self::Categories => "categories",
            Self::SubCategories => "sub_categories",
        }
    }

    /// Field holding the parent's legacy code, the key of its mapping table.
    #[must_use]
    pub const fn code_field(self) -> &'static str {
        match self {
            Self::Departments => "department_id",
            Self::Categories => "idcategory_master",
            Self::SubCategories => "idsub_category_master",
        }
    }
}

impl std::fmt::Display for ParentCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.collection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_run_in_dependency_order() {
        assert_eq!(
            MigrationLevel::ALL,
            [
                MigrationLevel::Categories,
                MigrationLevel::SubCategories,
                MigrationLevel::Products,
            ]
        );
    }

    #[test]
    fn test_link_fields_per_level() {
        assert_eq!(
            MigrationLevel::Categories.link_fields(),
            &[LinkField::DeptId]
        );
        assert_eq!(
            MigrationLevel::SubCategories.link_fields(),
            &[LinkField::CategoryId]
        );
        // Products resolve against all three parent levels
        assert_eq!(MigrationLevel::Products.link_fields().len(), 3);
    }

    #[test]
    fn test_field_names_match_stored_documents() {
        assert_eq!(LinkField::DeptId.field_name(), "dept_id");
        assert_eq!(LinkField::CategoryId.field_name(), "category_id");
        assert_eq!(LinkField::SubCategoryId.field_name(), "sub_category_id");
    }

    #[test]
    fn test_mapping_table_keys() {
        assert_eq!(
            LinkField::DeptId.parent().code_field(),
            "department_id"
        );
        assert_eq!(
            LinkField::CategoryId.parent().code_field(),
            "idcategory_master"
        );
        assert_eq!(
            LinkField::SubCategoryId.parent().code_field(),
            "idsub_category_master"
        );
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&MigrationLevel::SubCategories).expect("serialize");
        assert_eq!(json, "\"sub_categories\"");
        let json = serde_json::to_string(&LinkField::SubCategoryId).expect("serialize");
        assert_eq!(json, "\"sub_category_id\"");
    }
}
