//! Parent-link field values.
//!
//! A parent-link field holds either the parent's legacy code (a string, as
//! written by the predecessor system) or the parent's native `ObjectId` (once
//! migrated). Both states share one physical field in the stored document, so
//! readers must discriminate before use; this module makes that discrimination
//! a total function over raw BSON.

use bson::Bson;
use bson::oid::ObjectId;
use thiserror::Error;

/// A classified parent-link value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentLink {
    /// The field already holds a native reference.
    Migrated(ObjectId),
    /// The field still holds the legacy parent code.
    Unmigrated(String),
}

/// Error classifying a parent-link value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LinkTypeError {
    /// The field holds neither a string nor an `ObjectId`.
    #[error("unexpected parent-link type: {found}")]
    UnexpectedType {
        /// BSON type name of the offending value.
        found: &'static str,
    },
}

impl ParentLink {
    /// Classify a raw BSON value into a link state.
    ///
    /// # Errors
    ///
    /// Returns [`LinkTypeError::UnexpectedType`] for any BSON type other than
    /// `ObjectId` or string.
    pub fn classify(value: &Bson) -> Result<Self, LinkTypeError> {
        match value {
            Bson::ObjectId(id) => Ok(Self::Migrated(*id)),
            Bson::String(code) => Ok(Self::Unmigrated(code.clone())),
            other => Err(LinkTypeError::UnexpectedType {
                found: bson_type_name(other),
            }),
        }
    }

    /// Whether the link already holds a native reference.
    #[must_use]
    pub const fn is_migrated(&self) -> bool {
        matches!(self, Self::Migrated(_))
    }
}

/// Human-readable BSON type name for error reporting.
fn bson_type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "document",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::Int32(_) => "int32",
        Bson::Int64(_) => "int64",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        Bson::Binary(_) => "binary",
        Bson::Decimal128(_) => "decimal128",
        Bson::Timestamp(_) => "timestamp",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_object_id_is_migrated() {
        let id = ObjectId::new();
        let link = ParentLink::classify(&Bson::ObjectId(id)).expect("classify");
        assert_eq!(link, ParentLink::Migrated(id));
        assert!(link.is_migrated());
    }

    #[test]
    fn test_classify_string_is_unmigrated() {
        let link = ParentLink::classify(&Bson::String("2".to_owned())).expect("classify");
        assert_eq!(link, ParentLink::Unmigrated("2".to_owned()));
        assert!(!link.is_migrated());
    }

    #[test]
    fn test_classify_other_types_error() {
        let err = ParentLink::classify(&Bson::Int32(2)).expect_err("int32 is not a link");
        assert_eq!(err, LinkTypeError::UnexpectedType { found: "int32" });

        let err = ParentLink::classify(&Bson::Null).expect_err("null is not a link");
        assert_eq!(err, LinkTypeError::UnexpectedType { found: "null" });
    }

    #[test]
    fn test_error_display_names_type() {
        let err = LinkTypeError::UnexpectedType { found: "double" };
        assert_eq!(err.to_string(), "unexpected parent-link type: double");
    }
}
