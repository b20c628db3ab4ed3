//! Newtype codes for legacy catalog identifiers.
//!
//! Use the `define_code!` macro to create type-safe wrappers that prevent
//! accidentally mixing legacy codes from different catalog levels.

/// Macro to define a type-safe legacy-code wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_string()`
/// - `From<String>`, `From<&str>`, and `Borrow<str>` implementations
///   (`Borrow<str>` allows map lookups by `&str` without allocating)
///
/// # Example
///
/// ```rust
/// # use kirana_core::define_code;
/// define_code!(WarehouseCode);
/// define_code!(SupplierCode);
///
/// let warehouse = WarehouseCode::new("WH-01");
/// let supplier = SupplierCode::new("WH-01");
///
/// // These are different types, so this won't compile:
/// // let _: WarehouseCode = supplier;
/// ```
#[macro_export]
macro_rules! define_code {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new code from any string-like value.
            #[must_use]
            pub fn new(code: impl Into<String>) -> Self {
                Self(code.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the code and return the underlying `String`.
            #[must_use]
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(code: String) -> Self {
                Self(code)
            }
        }

        impl From<&str> for $name {
            fn from(code: &str) -> Self {
                Self(code.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(code: $name) -> Self {
                code.0
            }
        }

        impl ::core::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

// Legacy codes for the four catalog levels.
//
// These are the human-assigned identifiers inherited from the predecessor
// system (`department_id`, `idcategory_master`, `idsub_category_master`,
// `p_code`), still used as the human-facing keys for catalog entities.
define_code!(DepartmentCode);
define_code!(CategoryCode);
define_code!(SubCategoryCode);
define_code!(ProductCode);

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_code_display_and_accessors() {
        let code = DepartmentCode::new("2");
        assert_eq!(code.as_str(), "2");
        assert_eq!(code.to_string(), "2");
        assert_eq!(code.clone().into_string(), "2");
    }

    #[test]
    fn test_code_conversions() {
        let from_str = CategoryCode::from("C9");
        let from_string = CategoryCode::from("C9".to_owned());
        assert_eq!(from_str, from_string);
        assert_eq!(String::from(from_str), "C9");
    }

    #[test]
    fn test_code_map_lookup_by_str() {
        // Borrow<str> lets mapping tables be probed without allocating
        let mut map: HashMap<SubCategoryCode, u32> = HashMap::new();
        map.insert(SubCategoryCode::new("SC-7"), 7);
        assert_eq!(map.get("SC-7"), Some(&7));
        assert_eq!(map.get("SC-8"), None);
    }

    #[test]
    fn test_code_serde_transparent() {
        let code = ProductCode::new("P-100");
        let json = serde_json::to_string(&code).expect("serialize");
        assert_eq!(json, "\"P-100\"");
        let back: ProductCode = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, code);
    }
}
