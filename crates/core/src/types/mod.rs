//! Core types for Kirana.
//!
//! This module provides type-safe wrappers for the catalog domain concepts.

pub mod catalog;
pub mod code;
pub mod link;
pub mod report;

pub use catalog::{LinkField, MigrationLevel, ParentCollection};
pub use code::*;
pub use link::{LinkTypeError, ParentLink};
pub use report::*;
