//! Kirana Admin library.
//!
//! This crate provides the admin functionality as a library,
//! allowing it to be tested and reused.
//!
//! # Security
//!
//! This crate has write access to the catalog collections. Only deploy on
//! VPN-protected infrastructure, and keep `KIRANA_ADMIN_TOKEN` out of source
//! control.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
