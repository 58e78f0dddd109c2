//! Marketplace Core - Shared domain types.
//!
//! This crate provides the types shared by every marketplace component:
//! - `client` - Session, role, cart/wishlist and notification engine
//! - `cli` - Command-line front end for the engine
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! persistence, no HTTP clients. Anything in here can be table-tested.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, prices, roles and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
