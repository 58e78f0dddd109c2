//! Marketplace client engine.
//!
//! Session, role resolution, route guarding, durable cart and wishlist, and
//! the admin notification feed, independent of any UI toolkit. A front end
//! builds a [`Marketplace`] from a [`ClientConfig`], calls
//! [`Marketplace::bootstrap`] once, and then drives the stores in response
//! to user events.
//!
//! # Modules
//!
//! - [`session`] - who is signed in, with a watch channel for updates
//! - [`roles`] - role hierarchy queries and landing paths
//! - [`guard`] - route access decisions and replace-style navigation
//! - [`collections`] - cart and wishlist with write-through persistence
//! - [`notifications`] - admin notification feed and unread poller
//! - [`storage`] - string-keyed durable store
//! - [`api`] - REST client for the marketplace backend

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod app;
pub mod collections;
pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod nav;
pub mod notifications;
pub mod roles;
pub mod session;
pub mod storage;

pub use app::Marketplace;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
