//! Aromista Core - Shared domain types and pure front-end logic.
//!
//! This crate backs the `storefront` web binary:
//! - [`types`] - ids, emails, money, roles and status enums exchanged with the REST API
//! - [`cart`] - the session-scoped shopping cart (and the admin order composer)
//! - [`guard`] - role-based route access decisions
//! - [`floor`] - the café floor plan used for table bookings
//! - [`stats`] - dashboard and barista board aggregations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session handling. Everything here is testable without a server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod floor;
pub mod guard;
pub mod stats;
pub mod types;

pub use cart::{Cart, CartLine, OrderLine, PricedOrderLine};
pub use guard::{Access, AuthenticatedUser, GuardDecision, landing_path};
pub use types::*;
