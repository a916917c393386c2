//! Core types for Aromista.
//!
//! This module provides type-safe wrappers for the entities the REST API
//! exchanges with the front-end.

pub mod email;
pub mod id;
pub mod money;
pub mod role;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError};
pub use role::Role;
pub use status::*;
