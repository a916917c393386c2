//! Session-backed models for the storefront.

pub mod notice;
pub mod session;

pub use notice::{Notice, NoticeLevel, push_notice, take_notice};
pub use session::{SessionTokens, keys as session_keys};
