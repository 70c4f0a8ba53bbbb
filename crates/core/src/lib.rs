//! Hearth domain logic.
//!
//! Building blocks with no database or network access, shared by the
//! database, event, and API crates:
//!
//! - [`association`] -- task people diff planning.
//! - [`tree`] -- category / task / wish tree materialization.
//! - [`localization`] -- translation catalogs for system entities.
//! - [`notification`] -- push notification composition.
//! - [`validation`] -- shared input validation.

pub mod association;
pub mod error;
pub mod localization;
pub mod notification;
pub mod tree;
pub mod types;
pub mod validation;
