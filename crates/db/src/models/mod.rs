//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

use serde::{Deserialize, Deserializer};

pub mod category;
pub mod device;
pub mod home;
pub mod person;
pub mod role;
pub mod task;
pub mod task_person;
pub mod wish;

/// Deserialize a field that distinguishes "absent" from explicit `null`.
///
/// Use with `#[serde(default, deserialize_with = "crate::models::nullable")]`:
/// a missing key stays `None`, `null` becomes `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
