//! Push destination model.

use hearth_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `person_devices` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PersonDevice {
    pub id: DbId,
    pub person_id: DbId,
    pub push_token: String,
    pub platform: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a device. The owner comes from the auth context.
#[derive(Debug, Deserialize)]
pub struct RegisterDevice {
    pub push_token: String,
    pub platform: Option<String>,
}
