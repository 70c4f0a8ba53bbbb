/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Language tag used to select a translation catalog (e.g. `"en"`).
pub type LocaleTag = String;
