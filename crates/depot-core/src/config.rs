//! Environment-style settings.
//!
//! The core consumes these as opaque values: the database URL belongs to
//! the (external) transport wiring, the bucket to blob adapters, the CDN
//! base to the service for download URLs.

use std::env;
use std::path::PathBuf;

use crate::domain::DepotError;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub storage_bucket: String,
    pub cdn_base_url: String,
    pub secret_key: String,
    pub admin_username: String,

    /// Where non-seekable uploads are staged before ingestion.
    pub spool_dir: PathBuf,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// `DATABASE_URL` wins when set; otherwise a postgres URL is assembled
    /// from the `POSTGRES_*` parts. `SECRET_KEY` is mandatory.
    pub fn from_env() -> Result<Self, DepotError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, DepotError> {
        let database_url = get("DATABASE_URL").unwrap_or_else(|| {
            let server = get("POSTGRES_SERVER").unwrap_or_default();
            let user = get("POSTGRES_USER").unwrap_or_default();
            let password = get("POSTGRES_PASSWORD").unwrap_or_default();
            let db = get("POSTGRES_DB").unwrap_or_default();
            format!("postgresql://{user}:{password}@{server}/{db}")
        });

        let secret_key = get("SECRET_KEY").ok_or_else(|| {
            DepotError::InvalidRequest("SECRET_KEY must be set".to_string())
        })?;

        Ok(Self {
            database_url,
            storage_bucket: get("STORAGE_S3_BUCKET").unwrap_or_default(),
            cdn_base_url: get("STORAGE_CDN_BASE_URL").unwrap_or_default(),
            secret_key,
            admin_username: get("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
            spool_dir: get("DEPOT_SPOOL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| env::temp_dir().join("depot-spool")),
        })
    }
}
