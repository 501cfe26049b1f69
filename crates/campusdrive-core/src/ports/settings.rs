//! Settings store port (driven/secondary port)
//!
//! The host shell owns configuration UI and credential handling; the core
//! only reads and writes opaque string values. Typed accessors for the keys
//! the core cares about live on the trait as provided methods.

/// Well-known settings keys
pub mod keys {
    /// Absolute path of the directory all project trees live under
    pub const PROJECT_DIR: &str = "projectDir";
    /// Server-assigned client identifier
    pub const CLIENT_ID: &str = "clientId";
    /// Access token for the authorisation flow (owned by the host)
    pub const ACCESS_TOKEN: &str = "accessToken";
}

/// Port trait for opaque key-value settings storage
#[async_trait::async_trait]
pub trait ISettingsStore: Send + Sync {
    /// Reads a value; `None` when the key was never set
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Writes a value durably
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Removes a key; removing an unknown key is not an error
    async fn remove(&self, key: &str) -> anyhow::Result<()>;

    /// The configured project root directory, if set
    async fn project_dir(&self) -> anyhow::Result<Option<String>> {
        self.get(keys::PROJECT_DIR).await
    }
}
