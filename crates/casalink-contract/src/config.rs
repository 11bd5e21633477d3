//! Contract service configuration.

/// Configuration for the contract lifecycle and document services.
#[derive(Debug, Clone)]
pub struct ContractConfig {
    /// Maximum accepted size for an evidentiary document upload, in bytes.
    pub max_document_size_bytes: u64,
    /// Base path prepended to notification deep links
    /// (e.g. `/contracts` → `/contracts/{id}`).
    pub action_url_base: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            max_document_size_bytes: 10 * 1024 * 1024,
            action_url_base: "/contracts".into(),
        }
    }
}
