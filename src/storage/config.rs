use crate::core::{StoreError, StoreResult};

/// In-memory store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStoreConfig {
    /// First identifier handed out for each kind
    pub first_id: i64,

    /// Maximum number of documents across all kinds
    pub max_documents: Option<usize>,
}

impl MemoryStoreConfig {
    pub fn new() -> Self {
        Self {
            first_id: 1,
            max_documents: None,
        }
    }

    /// Set the first identifier allocated per kind
    pub fn first_id(mut self, first_id: i64) -> Self {
        self.first_id = first_id;
        self
    }

    /// Limit the number of stored documents
    pub fn max_documents(mut self, max: usize) -> Self {
        self.max_documents = Some(max);
        self
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.first_id <= 0 {
            return Err(StoreError::InvalidConfig(format!(
                "first_id must be positive, got {}",
                self.first_id
            )));
        }
        if self.max_documents == Some(0) {
            return Err(StoreError::InvalidConfig(
                "max_documents must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MemoryStoreConfig::default();
        assert_eq!(config.first_id, 1);
        assert_eq!(config.max_documents, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = MemoryStoreConfig::new().first_id(1000).max_documents(5);
        assert_eq!(config.first_id, 1000);
        assert_eq!(config.max_documents, Some(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_first_id() {
        assert!(matches!(
            MemoryStoreConfig::new().first_id(0).validate(),
            Err(StoreError::InvalidConfig(_))
        ));
        assert!(MemoryStoreConfig::new().max_documents(0).validate().is_err());
    }
}
