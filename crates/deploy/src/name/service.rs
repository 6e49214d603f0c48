//! Naming network abstraction.

use crate::errors::Result;
use crate::name::key::IpnsName;
use crate::name::record::{Revision, SignedRecord};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of looking up the current revision of a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A valid, signed revision is currently published.
    Found(Revision),
    /// The name has never been published.
    NotFound,
    /// The lookup failed for any other reason (network, server, bad record).
    Unavailable(String),
}

/// Resolves and publishes signed name records.
#[async_trait]
pub trait NameService: Send + Sync {
    /// Look up the current revision for `name`. Never fails: every failure
    /// mode is folded into [`Resolution`].
    async fn resolve(&self, name: &IpnsName) -> Resolution;

    /// Propagate a signed record for `name`.
    async fn publish(&self, name: &IpnsName, record: &SignedRecord) -> Result<()>;
}

/// In-process naming service, keyed by name string.
#[derive(Clone, Default)]
pub struct MemoryNameService {
    records: Arc<Mutex<HashMap<String, SignedRecord>>>,
}

impl MemoryNameService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest record published for `name`, if any.
    pub fn record(&self, name: &IpnsName) -> Option<SignedRecord> {
        self.records.lock().get(name.as_str()).cloned()
    }
}

#[async_trait]
impl NameService for MemoryNameService {
    async fn resolve(&self, name: &IpnsName) -> Resolution {
        match self.record(name) {
            Some(record) => match record.verify(name) {
                Ok(revision) => Resolution::Found(revision),
                Err(err) => Resolution::Unavailable(err.to_string()),
            },
            None => Resolution::NotFound,
        }
    }

    async fn publish(&self, name: &IpnsName, record: &SignedRecord) -> Result<()> {
        // Validate before storing
        record.verify(name)?;
        self.records
            .lock()
            .insert(name.as_str().to_string(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::key::NameKey;
    use chrono::{Duration as ChronoDuration, Utc};
    use std::time::Duration;

    #[tokio::test]
    async fn memory_service_round_trip() {
        let service = MemoryNameService::new();
        let key = NameKey::generate().unwrap();
        assert_eq!(service.resolve(key.name()).await, Resolution::NotFound);

        let rev = Revision::initial("/ipfs/CID1", Utc::now() + ChronoDuration::days(1));
        let record = SignedRecord::sign(&rev, &key, Duration::from_secs(60)).unwrap();
        service.publish(key.name(), &record).await.unwrap();

        assert_eq!(service.resolve(key.name()).await, Resolution::Found(rev));
    }

    #[tokio::test]
    async fn memory_service_rejects_foreign_records() {
        let service = MemoryNameService::new();
        let key = NameKey::generate().unwrap();
        let other = NameKey::generate().unwrap();

        let rev = Revision::initial("/ipfs/CID1", Utc::now());
        let record = SignedRecord::sign(&rev, &other, Duration::from_secs(60)).unwrap();
        assert!(service.publish(key.name(), &record).await.is_err());
        assert!(service.record(key.name()).is_none());
    }
}
