//! Computes and publishes the next revision of a name.

use crate::config::{DeployConfig, UnavailablePolicy};
use crate::errors::{DeployError, Result};
use crate::name::key::{IpnsName, NameKey};
use crate::name::record::{Revision, SignedRecord};
use crate::name::service::{NameService, Resolution};
use chrono::Utc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);
const DEFAULT_TTL: Duration = Duration::from_secs(300);

pub struct NamePublisher<'a, N: ?Sized> {
    service: &'a N,
    policy: UnavailablePolicy,
    lifetime: Duration,
    ttl: Duration,
}

impl<'a, N: NameService + ?Sized> NamePublisher<'a, N> {
    pub fn new(service: &'a N, policy: UnavailablePolicy) -> Self {
        Self {
            service,
            policy,
            lifetime: DEFAULT_LIFETIME,
            ttl: DEFAULT_TTL,
        }
    }

    pub fn from_config(service: &'a N, config: &DeployConfig) -> Self {
        Self::new(service, config.on_unavailable)
            .with_lifetime(config.record_lifetime())
            .with_ttl(config.record_ttl())
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub async fn resolve(&self, name: &IpnsName) -> Resolution {
        let resolution = self.service.resolve(name).await;
        match &resolution {
            Resolution::Found(rev) => info!(
                "Current revision of {} is #{} -> {}",
                name,
                rev.sequence(),
                rev.value()
            ),
            Resolution::NotFound => info!("{} has no published revision", name),
            Resolution::Unavailable(reason) => warn!("Could not resolve {}: {}", name, reason),
        }
        resolution
    }

    /// Derive the revision to publish from the resolved state.
    pub fn next_revision(&self, resolution: Resolution, value: &str) -> Result<Revision> {
        let lifetime = chrono::Duration::from_std(self.lifetime)
            .map_err(|e| DeployError::Config(format!("record lifetime out of range: {e}")))?;
        let validity = Utc::now()
            .checked_add_signed(lifetime)
            .ok_or_else(|| {
                DeployError::Config(format!(
                    "record lifetime of {}s overflows the validity timestamp",
                    self.lifetime.as_secs()
                ))
            })?;

        match resolution {
            Resolution::Found(current) => current.increment(value, validity),
            Resolution::NotFound => Ok(Revision::initial(value, validity)),
            Resolution::Unavailable(reason) => match self.policy {
                UnavailablePolicy::Abort => Err(DeployError::ResolutionUnavailable(reason)),
                UnavailablePolicy::StartFresh => {
                    warn!(
                        "Starting a fresh revision despite failed resolution ({}); \
                         a newer unseen revision may be overwritten",
                        reason
                    );
                    Ok(Revision::initial(value, validity))
                }
            },
        }
    }

    /// Sign `revision` with `key` and propagate it.
    pub async fn publish_revision(&self, key: &NameKey, revision: &Revision) -> Result<SignedRecord> {
        let record = SignedRecord::sign(revision, key, self.ttl)?;
        self.service.publish(key.name(), &record).await?;
        info!(
            "Published revision #{} of {} -> {}",
            revision.sequence(),
            key.name(),
            revision.value()
        );
        Ok(record)
    }

    /// Resolve, compute the next revision and publish it.
    pub async fn publish(&self, key: &NameKey, value: &str) -> Result<Revision> {
        let resolution = self.resolve(key.name()).await;
        let revision = self.next_revision(resolution, value)?;
        self.publish_revision(key, &revision).await?;
        Ok(revision)
    }
}
