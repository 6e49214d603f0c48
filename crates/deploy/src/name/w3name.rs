use crate::errors::{DeployError, Result};
use crate::name::key::IpnsName;
use crate::name::record::SignedRecord;
use crate::name::service::{NameService, Resolution};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

/// HTTP client for the w3name naming service.
#[derive(Clone, Debug)]
pub struct W3NameClient {
    client: reqwest::Client,
    base_url: String,
}

impl W3NameClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, name: &IpnsName) -> String {
        format!("{}/name/{}", self.base_url.trim_end_matches('/'), name)
    }
}

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    value: String,
    record: String,
}

#[async_trait]
impl NameService for W3NameClient {
    async fn resolve(&self, name: &IpnsName) -> Resolution {
        let url = self.endpoint(name);
        debug!("Resolving {} via {}", name, url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => return Resolution::Unavailable(format!("request failed: {err}")),
        };

        match response.status() {
            StatusCode::OK => {
                let dto = match response.json::<ResolveResponse>().await {
                    Ok(dto) => dto,
                    Err(err) => {
                        return Resolution::Unavailable(format!("invalid resolve response: {err}"))
                    }
                };
                match SignedRecord::from_base64(&dto.record).and_then(|r| r.verify(name)) {
                    Ok(revision) => {
                        if revision.value() != dto.value {
                            warn!(
                                "Resolver value {} differs from signed value {}",
                                dto.value,
                                revision.value()
                            );
                        }
                        Resolution::Found(revision)
                    }
                    Err(err) => Resolution::Unavailable(err.to_string()),
                }
            }
            StatusCode::NOT_FOUND => Resolution::NotFound,
            status => Resolution::Unavailable(format!("resolve failed (status {status})")),
        }
    }

    async fn publish(&self, name: &IpnsName, record: &SignedRecord) -> Result<()> {
        let url = self.endpoint(name);
        let response = self
            .client
            .post(url)
            .body(record.to_base64())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(DeployError::PublishRejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}
