use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::address::Address;
use crate::config::Config;
use crate::error::FetchError;

/// Source of JSON documents by address. `null` bodies come back as
/// `Ok(Value::Null)`, they are not errors.
#[async_trait(?Send)]
pub trait Transport {
    async fn get_json(&self, address: &Address) -> Result<Value, FetchError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());

        // No timeout unless one is configured
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self::with_client(builder.build()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn get_json(&self, address: &Address) -> Result<Value, FetchError> {
        debug!("GET {}", address);

        let response = self
            .client
            .get(address.as_str())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Network {
                address: address.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                address: address.clone(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                FetchError::Malformed {
                    address: address.clone(),
                    message: e.to_string(),
                }
            } else {
                FetchError::Network {
                    address: address.clone(),
                    message: e.to_string(),
                }
            }
        })
    }
}
