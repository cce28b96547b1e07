//! Store settings and client construction.
//!
//! ```rust
//! use dynamodb_entity::config::StoreConfig;
//!
//! let config: StoreConfig = serde_json::from_str(
//!     r#"{"table_name": "app", "region": "eu-west-1", "max_attempts": 5}"#,
//! )
//! .unwrap();
//! assert_eq!(config.table_name, "app");
//! assert_eq!(config.timeout_ms, None);
//! ```

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::{
    Client,
    config::{Credentials, Region, retry::RetryConfig, timeout::TimeoutConfig},
};
use serde::Deserialize;
use std::time::Duration;

/// Static access key pair, for local endpoints and tests.
#[derive(Clone, Deserialize, Eq, PartialEq)]
pub struct StaticCredentials {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token of temporary credentials.
    #[serde(default)]
    pub session_token: Option<String>,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

/// Settings of a [`Store`](crate::store::Store).
///
/// Unset fields fall back to the SDK defaults.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Table every operation targets.
    pub table_name: String,
    /// Region of the table. `None` resolves it from the environment or profile.
    pub region: Option<String>,
    /// Endpoint override, e.g. a local emulator.
    pub endpoint_url: Option<String>,
    /// Static credentials. `None` leaves credential resolution to the SDK.
    pub credentials: Option<StaticCredentials>,
    /// Attempts per request, first try included.
    pub max_attempts: Option<u32>,
    /// Timeout of a whole operation, retries included, in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Default read consistency.
    pub consistent_read: Option<bool>,
}

impl StoreConfig {
    /// Build a client from these settings.
    ///
    /// Starts from the SDK defaults (environment, shared profile, instance
    /// metadata) and applies the fields that are set on top of them.
    pub async fn client(&self) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(credentials) = &self.credentials {
            loader = loader.credentials_provider(Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                credentials.session_token.clone(),
                None,
                "dynamodb-entity",
            ));
        }
        let sdk_config = loader.load().await;
        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
        if let Some(endpoint_url) = &self.endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }
        if let Some(max_attempts) = self.max_attempts {
            builder = builder.retry_config(RetryConfig::standard().with_max_attempts(max_attempts));
        }
        if let Some(timeout_ms) = self.timeout_ms {
            builder = builder.timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_millis(timeout_ms))
                    .build(),
            );
        }
        Client::from_conf(builder.build())
    }
}
