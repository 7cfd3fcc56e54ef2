//! An HTTP client exposing a remote flag service as a definition provider.
//!
//! The remote service serves already-mapped definitions: `GET /features`
//! returns a JSON array of definitions and `GET /feature/{name}` returns one
//! definition or 404. A 404 is the not-found domain outcome, not an error.
//! Network and decoding failures are logged and degraded like every other
//! provider backend.

use std::time::Duration;

use reqwest::{StatusCode, Url};

use crate::definition::{FeatureDefinition, TryParse};
use crate::provider::DefinitionProvider;
use crate::{Error, Result};

/// Configuration for [`RemoteDefinitionProvider`].
#[derive(Debug, Clone)]
pub struct RemoteProviderConfig {
    /// Base URL of the flag service, e.g. `https://flags.example.com/api`.
    pub base_url: String,
    /// Per-request timeout; this is the caller's cancellation bound, the
    /// provider does not retry.
    ///
    /// Defaults to [`RemoteProviderConfig::DEFAULT_TIMEOUT`].
    pub timeout: Duration,
}

impl RemoteProviderConfig {
    /// Default value for [`RemoteProviderConfig::timeout`].
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(base_url: impl Into<String>) -> RemoteProviderConfig {
        RemoteProviderConfig {
            base_url: base_url.into(),
            timeout: RemoteProviderConfig::DEFAULT_TIMEOUT,
        }
    }

    /// Update the request timeout with `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> RemoteProviderConfig {
        self.timeout = timeout;
        self
    }
}

/// A definition provider backed by a remote flag service.
#[derive(Debug)]
pub struct RemoteDefinitionProvider {
    // Client holds a connection pool internally, so we're reusing the client
    // between requests.
    client: reqwest::blocking::Client,
    base_url: Url,
}

impl RemoteDefinitionProvider {
    pub fn new(config: RemoteProviderConfig) -> Result<RemoteDefinitionProvider> {
        let base_url = Url::parse(&config.base_url).map_err(Error::InvalidBaseUrl)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(RemoteDefinitionProvider { client, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn fetch_all(&self) -> Result<Vec<FeatureDefinition>> {
        log::debug!(target: "featuregate", "fetching all remote definitions");
        let response = self
            .client
            .get(self.endpoint("/features"))
            .send()?
            .error_for_status()?;

        let flags: Vec<TryParse<FeatureDefinition>> = response.json()?;
        let definitions = flags
            .into_iter()
            .filter_map(|flag| {
                let parsed: Option<FeatureDefinition> = flag.into();
                if parsed.is_none() {
                    log::warn!(target: "featuregate",
                               "skipping a remote definition that failed to parse");
                }
                parsed
            })
            .collect();

        Ok(definitions)
    }

    fn fetch_one(&self, name: &str) -> Result<Option<FeatureDefinition>> {
        log::debug!(target: "featuregate", flag_name = name; "fetching remote definition");
        let response = self.client.get(self.endpoint(&format!("/feature/{name}"))).send()?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;

        Ok(Some(response.json()?))
    }
}

impl DefinitionProvider for RemoteDefinitionProvider {
    fn get_all(&self) -> Box<dyn Iterator<Item = FeatureDefinition> + '_> {
        match self.fetch_all() {
            Ok(definitions) => Box::new(definitions.into_iter()),
            Err(err) => {
                log::warn!(target: "featuregate",
                           "remote flag service failed while listing definitions, serving none: {err}");
                Box::new(std::iter::empty())
            }
        }
    }

    fn get_one(&self, name: &str) -> FeatureDefinition {
        match self.fetch_one(name) {
            Ok(Some(definition)) => definition,
            Ok(None) => FeatureDefinition::empty(name),
            Err(err) => {
                log::warn!(target: "featuregate",
                           flag_name = name;
                           "remote flag service failed while fetching a definition, serving the empty one: {err}");
                FeatureDefinition::empty(name)
            }
        }
    }
}
