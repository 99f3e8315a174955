//! Deployment configuration used as the template rendering context
//!
//! Every manifest placeholder maps to one field:
//! - `{{ namespace }}` - target namespace
//! - `{{ access_key }}`, `{{ secret_key }}` - object-store credentials
//! - `{{ auth_code }}`, `{{ client_id }}`, `{{ client_secret }}` - auth settings
//! - `{{ secret_name }}` - name of the credentials Secret and its data key
//! - `{{ secret_data }}` - encoded secret blob, set after encoding
//! - `{{ kontinuous_ip }}`, `{{ dashboard_ip }}` - ingress addresses, set after polling
//!
//! Fields that are not known yet are left out of the context entirely, so a
//! template that references them fails instead of rendering an empty value.

use std::collections::BTreeMap;

use minijinja::Value;

use crate::secret::SECRET_NAME;
use crate::{Error, Result};

/// Configuration record for one deployment invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub namespace: String,
    pub access_key: String,
    pub secret_key: String,
    pub auth_code: String,
    pub client_id: String,
    pub client_secret: String,
    /// Base64 JSON credentials blob embedded in the secret manifest
    pub secret_data: Option<String>,
    /// Ingress address of the main application service
    pub kontinuous_ip: Option<String>,
    /// Ingress address of the dashboard service
    pub dashboard_ip: Option<String>,
}

impl DeploymentConfig {
    /// Create a new builder for DeploymentConfig
    pub fn builder() -> DeploymentConfigBuilder {
        DeploymentConfigBuilder::default()
    }

    /// Reject empty inputs before anything is rendered or written
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("namespace", &self.namespace),
            ("access key", &self.access_key),
            ("secret key", &self.secret_key),
            ("auth code", &self.auth_code),
            ("client id", &self.client_id),
            ("client secret", &self.client_secret),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }

    /// Whether both ingress addresses have been resolved
    pub fn has_addresses(&self) -> bool {
        self.kontinuous_ip.is_some() && self.dashboard_ip.is_some()
    }

    /// Convert to minijinja Value for rendering
    pub fn to_value(&self) -> Value {
        let mut map: BTreeMap<&str, Value> = BTreeMap::new();
        map.insert("namespace", Value::from(self.namespace.as_str()));
        map.insert("access_key", Value::from(self.access_key.as_str()));
        map.insert("secret_key", Value::from(self.secret_key.as_str()));
        map.insert("auth_code", Value::from(self.auth_code.as_str()));
        map.insert("client_id", Value::from(self.client_id.as_str()));
        map.insert("client_secret", Value::from(self.client_secret.as_str()));
        map.insert("secret_name", Value::from(SECRET_NAME));

        let optional = [
            ("secret_data", &self.secret_data),
            ("kontinuous_ip", &self.kontinuous_ip),
            ("dashboard_ip", &self.dashboard_ip),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                map.insert(key, Value::from(value.as_str()));
            }
        }

        Value::from_iter(map)
    }
}

/// Builder for DeploymentConfig
#[derive(Debug, Default)]
pub struct DeploymentConfigBuilder {
    config: DeploymentConfig,
}

impl DeploymentConfigBuilder {
    pub fn namespace(mut self, value: impl Into<String>) -> Self {
        self.config.namespace = value.into();
        self
    }

    pub fn access_key(mut self, value: impl Into<String>) -> Self {
        self.config.access_key = value.into();
        self
    }

    pub fn secret_key(mut self, value: impl Into<String>) -> Self {
        self.config.secret_key = value.into();
        self
    }

    pub fn auth_code(mut self, value: impl Into<String>) -> Self {
        self.config.auth_code = value.into();
        self
    }

    pub fn client_id(mut self, value: impl Into<String>) -> Self {
        self.config.client_id = value.into();
        self
    }

    pub fn client_secret(mut self, value: impl Into<String>) -> Self {
        self.config.client_secret = value.into();
        self
    }

    /// Pre-set ingress addresses (used by dry-run rendering)
    pub fn addresses(
        mut self,
        kontinuous_ip: Option<String>,
        dashboard_ip: Option<String>,
    ) -> Self {
        self.config.kontinuous_ip = kontinuous_ip;
        self.config.dashboard_ip = dashboard_ip;
        self
    }

    pub fn build(self) -> DeploymentConfig {
        self.config
    }
}
