//! Credentials blob embedded in the `kontinuous-secrets` Secret
//!
//! The five credential fields are serialized as a JSON document with fixed
//! key names and stored base64-encoded under a single data key. The
//! Kontinuous API reads this document from its mounted secret volume.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::template::DeploymentConfig;
use crate::Result;

/// Name of the Secret and of its single data key
pub const SECRET_NAME: &str = "kontinuous-secrets";

/// Credential fields stored in the secret, in serialization order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretData {
    #[serde(rename = "AuthSecret")]
    pub auth_secret: String,
    #[serde(rename = "S3SecretKey")]
    pub s3_secret_key: String,
    #[serde(rename = "S3AccessKey")]
    pub s3_access_key: String,
    #[serde(rename = "GithubClientID")]
    pub github_client_id: String,
    #[serde(rename = "GithubClientSecret")]
    pub github_client_secret: String,
}

impl SecretData {
    pub fn from_config(config: &DeploymentConfig) -> Self {
        Self {
            auth_secret: config.auth_code.clone(),
            s3_secret_key: config.secret_key.clone(),
            s3_access_key: config.access_key.clone(),
            github_client_id: config.client_id.clone(),
            github_client_secret: config.client_secret.clone(),
        }
    }

    /// JSON document with the five fixed keys
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Standard base64 encoding of the JSON document
    pub fn encode(&self) -> Result<String> {
        Ok(STANDARD.encode(self.to_json()?.as_bytes()))
    }

    /// Decode a value produced by [`SecretData::encode`]
    pub fn decode(encoded: &str) -> Result<Self> {
        let json = STANDARD.decode(encoded.trim())?;
        Ok(serde_json::from_slice(&json)?)
    }
}
