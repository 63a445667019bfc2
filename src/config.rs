// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::consul::REQUEST_TIMEOUT_SECS;
use crate::error::{AclInitError, Result};
use crate::types::{Member, PolicySpec, TokenSpec};
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from a YAML (or JSON) file. Keys are snake_case;
/// the PascalCase field names of older configurations are accepted as well.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Where the bootstrap token is written to, or read from
    #[serde(alias = "TokenFile")]
    pub token_file: PathBuf,
    /// Where the token name to secret map is written to
    #[serde(alias = "TokenSecretsFile")]
    pub token_secrets_file: PathBuf,
    /// Consul agent used for all ACL calls
    #[serde(alias = "Address")]
    pub address: String,
    #[serde(alias = "Port")]
    pub port: u16,
    #[serde(default = "default_scheme", alias = "Scheme")]
    pub scheme: String,
    #[serde(default, alias = "CACert")]
    pub cacert: Option<PathBuf>,
    #[serde(default, alias = "Cert")]
    pub cert: Option<PathBuf>,
    #[serde(default, alias = "Key")]
    pub key: Option<PathBuf>,
    #[serde(default = "default_request_timeout_secs", alias = "RequestTimeoutSecs")]
    pub request_timeout_secs: u64,
    /// Rules template for the per-member agent policy
    #[serde(alias = "NodeAgentTemplate")]
    pub node_agent_template: String,
    #[serde(default, alias = "Members")]
    pub members: Vec<Member>,
    #[serde(default, alias = "Policies")]
    pub policies: Vec<PolicySpec>,
    #[serde(default, alias = "Tokens")]
    pub tokens: Vec<TokenSpec>,
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_request_timeout_secs() -> u64 {
    REQUEST_TIMEOUT_SECS
}

impl Config {
    /// Load and validate configuration from a file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file [{}]", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Invalid config file [{}]", path.display()))
    }

    /// Parse and validate configuration from YAML or JSON text
    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: Config =
            serde_yaml::from_str(contents).context("unable to decode configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Check field-level constraints. Name uniqueness across declared and
    /// generated entries is checked when the desired state is expanded.
    pub fn validate(&self) -> Result<()> {
        require_non_empty("token_file", self.token_file.as_os_str().is_empty())?;
        require_non_empty(
            "token_secrets_file",
            self.token_secrets_file.as_os_str().is_empty(),
        )?;
        require_non_empty("address", self.address.trim().is_empty())?;
        require_non_empty(
            "node_agent_template",
            self.node_agent_template.trim().is_empty(),
        )?;

        if self.port == 0 {
            return Err(AclInitError::Configuration("port must be non-zero".into()));
        }

        if self.scheme != "http" && self.scheme != "https" {
            return Err(AclInitError::Configuration(format!(
                "scheme must be http or https, got [{}]",
                self.scheme
            )));
        }

        if self.cert.is_some() != self.key.is_some() {
            return Err(AclInitError::Configuration(
                "cert and key must be set together".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(AclInitError::Configuration(
                "request_timeout_secs must be non-zero".into(),
            ));
        }

        for member in &self.members {
            if member.name.trim().is_empty() || member.ip.trim().is_empty() {
                return Err(AclInitError::Configuration(format!(
                    "member {:?} needs a name and an ip",
                    member
                )));
            }
            if member.port == 0 {
                return Err(AclInitError::Configuration(format!(
                    "member [{}] port must be non-zero",
                    member.name
                )));
            }
        }

        if let Some(policy) = self.policies.iter().find(|p| p.name.trim().is_empty()) {
            return Err(AclInitError::Configuration(format!(
                "policy {:?} has an empty name",
                policy
            )));
        }

        if let Some(token) = self.tokens.iter().find(|t| t.name.trim().is_empty()) {
            return Err(AclInitError::Configuration(format!(
                "token {:?} has an empty name",
                token
            )));
        }

        Ok(())
    }

    /// `address:port` of the Consul agent used for ACL calls
    pub fn consul_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn require_non_empty(field: &str, is_empty: bool) -> Result<()> {
    if is_empty {
        return Err(AclInitError::Configuration(format!("{} is required", field)));
    }
    Ok(())
}
