// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::agent_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Token name to secret id, ordered so the persisted JSON is stable
pub type SecretMap = BTreeMap<String, String>;

/// A Consul cluster member that receives its own agent token
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Member {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "IP", alias = "Ip")]
    pub ip: String,
    #[serde(alias = "Port")]
    pub port: u16,
}

impl Member {
    /// The `host:port` this member's HTTP API listens on
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    /// Name of the policy and token generated for this member. Surrounding
    /// whitespace in the member name is ignored, matching how declared
    /// policy and token names are trimmed before use.
    pub fn agent_name(&self) -> String {
        agent_name(self.name.trim())
    }
}

/// A policy that must exist
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct PolicySpec {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Description")]
    pub description: String,
    #[serde(default, alias = "Rules")]
    pub rules: String,
}

/// A token that must exist. Consul tokens have no name, so `name` is matched
/// against the token description.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenSpec {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Policies")]
    pub policies: Vec<String>,
}

/// A policy as listed by `GET /v1/acl/policies`
#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct LivePolicy {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A token as listed by `GET /v1/acl/tokens`. Newer Consul versions omit the
/// secret from listings; it is then filled in from the token read endpoint.
#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveToken {
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "AccessorID")]
    pub accessor_id: String,
    #[serde(rename = "SecretID", default)]
    pub secret_id: String,
}
