// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Expansion of the declared ACL state with per-member agent entries

use crate::config::Config;
use crate::error::{AclInitError, Result};
use crate::template;
use crate::types::{Member, PolicySpec, TokenSpec};
use std::collections::HashSet;

/// Policies and tokens that must exist after the run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredState {
    pub policies: Vec<PolicySpec>,
    pub tokens: Vec<TokenSpec>,
}

impl DesiredState {
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::expand(
            &config.policies,
            &config.tokens,
            &config.members,
            &config.node_agent_template,
        )
    }

    /// Append one `<member>-agent` policy (rules rendered from `template`)
    /// and one `<member>-agent` token per member to the declared entries.
    pub fn expand(
        policies: &[PolicySpec],
        tokens: &[TokenSpec],
        members: &[Member],
        template: &str,
    ) -> Result<Self> {
        ensure_unique("member", members.iter().map(|m| m.name.trim()))?;
        ensure_unique("policy", policies.iter().map(|p| p.name.trim()))?;
        ensure_unique("token", tokens.iter().map(|t| t.name.trim()))?;

        let mut desired = Self {
            policies: policies.to_vec(),
            tokens: tokens.to_vec(),
        };

        for member in members {
            let name = member.agent_name();

            if desired.policies.iter().any(|p| p.name.trim() == name) {
                return Err(AclInitError::Configuration(format!(
                    "policy [{}] collides with the agent policy generated for member [{}]",
                    name, member.name
                )));
            }
            if desired.tokens.iter().any(|t| t.name.trim() == name) {
                return Err(AclInitError::Configuration(format!(
                    "token [{}] collides with the agent token generated for member [{}]",
                    name, member.name
                )));
            }

            desired.policies.push(PolicySpec {
                name: name.clone(),
                description: format!("{} agent token", member.name.trim()),
                rules: template::render(template, member)?,
            });
            desired.tokens.push(TokenSpec {
                name: name.clone(),
                policies: vec![name],
            });
        }

        Ok(desired)
    }
}

fn ensure_unique<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(AclInitError::Configuration(format!(
                "duplicate {} name [{}]",
                kind, name
            )));
        }
    }
    Ok(())
}
