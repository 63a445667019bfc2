// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ACL reconciler - brings Consul's policies and tokens in line with the
//! configuration and hands every member its agent token.
//!
//! The run is strictly sequential: credential, snapshot, policies, tokens,
//! secrets file, distribution. The first error stops the run and is returned
//! to the caller. Policies and tokens created before the error stay in
//! Consul; a rerun finds them in the snapshot and skips them.

pub mod compare;
pub mod expand;


pub use compare::{policy_exists, token_exists};
pub use expand::DesiredState;

use crate::config::Config;
use crate::constants::SECRET_FILE_MODE;
use crate::consul::ConsulClient;
use crate::error::{AclInitError, Result};
use crate::store;
use crate::types::{LivePolicy, LiveToken, Member, PolicySpec, SecretMap, TokenSpec};
use std::path::Path;
use tracing::{info, instrument};

/// How the bootstrap credential is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    /// Bootstrap the ACL system and persist the returned secret
    Bootstrap,
    /// Read a secret persisted by an earlier bootstrap run
    LoadFromFile,
}

/// Live policies and tokens, read once at the start of a run
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub policies: Vec<LivePolicy>,
    pub tokens: Vec<LiveToken>,
}

impl Snapshot {
    #[instrument(skip(client))]
    pub async fn fetch(client: &ConsulClient) -> Result<Self> {
        info!("Getting current list of ACL policies");
        let policies = client.list_policies().await?;
        info!("Getting current list of ACL tokens");
        let tokens = client.list_tokens().await?;

        info!(
            "Found {} policies and {} tokens",
            policies.len(),
            tokens.len()
        );
        Ok(Self { policies, tokens })
    }
}

pub struct Reconciler {
    config: Config,
    client: ConsulClient,
}

impl Reconciler {
    /// `client` must point at the configured Consul address and carry no token
    pub fn new(config: Config, client: ConsulClient) -> Self {
        Self { config, client }
    }

    /// Run the whole pipeline and return the persisted secret map
    #[instrument(skip(self))]
    pub async fn run(&self, mode: CredentialMode) -> Result<SecretMap> {
        self.preflight(mode)?;

        let desired = DesiredState::from_config(&self.config)?;

        let credential = self.acquire_credential(mode).await?;
        let client = self.client.clone().with_token(credential);

        let snapshot = Snapshot::fetch(&client).await?;

        reconcile_policies(&client, &desired.policies, &snapshot.policies).await?;
        let secrets = reconcile_tokens(&client, &desired.tokens, &snapshot.tokens).await?;

        persist_secrets(&self.config.token_secrets_file, &secrets)?;

        distribute(&client, &self.config.members, &secrets).await?;

        info!("ACL reconciliation complete");
        Ok(secrets)
    }

    /// Refuse to start if a write-once file would be clobbered
    fn preflight(&self, mode: CredentialMode) -> Result<()> {
        store::ensure_absent(&self.config.token_secrets_file)?;
        if mode == CredentialMode::Bootstrap {
            store::ensure_absent(&self.config.token_file)?;
        }
        Ok(())
    }

    async fn acquire_credential(&self, mode: CredentialMode) -> Result<String> {
        let token_file = &self.config.token_file;

        match mode {
            CredentialMode::Bootstrap => {
                store::ensure_absent(token_file)?;

                info!(
                    "Performing ACL bootstrap against {}",
                    self.client.address()
                );
                let secret = self.client.bootstrap().await?;
                if secret.is_empty() {
                    return Err(AclInitError::EmptySecret("ACL bootstrap".into()));
                }

                store::write_once(
                    token_file,
                    format!("{}\n", secret).as_bytes(),
                    SECRET_FILE_MODE,
                )?;
                info!("Bootstrap token written to [{}]", token_file.display());
                Ok(secret)
            }
            CredentialMode::LoadFromFile => {
                info!("Getting bootstrap token from [{}]", token_file.display());
                let secret = store::read_first_significant_line(token_file)?;
                if secret.is_empty() {
                    return Err(AclInitError::Precondition(format!(
                        "no bootstrap token found in [{}]",
                        token_file.display()
                    )));
                }
                Ok(secret)
            }
        }
    }
}

/// Create every desired policy whose name is not in the snapshot.
/// Returns the number of policies created.
#[instrument(skip_all)]
pub async fn reconcile_policies(
    client: &ConsulClient,
    desired: &[PolicySpec],
    live: &[LivePolicy],
) -> Result<usize> {
    let mut created = 0;

    for policy in desired {
        let name = policy.name.trim();
        if policy_exists(live, name) {
            info!("Policy named [{}] already exists", name);
            continue;
        }

        info!("Creating policy named [{}]", name);
        client
            .create_policy(name, policy.description.trim(), policy.rules.trim())
            .await?;
        created += 1;
    }

    Ok(created)
}

/// Resolve a secret for every desired token, creating the tokens whose
/// description is not in the snapshot.
#[instrument(skip_all)]
pub async fn reconcile_tokens(
    client: &ConsulClient,
    desired: &[TokenSpec],
    live: &[LiveToken],
) -> Result<SecretMap> {
    let mut secrets = SecretMap::new();

    for token in desired {
        let name = token.name.trim();
        let secret = match token_exists(live, name) {
            Some(secret) => {
                info!("Token with description [{}] already exists", name);
                secret.to_string()
            }
            None => {
                info!("Creating token with description [{}]", name);
                client.create_token(name, &token.policies).await?
            }
        };

        if secret.is_empty() {
            return Err(AclInitError::EmptySecret(format!("token [{}]", name)));
        }
        secrets.insert(name.to_string(), secret);
    }

    Ok(secrets)
}

/// Serialize the secret map as indented JSON into a new owner-only file
#[instrument(skip(secrets))]
pub fn persist_secrets(path: &Path, secrets: &SecretMap) -> Result<()> {
    info!("Writing token secrets to [{}]", path.display());
    let mut json = serde_json::to_string_pretty(secrets)?;
    json.push('\n');
    store::write_once(path, json.as_bytes(), SECRET_FILE_MODE)
}

/// Push each member its own `<member>-agent` secret
#[instrument(skip_all)]
pub async fn distribute(
    client: &ConsulClient,
    members: &[Member],
    secrets: &SecretMap,
) -> Result<()> {
    for member in members {
        let name = member.agent_name();
        let secret = secrets.get(&name).ok_or_else(|| {
            AclInitError::InvariantViolation(format!("agent token [{}] was not found", name))
        })?;

        info!(
            "Setting the ACL agent token on [{}] at {}",
            member.name,
            member.address()
        );
        client.set_agent_token(&member.address(), secret).await?;
    }

    Ok(())
}
