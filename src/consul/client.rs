// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Consul ACL and agent HTTP API bindings

use crate::constants::consul::{
    AGENT_TOKEN_PATH, BOOTSTRAP_PATH, POLICIES_PATH, POLICY_PATH, TOKENS_PATH, TOKEN_HEADER,
    TOKEN_PATH,
};
use crate::consul::transport::HttpService;
use crate::error::{AclInitError, Result};
use crate::types::{LivePolicy, LiveToken};
use bytes::Bytes;
use http::{header, Method, Request};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tracing::{debug, instrument};
use url::Url;

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct NewPolicy<'a> {
    name: &'a str,
    description: &'a str,
    rules: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PolicyLink<'a> {
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct NewToken<'a> {
    description: &'a str,
    policies: Vec<PolicyLink<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AgentToken<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct TokenSecret {
    #[serde(rename = "SecretID", default)]
    secret_id: String,
}

/// Client for a single Consul agent, optionally authenticated with an ACL token
#[derive(Clone)]
pub struct ConsulClient {
    service: HttpService,
    base_url: Url,
    token: Option<String>,
}

impl ConsulClient {
    /// Create an unauthenticated client for `scheme://address`
    pub fn new(service: HttpService, scheme: &str, address: &str) -> Result<Self> {
        Ok(Self {
            service,
            base_url: parse_base_url(scheme, address)?,
            token: None,
        })
    }

    /// Bind this client to an ACL token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Same transport, scheme and token, pointed at another agent
    pub fn for_address(&self, address: &str) -> Result<Self> {
        Ok(Self {
            service: self.service.clone(),
            base_url: parse_base_url(self.base_url.scheme(), address)?,
            token: self.token.clone(),
        })
    }

    /// `host:port` of the agent this client talks to
    pub fn address(&self) -> String {
        match (self.base_url.host_str(), self.base_url.port_or_known_default()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => String::new(),
        }
    }

    /// Initialise the ACL system and return the bootstrap secret
    #[instrument(skip(self), fields(address = %self.address()))]
    pub async fn bootstrap(&self) -> Result<String> {
        let token: TokenSecret = self.put_json(BOOTSTRAP_PATH, None::<&()>).await?;
        Ok(token.secret_id)
    }

    #[instrument(skip(self), fields(address = %self.address()))]
    pub async fn list_policies(&self) -> Result<Vec<LivePolicy>> {
        self.get_json(POLICIES_PATH).await
    }

    #[instrument(skip(self, description, rules), fields(address = %self.address()))]
    pub async fn create_policy(&self, name: &str, description: &str, rules: &str) -> Result<()> {
        let body = NewPolicy {
            name,
            description,
            rules,
        };
        self.send(Method::PUT, POLICY_PATH, Some(serde_json::to_vec(&body)?))
            .await?;
        Ok(())
    }

    /// List tokens with their secrets. Listings that omit the secret are
    /// completed with one read per token.
    #[instrument(skip(self), fields(address = %self.address()))]
    pub async fn list_tokens(&self) -> Result<Vec<LiveToken>> {
        let mut tokens: Vec<LiveToken> = self.get_json(TOKENS_PATH).await?;

        for token in tokens.iter_mut().filter(|t| t.secret_id.is_empty()) {
            token.secret_id = self
                .read_token_secret(&token.accessor_id)
                .await
                .map_err(|e| {
                    AclInitError::Transport(format!(
                        "unable to get SecretID of token with description [{}]: {}",
                        token.description, e
                    ))
                })?;
        }

        Ok(tokens)
    }

    /// Create a token linked to `policy_names` and return its secret
    #[instrument(skip(self), fields(address = %self.address()))]
    pub async fn create_token(&self, description: &str, policy_names: &[String]) -> Result<String> {
        let body = NewToken {
            description,
            policies: policy_names
                .iter()
                .map(|name| PolicyLink { name })
                .collect(),
        };
        let token: TokenSecret = self.put_json(TOKEN_PATH, Some(&body)).await?;
        Ok(token.secret_id)
    }

    #[instrument(skip(self), fields(address = %self.address()))]
    pub async fn read_token_secret(&self, accessor_id: &str) -> Result<String> {
        let token: TokenSecret = self
            .get_json(&format!("{}/{}", TOKEN_PATH, accessor_id))
            .await?;
        Ok(token.secret_id)
    }

    /// Set the agent ACL token on the member listening at `member_address`
    #[instrument(skip(self, secret))]
    pub async fn set_agent_token(&self, member_address: &str, secret: &str) -> Result<()> {
        let member = self.for_address(member_address)?;
        let body = serde_json::to_vec(&AgentToken { token: secret })?;
        member.send(Method::PUT, AGENT_TOKEN_PATH, Some(body)).await?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.send(Method::GET, path, None).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn put_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: Option<&B>) -> Result<T> {
        let body = body.map(serde_json::to_vec).transpose()?;
        let response = self.send(Method::PUT, path, body).await?;
        Ok(serde_json::from_slice(&response)?)
    }

    async fn send(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Result<Bytes> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| AclInitError::Configuration(format!("Invalid request path {}: {}", path, e)))?;

        debug!("{} {}", method, url);

        let mut builder = Request::builder().method(method).uri(url.as_str());
        if let Some(token) = &self.token {
            builder = builder.header(TOKEN_HEADER, token.as_str());
        }
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(body.map(Bytes::from).unwrap_or_default())
            .map_err(|e| AclInitError::Transport(format!("Failed to build request: {}", e)))?;

        let response = self
            .service
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| AclInitError::Transport(format!("{} {}: {}", path, self.address(), e)))?;

        let status = response.status();
        let body = response.into_body();
        if !status.is_success() {
            return Err(AclInitError::Api {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }

        Ok(body)
    }
}

fn parse_base_url(scheme: &str, address: &str) -> Result<Url> {
    Url::parse(&format!("{}://{}", scheme, address)).map_err(|e| {
        AclInitError::Configuration(format!("Invalid Consul address {}://{}: {}", scheme, address, e))
    })
}
