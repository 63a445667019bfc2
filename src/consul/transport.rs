// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! HTTP transport used by the Consul client.
//!
//! Requests go through a boxed `tower::Service` so the client can be driven
//! by `reqwest` in production and by an in-memory mock in tests.

use crate::config::Config;
use crate::error::{AclInitError, Result};
use bytes::Bytes;
use http::{Request, Response};
use reqwest::{Certificate, Identity};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::util::BoxCloneService;
use tower::{BoxError, Service};
use tracing::{debug, instrument};

pub type HttpService = BoxCloneService<Request<Bytes>, Response<Bytes>, BoxError>;

/// `tower::Service` adapter over a `reqwest::Client`
#[derive(Clone)]
pub struct ReqwestService {
    client: reqwest::Client,
}

impl ReqwestService {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Service<Request<Bytes>> for ReqwestService {
    type Response = Response<Bytes>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Bytes>) -> Self::Future {
        let client = self.client.clone();

        Box::pin(async move {
            let req = into_reqwest(req)?;
            let resp = client.execute(req).await?;
            let status = resp.status();
            let body = resp.bytes().await?;
            Ok(Response::builder().status(status).body(body)?)
        })
    }
}

/// Convert an `http` request into one reqwest can execute, keeping method,
/// URI, headers and body
fn into_reqwest(req: Request<Bytes>) -> std::result::Result<reqwest::Request, BoxError> {
    Ok(reqwest::Request::try_from(req)?)
}

/// Build the production transport from the connection settings in `config`
#[instrument(skip(config), fields(scheme = %config.scheme))]
pub fn build(config: &Config) -> Result<HttpService> {
    let mut builder = reqwest::Client::builder().timeout(config.request_timeout());

    if let Some(ca_path) = &config.cacert {
        debug!("Trusting CA certificate {}", ca_path.display());
        let pem = read_pem(ca_path)?;
        let ca = Certificate::from_pem(&pem).map_err(|e| {
            AclInitError::Configuration(format!("Invalid CA certificate {}: {}", ca_path.display(), e))
        })?;
        builder = builder.add_root_certificate(ca);
    }

    if let (Some(cert_path), Some(key_path)) = (&config.cert, &config.key) {
        debug!("Using client certificate {}", cert_path.display());
        let mut pem = read_pem(cert_path)?;
        pem.push(b'\n');
        pem.extend(read_pem(key_path)?);
        let identity = Identity::from_pem(&pem).map_err(|e| {
            AclInitError::Configuration(format!(
                "Invalid client certificate/key {}: {}",
                cert_path.display(),
                e
            ))
        })?;
        builder = builder.identity(identity);
    }

    let client = builder
        .build()
        .map_err(|e| AclInitError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

    Ok(BoxCloneService::new(ReqwestService::new(client)))
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| AclInitError::io(path, e))
}
