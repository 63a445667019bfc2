// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Consul HTTP API responses.

use crate::constants::consul::TOKEN_HEADER;
use crate::consul::{ConsulClient, HttpService};
use bytes::Bytes;
use http::{Request, Response};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::util::BoxCloneService;
use tower::Service;

/// A request as seen by the mock
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    /// `host:port` the request was addressed to
    pub authority: String,
    pub path: String,
    pub token: Option<String>,
    pub body: String,
}

type Responder = Arc<dyn Fn(&RecordedRequest) -> (u16, String) + Send + Sync>;

/// A mock HTTP service that records requests and answers them from
/// responders registered per method and path.
#[derive(Clone)]
pub struct MockService {
    responders: Arc<Mutex<Vec<((String, String), Responder)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responders: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a fixed response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        let body = body.to_string();
        self.on("GET", path, move |_| (status, body.clone()))
    }

    /// Add a fixed response for PUT requests matching the path
    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        let body = body.to_string();
        self.on("PUT", path, move |_| (status, body.clone()))
    }

    /// Add a response computed from the incoming request
    pub fn on<F>(self, method: &str, path: &str, responder: F) -> Self
    where
        F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
    {
        self.responders
            .lock()
            .unwrap()
            .push(((method.to_string(), path.to_string()), Arc::new(responder)));
        self
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests with the given method and exact path
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub fn into_service(self) -> HttpService {
        BoxCloneService::new(self)
    }

    /// Build an unauthenticated Consul client on top of this mock
    pub fn into_client(self, address: &str) -> ConsulClient {
        ConsulClient::new(self.into_service(), "http", address).unwrap()
    }

    fn find_responder(&self, method: &str, path: &str) -> Option<Responder> {
        let responders = self.responders.lock().unwrap();

        // Try exact match first
        if let Some((_, r)) = responders
            .iter()
            .find(|((m, p), _)| m == method && p == path)
        {
            return Some(r.clone());
        }

        // Then prefix match for paths like /v1/acl/token/<accessor>
        responders
            .iter()
            .find(|((m, p), _)| m == method && path.starts_with(p.as_str()))
            .map(|(_, r)| r.clone())
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Bytes>> for MockService {
    type Response = Response<Bytes>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Bytes>) -> Self::Future {
        let recorded = RecordedRequest {
            method: req.method().to_string(),
            authority: req
                .uri()
                .authority()
                .map(|a| a.to_string())
                .unwrap_or_default(),
            path: req.uri().path().to_string(),
            token: req
                .headers()
                .get(TOKEN_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string()),
            body: String::from_utf8_lossy(req.body()).to_string(),
        };

        let responder = self.find_responder(&recorded.method, &recorded.path);
        let (status, body) = match responder {
            Some(r) => r(&recorded),
            // Default 404 for unmatched requests
            None => (404, format!("no route for {} {}", recorded.method, recorded.path)),
        };
        self.requests.lock().unwrap().push(recorded);

        Box::pin(async move {
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Bytes::from(body))
                .unwrap())
        })
    }
}

/// JSON for a token create/read response
pub fn token_json(accessor_id: &str, secret_id: &str, description: &str) -> String {
    serde_json::json!({
        "AccessorID": accessor_id,
        "SecretID": secret_id,
        "Description": description,
        "Local": false
    })
    .to_string()
}

/// JSON for a policy listing entry
pub fn policy_json(id: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "ID": id,
        "Name": name,
        "Description": format!("{} policy", name),
        "CreateIndex": 10,
        "ModifyIndex": 10
    })
}
