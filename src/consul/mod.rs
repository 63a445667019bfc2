// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Consul HTTP client and transport.

pub mod client;
pub mod transport;

pub use client::ConsulClient;
pub use transport::HttpService;
