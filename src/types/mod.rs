// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Desired and live ACL state.

pub mod acl;

pub use acl::{LivePolicy, LiveToken, Member, PolicySpec, SecretMap, TokenSpec};
