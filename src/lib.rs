// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod constants;
pub mod consul;
pub mod error;
pub mod reconcile;
pub mod store;
pub mod template;
pub mod types;

#[cfg(test)]
pub mod test_utils;
