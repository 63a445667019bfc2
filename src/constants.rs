// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Suffix appended to a member name to form its agent policy and token name
pub const AGENT_SUFFIX: &str = "-agent";

/// Permissions for the bootstrap token and token secrets files
pub const SECRET_FILE_MODE: u32 = 0o600;

/// Lines starting with this marker are skipped when reading the token file
pub const COMMENT_MARKER: char = '#';

/// Consul HTTP API details
pub mod consul {
    /// Header carrying the ACL token on every authenticated request
    pub const TOKEN_HEADER: &str = "X-Consul-Token";
    /// Default per-request timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    pub const BOOTSTRAP_PATH: &str = "/v1/acl/bootstrap";
    pub const POLICIES_PATH: &str = "/v1/acl/policies";
    pub const POLICY_PATH: &str = "/v1/acl/policy";
    pub const TOKENS_PATH: &str = "/v1/acl/tokens";
    pub const TOKEN_PATH: &str = "/v1/acl/token";
    pub const AGENT_TOKEN_PATH: &str = "/v1/agent/token/agent";
}

/// Name of the agent policy and token generated for a member
pub fn agent_name(member_name: &str) -> String {
    format!("{}{}", member_name, AGENT_SUFFIX)
}
