// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Existence checks against the live ACL snapshot

use crate::types::{LivePolicy, LiveToken};

/// Check if a policy with exactly this name is in the snapshot
pub fn policy_exists(live: &[LivePolicy], name: &str) -> bool {
    live.iter().any(|p| p.name == name)
}

/// Find the secret of the token whose description equals `description`.
///
/// Consul allows several tokens to share a description; the first one in
/// listing order wins.
pub fn token_exists<'a>(live: &'a [LiveToken], description: &str) -> Option<&'a str> {
    live.iter()
        .find(|t| t.description == description)
        .map(|t| t.secret_id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_policy(name: &str) -> LivePolicy {
        LivePolicy {
            id: format!("{}-id", name),
            name: name.to_string(),
            description: String::new(),
        }
    }

    fn make_token(description: &str, secret: &str) -> LiveToken {
        LiveToken {
            description: description.to_string(),
            accessor_id: format!("{}-accessor", secret),
            secret_id: secret.to_string(),
        }
    }

    #[test]
    fn test_policy_exists() {
        let live = vec![make_policy("global-management"), make_policy("n1-agent")];

        assert!(policy_exists(&live, "n1-agent"));
        assert!(!policy_exists(&live, "n2-agent"));
    }

    #[test]
    fn test_policy_exists_is_exact() {
        let live = vec![make_policy("ops")];

        assert!(!policy_exists(&live, "Ops"));
        assert!(!policy_exists(&live, "ops "));
        assert!(!policy_exists(&[], "ops"));
    }

    #[test]
    fn test_token_exists_returns_secret() {
        let live = vec![
            make_token("Anonymous Token", "anonymous"),
            make_token("n1-agent", "s1"),
        ];

        assert_eq!(token_exists(&live, "n1-agent"), Some("s1"));
        assert_eq!(token_exists(&live, "n2-agent"), None);
    }

    #[test]
    fn test_token_exists_first_match_wins() {
        let live = vec![make_token("dup", "first"), make_token("dup", "second")];

        assert_eq!(token_exists(&live, "dup"), Some("first"));
    }
}
