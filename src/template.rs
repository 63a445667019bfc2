// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Node agent policy rendering.
//!
//! The template sees the member as `name`, `ip` and `port`. The capitalised
//! `Name`, `IP` and `Port` are available too, for templates carried over from
//! configurations that used those field names. Such templates may also
//! reference fields in the dotted form (`{{.Name}}`, `{{- .IP }}`), which is
//! rewritten to the plain variable before rendering.

use crate::error::Result;
use crate::types::Member;
use minijinja::{context, Environment, UndefinedBehavior};
use regex::Regex;
use std::borrow::Cow;

/// A `{{` (optionally whitespace-trimming) directly followed by `.Field`
static DOTTED_FIELD: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"\{\{(-?)\s*\.([A-Za-z_][A-Za-z0-9_]*)").expect("invalid dotted field pattern")
});

fn strip_dotted_fields(source: &str) -> Cow<'_, str> {
    DOTTED_FIELD.replace_all(source, "{{${1} ${2}")
}

/// Render the node agent policy rules for a member.
///
/// Referencing a variable that is not in the context is an error rather
/// than an empty string.
pub fn render(source: &str, member: &Member) -> Result<String> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    let name = member.name.trim();
    let ctx = context! {
        name => name,
        ip => &member.ip,
        port => member.port,
        Name => name,
        IP => &member.ip,
        Port => member.port,
    };

    Ok(env.render_str(&strip_dotted_fields(source), ctx)?)
}
