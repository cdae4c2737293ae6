// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! URI template expansion for license server links.
//!
//! Covers the RFC 6570 forms license servers actually publish: simple
//! `{var}` substitution and form-style query expansion `{?a,b}` / `{&a,b}`.
//! Undefined variables are dropped, so a `return` link's `{?id,name}` tail
//! collapses when nothing is supplied.

use url::form_urlencoded::byte_serialize;

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn lookup<'a>(vars: &'a [(&str, String)], name: &str) -> Option<&'a str> {
    vars.iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.as_str())
}

fn expand_expression(expression: &str, vars: &[(&str, String)]) -> String {
    let (operator, names) = match expression.chars().next() {
        Some(op @ ('?' | '&')) => (Some(op), &expression[1..]),
        _ => (None, expression),
    };

    let defined = names
        .split(',')
        .map(str::trim)
        .filter_map(|name| lookup(vars, name).map(|value| (name, value)));

    match operator {
        Some(op) => {
            let pairs: Vec<String> = defined
                .map(|(name, value)| format!("{name}={}", encode(value)))
                .collect();
            if pairs.is_empty() {
                String::new()
            } else {
                format!("{op}{}", pairs.join("&"))
            }
        }
        None => defined
            .map(|(_, value)| encode(value))
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Expands `template` with `vars`. Text outside braces is copied verbatim; an
/// unterminated brace is copied as-is.
pub fn expand(template: &str, vars: &[(&str, String)]) -> String {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        expanded.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('}') else {
            expanded.push_str(&rest[open..]);
            return expanded;
        };
        expanded.push_str(&expand_expression(&rest[open + 1..open + close], vars));
        rest = &rest[open + close + 1..];
    }
    expanded.push_str(rest);
    expanded
}
