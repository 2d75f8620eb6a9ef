// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cell card grammar
//!
//! Post-clean form: `<name> <mat-id> [<density>] <polynomial> [key=value...]`.
//! The density token is absent for void cells (`mat-id` 0). Parameter values
//! may be scalars or parenthesised lists spanning several tokens.

use crate::core::error::{GeometryError, Result};

/// Parameter keys accepted after the polynomial. A key may carry a particle
/// designator suffix (`imp:n`) and a leading `*` (degrees form of `trcl`).
const PARAM_KEYS: &[&str] = &[
    "u", "trcl", "fill", "lat", "tmp", "wwn", "ext", "fcl", "imp", "nonu", "pd", "pwt", "vol",
    "rho", "mat",
];

/// A parsed cell card.
#[derive(Debug, Clone, PartialEq)]
pub struct CellCard {
    /// Cell name.
    pub name: String,
    /// Material id token (`0` for void, otherwise a number or a name).
    pub material: String,
    /// Density; 0 for void cells. The sign convention of the deck is kept.
    pub density: f64,
    /// Boolean polynomial over surface names.
    pub equation: String,
    /// Trailing parameters in card order, raw value text.
    pub params: Vec<(String, String)>,
}

impl CellCard {
    /// Parse a cleaned cell card line.
    pub fn from_string(text: &str) -> Result<Self> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() < 3 {
            return Err(GeometryError::InvalidArgument(format!(
                "cell card \"{}\" is too short",
                text
            )));
        }
        let name = tokens[0].to_string();
        let material = tokens[1].to_string();

        let mut idx = 2;
        let density = if material == "0" {
            0.0
        } else {
            let d = tokens
                .get(idx)
                .and_then(|t| t.parse::<f64>().ok())
                .ok_or_else(|| {
                    GeometryError::InvalidArgument(format!(
                        "cell card \"{}\": missing density for material {}",
                        text, material
                    ))
                })?;
            idx += 1;
            d
        };

        // The polynomial runs until the first key=value token.
        let mut equation_tokens = Vec::new();
        while idx < tokens.len() && !is_param_token(tokens[idx]) {
            equation_tokens.push(tokens[idx]);
            idx += 1;
        }
        if equation_tokens.is_empty() {
            return Err(GeometryError::InvalidArgument(format!(
                "cell card \"{}\" has no geometry polynomial",
                text
            )));
        }
        let equation = equation_tokens.join(" ");

        // key=value parameters; a value opening with '(' runs to the
        // matching ')'.
        let mut params = Vec::new();
        while idx < tokens.len() {
            let tok = tokens[idx];
            let eq = tok.find('=').ok_or_else(|| {
                GeometryError::InvalidArgument(format!(
                    "cell card \"{}\": unexpected token \"{}\" after polynomial",
                    text, tok
                ))
            })?;
            let key = tok[..eq].to_string();
            let mut value = tok[eq + 1..].to_string();
            idx += 1;
            if value.starts_with('(') {
                while paren_depth(&value) > 0 && idx < tokens.len() {
                    value.push(' ');
                    value.push_str(tokens[idx]);
                    idx += 1;
                }
                if paren_depth(&value) > 0 {
                    return Err(GeometryError::InvalidArgument(format!(
                        "cell card \"{}\": unbalanced parentheses in {}=",
                        text, key
                    )));
                }
            }
            params.push((key, value));
        }

        Ok(Self { name, material, density, equation, params })
    }

    /// Value of a parameter by bare key, ignoring `*` prefix and particle
    /// designator suffix.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| bare_key(k) == key)
            .map(|(_, v)| v.as_str())
    }

    /// Re-emit the card as deck text.
    pub fn to_input_string(&self) -> String {
        let mut out = format!("{} {}", self.name, self.material);
        if self.material != "0" {
            out.push_str(&format!(" {}", self.density));
        }
        out.push(' ');
        out.push_str(&self.equation);
        for (k, v) in &self.params {
            out.push_str(&format!(" {}={}", k, v));
        }
        out
    }
}

fn paren_depth(s: &str) -> i32 {
    s.chars().fold(0, |d, c| match c {
        '(' => d + 1,
        ')' => d - 1,
        _ => d,
    })
}

fn bare_key(key: &str) -> &str {
    let key = key.strip_prefix('*').unwrap_or(key);
    key.split(':').next().unwrap_or(key)
}

fn is_param_token(tok: &str) -> bool {
    match tok.find('=') {
        Some(eq) => PARAM_KEYS.contains(&bare_key(&tok[..eq])),
        None => false,
    }
}
