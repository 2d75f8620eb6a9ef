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

//! Surface card grammar
//!
//! Post-clean form: `<name> [tr<N>...] <mnemonic> <params...>`. More than
//! one TR token is accepted; the matrices compose with the rightmost
//! applied first.

use crate::core::error::{GeometryError, Result};

/// A parsed surface card.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceCard {
    /// Surface name (user-facing).
    pub name: String,
    /// TR numbers, in card order.
    pub trs: Vec<usize>,
    /// Mnemonic: `sph`, `px`, `gq`, a macro-body keyword, ...
    pub symbol: String,
    /// Numeric parameters.
    pub params: Vec<f64>,
}

impl SurfaceCard {
    /// Parse a cleaned surface card line.
    pub fn from_string(text: &str) -> Result<Self> {
        let mut tokens = text.split_whitespace();
        let name = tokens
            .next()
            .ok_or_else(|| GeometryError::InvalidArgument("empty surface card".into()))?
            .to_string();

        let mut trs = Vec::new();
        let mut symbol = String::new();
        for tok in tokens.by_ref() {
            if let Some(n) = parse_tr_token(tok) {
                trs.push(n);
            } else {
                symbol = tok.to_string();
                break;
            }
        }
        if symbol.is_empty() {
            return Err(GeometryError::InvalidArgument(format!(
                "surface card \"{}\" has no mnemonic",
                text
            )));
        }

        let mut params = Vec::new();
        for tok in tokens {
            let v = tok.parse::<f64>().map_err(|_| {
                GeometryError::InvalidArgument(format!(
                    "surface card \"{}\": parameter \"{}\" is not a number",
                    text, tok
                ))
            })?;
            params.push(v);
        }

        Ok(Self { name, trs, symbol, params })
    }

    /// Re-emit the card as deck text.
    pub fn to_input_string(&self) -> String {
        let mut out = self.name.clone();
        for tr in &self.trs {
            out.push_str(&format!(" tr{}", tr));
        }
        out.push(' ');
        out.push_str(&self.symbol);
        for p in &self.params {
            out.push_str(&format!(" {}", fmt_param(*p)));
        }
        out
    }
}

/// `tr12` → `Some(12)`. Anything else → `None`.
fn parse_tr_token(tok: &str) -> Option<usize> {
    let rest = tok.strip_prefix("tr")?;
    if rest.is_empty() {
        return None;
    }
    rest.parse::<usize>().ok()
}

/// Compact float formatting for emitted cards.
pub(crate) fn fmt_param(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
