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

//! Material color data
//!
//! User-facing color assignment per material: the internal material name,
//! an optional display alias, a print scale and the color itself. Loaded
//! either from a `mat name color` card block or from a JSON config whose
//! field names follow the established config format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::{GeometryError, Result};
use crate::core::input::DataLine;

use super::Color;

/// Color assignment for one material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialColorData {
    /// Material name used internally.
    #[serde(rename = "matName_")]
    mat_name: String,
    /// Display alias; empty when unused.
    #[serde(rename = "aliasName_", default)]
    alias_name: String,
    /// Legend print scale.
    #[serde(rename = "printSize_", default = "default_print_size")]
    print_size: f64,
    #[serde(rename = "color_")]
    color: Color,
}

fn default_print_size() -> f64 {
    1.0
}

impl MaterialColorData {
    pub fn new(
        mat_name: impl Into<String>,
        alias_name: impl Into<String>,
        print_size: f64,
        color: Color,
    ) -> Self {
        Self {
            mat_name: mat_name.into(),
            alias_name: alias_name.into(),
            print_size,
            color,
        }
    }

    pub fn mat_name(&self) -> &str {
        &self.mat_name
    }

    pub fn alias_name(&self) -> &str {
        &self.alias_name
    }

    pub fn print_size(&self) -> f64 {
        self.print_size
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    /// Parse a `mat name color` block: per line
    /// `<mat> <alias> <color>` where the color is `#RRGGBB`, a PHITS
    /// color name, or `{h s b}`. The alias `-` means none. Returns a map
    /// keyed by material name.
    pub fn from_cards(lines: &[DataLine]) -> Result<BTreeMap<String, MaterialColorData>> {
        let mut map = BTreeMap::new();
        for dl in lines {
            let tokens: Vec<&str> = dl.data.split_whitespace().collect();
            if tokens.len() < 3 {
                return Err(GeometryError::invalid_at(
                    &dl.pos(),
                    format!("mat-name-color entry \"{}\" needs 3 fields", dl.data),
                ));
            }
            let mat = tokens[0].to_string();
            let alias = if tokens[1] == "-" { "" } else { tokens[1] };
            let color_text = tokens[2..].join(" ");
            let color = if color_text.starts_with('#') {
                Color::from_rgb_string(&color_text, 1.0)
            } else {
                Color::from_phits_string(&color_text)
            }
            .map_err(|e| GeometryError::invalid_at(&dl.pos(), e.to_string()))?;
            map.insert(
                mat.clone(),
                MaterialColorData::new(mat, alias, 1.0, color),
            );
        }
        Ok(map)
    }

    /// Parse the JSON color-map config:
    /// `{ mat: { matName_, aliasName_, printSize_, color_: {r,g,b,a} } }`.
    pub fn from_json_str(json: &str) -> Result<BTreeMap<String, MaterialColorData>> {
        serde_json::from_str(json).map_err(|e| {
            GeometryError::InvalidArgument(format!("bad color-map JSON: {}", e))
        })
    }

    /// Serialize a color map back to the JSON config format.
    pub fn to_json_string(map: &BTreeMap<String, MaterialColorData>) -> String {
        serde_json::to_string_pretty(map).expect("color map serializes")
    }
}
