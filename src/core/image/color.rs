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

//! RGBA color
//!
//! Integer RGB channels (0-255) with a floating alpha, parsed from
//! `#RRGGBB` strings, PHITS-style color names or `{h s b}` triples.

use serde::{Deserialize, Serialize};

use crate::core::error::{GeometryError, Result};

/// An RGBA color. Alpha 0 renders as transparent in XPM export.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Color {
    pub r: i32,
    pub g: i32,
    pub b: i32,
    pub a: f64,
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        self.r == other.r
            && self.g == other.g
            && self.b == other.b
            && (self.a - other.a).abs() <= 1e-4
    }
}

impl Color {
    pub const fn new(r: i32, g: i32, b: i32, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` with an explicit alpha.
    pub fn from_rgb_string(s: &str, alpha: f64) -> Result<Self> {
        if s.len() != 7
            || !s.starts_with('#')
            || !s[1..].chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(GeometryError::InvalidArgument(format!(
                "\"{}\" is not a valid RGB string",
                s
            )));
        }
        if !(0.0..=1.0).contains(&alpha) {
            return Err(GeometryError::OutOfRange(format!(
                "{} is not a valid alpha value",
                alpha
            )));
        }
        let channel = |range: std::ops::Range<usize>| {
            i32::from_str_radix(&s[range], 16).expect("validated hex digits")
        };
        Ok(Self {
            r: channel(1..3),
            g: channel(3..5),
            b: channel(5..7),
            a: alpha,
        })
    }

    /// `#rrggbb` text of the RGB part.
    pub fn to_rgb_string(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// PHITS color input: a symbolic name, a single hue value, or an
    /// `{h s b}` triple.
    pub fn from_phits_string(input: &str) -> Result<Self> {
        if let Some(hsb) = name_to_hsb(input) {
            return Ok(Self::from_hsb(hsb[0], hsb[1], hsb[2]));
        }
        let inner = input
            .trim()
            .trim_start_matches('{')
            .trim_end_matches('}');
        let mut values: Vec<f64> = inner
            .split_whitespace()
            .map(|t| {
                t.parse::<f64>().map_err(|_| {
                    GeometryError::InvalidArgument(format!(
                        "\"{}\" is not a PHITS color",
                        input
                    ))
                })
            })
            .collect::<Result<_>>()?;
        match values.len() {
            1 => {
                // A positive scalar is a hue with full saturation and
                // brightness; a negative one a gray level.
                let v = values[0];
                values = if v > 0.0 { vec![v, 1.0, 1.0] } else { vec![0.0, 0.0, -v] };
            }
            3 => {}
            _ => {
                return Err(GeometryError::InvalidArgument(format!(
                    "HSB color takes 1 or 3 values, got \"{}\"",
                    input
                )))
            }
        }
        for v in &values {
            if !(0.0..=1.0).contains(v) {
                return Err(GeometryError::OutOfRange(format!(
                    "hsb values must be within [0, 1], got \"{}\"",
                    input
                )));
            }
        }
        // The PHITS hue axis runs backwards.
        let h = (1.0 - values[0]) * 0.833_333_3;
        Ok(Self::from_hsb(h, values[1], values[2]))
    }

    fn from_hsb(h: f64, s: f64, v: f64) -> Self {
        let (mut r, mut g, mut b) = (v, v, v);
        if s > 0.0 {
            let h = h * 6.0;
            let i = h as i32;
            let f = h - i as f64;
            match i {
                1 => {
                    r *= 1.0 - s * f;
                    b *= 1.0 - s;
                }
                2 => {
                    r *= 1.0 - s;
                    b *= 1.0 - s * (1.0 - f);
                }
                3 => {
                    r *= 1.0 - s;
                    g *= 1.0 - s * f;
                }
                4 => {
                    r *= 1.0 - s * (1.0 - f);
                    g *= 1.0 - s;
                }
                5 => {
                    g *= 1.0 - s;
                    b *= 1.0 - s * f;
                }
                _ => {
                    g *= 1.0 - s * (1.0 - f);
                    b *= 1.0 - s;
                }
            }
        }
        Self {
            r: (255.0 * r).round() as i32,
            g: (255.0 * g).round() as i32,
            b: (255.0 * b).round() as i32,
            a: 1.0,
        }
    }

    /// Cycled default colors assigned to materials without a user entry.
    pub fn default_color(i: usize) -> Color {
        const TABLE: [&str; 22] = [
            "#ee99cc", "#0000ee", "#cc99ee", "#ee00ee", "#ee8000", "#eeee99", "#80ee00",
            "#99ee99", "#00ee80", "#99eeee", "#0080ee", "#9999ee", "#7f00ee", "#ee99ee",
            "#ee007f", "#eecc99", "#eeee00", "#ccee99", "#00ee00", "#99eecc", "#00eeee",
            "#99ccee",
        ];
        Color::from_rgb_string(TABLE[i % TABLE.len()], 1.0).expect("table entries are valid")
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} A={}", self.to_rgb_string(), self.a)
    }
}

/// PHITS symbolic color names to (backward-hue, saturation, brightness).
fn name_to_hsb(name: &str) -> Option<[f64; 3]> {
    const GRAYS: [(&str, f64); 12] = [
        ("white", 1.0),
        ("lightgray", 0.8),
        ("gray", 0.6),
        ("darkgray", 0.4),
        ("matblack", 0.2),
        ("black", 0.0),
        ("w", 1.0),
        ("o", 0.8),
        ("k", 0.6),
        ("j", 0.4),
        ("f", 0.2),
        ("e", 0.0),
    ];
    if let Some((_, v)) = GRAYS.iter().find(|(n, _)| *n == name) {
        return Some([0.0, 0.0, *v]);
    }
    const HUED: [(&str, f64, f64, f64); 31] = [
        ("r", 1.000, 1.0, 1.0),
        ("red", 1.000, 1.0, 1.0),
        ("rr", 0.933, 1.0, 1.0),
        ("orange", 0.933, 1.0, 1.0),
        ("rrr", 0.867, 1.0, 1.0),
        ("orangeyellow", 0.867, 1.0, 1.0),
        ("y", 0.800, 1.0, 1.0),
        ("yellow", 0.800, 1.0, 1.0),
        ("yy", 0.733, 1.0, 1.0),
        ("yyy", 0.667, 1.0, 1.0),
        ("g", 0.600, 1.0, 1.0),
        ("green", 0.600, 1.0, 1.0),
        ("gg", 0.533, 1.0, 1.0),
        ("ggg", 0.467, 1.0, 1.0),
        ("c", 0.400, 1.0, 1.0),
        ("cyan", 0.400, 1.0, 1.0),
        ("cc", 0.333, 1.0, 1.0),
        ("ccc", 0.267, 1.0, 1.0),
        ("b", 0.200, 1.0, 1.0),
        ("blue", 0.200, 1.0, 1.0),
        ("bb", 0.133, 1.0, 1.0),
        ("violet", 0.133, 1.0, 1.0),
        ("bbb", 0.067, 1.0, 1.0),
        ("magenta", 0.067, 1.0, 1.0),
        ("darkred", 1.000, 1.0, 0.6),
        ("pink", 1.000, 0.5, 1.0),
        ("brown", 0.900, 1.0, 0.5),
        ("darkgreen", 0.600, 1.0, 0.6),
        ("purple", 0.100, 1.0, 0.5),
        ("pastelblue", 0.250, 0.4, 1.0),
        ("pastelcyan", 0.400, 0.4, 1.0),
    ];
    HUED.iter()
        .find(|(n, _, _, _)| *n == name)
        .map(|(_, h, s, v)| [0.833_333 * (1.0 - h), *s, *v])
}
