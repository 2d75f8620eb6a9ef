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

//! Point-defined axisymmetric surfaces: the `x`, `y`, `z` cards.
//!
//! One to three `(coordinate, radius)` pairs on the axis of revolution
//! select a plane, a cylinder, a cone or a general quadric of revolution.
//! Always exactly one generated surface.

use crate::core::error::{GeometryError, Result};
use crate::core::input::SurfaceCard;
use crate::core::math::EPS;

use super::{check_param_length, fmt, MacroBody};

/// The `x`/`y`/`z` card for one coordinate axis (0, 1, 2).
pub(crate) struct AxSym {
    pub axis: usize,
}

impl MacroBody for AxSym {
    fn mnemonic(&self) -> &'static str {
        match self.axis {
            0 => "x",
            1 => "y",
            _ => "z",
        }
    }

    fn expand(&self, card: &SurfaceCard) -> Result<Vec<String>> {
        check_param_length(&card.params, &[2, 4, 6], self.mnemonic())?;
        let axis_char = self.mnemonic();
        let pairs: Vec<(f64, f64)> = card
            .params
            .chunks(2)
            .map(|c| (c[0], c[1]))
            .collect();

        let facet = match pairs.len() {
            1 => format!("p{} {}", axis_char, fmt(pairs[0].0)),
            2 => {
                let ((x1, r1), (x2, r2)) = (pairs[0], pairs[1]);
                if (x1 - x2).abs() < EPS {
                    // A vertical generator revolves into the plane itself.
                    format!("p{} {}", axis_char, fmt(x1))
                } else if (r1 - r2).abs() < EPS {
                    format!("c{} {}", axis_char, fmt(r1.abs()))
                } else {
                    // Linear generator: a one-sheet cone.
                    let slope = (r2 - r1) / (x2 - x1);
                    let apex = x1 - r1 / slope;
                    let sheet = if (x1 - apex).abs() > EPS {
                        (x1 - apex).signum()
                    } else {
                        (x2 - apex).signum()
                    };
                    format!(
                        "k{} {} {} {}",
                        axis_char,
                        fmt(apex),
                        fmt(slope * slope),
                        fmt(sheet)
                    )
                }
            }
            _ => {
                // Quadratic generator r^2 = a + b*s + c*s^2 through the
                // three points.
                let (a, b, c) = fit_conic(&pairs).ok_or_else(|| {
                    GeometryError::InvalidArgument(format!(
                        "{} {}: points do not define a surface of revolution",
                        axis_char, card.name
                    ))
                })?;
                // sum of squares of the two off-axis coordinates minus the
                // generator, as a general quadric.
                let mut quad = [0.0; 10]; // a b c d e f g h j k
                for i in 0..3 {
                    quad[i] = if i == self.axis { -c } else { 1.0 };
                }
                quad[6 + self.axis] = -b;
                quad[9] = -a;
                let parts: Vec<String> = quad.iter().map(|v| fmt(*v)).collect();
                format!("gq {}", parts.join(" "))
            }
        };
        Ok(vec![facet])
    }

    fn replacement(&self, name: &str, _num_surfaces: usize) -> (String, String) {
        (format!("(-{}.1)", name), format!("({}.1)", name))
    }
}

/// Solve `r_i^2 = a + b*x_i + c*x_i^2` for the three sample points.
fn fit_conic(pairs: &[(f64, f64)]) -> Option<(f64, f64, f64)> {
    let (x1, r1) = pairs[0];
    let (x2, r2) = pairs[1];
    let (x3, r3) = pairs[2];
    let (y1, y2, y3) = (r1 * r1, r2 * r2, r3 * r3);

    // Cramer on the Vandermonde-like system.
    let det = |a: [f64; 3], b: [f64; 3], c: [f64; 3]| {
        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    };
    let ones = [1.0, 1.0, 1.0];
    let xs = [x1, x2, x3];
    let x2s = [x1 * x1, x2 * x2, x3 * x3];
    let ys = [y1, y2, y3];
    let d = det(ones, xs, x2s);
    if d.abs() < EPS {
        return None;
    }
    Some((
        det(ys, xs, x2s) / d,
        det(ones, ys, x2s) / d,
        det(ones, xs, ys) / d,
    ))
}
