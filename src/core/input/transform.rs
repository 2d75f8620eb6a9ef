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

//! Transform (TR) cards
//!
//! `tr<N> o1 o2 o3 [b1..b9 [m]]` builds the affine map
//! `world = R * local + o` with `R` rows `(b1 b2 b3 / b4 b5 b6 / b7 b8 b9)`.
//! The starred form `*tr<N>` takes the rotation entries as angles in
//! degrees instead of direct cosines. `m = -1` marks the displacement as
//! expressed in the auxiliary system.

use std::collections::HashMap;

use crate::core::error::{GeometryError, Result};
use crate::core::input::DataLine;
use crate::core::math::{to_radians, Matrix4, Vector3};

/// TR number to affine matrix.
pub type TrMap = HashMap<usize, Matrix4>;

/// Build the transform map from the transform card section.
///
/// Later cards with a duplicate number override earlier ones with a
/// warning.
pub fn make_transform_map(lines: &[DataLine]) -> Result<TrMap> {
    let mut map = TrMap::new();
    for dl in lines {
        let (id, matrix) = parse_tr_card(&dl.data)
            .map_err(|e| GeometryError::invalid_at(&dl.pos(), e.to_string()))?;
        if map.insert(id, matrix).is_some() {
            log::warn!("{} duplicate transform card tr{}", dl.pos(), id);
        }
    }
    Ok(map)
}

fn parse_tr_card(text: &str) -> Result<(usize, Matrix4)> {
    let mut tokens = text.split_whitespace();
    let head = tokens
        .next()
        .ok_or_else(|| GeometryError::InvalidArgument("empty transform card".into()))?;

    let (degrees, head) = match head.strip_prefix('*') {
        Some(rest) => (true, rest),
        None => (false, head),
    };
    let id = head
        .strip_prefix("tr")
        .and_then(|n| n.parse::<usize>().ok())
        .ok_or_else(|| {
            GeometryError::InvalidArgument(format!("\"{}\" is not a transform card", text))
        })?;

    let values: Vec<f64> = tokens
        .map(|t| {
            t.parse::<f64>().map_err(|_| {
                GeometryError::InvalidArgument(format!(
                    "transform card tr{}: \"{}\" is not a number",
                    id, t
                ))
            })
        })
        .collect::<Result<_>>()?;

    Ok((id, matrix_from_values(&values, degrees)?))
}

/// Build an affine matrix from a TR-style value list (3, 12 or 13
/// entries). Shared between TR cards and inline `trcl` specifications.
pub fn matrix_from_values(values: &[f64], degrees: bool) -> Result<Matrix4> {
    if !matches!(values.len(), 3 | 12 | 13) {
        return Err(GeometryError::InvalidArgument(format!(
            "transform takes 3, 12 or 13 values, got {}",
            values.len()
        )));
    }

    let trans = Vector3::new(values[0], values[1], values[2]);
    if values.len() == 3 {
        return Ok(Matrix4::from_translation(trans));
    }

    let mut rot = [0.0; 9];
    for (slot, v) in rot.iter_mut().zip(values[3..12].iter()) {
        *slot = if degrees { to_radians(*v).cos() } else { *v };
    }
    let m_flag = values.get(12).copied().unwrap_or(1.0);
    let matrix = Matrix4::from_parts(trans, rot);
    if m_flag < 0.0 {
        // Displacement given in the auxiliary system: o_main = -R * o.
        let o_main = -matrix.transform_direction(&trans);
        Ok(Matrix4::from_parts(o_main, rot))
    } else {
        Ok(matrix)
    }
}
