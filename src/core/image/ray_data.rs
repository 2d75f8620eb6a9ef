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

//! Traced ray data
//!
//! The per-ray record handed from the tracer to the renderer: cell names
//! with track lengths, boundary positions as prefix sums from the ray
//! origin, and the three reserved region names the pixel classifier
//! reports for boundaries.

use crate::core::math::Point;

/// One traced scan line.
#[derive(Debug, Clone)]
pub struct TracingRayData {
    start_pos: Point,
    /// Scan-line index; ray i always maps to the same row/column.
    index: usize,
    cell_names: Vec<String>,
    lengths: Vec<f64>,
    /// Cell-bound positions along the ray, origin at 0.
    cell_bound_positions: Vec<f64>,
    undefined_region_name: String,
    undefined_bound_region_name: String,
    bound_region_name: String,
}

impl TracingRayData {
    /// Wrap one traced ray.
    ///
    /// Consecutive duplicate cell names are coalesced, summing their
    /// track lengths; bound positions are computed as prefix sums.
    ///
    /// # Panics
    ///
    /// When `cells` and `lengths` disagree in size or are empty; the
    /// tracer guarantees both.
    pub fn new(
        start_pos: Point,
        index: usize,
        cells: &[String],
        lengths: &[f64],
        undefined_region_name: impl Into<String>,
        undefined_bound_region_name: impl Into<String>,
        bound_region_name: impl Into<String>,
    ) -> Self {
        assert_eq!(
            cells.len(),
            lengths.len(),
            "ray {}: cells and track lengths disagree",
            index
        );
        assert!(!cells.is_empty(), "ray {}: empty trace", index);

        let mut cell_names: Vec<String> = vec![cells[0].clone()];
        let mut merged: Vec<f64> = vec![lengths[0]];
        for (name, len) in cells.iter().zip(lengths.iter()).skip(1) {
            if name == cell_names.last().unwrap() {
                *merged.last_mut().unwrap() += len;
            } else {
                cell_names.push(name.clone());
                merged.push(*len);
            }
        }

        let mut pos = 0.0;
        let cell_bound_positions = merged
            .iter()
            .map(|len| {
                pos += len;
                pos
            })
            .collect();

        Self {
            start_pos,
            index,
            cell_names,
            lengths: merged,
            cell_bound_positions,
            undefined_region_name: undefined_region_name.into(),
            undefined_bound_region_name: undefined_bound_region_name.into(),
            bound_region_name: bound_region_name.into(),
        }
    }

    pub fn start(&self) -> Point {
        self.start_pos
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn cell_names(&self) -> &[String] {
        &self.cell_names
    }

    pub fn cell_bound_positions(&self) -> &[f64] {
        &self.cell_bound_positions
    }

    /// Region name for the pixel centred at `pos` (cm from the ray
    /// origin) with width `pix_width`.
    ///
    /// A cell bound within half a pixel of the centre makes the pixel a
    /// boundary pixel; a bound exactly on the upper pixel edge belongs to
    /// this pixel, one exactly on the lower edge to the previous pixel.
    /// Boundaries adjacent to the undefined region report the
    /// undefined-boundary name. Past the end of the trace the last cell
    /// applies, with a warning.
    pub fn get_cell_name(&self, pos: f64, pix_width: f64) -> &str {
        let bounds = &self.cell_bound_positions;
        // The last entry is the end of the track, not a cell bound.
        for i in 0..bounds.len().saturating_sub(1) {
            let distance = bounds[i] - pos;
            let half = 0.5 * pix_width;
            if distance.abs() <= half && (distance.abs() != half || distance > 0.0) {
                if self.cell_names[i] == self.undefined_region_name
                    || self.cell_names[i + 1] == self.undefined_region_name
                {
                    return &self.undefined_bound_region_name;
                }
                return &self.bound_region_name;
            }
            if bounds[i] > pos + half {
                return &self.cell_names[i];
            }
        }
        if pos > *bounds.last().unwrap() {
            log::warn!(
                "ray {}: position {} is beyond the traced length {}; last cell used",
                self.index,
                pos,
                bounds.last().unwrap()
            );
        }
        self.cell_names.last().unwrap()
    }
}
