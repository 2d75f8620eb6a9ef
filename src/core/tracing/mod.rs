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

//! Tracing particle
//!
//! A deterministic walker that advances cell-to-cell along a ray,
//! recording `(cell, track length)` pairs until its life length is spent.
//! It performs no physics; the scan-line renderer casts one of these per
//! image row/column.
//!
//! Tracing conditions (no forward intersection, no adjacent cell) are
//! ordinary control flow here: [`TracingParticle::trace`] converts them to
//! end-of-track. Broken invariants (stepping never leaves the current
//! cell) are programming errors and panic.

use thiserror::Error;

use crate::core::geometry::cell::{guess_cell, CellMap};
use crate::core::geometry::surface::SurfaceMap;
use crate::core::math::{distance, Point, Vector3, DELTA, EPS};

/// Iteration cap for internal-surface hops inside one cell.
const MAX_SURFACES_PER_CELL: usize = 1000;

/// Iteration cap for the delta-step leaving a cell; exceeding it means the
/// geometry evaluation is inconsistent.
const MAX_LOOP: usize = 20;

/// Recoverable tracing conditions.
#[derive(Debug, Error)]
pub enum TraceError {
    /// A particle was constructed in a cell that does not contain its
    /// starting point.
    #[error("initial position {position} is not inside cell {cell}")]
    InvalidSource { cell: String, position: Point, direction: Vector3 },

    /// No forward surface intersection exists from the current position.
    #[error("no intersection found ahead of {position} in cell {cell}")]
    NoIntersection { cell: String, position: Point, direction: Vector3 },

    /// No adjacent cell matched after stepping over a boundary.
    #[error("no new cell found in forward direction from {position} (cell {cell})")]
    NoNewCell { cell: String, position: Point, direction: Vector3 },
}

/// One entry of the optional event log.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub event: String,
    pub position: Point,
    pub direction: Vector3,
    pub cell: String,
    pub note: String,
}

/// Deterministic cell-to-cell walker.
pub struct TracingParticle<'a> {
    cells: &'a CellMap,
    surfaces: &'a SurfaceMap,
    position: Point,
    direction: Vector3,
    current: usize,
    /// Surfaces reached by the last `move_to_surface`; cleared on cell
    /// entry.
    next_surfaces: Vec<i32>,
    life_length: f64,
    passed_cells: Vec<String>,
    track_lengths: Vec<f64>,
    record_events: bool,
    events: Vec<EventRecord>,
}

impl<'a> TracingParticle<'a> {
    /// Create a walker at `position` heading along `direction`.
    ///
    /// With a `start_cell` the position is validated against it
    /// ([`TraceError::InvalidSource`] otherwise); without one the cell is
    /// guessed, falling back to the undefined region.
    pub fn new(
        cells: &'a CellMap,
        surfaces: &'a SurfaceMap,
        position: Point,
        direction: Vector3,
        start_cell: Option<usize>,
        life_length: f64,
        record_events: bool,
        guess_strict: bool,
    ) -> Result<Self, TraceError> {
        let direction = direction.normalized();
        let current = match start_cell {
            Some(idx) => {
                if !cells.inside(surfaces, idx, &position) {
                    return Err(TraceError::InvalidSource {
                        cell: cells.name(idx).to_string(),
                        position,
                        direction,
                    });
                }
                idx
            }
            None => guess_cell(cells, surfaces, &position, guess_strict),
        };
        let mut particle = Self {
            cells,
            surfaces,
            position,
            direction,
            current,
            next_surfaces: Vec::new(),
            life_length,
            passed_cells: Vec::new(),
            track_lengths: Vec::new(),
            record_events,
            events: Vec::new(),
        };
        if record_events {
            let note = format!("cell={}", particle.cells.name(current));
            particle.record("Source production", note);
        }
        Ok(particle)
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn direction(&self) -> Vector3 {
        self.direction
    }

    /// Index of the cell currently containing the particle.
    pub fn current_cell(&self) -> usize {
        self.current
    }

    pub fn current_cell_name(&self) -> &str {
        self.cells.name(self.current)
    }

    /// Names of the cells passed so far, one entry per recorded segment.
    pub fn passed_cells(&self) -> &[String] {
        &self.passed_cells
    }

    /// Track length inside each passed cell.
    pub fn track_lengths(&self) -> &[f64] {
        &self.track_lengths
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    fn expired(&self) -> bool {
        self.life_length < EPS
    }

    fn record(&mut self, event: &str, note: String) {
        self.events.push(EventRecord {
            event: event.to_string(),
            position: self.position,
            direction: self.direction,
            cell: self.cells.name(self.current).to_string(),
            note,
        });
    }

    fn trace_error(&self, kind: fn(String, Point, Vector3) -> TraceError) -> TraceError {
        kind(
            self.cells.name(self.current).to_string(),
            self.position,
            self.direction,
        )
    }

    /// Advance to the next surface of the current cell. The surface is not
    /// necessarily a cell boundary.
    pub fn move_to_surface(&mut self) -> Result<(), TraceError> {
        match self
            .cells
            .next_intersections(self.surfaces, self.current, &self.position, &self.direction)
        {
            Some((ids, point)) => {
                if self.record_events {
                    let note = format!(
                        "trackL={}, next_s={:?}",
                        distance(&point, &self.position),
                        ids
                    );
                    self.record("Move to surface", note);
                }
                self.next_surfaces = ids;
                self.position = point;
                Ok(())
            }
            None => Err(self.trace_error(|cell, position, direction| TraceError::NoIntersection {
                cell,
                position,
                direction,
            })),
        }
    }

    /// Advance to the boundary of the current cell.
    ///
    /// Internal surfaces of the cell (hit but not bounding) are stepped
    /// over; at most [`MAX_SURFACES_PER_CELL`] per call.
    pub fn move_to_cell_bound(&mut self) -> Result<(), TraceError> {
        self.move_to_surface()?;
        let mut hops = 0;
        while self.cells.inside(
            self.surfaces,
            self.current,
            &(self.position + self.direction * DELTA),
        ) {
            self.position += self.direction * DELTA;
            self.move_to_surface()?;
            hops += 1;
            if hops > MAX_SURFACES_PER_CELL {
                return Err(self.trace_error(|cell, position, direction| TraceError::NoNewCell {
                    cell,
                    position,
                    direction,
                }));
            }
        }
        if self.record_events {
            self.record("Move to cell bound", String::new());
        }
        Ok(())
    }

    /// Step over the boundary into the adjacent cell.
    ///
    /// Must follow a successful [`Self::move_to_cell_bound`]; the
    /// candidates are the contact cells of the hit surfaces, with a
    /// position-based guess as fallback (thin cells can be jumped over by
    /// the delta step even in a well-defined geometry).
    pub fn enter_cell(&mut self) {
        assert!(
            !self.next_surfaces.is_empty(),
            "enter_cell() called without a boundary surface set"
        );

        let mut loops = 0;
        loop {
            self.position += self.direction * DELTA;
            loops += 1;
            if loops > MAX_LOOP {
                panic!("enter_cell() never left cell {}", self.cells.name(self.current));
            }
            if !self.cells.inside(self.surfaces, self.current, &self.position) {
                break;
            }
        }

        let mut found = None;
        'search: for &sid in &self.next_surfaces {
            for signed in [sid, -sid] {
                let Some(surface) = self.surfaces.get(signed) else {
                    continue;
                };
                for &cand in surface
                    .contact_cells_front()
                    .iter()
                    .chain(surface.contact_cells_back().iter())
                {
                    if cand == self.current {
                        continue;
                    }
                    if self.cells.inside(self.surfaces, cand, &self.position) {
                        found = Some(cand);
                        break 'search;
                    }
                }
            }
        }
        self.current = match found {
            Some(idx) => idx,
            None => guess_cell(self.cells, self.surfaces, &self.position, false),
        };
        self.next_surfaces.clear();
        if self.record_events {
            let note = format!("new_c={}", self.cells.name(self.current));
            self.record("Entered new cell", note);
        }
    }

    /// Move to the next cell bound, consuming life length and recording
    /// the segment.
    ///
    /// Leaving the geometry (no intersection ahead while life remains)
    /// parks the particle at its end-of-life point inside the current
    /// infinite cell; every segment after the first carries a +delta
    /// correction compensating the `enter_cell` step.
    fn move_to_bound(&mut self) {
        if self.expired() {
            return;
        }
        let before = self.position;

        if let Err(e) = self.move_to_cell_bound() {
            match e {
                TraceError::NoIntersection { .. } | TraceError::NoNewCell { .. } => {
                    self.position += self.direction * self.life_length;
                    let corrected = if self.track_lengths.is_empty() {
                        self.life_length
                    } else {
                        self.life_length + DELTA
                    };
                    self.track_lengths.push(corrected);
                    self.passed_cells
                        .push(self.cells.name(self.current).to_string());
                    if self.record_events {
                        self.record("Expired in infinite cell", String::new());
                    }
                    self.life_length = 0.0;
                    return;
                }
                TraceError::InvalidSource { .. } => {
                    unreachable!("InvalidSource cannot occur while moving")
                }
            }
        }

        let mut length = distance(&self.position, &before);
        if self.life_length > length {
            self.life_length -= length;
            if !self.track_lengths.is_empty() {
                length += DELTA;
            }
        } else {
            // The bound lies beyond the end of life: park at the
            // end-of-life point.
            self.position += self.direction * (self.life_length - length);
            length = if self.track_lengths.is_empty() {
                distance(&self.position, &before)
            } else {
                distance(&self.position, &before) + DELTA
            };
            if self.record_events {
                self.record("Expired in finite cell", String::new());
            }
            self.life_length = 0.0;
        }
        self.track_lengths.push(length);
        self.passed_cells
            .push(self.cells.name(self.current).to_string());
    }

    /// Boundary crossing with life bookkeeping: the delta step consumed by
    /// `enter_cell` comes out of the life budget.
    fn enter_cell_tr(&mut self) {
        if self.expired() {
            return;
        }
        debug_assert!(!self.track_lengths.is_empty());
        self.enter_cell();
        self.life_length -= DELTA;
    }

    /// Walk until the life length is spent, recording every traversed
    /// segment. Never fails: tracing conditions become end-of-track.
    pub fn trace(&mut self) {
        while !self.expired() {
            self.move_to_bound();
            self.enter_cell_tr();
        }
    }

    /// Dump the recorded events for diagnostics.
    pub fn dump_events(&self, out: &mut dyn std::io::Write) -> std::io::Result<()> {
        writeln!(
            out,
            "{:<24} {:<38} {:<38} {:<10} notice",
            "Event", "position", "direction", "cell"
        )?;
        for ev in &self.events {
            writeln!(
                out,
                "{:<24} {:<38} {:<38} {:<10} {}",
                ev.event,
                ev.position.to_string(),
                ev.direction.to_string(),
                ev.cell,
                ev.note
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::cell::{init_undefined_cell, update_adjacency, UNDEF_CELL_NAME};
    use crate::core::input::{DataLine, TrMap};
    use std::collections::HashMap;

    fn build(surface_cards: &[&str], cell_cards: &[&str]) -> (SurfaceMap, CellMap) {
        let surf: Vec<DataLine> = surface_cards
            .iter()
            .enumerate()
            .map(|(i, t)| DataLine::new("t", i + 1, *t))
            .collect();
        let cells: Vec<DataLine> = cell_cards
            .iter()
            .enumerate()
            .map(|(i, t)| DataLine::new("t", 100 + i, *t))
            .collect();
        let mut smap = SurfaceMap::from_cards(&surf, &TrMap::new()).unwrap();
        let mut cmap =
            CellMap::from_cards(&cells, &smap, &HashMap::new(), &TrMap::new()).unwrap();
        update_adjacency(&cmap, &mut smap);
        init_undefined_cell(&mut cmap, &mut smap);
        (smap, cmap)
    }

    /// Sphere of radius 10 inside a sphere of radius 30, outside world
    /// closed by s2.
    fn nested_spheres() -> (SurfaceMap, CellMap) {
        build(
            &["s1 sph 0 0 0 10", "s2 sph 0 0 0 30"],
            &["c1 0 -s1", "c2 0 s1 -s2", "c99 0 s2"],
        )
    }

    #[test]
    fn test_invalid_source() {
        let (smap, cmap) = nested_spheres();
        let inner = cmap.index_by_name("c1").unwrap();
        let err = TracingParticle::new(
            &cmap,
            &smap,
            Vector3::new(20.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Some(inner),
            100.0,
            false,
            false,
        );
        assert!(matches!(err, Err(TraceError::InvalidSource { .. })));
    }

    #[test]
    fn test_trace_through_nested_spheres() {
        let (smap, cmap) = nested_spheres();
        let mut p = TracingParticle::new(
            &cmap,
            &smap,
            Vector3::new(-50.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            None,
            100.0,
            false,
            false,
        )
        .unwrap();
        p.trace();
        assert_eq!(
            p.passed_cells(),
            &["c99", "c2", "c1", "c2", "c99"]
        );
        let lengths = p.track_lengths();
        // 20 cm to s2, 20 cm through the shell, 20 cm through the core,
        // 20 cm shell again, and the remaining 20 cm of life in c99.
        assert!((lengths[0] - 20.0).abs() < 1e-3, "{:?}", lengths);
        assert!((lengths[1] - 20.0).abs() < 1e-3, "{:?}", lengths);
        assert!((lengths[2] - 20.0).abs() < 1e-3, "{:?}", lengths);
        assert!((lengths[3] - 20.0).abs() < 1e-3, "{:?}", lengths);
    }

    #[test]
    fn test_track_lengths_sum_to_life() {
        let (smap, cmap) = nested_spheres();
        let life = 100.0;
        let mut p = TracingParticle::new(
            &cmap,
            &smap,
            Vector3::new(-50.0, 0.1, 0.2),
            Vector3::new(1.0, 0.0, 0.0),
            None,
            life,
            false,
            false,
        )
        .unwrap();
        p.trace();
        let total: f64 = p.track_lengths().iter().sum();
        assert!((total - life).abs() < 1e-6, "total={}", total);
    }

    #[test]
    fn test_box_scenario_track_lengths() {
        // BOX macro scenario: ray along +x from (-20,0,0), life 40.
        let surf = vec![DataLine::new("t", 1, "b1 box -10 -10 -10 20 0 0 0 20 0 0 0 20")];
        let cells = vec![
            DataLine::new("t", 2, "c1 0 -b1"),
            DataLine::new("t", 3, "c99 0 b1"),
        ];
        let mut surf = surf;
        let mut cells = cells;
        crate::core::geometry::macro_body::expand_macro_bodies(
            &TrMap::new(),
            &mut surf,
            &mut cells,
        )
        .unwrap();
        let mut smap = SurfaceMap::from_cards(&surf, &TrMap::new()).unwrap();
        let mut cmap =
            CellMap::from_cards(&cells, &smap, &HashMap::new(), &TrMap::new()).unwrap();
        update_adjacency(&cmap, &mut smap);
        init_undefined_cell(&mut cmap, &mut smap);

        let mut p = TracingParticle::new(
            &cmap,
            &smap,
            Vector3::new(-20.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            None,
            40.0,
            false,
            false,
        )
        .unwrap();
        p.trace();
        assert_eq!(p.passed_cells(), &["c99", "c1", "c99"]);
        let lengths = p.track_lengths();
        assert!((lengths[0] - 10.0).abs() < 1e-3, "{:?}", lengths);
        assert!((lengths[1] - 20.0).abs() < 1e-3, "{:?}", lengths);
        assert!((lengths[2] - 10.0).abs() < 1e-3, "{:?}", lengths);
        let total: f64 = lengths.iter().sum();
        assert!((total - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_undefined_region_recorded() {
        // Only the inside of the sphere is defined.
        let (smap, cmap) = build(&["s1 sph 0 0 0 10"], &["c1 0 -s1"]);
        let mut p = TracingParticle::new(
            &cmap,
            &smap,
            Vector3::new(-30.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            None,
            60.0,
            false,
            false,
        )
        .unwrap();
        p.trace();
        assert_eq!(
            p.passed_cells(),
            &[UNDEF_CELL_NAME, "c1", UNDEF_CELL_NAME]
        );
        let total: f64 = p.track_lengths().iter().sum();
        assert!((total - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_next_cell_progression() {
        let (smap, cmap) = nested_spheres();
        let c2 = cmap.index_by_name("c2").unwrap();
        let mut p = TracingParticle::new(
            &cmap,
            &smap,
            Vector3::new(-20.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Some(c2),
            1e10,
            false,
            false,
        )
        .unwrap();
        p.move_to_cell_bound().unwrap();
        p.enter_cell();
        assert_eq!(p.current_cell_name(), "c1");
        // The position crossed s1 by about delta.
        assert!((p.position().x + 10.0).abs() < 10.0 * DELTA);
    }
}
