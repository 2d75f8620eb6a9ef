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

//! Geometry facade
//!
//! Owns the cell map, the surface map, the transform map and the palette,
//! and answers the two questions everything else asks: "which cell comes
//! next along this ray" and "render me a sectional image".
//!
//! Construction order: expand macro bodies, build surfaces with their
//! reverses, build cells, connect the adjacency, prune unused surfaces,
//! initialise the undefined region, then install the reserved palette and
//! a default color per material.

pub mod cell;
pub mod macro_body;
pub mod surface;

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;

use crate::core::error::{GeometryError, Result};
use crate::core::image::{BitmapImage, CellColorPalette, Color, MaterialColorData};
use crate::core::input::{lines_to_string, DataLine, TrMap};
use crate::core::math::{Point, Vector3};
use crate::core::tracing::TracingParticle;

use cell::{guess_cell, CellMap, UNDEFINED_INDEX};
use surface::SurfaceMap;

/// The assembled CSG world.
#[derive(Debug)]
pub struct Geometry {
    cells: CellMap,
    surfaces: SurfaceMap,
    tr_map: TrMap,
    palette: CellColorPalette,
}

impl Geometry {
    /// Build a geometry from cleaned card lists.
    ///
    /// `materials` maps material id tokens to display names; it may be
    /// empty (with a warning), in which case names are derived from the
    /// ids. In verbose mode the post-expansion deck is dumped to
    /// `surface.i5` and `cell.i5`.
    pub fn new(
        tr_map: TrMap,
        mut surface_input: Vec<DataLine>,
        mut cell_input: Vec<DataLine>,
        materials: &HashMap<String, String>,
        verbose: bool,
    ) -> Result<Self> {
        if surface_input.is_empty() {
            return Err(GeometryError::RuntimeError(
                "invalid input file: surface section is empty".into(),
            ));
        }
        if cell_input.is_empty() {
            return Err(GeometryError::RuntimeError(
                "invalid input file: cell section is empty".into(),
            ));
        }
        if materials.is_empty() {
            log::warn!("material section is empty");
        }

        macro_body::expand_macro_bodies(&tr_map, &mut surface_input, &mut cell_input)?;
        if verbose {
            std::fs::write("surface.i5", lines_to_string(&surface_input))?;
            std::fs::write("cell.i5", lines_to_string(&cell_input))?;
        }

        let mut surfaces = SurfaceMap::from_cards(&surface_input, &tr_map)?;
        let mut cells = CellMap::from_cards(&cell_input, &surfaces, materials, &tr_map)?;

        cell::update_adjacency(&cells, &mut surfaces);
        // TR source surfaces legitimately end up unused, so no warning.
        surfaces.remove_unused(false);
        cell::init_undefined_cell(&mut cells, &mut surfaces);

        let mut geometry = Self {
            cells,
            surfaces,
            tr_map,
            palette: CellColorPalette::new(),
        };
        geometry.set_reserved_palette()?;
        geometry.set_default_palette()?;
        Ok(geometry)
    }

    pub fn cells(&self) -> &CellMap {
        &self.cells
    }

    pub fn surfaces(&self) -> &SurfaceMap {
        &self.surfaces
    }

    pub fn tr_map(&self) -> &TrMap {
        &self.tr_map
    }

    pub fn palette(&self) -> &CellColorPalette {
        &self.palette
    }

    /// Surface name to signed id view.
    pub fn surface_name_index_map(&self) -> &HashMap<String, i32> {
        self.surfaces.name_index_map()
    }

    /// The next cell hit from `p` along `dir`, starting from `start_cell`
    /// (or a guessed cell when `None`).
    ///
    /// On success `p` is advanced just past the entry boundary. Any
    /// tracing failure (no intersection, no adjacent cell) returns
    /// `None`.
    pub fn next_cell(
        &self,
        start_cell: Option<usize>,
        dir: &Vector3,
        p: &mut Point,
    ) -> Option<usize> {
        let mut particle = TracingParticle::new(
            &self.cells,
            &self.surfaces,
            *p,
            *dir,
            start_cell,
            1e10,
            false,
            false,
        )
        .ok()?;
        particle.move_to_cell_bound().ok()?;
        particle.enter_cell();
        *p = particle.position();
        Some(particle.current_cell())
    }

    /// Render a sectional image; see the renderer for the sweep and merge
    /// semantics. An empty bitmap means the render was cancelled.
    #[allow(clippy::too_many_arguments)]
    pub fn sectional_image(
        &self,
        origin: Point,
        h_dir: Vector3,
        v_dir: Vector3,
        h_reso: usize,
        v_reso: usize,
        num_threads: usize,
        verbose: bool,
        quiet: bool,
        cancel: Option<&AtomicBool>,
    ) -> BitmapImage {
        crate::core::render::sectional_image(
            self, origin, h_dir, v_dir, h_reso, v_reso, num_threads, verbose, quiet, cancel,
        )
    }

    /// First cell containing `p`, or the undefined singleton index.
    pub fn find_cell(&self, p: &Point, strict: bool) -> usize {
        guess_cell(&self.cells, &self.surfaces, p, strict)
    }

    /// The deck-equivalent of the in-memory state: every cell in name
    /// order, then the deduplicated referenced surfaces.
    ///
    /// Re-parsing this output into a fresh geometry yields an equal cell
    /// map.
    pub fn to_final_input_string(&self) -> String {
        let mut text = String::from("c  cells\n");
        let mut ordered: BTreeMap<&str, &cell::Cell> = BTreeMap::new();
        for (_, c) in self.cells.iter() {
            ordered.insert(c.name(), c);
        }
        for c in ordered.values() {
            text.push_str(&c.to_final_input_string());
            text.push('\n');
        }

        text.push_str("\nc  surfaces\n");
        let mut surface_cards: BTreeMap<String, String> = BTreeMap::new();
        for (_, c) in self.cells.iter() {
            for &id in c.contact_ids() {
                let surf = self.surfaces.at(id.abs());
                surface_cards.insert(surf.name().to_string(), surf.to_input_string());
            }
        }
        for card in surface_cards.values() {
            text.push_str(card);
            text.push('\n');
        }
        text
    }

    /// Reserved region entries; re-applied last so user configuration can
    /// never remove them.
    fn set_reserved_palette(&mut self) -> Result<()> {
        use self::cell::*;
        let entries = [
            (UNDEF_CELL_NAME, UNDEF_MAT_NAME, Color::new(255, 255, 255, 0.0)),
            (VOID_CELL_NAME, VOID_MAT_NAME, Color::new(255, 255, 255, 1.0)),
            (UBOUND_CELL_NAME, UBOUND_MAT_NAME, Color::new(255, 0, 0, 1.0)),
            (BOUND_CELL_NAME, BOUND_MAT_NAME, Color::new(0, 0, 0, 1.0)),
            (DOUBLE_CELL_NAME, DOUBLE_MAT_NAME, Color::new(0x66, 0x66, 0x66, 1.0)),
            (OMITTED_CELL_NAME, OMITTED_MAT_NAME, Color::new(0x33, 0x00, 0x99, 1.0)),
        ];
        for (cell_name, mat_name, color) in entries {
            self.palette.register_color(cell_name, mat_name, color)?;
        }
        Ok(())
    }

    /// Assign a distinct default color to every material referenced by
    /// the cells.
    pub fn set_default_palette(&mut self) -> Result<()> {
        let mut mat_names: Vec<String> = self
            .cells
            .iter()
            .map(|(_, c)| c.material_name().to_string())
            .collect();
        mat_names.sort();
        mat_names.dedup();
        let mat_index: HashMap<&str, usize> = mat_names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();

        for (_, c) in self.cells.iter() {
            let color = Color::default_color(mat_index[c.material_name()]);
            self.palette
                .register_color(c.name(), c.material_name(), color)?;
        }
        Ok(())
    }

    /// Drop all user color assignments, keeping only the reserved
    /// entries.
    pub fn clear_user_defined_palette(&mut self) -> Result<()> {
        self.palette.clear();
        self.set_reserved_palette()
    }

    /// Rebuild the palette from a material color map; materials without
    /// an entry get default colors, reserved entries are re-applied.
    pub fn create_modified_palette(
        &mut self,
        mat_map: &BTreeMap<String, MaterialColorData>,
    ) -> Result<()> {
        self.palette.clear();
        self.set_reserved_palette()?;

        let mut mat_names: Vec<String> = self
            .cells
            .iter()
            .map(|(_, c)| c.material_name().to_string())
            .collect();
        mat_names.sort();
        mat_names.dedup();
        let mat_index: HashMap<&str, usize> = mat_names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();

        for (_, c) in self.cells.iter() {
            let mat_name = c.material_name();
            match mat_map.get(mat_name) {
                Some(data) => self.palette.register_color_full(
                    c.name(),
                    mat_name,
                    data.alias_name(),
                    data.print_size(),
                    *data.color(),
                )?,
                None => self.palette.register_color(
                    c.name(),
                    mat_name,
                    Color::default_color(mat_index[mat_name]),
                )?,
            }
        }
        Ok(())
    }
}

/// Convenience handle for tracing helpers that only need the maps.
impl Geometry {
    pub(crate) fn maps(&self) -> (&CellMap, &SurfaceMap) {
        (&self.cells, &self.surfaces)
    }

    /// Name of a cell index, the undefined singleton included.
    pub fn cell_name(&self, idx: usize) -> &str {
        self.cells.name(idx)
    }

    /// True when the index is the undefined singleton.
    pub fn is_undefined(idx: usize) -> bool {
        idx == UNDEFINED_INDEX
    }
}
