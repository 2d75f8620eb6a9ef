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

//! Cell color palette
//!
//! Maps cell names to deduplicated material color entries. The palette
//! index of a cell is the position of its material in the material list,
//! so cells sharing a material share an index, which is what the pixel
//! arrays store.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::core::error::{GeometryError, Result};

use super::{Color, MaterialColorData};

/// Sentinel for "no palette entry".
pub const NOT_INDEX: i32 = i32::MAX;

/// Cell name to material color mapping with stable indices.
#[derive(Debug, Default, Clone)]
pub struct CellColorPalette {
    /// Unique material entries; the vector position is the palette index.
    materials: Vec<MaterialColorData>,
    /// Cell name to index into `materials`.
    cell_index: HashMap<String, usize>,
}

impl CellColorPalette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Number of distinct material entries.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn clear(&mut self) {
        self.materials.clear();
        self.cell_index.clear();
    }

    /// Register a cell/material/color triple, reusing the material entry
    /// when it already exists.
    pub fn register_color(
        &mut self,
        cell_name: &str,
        mat_name: &str,
        color: Color,
    ) -> Result<()> {
        self.register_color_full(cell_name, mat_name, "", 1.0, color)
    }

    /// Full registration with alias and print size.
    ///
    /// A cell already registered under a different material is an input
    /// inconsistency.
    pub fn register_color_full(
        &mut self,
        cell_name: &str,
        mat_name: &str,
        alias_name: &str,
        print_size: f64,
        color: Color,
    ) -> Result<()> {
        let mat_pos = self.materials.iter().position(|m| m.mat_name() == mat_name);
        let cell_known = self.cell_index.contains_key(cell_name);
        match (mat_pos, cell_known) {
            (None, false) => {
                self.materials.push(MaterialColorData::new(
                    mat_name,
                    alias_name,
                    print_size,
                    color,
                ));
                self.cell_index
                    .insert(cell_name.to_string(), self.materials.len() - 1);
                Ok(())
            }
            (None, true) => Err(GeometryError::InvalidArgument(format!(
                "color data for cell \"{}\" is duplicated (material \"{}\")",
                cell_name, mat_name
            ))),
            (Some(pos), false) => {
                self.cell_index.insert(cell_name.to_string(), pos);
                Ok(())
            }
            // Both registered already: keep the existing entry.
            (Some(_), true) => Ok(()),
        }
    }

    /// Palette index for a cell name, [`NOT_INDEX`] when absent.
    pub fn index_by_cell_name(&self, cell_name: &str) -> i32 {
        match self.cell_index.get(cell_name) {
            Some(&pos) => pos as i32,
            None => NOT_INDEX,
        }
    }

    /// Index of the first material entry with this color.
    pub fn index_by_color(&self, color: &Color) -> i32 {
        match self.materials.iter().position(|m| m.color() == color) {
            Some(pos) => pos as i32,
            None => NOT_INDEX,
        }
    }

    pub fn color_by_cell_name(&self, cell_name: &str) -> Option<&Color> {
        self.cell_index
            .get(cell_name)
            .map(|&pos| self.materials[pos].color())
    }

    /// The deduplicated material entries in index order.
    pub fn materials(&self) -> &[MaterialColorData] {
        &self.materials
    }

    /// Material name to color data, for config export.
    pub fn color_map(&self) -> BTreeMap<String, MaterialColorData> {
        self.materials
            .iter()
            .map(|m| (m.mat_name().to_string(), m.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_share_material_index() {
        let mut palette = CellColorPalette::new();
        palette
            .register_color("c1", "m1", Color::new(1, 2, 3, 1.0))
            .unwrap();
        palette
            .register_color("c2", "m1", Color::new(9, 9, 9, 1.0))
            .unwrap();
        palette
            .register_color("c3", "m2", Color::new(4, 5, 6, 1.0))
            .unwrap();
        assert_eq!(palette.len(), 2);
        assert_eq!(
            palette.index_by_cell_name("c1"),
            palette.index_by_cell_name("c2")
        );
        assert_ne!(
            palette.index_by_cell_name("c1"),
            palette.index_by_cell_name("c3")
        );
        // The first registration wins for the material color.
        assert_eq!(
            palette.color_by_cell_name("c2"),
            Some(&Color::new(1, 2, 3, 1.0))
        );
    }

    #[test]
    fn test_missing_cell_gives_not_index() {
        let palette = CellColorPalette::new();
        assert_eq!(palette.index_by_cell_name("nope"), NOT_INDEX);
    }

    #[test]
    fn test_conflicting_cell_registration() {
        let mut palette = CellColorPalette::new();
        palette
            .register_color("c1", "m1", Color::new(1, 2, 3, 1.0))
            .unwrap();
        assert!(palette
            .register_color("c1", "m2", Color::new(1, 2, 3, 1.0))
            .is_err());
    }

    #[test]
    fn test_index_by_color() {
        let mut palette = CellColorPalette::new();
        let c = Color::new(7, 7, 7, 1.0);
        palette.register_color("c1", "m1", c).unwrap();
        assert_eq!(palette.index_by_color(&c), 0);
        assert_eq!(palette.index_by_color(&Color::new(0, 0, 0, 1.0)), NOT_INDEX);
    }

    #[test]
    fn test_color_map_keys() {
        let mut palette = CellColorPalette::new();
        palette
            .register_color("c1", "m1", Color::new(1, 2, 3, 1.0))
            .unwrap();
        let map = palette.color_map();
        assert!(map.contains_key("m1"));
    }
}
