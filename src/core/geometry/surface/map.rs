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

//! Surface map
//!
//! Central storage of all surfaces keyed by signed id. Every surface built
//! from a card gets a positive id; its reverse copy is inserted under the
//! negated id with the mirror-image name, so both sides are always present.

use std::collections::HashMap;

use crate::core::error::{GeometryError, Result};
use crate::core::input::{DataLine, SurfaceCard, TrMap};

use super::Surface;

/// Bidirectional surface storage: signed id -> surface, name -> signed id.
#[derive(Debug, Default, Clone)]
pub struct SurfaceMap {
    surfaces: HashMap<i32, Surface>,
    name_index: HashMap<String, i32>,
}

impl SurfaceMap {
    /// Build the map from the (macro-expanded) surface card section.
    ///
    /// Ids are assigned in card order starting at 1; the reverse copies are
    /// created immediately so the invariant "both sides exist" holds from
    /// the start.
    pub fn from_cards(lines: &[DataLine], tr_map: &TrMap) -> Result<Self> {
        let mut map = SurfaceMap::default();
        let mut next_id = 1;
        for dl in lines {
            let card = SurfaceCard::from_string(&dl.data)
                .map_err(|e| GeometryError::invalid_at(&dl.pos(), e.to_string()))?;
            if map.name_index.contains_key(&card.name) {
                return Err(GeometryError::invalid_at(
                    &dl.pos(),
                    format!("duplicate surface name \"{}\"", card.name),
                ));
            }
            let surface = Surface::from_card(&card, next_id, tr_map)
                .map_err(|e| GeometryError::invalid_at(&dl.pos(), e.to_string()))?;
            map.insert(surface);
            next_id += 1;
        }
        Ok(map)
    }

    /// Insert a front surface together with its reverse copy.
    pub fn insert(&mut self, surface: Surface) {
        let reverse = surface.reverse();
        self.name_index.insert(surface.name().to_string(), surface.id());
        self.name_index.insert(reverse.name().to_string(), reverse.id());
        self.surfaces.insert(surface.id(), surface);
        self.surfaces.insert(reverse.id(), reverse);
    }

    /// Surface by signed id. Missing ids are a broken invariant.
    pub fn at(&self, id: i32) -> &Surface {
        self.surfaces
            .get(&id)
            .unwrap_or_else(|| panic!("surface id {} is not in the map", id))
    }

    pub fn get(&self, id: i32) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: i32) -> Option<&mut Surface> {
        self.surfaces.get_mut(&id)
    }

    /// Signed id for a (possibly `-`-prefixed) surface name.
    pub fn id_by_name(&self, name: &str) -> Option<i32> {
        self.name_index.get(name).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&Surface> {
        self.id_by_name(name).and_then(|id| self.get(id))
    }

    /// Name to signed id view, both sides included.
    pub fn name_index_map(&self) -> &HashMap<String, i32> {
        &self.name_index
    }

    /// Number of stored surfaces, reverse copies included.
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Positive ids currently in the map, ascending.
    pub fn front_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.surfaces.keys().copied().filter(|id| *id > 0).collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate all surfaces in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.values()
    }

    /// Delete surfaces with no contact cells on either side of either
    /// copy. Returns the number of removed pairs.
    ///
    /// Surfaces only referenced as TR expansion sources end up here, which
    /// is expected; `warn` controls whether each removal is logged.
    pub fn remove_unused(&mut self, warn: bool) -> usize {
        let unused: Vec<i32> = self
            .front_ids()
            .into_iter()
            .filter(|&id| {
                let front = self.at(id);
                let back = self.at(-id);
                front.contact_front.is_empty()
                    && front.contact_back.is_empty()
                    && back.contact_front.is_empty()
                    && back.contact_back.is_empty()
            })
            .collect();
        for id in &unused {
            if warn {
                log::warn!("removing unused surface \"{}\"", self.at(*id).name());
            }
            for signed in [*id, -*id] {
                if let Some(s) = self.surfaces.remove(&signed) {
                    self.name_index.remove(s.name());
                }
            }
        }
        unused.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> SurfaceMap {
        let lines = vec![
            DataLine::new("t", 1, "s1 sph 0 0 0 10"),
            DataLine::new("t", 2, "p1 px 0"),
        ];
        SurfaceMap::from_cards(&lines, &TrMap::new()).unwrap()
    }

    #[test]
    fn test_both_sides_present() {
        let map = sample_map();
        assert_eq!(map.len(), 4);
        assert_eq!(map.id_by_name("s1"), Some(1));
        assert_eq!(map.id_by_name("-s1"), Some(-1));
        assert_eq!(map.id_by_name("p1"), Some(2));
        assert_eq!(map.id_by_name("-p1"), Some(-2));
        assert_eq!(map.at(-1).name(), "-s1");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let lines = vec![
            DataLine::new("t", 1, "s1 sph 0 0 0 10"),
            DataLine::new("t", 2, "s1 px 0"),
        ];
        assert!(SurfaceMap::from_cards(&lines, &TrMap::new()).is_err());
    }

    #[test]
    fn test_remove_unused() {
        let mut map = sample_map();
        // Give s1 a contact; p1 stays unused.
        map.get_mut(1).unwrap().contact_front.push(0);
        let removed = map.remove_unused(false);
        assert_eq!(removed, 1);
        assert!(map.by_name("p1").is_none());
        assert!(map.by_name("-p1").is_none());
        assert!(map.by_name("s1").is_some());
    }

    #[test]
    fn test_error_carries_position() {
        let lines = vec![DataLine::new("deck.i", 7, "s1 sph 0 0 0")];
        let err = SurfaceMap::from_cards(&lines, &TrMap::new()).unwrap_err();
        assert!(err.to_string().contains("deck.i:7"));
    }
}
