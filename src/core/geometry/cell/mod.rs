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

//! Cell model
//!
//! A cell is a named 3-D region defined by a boolean polynomial over
//! signed surface ids. Cells are built once from the (macro-expanded) cell
//! card section and are strictly read-only afterwards, so render workers
//! can share them freely.
//!
//! The undefined region is a singleton handled by [`CellMap`]: it is
//! attached to every surface's contact lists so a walker crossing into an
//! uncovered region always finds it as a candidate, and a point is inside
//! it exactly when no user cell claims the point.

mod polynomial;

pub use polynomial::LogicalPolynomial;

use std::collections::HashMap;

use crate::core::error::{GeometryError, Result};
use crate::core::input::{matrix_from_values, CellCard, DataLine, TrMap};
use crate::core::math::{Matrix4, Point, Vector3};

use super::surface::{SurfaceMap, SurfaceSign};

/// Reserved region names, always present in a built geometry.
pub const UNDEF_CELL_NAME: &str = "*C_undef*";
pub const VOID_CELL_NAME: &str = "*C_void*";
pub const UBOUND_CELL_NAME: &str = "*C_ubound*";
pub const BOUND_CELL_NAME: &str = "*C_bound*";
pub const DOUBLE_CELL_NAME: &str = "*C_double*";
pub const OMITTED_CELL_NAME: &str = "*C_omitted*";

/// Reserved material names backing the reserved regions.
pub const UNDEF_MAT_NAME: &str = "*M_undef*";
pub const VOID_MAT_NAME: &str = "*M_void*";
pub const UBOUND_MAT_NAME: &str = "*M_ubound*";
pub const BOUND_MAT_NAME: &str = "*M_bound*";
pub const DOUBLE_MAT_NAME: &str = "*M_double*";
pub const OMITTED_MAT_NAME: &str = "*M_omitted*";

/// Fixed ids of the reserved regions.
pub const UNDEF_CELL_ID: i32 = 0;
pub const VOID_CELL_ID: i32 = -1;
pub const UBOUND_CELL_ID: i32 = -2;
pub const BOUND_CELL_ID: i32 = -3;
pub const DOUBLE_CELL_ID: i32 = -4;
pub const OMITTED_CELL_ID: i32 = -5;

/// Index of the undefined-cell singleton inside a [`CellMap`].
pub const UNDEFINED_INDEX: usize = usize::MAX;

/// One CSG cell. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Cell {
    name: String,
    material_name: String,
    density: f64,
    importance: Option<f64>,
    /// World-to-cell map when the card carried a TRCL.
    trcl_inv: Option<Matrix4>,
    polynomial: LogicalPolynomial,
    equation: String,
    /// Signed surface ids referenced by the polynomial, deduplicated.
    contact_ids: Vec<i32>,
    /// Raw parameters kept for deck re-emission.
    params: Vec<(String, String)>,
}

impl Cell {
    /// Build a cell from its parsed card.
    ///
    /// The polynomial is resolved against `surfaces`; the material id
    /// token against `materials` (id token to display name). `tr_map` is
    /// needed when `trcl` references a TR number.
    pub fn new(
        card: &CellCard,
        surfaces: &SurfaceMap,
        materials: &HashMap<String, String>,
        tr_map: &TrMap,
    ) -> Result<Self> {
        let polynomial = LogicalPolynomial::from_equation(&card.equation, &|name| {
            surfaces.id_by_name(name)
        })?;
        let contact_ids = polynomial.literals();

        let material_name = if card.material == "0" {
            VOID_MAT_NAME.to_string()
        } else if let Some(name) = materials.get(&card.material) {
            name.clone()
        } else if card.material.parse::<u32>().is_ok() {
            format!("m{}", card.material)
        } else {
            card.material.clone()
        };

        let importance = card.param("imp").and_then(|v| v.parse::<f64>().ok());

        let mut trcl_inv = None;
        for (key, value) in &card.params {
            let degrees = key.starts_with('*');
            let bare = key.strip_prefix('*').unwrap_or(key);
            if bare.split(':').next() != Some("trcl") {
                continue;
            }
            let matrix = if value.starts_with('(') {
                let inner = value.trim_start_matches('(').trim_end_matches(')');
                let values: Vec<f64> = inner
                    .split_whitespace()
                    .map(|t| {
                        t.parse::<f64>().map_err(|_| {
                            GeometryError::InvalidArgument(format!(
                                "cell {}: bad trcl value \"{}\"",
                                card.name, t
                            ))
                        })
                    })
                    .collect::<Result<_>>()?;
                matrix_from_values(&values, degrees)?
            } else {
                let n = value.parse::<usize>().map_err(|_| {
                    GeometryError::InvalidArgument(format!(
                        "cell {}: trcl=\"{}\" is neither a TR number nor an inline spec",
                        card.name, value
                    ))
                })?;
                *tr_map.get(&n).ok_or_else(|| {
                    GeometryError::InvalidArgument(format!(
                        "cell {} references undefined transform tr{}",
                        card.name, n
                    ))
                })?
            };
            trcl_inv = Some(matrix.inverse());
        }

        Ok(Self {
            name: card.name.clone(),
            material_name,
            density: card.density,
            importance,
            trcl_inv,
            polynomial,
            equation: card.equation.clone(),
            contact_ids,
            params: card.params.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn material_name(&self) -> &str {
        &self.material_name
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn importance(&self) -> Option<f64> {
        self.importance
    }

    pub fn polynomial(&self) -> &LogicalPolynomial {
        &self.polynomial
    }

    /// Signed surface ids this cell touches.
    pub fn contact_ids(&self) -> &[i32] {
        &self.contact_ids
    }

    /// True when `p` satisfies the cell polynomial.
    ///
    /// A point `On` a surface counts as matching either sign, so a point
    /// exactly on a boundary is inside every cell touching that boundary.
    /// Callers resolve the ambiguity by stepping over by delta.
    pub fn inside(&self, surfaces: &SurfaceMap, p: &Point) -> bool {
        let q = match &self.trcl_inv {
            Some(m) => m.transform_point(p),
            None => *p,
        };
        self.polynomial.eval(&|id: i32| {
            let sign = surfaces.at(id.abs()).sign(&q);
            match sign {
                SurfaceSign::On => true,
                SurfaceSign::Front => id > 0,
                SurfaceSign::Back => id < 0,
            }
        })
    }

    /// Nearest forward intersection with any contact surface.
    ///
    /// Returns the set of (positive) surface ids that share the minimum
    /// parameter within eps, and the world-space intersection point.
    /// `None` when no contact surface lies ahead.
    pub fn next_intersections(
        &self,
        surfaces: &SurfaceMap,
        p: &Point,
        d: &Vector3,
    ) -> Option<(Vec<i32>, Point)> {
        let (q, dq) = match &self.trcl_inv {
            Some(m) => (m.transform_point(p), m.transform_direction(d)),
            None => (*p, *d),
        };
        next_intersections_on(surfaces, &self.contact_ids, &q, &dq)
            .map(|(ids, t)| (ids, *p + *d * t))
    }

    /// Canonical card text of this cell.
    pub fn to_final_input_string(&self) -> String {
        let mut out = format!("{} ", self.name);
        if self.material_name == VOID_MAT_NAME {
            out.push('0');
        } else {
            out.push_str(&format!("{} {}", self.material_name, self.density));
        }
        out.push(' ');
        out.push_str(&self.equation);
        for (k, v) in &self.params {
            out.push_str(&format!(" {}={}", k, v));
        }
        out
    }
}

/// Minimum forward intersection over a set of contact surfaces, as a ray
/// parameter. Shared by real cells and the undefined singleton.
fn next_intersections_on(
    surfaces: &SurfaceMap,
    contact_ids: &[i32],
    p: &Point,
    d: &Vector3,
) -> Option<(Vec<i32>, f64)> {
    use crate::core::math::EPS;

    let mut min_t = f64::INFINITY;
    let mut hit_ids: Vec<i32> = Vec::new();
    let mut seen: Vec<i32> = Vec::new();
    for id in contact_ids {
        let abs = id.abs();
        if seen.contains(&abs) {
            continue;
        }
        seen.push(abs);
        let ts = surfaces.at(abs).intersections(p, d);
        if let Some(&t) = ts.first() {
            if t < min_t - EPS {
                min_t = t;
                hit_ids.clear();
                hit_ids.push(abs);
            } else if (t - min_t).abs() <= EPS {
                hit_ids.push(abs);
            }
        }
    }
    if hit_ids.is_empty() {
        None
    } else {
        Some((hit_ids, min_t))
    }
}

/// All cells of a geometry plus the undefined-region singleton.
#[derive(Debug, Default, Clone)]
pub struct CellMap {
    cells: Vec<Cell>,
    index: HashMap<String, usize>,
    /// Contact surface ids of the undefined region; filled by
    /// [`init_undefined_cell`].
    undefined_contacts: Vec<i32>,
}

impl CellMap {
    /// Build all cells from the (macro-expanded) cell card section.
    pub fn from_cards(
        lines: &[DataLine],
        surfaces: &SurfaceMap,
        materials: &HashMap<String, String>,
        tr_map: &TrMap,
    ) -> Result<Self> {
        let mut map = CellMap::default();
        for dl in lines {
            let card = CellCard::from_string(&dl.data)
                .map_err(|e| GeometryError::invalid_at(&dl.pos(), e.to_string()))?;
            if map.index.contains_key(&card.name) {
                return Err(GeometryError::invalid_at(
                    &dl.pos(),
                    format!("duplicate cell name \"{}\"", card.name),
                ));
            }
            let cell = Cell::new(&card, surfaces, materials, tr_map)
                .map_err(|e| GeometryError::invalid_at(&dl.pos(), e.to_string()))?;
            map.index.insert(cell.name.clone(), map.cells.len());
            map.cells.push(cell);
        }
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Real cells with their indices, in construction order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Cell)> {
        self.cells.iter().enumerate()
    }

    pub fn get(&self, idx: usize) -> Option<&Cell> {
        if idx == UNDEFINED_INDEX {
            None
        } else {
            self.cells.get(idx)
        }
    }

    pub fn index_by_name(&self, name: &str) -> Option<usize> {
        if name == UNDEF_CELL_NAME {
            Some(UNDEFINED_INDEX)
        } else {
            self.index.get(name).copied()
        }
    }

    /// Region name of a cell index; the undefined singleton included.
    pub fn name(&self, idx: usize) -> &str {
        if idx == UNDEFINED_INDEX {
            UNDEF_CELL_NAME
        } else {
            self.cells[idx].name()
        }
    }

    /// Material name of a cell index; the undefined singleton included.
    pub fn material_name(&self, idx: usize) -> &str {
        if idx == UNDEFINED_INDEX {
            UNDEF_MAT_NAME
        } else {
            self.cells[idx].material_name()
        }
    }

    /// Inside test that understands the undefined singleton: a point is in
    /// the undefined region exactly when no user cell claims it.
    pub fn inside(&self, surfaces: &SurfaceMap, idx: usize, p: &Point) -> bool {
        if idx == UNDEFINED_INDEX {
            !self.cells.iter().any(|c| c.inside(surfaces, p))
        } else {
            self.cells[idx].inside(surfaces, p)
        }
    }

    /// Nearest forward intersection for the given cell, the undefined
    /// singleton included (it sees every surface of the map).
    pub fn next_intersections(
        &self,
        surfaces: &SurfaceMap,
        idx: usize,
        p: &Point,
        d: &Vector3,
    ) -> Option<(Vec<i32>, Point)> {
        if idx == UNDEFINED_INDEX {
            next_intersections_on(surfaces, &self.undefined_contacts, p, d)
                .map(|(ids, t)| (ids, *p + *d * t))
        } else {
            self.cells[idx].next_intersections(surfaces, p, d)
        }
    }
}

/// Linear scan for the first cell containing `p`; the undefined singleton
/// when none does.
///
/// In strict mode every cell is tested and multiple claims are logged as a
/// warning (double definition).
pub fn guess_cell(cells: &CellMap, surfaces: &SurfaceMap, p: &Point, strict: bool) -> usize {
    if strict {
        let claimers: Vec<usize> = cells
            .iter()
            .filter(|(_, c)| c.inside(surfaces, p))
            .map(|(i, _)| i)
            .collect();
        if claimers.len() > 1 {
            let names: Vec<&str> = claimers.iter().map(|&i| cells.name(i)).collect();
            log::warn!("point {} is claimed by multiple cells: {}", p, names.join(", "));
        }
        claimers.first().copied().unwrap_or(UNDEFINED_INDEX)
    } else {
        cells
            .iter()
            .find(|(_, c)| c.inside(surfaces, p))
            .map(|(i, _)| i)
            .unwrap_or(UNDEFINED_INDEX)
    }
}

/// Fill the surface contact lists from the cell polynomials.
///
/// A literal `s` registers the cell on the `sign(s)` side of surface `|s|`
/// and on the mirror side of the reverse copy, exactly once per cell.
pub fn update_adjacency(cells: &CellMap, surfaces: &mut SurfaceMap) {
    for (idx, cell) in cells.iter() {
        for &id in cell.contact_ids() {
            let abs = id.abs();
            if id > 0 {
                if let Some(s) = surfaces.get_mut(abs) {
                    s.contact_front.push(idx);
                }
                if let Some(s) = surfaces.get_mut(-abs) {
                    s.contact_back.push(idx);
                }
            } else {
                if let Some(s) = surfaces.get_mut(abs) {
                    s.contact_back.push(idx);
                }
                if let Some(s) = surfaces.get_mut(-abs) {
                    s.contact_front.push(idx);
                }
            }
        }
    }
}

/// Attach the undefined singleton to every surface on both sides, and give
/// it every surface as a contact so a walker can keep tracing through
/// uncovered regions.
pub fn init_undefined_cell(cells: &mut CellMap, surfaces: &mut SurfaceMap) {
    let ids = surfaces.front_ids();
    for &id in &ids {
        for signed in [id, -id] {
            if let Some(s) = surfaces.get_mut(signed) {
                s.contact_front.push(UNDEFINED_INDEX);
                s.contact_back.push(UNDEFINED_INDEX);
            }
        }
    }
    cells.undefined_contacts = ids;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::DataLine;
    use crate::core::math::same_point;

    fn build(surface_cards: &[&str], cell_cards: &[&str]) -> (SurfaceMap, CellMap) {
        let surf_lines: Vec<DataLine> = surface_cards
            .iter()
            .enumerate()
            .map(|(i, t)| DataLine::new("t", i + 1, *t))
            .collect();
        let cell_lines: Vec<DataLine> = cell_cards
            .iter()
            .enumerate()
            .map(|(i, t)| DataLine::new("t", 100 + i, *t))
            .collect();
        let mut smap = SurfaceMap::from_cards(&surf_lines, &TrMap::new()).unwrap();
        let mut cmap =
            CellMap::from_cards(&cell_lines, &smap, &HashMap::new(), &TrMap::new()).unwrap();
        update_adjacency(&cmap, &mut smap);
        init_undefined_cell(&mut cmap, &mut smap);
        (smap, cmap)
    }

    #[test]
    fn test_inside_sphere_cells() {
        let (smap, cmap) = build(
            &["s1 sph 0 0 0 10"],
            &["c1 0 -s1", "c99 0 s1"],
        );
        let inner = cmap.index_by_name("c1").unwrap();
        let outer = cmap.index_by_name("c99").unwrap();
        let center = Vector3::ZERO;
        let far = Vector3::new(50.0, 0.0, 0.0);
        assert!(cmap.inside(&smap, inner, &center));
        assert!(!cmap.inside(&smap, outer, &center));
        assert!(cmap.inside(&smap, outer, &far));
    }

    #[test]
    fn test_on_boundary_matches_both_sides() {
        let (smap, cmap) = build(&["s1 sph 0 0 0 10"], &["c1 0 -s1", "c99 0 s1"]);
        let on = Vector3::new(10.0, 0.0, 0.0);
        let inner = cmap.index_by_name("c1").unwrap();
        let outer = cmap.index_by_name("c99").unwrap();
        assert!(cmap.inside(&smap, inner, &on));
        assert!(cmap.inside(&smap, outer, &on));
    }

    #[test]
    fn test_next_intersections() {
        let (smap, cmap) = build(&["s1 sph 0 0 0 10"], &["c1 0 -s1", "c99 0 s1"]);
        let inner = cmap.index_by_name("c1").unwrap();
        let (ids, p) = cmap
            .next_intersections(&smap, inner, &Vector3::ZERO, &Vector3::new(1.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(ids, vec![1]);
        assert!(same_point(&p, &Vector3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_adjacency_registration() {
        let (smap, cmap) = build(&["s1 sph 0 0 0 10"], &["c1 0 -s1", "c99 0 s1"]);
        let inner = cmap.index_by_name("c1").unwrap();
        let outer = cmap.index_by_name("c99").unwrap();
        let front = smap.at(1).contact_cells_front();
        let back = smap.at(1).contact_cells_back();
        // c99 (literal +s1) on the front, c1 (literal -s1) on the back,
        // the undefined singleton appended to both.
        assert_eq!(front, &[outer, UNDEFINED_INDEX]);
        assert_eq!(back, &[inner, UNDEFINED_INDEX]);
        // The reverse copy mirrors the sides.
        assert_eq!(smap.at(-1).contact_cells_front(), &[inner, UNDEFINED_INDEX]);
    }

    #[test]
    fn test_guess_cell() {
        let (smap, cmap) = build(&["s1 sph 0 0 0 10"], &["c1 0 -s1"]);
        let inner = cmap.index_by_name("c1").unwrap();
        assert_eq!(guess_cell(&cmap, &smap, &Vector3::ZERO, false), inner);
        assert_eq!(
            guess_cell(&cmap, &smap, &Vector3::new(50.0, 0.0, 0.0), false),
            UNDEFINED_INDEX
        );
    }

    #[test]
    fn test_undefined_region_traces_through() {
        let (smap, cmap) = build(&["s1 sph 0 0 0 10"], &["c1 0 -s1"]);
        // From outside the sphere, the undefined region still sees s1.
        let (ids, p) = cmap
            .next_intersections(
                &smap,
                UNDEFINED_INDEX,
                &Vector3::new(-50.0, 0.0, 0.0),
                &Vector3::new(1.0, 0.0, 0.0),
            )
            .unwrap();
        assert_eq!(ids, vec![1]);
        assert!(same_point(&p, &Vector3::new(-10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_undefined_inside() {
        let (smap, cmap) = build(&["s1 sph 0 0 0 10"], &["c1 0 -s1"]);
        assert!(!cmap.inside(&smap, UNDEFINED_INDEX, &Vector3::ZERO));
        assert!(cmap.inside(&smap, UNDEFINED_INDEX, &Vector3::new(50.0, 0.0, 0.0)));
    }

    #[test]
    fn test_material_name_resolution() {
        let surf = vec![DataLine::new("t", 1, "s1 sph 0 0 0 10")];
        let smap = SurfaceMap::from_cards(&surf, &TrMap::new()).unwrap();
        let mut materials = HashMap::new();
        materials.insert("1".to_string(), "water".to_string());
        let cells = vec![
            DataLine::new("t", 2, "c1 1 -1.0 -s1"),
            DataLine::new("t", 3, "c2 2 -7.8 s1"),
        ];
        let cmap = CellMap::from_cards(&cells, &smap, &materials, &TrMap::new()).unwrap();
        assert_eq!(cmap.get(0).unwrap().material_name(), "water");
        assert_eq!(cmap.get(1).unwrap().material_name(), "m2");
    }

    #[test]
    fn test_trcl_by_number() {
        let surf = vec![DataLine::new("t", 1, "s1 sph 0 0 0 10")];
        let smap = SurfaceMap::from_cards(&surf, &TrMap::new()).unwrap();
        let mut tr_map = TrMap::new();
        tr_map.insert(4, Matrix4::from_translation(Vector3::new(100.0, 0.0, 0.0)));
        let cells = vec![DataLine::new("t", 2, "c1 0 -s1 trcl=4")];
        let cmap = CellMap::from_cards(&cells, &smap, &HashMap::new(), &tr_map).unwrap();
        let cell = cmap.get(0).unwrap();
        // The cell is the sphere shifted to x = 100.
        assert!(cell.inside(&smap, &Vector3::new(100.0, 0.0, 0.0)));
        assert!(!cell.inside(&smap, &Vector3::ZERO));
    }

    #[test]
    fn test_trcl_inline() {
        let surf = vec![DataLine::new("t", 1, "s1 sph 0 0 0 10")];
        let smap = SurfaceMap::from_cards(&surf, &TrMap::new()).unwrap();
        let cells = vec![DataLine::new("t", 2, "c1 0 -s1 trcl=(0 50 0)")];
        let cmap = CellMap::from_cards(&cells, &smap, &HashMap::new(), &TrMap::new()).unwrap();
        let cell = cmap.get(0).unwrap();
        assert!(cell.inside(&smap, &Vector3::new(0.0, 50.0, 0.0)));
        assert!(!cell.inside(&smap, &Vector3::ZERO));
    }

    #[test]
    fn test_unknown_surface_in_polynomial() {
        let surf = vec![DataLine::new("t", 1, "s1 sph 0 0 0 10")];
        let smap = SurfaceMap::from_cards(&surf, &TrMap::new()).unwrap();
        let cells = vec![DataLine::new("t", 2, "c1 0 -s7")];
        let err = CellMap::from_cards(&cells, &smap, &HashMap::new(), &TrMap::new());
        assert!(err.is_err());
        assert!(err.unwrap_err().to_string().contains("t:2"));
    }

    #[test]
    fn test_final_input_string_roundtrip() {
        let (smap, cmap) = build(&["s1 sph 0 0 0 10"], &["c1 0 -s1", "c99 0 s1"]);
        let text = cmap.get(0).unwrap().to_final_input_string();
        let card = CellCard::from_string(&text).unwrap();
        let reparsed = Cell::new(&card, &smap, &HashMap::new(), &TrMap::new()).unwrap();
        assert_eq!(reparsed.name(), "c1");
        assert_eq!(reparsed.polynomial(), cmap.get(0).unwrap().polynomial());
    }
}
