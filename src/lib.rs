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

//! raycell: a CSG geometry core for Monte-Carlo transport decks
//!
//! This crate reads the cleaned card lists of a PHITS/MCNP-family input deck,
//! builds a constructive-solid-geometry world of cells bounded by quadric and
//! toroidal surfaces, and renders cross-sectional raster images of that world
//! by walking rays cell-to-cell through the CSG.
//!
//! # Architecture
//!
//! - [`core::math`]: vectors, affine transforms, polynomial root finding
//! - [`core::input`]: cleaned card records and the surface/cell/TR grammars
//! - [`core::geometry`]: surfaces, cells, macro-body expansion, the facade
//! - [`core::tracing`]: the deterministic cell-to-cell walker
//! - [`core::image`]: palettes, pixel arrays and XPM bitmaps
//! - [`core::render`]: the parallel scan-line renderer and cell picking
//!
//! # Example
//!
//! ```no_run
//! use raycell::core::geometry::Geometry;
//! use raycell::core::input::DataLine;
//! use raycell::core::math::Vector3;
//! use std::collections::HashMap;
//!
//! let surfaces = vec![DataLine::new("deck", 1, "s1 sph 0 0 0 20")];
//! let cells = vec![
//!     DataLine::new("deck", 2, "c1 0 -s1"),
//!     DataLine::new("deck", 3, "c99 0 s1"),
//! ];
//! let geometry = Geometry::new(HashMap::new(), surfaces, cells, &HashMap::new(), false)?;
//! let image = geometry.sectional_image(
//!     Vector3::new(-100.0, -100.0, 0.0),
//!     Vector3::new(200.0, 0.0, 0.0),
//!     Vector3::new(0.0, 200.0, 0.0),
//!     200, 200, 0, false, true, None,
//! );
//! image.export_to_xpm_file("section.xpm")?;
//! # Ok::<(), raycell::GeometryError>(())
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`core::error::Result<T>`] which is an alias
//! for `Result<T, GeometryError>`.

pub mod core;

// Re-export commonly used types
pub use crate::core::error::{GeometryError, Result};
