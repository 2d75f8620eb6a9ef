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

//! Indexed bitmap with its palette
//!
//! The rendered sectional image: a pixel array, the palette it indexes
//! into and the physical extent in cm. Exports to XPM; an empty bitmap
//! signals a cancelled render.

use std::path::Path;

use crate::core::error::Result;

use super::{CellColorPalette, Color, PixelArray, TracingRayData, XpmColor, NOT_INDEX};

/// Sweep direction of a ray set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayDir {
    Horizontal,
    Vertical,
}

/// A rendered sectional image.
#[derive(Debug, Default, Clone)]
pub struct BitmapImage {
    width_cm: f64,
    height_cm: f64,
    pixels: PixelArray,
    palette: CellColorPalette,
}

impl BitmapImage {
    /// The empty bitmap; renders report it on cancellation.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Render one sweep of traced rays.
    ///
    /// The palette must be populated beforehand; a bitmap cannot invent
    /// colors.
    pub fn from_rays(
        dir: RayDir,
        h_reso: usize,
        v_reso: usize,
        width_cm: f64,
        height_cm: f64,
        rays: &[TracingRayData],
        palette: &CellColorPalette,
    ) -> Self {
        assert!(!palette.is_empty(), "no color palette defined");
        let pixels = PixelArray::render_from_rays(
            dir, h_reso, v_reso, width_cm, height_cm, rays, palette,
        );
        Self {
            width_cm,
            height_cm,
            pixels,
            palette: palette.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn h_resolution(&self) -> usize {
        self.pixels.horizontal_size()
    }

    pub fn v_resolution(&self) -> usize {
        self.pixels.vertical_size()
    }

    pub fn width_cm(&self) -> f64 {
        self.width_cm
    }

    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }

    pub fn palette(&self) -> &CellColorPalette {
        &self.palette
    }

    pub fn pixel_array(&self) -> &PixelArray {
        &self.pixels
    }

    /// Merge two sweeps of the same section.
    ///
    /// Where the sweeps disagree, the regions named in `prior_regions`
    /// win (the established scan order applies); any other disagreement
    /// becomes `conflicted_region`. Size or extent mismatches are logged
    /// and the merge proceeds over the first image's geometry.
    pub fn merge(
        img1: &BitmapImage,
        img2: &BitmapImage,
        prior_regions: &[&str],
        conflicted_region: &str,
    ) -> BitmapImage {
        if img1.h_resolution() != img2.h_resolution()
            || img1.v_resolution() != img2.v_resolution()
        {
            log::warn!(
                "merging bitmaps with different resolutions: ({}, {}) vs ({}, {})",
                img1.h_resolution(),
                img1.v_resolution(),
                img2.h_resolution(),
                img2.v_resolution()
            );
            return img1.clone();
        }
        if (img1.width_cm - img2.width_cm).abs() > 1e-6
            || (img1.height_cm - img2.height_cm).abs() > 1e-6
        {
            log::warn!(
                "merging bitmaps with different extents: ({}, {}) vs ({}, {}) cm",
                img1.width_cm,
                img1.height_cm,
                img2.width_cm,
                img2.height_cm
            );
        }
        if img1.palette.is_empty() || img2.palette.is_empty() {
            log::warn!("merging bitmaps with an empty palette");
        }

        let prior: Vec<i32> = prior_regions
            .iter()
            .map(|name| img1.palette.index_by_cell_name(name))
            .collect();
        let conflicted = img1.palette.index_by_cell_name(conflicted_region);
        BitmapImage {
            width_cm: img1.width_cm,
            height_cm: img1.height_cm,
            pixels: PixelArray::merge(&img1.pixels, &img2.pixels, &prior, conflicted),
            palette: img1.palette.clone(),
        }
    }

    pub fn flip_horizontally(img: &BitmapImage) -> BitmapImage {
        BitmapImage {
            width_cm: img.width_cm,
            height_cm: img.height_cm,
            pixels: PixelArray::h_flip(&img.pixels),
            palette: img.palette.clone(),
        }
    }

    pub fn flip_vertically(img: &BitmapImage) -> BitmapImage {
        BitmapImage {
            width_cm: img.width_cm,
            height_cm: img.height_cm,
            pixels: PixelArray::v_flip(&img.pixels),
            palette: img.palette.clone(),
        }
    }

    /// Side-by-side concatenation; vertical geometry must match.
    pub fn concat_horizontally(img1: &BitmapImage, img2: &BitmapImage) -> Result<BitmapImage> {
        use crate::core::error::GeometryError;
        if img1.v_resolution() != img2.v_resolution() {
            return Err(GeometryError::InvalidArgument(format!(
                "vertical resolutions differ: {} vs {}",
                img1.v_resolution(),
                img2.v_resolution()
            )));
        }
        if (img1.height_cm - img2.height_cm).abs() > 1e-6 {
            return Err(GeometryError::InvalidArgument(format!(
                "vertical sizes differ: {} vs {} cm",
                img1.height_cm, img2.height_cm
            )));
        }
        Ok(BitmapImage {
            width_cm: img1.width_cm + img2.width_cm,
            height_cm: img1.height_cm,
            pixels: PixelArray::h_concat(&img1.pixels, &img2.pixels),
            palette: img1.palette.clone(),
        })
    }

    /// Stacked concatenation; horizontal geometry must match.
    pub fn concat_vertically(img1: &BitmapImage, img2: &BitmapImage) -> Result<BitmapImage> {
        use crate::core::error::GeometryError;
        if img1.h_resolution() != img2.h_resolution() {
            return Err(GeometryError::InvalidArgument(format!(
                "horizontal resolutions differ: {} vs {}",
                img1.h_resolution(),
                img2.h_resolution()
            )));
        }
        if (img1.width_cm - img2.width_cm).abs() > 1e-6 {
            return Err(GeometryError::InvalidArgument(format!(
                "horizontal sizes differ: {} vs {} cm",
                img1.width_cm, img2.width_cm
            )));
        }
        Ok(BitmapImage {
            width_cm: img1.width_cm,
            height_cm: img1.height_cm + img2.height_cm,
            pixels: PixelArray::v_concat(&img1.pixels, &img2.pixels),
            palette: img1.palette.clone(),
        })
    }

    /// Fatten the pixels of a region by `width - 1`.
    pub fn expand_region(&mut self, width: usize, region_name: &str) {
        if width <= 1 {
            return;
        }
        let index = self.palette.index_by_cell_name(region_name);
        if index == NOT_INDEX {
            return;
        }
        self.pixels.expand_pixel(index, width - 1);
    }

    /// Paint the 4-neighbourhood outline of every `target` pixel with
    /// `edge`.
    pub fn draw_edge(&mut self, target: i32, edge: i32) {
        let hsize = self.h_resolution();
        let vsize = self.v_resolution();
        let source = self.pixels.clone();
        for y in 0..vsize {
            for x in 0..hsize {
                if source.get(x, y) != target {
                    continue;
                }
                if x > 1 && source.get(x - 1, y) != target {
                    self.pixels.set(x - 1, y, edge);
                }
                if x + 1 < hsize && source.get(x + 1, y) != target {
                    self.pixels.set(x + 1, y, edge);
                }
                if y > 1 && source.get(x, y - 1) != target {
                    self.pixels.set(x, y - 1, edge);
                }
                if y + 1 < vsize && source.get(x, y + 1) != target {
                    self.pixels.set(x, y + 1, edge);
                }
            }
        }
    }

    /// Draw a square marker, filled or outlined. Same-colored markers
    /// share one palette entry so repeated picks cannot exhaust the XPM
    /// alphabet.
    pub fn draw_square_mark(&mut self, x: i32, y: i32, size: i32, color: &Color, filled: bool) {
        if size == 0 || !self.check_inside(x, y) {
            return;
        }
        let index = self.mark_color_index("squareMark", color);
        let x0 = (x - size).max(0) as usize;
        let y0 = (y - size).max(0) as usize;
        let x1 = ((x + size) as usize).min(self.h_resolution());
        let y1 = ((y + size) as usize).min(self.v_resolution());
        for xx in x0..x1 {
            for yy in y0..y1 {
                if filled || xx == x0 || xx == x1 - 1 || yy == y0 || yy == y1 - 1 {
                    self.pixels.set(xx, yy, index);
                }
            }
        }
    }

    /// Draw a cross marker centred at `(x, y)`.
    pub fn draw_cross_mark(&mut self, x: i32, y: i32, size: i32, color: &Color) {
        if size == 0 || !self.check_inside(x, y) {
            return;
        }
        let index = self.mark_color_index("crossMark", color);
        let lw = (size as f64 * 0.2) as i32;
        let hsize = self.h_resolution() as i32;
        let vsize = self.v_resolution() as i32;
        for xx in (x - size).max(0)..(x + size).min(hsize - 1) {
            for dy in -lw..=lw {
                let yy = y + dy;
                if yy > 0 && yy < vsize - 1 {
                    self.pixels.set(xx as usize, yy as usize, index);
                }
            }
        }
        for yy in (y - size).max(0)..(y + size).min(vsize - 1) {
            for dx in -lw..=lw {
                let xx = x + dx;
                if xx > 0 && xx < hsize - 1 {
                    self.pixels.set(xx as usize, yy as usize, index);
                }
            }
        }
    }

    /// Cross and square outline combined.
    pub fn draw_square_cross_mark(&mut self, x: i32, y: i32, size: i32, color: &Color) {
        self.draw_cross_mark(x, y, size, color);
        self.draw_square_mark(x, y, size, color, false);
    }

    fn mark_color_index(&mut self, mark_kind: &str, color: &Color) -> i32 {
        let existing = self.palette.index_by_color(color);
        if existing != NOT_INDEX {
            return existing;
        }
        let mark_name = format!("{}{}", mark_kind, self.palette.len());
        self.palette
            .register_color(&mark_name, &mark_name, *color)
            .expect("fresh mark name cannot conflict");
        self.palette.index_by_color(color)
    }

    fn check_inside(&self, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && (x as usize) <= self.h_resolution()
            && (y as usize) <= self.v_resolution()
    }

    /// The XPM body: header line, color table and pixel rows.
    pub fn to_xpm_string(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut out = format!(
            "\"{} {} {} 1\",\n",
            self.h_resolution(),
            self.v_resolution(),
            self.palette.len()
        );

        let name_width = self
            .palette
            .materials()
            .iter()
            .map(|m| m.mat_name().len())
            .max()
            .unwrap_or(0);

        let max_colors = XpmColor::max_color_number();
        for (i, mat) in self.palette.materials().iter().enumerate() {
            if i >= max_colors {
                log::warn!(
                    "number of colors exceeds the XPM alphabet ({}); symbols are reused",
                    max_colors
                );
            }
            let color = mat.color();
            let color_text = if color.a <= 0.0 {
                // Transparency in XPM is the special color "none".
                "none".to_string()
            } else {
                color.to_rgb_string()
            };
            out.push_str(&format!(
                "\"{} s {:<width$} c {}\",\n",
                XpmColor::color_char(i),
                mat.mat_name(),
                color_text,
                width = name_width + 1
            ));
        }

        out.push_str(&self.pixels.to_xpm_rows(|v| XpmColor::color_char(v.max(0) as usize)));
        out
    }

    /// Write the full XPM file.
    pub fn export_to_xpm_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let body = self.to_xpm_string();
        let content = format!(
            "/* XPM */\nstatic char * section_xpm[] = {{\n/* width height ncolors chars_per_pixel */\n{}}};\n",
            body
        );
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::Vector3;

    const UNDEF: &str = "*C_u";
    const UBOUND: &str = "*C_ub";
    const BOUND: &str = "*C_b";

    fn palette() -> CellColorPalette {
        let mut p = CellColorPalette::new();
        for (i, (cell, mat)) in [
            ("C1", "m1"),
            (UNDEF, "void"),
            ("C2", "m2"),
            ("C3", "m3"),
            ("C99", "m99"),
            (UBOUND, "ub"),
            (BOUND, "b"),
            ("*C_d", "d"),
        ]
        .iter()
        .enumerate()
        {
            p.register_color(cell, mat, Color::default_color(i)).unwrap();
        }
        p
    }

    fn ray(i: usize) -> TracingRayData {
        let cells: Vec<String> = ["C1", UNDEF, "C2", "C3", UNDEF]
            .iter()
            .map(|s| s.to_string())
            .collect();
        TracingRayData::new(
            Vector3::ZERO,
            i,
            &cells,
            &[10.0, 10.0, 30.0, 20.0, 30.0],
            UNDEF,
            UBOUND,
            BOUND,
        )
    }

    fn bitmap(dir: RayDir, n: usize, h: usize, v: usize) -> BitmapImage {
        let rays: Vec<TracingRayData> = (0..n).map(ray).collect();
        BitmapImage::from_rays(dir, h, v, 100.0, 100.0, &rays, &palette())
    }

    #[test]
    fn test_horizontal_rendering() {
        let img = bitmap(RayDir::Horizontal, 50, 100, 50);
        assert_eq!(img.h_resolution(), 100);
        assert_eq!(img.v_resolution(), 50);
        // Left edge of every row is C1 (pixel centre 0.5 cm).
        let c1 = img.palette().index_by_cell_name("C1");
        assert_eq!(img.pixel_array().get(0, 0), c1);
        assert_eq!(img.pixel_array().get(0, 49), c1);
    }

    #[test]
    fn test_vertical_rendering_flips_y() {
        let img = bitmap(RayDir::Vertical, 100, 100, 50);
        // Ray position 0 is the bottom of the image: last pixel row.
        let c1 = img.palette().index_by_cell_name("C1");
        assert_eq!(img.pixel_array().get(0, 49), c1);
    }

    #[test]
    fn test_merge_prefers_boundary_then_conflict() {
        let h = bitmap(RayDir::Horizontal, 4, 4, 4);
        let v = bitmap(RayDir::Vertical, 4, 4, 4);
        let merged = BitmapImage::merge(&h, &v, &[UBOUND, BOUND], "*C_d");
        assert_eq!(merged.h_resolution(), 4);
        // Idempotent on identical inputs.
        let same = BitmapImage::merge(&h, &h, &[UBOUND, BOUND], "*C_d");
        assert_eq!(same.pixel_array(), h.pixel_array());
    }

    #[test]
    fn test_xpm_header_and_transparency() {
        let mut p = CellColorPalette::new();
        p.register_color("u", "*M_undef*", Color::new(255, 255, 255, 0.0))
            .unwrap();
        p.register_color("c", "m1", Color::new(0, 128, 255, 1.0)).unwrap();
        p.register_color(BOUND, "*M_bound*", Color::new(0, 0, 0, 1.0)).unwrap();
        let rays = vec![TracingRayData::new(
            Vector3::ZERO,
            0,
            &["u".to_string(), "c".to_string()],
            &[5.0, 5.0],
            UNDEF,
            UBOUND,
            BOUND,
        )];
        let img = BitmapImage::from_rays(RayDir::Horizontal, 2, 1, 10.0, 10.0, &rays, &p);
        let xpm = img.to_xpm_string();
        assert!(xpm.starts_with("\"2 1 3 1\","), "{}", xpm);
        assert!(xpm.contains("c none"), "{}", xpm);
        assert!(xpm.contains("c #0080ff"), "{}", xpm);
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.xpm");
        let img = bitmap(RayDir::Horizontal, 4, 4, 4);
        img.export_to_xpm_file(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("/* XPM */"));
        assert!(content.ends_with("};\n"));
    }

    #[test]
    fn test_empty_bitmap_signals_cancellation() {
        let img = BitmapImage::empty();
        assert!(img.is_empty());
        assert_eq!(img.to_xpm_string(), "");
    }

    #[test]
    fn test_draw_edge() {
        let mut img = bitmap(RayDir::Horizontal, 4, 4, 4);
        let target = img.palette().index_by_cell_name("C2");
        let edge = img.palette().index_by_cell_name(BOUND);
        img.draw_edge(target, edge);
        // Any C2 pixel must now have an edge-colored neighbour somewhere.
        let mut found_edge = false;
        for x in 0..4 {
            for y in 0..4 {
                if img.pixel_array().get(x, y) == edge {
                    found_edge = true;
                }
            }
        }
        assert!(found_edge);
    }
}
