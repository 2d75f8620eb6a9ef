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

//! Cell picking
//!
//! Projects a screen point onto the camera near plane and walks the
//! pick ray cell to cell until a displayed cell in the un-cut region is
//! found. Auxiliary clipping planes can hide the near side of the world;
//! a hit on the cut side skips ahead to the farthest aux-plane
//! intersection and resumes from there.

use std::collections::HashSet;

use crate::core::geometry::Geometry;
use crate::core::math::{to_radians, Point, Vector3, EPS};

/// One auxiliary clipping plane.
#[derive(Debug, Clone, Copy)]
pub struct PlaneInfo {
    /// Unit normal of the plane.
    pub normal: Vector3,
    /// Signed offset along the normal.
    pub pos: f64,
    /// Whether the plane participates at all.
    pub visible: bool,
    /// Cut side: positive hides the normal side, negative the other,
    /// zero cuts nothing.
    pub cutting: f64,
}

impl PlaneInfo {
    /// A disabled plane.
    pub fn inactive() -> Self {
        Self {
            normal: Vector3::new(0.0, 0.0, 1.0),
            pos: 0.0,
            visible: false,
            cutting: 0.0,
        }
    }
}

/// Perspective camera description for picking.
#[derive(Debug, Clone, Copy)]
pub struct CameraView {
    /// Camera position in world space.
    pub position: Point,
    /// View-up vector.
    pub view_up: Vector3,
    /// Normal of the view plane, pointing from focal point towards the
    /// camera.
    pub plane_normal: Vector3,
    /// Full vertical view angle in degrees.
    pub view_angle_deg: f64,
    /// Near clipping distance.
    pub near_clip: f64,
    /// Viewport size in pixels (width, height).
    pub viewport: (u32, u32),
}

impl CameraView {
    /// World-space point on the near plane under the given widget
    /// coordinate (origin top-left), plus the pick-ray direction.
    pub fn pick_ray(&self, screen: (i32, i32)) -> (Point, Vector3) {
        let (width, height) = (self.viewport.0 as f64, self.viewport.1 as f64);
        let aspect = width / height;
        // Widget coordinates to a centred frame with +v up.
        let hpos = screen.0 as f64 - 0.5 * width;
        let vpos = -(screen.1 as f64 - 0.5 * height);

        let normal = self.plane_normal.normalized();
        let vvec = self.view_up.normalized();
        let hvec = (-normal).cross(&self.view_up).normalized();

        let near_center = self.position - self.near_clip * normal;
        let near_height = 2.0 * self.near_clip * to_radians(0.5 * self.view_angle_deg).tan();

        let p = near_center
            + (hpos * aspect * near_height / width) * hvec
            + (vpos * near_height / height) * vvec;
        ((p), (p - self.position).normalized())
    }
}

/// True when `pt` is on the visible side of every active cutting plane.
fn is_visible_point(pt: &Point, planes: &[PlaneInfo]) -> bool {
    planes.iter().filter(|pl| pl.visible).all(|pl| {
        let d = (*pt - pl.pos * pl.normal).dot(&pl.normal);
        d * pl.cutting <= 0.0
    })
}

/// Farthest forward intersection of the ray with any active cutting
/// plane; the candidate re-entry point into the visible region.
fn farthest_aux_intersection(
    pt: &Point,
    dir: &Vector3,
    planes: &[PlaneInfo],
) -> Option<Point> {
    let mut best: Option<f64> = None;
    for pl in planes.iter().filter(|pl| pl.visible && pl.cutting != 0.0) {
        let denom = pl.normal.dot(dir);
        if denom.abs() < EPS {
            continue;
        }
        let t = (pl.pos - pl.normal.dot(pt)) / denom;
        if t > EPS && best.map_or(true, |b| t > b) {
            best = Some(t);
        }
    }
    best.map(|t| *pt + *dir * t)
}

/// The first visible cell under a screen point.
///
/// `displayed` restricts the pick to currently shown cells; `None` means
/// everything is shown. Returns `None` when the pick ray leaves the
/// geometry without a visible hit.
pub fn get_picked_cell(
    geometry: &Geometry,
    camera: &CameraView,
    screen: (i32, i32),
    displayed: Option<&HashSet<String>>,
    planes: &[PlaneInfo],
) -> Option<usize> {
    let (mut p, dir) = camera.pick_ray(screen);

    let is_displayed = |idx: usize| -> bool {
        match displayed {
            Some(set) => set.contains(geometry.cell_name(idx)),
            None => !Geometry::is_undefined(idx),
        }
    };

    let mut cell: Option<usize> = None;
    loop {
        cell = geometry.next_cell(cell, &dir, &mut p);
        let idx = cell?;
        if !is_displayed(idx) {
            continue;
        }
        if is_visible_point(&p, planes) {
            return Some(idx);
        }
        // Cut away here: try to resume past the farthest clipping plane.
        if let Some(beyond) = farthest_aux_intersection(&p, &dir, planes) {
            let guessed = geometry.find_cell(&beyond, false);
            if !Geometry::is_undefined(guessed) && is_displayed(guessed) {
                return Some(guessed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::{DataLine, TrMap};
    use std::collections::HashMap;

    fn lines(texts: &[&str]) -> Vec<DataLine> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| DataLine::new("t", i + 1, *t))
            .collect()
    }

    fn sphere_world() -> Geometry {
        Geometry::new(
            TrMap::new(),
            lines(&["s1 sph 0 0 0 20"]),
            lines(&["c1 0 -s1", "c99 0 s1"]),
            &HashMap::new(),
            false,
        )
        .unwrap()
    }

    fn camera_on_x() -> CameraView {
        CameraView {
            position: Point::new(100.0, 0.0, 0.0),
            view_up: Vector3::new(0.0, 0.0, 1.0),
            plane_normal: Vector3::new(1.0, 0.0, 0.0),
            view_angle_deg: 30.0,
            near_clip: 10.0,
            viewport: (400, 400),
        }
    }

    #[test]
    fn test_center_pick_hits_sphere() {
        let g = sphere_world();
        let idx = get_picked_cell(
            &g,
            &camera_on_x(),
            (200, 200),
            None,
            &[PlaneInfo::inactive(); 3],
        )
        .unwrap();
        assert_eq!(g.cell_name(idx), "c1");
    }

    #[test]
    fn test_pick_skips_hidden_cells() {
        let g = sphere_world();
        let mut displayed = HashSet::new();
        displayed.insert("c99".to_string());
        // Only the outer cell is shown; the pick passes through the
        // hidden sphere and lands in c99 on the far side.
        let idx = get_picked_cell(
            &g,
            &camera_on_x(),
            (200, 200),
            Some(&displayed),
            &[PlaneInfo::inactive(); 3],
        )
        .unwrap();
        assert_eq!(g.cell_name(idx), "c99");
    }

    #[test]
    fn test_cutting_plane_skips_near_side() {
        let g = sphere_world();
        // Cut away x > 0: the camera-side half of the sphere.
        let planes = [
            PlaneInfo {
                normal: Vector3::new(1.0, 0.0, 0.0),
                pos: 0.0,
                visible: true,
                cutting: 1.0,
            },
            PlaneInfo::inactive(),
            PlaneInfo::inactive(),
        ];
        let idx = get_picked_cell(&g, &camera_on_x(), (200, 200), None, &planes).unwrap();
        // Still the sphere, entered on the far side of the cut.
        assert_eq!(g.cell_name(idx), "c1");
    }

    #[test]
    fn test_pick_ray_direction() {
        let cam = camera_on_x();
        let (p, dir) = cam.pick_ray((200, 200));
        // The centre pick looks straight down the view axis.
        assert!((dir.x + 1.0).abs() < 1e-9);
        assert!(dir.y.abs() < 1e-9);
        assert!((p.x - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_miss_returns_none() {
        let g = sphere_world();
        // c99 is infinite, so hide it and aim far off axis; after the
        // sphere is missed nothing displayed remains.
        let mut displayed = HashSet::new();
        displayed.insert("c1".to_string());
        let idx = get_picked_cell(
            &g,
            &camera_on_x(),
            (0, 0),
            Some(&displayed),
            &[PlaneInfo::inactive(); 3],
        );
        assert!(idx.is_none());
    }
}
