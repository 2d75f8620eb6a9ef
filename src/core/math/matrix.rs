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

//! 4x4 affine transform
//!
//! Rotation 3x3 plus a translation column. Surfaces and cells reference
//! these through the TR map; points are transformed with the full affine
//! map, direction vectors with the rotation part only.

use super::{Vector3, EPS};

/// A 4x4 affine matrix: `world = rot * local + trans`.
///
/// Only rigid transforms (orthonormal rotation) are produced by TR cards,
/// which keeps the inverse cheap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    /// Rotation rows.
    rot: [[f64; 3]; 3],
    /// Translation.
    trans: Vector3,
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix4 {
    pub fn identity() -> Self {
        Self {
            rot: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            trans: Vector3::ZERO,
        }
    }

    /// Build from a translation and nine rotation entries in row order.
    pub fn from_parts(trans: Vector3, rot: [f64; 9]) -> Self {
        Self {
            rot: [
                [rot[0], rot[1], rot[2]],
                [rot[3], rot[4], rot[5]],
                [rot[6], rot[7], rot[8]],
            ],
            trans,
        }
    }

    /// Pure translation.
    pub fn from_translation(trans: Vector3) -> Self {
        Self { rot: Self::identity().rot, trans }
    }

    /// Rotation of `angle_deg` degrees about a coordinate axis
    /// (0 = x, 1 = y, 2 = z).
    pub fn from_axis_rotation_deg(axis: usize, angle_deg: f64) -> Self {
        let a = super::to_radians(angle_deg);
        let (s, c) = a.sin_cos();
        let rot = match axis {
            0 => [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]],
            1 => [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]],
            2 => [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
            _ => panic!("axis index out of range: {}", axis),
        };
        Self { rot, trans: Vector3::ZERO }
    }

    /// Composition: `(self * other)(p) == self(other(p))`.
    pub fn multiply(&self, other: &Matrix4) -> Matrix4 {
        let mut rot = [[0.0; 3]; 3];
        for (i, row) in rot.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = (0..3).map(|k| self.rot[i][k] * other.rot[k][j]).sum();
            }
        }
        Matrix4 {
            rot,
            trans: self.transform_point(&other.trans),
        }
    }

    /// Apply the full affine map to a point.
    pub fn transform_point(&self, p: &Vector3) -> Vector3 {
        Vector3::new(
            self.rot[0][0] * p.x + self.rot[0][1] * p.y + self.rot[0][2] * p.z + self.trans.x,
            self.rot[1][0] * p.x + self.rot[1][1] * p.y + self.rot[1][2] * p.z + self.trans.y,
            self.rot[2][0] * p.x + self.rot[2][1] * p.y + self.rot[2][2] * p.z + self.trans.z,
        )
    }

    /// Apply only the rotation part to a direction vector.
    pub fn transform_direction(&self, d: &Vector3) -> Vector3 {
        Vector3::new(
            self.rot[0][0] * d.x + self.rot[0][1] * d.y + self.rot[0][2] * d.z,
            self.rot[1][0] * d.x + self.rot[1][1] * d.y + self.rot[1][2] * d.z,
            self.rot[2][0] * d.x + self.rot[2][1] * d.y + self.rot[2][2] * d.z,
        )
    }

    /// Inverse of a rigid transform: transposed rotation, negated
    /// back-rotated translation.
    pub fn inverse(&self) -> Matrix4 {
        let mut rot = [[0.0; 3]; 3];
        for (i, row) in rot.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = self.rot[j][i];
            }
        }
        let inv = Matrix4 { rot, trans: Vector3::ZERO };
        let trans = -inv.transform_direction(&self.trans);
        Matrix4 { rot, trans }
    }

    /// True for the identity within [`EPS`].
    pub fn is_identity(&self) -> bool {
        let id = Matrix4::identity();
        self.trans.norm() < EPS
            && self
                .rot
                .iter()
                .zip(id.rot.iter())
                .all(|(a, b)| a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < EPS))
    }

    pub fn translation(&self) -> Vector3 {
        self.trans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::same_point;

    #[test]
    fn test_identity_roundtrip() {
        let m = Matrix4::identity();
        let p = Vector3::new(1.0, -2.0, 3.0);
        assert_eq!(m.transform_point(&p), p);
        assert!(m.is_identity());
    }

    #[test]
    fn test_rotation_about_z() {
        let m = Matrix4::from_axis_rotation_deg(2, 90.0);
        let p = m.transform_point(&Vector3::new(1.0, 0.0, 0.0));
        assert!(same_point(&p, &Vector3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_composition_order() {
        // Translate then rotate: rotate(translate(p)).
        let t = Matrix4::from_translation(Vector3::new(5.0, 0.0, 0.0));
        let r = Matrix4::from_axis_rotation_deg(2, 90.0);
        let m = r.multiply(&t);
        let p = m.transform_point(&Vector3::new(0.0, 0.0, 0.0));
        assert!(same_point(&p, &Vector3::new(0.0, 5.0, 0.0)));
    }

    #[test]
    fn test_inverse() {
        let t = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
        let r = Matrix4::from_axis_rotation_deg(1, 37.0);
        let m = r.multiply(&t);
        let p = Vector3::new(-4.0, 0.5, 9.0);
        let q = m.inverse().transform_point(&m.transform_point(&p));
        assert!(same_point(&p, &q));
    }

    #[test]
    fn test_direction_ignores_translation() {
        let t = Matrix4::from_translation(Vector3::new(100.0, 0.0, 0.0));
        let d = Vector3::new(0.0, 1.0, 0.0);
        assert_eq!(t.transform_direction(&d), d);
    }
}
