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

//! Bodies of revolution: SPH, RCC, REC, TRC, ELL.
//!
//! The lateral surfaces of the arbitrary-axis bodies expand into general
//! quadric cards; the end caps are planes oriented to the alternating
//! interior pattern (lateral -, bottom +, top -).

use crate::core::error::{GeometryError, Result};
use crate::core::input::SurfaceCard;
use crate::core::math::{Vector3, EPS};

use super::{add_outer, check_param_length, mat_vec, plane_through, quadric_card, MacroBody};

fn vec_at(params: &[f64], i: usize) -> Vector3 {
    Vector3::new(params[i], params[i + 1], params[i + 2])
}

const IDENTITY3: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// `sph x y z r`: one sphere facet.
pub(crate) struct Sph;

impl MacroBody for Sph {
    fn mnemonic(&self) -> &'static str {
        "sph"
    }

    fn expand(&self, card: &SurfaceCard) -> Result<Vec<String>> {
        check_param_length(&card.params, &[4], self.mnemonic())?;
        if card.params[3] <= 0.0 {
            return Err(GeometryError::InvalidArgument(format!(
                "sph {}: radius must be positive", card.name
            )));
        }
        let p = &card.params;
        Ok(vec![format!("s {} {} {} {}", p[0], p[1], p[2], p[3])])
    }
}

/// `rcc vx vy vz hx hy hz r`: right circular cylinder.
pub(crate) struct Rcc;

impl MacroBody for Rcc {
    fn mnemonic(&self) -> &'static str {
        "rcc"
    }

    fn expand(&self, card: &SurfaceCard) -> Result<Vec<String>> {
        check_param_length(&card.params, &[7], self.mnemonic())?;
        let v = vec_at(&card.params, 0);
        let h = vec_at(&card.params, 3);
        let r = card.params[6];
        if h.norm() < EPS || r <= 0.0 {
            return Err(GeometryError::InvalidArgument(format!(
                "rcc {}: degenerate axis or radius", card.name
            )));
        }
        let u = h.normalized();

        // Lateral quadric: |q|^2 - (q.u)^2 - r^2 with q = p - v.
        let mut m = IDENTITY3;
        add_outer(&mut m, &u, -1.0);
        let g = mat_vec(&m, &v) * -2.0;
        let k = v.dot(&mat_vec(&m, &v)) - r * r;

        Ok(vec![
            quadric_card(&m, &g, k),
            plane_through(&u, &v),
            plane_through(&u, &(v + h)),
        ])
    }
}

/// `rec v(3) h(3) v1(3) v2(3)|b`: right elliptical cylinder.
///
/// `v1` is the first semi-axis vector; the second is either a full vector
/// or a scalar length taken perpendicular to `h` and `v1`.
pub(crate) struct Rec;

impl MacroBody for Rec {
    fn mnemonic(&self) -> &'static str {
        "rec"
    }

    fn expand(&self, card: &SurfaceCard) -> Result<Vec<String>> {
        check_param_length(&card.params, &[10, 12], self.mnemonic())?;
        let v = vec_at(&card.params, 0);
        let h = vec_at(&card.params, 3);
        let v1 = vec_at(&card.params, 6);
        if h.norm() < EPS || v1.norm() < EPS {
            return Err(GeometryError::InvalidArgument(format!(
                "rec {}: degenerate axis or semi-axis", card.name
            )));
        }
        let u = h.normalized();
        let a = v1.norm();
        let (e2, b) = if card.params.len() == 12 {
            let v2 = vec_at(&card.params, 9);
            if v2.norm() < EPS {
                return Err(GeometryError::InvalidArgument(format!(
                    "rec {}: zero second semi-axis", card.name
                )));
            }
            (v2.normalized(), v2.norm())
        } else {
            (u.cross(&v1).normalized(), card.params[9])
        };
        if b <= 0.0 {
            return Err(GeometryError::InvalidArgument(format!(
                "rec {}: second semi-axis must be positive", card.name
            )));
        }
        let e1 = v1.normalized();

        // (q.e1/a)^2 + (q.e2/b)^2 - 1
        let mut m = [[0.0; 3]; 3];
        add_outer(&mut m, &e1, 1.0 / (a * a));
        add_outer(&mut m, &e2, 1.0 / (b * b));
        let g = mat_vec(&m, &v) * -2.0;
        let k = v.dot(&mat_vec(&m, &v)) - 1.0;

        Ok(vec![
            quadric_card(&m, &g, k),
            plane_through(&u, &v),
            plane_through(&u, &(v + h)),
        ])
    }
}

/// `trc v(3) h(3) r1 r2`: truncated cone, base radius `r1` at `v`, top
/// radius `r2` at `v + h`.
pub(crate) struct Trc;

impl MacroBody for Trc {
    fn mnemonic(&self) -> &'static str {
        "trc"
    }

    fn expand(&self, card: &SurfaceCard) -> Result<Vec<String>> {
        check_param_length(&card.params, &[8], self.mnemonic())?;
        let v = vec_at(&card.params, 0);
        let h = vec_at(&card.params, 3);
        let (r1, r2) = (card.params[6], card.params[7]);
        if h.norm() < EPS || r1 < 0.0 || r2 < 0.0 || r1 + r2 < EPS {
            return Err(GeometryError::InvalidArgument(format!(
                "trc {}: degenerate axis or radii", card.name
            )));
        }
        let u = h.normalized();
        let slope = (r2 - r1) / h.norm();

        // |q|^2 - (q.u)^2 - (r1 + slope*(q.u))^2 with q = p - v:
        // q^T (I - (1 + slope^2) u u^T) q - 2 r1 slope (u.q) - r1^2
        let mut m = IDENTITY3;
        add_outer(&mut m, &u, -(1.0 + slope * slope));
        let g = mat_vec(&m, &v) * -2.0 - u * (2.0 * r1 * slope);
        let k = v.dot(&mat_vec(&m, &v)) + 2.0 * r1 * slope * u.dot(&v) - r1 * r1;

        Ok(vec![
            quadric_card(&m, &g, k),
            plane_through(&u, &v),
            plane_through(&u, &(v + h)),
        ])
    }
}

/// `ell v1(3) v2(3) rm`: ellipsoid of revolution.
///
/// `rm > 0`: `v1`/`v2` are the foci and `rm` the major axis length.
/// `rm < 0`: `v1` is the centre, `v2` the major semi-axis vector and
/// `|rm|` the minor radius.
pub(crate) struct Ell;

impl MacroBody for Ell {
    fn mnemonic(&self) -> &'static str {
        "ell"
    }

    fn expand(&self, card: &SurfaceCard) -> Result<Vec<String>> {
        check_param_length(&card.params, &[7], self.mnemonic())?;
        let p1 = vec_at(&card.params, 0);
        let p2 = vec_at(&card.params, 3);
        let rm = card.params[6];

        let (center, axis, a, b) = if rm > 0.0 {
            let c = (p1 + p2) * 0.5;
            let half_focal = (p2 - p1).norm() * 0.5;
            let a = rm * 0.5;
            if a <= half_focal + EPS {
                return Err(GeometryError::InvalidArgument(format!(
                    "ell {}: major axis shorter than focal distance", card.name
                )));
            }
            let axis = if half_focal < EPS {
                Vector3::new(1.0, 0.0, 0.0)
            } else {
                (p2 - p1).normalized()
            };
            (c, axis, a, (a * a - half_focal * half_focal).sqrt())
        } else if rm < 0.0 {
            if p2.norm() < EPS {
                return Err(GeometryError::InvalidArgument(format!(
                    "ell {}: zero major axis vector", card.name
                )));
            }
            (p1, p2.normalized(), p2.norm(), -rm)
        } else {
            return Err(GeometryError::InvalidArgument(format!(
                "ell {}: rm must be nonzero", card.name
            )));
        };

        // (q.u/a)^2 + |q - (q.u)u|^2 / b^2 - 1
        let mut m = [[0.0; 3]; 3];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = 1.0 / (b * b);
        }
        add_outer(&mut m, &axis, 1.0 / (a * a) - 1.0 / (b * b));
        let g = mat_vec(&m, &center) * -2.0;
        let k = center.dot(&mat_vec(&m, &center)) - 1.0;
        Ok(vec![quadric_card(&m, &g, k)])
    }
}
