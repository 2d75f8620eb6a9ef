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

//! MARS-CG sector bodies: TOR and QUA.
//!
//! Both describe a solid of revolution about the z axis, optionally
//! limited to an azimuthal sector `[phi1, phi2]`. A sector wider than 180
//! degrees is a non-convex wedge, so the interior cannot be written as a
//! single conjunction. The bodies therefore always expand with three cut
//! planes through the axis (the two sector faces plus the bisector) and
//! replace cell references with a fixed two-piece expression:
//!
//! `-M  ->  ((-M.1 M.2 -M.4):(-M.1 M.4 -M.3))`
//!
//! piece one from `phi1` to the bisector, piece two from the bisector to
//! `phi2`, each at most 180 degrees wide. Without the angle pair the body
//! is the full revolution and only the generating surface is emitted.

use crate::core::error::{GeometryError, Result};
use crate::core::input::SurfaceCard;
use crate::core::math::{to_radians, Vector3, EPS};

use super::{check_param_length, fmt, plane_through, MacroBody};

/// `(minus, plus)` for the two-piece sector expression.
fn sector_replacement(name: &str) -> (String, String) {
    (
        format!(
            "((-{n}.1 {n}.2 -{n}.4):(-{n}.1 {n}.4 -{n}.3))",
            n = name
        ),
        format!(
            "(({n}.1:-{n}.2:{n}.4) ({n}.1:-{n}.4:{n}.3))",
            n = name
        ),
    )
}

/// Azimuthal cut planes through the axis point for `phi1`, `phi2` and the
/// bisector. The plane normal at azimuth `phi` is the tangential direction
/// `(-sin phi, cos phi, 0)`, so the region just counter-clockwise of
/// `phi1` is on the positive side of the first plane.
fn sector_planes(center: &Vector3, phi1: f64, phi2: f64) -> Result<Vec<String>> {
    if phi2 <= phi1 || phi2 - phi1 > 360.0 + EPS {
        return Err(GeometryError::InvalidArgument(format!(
            "sector angles must satisfy phi1 < phi2 <= phi1 + 360, got {} {}",
            phi1, phi2
        )));
    }
    let tangent = |deg: f64| {
        let a = to_radians(deg);
        Vector3::new(-a.sin(), a.cos(), 0.0)
    };
    Ok(vec![
        plane_through(&tangent(phi1), center),
        plane_through(&tangent(phi2), center),
        plane_through(&tangent(0.5 * (phi1 + phi2)), center),
    ])
}

/// `tor x y z a b c [phi1 phi2]`: z-axis torus at `(x, y, z)` with major
/// radius `a` and cross-section semi-axes `b` (axial) and `c` (radial),
/// optionally limited to the azimuthal sector.
pub(crate) struct Tor;

impl MacroBody for Tor {
    fn mnemonic(&self) -> &'static str {
        "tor"
    }

    fn expand(&self, card: &SurfaceCard) -> Result<Vec<String>> {
        check_param_length(&card.params, &[6, 8], self.mnemonic())?;
        let p = &card.params;
        if p[3] <= 0.0 || p[4] <= 0.0 || p[5] <= 0.0 {
            return Err(GeometryError::InvalidArgument(format!(
                "tor {}: radii must be positive", card.name
            )));
        }
        let torus = format!(
            "tz {} {} {} {} {} {}",
            fmt(p[0]), fmt(p[1]), fmt(p[2]), fmt(p[3]), fmt(p[4]), fmt(p[5])
        );
        if card.params.len() == 6 {
            return Ok(vec![torus]);
        }
        let center = Vector3::new(p[0], p[1], p[2]);
        let mut facets = vec![torus];
        facets.extend(sector_planes(&center, p[6], p[7])?);
        Ok(facets)
    }

    fn replacement(&self, name: &str, num_surfaces: usize) -> (String, String) {
        if num_surfaces == 1 {
            (format!("(-{}.1)", name), format!("({}.1)", name))
        } else {
            sector_replacement(name)
        }
    }
}

/// `qua x y z a b c [phi1 phi2]`: axisymmetric quadric about the z axis
/// through `(x, y)`, generating curve `rho^2 = a + b*(z - z0) + c*(z - z0)^2`,
/// optionally limited to the azimuthal sector.
pub(crate) struct Qua;

impl MacroBody for Qua {
    fn mnemonic(&self) -> &'static str {
        "qua"
    }

    fn expand(&self, card: &SurfaceCard) -> Result<Vec<String>> {
        check_param_length(&card.params, &[6, 8], self.mnemonic())?;
        let p = &card.params;
        let (x0, y0, z0, a, b, c) = (p[0], p[1], p[2], p[3], p[4], p[5]);
        if a.abs() < EPS && b.abs() < EPS && c.abs() < EPS {
            return Err(GeometryError::InvalidArgument(format!(
                "qua {}: all generating coefficients are zero", card.name
            )));
        }

        // (x-x0)^2 + (y-y0)^2 - a - b(z-z0) - c(z-z0)^2 in general form.
        let quadric = format!(
            "gq 1 1 {} 0 0 0 {} {} {} {}",
            fmt(-c),
            fmt(-2.0 * x0),
            fmt(-2.0 * y0),
            fmt(-b + 2.0 * c * z0),
            fmt(x0 * x0 + y0 * y0 - a + b * z0 - c * z0 * z0)
        );
        if card.params.len() == 6 {
            return Ok(vec![quadric]);
        }
        let center = Vector3::new(x0, y0, z0);
        let mut facets = vec![quadric];
        facets.extend(sector_planes(&center, p[6], p[7])?);
        Ok(facets)
    }

    fn replacement(&self, name: &str, num_surfaces: usize) -> (String, String) {
        if num_surfaces == 1 {
            (format!("(-{}.1)", name), format!("({}.1)", name))
        } else {
            sector_replacement(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::surface::body_from_card;

    fn expand(text: &str) -> Vec<String> {
        let card = SurfaceCard::from_string(text).unwrap();
        super::super::find_macro(&card.symbol)
            .unwrap()
            .expand(&card)
            .unwrap()
    }

    fn eval(facet: &str, p: &Vector3) -> f64 {
        let mut tokens = facet.split_whitespace();
        let symbol = tokens.next().unwrap().to_string();
        let params: Vec<f64> = tokens.map(|t| t.parse().unwrap()).collect();
        body_from_card(&symbol, &params).unwrap().eval(p)
    }

    /// Evaluate the two-piece minus expression against expanded facets.
    fn inside_sector_body(facets: &[String], p: &Vector3) -> bool {
        let f = |i: usize| eval(&facets[i], p);
        let piece1 = f(0) < 0.0 && f(1) > 0.0 && f(3) < 0.0;
        let piece2 = f(0) < 0.0 && f(3) > 0.0 && f(2) < 0.0;
        piece1 || piece2
    }

    #[test]
    fn test_full_torus_single_facet() {
        let facets = expand("t1 tor 0 0 0 10 2 2");
        assert_eq!(facets, vec!["tz 0 0 0 10 2 2"]);
        assert!(eval(&facets[0], &Vector3::new(10.0, 0.0, 0.0)) < 0.0);
    }

    #[test]
    fn test_tor_sector_pieces() {
        // Upper half (0 to 180 degrees) of a ring torus.
        let facets = expand("t1 tor 0 0 0 10 2 2 0 180");
        assert_eq!(facets.len(), 4);
        let r = 10.0 / 2.0_f64.sqrt();
        // In the tube at 45 and 135 degrees azimuth: inside (one per piece).
        assert!(inside_sector_body(&facets, &Vector3::new(r, r, 0.0)));
        assert!(inside_sector_body(&facets, &Vector3::new(-r, r, 0.0)));
        // Same radius at -45 degrees: outside the sector.
        assert!(!inside_sector_body(&facets, &Vector3::new(r, -r, 0.0)));
        // Outside the tube entirely.
        assert!(!inside_sector_body(&facets, &Vector3::new(0.0, 20.0, 0.0)));
    }

    #[test]
    fn test_tor_wide_sector() {
        // 270-degree sector: the wedge is non-convex, which is exactly
        // what the two-piece expression must handle.
        let facets = expand("t1 tor 0 0 0 10 2 2 0 270");
        let r = 10.0 / 2.0_f64.sqrt();
        assert!(inside_sector_body(&facets, &Vector3::new(0.0, 10.0, 0.0)));
        assert!(inside_sector_body(&facets, &Vector3::new(-10.0, 0.0, 0.0)));
        assert!(inside_sector_body(&facets, &Vector3::new(-r, -r, 0.0)));
        // 315 degrees azimuth is in the missing quarter.
        assert!(!inside_sector_body(&facets, &Vector3::new(r, -r, 0.0)));
    }

    #[test]
    fn test_qua_cylinder_equivalent() {
        // rho^2 = 25: a cylinder of radius 5 about z.
        let facets = expand("q1 qua 0 0 0 25 0 0");
        assert_eq!(facets.len(), 1);
        assert!(eval(&facets[0], &Vector3::new(3.0, 0.0, 50.0)) < 0.0);
        assert!(eval(&facets[0], &Vector3::new(6.0, 0.0, -50.0)) > 0.0);
    }

    #[test]
    fn test_qua_paraboloid_sector() {
        // rho^2 = 4 z, upper half sector.
        let facets = expand("q1 qua 0 0 0 0 4 0 0 180");
        assert_eq!(facets.len(), 4);
        assert!(inside_sector_body(&facets, &Vector3::new(1.0, 1.0, 9.0)));
        assert!(!inside_sector_body(&facets, &Vector3::new(1.0, -1.0, 9.0)));
        assert!(!inside_sector_body(&facets, &Vector3::new(7.0, 1.0, 9.0)));
    }

    #[test]
    fn test_sector_replacement_strings() {
        let (minus, plus) = Tor.replacement("t1", 4);
        assert_eq!(minus, "((-t1.1 t1.2 -t1.4):(-t1.1 t1.4 -t1.3))");
        assert_eq!(plus, "((t1.1:-t1.2:t1.4) (t1.1:-t1.4:t1.3))");
    }

    #[test]
    fn test_bad_angles() {
        let card = SurfaceCard::from_string("t1 tor 0 0 0 10 2 2 180 0").unwrap();
        assert!(Tor.expand(&card).is_err());
    }
}
