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

//! Plane-bounded macro bodies: BOX, RPP, WED, ARB, RHP/HEX.

use crate::core::error::{GeometryError, Result};
use crate::core::input::SurfaceCard;
use crate::core::math::{is_orthogonal, Vector3, EPS};

use super::{check_param_length, plane_through, MacroBody};

fn vec_at(params: &[f64], i: usize) -> Vector3 {
    Vector3::new(params[i], params[i + 1], params[i + 2])
}

/// `box vx vy vz a1(3) a2(3) a3(3)`: parallelepiped, six planes.
pub(crate) struct BoxBody;

impl MacroBody for BoxBody {
    fn mnemonic(&self) -> &'static str {
        "box"
    }

    fn expand(&self, card: &SurfaceCard) -> Result<Vec<String>> {
        check_param_length(&card.params, &[12], self.mnemonic())?;
        let v = vec_at(&card.params, 0);
        let edges = [
            vec_at(&card.params, 3),
            vec_at(&card.params, 6),
            vec_at(&card.params, 9),
        ];
        for (i, a) in edges.iter().enumerate() {
            if a.norm() < EPS {
                return Err(GeometryError::InvalidArgument(format!(
                    "box {}: zero edge vector", card.name
                )));
            }
            if !is_orthogonal(a, &edges[(i + 1) % 3]) {
                log::warn!("box {}: edge vectors are not orthogonal", card.name);
            }
        }
        let mut facets = Vec::with_capacity(6);
        for a in &edges {
            let n = a.normalized();
            facets.push(plane_through(&n, &(v + *a)));
            facets.push(plane_through(&n, &v));
        }
        Ok(facets)
    }
}

/// `rpp xmin xmax ymin ymax zmin zmax`: axis-aligned box.
pub(crate) struct Rpp;

impl MacroBody for Rpp {
    fn mnemonic(&self) -> &'static str {
        "rpp"
    }

    fn expand(&self, card: &SurfaceCard) -> Result<Vec<String>> {
        check_param_length(&card.params, &[6], self.mnemonic())?;
        let p = &card.params;
        for axis in 0..3 {
            if p[2 * axis] >= p[2 * axis + 1] {
                return Err(GeometryError::InvalidArgument(format!(
                    "rpp {}: min >= max on axis {}", card.name, axis
                )));
            }
        }
        Ok(vec![
            format!("px {}", p[1]),
            format!("px {}", p[0]),
            format!("py {}", p[3]),
            format!("py {}", p[2]),
            format!("pz {}", p[5]),
            format!("pz {}", p[4]),
        ])
    }
}

/// `wed vx vy vz a1(3) a2(3) h(3)`: right-angle wedge, five planes.
///
/// The base is the triangle spanned by `a1` and `a2` at `v`; `h` is the
/// height vector.
pub(crate) struct Wed;

impl MacroBody for Wed {
    fn mnemonic(&self) -> &'static str {
        "wed"
    }

    fn expand(&self, card: &SurfaceCard) -> Result<Vec<String>> {
        check_param_length(&card.params, &[12], self.mnemonic())?;
        let v = vec_at(&card.params, 0);
        let a1 = vec_at(&card.params, 3);
        let a2 = vec_at(&card.params, 6);
        let h = vec_at(&card.params, 9);
        if a1.cross(&a2).norm() < EPS || h.norm() < EPS {
            return Err(GeometryError::InvalidArgument(format!(
                "wed {}: degenerate base or height", card.name
            )));
        }
        let hu = h.normalized();

        // Slant plane through the ends of a1 and a2, parallel to h,
        // oriented away from the vertex.
        let mut n1 = (a2 - a1).cross(&h).normalized();
        if n1.dot(&a1) < 0.0 {
            n1 = -n1;
        }
        // Side plane containing a2 and h, outward.
        let mut n3 = a2.cross(&h).normalized();
        if n3.dot(&a1) > 0.0 {
            n3 = -n3;
        }
        // Side plane containing a1 and h, inward (even facet).
        let mut n4 = a1.cross(&h).normalized();
        if n4.dot(&a2) < 0.0 {
            n4 = -n4;
        }

        Ok(vec![
            plane_through(&n1, &(v + a1)),
            plane_through(&hu, &v),
            plane_through(&n3, &v),
            plane_through(&n4, &v),
            plane_through(&hu, &(v + h)),
        ])
    }
}

/// `arb p1(3) .. p8(3) f1 .. f6`: arbitrary polyhedron.
///
/// Eight corner points followed by six facet descriptors; each descriptor
/// is a 3-4 digit number selecting corners (0 skips the facet). Between
/// four and six facets must remain.
pub(crate) struct Arb;

impl MacroBody for Arb {
    fn mnemonic(&self) -> &'static str {
        "arb"
    }

    fn expand(&self, card: &SurfaceCard) -> Result<Vec<String>> {
        check_param_length(&card.params, &[30], self.mnemonic())?;
        let corners: Vec<Vector3> = (0..8).map(|i| vec_at(&card.params, 3 * i)).collect();
        let centroid = corners.iter().fold(Vector3::ZERO, |acc, c| acc + *c) / 8.0;

        let mut facets = Vec::new();
        for desc_idx in 0..6 {
            let descriptor = card.params[24 + desc_idx];
            if descriptor.abs() < EPS {
                continue;
            }
            let digits: Vec<usize> = format!("{}", descriptor as i64)
                .chars()
                .map(|c| {
                    c.to_digit(10)
                        .map(|d| d as usize)
                        .filter(|&d| (1..=8).contains(&d))
                        .ok_or_else(|| {
                            GeometryError::InvalidArgument(format!(
                                "arb {}: bad facet descriptor {}", card.name, descriptor
                            ))
                        })
                })
                .collect::<Result<_>>()?;
            if digits.len() < 3 {
                return Err(GeometryError::InvalidArgument(format!(
                    "arb {}: facet descriptor {} selects fewer than 3 corners",
                    card.name, descriptor
                )));
            }
            let (c1, c2, c3) = (
                corners[digits[0] - 1],
                corners[digits[1] - 1],
                corners[digits[2] - 1],
            );
            let mut n = (c2 - c1).cross(&(c3 - c1));
            if n.norm() < EPS {
                return Err(GeometryError::InvalidArgument(format!(
                    "arb {}: facet {} is degenerate", card.name, descriptor
                )));
            }
            n = n.normalized();
            let side = n.dot(&(centroid - c1));
            if side.abs() < EPS {
                return Err(GeometryError::InvalidArgument(format!(
                    "arb {}: centroid lies on facet {}", card.name, descriptor
                )));
            }
            // Odd facets face outward, even facets inward, to fit the
            // alternating interior pattern.
            let outward = facets.len() % 2 == 0;
            if (side > 0.0) == outward {
                n = -n;
            }
            facets.push(plane_through(&n, &c1));
        }
        if facets.len() < 4 {
            return Err(GeometryError::InvalidArgument(format!(
                "arb {}: needs at least 4 facets, got {}", card.name, facets.len()
            )));
        }
        Ok(facets)
    }
}

/// `rhp vx vy vz h(3) r(3) [s(3) t(3)]`: right hexagonal prism.
///
/// `r` points from the base centre to the middle of the first side facet;
/// omitted `s`/`t` default to `r` rotated by 60 and 120 degrees about the
/// axis.
pub(crate) struct Rhp;

impl MacroBody for Rhp {
    fn mnemonic(&self) -> &'static str {
        "rhp"
    }

    fn expand(&self, card: &SurfaceCard) -> Result<Vec<String>> {
        check_param_length(&card.params, &[9, 15], self.mnemonic())?;
        let v = vec_at(&card.params, 0);
        let h = vec_at(&card.params, 3);
        let r = vec_at(&card.params, 6);
        if h.norm() < EPS || r.norm() < EPS {
            return Err(GeometryError::InvalidArgument(format!(
                "rhp {}: degenerate axis or facet vector", card.name
            )));
        }
        let hu = h.normalized();
        let (s, t) = if card.params.len() == 15 {
            (vec_at(&card.params, 9), vec_at(&card.params, 12))
        } else {
            (rotate_about(&r, &hu, 60.0), rotate_about(&r, &hu, 120.0))
        };

        let mut facets = Vec::with_capacity(8);
        for w in [&r, &s, &t] {
            let n = w.normalized();
            facets.push(plane_through(&n, &(v + *w)));
            facets.push(plane_through(&n, &(v - *w)));
        }
        facets.push(plane_through(&hu, &(v + h)));
        facets.push(plane_through(&hu, &v));
        Ok(facets)
    }
}

/// Rodrigues rotation of `v` about unit axis `u`.
fn rotate_about(v: &Vector3, u: &Vector3, angle_deg: f64) -> Vector3 {
    let a = crate::core::math::to_radians(angle_deg);
    let (sin, cos) = a.sin_cos();
    *v * cos + u.cross(v) * sin + *u * (u.dot(v) * (1.0 - cos))
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

    /// Interior check with the alternating sign pattern.
    fn inside_alternating(facets: &[String], p: &Vector3) -> bool {
        facets.iter().enumerate().all(|(i, f)| {
            let v = eval(f, p);
            if i % 2 == 0 {
                v < 0.0
            } else {
                v > 0.0
            }
        })
    }

    #[test]
    fn test_box_facets() {
        let facets = expand("b1 box -10 -10 -10 20 0 0 0 20 0 0 0 20");
        assert_eq!(facets.len(), 6);
        assert!(inside_alternating(&facets, &Vector3::ZERO));
        assert!(!inside_alternating(&facets, &Vector3::new(15.0, 0.0, 0.0)));
        assert!(!inside_alternating(&facets, &Vector3::new(0.0, -11.0, 0.0)));
    }

    #[test]
    fn test_rpp_facets() {
        let facets = expand("b1 rpp -1 1 -2 2 -3 3");
        assert_eq!(facets, vec!["px 1", "px -1", "py 2", "py -2", "pz 3", "pz -3"]);
        assert!(inside_alternating(&facets, &Vector3::new(0.0, 1.5, -2.5)));
        assert!(!inside_alternating(&facets, &Vector3::new(0.0, 2.5, 0.0)));
    }

    #[test]
    fn test_rpp_rejects_inverted_bounds() {
        let card = SurfaceCard::from_string("b1 rpp 1 -1 -2 2 -3 3").unwrap();
        assert!(Rpp.expand(&card).is_err());
    }

    #[test]
    fn test_wed_interior() {
        // Right-angle wedge at origin: base legs along +x and +y, height +z.
        let facets = expand("w1 wed 0 0 0 4 0 0 0 4 0 0 0 2");
        assert_eq!(facets.len(), 5);
        let signs = [-1.0, 1.0, -1.0, 1.0, -1.0];
        let inside = |p: &Vector3| {
            facets
                .iter()
                .zip(signs.iter())
                .all(|(f, s)| eval(f, p) * s > 0.0)
        };
        assert!(inside(&Vector3::new(1.0, 1.0, 1.0)));
        // Beyond the hypotenuse x + y = 4.
        assert!(!inside(&Vector3::new(3.0, 3.0, 1.0)));
        assert!(!inside(&Vector3::new(1.0, 1.0, 3.0)));
        assert!(!inside(&Vector3::new(-1.0, 1.0, 1.0)));
    }

    #[test]
    fn test_arb_tetrahedron() {
        // Corners 1-4 used, remaining four corners padded with zeros.
        let facets = expand(
            "a1 arb 0 0 0  4 0 0  0 4 0  0 0 4  0 0 0  0 0 0  0 0 0  0 0 0 \
             123 124 134 234 0 0",
        );
        assert_eq!(facets.len(), 4);
        assert!(inside_alternating(&facets, &Vector3::new(0.5, 0.5, 0.5)));
        assert!(!inside_alternating(&facets, &Vector3::new(3.0, 3.0, 3.0)));
        assert!(!inside_alternating(&facets, &Vector3::new(-0.5, 0.5, 0.5)));
    }

    #[test]
    fn test_arb_too_few_facets() {
        let card = SurfaceCard::from_string(
            "a1 arb 0 0 0  4 0 0  0 4 0  0 0 4  0 0 0  0 0 0  0 0 0  0 0 0 \
             123 124 0 0 0 0",
        )
        .unwrap();
        assert!(Arb.expand(&card).is_err());
    }

    #[test]
    fn test_rhp_defaults() {
        // Hexagonal prism about z with apothem 2.
        let facets = expand("h1 rhp 0 0 0 0 0 5 2 0 0");
        assert_eq!(facets.len(), 8);
        assert!(inside_alternating(&facets, &Vector3::new(0.0, 0.0, 2.5)));
        assert!(!inside_alternating(&facets, &Vector3::new(3.0, 0.0, 2.5)));
        assert!(!inside_alternating(&facets, &Vector3::new(0.0, 0.0, 6.0)));
    }

    #[test]
    fn test_rotate_about() {
        let z = Vector3::new(0.0, 0.0, 1.0);
        let x = Vector3::new(1.0, 0.0, 0.0);
        let r = rotate_about(&x, &z, 90.0);
        assert!(crate::core::math::same_point(&r, &Vector3::new(0.0, 1.0, 0.0)));
    }
}
