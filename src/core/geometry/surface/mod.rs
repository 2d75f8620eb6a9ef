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

//! Surface library
//!
//! One concrete kind per quadric form plus a general quadric and an
//! axis-aligned torus, dispatched through a tagged union. Every surface has
//! a signed integer id (positive front, negative back) and a user-facing
//! name; the reverse copy carries the `-`-prefixed name and the negated id.
//!
//! The implicit function convention is "front is f > 0". Ray intersection
//! returns parameter values in strictly ascending order, ignoring t <= eps
//! and grazing tangencies.

mod map;

pub use map::SurfaceMap;

use crate::core::error::{GeometryError, Result};
use crate::core::input::{SurfaceCard, TrMap};
use crate::core::math::{solve_quartic, Matrix4, Point, Vector3, EPS};

/// Which side of a surface a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceSign {
    /// Implicit function positive.
    Front,
    /// Implicit function negative.
    Back,
    /// Within [`EPS`] of the surface.
    On,
}

/// Kind-specific geometry of a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceBody {
    /// `f = n.p - d`
    Plane { normal: Vector3, distance: f64 },
    /// `f = |p - c|^2 - r^2`
    Sphere { center: Point, radius: f64 },
    /// Infinite circular cylinder about an arbitrary axis line.
    Cylinder { point: Point, axis: Vector3, radius: f64 },
    /// Infinite cone; `t2` is the squared tangent of the half angle,
    /// `sheet` restricts to one nappe (+1 along the axis, -1 against, 0
    /// both).
    Cone { apex: Point, axis: Vector3, t2: f64, sheet: i8 },
    /// Axis-aligned torus with elliptical cross-section:
    /// `f = (s/b)^2 + ((rho - a)/c)^2 - 1` with `s` the axial offset and
    /// `rho` the radial distance from the axis.
    Torus { center: Point, axis: usize, major: f64, axial_semi: f64, radial_semi: f64 },
    /// General quadric `Ax^2+By^2+Cz^2+Dxy+Eyz+Fzx+Gx+Hy+Jz+K`.
    Quadric { coeffs: [f64; 10] },
}

/// An oriented surface in the CSG world. Immutable once built; the
/// contact-cell lists are filled by the adjacency pass and read-only
/// afterwards.
#[derive(Debug, Clone)]
pub struct Surface {
    name: String,
    id: i32,
    body: SurfaceBody,
    /// World-to-local map when the card carried TR references.
    inv_tr: Option<Matrix4>,
    /// Back-side copy: the implicit function is negated.
    reversed: bool,
    /// The originating card, kept for deck re-emission.
    card: SurfaceCard,
    /// Indices of cells touching the front side.
    pub(crate) contact_front: Vec<usize>,
    /// Indices of cells touching the back side.
    pub(crate) contact_back: Vec<usize>,
}

impl Surface {
    /// Build a front surface from its card.
    ///
    /// `id` must be positive. TR references are resolved against `tr_map`
    /// and composed with the rightmost applied first.
    pub fn from_card(card: &SurfaceCard, id: i32, tr_map: &TrMap) -> Result<Self> {
        debug_assert!(id > 0);
        let body = body_from_card(&card.symbol, &card.params)?;
        let mut combined = Matrix4::identity();
        for tr in &card.trs {
            let m = tr_map.get(tr).ok_or_else(|| {
                GeometryError::InvalidArgument(format!(
                    "surface {} references undefined transform tr{}",
                    card.name, tr
                ))
            })?;
            combined = m.multiply(&combined);
        }
        let inv_tr = if combined.is_identity() {
            None
        } else {
            Some(combined.inverse())
        };
        Ok(Self {
            name: card.name.clone(),
            id,
            body,
            inv_tr,
            reversed: false,
            card: card.clone(),
            contact_front: Vec::new(),
            contact_back: Vec::new(),
        })
    }

    /// The mirror-image copy: same locus, inside and outside swapped,
    /// `-`-prefixed name, negated id.
    pub fn reverse(&self) -> Surface {
        Surface {
            name: reverse_name(&self.name),
            id: -self.id,
            body: self.body.clone(),
            inv_tr: self.inv_tr,
            reversed: !self.reversed,
            card: self.card.clone(),
            contact_front: Vec::new(),
            contact_back: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn body(&self) -> &SurfaceBody {
        &self.body
    }

    /// Cells touching the front side. Populated by the adjacency pass.
    pub fn contact_cells_front(&self) -> &[usize] {
        &self.contact_front
    }

    /// Cells touching the back side.
    pub fn contact_cells_back(&self) -> &[usize] {
        &self.contact_back
    }

    /// Side of the surface `p` lies on, `On` within [`EPS`].
    pub fn sign(&self, p: &Point) -> SurfaceSign {
        let q = match &self.inv_tr {
            Some(m) => m.transform_point(p),
            None => *p,
        };
        let mut f = self.body.eval(&q);
        if self.reversed {
            f = -f;
        }
        if f.abs() < EPS {
            SurfaceSign::On
        } else if f > 0.0 {
            SurfaceSign::Front
        } else {
            SurfaceSign::Back
        }
    }

    /// Forward ray-intersection parameters, strictly ascending, t > eps.
    ///
    /// Grazing tangencies are not counted: a ray touching the surface
    /// without crossing it produces no intersection.
    pub fn intersections(&self, p: &Point, d: &Vector3) -> Vec<f64> {
        let (q, dq) = match &self.inv_tr {
            Some(m) => (m.transform_point(p), m.transform_direction(d)),
            None => (*p, *d),
        };
        self.body.intersections(&q, &dq)
    }

    /// Deck text of the defining card. Reverse copies emit the front card.
    pub fn to_input_string(&self) -> String {
        self.card.to_input_string()
    }
}

/// `s1` ⇄ `-s1`.
pub fn reverse_name(name: &str) -> String {
    match name.strip_prefix('-') {
        Some(rest) => rest.to_string(),
        None => format!("-{}", name),
    }
}

/// Surface names referenced in a polynomial string, operators
/// `( ) : space` ignored. The `-` side prefix is kept; a redundant `+` is
/// stripped.
pub fn extract_surface_names(equation: &str) -> Vec<String> {
    equation
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')' || c == ':')
        .filter(|tok| !tok.is_empty())
        .map(|tok| tok.strip_prefix('+').unwrap_or(tok).to_string())
        .collect()
}

impl SurfaceBody {
    /// Implicit function value at a local-frame point.
    pub fn eval(&self, p: &Point) -> f64 {
        match self {
            SurfaceBody::Plane { normal, distance } => normal.dot(p) - distance,
            SurfaceBody::Sphere { center, radius } => {
                (*p - *center).norm_squared() - radius * radius
            }
            SurfaceBody::Cylinder { point, axis, radius } => {
                let q = *p - *point;
                let ax = q.dot(axis);
                q.norm_squared() - ax * ax - radius * radius
            }
            SurfaceBody::Cone { apex, axis, t2, sheet } => {
                let q = *p - *apex;
                let ax = q.dot(axis);
                if *sheet != 0 && ax * (*sheet as f64) < 0.0 {
                    // The unselected nappe is entirely outside.
                    return q.norm_squared().max(EPS * 2.0);
                }
                q.norm_squared() - (1.0 + t2) * ax * ax
            }
            SurfaceBody::Torus { center, axis, major, axial_semi, radial_semi } => {
                let q = *p - *center;
                let s = q.component(*axis);
                let (i, j) = perp_axes(*axis);
                let rho = (q.component(i).powi(2) + q.component(j).powi(2)).sqrt();
                let sv = s / axial_semi;
                let rv = (rho - major) / radial_semi;
                sv * sv + rv * rv - 1.0
            }
            SurfaceBody::Quadric { coeffs } => {
                let [a, b, c, d, e, f, g, h, j, k] = *coeffs;
                a * p.x * p.x
                    + b * p.y * p.y
                    + c * p.z * p.z
                    + d * p.x * p.y
                    + e * p.y * p.z
                    + f * p.z * p.x
                    + g * p.x
                    + h * p.y
                    + j * p.z
                    + k
            }
        }
    }

    /// Forward intersection parameters in the local frame.
    fn intersections(&self, p: &Point, d: &Vector3) -> Vec<f64> {
        match self {
            SurfaceBody::Plane { normal, distance } => {
                let denom = normal.dot(d);
                if denom.abs() < EPS {
                    return Vec::new();
                }
                let t = (distance - normal.dot(p)) / denom;
                forward(vec![t])
            }
            SurfaceBody::Sphere { center, radius } => {
                let q = *p - *center;
                crossing_roots(
                    d.norm_squared(),
                    2.0 * q.dot(d),
                    q.norm_squared() - radius * radius,
                )
            }
            SurfaceBody::Cylinder { point, axis, radius } => {
                let q = *p - *point;
                let qa = q.dot(axis);
                let da = d.dot(axis);
                crossing_roots(
                    d.norm_squared() - da * da,
                    2.0 * (q.dot(d) - qa * da),
                    q.norm_squared() - qa * qa - radius * radius,
                )
            }
            SurfaceBody::Cone { apex, axis, t2, sheet } => {
                let q = *p - *apex;
                let qa = q.dot(axis);
                let da = d.dot(axis);
                let k = 1.0 + t2;
                let roots = crossing_roots(
                    d.norm_squared() - k * da * da,
                    2.0 * (q.dot(d) - k * qa * da),
                    q.norm_squared() - k * qa * qa,
                );
                if *sheet == 0 {
                    roots
                } else {
                    roots
                        .into_iter()
                        .filter(|t| (qa + t * da) * (*sheet as f64) >= 0.0)
                        .collect()
                }
            }
            SurfaceBody::Torus { center, axis, major, axial_semi, radial_semi } => {
                let q = *p - *center;
                let (i, j) = perp_axes(*axis);
                let u = radial_semi / axial_semi;
                let (qi, qj, qk) = (q.component(i), q.component(j), u * q.component(*axis));
                let (di, dj, dk) = (d.component(i), d.component(j), u * d.component(*axis));

                // |P(t)|^2 with the axial component scaled to a circular tube.
                let m2 = di * di + dj * dj + dk * dk;
                let m1 = 2.0 * (qi * di + qj * dj + qk * dk);
                let m0 = qi * qi + qj * qj + qk * qk;
                // Radial part alone.
                let r2 = di * di + dj * dj;
                let r1 = 2.0 * (qi * di + qj * dj);
                let r0 = qi * qi + qj * qj;

                let k0 = major * major - radial_semi * radial_semi;
                let c0 = m0 + k0;
                let four_a2 = 4.0 * major * major;
                let roots = solve_quartic(
                    m2 * m2,
                    2.0 * m2 * m1,
                    m1 * m1 + 2.0 * m2 * c0 - four_a2 * r2,
                    2.0 * m1 * c0 - four_a2 * r1,
                    c0 * c0 - four_a2 * r0,
                );
                forward(roots)
            }
            SurfaceBody::Quadric { coeffs } => {
                let [a, b, c, dd, e, f, g, h, j, _k] = *coeffs;
                // f(p + t d) as a quadratic in t.
                let qa = a * d.x * d.x
                    + b * d.y * d.y
                    + c * d.z * d.z
                    + dd * d.x * d.y
                    + e * d.y * d.z
                    + f * d.z * d.x;
                let qb = 2.0 * (a * p.x * d.x + b * p.y * d.y + c * p.z * d.z)
                    + dd * (p.x * d.y + p.y * d.x)
                    + e * (p.y * d.z + p.z * d.y)
                    + f * (p.z * d.x + p.x * d.z)
                    + g * d.x
                    + h * d.y
                    + j * d.z;
                let qc = self.eval(p);
                crossing_roots(qa, qb, qc)
            }
        }
    }
}

/// Quadratic roots that actually cross the surface. A tangent pair (roots
/// closer than [`EPS`]) is discarded entirely; a vanishing leading
/// coefficient degrades to the linear case.
fn crossing_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < EPS {
        if b.abs() < EPS {
            return Vec::new();
        }
        return forward(vec![-c / b]);
    }
    let disc = b * b - 4.0 * a * c;
    if disc <= 0.0 {
        return Vec::new();
    }
    let sq = disc.sqrt();
    let q = -0.5 * (b + b.signum() * sq);
    let t1 = q / a;
    let t2 = if q.abs() > EPS { c / q } else { -b / a - t1 };
    if (t1 - t2).abs() < EPS {
        return Vec::new();
    }
    forward(vec![t1, t2])
}

/// Keep t > eps, ascending.
fn forward(mut ts: Vec<f64>) -> Vec<f64> {
    ts.retain(|&t| t > EPS);
    ts.sort_by(|a, b| a.partial_cmp(b).unwrap());
    ts
}

/// The two coordinate axes perpendicular to `axis`.
fn perp_axes(axis: usize) -> (usize, usize) {
    match axis {
        0 => (1, 2),
        1 => (0, 2),
        2 => (0, 1),
        _ => panic!("axis index out of range: {}", axis),
    }
}

fn axis_unit(axis: usize) -> Vector3 {
    match axis {
        0 => Vector3::new(1.0, 0.0, 0.0),
        1 => Vector3::new(0.0, 1.0, 0.0),
        _ => Vector3::new(0.0, 0.0, 1.0),
    }
}

fn check_params(symbol: &str, params: &[f64], valid: &[usize]) -> Result<()> {
    if valid.contains(&params.len()) {
        Ok(())
    } else {
        Err(GeometryError::InvalidArgument(format!(
            "surface mnemonic \"{}\" takes {:?} parameters, got {}",
            symbol,
            valid,
            params.len()
        )))
    }
}

/// Construct the body for a primitive surface mnemonic.
pub fn body_from_card(symbol: &str, params: &[f64]) -> Result<SurfaceBody> {
    let body = match symbol {
        "p" => {
            check_params(symbol, params, &[4])?;
            SurfaceBody::Plane {
                normal: Vector3::new(params[0], params[1], params[2]),
                distance: params[3],
            }
        }
        "px" | "py" | "pz" => {
            check_params(symbol, params, &[1])?;
            let axis = (symbol.as_bytes()[1] - b'x') as usize;
            SurfaceBody::Plane { normal: axis_unit(axis), distance: params[0] }
        }
        "so" => {
            check_params(symbol, params, &[1])?;
            SurfaceBody::Sphere { center: Vector3::ZERO, radius: params[0] }
        }
        "s" | "sph" => {
            check_params(symbol, params, &[4])?;
            SurfaceBody::Sphere {
                center: Vector3::new(params[0], params[1], params[2]),
                radius: params[3],
            }
        }
        "sx" | "sy" | "sz" => {
            check_params(symbol, params, &[2])?;
            let axis = (symbol.as_bytes()[1] - b'x') as usize;
            SurfaceBody::Sphere {
                center: axis_unit(axis) * params[0],
                radius: params[1],
            }
        }
        "cx" | "cy" | "cz" => {
            check_params(symbol, params, &[1])?;
            let axis = (symbol.as_bytes()[1] - b'x') as usize;
            SurfaceBody::Cylinder {
                point: Vector3::ZERO,
                axis: axis_unit(axis),
                radius: params[0],
            }
        }
        "c/x" | "c/y" | "c/z" => {
            check_params(symbol, params, &[3])?;
            let axis = (symbol.as_bytes()[2] - b'x') as usize;
            let (i, j) = perp_axes(axis);
            SurfaceBody::Cylinder {
                point: axis_unit(i) * params[0] + axis_unit(j) * params[1],
                axis: axis_unit(axis),
                radius: params[2],
            }
        }
        "kx" | "ky" | "kz" => {
            check_params(symbol, params, &[2, 3])?;
            let axis = (symbol.as_bytes()[1] - b'x') as usize;
            SurfaceBody::Cone {
                apex: axis_unit(axis) * params[0],
                axis: axis_unit(axis),
                t2: params[1],
                sheet: params.get(2).map_or(0, |s| s.signum() as i8),
            }
        }
        "k/x" | "k/y" | "k/z" => {
            check_params(symbol, params, &[4, 5])?;
            let axis = (symbol.as_bytes()[2] - b'x') as usize;
            SurfaceBody::Cone {
                apex: Vector3::new(params[0], params[1], params[2]),
                axis: axis_unit(axis),
                t2: params[3],
                sheet: params.get(4).map_or(0, |s| s.signum() as i8),
            }
        }
        "tx" | "ty" | "tz" => {
            check_params(symbol, params, &[6])?;
            let axis = (symbol.as_bytes()[1] - b'x') as usize;
            SurfaceBody::Torus {
                center: Vector3::new(params[0], params[1], params[2]),
                axis,
                major: params[3],
                axial_semi: params[4],
                radial_semi: params[5],
            }
        }
        "sq" => {
            check_params(symbol, params, &[10])?;
            // A(x-x0)^2 + ... + 2D(x-x0) + ... + G, expanded to the
            // general form.
            let [a, b, c, d, e, f, g, x0, y0, z0] = params.try_into().unwrap();
            SurfaceBody::Quadric {
                coeffs: [
                    a,
                    b,
                    c,
                    0.0,
                    0.0,
                    0.0,
                    -2.0 * a * x0 + 2.0 * d,
                    -2.0 * b * y0 + 2.0 * e,
                    -2.0 * c * z0 + 2.0 * f,
                    a * x0 * x0 + b * y0 * y0 + c * z0 * z0
                        - 2.0 * (d * x0 + e * y0 + f * z0)
                        + g,
                ],
            }
        }
        "gq" => {
            check_params(symbol, params, &[10])?;
            SurfaceBody::Quadric { coeffs: params.try_into().unwrap() }
        }
        _ => {
            return Err(GeometryError::InvalidArgument(format!(
                "unknown surface mnemonic \"{}\"",
                symbol
            )))
        }
    };

    validate_body(&body)?;
    Ok(body)
}

fn validate_body(body: &SurfaceBody) -> Result<()> {
    let bad = match body {
        SurfaceBody::Plane { normal, .. } => normal.norm() < EPS,
        SurfaceBody::Sphere { radius, .. } => *radius <= 0.0,
        SurfaceBody::Cylinder { radius, axis, .. } => *radius <= 0.0 || axis.norm() < EPS,
        SurfaceBody::Cone { t2, .. } => *t2 <= 0.0,
        SurfaceBody::Torus { major, axial_semi, radial_semi, .. } => {
            *major <= 0.0 || *axial_semi <= 0.0 || *radial_semi <= 0.0
        }
        SurfaceBody::Quadric { coeffs } => coeffs.iter().all(|c| c.abs() < EPS),
    };
    if bad {
        Err(GeometryError::InvalidArgument(format!(
            "degenerate surface parameters: {:?}",
            body
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn surface(text: &str) -> Surface {
        let card = SurfaceCard::from_string(text).unwrap();
        Surface::from_card(&card, 1, &TrMap::new()).unwrap()
    }

    fn surface_with_trs(text: &str, tr_map: &TrMap) -> Surface {
        let card = SurfaceCard::from_string(text).unwrap();
        Surface::from_card(&card, 1, tr_map).unwrap()
    }

    #[test]
    fn test_sphere_sign() {
        let s = surface("s1 sph 0 0 0 10");
        assert_eq!(s.sign(&Vector3::new(0.0, 0.0, 0.0)), SurfaceSign::Back);
        assert_eq!(s.sign(&Vector3::new(20.0, 0.0, 0.0)), SurfaceSign::Front);
        assert_eq!(s.sign(&Vector3::new(10.0, 0.0, 0.0)), SurfaceSign::On);
    }

    #[test]
    fn test_sphere_intersections() {
        let s = surface("s1 sph 0 0 0 10");
        let ts = s.intersections(
            &Vector3::new(-20.0, 0.0, 0.0),
            &Vector3::new(1.0, 0.0, 0.0),
        );
        assert_eq!(ts.len(), 2);
        assert_relative_eq!(ts[0], 10.0, epsilon = 1e-8);
        assert_relative_eq!(ts[1], 30.0, epsilon = 1e-8);
    }

    #[test]
    fn test_backward_intersections_ignored() {
        let s = surface("s1 sph 0 0 0 10");
        let ts = s.intersections(
            &Vector3::new(-20.0, 0.0, 0.0),
            &Vector3::new(-1.0, 0.0, 0.0),
        );
        assert!(ts.is_empty());
    }

    #[test]
    fn test_tangent_ray_not_counted() {
        let s = surface("s1 sph 0 0 0 10");
        let ts = s.intersections(
            &Vector3::new(-20.0, 10.0, 0.0),
            &Vector3::new(1.0, 0.0, 0.0),
        );
        assert!(ts.is_empty());
    }

    #[test]
    fn test_reverse_flips_sign() {
        let s = surface("s1 sph 0 0 0 10");
        let r = s.reverse();
        assert_eq!(r.name(), "-s1");
        assert_eq!(r.id(), -1);
        assert_eq!(r.sign(&Vector3::ZERO), SurfaceSign::Front);
        assert_eq!(r.sign(&Vector3::new(20.0, 0.0, 0.0)), SurfaceSign::Back);
        // Double reverse is structurally the original.
        let rr = r.reverse();
        assert_eq!(rr.name(), s.name());
        assert_eq!(rr.id(), s.id());
        assert_eq!(rr.sign(&Vector3::ZERO), s.sign(&Vector3::ZERO));
    }

    #[test]
    fn test_plane_axis_cards() {
        let s = surface("p1 px 5");
        assert_eq!(s.sign(&Vector3::new(6.0, 0.0, 0.0)), SurfaceSign::Front);
        assert_eq!(s.sign(&Vector3::new(4.0, 0.0, 0.0)), SurfaceSign::Back);
        let ts = s.intersections(&Vector3::ZERO, &Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(ts.len(), 1);
        assert_relative_eq!(ts[0], 5.0);
    }

    #[test]
    fn test_parallel_ray_misses_plane() {
        let s = surface("p1 px 5");
        assert!(s
            .intersections(&Vector3::ZERO, &Vector3::new(0.0, 1.0, 0.0))
            .is_empty());
    }

    #[test]
    fn test_cylinder_off_axis() {
        let s = surface("c1 c/z 5 0 2");
        // Axis parallel to z through (5, 0).
        assert_eq!(s.sign(&Vector3::new(5.0, 0.0, 9.0)), SurfaceSign::Back);
        assert_eq!(s.sign(&Vector3::new(5.0, 3.0, -4.0)), SurfaceSign::Front);
        let ts = s.intersections(&Vector3::ZERO, &Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(ts.len(), 2);
        assert_relative_eq!(ts[0], 3.0, epsilon = 1e-8);
        assert_relative_eq!(ts[1], 7.0, epsilon = 1e-8);
    }

    #[test]
    fn test_cone_one_sheet() {
        // 45-degree cone about +x with apex at origin.
        let s = surface("k1 kx 0 1 1");
        assert_eq!(s.sign(&Vector3::new(5.0, 1.0, 0.0)), SurfaceSign::Back);
        // The mirror nappe is excluded by the sheet selector.
        assert_eq!(s.sign(&Vector3::new(-5.0, 1.0, 0.0)), SurfaceSign::Front);
        let ts = s.intersections(
            &Vector3::new(5.0, -10.0, 0.0),
            &Vector3::new(0.0, 1.0, 0.0),
        );
        assert_eq!(ts.len(), 2);
        assert_relative_eq!(ts[0], 5.0, epsilon = 1e-8);
        assert_relative_eq!(ts[1], 15.0, epsilon = 1e-8);
    }

    #[test]
    fn test_torus_sign_and_intersections() {
        // z-axis torus, major radius 10, circular tube radius 2.
        let s = surface("t1 tz 0 0 0 10 2 2");
        assert_eq!(s.sign(&Vector3::new(10.0, 0.0, 0.0)), SurfaceSign::Back);
        assert_eq!(s.sign(&Vector3::ZERO), SurfaceSign::Front);
        let ts = s.intersections(
            &Vector3::new(-20.0, 0.0, 0.0),
            &Vector3::new(1.0, 0.0, 0.0),
        );
        assert_eq!(ts.len(), 4);
        assert_relative_eq!(ts[0], 8.0, epsilon = 1e-6);
        assert_relative_eq!(ts[1], 12.0, epsilon = 1e-6);
        assert_relative_eq!(ts[2], 28.0, epsilon = 1e-6);
        assert_relative_eq!(ts[3], 32.0, epsilon = 1e-6);
    }

    #[test]
    fn test_gq_cylinder_equivalent() {
        // x^2 + y^2 - 25 = 0 is a cz cylinder of radius 5.
        let s = surface("g1 gq 1 1 0 0 0 0 0 0 0 -25");
        assert_eq!(s.sign(&Vector3::new(1.0, 1.0, 40.0)), SurfaceSign::Back);
        let ts = s.intersections(&Vector3::new(-10.0, 0.0, 0.0), &Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(ts.len(), 2);
        assert_relative_eq!(ts[0], 5.0, epsilon = 1e-8);
        assert_relative_eq!(ts[1], 15.0, epsilon = 1e-8);
    }

    #[test]
    fn test_sq_sphere_equivalent() {
        // (x-1)^2 + y^2 + z^2 - 4 = 0
        let s = surface("q1 sq 1 1 1 0 0 0 -4 1 0 0");
        assert_eq!(s.sign(&Vector3::new(1.0, 0.0, 0.0)), SurfaceSign::Back);
        assert_eq!(s.sign(&Vector3::new(3.0, 0.0, 0.0)), SurfaceSign::On);
        assert_eq!(s.sign(&Vector3::new(5.0, 0.0, 0.0)), SurfaceSign::Front);
    }

    #[test]
    fn test_transformed_plane() {
        // Scenario: translate by (5,0,0) then rotate 90 degrees about z;
        // a py 0 plane must land on the world plane x = 0.
        let mut tr_map = TrMap::new();
        tr_map.insert(1, Matrix4::from_translation(Vector3::new(5.0, 0.0, 0.0)));
        tr_map.insert(2, Matrix4::from_axis_rotation_deg(2, 90.0));
        let s = surface_with_trs("s1 tr1 tr2 py 0", &tr_map);
        assert_eq!(s.sign(&Vector3::new(0.0, 7.0, 0.0)), SurfaceSign::On);
        assert_eq!(s.sign(&Vector3::new(0.0, -3.0, 2.0)), SurfaceSign::On);
        assert_ne!(s.sign(&Vector3::new(1.0, 0.0, 0.0)), SurfaceSign::On);
    }

    #[test]
    fn test_unknown_mnemonic() {
        let card = SurfaceCard::from_string("s1 zz 1 2 3").unwrap();
        assert!(Surface::from_card(&card, 1, &TrMap::new()).is_err());
    }

    #[test]
    fn test_wrong_parameter_count() {
        let card = SurfaceCard::from_string("s1 sph 0 0 0").unwrap();
        assert!(Surface::from_card(&card, 1, &TrMap::new()).is_err());
    }

    #[test]
    fn test_reverse_name() {
        assert_eq!(reverse_name("s1"), "-s1");
        assert_eq!(reverse_name("-s1"), "s1");
    }

    #[test]
    fn test_extract_surface_names() {
        let names = extract_surface_names("(-s1 s2):(s3:-s4) +s5");
        assert_eq!(names, vec!["-s1", "s2", "s3", "-s4", "s5"]);
    }
}
