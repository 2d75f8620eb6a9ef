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

//! Real roots of low-degree polynomials
//!
//! Quadratic, cubic (Cardano) and quartic (Ferrari) solvers returning real
//! roots in ascending order. Roots closer than [`EPS`] are coalesced into
//! one. The quartic path is used by torus intersection, where the raw
//! closed-form roots are polished with a few Newton steps before use.

use super::EPS;

/// Sort ascending and coalesce roots within [`EPS`].
fn sorted_unique(mut roots: Vec<f64>) -> Vec<f64> {
    roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
    roots.dedup_by(|a, b| (*a - *b).abs() < EPS);
    roots
}

/// Real roots of `a*t^2 + b*t + c = 0`.
///
/// A vanishing leading coefficient degrades gracefully to the linear case.
/// A tangent (double) root is returned once.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < EPS {
        if b.abs() < EPS {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vec::new();
    }
    let sq = disc.sqrt();
    // Citardauq form for the root opposite in sign to b avoids cancellation.
    let q = -0.5 * (b + b.signum() * sq);
    let mut roots = vec![q / a];
    if q.abs() > EPS {
        roots.push(c / q);
    } else {
        roots.push(-b / a - q / a);
    }
    sorted_unique(roots)
}

/// Real roots of `a*t^3 + b*t^2 + c*t + d = 0`.
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    if a.abs() < EPS {
        return solve_quadratic(b, c, d);
    }
    // Depressed form t = u - b/(3a):  u^3 + p*u + q = 0
    let b = b / a;
    let c = c / a;
    let d = d / a;
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let shift = -b / 3.0;

    let disc = 0.25 * q * q + p * p * p / 27.0;
    let roots = if disc > EPS {
        // One real root.
        let s = disc.sqrt();
        let u = cbrt(-0.5 * q + s) + cbrt(-0.5 * q - s);
        vec![u + shift]
    } else if disc < -EPS {
        // Three distinct real roots, trigonometric form.
        let m = 2.0 * (-p / 3.0).sqrt();
        let theta = (3.0 * q / (p * m)).clamp(-1.0, 1.0).acos() / 3.0;
        (0..3)
            .map(|k| m * (theta - 2.0 * std::f64::consts::PI * k as f64 / 3.0).cos() + shift)
            .collect()
    } else {
        // Multiple root.
        if q.abs() < EPS {
            vec![shift]
        } else {
            let u = cbrt(-0.5 * q);
            vec![2.0 * u + shift, -u + shift]
        }
    };
    sorted_unique(roots)
}

/// Real roots of `a*t^4 + b*t^3 + c*t^2 + d*t + e = 0`.
///
/// Ferrari's method via the resolvent cubic, followed by Newton polishing
/// of each candidate root against the original quartic.
pub fn solve_quartic(a: f64, b: f64, c: f64, d: f64, e: f64) -> Vec<f64> {
    if a.abs() < EPS {
        return solve_cubic(b, c, d, e);
    }
    let b = b / a;
    let c = c / a;
    let d = d / a;
    let e = e / a;

    // Depressed quartic u^4 + p*u^2 + q*u + r with t = u - b/4.
    let shift = -b / 4.0;
    let b2 = b * b;
    let p = c - 3.0 * b2 / 8.0;
    let q = d - b * c / 2.0 + b2 * b / 8.0;
    let r = e - b * d / 4.0 + b2 * c / 16.0 - 3.0 * b2 * b2 / 256.0;

    let mut roots: Vec<f64> = if q.abs() < EPS {
        // Biquadratic.
        solve_quadratic(1.0, p, r)
            .into_iter()
            .filter(|&v| v >= -EPS)
            .flat_map(|v| {
                let s = v.max(0.0).sqrt();
                [s + shift, -s + shift]
            })
            .collect()
    } else {
        // Resolvent cubic: z^3 - p*z^2 - 4*r*z + (4*p*r - q^2) = 0
        let resolvent = solve_cubic(1.0, -p, -4.0 * r, 4.0 * p * r - q * q);
        let z = match resolvent.last() {
            Some(&z) => z,
            None => return Vec::new(),
        };
        let w2 = z - p;
        if w2 < 0.0 {
            return Vec::new();
        }
        let w = w2.sqrt();
        let mut out = Vec::with_capacity(4);
        if w < EPS {
            // z == p: depressed quartic factors as (u^2 + z/2)^2 - ...
            out.extend(solve_quadratic(1.0, 0.0, z / 2.0));
        } else {
            let t1 = z / 2.0 - q / (2.0 * w);
            let t2 = z / 2.0 + q / (2.0 * w);
            out.extend(solve_quadratic(1.0, w, t1));
            out.extend(solve_quadratic(1.0, -w, t2));
        }
        out.into_iter().map(|u| u + shift).collect()
    };

    // Closed-form quartic roots lose precision on near-degenerate input;
    // a couple of Newton steps restores it.
    for t in roots.iter_mut() {
        *t = newton_polish(*t, b, c, d, e);
    }
    sorted_unique(roots)
}

fn newton_polish(mut t: f64, b: f64, c: f64, d: f64, e: f64) -> f64 {
    for _ in 0..3 {
        let f = (((t + b) * t + c) * t + d) * t + e;
        let df = ((4.0 * t + 3.0 * b) * t + 2.0 * c) * t + d;
        if df.abs() < EPS {
            break;
        }
        let step = f / df;
        t -= step;
        if step.abs() < 1e-14 {
            break;
        }
    }
    t
}

fn cbrt(v: f64) -> f64 {
    v.signum() * v.abs().powf(1.0 / 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quadratic_two_roots() {
        let r = solve_quadratic(1.0, -3.0, 2.0);
        assert_eq!(r.len(), 2);
        assert_relative_eq!(r[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(r[1], 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_quadratic_tangent_coalesces() {
        let r = solve_quadratic(1.0, -2.0, 1.0);
        assert_eq!(r.len(), 1);
        assert_relative_eq!(r[0], 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_quadratic_no_real_roots() {
        assert!(solve_quadratic(1.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn test_linear_degenerate() {
        let r = solve_quadratic(0.0, 2.0, -4.0);
        assert_eq!(r, vec![2.0]);
    }

    #[test]
    fn test_cubic_three_roots() {
        // (t-1)(t-2)(t-3)
        let r = solve_cubic(1.0, -6.0, 11.0, -6.0);
        assert_eq!(r.len(), 3);
        assert_relative_eq!(r[0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(r[1], 2.0, epsilon = 1e-8);
        assert_relative_eq!(r[2], 3.0, epsilon = 1e-8);
    }

    #[test]
    fn test_cubic_single_root() {
        // t^3 + t - 2 = (t-1)(t^2+t+2)
        let r = solve_cubic(1.0, 0.0, 1.0, -2.0);
        assert_eq!(r.len(), 1);
        assert_relative_eq!(r[0], 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_quartic_four_roots() {
        // (t+2)(t+1)(t-1)(t-2) = t^4 - 5t^2 + 4
        let r = solve_quartic(1.0, 0.0, -5.0, 0.0, 4.0);
        assert_eq!(r.len(), 4);
        for (got, want) in r.iter().zip([-2.0, -1.0, 1.0, 2.0]) {
            assert_relative_eq!(*got, want, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_quartic_two_roots() {
        // (t^2+1)(t-1)(t-3) = t^4 - 4t^3 + 4t^2 - 4t + 3
        let r = solve_quartic(1.0, -4.0, 4.0, -4.0, 3.0);
        assert_eq!(r.len(), 2);
        assert_relative_eq!(r[0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(r[1], 3.0, epsilon = 1e-8);
    }

    #[test]
    fn test_quartic_no_roots() {
        // t^4 + 1
        assert!(solve_quartic(1.0, 0.0, 0.0, 0.0, 1.0).is_empty());
    }
}
