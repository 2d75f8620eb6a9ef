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

//! Macro-body expander
//!
//! Rewrites composite body keywords (BOX, RCC, RHP, ...) into equivalent
//! sets of primitive surfaces, editing both the surface-card and the
//! cell-card streams in place.
//!
//! Every macro generates facets named `<name>.1 .. <name>.k`, built so the
//! body interior is the alternating conjunction `-M.1 M.2 -M.3 ...` (odd
//! facets on their negative side, even facets positive). A `-M` reference
//! in a cell card rewrites to that conjunction, `+M` to its De Morgan
//! complement. The MARS-CG sector bodies `tor` and `qua` have genuinely
//! multi-piece interiors and override the replacement strings.

mod axsym;
mod planar;
mod revolve;
mod sector;

use std::collections::HashMap;

use crate::core::error::{GeometryError, Result};
use crate::core::input::{CellCard, DataLine, SurfaceCard, TrMap};
use crate::core::math::Vector3;

use super::surface::{extract_surface_names, reverse_name};

/// One macro-body kind: expansion into primitive cards plus the cell-card
/// replacement strings.
pub(crate) trait MacroBody: Sync {
    /// Macro mnemonic (`box`, `rcc`, ...).
    fn mnemonic(&self) -> &'static str;

    /// Facet card bodies (`<mnemonic> <params...>`, without the surface
    /// name) for one macro card. Order defines the facet numbering.
    fn expand(&self, card: &SurfaceCard) -> Result<Vec<String>>;

    /// `(minus, plus)` replacement strings for a body named `name` with
    /// `num_surfaces` facets.
    fn replacement(&self, name: &str, num_surfaces: usize) -> (String, String) {
        alternating_replacement(name, num_surfaces)
    }
}

/// Look up a macro body by mnemonic. `hex` is an alias of `rhp`.
fn find_macro(symbol: &str) -> Option<&'static dyn MacroBody> {
    static ARB: planar::Arb = planar::Arb;
    static BOX: planar::BoxBody = planar::BoxBody;
    static RPP: planar::Rpp = planar::Rpp;
    static WED: planar::Wed = planar::Wed;
    static RHP: planar::Rhp = planar::Rhp;
    static SPH: revolve::Sph = revolve::Sph;
    static RCC: revolve::Rcc = revolve::Rcc;
    static REC: revolve::Rec = revolve::Rec;
    static TRC: revolve::Trc = revolve::Trc;
    static ELL: revolve::Ell = revolve::Ell;
    static TOR: sector::Tor = sector::Tor;
    static QUA: sector::Qua = sector::Qua;
    static AX_X: axsym::AxSym = axsym::AxSym { axis: 0 };
    static AX_Y: axsym::AxSym = axsym::AxSym { axis: 1 };
    static AX_Z: axsym::AxSym = axsym::AxSym { axis: 2 };

    Some(match symbol {
        "arb" => &ARB,
        "box" => &BOX,
        "rpp" => &RPP,
        "wed" => &WED,
        "rhp" | "hex" => &RHP,
        "sph" => &SPH,
        "rcc" => &RCC,
        "rec" => &REC,
        "trc" => &TRC,
        "ell" => &ELL,
        "tor" => &TOR,
        "qua" => &QUA,
        "x" => &AX_X,
        "y" => &AX_Y,
        "z" => &AX_Z,
        _ => return None,
    })
}

/// True when the mnemonic names a macro body.
pub fn is_macro_body(symbol: &str) -> bool {
    find_macro(symbol).is_some()
}

/// Expand every macro body in `surf_lines` and rewrite the references in
/// `cell_lines`.
///
/// Surface expansion is order-independent: each macro card is replaced by
/// its facet cards in place, keeping the original TR tokens. Pass two then
/// rewrites `-M`/`+M` tokens in every cell polynomial.
pub fn expand_macro_bodies(
    tr_map: &TrMap,
    surf_lines: &mut Vec<DataLine>,
    cell_lines: &mut Vec<DataLine>,
) -> Result<()> {
    // name -> (mnemonic, facet count), both sides registered.
    let mut macro_surfaces: HashMap<String, (String, usize)> = HashMap::new();

    let mut expanded: Vec<DataLine> = Vec::with_capacity(surf_lines.len());
    for dl in surf_lines.iter() {
        let card = SurfaceCard::from_string(&dl.data).map_err(|e| {
            GeometryError::invalid_at(&dl.pos(), format!("while expanding macro body, {}", e))
        })?;
        let body = match find_macro(&card.symbol) {
            Some(body) => body,
            None => {
                expanded.push(dl.clone());
                continue;
            }
        };
        for tr in &card.trs {
            if !tr_map.contains_key(tr) {
                return Err(GeometryError::invalid_at(
                    &dl.pos(),
                    format!("macro body {} references undefined transform tr{}", card.name, tr),
                ));
            }
        }
        let facets = body
            .expand(&card)
            .map_err(|e| {
                GeometryError::invalid_at(&dl.pos(), format!("while expanding macro body, {}", e))
            })?;
        let trs: String = card.trs.iter().map(|n| format!(" tr{}", n)).collect();
        for (i, facet) in facets.iter().enumerate() {
            let text = format!("{}.{}{} {}", card.name, i + 1, trs, facet);
            expanded.push(DataLine::new(dl.file.clone(), dl.line, text));
        }
        macro_surfaces.insert(card.name.clone(), (card.symbol.clone(), facets.len()));
        macro_surfaces.insert(reverse_name(&card.name), (card.symbol.clone(), facets.len()));
    }
    *surf_lines = expanded;

    // Rewrite macro references in the cell polynomials.
    for dl in cell_lines.iter_mut() {
        let mut card = CellCard::from_string(&dl.data).map_err(|e| {
            GeometryError::invalid_at(&dl.pos(), format!("while reading cell card, {}", e))
        })?;
        let mut rewritten = false;
        for name in extract_surface_names(&card.equation) {
            if let Some((symbol, count)) = macro_surfaces.get(&name) {
                let base = name.strip_prefix('-').unwrap_or(&name).to_string();
                let body = find_macro(symbol).unwrap();
                let (minus, plus) = body.replacement(&base, *count);
                card.equation = replace_body_tokens(&card.equation, &base, &minus, &plus);
                rewritten = true;
            }
        }
        if rewritten {
            dl.data = card.to_input_string();
        }
    }
    Ok(())
}

/// Replace every `-name` token in `equation` by `minus` and every
/// `name`/`+name` token by `plus`, leaving everything else untouched.
fn replace_body_tokens(equation: &str, name: &str, minus: &str, plus: &str) -> String {
    let mut out = String::with_capacity(equation.len());
    let mut token = String::new();
    let flush = |token: &mut String, out: &mut String| {
        if token.is_empty() {
            return;
        }
        let bare = token.strip_prefix('+').unwrap_or(token);
        if bare == name {
            out.push_str(plus);
        } else if let Some(stripped) = bare.strip_prefix('-') {
            if stripped == name {
                out.push_str(minus);
            } else {
                out.push_str(token);
            }
        } else {
            out.push_str(token);
        }
        token.clear();
    };
    for c in equation.chars() {
        match c {
            '(' | ')' | ':' | ' ' | '\t' => {
                flush(&mut token, &mut out);
                out.push(c);
            }
            _ => token.push(c),
        }
    }
    flush(&mut token, &mut out);
    out
}

/// The uniform replacement pattern: interior is the alternating
/// conjunction, exterior its De Morgan complement.
fn alternating_replacement(name: &str, num_surfaces: usize) -> (String, String) {
    let mut minus_terms = Vec::with_capacity(num_surfaces);
    let mut plus_terms = Vec::with_capacity(num_surfaces);
    for i in 1..=num_surfaces {
        if i % 2 == 1 {
            minus_terms.push(format!("-{}.{}", name, i));
            plus_terms.push(format!("{}.{}", name, i));
        } else {
            minus_terms.push(format!("{}.{}", name, i));
            plus_terms.push(format!("-{}.{}", name, i));
        }
    }
    (
        format!("({})", minus_terms.join(" ")),
        format!("({})", plus_terms.join(":")),
    )
}

/// Parameter-count guard shared by the macro kinds.
pub(crate) fn check_param_length(
    params: &[f64],
    valid: &[usize],
    mnemonic: &str,
) -> Result<()> {
    if valid.contains(&params.len()) {
        Ok(())
    } else {
        Err(GeometryError::InvalidArgument(format!(
            "macro body \"{}\" takes {:?} parameters, got {}",
            mnemonic,
            valid,
            params.len()
        )))
    }
}

/// `p nx ny nz d` card body for the plane with normal `n` through `point`.
pub(crate) fn plane_through(n: &Vector3, point: &Vector3) -> String {
    format!("p {} {} {} {}", fmt(n.x), fmt(n.y), fmt(n.z), fmt(n.dot(point)))
}

/// `gq ...` card body for `q^T A3 q + g.q + k` with symmetric `a3`.
pub(crate) fn quadric_card(a3: &[[f64; 3]; 3], g: &Vector3, k: f64) -> String {
    format!(
        "gq {} {} {} {} {} {} {} {} {} {}",
        fmt(a3[0][0]),
        fmt(a3[1][1]),
        fmt(a3[2][2]),
        fmt(a3[0][1] + a3[1][0]),
        fmt(a3[1][2] + a3[2][1]),
        fmt(a3[0][2] + a3[2][0]),
        fmt(g.x),
        fmt(g.y),
        fmt(g.z),
        fmt(k)
    )
}

/// Symmetric rank-1 update helper: `m += scale * v v^T`.
pub(crate) fn add_outer(m: &mut [[f64; 3]; 3], v: &Vector3, scale: f64) {
    let a = [v.x, v.y, v.z];
    for (i, row) in m.iter_mut().enumerate() {
        for (j, slot) in row.iter_mut().enumerate() {
            *slot += scale * a[i] * a[j];
        }
    }
}

/// `m * v` for the 3x3 helper matrices.
pub(crate) fn mat_vec(m: &[[f64; 3]; 3], v: &Vector3) -> Vector3 {
    Vector3::new(
        m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
        m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
        m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
    )
}

pub(crate) fn fmt(v: f64) -> String {
    // Display for f64 is the shortest exactly-round-tripping form.
    format!("{}", v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<DataLine> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| DataLine::new("t", i + 1, *t))
            .collect()
    }

    #[test]
    fn test_box_expansion_scenario() {
        let mut surf = lines(&["b1 box -10 -10 -10 20 0 0 0 20 0 0 0 20"]);
        let mut cells = lines(&["c1 0 -b1"]);
        expand_macro_bodies(&TrMap::new(), &mut surf, &mut cells).unwrap();

        assert_eq!(surf.len(), 6);
        for (i, dl) in surf.iter().enumerate() {
            assert!(dl.data.starts_with(&format!("b1.{} ", i + 1)), "{}", dl.data);
        }
        assert_eq!(
            cells[0].data,
            "c1 0 (-b1.1 b1.2 -b1.3 b1.4 -b1.5 b1.6)"
        );
    }

    #[test]
    fn test_plus_reference_demorgan() {
        let mut surf = lines(&["b1 box -10 -10 -10 20 0 0 0 20 0 0 0 20"]);
        let mut cells = lines(&["c99 0 b1"]);
        expand_macro_bodies(&TrMap::new(), &mut surf, &mut cells).unwrap();
        assert_eq!(
            cells[0].data,
            "c99 0 (b1.1:-b1.2:b1.3:-b1.4:b1.5:-b1.6)"
        );
    }

    #[test]
    fn test_non_macro_cards_untouched() {
        let mut surf = lines(&["s1 sph 0 0 0 5", "p1 px 3"]);
        let mut cells = lines(&["c1 0 -s1 p1"]);
        let before_cells = cells.clone();
        expand_macro_bodies(&TrMap::new(), &mut surf, &mut cells).unwrap();
        assert_eq!(surf.len(), 2);
        assert_eq!(cells, before_cells);
    }

    #[test]
    fn test_wrong_parameter_count_fails_fast() {
        let mut surf = lines(&["b1 box 1 2 3"]);
        let mut cells = lines(&["c1 0 -b1"]);
        let err = expand_macro_bodies(&TrMap::new(), &mut surf, &mut cells).unwrap_err();
        assert!(err.to_string().contains("t:1"));
    }

    #[test]
    fn test_unknown_tr_fails_fast() {
        let mut surf = lines(&["b1 tr7 rpp -1 1 -1 1 -1 1"]);
        let mut cells = lines(&["c1 0 -b1"]);
        assert!(expand_macro_bodies(&TrMap::new(), &mut surf, &mut cells).is_err());
    }

    #[test]
    fn test_tr_tokens_propagate_to_facets() {
        let mut tr_map = TrMap::new();
        tr_map.insert(3, crate::core::math::Matrix4::identity());
        let mut surf = lines(&["b1 tr3 rpp -1 1 -1 1 -1 1"]);
        let mut cells = lines(&["c1 0 -b1"]);
        expand_macro_bodies(&tr_map, &mut surf, &mut cells).unwrap();
        for dl in &surf {
            assert!(dl.data.contains(" tr3 "), "{}", dl.data);
        }
    }

    #[test]
    fn test_replace_body_tokens_is_token_exact() {
        // b1 must not be rewritten inside the unrelated name b11.
        let out = replace_body_tokens("-b1 b11:(b1)", "b1", "(MIN)", "(PLUS)");
        assert_eq!(out, "(MIN) b11:((PLUS))");
    }
}
