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

//! Boolean polynomial over signed surface ids
//!
//! A cell body is a disjunction (`:`) of conjunctions (juxtaposition) of
//! signed surface references, with arbitrary parenthesisation. The parsed
//! tree evaluates against any predicate over signed ids.

use crate::core::error::{GeometryError, Result};

/// Parsed cell body expression.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPolynomial {
    /// One signed surface id.
    Literal(i32),
    /// Conjunction of sub-expressions.
    And(Vec<LogicalPolynomial>),
    /// Disjunction of sub-expressions. An empty disjunction is the
    /// always-false body used by the undefined-cell singleton.
    Or(Vec<LogicalPolynomial>),
}

impl LogicalPolynomial {
    /// The always-false body.
    pub fn empty() -> Self {
        LogicalPolynomial::Or(Vec::new())
    }

    /// Parse an equation string, resolving each surface name (with its
    /// optional `-` prefix) to a signed id through `resolve`.
    pub fn from_equation<F>(equation: &str, resolve: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<i32>,
    {
        let tokens = tokenize(equation);
        if tokens.is_empty() {
            return Err(GeometryError::InvalidArgument(format!(
                "empty cell polynomial \"{}\"",
                equation
            )));
        }
        let mut pos = 0;
        let poly = parse_or(&tokens, &mut pos, resolve)?;
        if pos != tokens.len() {
            return Err(GeometryError::InvalidArgument(format!(
                "unbalanced parentheses in polynomial \"{}\"",
                equation
            )));
        }
        Ok(poly)
    }

    /// Evaluate with a predicate over signed surface ids.
    pub fn eval<F>(&self, pred: &F) -> bool
    where
        F: Fn(i32) -> bool,
    {
        match self {
            LogicalPolynomial::Literal(id) => pred(*id),
            LogicalPolynomial::And(terms) => terms.iter().all(|t| t.eval(pred)),
            LogicalPolynomial::Or(terms) => terms.iter().any(|t| t.eval(pred)),
        }
    }

    /// All signed ids referenced, deduplicated, in first-appearance order.
    pub fn literals(&self) -> Vec<i32> {
        let mut out = Vec::new();
        self.collect_literals(&mut out);
        out
    }

    fn collect_literals(&self, out: &mut Vec<i32>) {
        match self {
            LogicalPolynomial::Literal(id) => {
                if !out.contains(id) {
                    out.push(*id);
                }
            }
            LogicalPolynomial::And(terms) | LogicalPolynomial::Or(terms) => {
                for t in terms {
                    t.collect_literals(out);
                }
            }
        }
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Open,
    Close,
    Union,
    Name(String),
}

fn tokenize(equation: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut name = String::new();
    for c in equation.chars() {
        match c {
            '(' | ')' | ':' | ' ' | '\t' => {
                if !name.is_empty() {
                    tokens.push(Token::Name(std::mem::take(&mut name)));
                }
                match c {
                    '(' => tokens.push(Token::Open),
                    ')' => tokens.push(Token::Close),
                    ':' => tokens.push(Token::Union),
                    _ => {}
                }
            }
            _ => name.push(c),
        }
    }
    if !name.is_empty() {
        tokens.push(Token::Name(name));
    }
    tokens
}

fn parse_or<F>(tokens: &[Token], pos: &mut usize, resolve: &F) -> Result<LogicalPolynomial>
where
    F: Fn(&str) -> Option<i32>,
{
    let mut terms = vec![parse_and(tokens, pos, resolve)?];
    while *pos < tokens.len() && tokens[*pos] == Token::Union {
        *pos += 1;
        terms.push(parse_and(tokens, pos, resolve)?);
    }
    if terms.len() == 1 {
        Ok(terms.pop().unwrap())
    } else {
        Ok(LogicalPolynomial::Or(terms))
    }
}

fn parse_and<F>(tokens: &[Token], pos: &mut usize, resolve: &F) -> Result<LogicalPolynomial>
where
    F: Fn(&str) -> Option<i32>,
{
    let mut terms = Vec::new();
    while *pos < tokens.len() {
        match &tokens[*pos] {
            Token::Open => {
                *pos += 1;
                let inner = parse_or(tokens, pos, resolve)?;
                if *pos >= tokens.len() || tokens[*pos] != Token::Close {
                    return Err(GeometryError::InvalidArgument(
                        "missing closing parenthesis in polynomial".into(),
                    ));
                }
                *pos += 1;
                terms.push(inner);
            }
            Token::Name(raw) => {
                let name = raw.strip_prefix('+').unwrap_or(raw);
                let id = resolve(name).ok_or_else(|| {
                    GeometryError::InvalidArgument(format!(
                        "polynomial references unknown surface \"{}\"",
                        name
                    ))
                })?;
                terms.push(LogicalPolynomial::Literal(id));
                *pos += 1;
            }
            Token::Union | Token::Close => break,
        }
    }
    match terms.len() {
        0 => Err(GeometryError::InvalidArgument(
            "empty conjunction in polynomial".into(),
        )),
        1 => Ok(terms.pop().unwrap()),
        _ => Ok(LogicalPolynomial::And(terms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// "s<n>" -> n, "-s<n>" -> -n
    fn resolve(name: &str) -> Option<i32> {
        let (sign, rest) = match name.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, name),
        };
        rest.strip_prefix('s')
            .and_then(|n| n.parse::<i32>().ok())
            .map(|n| sign * n)
    }

    #[test]
    fn test_single_literal() {
        let p = LogicalPolynomial::from_equation("-s1", &resolve).unwrap();
        assert_eq!(p, LogicalPolynomial::Literal(-1));
    }

    #[test]
    fn test_conjunction() {
        let p = LogicalPolynomial::from_equation("-s1 s2", &resolve).unwrap();
        assert!(p.eval(&|id| id == -1 || id == 2));
        assert!(!p.eval(&|id| id == -1));
        assert_eq!(p.literals(), vec![-1, 2]);
    }

    #[test]
    fn test_union_binds_looser_than_and() {
        // a b : c  ==  (a AND b) OR c
        let p = LogicalPolynomial::from_equation("s1 s2:s3", &resolve).unwrap();
        assert!(p.eval(&|id| id == 3));
        assert!(p.eval(&|id| id == 1 || id == 2));
        assert!(!p.eval(&|id| id == 1));
    }

    #[test]
    fn test_nested_parens() {
        let p =
            LogicalPolynomial::from_equation("(-s1 (s2:-s3)) : s4", &resolve).unwrap();
        assert!(p.eval(&|id| id == -1 || id == -3));
        assert!(p.eval(&|id| id == 4));
        assert!(!p.eval(&|id| id == -1));
        assert_eq!(p.literals(), vec![-1, 2, -3, 4]);
    }

    #[test]
    fn test_plus_prefix_accepted() {
        let p = LogicalPolynomial::from_equation("+s1", &resolve).unwrap();
        assert_eq!(p, LogicalPolynomial::Literal(1));
    }

    #[test]
    fn test_duplicate_literals_dedup() {
        let p = LogicalPolynomial::from_equation("s1:(s1 -s2)", &resolve).unwrap();
        assert_eq!(p.literals(), vec![1, -2]);
    }

    #[test]
    fn test_errors() {
        assert!(LogicalPolynomial::from_equation("", &resolve).is_err());
        assert!(LogicalPolynomial::from_equation("(s1", &resolve).is_err());
        assert!(LogicalPolynomial::from_equation("s1)", &resolve).is_err());
        assert!(LogicalPolynomial::from_equation("bogus", &resolve).is_err());
        assert!(LogicalPolynomial::from_equation("s1 :", &resolve).is_err());
    }

    #[test]
    fn test_empty_is_false() {
        assert!(!LogicalPolynomial::empty().eval(&|_| true));
    }
}
