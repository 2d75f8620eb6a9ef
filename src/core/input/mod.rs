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

//! Cleaned input card records and card grammars
//!
//! The lexer collaborator delivers each deck section as a list of
//! [`DataLine`] records: comments stripped, continuations joined, meta
//! expansions done, text lower-cased. This module parses the individual
//! card grammars on top of those records.

mod cell_card;
mod surface_card;
mod transform;

pub use cell_card::CellCard;
pub use surface_card::SurfaceCard;
pub use transform::{make_transform_map, matrix_from_values, TrMap};

/// One logical input line with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct DataLine {
    /// Originating file name.
    pub file: String,
    /// Line number in that file.
    pub line: usize,
    /// Cleaned card text.
    pub data: String,
    /// Whether the line is echoed back in verbose dumps.
    pub echo: bool,
}

impl DataLine {
    pub fn new(file: impl Into<String>, line: usize, data: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            data: data.into(),
            echo: true,
        }
    }

    /// `file:line` position string used in error messages.
    pub fn pos(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

impl std::fmt::Display for DataLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.echo {
            write!(f, "{}  {}", self.pos(), self.data)
        } else {
            write!(f, "NOECHO {}  {}", self.pos(), self.data)
        }
    }
}

/// Join a card list back into deck text, one card per line.
pub fn lines_to_string(lines: &[DataLine]) -> String {
    let mut out = String::new();
    for dl in lines {
        out.push_str(&dl.data);
        out.push('\n');
    }
    out
}
