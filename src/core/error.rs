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

//! Error types for geometry construction and rendering
//!
//! Construction-time problems (malformed cards, unknown macro bodies,
//! missing sections) surface here and abort the build. Tracing-time
//! conditions are a separate, recoverable kind: see
//! [`crate::core::tracing::TraceError`].

use thiserror::Error;

/// Errors reported at the library boundary.
///
/// Message text embeds the `file:line` position of the offending card when
/// one is available.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// Malformed or inconsistent input: empty required section, bad card,
    /// unknown macro mnemonic, wrong parameter count.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A condition that prevents the requested operation at run time.
    #[error("runtime error: {0}")]
    RuntimeError(String),

    /// A value outside its legal range (color components, indices).
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// I/O failure while dumping or exporting files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GeometryError>;

impl GeometryError {
    /// Invalid-argument error prefixed with an input position (`file:line`).
    pub fn invalid_at(pos: &str, message: impl AsRef<str>) -> Self {
        Self::InvalidArgument(format!("{} {}", pos, message.as_ref()))
    }
}
