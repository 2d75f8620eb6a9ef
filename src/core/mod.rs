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

//! Core geometry components
//!
//! Everything needed to turn cleaned deck cards into a traced, rendered
//! sectional image: math primitives, card grammars, the CSG model, the
//! particle walker, the image stack and the parallel renderer.

pub mod error;
pub mod geometry;
pub mod image;
pub mod input;
pub mod math;
pub mod render;
pub mod tracing;
