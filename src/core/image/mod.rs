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

//! Image stack
//!
//! Colors, the cell-to-color palette, indexed pixel arrays, traced ray
//! data and the XPM bitmap that ties them together.

mod bitmap;
mod color;
mod material_color;
mod palette;
mod pixel_array;
mod ray_data;
mod xpm;

pub use bitmap::{BitmapImage, RayDir};
pub use color::Color;
pub use material_color::MaterialColorData;
pub use palette::{CellColorPalette, NOT_INDEX};
pub use pixel_array::PixelArray;
pub use ray_data::TracingRayData;
pub use xpm::XpmColor;
