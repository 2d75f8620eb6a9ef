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

//! Scan-line renderer
//!
//! Casts one tracing ray per image row (horizontal sweep) and per column
//! (vertical sweep), renders each sweep into an indexed pixel array and
//! merges the two with boundary priority. The double sweep is a heuristic
//! that also catches most double-defined regions: where the sweeps
//! disagree without a boundary involved, the conflict region is painted.
//!
//! Rays are distributed over a fixed-size worker pool in contiguous index
//! ranges; results are concatenated in submission order, so the output is
//! byte-identical for any thread count. Cancellation is cooperative
//! through a shared flag polled between rays; a cancelled render returns
//! an empty bitmap after all workers have finished their current ray.

mod pick;

pub use pick::{get_picked_cell, CameraView, PlaneInfo};

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use crate::core::geometry::cell::{BOUND_CELL_NAME, DOUBLE_CELL_NAME, UBOUND_CELL_NAME, UNDEF_CELL_NAME};
use crate::core::geometry::Geometry;
use crate::core::image::{BitmapImage, RayDir, TracingRayData};
use crate::core::math::{Point, Vector3};
use crate::core::tracing::TracingParticle;

/// Offset of every ray origin against the scan direction, preventing
/// alignment of the origin with an integer pixel boundary.
const SCAN_START_OFFSET: f64 = 0.00001;

/// Clamp a requested thread count to the hardware concurrency; 1 when it
/// cannot be determined, all of it for a request of 0.
pub fn guess_num_threads(requested: usize) -> usize {
    let hardware = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    if requested == 0 {
        hardware
    } else {
        requested.min(hardware)
    }
}

/// Trace one sweep of `num_targets` rays.
///
/// Ray `i` starts at `origin + (i + 0.5) * sub_pitch * sub_dir` (nudged
/// back along the scan direction) and flies along `scan_dir` for
/// `scan_length` cm. Returns the rays in index order; empty on
/// cancellation.
#[allow(clippy::too_many_arguments)]
fn trace_sweep(
    geometry: &Geometry,
    origin: &Point,
    scan_dir: &Vector3,
    scan_length: f64,
    sub_dir: &Vector3,
    sub_pitch: f64,
    num_targets: usize,
    num_threads: usize,
    cancel: Option<&AtomicBool>,
) -> Vec<TracingRayData> {
    let (cells, surfaces) = geometry.maps();

    let trace_one = |i: usize| -> TracingRayData {
        let ray_origin =
            *origin + (i as f64 + 0.5) * sub_pitch * *sub_dir - SCAN_START_OFFSET * *scan_dir;
        let mut particle = TracingParticle::new(
            cells,
            surfaces,
            ray_origin,
            *scan_dir,
            None,
            scan_length,
            false,
            false,
        )
        .expect("a guessed start cell cannot be invalid");
        particle.trace();
        TracingRayData::new(
            ray_origin,
            i,
            particle.passed_cells(),
            particle.track_lengths(),
            UNDEF_CELL_NAME,
            UBOUND_CELL_NAME,
            BOUND_CELL_NAME,
        )
    };

    let cancelled = || cancel.map(|c| c.load(Ordering::Relaxed)).unwrap_or(false);

    // One contiguous range per worker; per-worker vectors concatenated in
    // submission order keep ray i on scan line i regardless of timing.
    let num_threads = guess_num_threads(num_threads).max(1);
    let chunk = num_targets.div_ceil(num_threads).max(1);
    let ranges: Vec<(usize, usize)> = (0..num_targets)
        .step_by(chunk)
        .map(|start| (start, (start + chunk).min(num_targets)))
        .collect();

    let pool = match rayon::ThreadPoolBuilder::new().num_threads(num_threads).build() {
        Ok(pool) => pool,
        Err(e) => {
            log::warn!("worker pool unavailable ({}); tracing single-threaded", e);
            let mut rays = Vec::with_capacity(num_targets);
            for i in 0..num_targets {
                if cancelled() {
                    return Vec::new();
                }
                rays.push(trace_one(i));
            }
            return rays;
        }
    };

    let chunks: Vec<Vec<TracingRayData>> = pool.install(|| {
        ranges
            .par_iter()
            .map(|&(start, end)| {
                let mut out = Vec::with_capacity(end - start);
                for i in start..end {
                    if cancelled() {
                        break;
                    }
                    out.push(trace_one(i));
                }
                out
            })
            .collect()
    });

    if cancelled() {
        return Vec::new();
    }
    chunks.into_iter().flatten().collect()
}

/// Render the sectional image spanned by `h_dir` and `v_dir` from the
/// lower-left `origin`.
///
/// Two sweeps are traced (one ray per row, one per column), rendered
/// separately and merged: where they disagree, the undefined-boundary and
/// boundary regions take priority, any other disagreement paints the
/// double-definition region. An empty bitmap signals cancellation.
#[allow(clippy::too_many_arguments)]
pub fn sectional_image(
    geometry: &Geometry,
    origin: Point,
    h_dir: Vector3,
    v_dir: Vector3,
    h_reso: usize,
    v_reso: usize,
    num_threads: usize,
    verbose: bool,
    quiet: bool,
    cancel: Option<&AtomicBool>,
) -> BitmapImage {
    let verbose = verbose && !quiet;
    let h_len = h_dir.norm();
    let v_len = v_dir.norm();
    let h_unit = h_dir.normalized();
    let v_unit = v_dir.normalized();
    let dh = h_len / h_reso as f64;
    let dv = v_len / v_reso as f64;

    let started = Instant::now();

    let h_rays = trace_sweep(
        geometry, &origin, &h_unit, h_len, &v_unit, dv, h_reso, num_threads, cancel,
    );
    if h_rays.is_empty() {
        log::warn!("section tracing was canceled");
        return BitmapImage::empty();
    }
    let v_rays = trace_sweep(
        geometry, &origin, &v_unit, v_len, &h_unit, dh, v_reso, num_threads, cancel,
    );
    if v_rays.is_empty() {
        log::warn!("section tracing was canceled");
        return BitmapImage::empty();
    }

    log::debug!(
        "tracing done, time = {} msec",
        started.elapsed().as_millis()
    );

    let h_img = BitmapImage::from_rays(
        RayDir::Horizontal,
        h_reso,
        v_reso,
        h_len,
        v_len,
        &h_rays,
        geometry.palette(),
    );
    let v_img = BitmapImage::from_rays(
        RayDir::Vertical,
        h_reso,
        v_reso,
        h_len,
        v_len,
        &v_rays,
        geometry.palette(),
    );

    if verbose {
        log::debug!(
            "writing per-direction xpm images, resolutions = {} {}",
            h_reso,
            v_reso
        );
        if let Err(e) = h_img.export_to_xpm_file("ploth.xpm") {
            log::warn!("could not write ploth.xpm: {}", e);
        }
        if let Err(e) = v_img.export_to_xpm_file("plotv.xpm") {
            log::warn!("could not write plotv.xpm: {}", e);
        }
    }

    BitmapImage::merge(
        &h_img,
        &v_img,
        &[UBOUND_CELL_NAME, BOUND_CELL_NAME],
        DOUBLE_CELL_NAME,
    )
}
