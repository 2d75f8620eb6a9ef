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

//! Batch sectional renderer.
//!
//! Reads a pre-cleaned sectioned deck (sections marked `[surface]`,
//! `[cell]`, `[transform]`, `[matcolor]`, one card per line), builds the
//! geometry and writes one XPM section image.

use std::collections::HashMap;
use std::process::ExitCode;

use clap::Parser;

use raycell::core::geometry::Geometry;
use raycell::core::image::MaterialColorData;
use raycell::core::input::{make_transform_map, DataLine};
use raycell::core::math::Vector3;

#[derive(Parser)]
#[command(name = "raycell", about = "Sectional images of CSG transport decks")]
struct Args {
    /// Pre-cleaned sectioned deck file.
    input: String,

    /// Output XPM file.
    #[arg(short, long, default_value = "section.xpm")]
    output: String,

    /// Image origin (lower-left corner), cm.
    #[arg(long, value_name = "X,Y,Z", default_value = "-50,-50,0")]
    origin: String,

    /// Horizontal axis vector; its length is the image width in cm.
    #[arg(long, value_name = "X,Y,Z", default_value = "100,0,0")]
    hdir: String,

    /// Vertical axis vector; its length is the image height in cm.
    #[arg(long, value_name = "X,Y,Z", default_value = "0,100,0")]
    vdir: String,

    /// Resolution as WIDTHxHEIGHT pixels.
    #[arg(short, long, default_value = "500x500")]
    resolution: String,

    /// Worker threads; 0 uses all hardware threads.
    #[arg(short = 'j', long, default_value_t = 0)]
    threads: usize,

    /// JSON color-map config.
    #[arg(long)]
    config: Option<String>,

    /// Dump the post-expansion deck and per-direction images.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress progress output.
    #[arg(short, long)]
    quiet: bool,
}

fn parse_vector(text: &str) -> Result<Vector3, String> {
    let parts: Vec<f64> = text
        .split(',')
        .map(|t| t.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("bad vector \"{}\": {}", text, e))?;
    if parts.len() != 3 {
        return Err(format!("vector \"{}\" needs 3 components", text));
    }
    Ok(Vector3::new(parts[0], parts[1], parts[2]))
}

fn parse_resolution(text: &str) -> Result<(usize, usize), String> {
    let (w, h) = text
        .split_once('x')
        .ok_or_else(|| format!("bad resolution \"{}\"", text))?;
    let w = w.parse().map_err(|_| format!("bad resolution \"{}\"", text))?;
    let h = h.parse().map_err(|_| format!("bad resolution \"{}\"", text))?;
    Ok((w, h))
}

/// Split a sectioned deck into per-section card lists.
fn read_sections(path: &str) -> std::io::Result<HashMap<String, Vec<DataLine>>> {
    let content = std::fs::read_to_string(path)?;
    let mut sections: HashMap<String, Vec<DataLine>> = HashMap::new();
    let mut current: Option<String> = None;
    for (i, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            current = Some(line[1..line.len() - 1].to_lowercase());
            continue;
        }
        if let Some(section) = &current {
            sections
                .entry(section.clone())
                .or_default()
                .push(DataLine::new(path, i + 1, line.to_lowercase()));
        } else {
            log::warn!("{}:{} card before any section header ignored", path, i + 1);
        }
    }
    Ok(sections)
}

fn run(args: &Args) -> Result<(), String> {
    let origin = parse_vector(&args.origin)?;
    let h_dir = parse_vector(&args.hdir)?;
    let v_dir = parse_vector(&args.vdir)?;
    let (h_reso, v_reso) = parse_resolution(&args.resolution)?;

    let mut sections = read_sections(&args.input).map_err(|e| e.to_string())?;
    let surface_cards = sections.remove("surface").unwrap_or_default();
    let cell_cards = sections.remove("cell").unwrap_or_default();
    let transform_cards = sections.remove("transform").unwrap_or_default();
    let matcolor_cards = sections.remove("matcolor").unwrap_or_default();

    let tr_map = make_transform_map(&transform_cards).map_err(|e| e.to_string())?;
    let mut geometry = Geometry::new(
        tr_map,
        surface_cards,
        cell_cards,
        &HashMap::new(),
        args.verbose,
    )
    .map_err(|e| e.to_string())?;

    // Color overrides: deck block first, JSON config on top.
    let mut color_map = MaterialColorData::from_cards(&matcolor_cards).map_err(|e| e.to_string())?;
    if let Some(config) = &args.config {
        let json = std::fs::read_to_string(config).map_err(|e| e.to_string())?;
        color_map.extend(MaterialColorData::from_json_str(&json).map_err(|e| e.to_string())?);
    }
    if !color_map.is_empty() {
        geometry
            .create_modified_palette(&color_map)
            .map_err(|e| e.to_string())?;
    }

    let image = geometry.sectional_image(
        origin,
        h_dir,
        v_dir,
        h_reso,
        v_reso,
        args.threads,
        args.verbose,
        args.quiet,
        None,
    );
    if image.is_empty() {
        return Err("rendering produced an empty image".into());
    }
    image.export_to_xpm_file(&args.output).map_err(|e| e.to_string())?;
    if !args.quiet {
        log::info!(
            "wrote {} ({}x{} pixels, {}x{} cm)",
            args.output,
            image.h_resolution(),
            image.v_resolution(),
            image.width_cm(),
            image.height_cm()
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}
