// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

// Command-line driver for the VGA Nyancat cycle model.
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::Parser;
use nyancat_core::capture::save_png;
use nyancat_core::{AnalyzerSet, AnimationTables, SimConfig, Simulator, VideoMode};

#[derive(Parser)]
#[command(name = "vga-nyancat")]
#[command(version, about = "Clock-accurate VGA Nyancat simulator", long_about = None)]
struct Cli {
    /// Video mode (vga-640x480-72, vga-640x480-60, svga-800x600-60,
    /// svga-800x600-72, xga-1024x768-60)
    #[arg(short, long)]
    mode: Option<VideoMode>,

    /// Animation index table (hex dump, 12x64x64 entries)
    #[arg(long, requires = "palette")]
    frames: Option<PathBuf>,

    /// Palette table (hex dump, up to 16 entries)
    #[arg(long, requires = "frames")]
    palette: Option<PathBuf>,

    /// Enable the sync timing monitor
    #[arg(long)]
    timing_monitor: bool,

    /// Enable the sync glitch validator
    #[arg(long)]
    sync_validator: bool,

    /// Enable framebuffer write bounds checks
    #[arg(long)]
    coord_validator: bool,

    /// Enable frame-to-frame change tracking
    #[arg(long)]
    change_tracker: bool,

    /// Enable the clock utilization profile
    #[arg(long)]
    profiler: bool,

    /// Enable every analyzer
    #[arg(long)]
    all_checks: bool,

    /// Stop analyzing after this many clocks
    #[arg(long, value_name = "CLOCKS")]
    trace_clocks: Option<u64>,

    /// Simulate one frame, save it as PNG and exit
    #[arg(long, value_name = "PATH")]
    save_png: Option<PathBuf>,

    /// Frames to simulate in continuous mode
    #[arg(long, default_value_t = 1)]
    frames_to_run: u64,

    /// Run description in YAML; command-line flags take precedence
    #[cfg(feature = "serde-config")]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the analysis report as JSON
    #[cfg(feature = "serde-config")]
    #[arg(long, value_name = "PATH")]
    report_json: Option<PathBuf>,
}

impl Cli {
    fn analyzers(&self) -> AnalyzerSet {
        if self.all_checks {
            return AnalyzerSet::all();
        }
        let mut set = AnalyzerSet::empty();
        set.set(AnalyzerSet::TIMING_MONITOR, self.timing_monitor);
        set.set(AnalyzerSet::SYNC_VALIDATOR, self.sync_validator);
        set.set(AnalyzerSet::COORD_VALIDATOR, self.coord_validator);
        set.set(AnalyzerSet::CHANGE_TRACKER, self.change_tracker);
        set.set(AnalyzerSet::RENDER_PROFILER, self.profiler);
        set
    }

    fn sim_config(&self) -> anyhow::Result<SimConfig> {
        #[cfg(feature = "serde-config")]
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::default(),
        };
        #[cfg(not(feature = "serde-config"))]
        let mut config = SimConfig::default();

        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        config.analyzers |= self.analyzers();
        if self.trace_clocks.is_some() {
            config.analysis_limit = self.trace_clocks;
        }
        Ok(config)
    }

    fn tables(&self) -> anyhow::Result<AnimationTables> {
        match (&self.frames, &self.palette) {
            (Some(frames), Some(palette)) => AnimationTables::load(frames, palette)
                .with_context(|| format!("loading tables from {}", frames.display())),
            (None, None) => {
                log::info!("no table files given, using the procedural animation");
                Ok(AnimationTables::procedural())
            }
            _ => bail!("--frames and --palette must be given together"),
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();

    let config = cli.sim_config()?;
    let tables = cli.tables()?;
    let mut sim = Simulator::new(config, tables)?;

    if let Some(path) = &cli.save_png {
        sim.run_frame();
        save_png(sim.framebuffer(), path)?;
        println!("Saved frame to {}", path.display());
    } else {
        let target = cli.frames_to_run * sim.timing().clocks_per_frame();
        while sim.clocks() < target {
            let remaining = target - sim.clocks();
            sim.run_clocks(remaining.min(Simulator::CHUNK_CLOCKS));
            log::debug!(
                "{} clocks, animation frame {}",
                sim.clocks(),
                sim.design().frame_index()
            );
        }
    }

    let report = sim.report();
    if !sim.config().analyzers.is_empty() {
        print!("{report}");
    }

    #[cfg(feature = "serde-config")]
    if let Some(path) = &cli.report_json {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("wrote report to {}", path.display());
    }

    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
