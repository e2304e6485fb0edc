// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Clock-stepped simulation driver.
//!
//! Owns the design, the host framebuffer and the enabled analyzers. Each
//! step advances the design by one clock, hands the resulting signal tap to
//! the analyzers in a fixed order and then stores the pixel at the raster
//! position reconstructed from the sync lines.

use crate::address::DisplayLayout;
use crate::analysis::{
    AnalysisReport, Analyzer, AnalyzerSet, ChangeTracker, CoordinateValidator, RenderProfiler,
    SignalObserver, SyncValidator, TimingMonitor,
};
use crate::core::{SignalTap, TimingConfig, VideoMode};
use crate::error::{ConfigError, Result};
use crate::framebuffer::{BYTES_PER_PIXEL, Framebuffer};
use crate::nyancat::{DesignConfig, VgaNyancat};
use crate::sequencer::DEFAULT_FRAME_PERIOD;
use crate::tables::AnimationTables;

/// Everything needed to set up a run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-config", serde(default))]
pub struct SimConfig {
    pub mode: VideoMode,
    pub scale: u16,
    /// Clocks per animation frame.
    pub frame_period: u32,
    pub analyzers: AnalyzerSet,
    /// Stop feeding analyzers after this many clocks.
    pub analysis_limit: Option<u64>,
}

impl SimConfig {
    pub fn new(mode: VideoMode) -> Self {
        Self {
            mode,
            scale: DisplayLayout::DEFAULT_SCALE,
            frame_period: DEFAULT_FRAME_PERIOD,
            analyzers: AnalyzerSet::empty(),
            analysis_limit: None,
        }
    }

    /// Resolve the design parameters for this run.
    pub fn design(&self) -> std::result::Result<DesignConfig, ConfigError> {
        DesignConfig::new(self.mode, self.scale, self.frame_period)
    }

    #[cfg(feature = "serde-config")]
    pub fn from_yaml_str(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Load a run description from a YAML file.
    #[cfg(feature = "serde-config")]
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            crate::error::SimError::ConfigRead {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::from_yaml_str(&text).map_err(|source| crate::error::SimError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new(VideoMode::default())
    }
}

/// Raster position recovered from the sync stream. Negative coordinates are
/// blanking; `row_base` is the framebuffer offset of the current row while
/// it is an active row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterPosition {
    pub hpos: i32,
    pub vpos: i32,
    pub row_base: Option<usize>,
}

impl RasterPosition {
    /// Position of counter state `(0, 0)`.
    fn origin(timing: &TimingConfig) -> Self {
        Self {
            hpos: -i32::from(timing.h_blank()),
            vpos: -i32::from(timing.v_blank()),
            row_base: None,
        }
    }
}

pub struct Simulator {
    config: SimConfig,
    timing: TimingConfig,
    design: VgaNyancat,
    framebuffer: Framebuffer,
    analyzers: Vec<Analyzer>,
    coordinates: Option<CoordinateValidator>,
    position: RasterPosition,
    clocks: u64,
    clocks_analyzed: u64,
}

impl Simulator {
    /// Clocks `reset_n` is held low after construction.
    pub const RESET_CLOCKS: u32 = 8;

    /// Clocks per step of continuous mode.
    pub const CHUNK_CLOCKS: u64 = 50_000;

    pub fn new(config: SimConfig, tables: AnimationTables) -> Result<Self> {
        let design_config = config.design()?;
        let timing = design_config.timing;
        let design = VgaNyancat::new(design_config, tables)?;

        let set = config.analyzers;
        let mut analyzers = Vec::new();
        if set.contains(AnalyzerSet::TIMING_MONITOR) {
            analyzers.push(Analyzer::Timing(TimingMonitor::new(timing)));
        }
        if set.contains(AnalyzerSet::SYNC_VALIDATOR) {
            analyzers.push(Analyzer::Sync(SyncValidator::new(timing)));
        }
        if set.contains(AnalyzerSet::RENDER_PROFILER) {
            analyzers.push(Analyzer::Profiler(RenderProfiler::new(
                timing,
                design_config.layout,
            )));
        }
        if set.contains(AnalyzerSet::CHANGE_TRACKER) {
            analyzers.push(Analyzer::Changes(ChangeTracker::new(
                usize::from(timing.h_active),
                usize::from(timing.v_active),
            )));
        }
        let coordinates = set
            .contains(AnalyzerSet::COORD_VALIDATOR)
            .then(|| CoordinateValidator::new(timing));

        log::info!(
            "{} ({}x{} total), scale {} at offset ({}, {}), analyzers: {:?}",
            config.mode,
            timing.h_total(),
            timing.v_total(),
            design_config.layout.scale,
            design_config.layout.offset_x,
            design_config.layout.offset_y,
            set
        );

        let mut sim = Self {
            config,
            timing,
            design,
            framebuffer: Framebuffer::new(
                usize::from(timing.h_active),
                usize::from(timing.v_active),
            ),
            analyzers,
            coordinates,
            position: RasterPosition::origin(&timing),
            clocks: 0,
            clocks_analyzed: 0,
        };
        sim.reset();
        Ok(sim)
    }

    /// Pulse `reset_n` low for [`Self::RESET_CLOCKS`] clocks and release it.
    /// Analyzers never see the reset clocks. Their counts are kept but any
    /// line or frame cut short by the reset is dropped.
    pub fn reset(&mut self) {
        self.design.set_reset_n(false);
        for _ in 0..Self::RESET_CLOCKS {
            self.design.tick();
        }
        self.design.set_reset_n(true);
        self.position = RasterPosition::origin(&self.timing);
        for analyzer in &mut self.analyzers {
            analyzer.rearm();
        }
        log::debug!("reset released after {} clocks", Self::RESET_CLOCKS);
    }

    /// Advance one clock. The tap is stamped with [`Self::clocks`], which
    /// keeps running across resets.
    pub fn step(&mut self) -> SignalTap {
        let mut tap = self.design.tick();
        self.clocks += 1;
        tap.clock = self.clocks;

        let analyzing = self
            .config
            .analysis_limit
            .is_none_or(|limit| self.clocks_analyzed < limit);
        if analyzing {
            self.clocks_analyzed += 1;
            for analyzer in &mut self.analyzers {
                analyzer.observe(&tap, &self.framebuffer);
            }
            if self.config.analysis_limit == Some(self.clocks_analyzed) {
                log::info!("analysis limit reached after {} clocks", self.clocks_analyzed);
            }
        }

        self.track_position(&tap);
        self.store_pixel(tap.rrggbb, analyzing);
        tap
    }

    /// Advance the reconstructed position to the clock just produced.
    fn track_position(&mut self, tap: &SignalTap) {
        let t = &self.timing;
        let pos = &mut self.position;

        pos.hpos += 1;
        if pos.hpos >= i32::from(t.h_active) {
            pos.hpos = -i32::from(t.h_blank());
            pos.vpos += 1;
            if pos.vpos >= i32::from(t.v_active) {
                pos.vpos = -i32::from(t.v_blank());
            }
            pos.row_base = usize::try_from(pos.vpos)
                .ok()
                .map(|row| row * usize::from(t.h_active) * BYTES_PER_PIXEL);
        }

        // both syncs low: inside the vertical sync pulse, on a horizontal sync clock
        if !tap.hsync && !tap.vsync {
            pos.hpos = -i32::from(t.h_back_porch) - 1;
            pos.vpos = -i32::from(t.v_back_porch) - 1;
            pos.row_base = None;
        }
    }

    fn store_pixel(&mut self, rrggbb: u8, analyzing: bool) {
        let RasterPosition {
            hpos,
            vpos,
            row_base,
        } = self.position;
        let Some(row_base) = row_base else {
            return;
        };
        if !(0..i32::from(self.timing.h_active)).contains(&hpos) {
            return;
        }
        if analyzing {
            if let Some(validator) = self.coordinates.as_mut() {
                if !validator.check(hpos, vpos, row_base) {
                    return;
                }
            }
        }
        self.framebuffer
            .write_at(row_base + hpos as usize * BYTES_PER_PIXEL, rrggbb);
    }

    pub fn run_clocks(&mut self, clocks: u64) {
        for _ in 0..clocks {
            self.step();
        }
    }

    /// Run exactly one frame's worth of clocks.
    pub fn run_frame(&mut self) {
        self.run_clocks(self.timing.clocks_per_frame());
    }

    /// One slice of continuous mode.
    pub fn run_chunk(&mut self) {
        self.run_clocks(Self::CHUNK_CLOCKS);
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn design(&self) -> &VgaNyancat {
        &self.design
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn position(&self) -> RasterPosition {
        self.position
    }

    /// Clocks simulated since construction, reset clocks excluded.
    pub fn clocks(&self) -> u64 {
        self.clocks
    }

    pub fn timing_monitor(&self) -> Option<&TimingMonitor> {
        self.analyzers.iter().find_map(|a| match a {
            Analyzer::Timing(m) => Some(m),
            _ => None,
        })
    }

    pub fn sync_validator(&self) -> Option<&SyncValidator> {
        self.analyzers.iter().find_map(|a| match a {
            Analyzer::Sync(v) => Some(v),
            _ => None,
        })
    }

    pub fn profiler(&self) -> Option<&RenderProfiler> {
        self.analyzers.iter().find_map(|a| match a {
            Analyzer::Profiler(p) => Some(p),
            _ => None,
        })
    }

    pub fn change_tracker(&self) -> Option<&ChangeTracker> {
        self.analyzers.iter().find_map(|a| match a {
            Analyzer::Changes(c) => Some(c),
            _ => None,
        })
    }

    pub fn coordinate_validator(&self) -> Option<&CoordinateValidator> {
        self.coordinates.as_ref()
    }

    pub fn report(&self) -> AnalysisReport {
        let mut report = AnalysisReport {
            clocks: self.clocks,
            clocks_analyzed: self.clocks_analyzed,
            coordinates: self.coordinates.as_ref().map(CoordinateValidator::report),
            ..AnalysisReport::default()
        };
        for analyzer in &self.analyzers {
            analyzer.record(&mut report);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulator(analyzers: AnalyzerSet) -> Simulator {
        let config = SimConfig {
            analyzers,
            ..SimConfig::default()
        };
        Simulator::new(config, AnimationTables::procedural()).unwrap()
    }

    #[test]
    fn reset_leaves_counters_at_origin() {
        let sim = simulator(AnalyzerSet::empty());
        assert_eq!((sim.design().sync().hc(), sim.design().sync().vc()), (0, 0));
        assert_eq!(sim.clocks(), 0);
        assert_eq!(sim.position(), RasterPosition::origin(sim.timing()));
    }

    #[test]
    fn position_follows_design_counters() {
        let mut sim = simulator(AnalyzerSet::empty());
        let t = *sim.timing();
        for _ in 0..2 * t.clocks_per_frame() + 777 {
            sim.step();
            let sync = sim.design().sync();
            // inside the vsync pulse the position is re-anchored on every hsync clock
            if !sync.vsync() {
                continue;
            }
            let pos = sim.position();
            assert_eq!(pos.hpos, i32::from(sync.hc()) - i32::from(t.h_blank()));
            assert_eq!(pos.vpos, i32::from(sync.vc()) - i32::from(t.v_blank()));
        }
    }

    #[test]
    fn analyzers_respect_the_limit() {
        let config = SimConfig {
            analyzers: AnalyzerSet::RENDER_PROFILER,
            analysis_limit: Some(1000),
            ..SimConfig::default()
        };
        let mut sim = Simulator::new(config, AnimationTables::procedural()).unwrap();
        sim.run_clocks(5000);
        let report = sim.report();
        assert_eq!(report.clocks, 5000);
        assert_eq!(report.clocks_analyzed, 1000);
        assert_eq!(report.profile.map(|p| p.total_clocks), Some(1000));
    }

    #[test]
    fn only_enabled_analyzers_report() {
        let mut sim = simulator(AnalyzerSet::TIMING_MONITOR | AnalyzerSet::COORD_VALIDATOR);
        sim.run_chunk();
        let report = sim.report();
        assert!(report.timing.is_some());
        assert!(report.coordinates.is_some());
        assert!(report.sync.is_none());
        assert!(report.profile.is_none());
        assert!(report.changes.is_none());
        assert!(sim.sync_validator().is_none());
    }

    #[test]
    fn mid_run_reset_keeps_checks_clean() {
        let mut sim = simulator(AnalyzerSet::TIMING_MONITOR | AnalyzerSet::SYNC_VALIDATOR);
        // line 201 of the second frame, inside its hsync pulse
        sim.run_clocks(721 * 832 + 30);
        sim.reset();
        sim.run_frame();
        sim.run_frame();

        let report = sim.report();
        assert!(report.passed(), "{report}");
        assert_eq!(report.clocks, 721 * 832 + 30 + 2 * 432_640);
    }

    #[test]
    fn taps_are_stamped_with_the_running_clock() {
        let mut sim = simulator(AnalyzerSet::empty());
        assert_eq!(sim.step().clock, 1);
        sim.run_clocks(999);
        sim.reset();
        assert_eq!(sim.step().clock, 1001);
        assert_eq!(sim.clocks(), 1001);
    }

    #[test]
    fn bad_scale_is_fatal() {
        let config = SimConfig {
            scale: 0,
            ..SimConfig::default()
        };
        assert!(Simulator::new(config, AnimationTables::procedural()).is_err());
    }

    #[cfg(feature = "serde-config")]
    #[test]
    fn yaml_config_fills_defaults() {
        let config = SimConfig::from_yaml_str(
            "mode: svga-800x600-60\nanalyzers: TIMING_MONITOR | RENDER_PROFILER\n",
        )
        .unwrap();
        assert_eq!(config.mode, VideoMode::Svga800x600At60);
        assert_eq!(
            config.analyzers,
            AnalyzerSet::TIMING_MONITOR | AnalyzerSet::RENDER_PROFILER
        );
        assert_eq!(config.scale, DisplayLayout::DEFAULT_SCALE);
        assert_eq!(config.analysis_limit, None);
    }
}
