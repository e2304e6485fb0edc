// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Signal analyzers.
//!
//! Every analyzer is an independent observer of the per-clock [`SignalTap`].
//! The simulator owns them, feeds each clock to them in a fixed order and
//! folds their results into one [`AnalysisReport`]. None of them can fail:
//! violations are counters that stay queryable after the run.

use std::fmt;

use bitflags::bitflags;

use crate::core::SignalTap;
use crate::framebuffer::Framebuffer;

pub mod change_tracker;
pub mod coord_validator;
pub mod profiler;
pub mod pulse;
pub mod sync_validator;
pub mod timing_monitor;

pub use change_tracker::{ChangeReport, ChangeTracker, DirtyRect, FrameDiff};
pub use coord_validator::{CoordinateReport, CoordinateValidator};
pub use profiler::{ProfileReport, RenderProfiler};
pub use sync_validator::{GlitchEvent, RasterPhase, SyncReport, SyncValidator};
pub use timing_monitor::{TimingErrors, TimingMonitor, TimingReport};

/// Consumer of the per-clock signal stream.
pub trait SignalObserver {
    /// Called once per clock, after the design has advanced and before the
    /// pixel for that clock is stored.
    fn observe(&mut self, tap: &SignalTap, fb: &Framebuffer);

    /// Forget partial edge state when the design comes out of reset.
    /// Accumulated counts are kept.
    fn rearm(&mut self) {}
}

bitflags! {
    /// Which analyzers a run enables.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde-config", derive(serde::Serialize, serde::Deserialize))]
    pub struct AnalyzerSet: u8 {
        const TIMING_MONITOR = 0x01;
        const SYNC_VALIDATOR = 0x02;
        const COORD_VALIDATOR = 0x04;
        const CHANGE_TRACKER = 0x08;
        const RENDER_PROFILER = 0x10;
    }
}

impl Default for AnalyzerSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// One stream analyzer. Variant order is dispatch order.
pub enum Analyzer {
    Timing(TimingMonitor),
    Sync(SyncValidator),
    Profiler(RenderProfiler),
    Changes(ChangeTracker),
}

impl Analyzer {
    pub fn name(&self) -> &'static str {
        match self {
            Analyzer::Timing(_) => "timing monitor",
            Analyzer::Sync(_) => "sync validator",
            Analyzer::Profiler(_) => "render profiler",
            Analyzer::Changes(_) => "change tracker",
        }
    }

    /// Write this analyzer's result into its slot of `report`.
    pub fn record(&self, report: &mut AnalysisReport) {
        match self {
            Analyzer::Timing(a) => report.timing = Some(a.report()),
            Analyzer::Sync(a) => report.sync = Some(a.report()),
            Analyzer::Profiler(a) => report.profile = Some(a.report()),
            Analyzer::Changes(a) => report.changes = Some(a.report()),
        }
    }
}

impl SignalObserver for Analyzer {
    fn observe(&mut self, tap: &SignalTap, fb: &Framebuffer) {
        match self {
            Analyzer::Timing(a) => a.observe(tap, fb),
            Analyzer::Sync(a) => a.observe(tap, fb),
            Analyzer::Profiler(a) => a.observe(tap, fb),
            Analyzer::Changes(a) => a.observe(tap, fb),
        }
    }

    fn rearm(&mut self) {
        match self {
            Analyzer::Timing(a) => a.rearm(),
            Analyzer::Sync(a) => a.rearm(),
            Analyzer::Profiler(a) => a.rearm(),
            Analyzer::Changes(a) => a.rearm(),
        }
    }
}

/// Results of every analyzer that was enabled for the run.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize))]
pub struct AnalysisReport {
    /// Clocks simulated after reset release.
    pub clocks: u64,
    /// Clocks the analyzers actually observed.
    pub clocks_analyzed: u64,
    pub timing: Option<TimingReport>,
    pub sync: Option<SyncReport>,
    pub coordinates: Option<CoordinateReport>,
    pub profile: Option<ProfileReport>,
    pub changes: Option<ChangeReport>,
}

impl AnalysisReport {
    /// True unless a protocol or bounds checker counted a violation. The
    /// profiler and change tracker are informational.
    pub fn passed(&self) -> bool {
        self.timing.as_ref().is_none_or(TimingReport::passed)
            && self.sync.as_ref().is_none_or(SyncReport::passed)
            && self.coordinates.as_ref().is_none_or(CoordinateReport::passed)
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Simulated {} clocks ({} analyzed)",
            self.clocks, self.clocks_analyzed
        )?;
        if let Some(r) = &self.timing {
            write!(f, "{r}")?;
        }
        if let Some(r) = &self.sync {
            write!(f, "{r}")?;
        }
        if let Some(r) = &self.coordinates {
            write!(f, "{r}")?;
        }
        if let Some(r) = &self.profile {
            write!(f, "{r}")?;
        }
        if let Some(r) = &self.changes {
            write!(f, "{r}")?;
        }
        writeln!(f, "Overall: {}", if self.passed() { "PASS" } else { "FAIL" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TimingConfig;

    #[test]
    fn empty_report_passes() {
        assert!(AnalysisReport::default().passed());
    }

    #[test]
    fn failing_checker_fails_the_run() {
        let mut report = AnalysisReport::default();
        let mut coords = CoordinateValidator::new(TimingConfig::default());
        coords.check(-1, 0, 0);
        report.coordinates = Some(coords.report());
        assert!(!report.passed());
        assert!(report.to_string().contains("Overall: FAIL"));
    }

    #[test]
    fn informational_analyzers_never_fail() {
        let mut report = AnalysisReport::default();
        let analyzer = Analyzer::Profiler(RenderProfiler::new(
            TimingConfig::default(),
            crate::nyancat::DesignConfig::default().layout,
        ));
        analyzer.record(&mut report);
        assert!(report.profile.is_some());
        assert!(report.passed());
    }
}
