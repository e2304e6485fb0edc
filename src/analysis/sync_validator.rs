// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Glitch and phase diagnostics for the sync lines.
//!
//! Everything here is measured in clocks. Each sync line keeps its own pulse
//! tracker, and a free-running raster estimate (`est_hc`, `est_vc`) is
//! re-anchored on every well-formed falling edge so an anomaly can be placed
//! in the raster. An edge is a glitch when it arrives more than
//! [`SYNC_TOLERANCE`] clocks early relative to the previous edge of the same
//! polarity. Width mismatches are counted separately, and a mean period more
//! than [`PERIOD_DEVIATION_LIMIT`] percent off nominal is reported without
//! failing the run.

use std::fmt;

use super::SignalObserver;
use super::pulse::PulseTracker;
use crate::core::{SignalTap, TimingConfig};
use crate::framebuffer::Framebuffer;

/// Allowed deviation for intervals and widths, in clocks.
pub const SYNC_TOLERANCE: u64 = 2;

/// Mean-period drift flagged in the report, in percent.
pub const PERIOD_DEVIATION_LIMIT: f64 = 5.0;

/// Where in a line (or frame) an estimated position falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize))]
pub enum RasterPhase {
    FrontPorch,
    Sync,
    BackPorch,
    Active,
}

impl RasterPhase {
    /// Classify `pos` within one axis laid out as front porch, sync, back porch, active.
    pub fn classify(pos: u16, front_porch: u16, sync: u16, blank: u16) -> Self {
        if pos < front_porch {
            RasterPhase::FrontPorch
        } else if pos < front_porch + sync {
            RasterPhase::Sync
        } else if pos < blank {
            RasterPhase::BackPorch
        } else {
            RasterPhase::Active
        }
    }
}

impl fmt::Display for RasterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RasterPhase::FrontPorch => "front porch",
            RasterPhase::Sync => "sync",
            RasterPhase::BackPorch => "back porch",
            RasterPhase::Active => "active",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize))]
pub enum SyncLine {
    Hsync,
    Vsync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize))]
pub enum Edge {
    Falling,
    Rising,
}

/// An edge that arrived too early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize))]
pub struct GlitchEvent {
    pub clock: u64,
    pub line: SyncLine,
    pub edge: Edge,
    /// Clocks since the previous edge of the same polarity.
    pub interval: u64,
    pub expected: u64,
    pub est_hc: u16,
    pub est_vc: u16,
    pub phase: RasterPhase,
}

impl fmt::Display for GlitchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {:?} edge at clock {} after {} clocks (expected {}), est ({}, {}) in {}",
            self.line,
            self.edge,
            self.clock,
            self.interval,
            self.expected,
            self.est_hc,
            self.est_vc,
            self.phase
        )
    }
}

/// Per-line summary.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize))]
pub struct SyncLineReport {
    pub falling_edges: u64,
    pub rising_edges: u64,
    pub glitches: u64,
    pub width_errors: u64,
    /// Mean fall-to-fall period in clocks.
    pub average_period: Option<f64>,
    /// Distance of the mean period from nominal, in percent.
    pub period_deviation: Option<f64>,
}

impl SyncLineReport {
    pub fn period_drifted(&self) -> bool {
        self.period_deviation.is_some_and(|d| d > PERIOD_DEVIATION_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize))]
pub struct SyncReport {
    pub frames_seen: u64,
    pub hsync: SyncLineReport,
    pub vsync: SyncLineReport,
    pub first_glitch: Option<GlitchEvent>,
}

impl SyncReport {
    pub fn passed(&self) -> bool {
        self.hsync.glitches == 0
            && self.vsync.glitches == 0
            && self.hsync.width_errors == 0
            && self.vsync.width_errors == 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.passed() { "PASS" } else { "FAIL" };
        writeln!(f, "Sync validator: {verdict} ({} frames)", self.frames_seen)?;
        for (name, line) in [("hsync", &self.hsync), ("vsync", &self.vsync)] {
            write!(
                f,
                "  {name}: {} falling / {} rising edges, {} glitches, {} width errors",
                line.falling_edges, line.rising_edges, line.glitches, line.width_errors
            )?;
            if let Some(p) = line.average_period {
                write!(f, ", avg period {p:.1} clocks")?;
            }
            match line.period_deviation {
                Some(d) if line.period_drifted() => writeln!(f, " (off by {d:.1}%)")?,
                _ => writeln!(f)?,
            }
        }
        if let Some(g) = &self.first_glitch {
            writeln!(f, "  first glitch: {g}")?;
        }
        Ok(())
    }
}

/// Edge bookkeeping for one sync line.
#[derive(Debug, Clone)]
struct LineState {
    pulse: PulseTracker,
    expected_period: u64,
    since_rise: Option<u64>,
    falls: u64,
    rises: u64,
    glitches: u64,
    period_sum: u64,
    periods: u64,
    /// Interval measured by the latest falling edge.
    last_period: Option<u64>,
}

impl LineState {
    fn new(expected_width: u64, expected_period: u64) -> Self {
        Self {
            pulse: PulseTracker::new(expected_width),
            expected_period,
            since_rise: None,
            falls: 0,
            rises: 0,
            glitches: 0,
            period_sum: 0,
            periods: 0,
            last_period: None,
        }
    }

    fn early(&self, interval: u64) -> bool {
        interval + SYNC_TOLERANCE < self.expected_period
    }

    /// Falling edge; returns the interval if it was a glitch.
    fn fall(&mut self) -> Option<u64> {
        self.falls += 1;
        self.last_period = self.pulse.fall();
        let period = self.last_period?;
        self.period_sum += period;
        self.periods += 1;
        if self.early(period) {
            self.glitches += 1;
            return Some(period);
        }
        None
    }

    /// Rising edge; returns `(glitch interval, width ok)`.
    fn rise(&mut self) -> (Option<u64>, bool) {
        self.rises += 1;
        let glitch = match self.since_rise {
            Some(interval) if self.early(interval) => {
                self.glitches += 1;
                Some(interval)
            }
            _ => None,
        };
        self.since_rise = Some(0);
        let width_ok = match self.pulse.rise() {
            Some(width) => self.pulse.check_width(width, SYNC_TOLERANCE),
            None => true,
        };
        (glitch, width_ok)
    }

    fn rearm(&mut self) {
        self.pulse.rearm();
        self.since_rise = None;
        self.last_period = None;
    }

    fn advance(&mut self) {
        self.pulse.advance();
        if let Some(since) = self.since_rise.as_mut() {
            *since += 1;
        }
    }

    fn report(&self) -> SyncLineReport {
        let average_period =
            (self.periods > 0).then(|| self.period_sum as f64 / self.periods as f64);
        let expected = self.expected_period as f64;
        SyncLineReport {
            falling_edges: self.falls,
            rising_edges: self.rises,
            glitches: self.glitches,
            width_errors: self.pulse.errors,
            average_period,
            period_deviation: average_period.map(|p| (p - expected).abs() / expected * 100.0),
        }
    }
}

pub struct SyncValidator {
    timing: TimingConfig,
    hsync: LineState,
    vsync: LineState,
    prev_hsync: bool,
    prev_vsync: bool,
    est_hc: u16,
    est_vc: u16,
    frames_seen: u64,
    first_glitch: Option<GlitchEvent>,
}

impl SyncValidator {
    pub fn new(timing: TimingConfig) -> Self {
        let h_total = u64::from(timing.h_total());
        Self {
            timing,
            hsync: LineState::new(u64::from(timing.h_sync), h_total),
            vsync: LineState::new(
                u64::from(timing.v_sync) * h_total,
                timing.clocks_per_frame(),
            ),
            prev_hsync: true,
            prev_vsync: true,
            est_hc: 0,
            est_vc: 0,
            frames_seen: 0,
            first_glitch: None,
        }
    }

    fn verbose(&self) -> bool {
        self.frames_seen == 0
    }

    /// Feed one clock of sync levels.
    pub fn sample(&mut self, clock: u64, hsync: bool, vsync: bool) {
        self.advance_estimate();

        let v_fall = self.prev_vsync && !vsync;
        let v_rise = !self.prev_vsync && vsync;
        let h_fall = self.prev_hsync && !hsync;
        let h_rise = !self.prev_hsync && hsync;
        self.prev_hsync = hsync;
        self.prev_vsync = vsync;

        if v_fall {
            let glitch = self.vsync.fall();
            match glitch {
                Some(interval) => self.glitch(clock, SyncLine::Vsync, Edge::Falling, interval),
                None => {
                    if self.vsync.last_period.is_some() {
                        self.frames_seen += 1;
                    }
                    self.est_vc = self.timing.v_front_porch;
                    self.est_hc = 0;
                }
            }
        }
        if v_rise {
            let (glitch, width_ok) = self.vsync.rise();
            if let Some(interval) = glitch {
                self.glitch(clock, SyncLine::Vsync, Edge::Rising, interval);
            }
            if !width_ok && self.verbose() {
                log::warn!(
                    "vsync pulse width {} clocks at clock {clock}, expected {}",
                    self.vsync.pulse.width,
                    self.vsync.pulse.expected_width
                );
            }
        }
        if h_fall {
            match self.hsync.fall() {
                Some(interval) => self.glitch(clock, SyncLine::Hsync, Edge::Falling, interval),
                None => self.est_hc = self.timing.h_front_porch,
            }
        }
        if h_rise {
            let (glitch, width_ok) = self.hsync.rise();
            if let Some(interval) = glitch {
                self.glitch(clock, SyncLine::Hsync, Edge::Rising, interval);
            }
            if !width_ok && self.verbose() {
                log::warn!(
                    "hsync pulse width {} clocks at clock {clock}, expected {}",
                    self.hsync.pulse.width,
                    self.hsync.pulse.expected_width
                );
            }
        }

        self.hsync.advance();
        self.vsync.advance();
    }

    fn advance_estimate(&mut self) {
        self.est_hc += 1;
        if self.est_hc >= self.timing.h_total() {
            self.est_hc = 0;
            self.est_vc += 1;
            if self.est_vc >= self.timing.v_total() {
                self.est_vc = 0;
            }
        }
    }

    /// Estimated phase of the line that produced an edge.
    pub fn phase(&self, line: SyncLine) -> RasterPhase {
        let t = &self.timing;
        match line {
            SyncLine::Hsync => {
                RasterPhase::classify(self.est_hc, t.h_front_porch, t.h_sync, t.h_blank())
            }
            SyncLine::Vsync => {
                RasterPhase::classify(self.est_vc, t.v_front_porch, t.v_sync, t.v_blank())
            }
        }
    }

    fn glitch(&mut self, clock: u64, line: SyncLine, edge: Edge, interval: u64) {
        let expected = match line {
            SyncLine::Hsync => self.hsync.expected_period,
            SyncLine::Vsync => self.vsync.expected_period,
        };
        let event = GlitchEvent {
            clock,
            line,
            edge,
            interval,
            expected,
            est_hc: self.est_hc,
            est_vc: self.est_vc,
            phase: self.phase(line),
        };
        if self.verbose() {
            log::warn!("sync glitch: {event}");
        }
        self.first_glitch.get_or_insert(event);
    }

    /// Estimated raster position `(hc, vc)`.
    pub fn estimate(&self) -> (u16, u16) {
        (self.est_hc, self.est_vc)
    }

    pub fn first_glitch(&self) -> Option<&GlitchEvent> {
        self.first_glitch.as_ref()
    }

    pub fn report(&self) -> SyncReport {
        SyncReport {
            frames_seen: self.frames_seen,
            hsync: self.hsync.report(),
            vsync: self.vsync.report(),
            first_glitch: self.first_glitch,
        }
    }
}

impl SignalObserver for SyncValidator {
    fn observe(&mut self, tap: &SignalTap, _fb: &Framebuffer) {
        self.sample(tap.clock, tap.hsync, tap.vsync);
    }

    /// Reset lands the raster on counter state `(0, 0)` with both syncs high.
    fn rearm(&mut self) {
        self.hsync.rearm();
        self.vsync.rearm();
        self.prev_hsync = true;
        self.prev_vsync = true;
        self.est_hc = 0;
        self.est_vc = 0;
    }
}
