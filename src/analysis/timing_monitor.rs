// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync-protocol timing monitor.
//!
//! Watches hsync, vsync and activevideo and checks pulse widths and frame
//! geometry against the configured profile with ±1 tolerance. vsync edges
//! are handled before hsync edges on every clock; a line that ends on the
//! same clock a frame starts belongs to the new frame.

use std::fmt;

use super::SignalObserver;
use super::pulse::{PulseTracker, within};
use crate::core::{SignalTap, TimingConfig};
use crate::framebuffer::Framebuffer;

/// Allowed deviation for every measurement, in clocks or lines.
pub const TIMING_TOLERANCE: u64 = 1;

/// Violation counts, one per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize))]
pub struct TimingErrors {
    pub hsync_pulse: u64,
    pub vsync_pulse: u64,
    pub h_total: u64,
    pub v_total: u64,
    pub h_active: u64,
    pub v_active: u64,
}

impl TimingErrors {
    pub fn total(&self) -> u64 {
        self.hsync_pulse
            + self.vsync_pulse
            + self.h_total
            + self.v_total
            + self.h_active
            + self.v_active
    }
}

/// End-of-run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize))]
pub struct TimingReport {
    pub frames_checked: u64,
    pub lines_checked: u64,
    pub hsync_pulses: u64,
    pub vsync_pulses: u64,
    pub errors: TimingErrors,
}

impl TimingReport {
    pub fn passed(&self) -> bool {
        self.errors.total() == 0
    }
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.passed() { "PASS" } else { "FAIL" };
        writeln!(
            f,
            "Timing monitor: {verdict} ({} frames, {} lines, {} hsync / {} vsync pulses)",
            self.frames_checked, self.lines_checked, self.hsync_pulses, self.vsync_pulses
        )?;
        if !self.passed() {
            let e = &self.errors;
            writeln!(f, "  hsync pulse width errors: {}", e.hsync_pulse)?;
            writeln!(f, "  vsync pulse width errors: {}", e.vsync_pulse)?;
            writeln!(f, "  h total errors:           {}", e.h_total)?;
            writeln!(f, "  v total errors:           {}", e.v_total)?;
            writeln!(f, "  h active errors:          {}", e.h_active)?;
            writeln!(f, "  v active errors:          {}", e.v_active)?;
        }
        Ok(())
    }
}

pub struct TimingMonitor {
    timing: TimingConfig,
    /// counted in clocks
    hsync: PulseTracker,
    /// counted in lines
    vsync: PulseTracker,
    prev_hsync: bool,
    prev_vsync: bool,
    line_active: u64,
    active_lines: u64,
    frames_checked: u64,
    lines_checked: u64,
    errors: TimingErrors,
}

impl TimingMonitor {
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            timing,
            hsync: PulseTracker::new(u64::from(timing.h_sync)),
            vsync: PulseTracker::new(u64::from(timing.v_sync)),
            prev_hsync: true,
            prev_vsync: true,
            line_active: 0,
            active_lines: 0,
            frames_checked: 0,
            lines_checked: 0,
            errors: TimingErrors::default(),
        }
    }

    /// Feed one clock worth of sync signals.
    pub fn sample(&mut self, hsync: bool, vsync: bool, activevideo: bool) {
        let v_fall = self.prev_vsync && !vsync;
        let v_rise = !self.prev_vsync && vsync;
        let h_fall = self.prev_hsync && !hsync;
        let h_rise = !self.prev_hsync && hsync;
        self.prev_hsync = hsync;
        self.prev_vsync = vsync;

        if v_fall {
            self.on_vsync_fall();
        }
        if v_rise {
            self.on_vsync_rise();
        }
        if h_fall {
            self.on_hsync_fall();
        }
        if h_rise {
            self.on_hsync_rise();
        }

        self.hsync.advance();
        if activevideo {
            self.line_active += 1;
        }
    }

    fn verbose(&self) -> bool {
        self.frames_checked == 0
    }

    fn on_vsync_fall(&mut self) {
        let verbose = self.verbose();
        if let Some(lines) = self.vsync.fall() {
            let expected = u64::from(self.timing.v_total());
            if !within(lines, expected, TIMING_TOLERANCE) {
                self.errors.v_total += 1;
                if verbose {
                    log::warn!("frame has {lines} lines, expected {expected}");
                }
            }
            let expected = u64::from(self.timing.v_active);
            if !within(self.active_lines, expected, TIMING_TOLERANCE) {
                self.errors.v_active += 1;
                if verbose {
                    log::warn!(
                        "frame has {} active lines, expected {expected}",
                        self.active_lines
                    );
                }
            }
            self.frames_checked += 1;
            if verbose {
                log::info!(
                    "first frame checked: {lines} lines, {} active, {} errors so far; \
                     further timing diagnostics suppressed",
                    self.active_lines,
                    self.errors.total()
                );
            }
        }
        self.active_lines = 0;
    }

    fn on_vsync_rise(&mut self) {
        if let Some(lines) = self.vsync.rise() {
            if !self.vsync.check_width(lines, TIMING_TOLERANCE) {
                self.errors.vsync_pulse += 1;
                if self.verbose() {
                    log::warn!(
                        "vsync pulse lasted {lines} lines, expected {}",
                        self.timing.v_sync
                    );
                }
            }
        }
    }

    fn on_hsync_fall(&mut self) {
        if let Some(clocks) = self.hsync.fall() {
            let verbose = self.verbose();
            let expected = u64::from(self.timing.h_total());
            if !within(clocks, expected, TIMING_TOLERANCE) {
                self.errors.h_total += 1;
                if verbose {
                    log::warn!("line lasted {clocks} clocks, expected {expected}");
                }
            }
            if self.line_active > 0 {
                let expected = u64::from(self.timing.h_active);
                if !within(self.line_active, expected, TIMING_TOLERANCE) {
                    self.errors.h_active += 1;
                    if verbose {
                        log::warn!(
                            "line had {} active pixels, expected {expected}",
                            self.line_active
                        );
                    }
                }
                self.active_lines += 1;
            }
            self.lines_checked += 1;
        }
        // the vsync tracker measures in lines
        self.vsync.advance();
        self.line_active = 0;
    }

    fn on_hsync_rise(&mut self) {
        if let Some(clocks) = self.hsync.rise() {
            if !self.hsync.check_width(clocks, TIMING_TOLERANCE) {
                self.errors.hsync_pulse += 1;
                if self.verbose() {
                    log::warn!(
                        "hsync pulse lasted {clocks} clocks, expected {}",
                        self.timing.h_sync
                    );
                }
            }
        }
    }

    pub fn errors(&self) -> TimingErrors {
        self.errors
    }

    pub fn frames_checked(&self) -> u64 {
        self.frames_checked
    }

    /// Width of the most recent hsync pulse, in clocks.
    pub fn last_hsync_width(&self) -> u64 {
        self.hsync.width
    }

    /// Width of the most recent vsync pulse, in lines.
    pub fn last_vsync_width(&self) -> u64 {
        self.vsync.width
    }

    pub fn report(&self) -> TimingReport {
        TimingReport {
            frames_checked: self.frames_checked,
            lines_checked: self.lines_checked,
            hsync_pulses: self.hsync.pulses,
            vsync_pulses: self.vsync.pulses,
            errors: self.errors,
        }
    }
}

impl SignalObserver for TimingMonitor {
    fn observe(&mut self, tap: &SignalTap, _fb: &Framebuffer) {
        self.sample(tap.hsync, tap.vsync, tap.activevideo);
    }

    fn rearm(&mut self) {
        self.hsync.rearm();
        self.vsync.rearm();
        self.prev_hsync = true;
        self.prev_vsync = true;
        self.line_active = 0;
        self.active_lines = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VideoMode;
    use crate::sync::SyncGenerator;

    fn run(monitor: &mut TimingMonitor, sync: &mut SyncGenerator, clocks: u64) {
        for _ in 0..clocks {
            sync.tick();
            monitor.sample(sync.hsync(), sync.vsync(), sync.active_video());
        }
    }

    #[test]
    fn one_period_counts_pulses_and_passes() {
        let timing = VideoMode::default().timing();
        let mut sync = SyncGenerator::new(timing);
        let mut monitor = TimingMonitor::new(timing);
        run(&mut monitor, &mut sync, timing.clocks_per_frame());

        let report = monitor.report();
        assert!(report.passed(), "{report}");
        assert_eq!(report.hsync_pulses, 520);
        assert_eq!(report.vsync_pulses, 1);
        assert_eq!(monitor.last_hsync_width(), 40);
        assert_eq!(monitor.last_vsync_width(), 3);
    }

    #[test]
    fn multiple_frames_validate_every_mode() {
        for mode in VideoMode::ALL {
            let timing = mode.timing();
            let mut sync = SyncGenerator::new(timing);
            let mut monitor = TimingMonitor::new(timing);
            run(&mut monitor, &mut sync, timing.clocks_per_frame() * 3);
            let report = monitor.report();
            assert!(report.passed(), "{mode}: {report}");
            assert_eq!(report.frames_checked, 2, "{mode}");
        }
    }

    /// Drive a synthetic raster described by `timing` into a monitor
    /// expecting `expected`.
    fn mismatched(expected: TimingConfig, actual: TimingConfig) -> TimingReport {
        let mut sync = SyncGenerator::new(actual);
        let mut monitor = TimingMonitor::new(expected);
        run(&mut monitor, &mut sync, actual.clocks_per_frame() * 3);
        monitor.report()
    }

    #[test]
    fn one_clock_of_jitter_is_tolerated() {
        let expected = VideoMode::default().timing();
        let mut actual = expected;
        actual.h_back_porch += 1;
        actual.h_sync += 1;
        actual.h_front_porch -= 1;
        let report = mismatched(expected, actual);
        assert!(report.passed(), "{report}");
    }

    #[test]
    fn wide_hsync_is_flagged() {
        let expected = VideoMode::default().timing();
        let mut actual = expected;
        actual.h_sync += 4;
        actual.h_back_porch -= 4;
        let report = mismatched(expected, actual);
        assert!(!report.passed());
        assert!(report.errors.hsync_pulse > 0);
        assert_eq!(report.errors.h_total, 0);
        assert_eq!(report.errors.v_total, 0);
    }

    #[test]
    fn long_lines_are_flagged() {
        let expected = VideoMode::default().timing();
        let mut actual = expected;
        actual.h_back_porch += 8;
        let report = mismatched(expected, actual);
        assert!(report.errors.h_total > 0);
        assert_eq!(report.errors.h_active, 0);
        assert_eq!(report.errors.hsync_pulse, 0);
    }

    #[test]
    fn narrow_active_area_is_flagged() {
        let expected = VideoMode::default().timing();
        let mut actual = expected;
        actual.h_active -= 10;
        actual.h_back_porch += 10;
        let report = mismatched(expected, actual);
        assert!(report.errors.h_active > 0);
        assert_eq!(report.errors.h_total, 0);
    }

    #[test]
    fn extra_lines_are_flagged() {
        let expected = VideoMode::default().timing();
        let mut actual = expected;
        actual.v_back_porch += 5;
        let report = mismatched(expected, actual);
        assert_eq!(report.errors.v_total, 2);
        assert_eq!(report.errors.v_active, 0);
    }

    #[test]
    fn short_vsync_and_fewer_active_lines() {
        let expected = VideoMode::default().timing();
        let mut actual = expected;
        actual.v_sync = 1;
        actual.v_active -= 4;
        actual.v_back_porch += 6;
        let report = mismatched(expected, actual);
        assert!(report.errors.vsync_pulse > 0);
        assert!(report.errors.v_active > 0);
        assert_eq!(report.errors.v_total, 0);
        assert!(!report.passed());
    }

    #[test]
    fn vsync_edge_handled_before_hsync_edge() {
        let timing = VideoMode::default().timing();
        let mut monitor = TimingMonitor::new(timing);
        // both lines fall on the same clock: the line closes into the new frame
        monitor.sample(true, true, false);
        monitor.sample(false, false, false);
        assert_eq!(monitor.vsync.since_edge, 1);
        assert!(monitor.vsync.in_pulse);
        assert_eq!(monitor.vsync.width, 1);
    }

    #[test]
    fn rearm_discards_line_cut_by_reset() {
        let timing = VideoMode::default().timing();
        let mut sync = SyncGenerator::new(timing);
        let mut monitor = TimingMonitor::new(timing);
        // stop inside the hsync pulse of line 240
        run(&mut monitor, &mut sync, 240 * 832 + 30);
        monitor.rearm();
        sync.reset();
        run(&mut monitor, &mut sync, 2 * timing.clocks_per_frame());

        let report = monitor.report();
        assert!(report.passed(), "{report}");
        assert_eq!(report.hsync_pulses, 240 + 2 * 520);
        assert_eq!(report.frames_checked, 1);
    }

    #[test]
    fn counting_continues_after_first_frame() {
        let expected = VideoMode::default().timing();
        let mut actual = expected;
        actual.h_sync += 4;
        actual.h_back_porch -= 4;
        let report = mismatched(expected, actual);
        // every pulse of all three frames is counted, not just the first
        assert_eq!(report.errors.hsync_pulse, report.hsync_pulses);
        assert_eq!(report.hsync_pulses, 3 * 520);
    }
}
