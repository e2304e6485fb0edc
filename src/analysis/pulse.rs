// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-signal pulse bookkeeping shared by the sync checkers.
//!
//! Units are whatever the owner advances the tracker by: the timing monitor
//! counts vsync in lines, the sync validator counts everything in clocks.

/// State of one active-low sync line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PulseTracker {
    /// Length of the current (or last completed) low pulse.
    pub width: u64,
    /// Units since the last falling edge.
    pub since_edge: u64,
    /// Nominal pulse width.
    pub expected_width: u64,
    /// Width mismatches recorded by the owner.
    pub errors: u64,
    pub in_pulse: bool,
    /// Completed pulses (falling edge followed by rising edge).
    pub pulses: u64,
    seen_fall: bool,
}

impl PulseTracker {
    pub fn new(expected_width: u64) -> Self {
        Self {
            expected_width,
            ..Self::default()
        }
    }

    /// Falling edge: returns the fall-to-fall interval if an earlier fall was seen.
    pub fn fall(&mut self) -> Option<u64> {
        let period = self.seen_fall.then_some(self.since_edge);
        self.seen_fall = true;
        self.since_edge = 0;
        self.width = 0;
        self.in_pulse = true;
        period
    }

    /// Rising edge: returns the pulse width if the pulse started after tracking began.
    pub fn rise(&mut self) -> Option<u64> {
        if !self.in_pulse {
            return None;
        }
        self.in_pulse = false;
        self.pulses += 1;
        Some(self.width)
    }

    /// Account for one unit of time after edges have been handled.
    pub fn advance(&mut self) {
        self.since_edge += 1;
        if self.in_pulse {
            self.width += 1;
        }
    }

    /// Drop any pulse in flight and the last falling edge. Counts survive.
    pub fn rearm(&mut self) {
        self.seen_fall = false;
        self.in_pulse = false;
        self.since_edge = 0;
    }

    /// Compare `width` against the expected width and count a mismatch.
    pub fn check_width(&mut self, width: u64, tolerance: u64) -> bool {
        let ok = within(width, self.expected_width, tolerance);
        if !ok {
            self.errors += 1;
        }
        ok
    }
}

/// `|measured - expected| <= tolerance`
pub fn within(measured: u64, expected: u64, tolerance: u64) -> bool {
    measured.abs_diff(expected) <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_width_and_period() {
        let mut t = PulseTracker::new(3);
        assert_eq!(t.fall(), None);
        t.advance();
        t.advance();
        t.advance();
        assert_eq!(t.rise(), Some(3));
        for _ in 0..7 {
            t.advance();
        }
        assert_eq!(t.fall(), Some(10));
        assert_eq!(t.pulses, 1);
    }

    #[test]
    fn rise_without_fall_is_ignored() {
        let mut t = PulseTracker::new(3);
        t.advance();
        assert_eq!(t.rise(), None);
        assert_eq!(t.pulses, 0);
    }

    #[test]
    fn rearm_forgets_edges_but_keeps_counts() {
        let mut t = PulseTracker::new(3);
        t.fall();
        t.advance();
        t.rise();
        t.fall();
        t.advance();
        t.rearm();
        assert_eq!(t.rise(), None);
        assert_eq!(t.fall(), None);
        assert_eq!(t.pulses, 1);
    }

    #[test]
    fn width_check_counts_errors() {
        let mut t = PulseTracker::new(40);
        assert!(t.check_width(41, 1));
        assert!(!t.check_width(42, 1));
        assert!(t.check_width(42, 2));
        assert_eq!(t.errors, 1);
    }

    #[test]
    fn tolerance_is_symmetric() {
        assert!(within(831, 832, 1));
        assert!(within(833, 832, 1));
        assert!(!within(830, 832, 1));
    }
}
