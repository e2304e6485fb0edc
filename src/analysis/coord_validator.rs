// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Bounds check in front of every framebuffer write.
//!
//! The simulator reconstructs the raster position from the sync stream and
//! precomputes a row base address. Both are checked here before a pixel is
//! stored; a write that fails is skipped, never clamped.

use std::fmt;

use crate::core::TimingConfig;
use crate::framebuffer::BYTES_PER_PIXEL;

/// Diagnostics logged before further violations are only counted.
pub const MAX_REPORTED_ERRORS: u64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize))]
pub struct CoordinateReport {
    pub checks: u64,
    pub errors: u64,
    pub hpos_errors: u64,
    pub vpos_errors: u64,
    pub row_base_errors: u64,
}

impl CoordinateReport {
    pub fn passed(&self) -> bool {
        self.errors == 0
    }
}

impl fmt::Display for CoordinateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.passed() { "PASS" } else { "FAIL" };
        writeln!(
            f,
            "Coordinate validator: {verdict} ({} writes checked, {} rejected)",
            self.checks, self.errors
        )?;
        if !self.passed() {
            writeln!(
                f,
                "  hpos: {}, vpos: {}, row base: {}",
                self.hpos_errors, self.vpos_errors, self.row_base_errors
            )?;
        }
        Ok(())
    }
}

pub struct CoordinateValidator {
    h_active: i32,
    v_active: i32,
    report: CoordinateReport,
}

impl CoordinateValidator {
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            h_active: i32::from(timing.h_active),
            v_active: i32::from(timing.v_active),
            report: CoordinateReport::default(),
        }
    }

    /// Byte offset of the first pixel of row `vpos`.
    pub fn row_base_for(&self, vpos: i32) -> Option<usize> {
        let row = usize::try_from(vpos).ok()?;
        Some(row * self.h_active as usize * BYTES_PER_PIXEL)
    }

    /// Validate one pending write. Returns true if it may proceed.
    pub fn check(&mut self, hpos: i32, vpos: i32, row_base: usize) -> bool {
        self.report.checks += 1;

        let h_ok = (0..self.h_active).contains(&hpos);
        let v_ok = (0..self.v_active).contains(&vpos);
        let base_ok = self.row_base_for(vpos) == Some(row_base);
        if h_ok && v_ok && base_ok {
            return true;
        }

        self.report.errors += 1;
        if !h_ok {
            self.report.hpos_errors += 1;
        }
        if !v_ok {
            self.report.vpos_errors += 1;
        }
        if !base_ok {
            self.report.row_base_errors += 1;
        }

        if self.report.errors <= MAX_REPORTED_ERRORS {
            log::warn!(
                "rejected framebuffer write at ({hpos}, {vpos}) with row base {row_base} \
                 (active area {}x{})",
                self.h_active,
                self.v_active
            );
            if self.report.errors == MAX_REPORTED_ERRORS {
                log::warn!("further coordinate errors will be counted but not logged");
            }
        }
        false
    }

    pub fn errors(&self) -> u64 {
        self.report.errors
    }

    pub fn report(&self) -> CoordinateReport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VideoMode;

    fn validator() -> CoordinateValidator {
        CoordinateValidator::new(VideoMode::default().timing())
    }

    #[test]
    fn last_active_pixel_is_valid() {
        let mut v = validator();
        let base = 479 * 640 * BYTES_PER_PIXEL;
        assert!(v.check(639, 479, base));
        assert!(v.check(0, 0, 0));
        assert_eq!(v.errors(), 0);
    }

    #[test]
    fn first_pixel_past_either_edge_is_rejected() {
        let mut v = validator();
        assert!(!v.check(640, 0, 0));
        assert!(!v.check(0, 480, 480 * 640 * BYTES_PER_PIXEL));
        let r = v.report();
        assert_eq!((r.errors, r.hpos_errors, r.vpos_errors), (2, 1, 1));
        assert!(!r.passed());
    }

    #[test]
    fn stale_row_base_is_rejected() {
        let mut v = validator();
        assert!(!v.check(10, 5, 4 * 640 * BYTES_PER_PIXEL));
        assert_eq!(v.report().row_base_errors, 1);
    }

    #[test]
    fn counting_continues_past_log_threshold() {
        let mut v = validator();
        for i in 0..25 {
            v.check(-1 - i, 0, 0);
        }
        assert_eq!(v.errors(), 25);
        assert_eq!(v.report().checks, 25);
    }
}
