// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Clock utilization profile.

use std::fmt;

use super::SignalObserver;
use crate::address::DisplayLayout;
use crate::core::{SignalTap, TimingConfig};
use crate::framebuffer::Framebuffer;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize))]
pub struct ProfileReport {
    pub total_clocks: u64,
    pub blanking_clocks: u64,
    pub active_black_clocks: u64,
    pub active_rendered_clocks: u64,
    /// Fraction of clocks that should carry image pixels for this layout.
    pub expected_rendered_rate: f64,
}

impl ProfileReport {
    pub fn active_clocks(&self) -> u64 {
        self.active_black_clocks + self.active_rendered_clocks
    }

    fn percent(&self, count: u64) -> f64 {
        if self.total_clocks == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.total_clocks as f64
        }
    }

    pub fn blanking_percent(&self) -> f64 {
        self.percent(self.blanking_clocks)
    }

    pub fn active_black_percent(&self) -> f64 {
        self.percent(self.active_black_clocks)
    }

    pub fn rendered_percent(&self) -> f64 {
        self.percent(self.active_rendered_clocks)
    }

    /// Measured minus expected rendered rate, in percentage points.
    pub fn deviation(&self) -> f64 {
        self.rendered_percent() - self.expected_rendered_rate * 100.0
    }
}

impl fmt::Display for ProfileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Render profile: {} clocks", self.total_clocks)?;
        writeln!(
            f,
            "  blanking        {:>10} ({:5.1}%)",
            self.blanking_clocks,
            self.blanking_percent()
        )?;
        writeln!(
            f,
            "  active, black   {:>10} ({:5.1}%)",
            self.active_black_clocks,
            self.active_black_percent()
        )?;
        writeln!(
            f,
            "  active, drawn   {:>10} ({:5.1}%)",
            self.active_rendered_clocks,
            self.rendered_percent()
        )?;
        writeln!(
            f,
            "  expected drawn  {:>10.1}%, deviation {:+.2} points",
            self.expected_rendered_rate * 100.0,
            self.deviation()
        )
    }
}

pub struct RenderProfiler {
    expected_rendered_rate: f64,
    total: u64,
    blanking: u64,
    active_black: u64,
    active_rendered: u64,
}

impl RenderProfiler {
    pub fn new(timing: TimingConfig, layout: DisplayLayout) -> Self {
        let expected_rendered_rate =
            layout.visible_pixels(&timing) as f64 / timing.clocks_per_frame() as f64;
        Self {
            expected_rendered_rate,
            total: 0,
            blanking: 0,
            active_black: 0,
            active_rendered: 0,
        }
    }

    #[inline]
    pub fn sample(&mut self, activevideo: bool, rrggbb: u8) {
        self.total += 1;
        match (activevideo, rrggbb) {
            (false, _) => self.blanking += 1,
            (true, 0) => self.active_black += 1,
            (true, _) => self.active_rendered += 1,
        }
    }

    pub fn reset(&mut self) {
        self.total = 0;
        self.blanking = 0;
        self.active_black = 0;
        self.active_rendered = 0;
    }

    pub fn report(&self) -> ProfileReport {
        ProfileReport {
            total_clocks: self.total,
            blanking_clocks: self.blanking,
            active_black_clocks: self.active_black,
            active_rendered_clocks: self.active_rendered,
            expected_rendered_rate: self.expected_rendered_rate,
        }
    }
}

impl SignalObserver for RenderProfiler {
    fn observe(&mut self, tap: &SignalTap, _fb: &Framebuffer) {
        self.sample(tap.activevideo, tap.rrggbb);
    }
}
