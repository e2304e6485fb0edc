// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Counter-driven sync generator.
//!
//! Two free-running counters walk the raster in the order front porch,
//! sync pulse, back porch, active video. Sync lines are active-low and are
//! decoded combinationally from the counters; pixel coordinates are
//! registered, so they trail the counters by one clock.

use crate::core::TimingConfig;

/// Horizontal/vertical raster counters plus the registered coordinates.
#[derive(Debug, Clone)]
pub struct SyncGenerator {
    timing: TimingConfig,
    hc: u16,
    vc: u16,
    x: u16,
    y: u16,
    // activevideo as it was when x/y were captured
    coords_valid: bool,
}

impl SyncGenerator {
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            timing,
            hc: 0,
            vc: 0,
            x: 0,
            y: 0,
            coords_valid: false,
        }
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Synchronous reset: both counters and both coordinate registers clear.
    pub fn reset(&mut self) {
        self.hc = 0;
        self.vc = 0;
        self.x = 0;
        self.y = 0;
        self.coords_valid = false;
    }

    /// Advance one clock edge.
    pub fn tick(&mut self) {
        // wrapping subtraction: blanking positions land far outside the active range
        self.x = self.hc.wrapping_sub(self.timing.h_blank());
        self.y = self.vc.wrapping_sub(self.timing.v_blank());
        self.coords_valid = self.active_video();

        if self.hc == self.timing.h_total() - 1 {
            self.hc = 0;
            if self.vc == self.timing.v_total() - 1 {
                self.vc = 0;
            } else {
                self.vc += 1;
            }
        } else {
            self.hc += 1;
        }
    }

    /// Horizontal sync, low during the pulse.
    pub fn hsync(&self) -> bool {
        let start = self.timing.h_front_porch;
        !(self.hc >= start && self.hc < start + self.timing.h_sync)
    }

    /// Vertical sync, low during the pulse.
    pub fn vsync(&self) -> bool {
        let start = self.timing.v_front_porch;
        !(self.vc >= start && self.vc < start + self.timing.v_sync)
    }

    pub fn active_video(&self) -> bool {
        self.hc >= self.timing.h_blank() && self.vc >= self.timing.v_blank()
    }

    pub fn hc(&self) -> u16 {
        self.hc
    }

    pub fn vc(&self) -> u16 {
        self.vc
    }

    /// Registered x; only meaningful when [`Self::coords_valid`] is set.
    pub fn x(&self) -> u16 {
        self.x
    }

    /// Registered y; only meaningful when [`Self::coords_valid`] is set.
    pub fn y(&self) -> u16 {
        self.y
    }

    /// Whether activevideo was asserted on the clock that captured x/y.
    pub fn coords_valid(&self) -> bool {
        self.coords_valid
    }

    /// Registered coordinates if they point at an active pixel.
    pub fn coordinates(&self) -> Option<(u16, u16)> {
        self.coords_valid.then_some((self.x, self.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VideoMode;

    fn generator() -> SyncGenerator {
        SyncGenerator::new(VideoMode::default().timing())
    }

    #[test]
    fn counters_never_escape_their_totals() {
        let mut sync = generator();
        let t = *sync.timing();
        for _ in 0..t.clocks_per_frame() + 1000 {
            sync.tick();
            assert!(sync.hc() < t.h_total());
            assert!(sync.vc() < t.v_total());
        }
    }

    #[test]
    fn one_frame_returns_to_origin() {
        let mut sync = generator();
        for _ in 0..sync.timing().clocks_per_frame() {
            sync.tick();
        }
        assert_eq!((sync.hc(), sync.vc()), (0, 0));
    }

    #[test]
    fn hsync_pulse_position_and_width() {
        let mut sync = generator();
        let mut low = Vec::new();
        for _ in 0..832 {
            if !sync.hsync() {
                low.push(sync.hc());
            }
            sync.tick();
        }
        assert_eq!(low.len(), 40);
        assert_eq!(low.first(), Some(&24));
        assert_eq!(low.last(), Some(&63));
    }

    #[test]
    fn vsync_low_for_three_lines() {
        let mut sync = generator();
        let mut low_lines = 0;
        for _ in 0..sync.timing().clocks_per_frame() {
            sync.tick();
            if sync.hc() == 0 && !sync.vsync() {
                low_lines += 1;
                assert!((9..12).contains(&sync.vc()));
            }
        }
        assert_eq!(low_lines, 3);
    }

    #[test]
    fn registered_coordinates_stay_in_active_area() {
        let mut sync = generator();
        let t = *sync.timing();
        let mut valid = 0u64;
        for _ in 0..t.clocks_per_frame() {
            sync.tick();
            if let Some((x, y)) = sync.coordinates() {
                assert!(x < t.h_active);
                assert!(y < t.v_active);
                valid += 1;
            }
        }
        assert_eq!(valid, t.active_pixels());
    }

    #[test]
    fn coordinates_trail_counters_by_one_clock() {
        let mut sync = generator();
        let t = *sync.timing();
        while !(sync.active_video() && sync.hc() == t.h_blank() + 10) {
            sync.tick();
        }
        let vc = sync.vc();
        sync.tick();
        assert_eq!(sync.x(), 10);
        assert_eq!(sync.y(), vc - t.v_blank());
        assert_eq!(sync.hc(), t.h_blank() + 11);
    }

    #[test]
    fn blanking_coordinates_wrap_out_of_range() {
        let mut sync = generator();
        sync.tick();
        assert!(!sync.coords_valid());
        assert!(sync.x() >= 640);
        assert!(sync.y() >= 480);
    }

    #[test]
    fn reset_clears_state() {
        let mut sync = generator();
        for _ in 0..100_000 {
            sync.tick();
        }
        sync.reset();
        assert_eq!((sync.hc(), sync.vc(), sync.x(), sync.y()), (0, 0, 0, 0));
        assert!(sync.coordinates().is_none());
    }
}
