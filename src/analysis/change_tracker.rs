// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Frame-to-frame change tracking.
//!
//! At the end of every vertical sync pulse the finished framebuffer is
//! compared against the previous one. The first frame only seeds the
//! baseline.

use std::fmt;

use bitvec::prelude::*;

use super::SignalObserver;
use crate::core::SignalTap;
use crate::framebuffer::{BYTES_PER_PIXEL, Framebuffer};

/// Edge length of a change-tracking tile, in pixels.
pub const TILE_SIZE: usize = 32;

/// Inclusive bounding box of the changed pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize))]
pub struct DirtyRect {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl DirtyRect {
    fn point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn include(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> usize {
        self.max_y - self.min_y + 1
    }
}

/// Result of comparing one frame against its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize))]
pub struct FrameDiff {
    /// Index of the tracked frame, 0 being the baseline.
    pub frame: u64,
    pub changed_pixels: u64,
    pub bbox: Option<DirtyRect>,
    pub dirty_tiles: usize,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize))]
pub struct ChangeReport {
    pub frames_tracked: u64,
    pub frames_diffed: u64,
    pub min_changed: u64,
    pub max_changed: u64,
    pub avg_changed: f64,
    /// Highest per-pixel change count.
    pub max_heat: u32,
    pub tiles_x: usize,
    pub tiles_y: usize,
    pub last: Option<FrameDiff>,
}

impl fmt::Display for ChangeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Change tracker: {} frames tracked, {} compared",
            self.frames_tracked, self.frames_diffed
        )?;
        if self.frames_diffed == 0 {
            return Ok(());
        }
        writeln!(
            f,
            "  changed pixels per frame: min {} / max {} / avg {:.1}, hottest pixel {}",
            self.min_changed, self.max_changed, self.avg_changed, self.max_heat
        )?;
        if let Some(diff) = &self.last {
            write!(
                f,
                "  last frame: {} pixels, {} of {} tiles dirty",
                diff.changed_pixels,
                diff.dirty_tiles,
                self.tiles_x * self.tiles_y
            )?;
            match diff.bbox {
                Some(r) => writeln!(
                    f,
                    ", bbox ({}, {})-({}, {})",
                    r.min_x, r.min_y, r.max_x, r.max_y
                )?,
                None => writeln!(f)?,
            }
        }
        Ok(())
    }
}

pub struct ChangeTracker {
    width: usize,
    height: usize,
    tiles_x: usize,
    tiles_y: usize,
    previous: Option<Vec<u8>>,
    change_map: BitVec,
    tile_dirty: BitVec,
    heat: Vec<u32>,
    frames_tracked: u64,
    frames_diffed: u64,
    total_changed: u64,
    min_changed: Option<u64>,
    max_changed: u64,
    last: Option<FrameDiff>,
    prev_vsync: bool,
    saw_fall: bool,
}

impl ChangeTracker {
    pub fn new(width: usize, height: usize) -> Self {
        let tiles_x = width.div_ceil(TILE_SIZE);
        let tiles_y = height.div_ceil(TILE_SIZE);
        Self {
            width,
            height,
            tiles_x,
            tiles_y,
            previous: None,
            change_map: bitvec![0; width * height],
            tile_dirty: bitvec![0; tiles_x * tiles_y],
            heat: vec![0; width * height],
            frames_tracked: 0,
            frames_diffed: 0,
            total_changed: 0,
            min_changed: None,
            max_changed: 0,
            last: None,
            prev_vsync: true,
            saw_fall: false,
        }
    }

    /// Compare `fb` with the previous frame and make it the new baseline.
    /// Returns `None` for the baseline frame.
    pub fn track(&mut self, fb: &Framebuffer) -> Option<FrameDiff> {
        let frame = self.frames_tracked;
        self.frames_tracked += 1;

        if fb.width() != self.width || fb.height() != self.height {
            log::warn!(
                "framebuffer is {}x{}, tracker expects {}x{}; frame skipped",
                fb.width(),
                fb.height(),
                self.width,
                self.height
            );
            return None;
        }

        let current = fb.as_bytes();
        let Some(previous) = self.previous.as_mut() else {
            self.previous = Some(current.to_vec());
            log::debug!("change tracker baseline captured");
            return None;
        };

        self.change_map.fill(false);
        self.tile_dirty.fill(false);
        let mut changed_pixels = 0u64;
        let mut bbox: Option<DirtyRect> = None;

        let pixels = current
            .chunks_exact(BYTES_PER_PIXEL)
            .zip(previous.chunks_exact(BYTES_PER_PIXEL));
        for (i, (now, before)) in pixels.enumerate() {
            if now == before {
                continue;
            }
            let (x, y) = (i % self.width, i / self.width);
            changed_pixels += 1;
            self.change_map.set(i, true);
            self.tile_dirty
                .set((y / TILE_SIZE) * self.tiles_x + x / TILE_SIZE, true);
            self.heat[i] = self.heat[i].saturating_add(1);
            match bbox.as_mut() {
                Some(r) => r.include(x, y),
                None => bbox = Some(DirtyRect::point(x, y)),
            }
        }
        previous.copy_from_slice(current);

        let diff = FrameDiff {
            frame,
            changed_pixels,
            bbox,
            dirty_tiles: self.tile_dirty.count_ones(),
        };
        self.frames_diffed += 1;
        self.total_changed += changed_pixels;
        self.max_changed = self.max_changed.max(changed_pixels);
        self.min_changed = Some(
            self.min_changed
                .map_or(changed_pixels, |m| m.min(changed_pixels)),
        );
        self.last = Some(diff);
        log::debug!(
            "frame {frame}: {changed_pixels} pixels changed, {} tiles dirty",
            diff.dirty_tiles
        );
        Some(diff)
    }

    /// Whether `(x, y)` changed in the last compared frame.
    pub fn changed(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.change_map[y * self.width + x]
    }

    /// Whether tile `(tx, ty)` was dirty in the last compared frame.
    pub fn tile_dirty(&self, tx: usize, ty: usize) -> bool {
        tx < self.tiles_x && ty < self.tiles_y && self.tile_dirty[ty * self.tiles_x + tx]
    }

    /// Number of compared frames in which `(x, y)` changed.
    pub fn heat(&self, x: usize, y: usize) -> u32 {
        if x < self.width && y < self.height {
            self.heat[y * self.width + x]
        } else {
            0
        }
    }

    pub fn last_diff(&self) -> Option<&FrameDiff> {
        self.last.as_ref()
    }

    pub fn report(&self) -> ChangeReport {
        ChangeReport {
            frames_tracked: self.frames_tracked,
            frames_diffed: self.frames_diffed,
            min_changed: self.min_changed.unwrap_or(0),
            max_changed: self.max_changed,
            avg_changed: if self.frames_diffed > 0 {
                self.total_changed as f64 / self.frames_diffed as f64
            } else {
                0.0
            },
            max_heat: self.heat.iter().copied().max().unwrap_or(0),
            tiles_x: self.tiles_x,
            tiles_y: self.tiles_y,
            last: self.last,
        }
    }
}

impl SignalObserver for ChangeTracker {
    fn observe(&mut self, tap: &SignalTap, fb: &Framebuffer) {
        if self.prev_vsync && !tap.vsync {
            self.saw_fall = true;
        } else if !self.prev_vsync && tap.vsync && self.saw_fall {
            self.saw_fall = false;
            self.track(fb);
        }
        self.prev_vsync = tap.vsync;
    }

    fn rearm(&mut self) {
        self.prev_vsync = true;
        self.saw_fall = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_frame_is_baseline_only() {
        let mut t = ChangeTracker::new(64, 64);
        let fb = Framebuffer::new(64, 64);
        assert_eq!(t.track(&fb), None);
        assert_eq!(t.report().frames_diffed, 0);
    }

    #[test]
    fn identical_frames_report_nothing() {
        let mut t = ChangeTracker::new(64, 64);
        let mut fb = Framebuffer::new(64, 64);
        fb.put(3, 3, 0x2A);
        t.track(&fb);
        let diff = t.track(&fb).unwrap();
        assert_eq!(diff.changed_pixels, 0);
        assert_eq!(diff.dirty_tiles, 0);
        assert_eq!(diff.bbox, None);
    }

    #[test]
    fn changes_mark_bbox_tiles_and_heat() {
        let mut t = ChangeTracker::new(100, 70);
        let mut fb = Framebuffer::new(100, 70);
        t.track(&fb);
        fb.put(40, 65, 0x3F);
        fb.put(99, 2, 0x01);
        let diff = t.track(&fb).unwrap();

        assert_eq!(diff.changed_pixels, 2);
        assert_eq!(
            diff.bbox,
            Some(DirtyRect {
                min_x: 40,
                min_y: 2,
                max_x: 99,
                max_y: 65
            })
        );
        assert_eq!(diff.dirty_tiles, 2);
        let bbox = diff.bbox.unwrap();
        assert_eq!((bbox.width(), bbox.height()), (60, 64));
        assert!(t.tile_dirty(1, 2));
        assert!(t.tile_dirty(3, 0));
        assert!(!t.tile_dirty(0, 0));
        assert!(t.changed(40, 65));
        assert_eq!(t.heat(40, 65), 1);

        // revert one pixel: it changes again, the other stays put
        fb.put(40, 65, 0);
        let diff = t.track(&fb).unwrap();
        assert_eq!(diff.changed_pixels, 1);
        assert_eq!(t.heat(40, 65), 2);
        assert_eq!(t.heat(99, 2), 1);
        assert!(!t.changed(99, 2));

        assert_eq!(t.last_diff(), Some(&diff));

        let report = t.report();
        assert_eq!(report.frames_diffed, 2);
        assert_eq!((report.min_changed, report.max_changed), (1, 2));
        assert_eq!(report.avg_changed, 1.5);
        assert_eq!(report.max_heat, 2);
        assert_eq!((report.tiles_x, report.tiles_y), (4, 3));
    }

    #[test]
    fn heat_saturates_instead_of_wrapping() {
        let mut t = ChangeTracker::new(4, 4);
        let mut fb = Framebuffer::new(4, 4);
        t.track(&fb);
        t.heat[0] = u32::MAX;
        fb.put(0, 0, 0x3F);
        t.track(&fb);
        assert_eq!(t.heat(0, 0), u32::MAX);
        assert_eq!(t.report().max_heat, u32::MAX);
    }

    #[test]
    fn rearm_drops_pending_vsync_fall() {
        let mut t = ChangeTracker::new(8, 8);
        let fb = Framebuffer::new(8, 8);
        let low = SignalTap {
            vsync: false,
            ..SignalTap::IDLE
        };
        t.observe(&low, &fb);
        t.rearm();
        t.observe(&SignalTap::IDLE, &fb);
        assert_eq!(t.report().frames_tracked, 0);
    }

    #[test]
    fn vsync_rise_after_fall_triggers_tracking() {
        let mut t = ChangeTracker::new(8, 8);
        let fb = Framebuffer::new(8, 8);
        let high = SignalTap::IDLE;
        let low = SignalTap {
            vsync: false,
            ..SignalTap::IDLE
        };
        // a rise with no preceding fall does nothing
        t.observe(&high, &fb);
        assert_eq!(t.report().frames_tracked, 0);
        for tap in [low, low, high, high, low, high] {
            t.observe(&tap, &fb);
        }
        assert_eq!(t.report().frames_tracked, 2);
        assert_eq!(t.report().frames_diffed, 1);
    }
}
