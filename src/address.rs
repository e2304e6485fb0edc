// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pixel coordinate to animation-table address transform.
//!
//! The 64×64 source frame is blown up by an integer factor and centered in
//! the active area. `in_display` is combinational on the registered
//! coordinates; the pipeline carries it forward alongside the data instead
//! of recomputing it at a later stage.

use crate::core::TimingConfig;
use crate::error::ConfigError;
use crate::tables::{ANIMATION_WORDS, FRAME_WORDS, SOURCE_HEIGHT, SOURCE_WIDTH};

/// Scale and placement of the animation inside the active area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayLayout {
    pub scale: u16,
    pub offset_x: u16,
    pub offset_y: u16,
}

impl DisplayLayout {
    pub const DEFAULT_SCALE: u16 = 8;

    /// Center the scaled image; an axis larger than the active area pins to 0.
    pub fn centered(timing: &TimingConfig, scale: u16) -> Result<Self, ConfigError> {
        if scale == 0 {
            return Err(ConfigError::InvalidLayout {
                reason: "scale must be at least 1".into(),
            });
        }
        let scaled_w = SOURCE_WIDTH as u32 * u32::from(scale);
        let scaled_h = SOURCE_HEIGHT as u32 * u32::from(scale);
        Ok(Self {
            scale,
            offset_x: (u32::from(timing.h_active).saturating_sub(scaled_w) / 2) as u16,
            offset_y: (u32::from(timing.v_active).saturating_sub(scaled_h) / 2) as u16,
        })
    }

    pub fn scaled_width(&self) -> u32 {
        SOURCE_WIDTH as u32 * u32::from(self.scale)
    }

    pub fn scaled_height(&self) -> u32 {
        SOURCE_HEIGHT as u32 * u32::from(self.scale)
    }

    /// Pixels of the scaled image that fall inside the active area.
    pub fn visible_pixels(&self, timing: &TimingConfig) -> u64 {
        let right =
            (u32::from(self.offset_x) + self.scaled_width()).min(u32::from(timing.h_active));
        let bottom =
            (u32::from(self.offset_y) + self.scaled_height()).min(u32::from(timing.v_active));
        let w = right.saturating_sub(u32::from(self.offset_x));
        let h = bottom.saturating_sub(u32::from(self.offset_y));
        u64::from(w) * u64::from(h)
    }
}

/// Result of one address computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableAddress {
    pub in_display: bool,
    /// Source pixel, present only when `in_display` holds.
    pub source: Option<(u16, u16)>,
    /// Animation-table index; 0 outside the display region.
    pub index: usize,
}

/// Maps display coordinates plus frame index to a frame-table address.
#[derive(Debug, Clone, Copy)]
pub struct AddressTransform {
    layout: DisplayLayout,
}

impl AddressTransform {
    pub fn new(layout: DisplayLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &DisplayLayout {
        &self.layout
    }

    pub fn in_display(&self, x: u16, y: u16) -> bool {
        let (x, y) = (u32::from(x), u32::from(y));
        let (ox, oy) = (u32::from(self.layout.offset_x), u32::from(self.layout.offset_y));
        (ox..ox + self.layout.scaled_width()).contains(&x)
            && (oy..oy + self.layout.scaled_height()).contains(&y)
    }

    /// Compute the table address for `(x, y)` in animation frame `frame`.
    pub fn map(&self, x: u16, y: u16, frame: u8) -> TableAddress {
        if !self.in_display(x, y) {
            return TableAddress {
                in_display: false,
                source: None,
                index: 0,
            };
        }

        let source_x = (x - self.layout.offset_x) / self.layout.scale;
        let source_y = (y - self.layout.offset_y) / self.layout.scale;
        let index = usize::from(frame) * FRAME_WORDS
            + usize::from(source_y) * SOURCE_WIDTH
            + usize::from(source_x);
        debug_assert!(index < ANIMATION_WORDS);

        TableAddress {
            in_display: true,
            source: Some((source_x, source_y)),
            index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VideoMode;

    fn standard() -> AddressTransform {
        let timing = VideoMode::default().timing();
        AddressTransform::new(DisplayLayout::centered(&timing, 8).unwrap())
    }

    #[test]
    fn centering_for_default_mode() {
        let layout = *standard().layout();
        assert_eq!(layout.offset_x, 64);
        assert_eq!(layout.offset_y, 0);
        assert_eq!(layout.scaled_width(), 512);
    }

    #[test]
    fn centering_for_xga() {
        let timing = VideoMode::Xga1024x768At60.timing();
        let layout = DisplayLayout::centered(&timing, 8).unwrap();
        assert_eq!((layout.offset_x, layout.offset_y), (256, 128));
    }

    #[test]
    fn corner_pixels_map_to_source_corners() {
        let xf = standard();
        let first = xf.map(64, 0, 0);
        assert!(first.in_display);
        assert_eq!(first.source, Some((0, 0)));
        assert_eq!(first.index, 0);

        let last = xf.map(575, 511, 0);
        assert!(last.in_display);
        assert_eq!(last.source, Some((63, 63)));
        assert_eq!(last.index, 63 * 64 + 63);
    }

    #[test]
    fn outside_region_is_not_in_display() {
        let xf = standard();
        assert!(!xf.map(639, 479, 0).in_display);
        assert!(!xf.map(63, 10, 0).in_display);
        assert!(!xf.map(576, 10, 0).in_display);
        assert_eq!(xf.map(639, 479, 5).index, 0);
    }

    #[test]
    fn frame_index_selects_frame_block() {
        let xf = standard();
        let addr = xf.map(64 + 8 * 3, 8 * 2, 11);
        assert_eq!(addr.index, 11 * 4096 + 2 * 64 + 3);
        assert!(addr.index < ANIMATION_WORDS);
    }

    #[test]
    fn division_truncates() {
        let xf = standard();
        assert_eq!(xf.map(64 + 7, 7, 0).source, Some((0, 0)));
        assert_eq!(xf.map(64 + 8, 8, 0).source, Some((1, 1)));
    }

    #[test]
    fn wrapped_blanking_coordinates_are_outside() {
        let xf = standard();
        assert!(!xf.map(0u16.wrapping_sub(3), 100, 0).in_display);
        assert!(!xf.map(100, 0u16.wrapping_sub(40), 0).in_display);
    }

    #[test]
    fn visible_pixels_clip_to_active_area() {
        let timing = VideoMode::default().timing();
        let layout = DisplayLayout::centered(&timing, 8).unwrap();
        assert_eq!(layout.visible_pixels(&timing), 512 * 480);
    }

    #[test]
    fn zero_scale_rejected() {
        let timing = VideoMode::default().timing();
        assert!(DisplayLayout::centered(&timing, 0).is_err());
    }
}
