// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Video timing profiles
//!
//! Each profile fixes the eight raster parameters; everything else (blanking,
//! totals, clocks per frame) is derived.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Raster timing for one video mode. Immutable for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingConfig {
    pub h_active: u16,
    pub h_front_porch: u16,
    pub h_sync: u16,
    pub h_back_porch: u16,
    pub v_active: u16,
    pub v_front_porch: u16,
    pub v_sync: u16,
    pub v_back_porch: u16,
}

impl TimingConfig {
    /// Clocks per line spent outside the active window.
    pub const fn h_blank(&self) -> u16 {
        self.h_front_porch + self.h_sync + self.h_back_porch
    }

    /// Lines per frame spent outside the active window.
    pub const fn v_blank(&self) -> u16 {
        self.v_front_porch + self.v_sync + self.v_back_porch
    }

    pub const fn h_total(&self) -> u16 {
        self.h_active + self.h_blank()
    }

    pub const fn v_total(&self) -> u16 {
        self.v_active + self.v_blank()
    }

    pub const fn clocks_per_frame(&self) -> u64 {
        self.h_total() as u64 * self.v_total() as u64
    }

    /// Active pixels per frame.
    pub const fn active_pixels(&self) -> u64 {
        self.h_active as u64 * self.v_active as u64
    }

    /// Reject profiles the sync generator cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("h_active", self.h_active),
            ("h_front_porch", self.h_front_porch),
            ("h_sync", self.h_sync),
            ("h_back_porch", self.h_back_porch),
            ("v_active", self.v_active),
            ("v_front_porch", self.v_front_porch),
            ("v_sync", self.v_sync),
            ("v_back_porch", self.v_back_porch),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::InvalidTiming {
                reason: format!("{name} must be non-zero"),
            });
        }

        let h_total = fields[..4].iter().map(|(_, v)| u32::from(*v)).sum::<u32>();
        let v_total = fields[4..].iter().map(|(_, v)| u32::from(*v)).sum::<u32>();
        if h_total > u32::from(u16::MAX) || v_total > u32::from(u16::MAX) {
            return Err(ConfigError::InvalidTiming {
                reason: format!("totals {h_total}x{v_total} exceed 16-bit counters"),
            });
        }
        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        VideoMode::default().timing()
    }
}

/// The fixed set of standard modes the design can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize, serde::Deserialize))]
pub enum VideoMode {
    #[default]
    #[cfg_attr(feature = "serde-config", serde(rename = "vga-640x480-72"))]
    Vga640x480At72,
    #[cfg_attr(feature = "serde-config", serde(rename = "vga-640x480-60"))]
    Vga640x480At60,
    #[cfg_attr(feature = "serde-config", serde(rename = "svga-800x600-60"))]
    Svga800x600At60,
    #[cfg_attr(feature = "serde-config", serde(rename = "svga-800x600-72"))]
    Svga800x600At72,
    #[cfg_attr(feature = "serde-config", serde(rename = "xga-1024x768-60"))]
    Xga1024x768At60,
}

impl VideoMode {
    pub const ALL: [VideoMode; 5] = [
        VideoMode::Vga640x480At72,
        VideoMode::Vga640x480At60,
        VideoMode::Svga800x600At60,
        VideoMode::Svga800x600At72,
        VideoMode::Xga1024x768At60,
    ];

    pub const fn timing(self) -> TimingConfig {
        match self {
            VideoMode::Vga640x480At72 => TimingConfig {
                h_active: 640,
                h_front_porch: 24,
                h_sync: 40,
                h_back_porch: 128,
                v_active: 480,
                v_front_porch: 9,
                v_sync: 3,
                v_back_porch: 28,
            },
            VideoMode::Vga640x480At60 => TimingConfig {
                h_active: 640,
                h_front_porch: 16,
                h_sync: 96,
                h_back_porch: 48,
                v_active: 480,
                v_front_porch: 10,
                v_sync: 2,
                v_back_porch: 33,
            },
            VideoMode::Svga800x600At60 => TimingConfig {
                h_active: 800,
                h_front_porch: 40,
                h_sync: 128,
                h_back_porch: 88,
                v_active: 600,
                v_front_porch: 1,
                v_sync: 4,
                v_back_porch: 23,
            },
            VideoMode::Svga800x600At72 => TimingConfig {
                h_active: 800,
                h_front_porch: 56,
                h_sync: 120,
                h_back_porch: 64,
                v_active: 600,
                v_front_porch: 37,
                v_sync: 6,
                v_back_porch: 23,
            },
            VideoMode::Xga1024x768At60 => TimingConfig {
                h_active: 1024,
                h_front_porch: 24,
                h_sync: 136,
                h_back_porch: 160,
                v_active: 768,
                v_front_porch: 3,
                v_sync: 6,
                v_back_porch: 29,
            },
        }
    }

    /// Short identifier accepted by [`VideoMode::from_str`].
    pub const fn id(self) -> &'static str {
        match self {
            VideoMode::Vga640x480At72 => "vga-640x480-72",
            VideoMode::Vga640x480At60 => "vga-640x480-60",
            VideoMode::Svga800x600At60 => "svga-800x600-60",
            VideoMode::Svga800x600At72 => "svga-800x600-72",
            VideoMode::Xga1024x768At60 => "xga-1024x768-60",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            VideoMode::Vga640x480At72 => "VGA 640x480 @ 72Hz",
            VideoMode::Vga640x480At60 => "VGA 640x480 @ 60Hz",
            VideoMode::Svga800x600At60 => "SVGA 800x600 @ 60Hz",
            VideoMode::Svga800x600At72 => "SVGA 800x600 @ 72Hz",
            VideoMode::Xga1024x768At60 => "XGA 1024x768 @ 60Hz",
        }
    }
}

impl fmt::Display for VideoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VideoMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        VideoMode::ALL
            .into_iter()
            .find(|mode| mode.id() == wanted)
            .ok_or(ConfigError::UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_derived_values() {
        let t = VideoMode::default().timing();
        assert_eq!(t.h_blank(), 192);
        assert_eq!(t.v_blank(), 40);
        assert_eq!(t.h_total(), 832);
        assert_eq!(t.v_total(), 520);
        assert_eq!(t.clocks_per_frame(), 432_640);
        assert_eq!(t.active_pixels(), 307_200);
    }

    #[test]
    fn all_profiles_validate() {
        for mode in VideoMode::ALL {
            assert!(mode.timing().validate().is_ok(), "{mode}");
        }
    }

    #[test]
    fn xga_totals() {
        let t = VideoMode::Xga1024x768At60.timing();
        assert_eq!(t.h_total(), 1344);
        assert_eq!(t.v_total(), 806);
    }

    #[test]
    fn mode_ids_round_trip() {
        for mode in VideoMode::ALL {
            assert_eq!(mode.id().parse::<VideoMode>().unwrap(), mode);
        }
        assert_eq!(
            " VGA-640x480-60 ".parse::<VideoMode>().unwrap(),
            VideoMode::Vga640x480At60
        );
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = "ntsc-240p".parse::<VideoMode>().unwrap_err();
        assert_eq!(err, ConfigError::UnknownMode("ntsc-240p".into()));
    }

    #[test]
    fn zero_sync_is_invalid() {
        let mut t = VideoMode::default().timing();
        t.v_sync = 0;
        assert!(matches!(
            t.validate(),
            Err(ConfigError::InvalidTiming { .. })
        ));
    }
}
