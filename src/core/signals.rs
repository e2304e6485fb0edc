// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

/// Observable outputs of the design after one clock edge.
///
/// This is everything the analyzers (and any waveform recorder) get to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalTap {
    /// Clocks since reset was released, starting at 1 for the first edge.
    /// The simulator restamps this with its own count, which survives resets.
    pub clock: u64,
    /// Active-low horizontal sync.
    pub hsync: bool,
    /// Active-low vertical sync.
    pub vsync: bool,
    pub activevideo: bool,
    /// Registered pixel coordinates.
    pub x: u16,
    pub y: u16,
    /// 6-bit `RRGGBB` color output.
    pub rrggbb: u8,
}

impl SignalTap {
    /// Both syncs idle high, nothing displayed.
    pub const IDLE: SignalTap = SignalTap {
        clock: 0,
        hsync: true,
        vsync: true,
        activevideo: false,
        x: 0,
        y: 0,
        rrggbb: 0,
    };
}

impl Default for SignalTap {
    fn default() -> Self {
        Self::IDLE
    }
}
