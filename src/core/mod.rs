// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod bus;
pub mod signals;
pub mod timing;

// Re-export commonly used core types here
pub use bus::{Rom, TableReader};
pub use signals::SignalTap;
pub use timing::{TimingConfig, VideoMode};
