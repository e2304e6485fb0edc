// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! VGA Nyancat cycle model
//!
//! A clock-accurate model of a VGA timing generator that renders a 12-frame
//! 64x64 Nyancat animation, plus the host-side simulator and the stream
//! analyzers used to check its sync protocol and output.

pub mod address;
pub mod analysis;
pub mod capture;
pub mod core;
pub mod error;
pub mod framebuffer;
pub mod nyancat;
pub mod pipeline;
pub mod sequencer;
pub mod simulator;
pub mod sync;
pub mod tables;

// Re-export commonly used types
pub use analysis::{AnalysisReport, AnalyzerSet};
pub use core::{SignalTap, TableReader, TimingConfig, VideoMode};
pub use error::{CaptureError, ConfigError, SimError, TableError};
pub use framebuffer::Framebuffer;
pub use nyancat::{DesignConfig, VgaNyancat};
pub use simulator::{SimConfig, Simulator};
pub use tables::AnimationTables;
