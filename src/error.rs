// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fatal configuration errors.
//!
//! Protocol and bounds violations found by the analyzers are counters, not
//! errors; only problems that stop a simulation from starting end up here.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for simulation setup.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors raised while loading or validating the lookup tables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("cannot read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
    #[error("line {line}: invalid hex token `{token}`")]
    InvalidToken { line: usize, token: String },
    #[error("{table} table entry {index} is 0x{value:X}, wider than {bits} bits")]
    ValueTooWide {
        table: &'static str,
        index: usize,
        value: u32,
        bits: u8,
    },
    #[error("{table} table has {found} entries, expected {expected}")]
    WrongLength {
        table: &'static str,
        found: usize,
        expected: usize,
    },
    #[error("palette table has {found} entries, expected 1..={max}")]
    PaletteSize { found: usize, max: usize },
}

/// Errors in the selected timing profile or display layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown video mode `{0}`")]
    UnknownMode(String),
    #[error("invalid timing profile: {reason}")]
    InvalidTiming { reason: String },
    #[error("invalid display layout: {reason}")]
    InvalidLayout { reason: String },
    #[error("animation period must be at least one clock")]
    ZeroAnimationPeriod,
}

/// Top-level error for building a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[cfg(feature = "serde-config")]
    #[error("cannot read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[cfg(feature = "serde-config")]
    #[error("config file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors while writing a captured frame to disk.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
    #[error("frame is {width}x{height}, too large for PNG")]
    TooLarge { width: usize, height: usize },
}

impl TableError {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}
