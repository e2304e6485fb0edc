// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Design top level.
//!
//! Wires the sync generator, frame sequencer, address transform and render
//! pipeline together behind an active-low reset and a single clock input.

use crate::address::{AddressTransform, DisplayLayout, TableAddress};
use crate::core::{Rom, SignalTap, TableReader, TimingConfig, VideoMode};
use crate::error::ConfigError;
use crate::pipeline::{PipelineRegisters, RenderPipeline};
use crate::sequencer::{DEFAULT_FRAME_PERIOD, FrameSequencer};
use crate::sync::SyncGenerator;
use crate::tables::AnimationTables;

/// Build-time parameters of the design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesignConfig {
    pub timing: TimingConfig,
    pub layout: DisplayLayout,
    /// Clocks per animation frame.
    pub frame_period: u32,
}

impl DesignConfig {
    pub fn new(mode: VideoMode, scale: u16, frame_period: u32) -> Result<Self, ConfigError> {
        let timing = mode.timing();
        let config = Self {
            timing,
            layout: DisplayLayout::centered(&timing, scale)?,
            frame_period,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()?;
        if self.layout.scale == 0 {
            return Err(ConfigError::InvalidLayout {
                reason: "scale must be at least 1".into(),
            });
        }
        if self.frame_period == 0 {
            return Err(ConfigError::ZeroAnimationPeriod);
        }
        Ok(())
    }
}

impl Default for DesignConfig {
    fn default() -> Self {
        let timing = VideoMode::default().timing();
        Self {
            timing,
            // 640x480: 512x512 image centered horizontally, pinned to the top
            layout: DisplayLayout {
                scale: DisplayLayout::DEFAULT_SCALE,
                offset_x: 64,
                offset_y: 0,
            },
            frame_period: DEFAULT_FRAME_PERIOD,
        }
    }
}

/// The animation renderer, one clock at a time.
#[derive(Debug, Clone)]
pub struct VgaNyancat<R = Rom> {
    config: DesignConfig,
    sync: SyncGenerator,
    sequencer: FrameSequencer,
    transform: AddressTransform,
    pipeline: RenderPipeline<R>,
    reset_n: bool,
    clock: u64,
}

impl VgaNyancat<Rom> {
    /// Instantiate the design with ROM-backed tables.
    pub fn new(config: DesignConfig, tables: AnimationTables) -> Result<Self, ConfigError> {
        Self::with_readers(config, tables.frames, tables.palette)
    }
}

impl<R: TableReader> VgaNyancat<R> {
    /// Instantiate the design over arbitrary table readers.
    pub fn with_readers(config: DesignConfig, frames: R, palette: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            sync: SyncGenerator::new(config.timing),
            sequencer: FrameSequencer::new(config.frame_period),
            transform: AddressTransform::new(config.layout),
            pipeline: RenderPipeline::new(frames, palette),
            reset_n: true,
            clock: 0,
        })
    }

    pub fn config(&self) -> &DesignConfig {
        &self.config
    }

    /// Drive the active-low reset input. Takes effect on the next edge.
    pub fn set_reset_n(&mut self, level: bool) {
        self.reset_n = level;
    }

    /// Advance one clock edge and sample the outputs.
    pub fn tick(&mut self) -> SignalTap {
        if !self.reset_n {
            self.sync.reset();
            self.sequencer.reset();
            self.pipeline.reset();
            self.clock = 0;
            return self.tap();
        }

        // every register samples values from before the edge
        let addr = match self.sync.coordinates() {
            Some((x, y)) => self.transform.map(x, y, self.sequencer.frame()),
            None => TableAddress {
                in_display: false,
                source: None,
                index: 0,
            },
        };
        self.pipeline.tick(addr);
        self.sync.tick();
        self.sequencer.tick();
        self.clock += 1;

        self.tap()
    }

    /// Current outputs without advancing the clock.
    pub fn tap(&self) -> SignalTap {
        let activevideo = self.sync.active_video();
        SignalTap {
            clock: self.clock,
            hsync: self.sync.hsync(),
            vsync: self.sync.vsync(),
            activevideo,
            x: self.sync.x(),
            y: self.sync.y(),
            rrggbb: self.pipeline.output(activevideo),
        }
    }

    pub fn sync(&self) -> &SyncGenerator {
        &self.sync
    }

    pub fn frame_index(&self) -> u8 {
        self.sequencer.frame()
    }

    pub fn pipeline_registers(&self) -> PipelineRegisters {
        self.pipeline.registers()
    }

    pub fn transform(&self) -> &AddressTransform {
        &self.transform
    }
}
