// Copyright (C) 2025 Dayton Fishell
// VGA Nyancat Cycle Model
// This file is part of VGA Nyancat.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version. See the LICENSE file in the project root for details.
// SPDX-License-Identifier: GPL-3.0-or-later

//! PNG capture of the host framebuffer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::CaptureError;
use crate::framebuffer::Framebuffer;

/// Encode `fb` as an 8-bit RGBA PNG into `out`.
pub fn write_png<W: Write>(fb: &Framebuffer, out: W) -> Result<(), CaptureError> {
    let too_large = || CaptureError::TooLarge {
        width: fb.width(),
        height: fb.height(),
    };
    let width = u32::try_from(fb.width()).map_err(|_| too_large())?;
    let height = u32::try_from(fb.height()).map_err(|_| too_large())?;

    let mut encoder = png::Encoder::new(out, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&fb.to_rgba())?;
    writer.finish()?;
    Ok(())
}

/// Save `fb` as a PNG file at `path`.
pub fn save_png(fb: &Framebuffer, path: &Path) -> Result<(), CaptureError> {
    let file = File::create(path).map_err(|source| CaptureError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    write_png(fb, BufWriter::new(file))?;
    log::info!(
        "saved {}x{} frame to {}",
        fb.width(),
        fb.height(),
        path.display()
    );
    Ok(())
}
