/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Pixel format conversion
//!
//! Converts frames between the byte and sub byte formats the container
//! codecs emit: 1, 4 and 8 bpp indexed, 555 and 565 packed 16 bpp and
//! the 24 and 32 bpp truecolor layouts. The wide 48 and 64 bpp formats
//! and the premultiplied layouts have no conversion paths, asking for
//! one fails with [`FrameErrors::UnsupportedConversion`].
//!
//! Conversions between two truecolor layouts are plain channel
//! arithmetic. A truecolor source headed for an indexed destination
//! goes through the [octree quantizer](crate::octree), an indexed
//! source headed anywhere narrower than its palette goes through a
//! 32 bpp intermediate first. The only indexed to indexed conversions
//! done natively are the widening ones, 4 to 8 and 1 to 8 or 4, which
//! keep the palette unchanged.
//!
//! A transparency mask on the source is carried over verbatim, the
//! mask layout only depends on the dimensions.
use framix_core::format::PixelFormat;
use framix_core::utils::{
    expand_555, expand_565, pack_555, pack_565, read_bit_msb, read_nibble, set_nibble
};
use log::trace;

use crate::errors::FrameErrors;
use crate::frame::Frame;
use crate::octree;

/// True for the packed truecolor layouts the converter understands.
const fn is_truecolor(format: PixelFormat) -> bool
{
    matches!(
        format,
        PixelFormat::Rgb555
            | PixelFormat::Rgb565
            | PixelFormat::Rgb24
            | PixelFormat::Rgb32
            | PixelFormat::Argb32
    )
}

/// Convert `source` to `format`, returning a new frame.
///
/// Converting to the current format returns a plain copy. See the
/// [module docs](self) for the supported matrix.
pub fn reformat(source: &Frame, format: PixelFormat) -> Result<Frame, FrameErrors>
{
    let from = source.get_format();
    let mut dest = if from == format
    {
        source.clone()
    }
    else
    {
        match (from, format)
        {
            (f, t) if is_truecolor(f) && is_truecolor(t) => between_truecolor(source, t)?,

            (PixelFormat::Rgb24 | PixelFormat::Rgb32 | PixelFormat::Argb32, t)
                if t.is_indexed() =>
            {
                octree::quantize(source, t)?
            }
            (PixelFormat::Rgb555 | PixelFormat::Rgb565, t) if t.is_indexed() =>
            {
                trace!("no direct path from {:?} to {:?}, going through Rgb32", from, t);
                let wide = between_truecolor(source, PixelFormat::Rgb32)?;
                octree::quantize(&wide, t)?
            }

            (f, t) if f.is_indexed() && is_truecolor(t) => indexed_to_truecolor(source, t)?,

            (PixelFormat::Indexed4, PixelFormat::Indexed8)
            | (PixelFormat::Indexed1, PixelFormat::Indexed8 | PixelFormat::Indexed4) =>
            {
                widen_indexed(source, format)?
            }
            (f, t) if f.is_indexed() && t.is_indexed() =>
            {
                trace!("no direct path from {:?} to {:?}, going through Rgb32", from, t);
                let wide = indexed_to_truecolor(source, PixelFormat::Rgb32)?;
                octree::quantize(&wide, t)?
            }

            (f, t) => return Err(FrameErrors::UnsupportedConversion(f, t))
        }
    };

    if let Some(mask) = source.mask()
    {
        dest.set_mask_buf(mask.to_vec());
    }
    Ok(dest)
}

/// Store one `(r, g, b, a)` pixel into a validated truecolor row.
fn write_truecolor(row: &mut [u8], x: usize, format: PixelFormat, r: u8, g: u8, b: u8, a: u8)
{
    match format
    {
        PixelFormat::Rgb555 =>
        {
            let ptr = 2 * x;
            let packed = pack_555(r, g, b);
            row[ptr] = packed[0];
            row[ptr + 1] = packed[1];
        }
        PixelFormat::Rgb565 =>
        {
            let ptr = 2 * x;
            let packed = pack_565(r, g, b);
            row[ptr] = packed[0];
            row[ptr + 1] = packed[1];
        }
        PixelFormat::Rgb24 =>
        {
            let ptr = 3 * x;
            row[ptr] = b;
            row[ptr + 1] = g;
            row[ptr + 2] = r;
        }
        PixelFormat::Rgb32 | PixelFormat::Argb32 =>
        {
            let ptr = 4 * x;
            row[ptr] = b;
            row[ptr + 1] = g;
            row[ptr + 2] = r;
            // the fourth byte of Rgb32 is padding, kept opaque
            row[ptr + 3] = if format == PixelFormat::Argb32 { a } else { 255 };
        }
        _ => {}
    }
}

/// Truecolor to truecolor, one channel rescale per pixel.
///
/// Alpha is synthesized opaque when the source has none and dropped
/// when the destination cannot store it.
fn between_truecolor(source: &Frame, format: PixelFormat) -> Result<Frame, FrameErrors>
{
    let from = source.get_format();
    if !is_truecolor(from) || !is_truecolor(format)
    {
        return Err(FrameErrors::UnsupportedConversion(from, format));
    }
    let (width, height) = source.get_dimensions();
    let mut dest = source.clone_shape(width, height, format);
    let dest_stride = dest.stride();
    let dest_data = dest.data_mut();

    for y in 0..height
    {
        let src_row = source.scanline(y);
        let dest_row = &mut dest_data[y * dest_stride..];

        for x in 0..width
        {
            let (r, g, b, a) = match from
            {
                PixelFormat::Rgb555 =>
                {
                    let ptr = 2 * x;
                    let (r, g, b) = expand_555(src_row[ptr], src_row[ptr + 1]);
                    (r, g, b, 255)
                }
                PixelFormat::Rgb565 =>
                {
                    let ptr = 2 * x;
                    let (r, g, b) = expand_565(src_row[ptr], src_row[ptr + 1]);
                    (r, g, b, 255)
                }
                PixelFormat::Rgb24 =>
                {
                    let ptr = 3 * x;
                    (src_row[ptr + 2], src_row[ptr + 1], src_row[ptr], 255)
                }
                PixelFormat::Rgb32 =>
                {
                    let ptr = 4 * x;
                    (src_row[ptr + 2], src_row[ptr + 1], src_row[ptr], 255)
                }
                _ =>
                {
                    let ptr = 4 * x;
                    (
                        src_row[ptr + 2],
                        src_row[ptr + 1],
                        src_row[ptr],
                        src_row[ptr + 3]
                    )
                }
            };
            write_truecolor(dest_row, x, format, r, g, b, a);
        }
    }
    Ok(dest)
}

/// Indexed to truecolor, a palette lookup per pixel.
fn indexed_to_truecolor(source: &Frame, format: PixelFormat) -> Result<Frame, FrameErrors>
{
    if !is_truecolor(format)
    {
        return Err(FrameErrors::UnsupportedConversion(source.get_format(), format));
    }
    let palette = source.palette().ok_or(FrameErrors::MissingPalette)?.to_vec();
    let from = source.get_format();
    let (width, height) = source.get_dimensions();
    let mut dest = source.clone_shape(width, height, format);
    let dest_stride = dest.stride();
    let dest_data = dest.data_mut();

    for y in 0..height
    {
        let src_row = source.scanline(y);
        let dest_row = &mut dest_data[y * dest_stride..];

        for x in 0..width
        {
            let position = match from
            {
                PixelFormat::Indexed8 => usize::from(src_row[x]),
                PixelFormat::Indexed4 => usize::from(read_nibble(src_row, x)),
                _ => usize::from(read_bit_msb(src_row, x))
            };
            let color = palette[position];
            write_truecolor(
                dest_row,
                x,
                format,
                (color >> 16) as u8,
                (color >> 8) as u8,
                color as u8,
                255
            );
        }
    }
    Ok(dest)
}

/// Widen an indexed frame to a larger index size, palette unchanged.
///
/// Only 4 to 8 and 1 to 8 or 4 go through here, every pixel value of
/// the source is representable in the destination.
fn widen_indexed(source: &Frame, format: PixelFormat) -> Result<Frame, FrameErrors>
{
    let palette = source.palette().ok_or(FrameErrors::MissingPalette)?.to_vec();
    let from = source.get_format();
    let (width, height) = source.get_dimensions();
    let mut dest = source.clone_shape(width, height, format);
    dest.set_palette(palette);
    let dest_stride = dest.stride();
    let dest_data = dest.data_mut();

    for y in 0..height
    {
        let src_row = source.scanline(y);
        let dest_row = &mut dest_data[y * dest_stride..];

        for x in 0..width
        {
            let value = match from
            {
                PixelFormat::Indexed4 => read_nibble(src_row, x),
                _ => u8::from(read_bit_msb(src_row, x))
            };
            match format
            {
                PixelFormat::Indexed8 => dest_row[x] = value,
                _ => set_nibble(dest_row, x, value)
            }
        }
    }
    Ok(dest)
}
