/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Integer box resampling
//!
//! Resamples a sub rectangle of a frame to a new size using pure
//! integer arithmetic. Shrinking is the high quality direction, every
//! destination pixel is the coverage weighted average of the source
//! area it maps onto, computed with 12 bit fixed point coefficients
//! and 32 bit accumulators. Expanding is the cheap direction, source
//! pixels are replicated with a Bresenham style accumulator and no
//! filtering at all.
//!
//! Growing one axis while shrinking the other runs as two passes over
//! a same format intermediate frame, shrink first. The intermediate
//! quantizes indexed and 16 bpp sources once more than a single pass
//! would, a known quality limitation of this scheme.
//!
//! Supported formats are the same eight the converter handles, 1, 4
//! and 8 bpp indexed, 555 and 565, 24 and 32 bpp. Indexed destinations
//! are resolved through the nearest palette color, 1 bpp destinations
//! set a pixel whenever any covered source pixel was set.
use framix_core::format::PixelFormat;
use framix_core::palette::nearest_color;
use framix_core::utils::{
    expand_555, expand_565, pack_555, pack_565, read_bit_msb, read_nibble, set_bit_msb, set_nibble
};
use log::trace;

use crate::errors::FrameErrors;
use crate::frame::Frame;

const fn is_resizable(format: PixelFormat) -> bool
{
    matches!(
        format,
        PixelFormat::Indexed1
            | PixelFormat::Indexed4
            | PixelFormat::Indexed8
            | PixelFormat::Rgb555
            | PixelFormat::Rgb565
            | PixelFormat::Rgb24
            | PixelFormat::Rgb32
            | PixelFormat::Argb32
    )
}

/// Resample the rectangle `(x, y, width, height)` of `source` into a
/// new `dest_width` x `dest_height` frame of the same format.
///
/// The rectangle must lie inside the source and neither size may be
/// zero. The palette, when present, is carried over unchanged.
pub fn resize(
    source: &Frame, x: usize, y: usize, width: usize, height: usize, dest_width: usize,
    dest_height: usize
) -> Result<Frame, FrameErrors>
{
    let format = source.get_format();
    if !is_resizable(format)
    {
        return Err(FrameErrors::UnsupportedFormat(format, "resize"));
    }
    if width == 0 || height == 0 || dest_width == 0 || dest_height == 0
    {
        return Err(FrameErrors::InvalidOperation("resize with an empty rectangle"));
    }
    if x + width > source.width() || y + height > source.height()
    {
        return Err(FrameErrors::DimensionsMisMatch(
            source.width() * source.height(),
            (x + width) * (y + height)
        ));
    }

    let mut dest = source.clone_shape(dest_width, dest_height, format);
    if let Some(palette) = source.palette()
    {
        dest.set_palette(palette.to_vec());
    }

    if dest_width <= width && dest_height <= height
    {
        shrink(source, &mut dest, x, y, width, height)?;
    }
    else if dest_width >= width && dest_height >= height
    {
        expand(source, &mut dest, x, y, width, height);
    }
    else if dest_width < width
    {
        // narrower but taller, shrink the width then grow the height
        trace!("mixed direction resize, shrinking to {}x{} first", dest_width, height);
        let mut step = source.clone_shape(dest_width, height, format);
        if let Some(palette) = source.palette()
        {
            step.set_palette(palette.to_vec());
        }
        shrink(source, &mut step, x, y, width, height)?;
        expand(&step, &mut dest, 0, 0, dest_width, height);
    }
    else
    {
        // wider but shorter, shrink the height then grow the width
        trace!("mixed direction resize, shrinking to {}x{} first", width, dest_height);
        let mut step = source.clone_shape(width, dest_height, format);
        if let Some(palette) = source.palette()
        {
            step.set_palette(palette.to_vec());
        }
        shrink(source, &mut step, x, y, width, height)?;
        expand(&step, &mut dest, 0, 0, width, dest_height);
    }
    Ok(dest)
}

/// Coverage coefficients for mapping `length` source pixels onto
/// `new_length` destination pixels, `new_length <= length`.
///
/// One pair per source pixel in 12 bit fixed point: the weight it
/// contributes to the current destination pixel and the weight spilled
/// into the next one. A `-1` spill marks a source pixel ending exactly
/// on a destination boundary, the destination index advances but
/// nothing is carried over. The final pair of a row is always such a
/// boundary.
fn create_coefficients(length: usize, new_length: usize) -> Vec<i32>
{
    let mut coefficients = vec![0i32; 2 * length];
    let (length, new_length) = (length as i32, new_length as i32);
    let normalize = (new_length << 12) / length;
    let mut sum = 0;

    for pair in coefficients.chunks_exact_mut(2)
    {
        let mut sum2 = sum + new_length;
        if sum2 > length
        {
            pair[0] = ((length - sum) << 12) / length;
            pair[1] = ((sum2 - length) << 12) / length;
            sum2 -= length;
        }
        else
        {
            pair[0] = normalize;
            if sum2 == length
            {
                pair[1] = -1;
                sum2 = 0;
            }
        }
        sum = sum2;
    }
    coefficients
}

/// Read source pixel `position` of `row` as weighted accumulator
/// channels.
///
/// Truecolor and 16 bpp sources produce four channels, B G R A for the
/// byte formats and R G B A for the packed ones, the write out uses
/// the same order per format. 1 bpp uses a single channel.
fn decode(format: PixelFormat, row: &[u8], position: usize, palette: &[u32]) -> [u32; 4]
{
    match format
    {
        PixelFormat::Argb32 =>
        {
            let ptr = 4 * position;
            [
                u32::from(row[ptr]),
                u32::from(row[ptr + 1]),
                u32::from(row[ptr + 2]),
                u32::from(row[ptr + 3])
            ]
        }
        PixelFormat::Rgb32 =>
        {
            let ptr = 4 * position;
            [
                u32::from(row[ptr]),
                u32::from(row[ptr + 1]),
                u32::from(row[ptr + 2]),
                255
            ]
        }
        PixelFormat::Rgb24 =>
        {
            let ptr = 3 * position;
            [
                u32::from(row[ptr]),
                u32::from(row[ptr + 1]),
                u32::from(row[ptr + 2]),
                255
            ]
        }
        PixelFormat::Rgb555 =>
        {
            let ptr = 2 * position;
            let (r, g, b) = expand_555(row[ptr], row[ptr + 1]);
            [u32::from(r), u32::from(g), u32::from(b), 255]
        }
        PixelFormat::Rgb565 =>
        {
            let ptr = 2 * position;
            let (r, g, b) = expand_565(row[ptr], row[ptr + 1]);
            [u32::from(r), u32::from(g), u32::from(b), 255]
        }
        PixelFormat::Indexed8 =>
        {
            let color = palette[usize::from(row[position])];
            [color >> 16 & 0xFF, color >> 8 & 0xFF, color & 0xFF, 255]
        }
        PixelFormat::Indexed4 =>
        {
            let color = palette[usize::from(read_nibble(row, position))];
            [color >> 16 & 0xFF, color >> 8 & 0xFF, color & 0xFF, 255]
        }
        _ => [255 * u32::from(read_bit_msb(row, position)), 0, 0, 0]
    }
}

/// Renormalize one accumulator line and store it as destination row
/// `line`. Accumulated weights per pixel sum to `4096 * 4096`, a 24
/// bit shift brings the channels back to 8 bits.
fn write_accumulated(
    dest: &mut Frame, line: usize, buffer: &[u32], palette: &[u32]
) -> Result<(), FrameErrors>
{
    let format = dest.get_format();
    let width = dest.width();
    let stride = dest.stride();
    let row = &mut dest.data_mut()[line * stride..];

    match format
    {
        PixelFormat::Rgb32 | PixelFormat::Argb32 =>
        {
            for x in 0..width
            {
                for channel in 0..4
                {
                    row[4 * x + channel] = (buffer[4 * x + channel] >> 24) as u8;
                }
            }
        }
        PixelFormat::Rgb24 =>
        {
            for x in 0..width
            {
                for channel in 0..3
                {
                    row[3 * x + channel] = (buffer[4 * x + channel] >> 24) as u8;
                }
            }
        }
        PixelFormat::Rgb555 | PixelFormat::Rgb565 =>
        {
            for x in 0..width
            {
                let r = (buffer[4 * x] >> 24) as u8;
                let g = (buffer[4 * x + 1] >> 24) as u8;
                let b = (buffer[4 * x + 2] >> 24) as u8;
                let packed = if format == PixelFormat::Rgb555
                {
                    pack_555(r, g, b)
                }
                else
                {
                    pack_565(r, g, b)
                };
                row[2 * x] = packed[0];
                row[2 * x + 1] = packed[1];
            }
        }
        PixelFormat::Indexed8 | PixelFormat::Indexed4 =>
        {
            if palette.is_empty()
            {
                return Err(FrameErrors::MissingPalette);
            }
            for x in 0..width
            {
                let r = (buffer[4 * x] >> 24) as u8;
                let g = (buffer[4 * x + 1] >> 24) as u8;
                let b = (buffer[4 * x + 2] >> 24) as u8;
                let position = nearest_color(palette, r, g, b) as u8;
                if format == PixelFormat::Indexed8
                {
                    row[x] = position;
                }
                else
                {
                    set_nibble(row, x, position);
                }
            }
        }
        _ =>
        {
            // 1 bpp, any coverage at all sets the pixel
            for x in 0..width
            {
                set_bit_msb(row, x, buffer[x] != 0);
            }
        }
    }
    Ok(())
}

/// Area averaging shrink of the source rectangle into the whole of
/// `dest`. Both destination axes must be no larger than the rectangle.
///
/// Walks the source once, splitting each pixel's weight between up to
/// four destination accumulators when it straddles a boundary. Only
/// two accumulator rows are live at a time, a row is renormalized and
/// written the moment the last source row touching it has been read.
fn shrink(
    source: &Frame, dest: &mut Frame, x: usize, y: usize, width: usize, height: usize
) -> Result<(), FrameErrors>
{
    let format = source.get_format();
    let (dest_width, dest_height) = dest.get_dimensions();

    let palette = match source.palette()
    {
        Some(palette) => palette.to_vec(),
        None if format.is_indexed() => return Err(FrameErrors::MissingPalette),
        None => Vec::new()
    };

    let row_coefficients = create_coefficients(width, dest_width);
    let column_coefficients = create_coefficients(height, dest_height);

    let channels = if format == PixelFormat::Indexed1 { 1 } else { 4 };
    let mut current = vec![0u32; channels * dest_width];
    let mut next = vec![0u32; channels * dest_width];

    let mut dest_y = 0;
    for source_y in 0..height
    {
        let (y_coefficient, y_spill) = row_weight(&column_coefficients, source_y);
        let cross_row = y_spill > 0;
        let src_row = source.scanline(y + source_y);

        let mut dest_x = 0;
        for source_x in 0..width
        {
            let (x_coefficient, x_spill) = row_weight(&row_coefficients, source_x);
            let pixel = decode(format, src_row, x + source_x, &palette);
            let base = channels * dest_x;

            let weight = (x_coefficient * y_coefficient) as u32;
            for channel in 0..channels
            {
                current[base + channel] += weight * pixel[channel];
            }
            if x_spill > 0
            {
                let weight = (x_spill * y_coefficient) as u32;
                for channel in 0..channels
                {
                    current[base + channels + channel] += weight * pixel[channel];
                }
            }
            if cross_row
            {
                let weight = (x_coefficient * y_spill) as u32;
                for channel in 0..channels
                {
                    next[base + channel] += weight * pixel[channel];
                }
                if x_spill > 0
                {
                    let weight = (x_spill * y_spill) as u32;
                    for channel in 0..channels
                    {
                        next[base + channels + channel] += weight * pixel[channel];
                    }
                }
            }
            if x_spill != 0
            {
                dest_x += 1;
            }
        }

        if y_spill != 0
        {
            write_accumulated(dest, dest_y, &current, &palette)?;
            dest_y += 1;
            std::mem::swap(&mut current, &mut next);
            next.fill(0);
        }
    }
    Ok(())
}

fn row_weight(coefficients: &[i32], position: usize) -> (i32, i32)
{
    (coefficients[2 * position], coefficients[2 * position + 1])
}

/// Pixel replicating expansion of the source rectangle into the whole
/// of `dest`. Both destination axes must be at least the rectangle's.
///
/// A pair of Bresenham accumulators decides after every written
/// destination pixel and row whether the source cursor advances, so
/// replication error stays under one source pixel everywhere without
/// any division.
fn expand(source: &Frame, dest: &mut Frame, x: usize, y: usize, width: usize, height: usize)
{
    let format = source.get_format();
    let (dest_width, dest_height) = dest.get_dimensions();
    let dest_stride = dest.stride();
    let bytes_per_pixel = format.bits_per_pixel() / 8;
    let dest_data = dest.data_mut();

    let mut sum_y = 0;
    let mut source_y = 0;

    for dest_y in 0..dest_height
    {
        let src_row = source.scanline(y + source_y);
        let dest_row = &mut dest_data[dest_y * dest_stride..(dest_y + 1) * dest_stride];

        let mut sum_x = 0;
        let mut source_x = 0;
        for dest_x in 0..dest_width
        {
            match format
            {
                PixelFormat::Indexed1 =>
                {
                    set_bit_msb(dest_row, dest_x, read_bit_msb(src_row, x + source_x));
                }
                PixelFormat::Indexed4 =>
                {
                    set_nibble(dest_row, dest_x, read_nibble(src_row, x + source_x));
                }
                _ =>
                {
                    let src_ptr = (x + source_x) * bytes_per_pixel;
                    let dest_ptr = dest_x * bytes_per_pixel;
                    dest_row[dest_ptr..dest_ptr + bytes_per_pixel]
                        .copy_from_slice(&src_row[src_ptr..src_ptr + bytes_per_pixel]);
                }
            }
            sum_x += width;
            if sum_x >= dest_width
            {
                source_x += 1;
                sum_x -= dest_width;
            }
        }

        sum_y += height;
        if sum_y >= dest_height
        {
            source_y += 1;
            sum_y -= dest_height;
        }
    }
}

#[cfg(test)]
mod tests
{
    use framix_core::format::PixelFormat;

    use super::{create_coefficients, resize};
    use crate::frame::Frame;

    fn rgb24(width: usize, height: usize, colors: &[u32]) -> Frame
    {
        let mut frame = Frame::new(width, height, PixelFormat::Rgb24);
        for y in 0..height
        {
            for x in 0..width
            {
                frame.set_pixel(x, y, colors[y * width + x]).unwrap();
            }
        }
        frame
    }

    #[test]
    fn coefficients_conserve_area()
    {
        // ratios where (new << 12) divides evenly distribute exactly
        // 4096 units of weight per destination pixel
        for (length, new_length) in [(8, 2), (16, 4), (6, 3), (10, 5), (4, 4)]
        {
            let coefficients = create_coefficients(length, new_length);
            let total: i64 = coefficients
                .iter()
                .filter(|c| **c > 0)
                .map(|c| i64::from(*c))
                .sum();
            assert_eq!(total, (new_length as i64) << 12, "{}->{}", length, new_length);
            // a row always ends exactly on a destination boundary
            assert_eq!(coefficients[2 * length - 1], -1);
        }
    }

    #[test]
    fn identity_resize_is_exact()
    {
        use nanorand::Rng;
        let mut rng = nanorand::WyRand::new();

        let mut colors = vec![0u32; 5 * 3];
        for color in &mut colors
        {
            *color = rng.generate::<u32>() & 0x00FF_FFFF;
        }
        let source = rgb24(5, 3, &colors);
        let same = resize(&source, 0, 0, 5, 3, 5, 3).unwrap();
        assert_eq!(same.data(), source.data());
    }

    #[test]
    fn uniform_shrink_stays_uniform()
    {
        let source = rgb24(4, 4, &[0x00C0_4020; 16]);
        let small = resize(&source, 0, 0, 4, 4, 2, 2).unwrap();
        for y in 0..2
        {
            for x in 0..2
            {
                assert_eq!(small.get_pixel(x, y).unwrap(), 0x00C0_4020);
            }
        }
    }

    #[test]
    fn shrink_averages_coverage()
    {
        // a 2x2 black and white checker collapses to mid gray
        let source = rgb24(2, 2, &[0xFFFFFF, 0x000000, 0x000000, 0xFFFFFF]);
        let small = resize(&source, 0, 0, 2, 2, 1, 1).unwrap();
        assert_eq!(small.get_pixel(0, 0).unwrap(), 0x007F_7F7F);
    }

    #[test]
    fn expand_replicates_pixels()
    {
        let source = rgb24(2, 1, &[0x111111, 0x222222]);
        let wide = resize(&source, 0, 0, 2, 1, 4, 1).unwrap();
        let expected = [0x111111, 0x111111, 0x222222, 0x222222];
        for (x, want) in expected.iter().enumerate()
        {
            assert_eq!(wide.get_pixel(x, 0).unwrap(), *want);
        }
    }

    #[test]
    fn expand_one_bit_rows()
    {
        let mut source = Frame::new(2, 2, PixelFormat::Indexed1);
        source.set_palette(vec![0x000000, 0xFFFFFF]);
        source.set_pixel(0, 0, 0xFFFFFF).unwrap();
        source.set_pixel(1, 1, 0xFFFFFF).unwrap();

        let big = resize(&source, 0, 0, 2, 2, 4, 4).unwrap();
        for y in 0..4
        {
            for x in 0..4
            {
                let want = source.get_pixel(x / 2, y / 2).unwrap();
                assert_eq!(big.get_pixel(x, y).unwrap(), want, "pixel {} {}", x, y);
            }
        }
    }

    #[test]
    fn indexed_shrink_requantizes_to_the_palette()
    {
        let mut source = Frame::new(4, 4, PixelFormat::Indexed8);
        source.set_palette(vec![0x000000, 0xFFFFFF]);
        for y in 0..4
        {
            for x in 0..4
            {
                source.data_mut()[y * 4 + x] = ((x + y) % 2) as u8;
            }
        }

        let small = resize(&source, 0, 0, 4, 4, 2, 2).unwrap();
        assert_eq!(small.palette(), source.palette());
        // every destination pixel averages to (127, 127, 127), which
        // resolves to black as the nearer entry
        for y in 0..2
        {
            for x in 0..2
            {
                assert_eq!(small.get_pixel(x, y).unwrap(), 0x000000);
            }
        }
    }

    #[test]
    fn mixed_directions_run_in_two_passes()
    {
        let source = rgb24(4, 2, &[0x0050_A0F0; 8]);
        let tall = resize(&source, 0, 0, 4, 2, 2, 4).unwrap();
        assert_eq!(tall.get_dimensions(), (2, 4));
        for y in 0..4
        {
            for x in 0..2
            {
                assert_eq!(tall.get_pixel(x, y).unwrap(), 0x0050_A0F0);
            }
        }

        let flat = resize(&source, 0, 0, 4, 2, 8, 1).unwrap();
        assert_eq!(flat.get_dimensions(), (8, 1));
        assert_eq!(flat.get_pixel(0, 0).unwrap(), 0x0050_A0F0);
    }

    #[test]
    fn sub_rectangles_are_honored()
    {
        let mut colors = vec![0x00FF_0000; 16];
        // a 2x2 green block at (1, 1)
        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)]
        {
            colors[y * 4 + x] = 0x0000_FF00;
        }
        let source = rgb24(4, 4, &colors);
        let cut = resize(&source, 1, 1, 2, 2, 2, 2).unwrap();
        for y in 0..2
        {
            for x in 0..2
            {
                assert_eq!(cut.get_pixel(x, y).unwrap(), 0x0000_FF00);
            }
        }
    }

    #[test]
    fn rejects_bad_requests()
    {
        let source = Frame::new(4, 4, PixelFormat::GrayScale16);
        assert!(resize(&source, 0, 0, 4, 4, 2, 2).is_err());

        let source = rgb24(4, 4, &[0; 16]);
        assert!(resize(&source, 0, 0, 4, 4, 0, 2).is_err());
        assert!(resize(&source, 2, 2, 4, 4, 2, 2).is_err());
    }
}
