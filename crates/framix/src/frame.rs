/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The frame working unit
//!
//! A [`Frame`] owns one packed pixel buffer plus the layout information
//! needed to interpret it. Frames are the unit every transformation in
//! this crate consumes and produces, a frame is never resized or
//! reformatted in place, only a new frame can differ in shape or
//! precision.
use framix_core::format::{mask_stride, PixelFormat};
use framix_core::palette::nearest_packed;
use framix_core::utils::{pack_555, pack_565, read_bit_msb, read_nibble, set_bit_msb, set_nibble};
use log::warn;

use crate::errors::FrameErrors;
use crate::reformat;
use crate::resize;

/// A packed, row major pixel buffer.
///
/// Invariants upheld by every constructor:
/// - `data.len() == height * stride`, with the stride derived from the
///   format and width (padded to four bytes).
/// - indexed frames carry a palette and every stored pixel value is a
///   valid position into it.
/// - the optional transparency mask is 1 bpp with its own stride.
#[derive(Clone)]
pub struct Frame
{
    width:             usize,
    height:            usize,
    stride:            usize,
    mask_stride:       usize,
    format:            PixelFormat,
    data:              Vec<u8>,
    palette:           Option<Vec<u32>>,
    mask:              Option<Vec<u8>>,
    transparent_pixel: Option<usize>,
    generated_mask:    bool
}

impl Frame
{
    /// Create a zero filled frame of the given shape.
    #[must_use]
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Frame
    {
        let stride = format.stride_for(width);
        Frame {
            width,
            height,
            stride,
            mask_stride: mask_stride(width),
            format,
            data: vec![0; height * stride],
            palette: None,
            mask: None,
            transparent_pixel: None,
            generated_mask: false
        }
    }

    /// Create a frame around an existing pixel buffer.
    ///
    /// # Errors
    /// - The buffer length does not equal `height * stride`.
    /// - The format is indexed and no palette was given.
    pub fn from_buf(
        width: usize, height: usize, format: PixelFormat, data: Vec<u8>,
        palette: Option<Vec<u32>>
    ) -> Result<Frame, FrameErrors>
    {
        let stride = format.stride_for(width);
        if data.len() != height * stride
        {
            return Err(FrameErrors::DimensionsMisMatch(height * stride, data.len()));
        }
        if format.is_indexed() && palette.is_none()
        {
            return Err(FrameErrors::MissingPalette);
        }
        Ok(Frame {
            width,
            height,
            stride,
            mask_stride: mask_stride(width),
            format,
            data,
            palette,
            mask: None,
            transparent_pixel: None,
            generated_mask: false
        })
    }

    /// Clone the shape related state of this frame into a new, zero
    /// filled frame of possibly different size and format.
    ///
    /// The pixel data and palette are not carried over, converters fill
    /// those in themselves. The transparent pixel marker is kept.
    #[must_use]
    pub fn clone_shape(&self, width: usize, height: usize, format: PixelFormat) -> Frame
    {
        let mut frame = Frame::new(width, height, format);
        frame.transparent_pixel = self.transparent_pixel;
        frame
    }

    /// Get frame dimensions as a `(width, height)` tuple.
    #[must_use]
    pub const fn get_dimensions(&self) -> (usize, usize)
    {
        (self.width, self.height)
    }

    #[must_use]
    pub const fn width(&self) -> usize
    {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize
    {
        self.height
    }

    /// Bytes per stored scanline, always a multiple of four.
    #[must_use]
    pub const fn stride(&self) -> usize
    {
        self.stride
    }

    /// Bytes per stored mask line.
    #[must_use]
    pub const fn mask_stride(&self) -> usize
    {
        self.mask_stride
    }

    #[must_use]
    pub const fn get_format(&self) -> PixelFormat
    {
        self.format
    }

    #[must_use]
    pub fn data(&self) -> &[u8]
    {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8]
    {
        &mut self.data
    }

    /// The palette for indexed frames, `None` for truecolor frames.
    #[must_use]
    pub fn palette(&self) -> Option<&[u32]>
    {
        self.palette.as_deref()
    }

    pub fn set_palette(&mut self, palette: Vec<u32>)
    {
        self.palette = Some(palette);
    }

    #[must_use]
    pub fn mask(&self) -> Option<&[u8]>
    {
        self.mask.as_deref()
    }

    /// Position in the palette treated as fully transparent, if any.
    #[must_use]
    pub const fn transparent_pixel(&self) -> Option<usize>
    {
        self.transparent_pixel
    }

    pub fn set_transparent_pixel(&mut self, position: Option<usize>)
    {
        self.transparent_pixel = position;
    }

    /// Allocate an all clear transparency mask if none is present.
    pub fn add_mask(&mut self)
    {
        if self.mask.is_none()
        {
            self.mask = Some(vec![0; self.height * self.mask_stride]);
        }
    }

    pub(crate) fn set_mask_buf(&mut self, mask: Vec<u8>)
    {
        self.mask = Some(mask);
    }

    /// Read one mask bit, clear when no mask is present.
    #[must_use]
    pub fn get_mask(&self, x: usize, y: usize) -> bool
    {
        match &self.mask
        {
            Some(mask) => read_bit_msb(&mask[y * self.mask_stride..], x),
            None => false
        }
    }

    /// Set one mask bit, allocating the mask on first use.
    pub fn set_mask(&mut self, x: usize, y: usize, on: bool)
    {
        self.add_mask();
        let stride = self.mask_stride;
        if let Some(mask) = &mut self.mask
        {
            set_bit_msb(&mut mask[y * stride..], x, on);
        }
    }

    /// Borrow one stored scanline, including any padding bytes.
    #[must_use]
    pub fn scanline(&self, line: usize) -> &[u8]
    {
        &self.data[line * self.stride..(line + 1) * self.stride]
    }

    /// Overwrite one stored scanline.
    ///
    /// The buffer must hold at least `stride` bytes.
    pub fn set_scanline(&mut self, line: usize, buffer: &[u8])
    {
        let stride = self.stride;
        self.data[line * stride..(line + 1) * stride].copy_from_slice(&buffer[..stride]);
    }

    /// Borrow one mask line, `None` when no mask is present.
    #[must_use]
    pub fn mask_line(&self, line: usize) -> Option<&[u8]>
    {
        self.mask
            .as_ref()
            .map(|m| &m[line * self.mask_stride..(line + 1) * self.mask_stride])
    }

    /// Overwrite one mask line, allocating the mask on first use.
    pub fn set_mask_line(&mut self, line: usize, buffer: &[u8])
    {
        self.add_mask();
        let stride = self.mask_stride;
        if let Some(mask) = &mut self.mask
        {
            mask[line * stride..(line + 1) * stride].copy_from_slice(&buffer[..stride]);
        }
    }

    /// Read the pixel at `(x, y)` as a packed `0x00RRGGBB` color.
    ///
    /// Premultiplied formats are un-premultiplied on read, wide 16 bit
    /// per channel formats return their high bytes, alpha is dropped.
    pub fn get_pixel(&self, x: usize, y: usize) -> Result<u32, FrameErrors>
    {
        let row = self.scanline(y);
        match self.format
        {
            PixelFormat::PArgb64 =>
            {
                let ptr = 8 * x;
                let a = u32::from(row[ptr + 7]);
                if a == 0
                {
                    return Ok(0);
                }
                let b = u32::from(row[ptr + 1]) * 255 / a;
                let g = u32::from(row[ptr + 3]) * 255 / a;
                let r = u32::from(row[ptr + 5]) * 255 / a;
                Ok(b | g << 8 | r << 16)
            }
            PixelFormat::Argb64 =>
            {
                let ptr = 8 * x;
                Ok(u32::from(row[ptr + 1])
                    | u32::from(row[ptr + 3]) << 8
                    | u32::from(row[ptr + 5]) << 16)
            }
            PixelFormat::Rgb48 =>
            {
                let ptr = 6 * x;
                Ok(u32::from(row[ptr + 1])
                    | u32::from(row[ptr + 3]) << 8
                    | u32::from(row[ptr + 5]) << 16)
            }
            PixelFormat::PArgb32 =>
            {
                let ptr = 4 * x;
                let a = u32::from(row[ptr + 3]);
                if a == 0
                {
                    return Ok(0);
                }
                let b = u32::from(row[ptr]) * 255 / a;
                let g = u32::from(row[ptr + 1]) * 255 / a;
                let r = u32::from(row[ptr + 2]) * 255 / a;
                Ok(b | g << 8 | r << 16)
            }
            PixelFormat::Argb32 | PixelFormat::Rgb32 =>
            {
                let ptr = 4 * x;
                Ok(u32::from(row[ptr])
                    | u32::from(row[ptr + 1]) << 8
                    | u32::from(row[ptr + 2]) << 16)
            }
            PixelFormat::Rgb24 =>
            {
                let ptr = 3 * x;
                Ok(u32::from(row[ptr])
                    | u32::from(row[ptr + 1]) << 8
                    | u32::from(row[ptr + 2]) << 16)
            }
            PixelFormat::Rgb565 =>
            {
                let ptr = 2 * x;
                let (r, g, b) = framix_core::utils::expand_565(row[ptr], row[ptr + 1]);
                Ok(u32::from(b) | u32::from(g) << 8 | u32::from(r) << 16)
            }
            PixelFormat::Rgb555 =>
            {
                let ptr = 2 * x;
                let (r, g, b) = framix_core::utils::expand_555(row[ptr], row[ptr + 1]);
                Ok(u32::from(b) | u32::from(g) << 8 | u32::from(r) << 16)
            }
            PixelFormat::GrayScale16 =>
            {
                let all = u32::from(row[2 * x + 1]);
                Ok(all | all << 8 | all << 16)
            }
            PixelFormat::Indexed8 =>
            {
                let palette = self.palette.as_ref().ok_or(FrameErrors::MissingPalette)?;
                Ok(palette[usize::from(row[x])])
            }
            PixelFormat::Indexed4 =>
            {
                let palette = self.palette.as_ref().ok_or(FrameErrors::MissingPalette)?;
                Ok(palette[usize::from(read_nibble(row, x))])
            }
            PixelFormat::Indexed1 =>
            {
                let palette = self.palette.as_ref().ok_or(FrameErrors::MissingPalette)?;
                Ok(palette[usize::from(read_bit_msb(row, x))])
            }
            other => Err(FrameErrors::UnsupportedFormat(other, "get_pixel"))
        }
    }

    /// Write a packed `0x00RRGGBB` color to `(x, y)`.
    ///
    /// Indexed destinations are resolved to the nearest palette entry.
    /// Only the byte and sub byte formats the container writers emit
    /// are writable, wide formats fail with an unsupported error.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: u32) -> Result<(), FrameErrors>
    {
        let stride = self.stride;
        let r = ((color >> 16) & 0xFF) as u8;
        let g = ((color >> 8) & 0xFF) as u8;
        let b = (color & 0xFF) as u8;

        match self.format
        {
            PixelFormat::Rgb24 =>
            {
                let ptr = y * stride + 3 * x;
                self.data[ptr] = b;
                self.data[ptr + 1] = g;
                self.data[ptr + 2] = r;
            }
            PixelFormat::Rgb32 | PixelFormat::Argb32 =>
            {
                let opacity = if self.format == PixelFormat::Argb32 { 255 } else { 0 };
                let ptr = y * stride + 4 * x;
                self.data[ptr] = b;
                self.data[ptr + 1] = g;
                self.data[ptr + 2] = r;
                self.data[ptr + 3] = opacity;
            }
            PixelFormat::Rgb565 =>
            {
                let ptr = y * stride + 2 * x;
                let packed = pack_565(r, g, b);
                self.data[ptr] = packed[0];
                self.data[ptr + 1] = packed[1];
            }
            PixelFormat::Rgb555 =>
            {
                let ptr = y * stride + 2 * x;
                let packed = pack_555(r, g, b);
                self.data[ptr] = packed[0];
                self.data[ptr + 1] = packed[1];
            }
            PixelFormat::Indexed8 =>
            {
                let palette = self.palette.as_ref().ok_or(FrameErrors::MissingPalette)?;
                let position = nearest_packed(palette, color) as u8;
                self.data[y * stride + x] = position;
            }
            PixelFormat::Indexed4 =>
            {
                let palette = self.palette.as_ref().ok_or(FrameErrors::MissingPalette)?;
                let position = nearest_packed(palette, color) as u8;
                set_nibble(&mut self.data[y * stride..], x, position);
            }
            PixelFormat::Indexed1 =>
            {
                let palette = self.palette.as_ref().ok_or(FrameErrors::MissingPalette)?;
                let position = nearest_packed(palette, color);
                set_bit_msb(&mut self.data[y * stride..], x, position != 0);
            }
            other => return Err(FrameErrors::UnsupportedFormat(other, "set_pixel"))
        }
        Ok(())
    }

    /// Convert this frame to another pixel format.
    ///
    /// See [`reformat::reformat`] for the conversion matrix.
    pub fn reformat(&self, format: PixelFormat) -> Result<Frame, FrameErrors>
    {
        reformat::reformat(self, format)
    }

    /// Resample the sub rectangle `(x, y, width, height)` of this
    /// frame to `dest_width` x `dest_height`.
    pub fn resize(
        &self, x: usize, y: usize, width: usize, height: usize, dest_width: usize,
        dest_height: usize
    ) -> Result<Frame, FrameErrors>
    {
        resize::resize(self, x, y, width, height, dest_width, dest_height)
    }

    /// Get a re-scaled version of this frame.
    ///
    /// Scaling to the current size returns a plain copy.
    pub fn scale(&self, new_width: usize, new_height: usize) -> Result<Frame, FrameErrors>
    {
        if new_width == self.width && new_height == self.height
        {
            return Ok(self.clone());
        }
        resize::resize(self, 0, 0, self.width, self.height, new_width, new_height)
    }

    /// Crop the rectangle `(x, y, width, height)` out of this frame
    /// and scale it to `dest_width` x `dest_height`.
    ///
    /// When the destination size equals the crop size this degenerates
    /// to a plain region copy. Shearing and rotation are not
    /// implemented, this is the axis aligned subset of the adjust
    /// operation the container layer exposes.
    pub fn adjust(
        &self, x: usize, y: usize, width: usize, height: usize, dest_width: usize,
        dest_height: usize
    ) -> Result<Frame, FrameErrors>
    {
        if width == dest_width && height == dest_height
        {
            let mut frame = self.clone_shape(dest_width, dest_height, self.format);
            if let Some(palette) = &self.palette
            {
                frame.palette = Some(palette.clone());
            }
            frame.copy_region(0, 0, width, height, self, x, y)?;
            return Ok(frame);
        }
        resize::resize(self, x, y, width, height, dest_width, dest_height)
    }

    /// Copy a `width` x `height` rectangle from `source`, read from
    /// `(source_x, source_y)`, into this frame at `(x, y)`.
    ///
    /// Both frames must share a pixel format, depth conversions are
    /// deliberately explicit through [`reformat`](Self::reformat). The
    /// rectangle is clamped to both frames. The source palette and
    /// mask, when present, replace the destination's.
    pub fn copy_region(
        &mut self, x: usize, y: usize, width: usize, height: usize, source: &Frame,
        source_x: usize, source_y: usize
    ) -> Result<(), FrameErrors>
    {
        if source.format != self.format
        {
            return Err(FrameErrors::InvalidOperation(
                "region copy requires matching pixel formats"
            ));
        }

        let mut width = width.min(self.width.saturating_sub(x));
        let mut height = height.min(self.height.saturating_sub(y));
        width = width.min(source.width.saturating_sub(source_x));
        height = height.min(source.height.saturating_sub(source_y));
        if width == 0 || height == 0
        {
            return Ok(());
        }

        if let Some(palette) = &source.palette
        {
            self.palette = Some(palette.clone());
        }

        let bits = self.format.bits_per_pixel();
        copy_bits(
            bits,
            &mut self.data,
            self.stride,
            x,
            y,
            width,
            height,
            &source.data,
            source.stride,
            source_x,
            source_y
        );

        if let Some(source_mask) = &source.mask
        {
            self.add_mask();
            let mask_stride = self.mask_stride;
            if let Some(mask) = &mut self.mask
            {
                copy_bits(
                    1,
                    mask,
                    mask_stride,
                    x,
                    y,
                    width,
                    height,
                    source_mask,
                    source.mask_stride,
                    source_x,
                    source_y
                );
            }
        }
        Ok(())
    }

    /// Lazily build the transparency mask.
    ///
    /// Indexed frames with a transparent pixel derive the mask from
    /// pixel values, alpha formats derive it from the alpha channel.
    /// Frames with neither stay maskless.
    pub fn build_mask(&mut self) -> Option<&[u8]>
    {
        if self.mask.is_none() && self.transparent_pixel.is_some()
        {
            self.generate_transparency_mask();
        }
        else if self.mask.is_none() && self.format.has_alpha()
        {
            self.generate_alpha_mask();
        }
        self.mask.as_deref()
    }

    /// Mark every pixel of the given packed color transparent in the
    /// mask, every other pixel opaque.
    ///
    /// A frame that already has a mask from its container, or a
    /// transparent palette position, keeps that information instead of
    /// the supplied color, icon files rarely name their real
    /// transparency color exactly.
    pub fn make_transparent(&mut self, color: u32) -> Result<(), FrameErrors>
    {
        if self.mask.is_some() && !self.generated_mask
        {
            warn!("frame already carries a container mask, transparency color ignored");
            return Ok(());
        }
        let color = match (self.transparent_pixel, &self.palette)
        {
            (Some(position), Some(palette)) if position < palette.len() =>
            {
                palette[position] & 0x00FF_FFFF
            }
            _ =>
            {
                self.generated_mask = true;
                color
            }
        };

        self.add_mask();
        for y in 0..self.height
        {
            for x in 0..self.width
            {
                let pixel = self.get_pixel(x, y)?;
                self.set_mask(x, y, pixel != color);
            }
        }
        Ok(())
    }

    // Generate the mask from the transparent palette position.
    fn generate_transparency_mask(&mut self)
    {
        let (Some(transparent), Some(palette)) = (self.transparent_pixel, &self.palette)
        else
        {
            return;
        };
        if !self.format.is_indexed() || transparent >= palette.len()
        {
            return;
        }

        self.add_mask();
        let mask_stride = self.mask_stride;
        let stride = self.stride;
        let (format, width, height) = (self.format, self.width, self.height);
        let data = &self.data;
        let mask = self.mask.as_mut().unwrap();

        for y in 0..height
        {
            let row = &data[y * stride..];
            let mask_row = &mut mask[y * mask_stride..];
            match format
            {
                PixelFormat::Indexed8 =>
                {
                    for x in 0..width
                    {
                        if usize::from(row[x]) != transparent
                        {
                            set_bit_msb(mask_row, x, true);
                        }
                    }
                }
                PixelFormat::Indexed4 =>
                {
                    for x in 0..width
                    {
                        if usize::from(read_nibble(row, x)) != transparent
                        {
                            set_bit_msb(mask_row, x, true);
                        }
                    }
                }
                PixelFormat::Indexed1 =>
                {
                    // the mask is the pixel plane itself, inverted when
                    // position one is the transparent one
                    for x in 0..stride.min(mask_stride)
                    {
                        mask_row[x] = if transparent == 0 { row[x] } else { !row[x] };
                    }
                }
                _ => {}
            }
        }
        self.generated_mask = true;
    }

    // Generate the mask from the alpha channel, any nonzero alpha is
    // treated as opaque.
    fn generate_alpha_mask(&mut self)
    {
        if self.palette.is_some() || !self.format.has_alpha()
        {
            return;
        }

        self.add_mask();
        let mask_stride = self.mask_stride;
        let stride = self.stride;
        let (format, width, height) = (self.format, self.width, self.height);
        let data = &self.data;
        let mask = self.mask.as_mut().unwrap();

        for y in 0..height
        {
            let row = &data[y * stride..];
            let mask_row = &mut mask[y * mask_stride..];
            for x in 0..width
            {
                let alpha = match format
                {
                    PixelFormat::Argb32 | PixelFormat::PArgb32 => row[4 * x + 3],
                    PixelFormat::Argb64 | PixelFormat::PArgb64 => row[8 * x + 7],
                    PixelFormat::Argb1555 => row[2 * x + 1] >> 7,
                    _ => 0xFF
                };
                if alpha != 0
                {
                    set_bit_msb(mask_row, x, true);
                }
            }
        }
        self.generated_mask = true;
    }
}

/// Copy a rectangle between two buffers of `bits` bits per pixel.
///
/// Byte aligned formats copy whole row segments. The sub byte formats
/// go pixel by pixel through the shared bit and nibble helpers so that
/// rectangles can start and land on any pixel boundary without
/// clobbering the bits on either side of the destination edge.
#[allow(clippy::too_many_arguments)]
fn copy_bits(
    bits: usize, dest_data: &mut [u8], dest_stride: usize, x: usize, y: usize, width: usize,
    height: usize, source_data: &[u8], source_stride: usize, source_x: usize, source_y: usize
)
{
    if bits >= 8
    {
        let mut source_row = source_y * source_stride + source_x * bits / 8;
        let mut dest_row = y * dest_stride + x * bits / 8;
        let line_length = width * bits / 8;

        for _ in 0..height
        {
            dest_data[dest_row..dest_row + line_length]
                .copy_from_slice(&source_data[source_row..source_row + line_length]);
            source_row += source_stride;
            dest_row += dest_stride;
        }
        return;
    }

    for line in 0..height
    {
        let source_row = &source_data[(source_y + line) * source_stride..];
        let dest_row = &mut dest_data[(y + line) * dest_stride..];

        if bits == 4
        {
            for i in 0..width
            {
                set_nibble(dest_row, x + i, read_nibble(source_row, source_x + i));
            }
        }
        else
        {
            for i in 0..width
            {
                set_bit_msb(dest_row, x + i, read_bit_msb(source_row, source_x + i));
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use framix_core::format::PixelFormat;

    use super::Frame;

    #[test]
    fn buffer_length_is_validated()
    {
        let result = Frame::from_buf(3, 2, PixelFormat::Rgb24, vec![0; 10], None);
        assert!(result.is_err());
        // 3 pixels * 3 bytes = 9, padded to 12, 2 rows
        let result = Frame::from_buf(3, 2, PixelFormat::Rgb24, vec![0; 24], None);
        assert!(result.is_ok());
    }

    #[test]
    fn indexed_frames_require_palettes()
    {
        assert!(Frame::from_buf(4, 1, PixelFormat::Indexed8, vec![0; 4], None).is_err());
        assert!(
            Frame::from_buf(4, 1, PixelFormat::Indexed8, vec![0; 4], Some(vec![0; 256])).is_ok()
        );
    }

    #[test]
    fn pixel_round_trip_rgb24()
    {
        let mut frame = Frame::new(4, 3, PixelFormat::Rgb24);
        frame.set_pixel(2, 1, 0x0012_3456).unwrap();
        assert_eq!(frame.get_pixel(2, 1).unwrap(), 0x0012_3456);
        assert_eq!(frame.get_pixel(0, 0).unwrap(), 0);
    }

    #[test]
    fn pixel_round_trip_indexed()
    {
        let mut frame = Frame::new(9, 2, PixelFormat::Indexed1);
        frame.set_palette(vec![0x000000, 0xFFFFFF]);
        frame.set_pixel(8, 1, 0x00FF_FFFF).unwrap();
        assert_eq!(frame.get_pixel(8, 1).unwrap(), 0xFFFFFF);
        assert_eq!(frame.get_pixel(7, 1).unwrap(), 0x000000);

        let mut frame = Frame::new(5, 1, PixelFormat::Indexed4);
        frame.set_palette(vec![0x000000, 0xFF0000, 0x00FF00, 0x0000FF]);
        frame.set_pixel(3, 0, 0x0000_FF00).unwrap();
        assert_eq!(frame.get_pixel(3, 0).unwrap(), 0x00FF00);
    }

    #[test]
    fn wide_formats_read_high_bytes()
    {
        let mut frame = Frame::new(1, 1, PixelFormat::Rgb48);
        // B, G, R as little endian u16 channels
        frame.data_mut()[..6].copy_from_slice(&[0x00, 0x12, 0x00, 0x34, 0x00, 0x56]);
        assert_eq!(frame.get_pixel(0, 0).unwrap(), 0x0056_3412);
    }

    #[test]
    fn premultiplied_pixels_are_unmultiplied()
    {
        let mut frame = Frame::new(1, 1, PixelFormat::PArgb32);
        // half opacity, stored channels are half of the true color
        frame.data_mut()[..4].copy_from_slice(&[0x40, 0x20, 0x10, 0x80]);
        let pixel = frame.get_pixel(0, 0).unwrap();
        assert_eq!(pixel, 0x001F_3F7F);
    }

    #[test]
    fn region_copy_byte_aligned()
    {
        let mut source = Frame::new(4, 4, PixelFormat::Rgb24);
        for y in 0..4
        {
            for x in 0..4
            {
                source.set_pixel(x, y, (x as u32) << 16 | (y as u32)).unwrap();
            }
        }
        let mut dest = Frame::new(4, 4, PixelFormat::Rgb24);
        dest.copy_region(1, 1, 2, 2, &source, 0, 0).unwrap();
        assert_eq!(dest.get_pixel(1, 1).unwrap(), 0x0000_0000);
        assert_eq!(dest.get_pixel(2, 2).unwrap(), 0x0001_0001);
        assert_eq!(dest.get_pixel(0, 0).unwrap(), 0);
        assert_eq!(dest.get_pixel(3, 3).unwrap(), 0);
    }

    #[test]
    fn region_copy_sub_byte_shifts()
    {
        // a 1 bpp checker copied to an unaligned destination position
        let mut source = Frame::new(16, 2, PixelFormat::Indexed1);
        source.set_palette(vec![0x000000, 0xFFFFFF]);
        for x in (0..16).step_by(2)
        {
            source.set_pixel(x, 0, 0xFFFFFF).unwrap();
        }

        let mut dest = Frame::new(16, 2, PixelFormat::Indexed1);
        dest.set_palette(vec![0x000000, 0xFFFFFF]);
        dest.copy_region(3, 0, 8, 1, &source, 0, 0).unwrap();

        for x in 0..8
        {
            let expected = x % 2 == 0;
            let got = dest.get_pixel(3 + x, 0).unwrap() == 0xFFFFFF;
            assert_eq!(got, expected, "pixel {}", x);
        }
    }

    #[test]
    fn region_copy_rejects_format_mixes()
    {
        let source = Frame::new(2, 2, PixelFormat::Rgb24);
        let mut dest = Frame::new(2, 2, PixelFormat::Rgb32);
        assert!(dest.copy_region(0, 0, 2, 2, &source, 0, 0).is_err());
    }

    #[test]
    fn transparency_mask_from_palette_position()
    {
        let mut frame = Frame::new(4, 1, PixelFormat::Indexed8);
        frame.set_palette(vec![0x000000, 0xFF0000]);
        frame.data_mut()[..4].copy_from_slice(&[0, 1, 0, 1]);
        frame.set_transparent_pixel(Some(0));

        frame.build_mask().unwrap();
        assert!(!frame.get_mask(0, 0));
        assert!(frame.get_mask(1, 0));
        assert!(!frame.get_mask(2, 0));
        assert!(frame.get_mask(3, 0));
    }

    #[test]
    fn alpha_mask_from_alpha_channel()
    {
        let mut frame = Frame::new(2, 1, PixelFormat::Argb32);
        frame.data_mut()[..8].copy_from_slice(&[0, 0, 0, 0xFF, 0, 0, 0, 0]);
        frame.build_mask().unwrap();
        assert!(frame.get_mask(0, 0));
        assert!(!frame.get_mask(1, 0));
    }

    #[test]
    fn make_transparent_matches_color()
    {
        let mut frame = Frame::new(2, 2, PixelFormat::Rgb24);
        frame.set_pixel(0, 0, 0x00FF_00FF).unwrap();
        frame.make_transparent(0x00FF_00FF).unwrap();
        assert!(!frame.get_mask(0, 0));
        assert!(frame.get_mask(1, 1));
    }
}
