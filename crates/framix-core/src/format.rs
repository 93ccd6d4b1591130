/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Pixel format definitions and scanline layout arithmetic
use bitflags::bitflags;

bitflags! {
    /// Orthogonal properties a pixel format may carry.
    ///
    /// `INDEXED` formats store palette positions instead of color values
    /// and therefore require a palette on any frame using them.
    /// `ALPHA` formats carry a per pixel opacity channel.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct FormatFlags: u8
    {
        const INDEXED = 0b0000_0001;
        const ALPHA   = 0b0000_0010;
    }
}

/// The storage format of a single pixel.
///
/// Pixels are packed in row major order, rows padded to a four byte
/// boundary (see [`PixelFormat::stride_for`]). Multi byte truecolor
/// formats store channels little endian, i.e. blue in the lowest byte
/// for the 24 and 32 bit formats.
///
/// A format is fixed at frame construction time, converting a frame
/// to another format always produces a new frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum PixelFormat
{
    /// 1 bit per pixel, MSB first, two palette entries.
    Indexed1,
    /// 4 bits per pixel, high nibble first, up to 16 palette entries.
    Indexed4,
    /// 8 bits per pixel, up to 256 palette entries.
    Indexed8,
    /// 16 bit grayscale, intensity in the high byte.
    GrayScale16,
    /// 16 bits per pixel, `0RRRRRGG GGGBBBBB`.
    Rgb555,
    /// 16 bits per pixel, `RRRRRGGG GGGBBBBB`.
    Rgb565,
    /// 16 bits per pixel, one alpha bit above a 555 color.
    Argb1555,
    /// 24 bits per pixel, `B G R` byte order.
    Rgb24,
    /// 32 bits per pixel, `B G R x`, the fourth byte unused.
    Rgb32,
    /// 32 bits per pixel, `B G R A`.
    Argb32,
    /// 32 bits per pixel, color channels premultiplied by alpha.
    PArgb32,
    /// 48 bits per pixel, 16 bits per channel.
    Rgb48,
    /// 64 bits per pixel, 16 bits per channel plus alpha.
    Argb64,
    /// 64 bits per pixel, premultiplied.
    PArgb64,
}

impl PixelFormat
{
    /// Return the property flags of this format.
    #[must_use]
    pub const fn flags(self) -> FormatFlags
    {
        match self
        {
            Self::Indexed1 | Self::Indexed4 | Self::Indexed8 => FormatFlags::INDEXED,

            Self::Argb1555 | Self::Argb32 | Self::PArgb32 | Self::Argb64 | Self::PArgb64 =>
            {
                FormatFlags::ALPHA
            }

            Self::GrayScale16
            | Self::Rgb555
            | Self::Rgb565
            | Self::Rgb24
            | Self::Rgb32
            | Self::Rgb48 => FormatFlags::empty(),
        }
    }

    /// True if pixels of this format are positions into a palette.
    #[must_use]
    pub const fn is_indexed(self) -> bool
    {
        self.flags().contains(FormatFlags::INDEXED)
    }

    /// True if this format carries an alpha channel.
    #[must_use]
    pub const fn has_alpha(self) -> bool
    {
        self.flags().contains(FormatFlags::ALPHA)
    }

    /// Number of bits a single pixel occupies.
    #[rustfmt::skip]
    #[must_use]
    pub const fn bits_per_pixel(self) -> usize
    {
        match self
        {
            Self::Indexed1                                        => 1,
            Self::Indexed4                                        => 4,
            Self::Indexed8                                        => 8,
            Self::GrayScale16 | Self::Rgb555
            | Self::Rgb565 | Self::Argb1555                       => 16,
            Self::Rgb24                                           => 24,
            Self::Rgb32 | Self::Argb32 | Self::PArgb32            => 32,
            Self::Rgb48                                           => 48,
            Self::Argb64 | Self::PArgb64                          => 64,
        }
    }

    /// Unpadded length in bytes of a scanline holding `width` pixels.
    #[must_use]
    pub const fn bytes_per_line(self, width: usize) -> usize
    {
        (width * self.bits_per_pixel() + 7) / 8
    }

    /// Length in bytes of a stored scanline holding `width` pixels.
    ///
    /// Scanlines are rounded up to whole bytes and then padded to a
    /// four byte boundary, the padding bytes carry no pixel data.
    #[must_use]
    pub const fn stride_for(self, width: usize) -> usize
    {
        (self.bytes_per_line(width) + 3) & !3
    }

    /// Number of palette entries an indexed frame of this format
    /// carries, `None` for truecolor formats.
    #[must_use]
    pub const fn palette_entries(self) -> Option<usize>
    {
        if self.is_indexed()
        {
            Some(1 << self.bits_per_pixel())
        }
        else
        {
            None
        }
    }
}

/// Stride of a 1 bit per pixel transparency mask covering `width`
/// pixels, padded to a four byte boundary like pixel scanlines.
#[must_use]
pub const fn mask_stride(width: usize) -> usize
{
    ((width + 7) / 8 + 3) & !3
}

#[cfg(feature = "serde")]
impl serde::Serialize for PixelFormat
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer
    {
        serializer.serialize_str(&format!("{:?}", self))
    }
}
