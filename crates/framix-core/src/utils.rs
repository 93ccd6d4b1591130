/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Bit level helpers shared by the converter and resizer
//!
//! The sub byte routines fix the packing conventions that are part of
//! the on disk contract of the surrounding container formats: 1 bpp
//! rows are MSB first, 4 bpp rows store the leftmost pixel in the high
//! nibble. 16 bpp colors are stored little endian, the low byte first.
//!
//! Channel promotion between differing bit widths is a linear rescale,
//! a 5 bit value `v` becomes `v * 255 / 31` in 8 bits and a 6 bit
//! green becomes `v * 255 / 63`. Demotion rounds to the nearest
//! representable value, so every 5/6 bit representable color survives
//! a round trip unchanged and arbitrary colors lose at most half a
//! quantization step per channel.

/// Promote a 5 bit channel value to 8 bits.
#[must_use]
pub const fn scale5(v: u8) -> u8
{
    ((v as u32) * 255 / 31) as u8
}

/// Promote a 6 bit channel value to 8 bits.
#[must_use]
pub const fn scale6(v: u8) -> u8
{
    ((v as u32) * 255 / 63) as u8
}

/// Decode a little endian 555 pixel to 8 bit `(r, g, b)`.
#[must_use]
pub const fn expand_555(lo: u8, hi: u8) -> (u8, u8, u8)
{
    let b = lo & 0x1F;
    let g = (hi << 3 & 0x18) | (lo >> 5 & 0x07);
    let r = hi >> 2 & 0x1F;
    (scale5(r), scale5(g), scale5(b))
}

/// Decode a little endian 565 pixel to 8 bit `(r, g, b)`.
#[must_use]
pub const fn expand_565(lo: u8, hi: u8) -> (u8, u8, u8)
{
    let b = lo & 0x1F;
    let g = (hi << 3 & 0x38) | (lo >> 5 & 0x07);
    let r = hi >> 3;
    (scale5(r), scale6(g), scale5(b))
}

/// Demote an 8 bit channel value to 5 bits, rounding to nearest.
#[must_use]
pub const fn demote5(v: u8) -> u8
{
    (((v as u32) * 31 + 127) / 255) as u8
}

/// Demote an 8 bit channel value to 6 bits, rounding to nearest.
#[must_use]
pub const fn demote6(v: u8) -> u8
{
    (((v as u32) * 63 + 127) / 255) as u8
}

/// Encode 8 bit channels as a little endian 555 pixel.
#[must_use]
pub const fn pack_555(r: u8, g: u8, b: u8) -> [u8; 2]
{
    let (r, g, b) = (demote5(r), demote5(g), demote5(b));
    let lo = (g << 5) | b;
    let hi = (r << 2) | (g >> 3);
    [lo, hi]
}

/// Encode 8 bit channels as a little endian 565 pixel.
#[must_use]
pub const fn pack_565(r: u8, g: u8, b: u8) -> [u8; 2]
{
    let (r, g, b) = (demote5(r), demote6(g), demote5(b));
    let lo = (g << 5) | b;
    let hi = (r << 3) | (g >> 3);
    [lo, hi]
}

/// Read pixel `x` of an MSB first 1 bpp row.
#[must_use]
pub fn read_bit_msb(row: &[u8], x: usize) -> bool
{
    (row[x >> 3] & (0x80 >> (x & 0x7))) != 0
}

/// Set pixel `x` of an MSB first 1 bpp row.
pub fn set_bit_msb(row: &mut [u8], x: usize, on: bool)
{
    let mask = 0x80 >> (x & 0x7);
    if on
    {
        row[x >> 3] |= mask;
    }
    else
    {
        row[x >> 3] &= !mask;
    }
}

/// Read pixel `x` of a high nibble first 4 bpp row.
#[must_use]
pub fn read_nibble(row: &[u8], x: usize) -> u8
{
    if (x & 0x1) == 0
    {
        row[x >> 1] >> 4
    }
    else
    {
        row[x >> 1] & 0x0F
    }
}

/// Set pixel `x` of a high nibble first 4 bpp row.
pub fn set_nibble(row: &mut [u8], x: usize, value: u8)
{
    let cell = &mut row[x >> 1];
    if (x & 0x1) == 0
    {
        *cell = (value << 4) | (*cell & 0x0F);
    }
    else
    {
        *cell = (*cell & 0xF0) | (value & 0x0F);
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn representable_colors_round_trip_565()
    {
        // channels that fit 5/6/5 bits exactly survive pack -> expand
        for r5 in 0..32u8
        {
            let r = scale5(r5);
            let [lo, hi] = pack_565(r, 0, 0);
            assert_eq!(expand_565(lo, hi).0, r);
        }
        for g6 in 0..64u8
        {
            let g = scale6(g6);
            let [lo, hi] = pack_565(0, g, 0);
            assert_eq!(expand_565(lo, hi).1, g);
        }
    }

    #[test]
    fn arbitrary_color_loss_is_bounded()
    {
        for r in 0..=255u8
        {
            let [lo, hi] = pack_555(r, r, r);
            let (rr, gg, bb) = expand_555(lo, hi);
            assert!(r.abs_diff(rr) <= 4);
            assert!(r.abs_diff(gg) <= 4);
            assert!(r.abs_diff(bb) <= 4);

            let [lo, hi] = pack_565(r, r, r);
            let (rr, gg, bb) = expand_565(lo, hi);
            assert!(r.abs_diff(rr) <= 4);
            assert!(r.abs_diff(gg) <= 2);
            assert!(r.abs_diff(bb) <= 4);
        }
    }

    #[test]
    fn bit_rows_are_msb_first()
    {
        let mut row = [0u8; 2];
        set_bit_msb(&mut row, 0, true);
        set_bit_msb(&mut row, 9, true);
        assert_eq!(row, [0x80, 0x40]);
        assert!(read_bit_msb(&row, 0));
        assert!(!read_bit_msb(&row, 1));
        assert!(read_bit_msb(&row, 9));
        set_bit_msb(&mut row, 0, false);
        assert_eq!(row[0], 0);
    }

    #[test]
    fn nibble_rows_are_high_first()
    {
        let mut row = [0u8; 2];
        set_nibble(&mut row, 0, 0xA);
        set_nibble(&mut row, 1, 0xB);
        set_nibble(&mut row, 2, 0xC);
        assert_eq!(row, [0xAB, 0xC0]);
        assert_eq!(read_nibble(&row, 0), 0xA);
        assert_eq!(read_nibble(&row, 1), 0xB);
        assert_eq!(read_nibble(&row, 2), 0xC);
    }
}
