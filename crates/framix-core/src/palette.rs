/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Nearest palette color search
//!
//! Palettes are arrays of packed `0x00RRGGBB` entries. Both the pixel
//! format converter and the resizer resolve arbitrary colors to palette
//! positions through the routines here, they must therefore agree on a
//! single distance metric. That metric is plain squared euclidean
//! distance over the RGB cube, evaluated with a brute force scan.

/// Return the position of the palette entry closest to `(r, g, b)`.
///
/// The scan short circuits on an exact match and otherwise minimizes
/// the squared euclidean RGB distance. An empty palette returns
/// position zero, callers are expected to uphold the frame invariant
/// that indexed frames carry a non empty palette.
#[must_use]
pub fn nearest_color(palette: &[u32], r: u8, g: u8, b: u8) -> usize
{
    let mut best = 0;
    let mut best_distance = u32::MAX;

    for (position, entry) in palette.iter().enumerate()
    {
        let dr = i32::from(r) - ((entry >> 16) & 0xFF) as i32;
        let dg = i32::from(g) - ((entry >> 8) & 0xFF) as i32;
        let db = i32::from(b) - (entry & 0xFF) as i32;

        let distance = (dr * dr + dg * dg + db * db) as u32;

        if distance == 0
        {
            return position;
        }
        if distance < best_distance
        {
            best_distance = distance;
            best = position;
        }
    }
    best
}

/// [`nearest_color`] for a packed `0x00RRGGBB` color.
#[must_use]
pub fn nearest_packed(palette: &[u32], color: u32) -> usize
{
    nearest_color(
        palette,
        ((color >> 16) & 0xFF) as u8,
        ((color >> 8) & 0xFF) as u8,
        (color & 0xFF) as u8
    )
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn exact_match_wins()
    {
        let palette = [0x000000, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFFFF];
        assert_eq!(nearest_color(&palette, 255, 0, 0), 1);
        assert_eq!(nearest_color(&palette, 0, 0, 255), 3);
        assert_eq!(nearest_packed(&palette, 0xFFFFFF), 4);
    }

    #[test]
    fn nearest_by_squared_distance()
    {
        let palette = [0x000000, 0xFFFFFF];
        // mid gray leans to black, (127,127,127) vs (128,128,128)
        assert_eq!(nearest_color(&palette, 127, 127, 127), 0);
        assert_eq!(nearest_color(&palette, 128, 128, 128), 1);
    }

    #[test]
    fn first_of_equal_candidates_wins()
    {
        let palette = [0x100000, 0x001000];
        // equidistant from black, the scan keeps the earlier entry
        assert_eq!(nearest_color(&palette, 0, 0, 0), 0);
    }
}
