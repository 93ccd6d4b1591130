/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Octree color quantization
//!
//! Builds an adaptive octree over the 24 bit color space of a
//! truecolor frame, greedily reduces it to at most `2^depth` leaves and
//! assigns every pixel its nearest surviving palette position.
//!
//! The tree lives in an arena, nodes address each other by index and a
//! detached child is simply unlinked from its parent slot, the arena is
//! dropped wholesale when quantization finishes. Reducible interior
//! nodes are tracked in one stack per level, pushed at creation and
//! popped newest first, which reproduces the reduction order of the
//! classic linked list formulation.
//!
//! The reduction policy is deliberately structural: it merges from the
//! deepest reducible level upward and prefers absorbing the least
//! populated children when only part of a node has to go. It never
//! looks at color space distance. Changing the policy changes palette
//! contents and ordering, existing fixtures depend on both.
use framix_core::format::PixelFormat;
use framix_core::utils::{set_bit_msb, set_nibble};

use crate::errors::FrameErrors;
use crate::frame::Frame;

const ROOT: u32 = 0;

#[derive(Clone)]
struct Node
{
    red:              u64,
    green:            u64,
    blue:             u64,
    pixel_count:      u64,
    children:         [Option<u32>; 8],
    leaf:             bool,
    palette_position: usize
}

impl Node
{
    fn new(leaf: bool) -> Node
    {
        Node {
            red: 0,
            green: 0,
            blue: 0,
            pixel_count: 0,
            children: [None; 8],
            leaf,
            palette_position: 0
        }
    }
}

/// An adaptive octree over 24 bit colors.
///
/// Built and torn down inside a single quantize call, never reused.
pub struct Octree
{
    nodes:          Vec<Node>,
    leaf_count:     usize,
    // reducible interior nodes per level, newest last
    reducible:      [Vec<u32>; 9],
    max_color_bits: usize,
    // one element cache for runs of identical adjacent pixels,
    // invalidated whenever the tree structure changes
    prev_node:      Option<u32>,
    prev_color:     Option<u32>
}

/// Branch slot for `(r, g, b)` at the given tree level, one bit of
/// each channel, red highest.
fn branch_index(r: u8, g: u8, b: u8, level: usize) -> usize
{
    let shift = 7 - level;
    usize::from((r >> shift) & 1) << 2
        | usize::from((g >> shift) & 1) << 1
        | usize::from((b >> shift) & 1)
}

impl Octree
{
    /// Create an empty tree that will quantize down to
    /// `2^max_color_bits` colors.
    #[must_use]
    pub fn new(max_color_bits: usize) -> Octree
    {
        let mut octree = Octree {
            nodes: Vec::with_capacity(64),
            leaf_count: 0,
            reducible: Default::default(),
            max_color_bits,
            prev_node: None,
            prev_color: None
        };
        octree.new_node(0);
        octree
    }

    fn new_node(&mut self, level: usize) -> u32
    {
        let position = self.nodes.len() as u32;
        let leaf = level == self.max_color_bits;
        if leaf
        {
            self.leaf_count += 1;
        }
        else
        {
            self.reducible[level].push(position);
        }
        self.nodes.push(Node::new(leaf));
        position
    }

    /// Insert one color, walking one tree level per channel bit.
    fn add_color(&mut self, r: u8, g: u8, b: u8)
    {
        let color = u32::from(b) | u32::from(g) << 8 | u32::from(r) << 16;

        // runs of identical pixels skip the walk entirely
        if self.prev_color == Some(color)
        {
            if let Some(node) = self.prev_node
            {
                self.increment(node, r, g, b);
                return;
            }
        }
        self.prev_color = Some(color);

        let mut node = ROOT;
        let mut level = 0;
        loop
        {
            if self.nodes[node as usize].leaf
            {
                self.increment(node, r, g, b);
                self.prev_node = Some(node);
                return;
            }
            let slot = branch_index(r, g, b, level);
            let child = match self.nodes[node as usize].children[slot]
            {
                Some(child) => child,
                None =>
                {
                    let child = self.new_node(level + 1);
                    self.nodes[node as usize].children[slot] = Some(child);
                    child
                }
            };
            node = child;
            level += 1;
        }
    }

    fn increment(&mut self, node: u32, r: u8, g: u8, b: u8)
    {
        let node = &mut self.nodes[node as usize];
        node.pixel_count += 1;
        node.red += u64::from(r);
        node.green += u64::from(g);
        node.blue += u64::from(b);
    }

    /// Merge children somewhere on the deepest reducible level.
    fn reduce(&mut self, budget: &mut i64) -> Result<(), FrameErrors>
    {
        // find the deepest level still holding a reducible node
        let mut level = self.max_color_bits.saturating_sub(1);
        while level > 0 && self.reducible[level].is_empty()
        {
            level -= 1;
        }
        let node = self.reducible[level]
            .pop()
            .ok_or(FrameErrors::InvalidOperation("no reducible octree node left"))?;

        let removed = self.reduce_node(node, budget);
        self.leaf_count -= removed;

        // the reduced leaf may be the one cached from the last insert
        self.prev_node = None;
        self.prev_color = None;
        Ok(())
    }

    /// Absorb children of `node` into it, at most `budget` of them when
    /// the budget is small. Returns the number of leaves removed.
    fn reduce_node(&mut self, node: u32, budget: &mut i64) -> usize
    {
        let node = node as usize;
        let mut children_reduced: i64 = 0;

        self.nodes[node].red = 0;
        self.nodes[node].green = 0;
        self.nodes[node].blue = 0;

        if *budget >= 8
        {
            // everything below this node collapses into it
            for slot in 0..8
            {
                if let Some(child) = self.nodes[node].children[slot].take()
                {
                    let child = self.nodes[child as usize].clone();
                    self.nodes[node].red += child.red;
                    self.nodes[node].green += child.green;
                    self.nodes[node].blue += child.blue;
                    self.nodes[node].pixel_count += child.pixel_count;
                    children_reduced += 1;
                }
            }
            // one leaf comes back, this node is becoming one
            children_reduced -= 1;
            *budget -= children_reduced;
        }
        else
        {
            // merge the least populated children first, the error from
            // losing a sparsely used color is smallest
            while *budget > 0
            {
                let mut least_count = u64::MAX;
                let mut least = None;
                for slot in 0..8
                {
                    if let Some(child) = self.nodes[node].children[slot]
                    {
                        let count = self.nodes[child as usize].pixel_count;
                        if count < least_count
                        {
                            least_count = count;
                            least = Some((slot, child));
                        }
                    }
                }
                let Some((slot, child)) = least
                else
                {
                    break;
                };
                self.nodes[node].children[slot] = None;
                let child = self.nodes[child as usize].clone();
                self.nodes[node].red += child.red;
                self.nodes[node].green += child.green;
                self.nodes[node].blue += child.blue;
                self.nodes[node].pixel_count += child.pixel_count;
                children_reduced += 1;
                *budget -= 1;
            }
            if self.nodes[node].children.iter().any(Option::is_some)
            {
                // partially reduced, the node stays interior and drops
                // out of the reducible lists for good
                return children_reduced as usize;
            }
            children_reduced -= 1;
            *budget += 1;
        }
        self.nodes[node].leaf = true;
        children_reduced as usize
    }

    /// Reduce until at most `color_count` leaves remain, then emit the
    /// palette in depth first child slot order.
    ///
    /// The traversal order fixes the palette position of every leaf,
    /// index assignment afterwards depends on it.
    fn create_palette(&mut self, color_count: usize) -> Result<Vec<u32>, FrameErrors>
    {
        let mut budget = self.leaf_count as i64 - color_count as i64;
        while self.leaf_count > color_count
        {
            self.reduce(&mut budget)?;
        }
        let mut palette = Vec::with_capacity(self.leaf_count);
        self.emit_palette(ROOT, &mut palette);
        Ok(palette)
    }

    fn emit_palette(&mut self, node: u32, palette: &mut Vec<u32>)
    {
        let position = node as usize;
        if self.nodes[position].leaf
        {
            self.nodes[position].palette_position = palette.len();
            let node = &self.nodes[position];
            let count = node.pixel_count.max(1);
            let (r, g, b) = (node.red / count, node.green / count, node.blue / count);
            palette.push((r << 16 | g << 8 | b) as u32);
            return;
        }
        for slot in 0..8
        {
            if let Some(child) = self.nodes[position].children[slot]
            {
                self.emit_palette(child, palette);
            }
        }
    }

    /// Palette position for a color, walking the reduced tree.
    ///
    /// When the exact branch was pruned away the search walks sibling
    /// slots outward until a surviving child is found, a structural
    /// approximation rather than a color distance search.
    fn palette_position(&self, r: u8, g: u8, b: u8) -> Result<usize, FrameErrors>
    {
        let mut node = ROOT;
        let mut level = 0;
        loop
        {
            let current = &self.nodes[node as usize];
            if current.leaf
            {
                return Ok(current.palette_position);
            }
            let slot = branch_index(r, g, b, level);
            let mut next = current.children[slot];
            if next.is_none()
            {
                'search: for distance in 1..=7
                {
                    if slot >= distance
                    {
                        if let Some(child) = current.children[slot - distance]
                        {
                            next = Some(child);
                            break 'search;
                        }
                    }
                    if slot + distance <= 7
                    {
                        if let Some(child) = current.children[slot + distance]
                        {
                            next = Some(child);
                            break 'search;
                        }
                    }
                }
            }
            node = next.ok_or(FrameErrors::InvalidOperation(
                "octree sibling search exhausted every slot"
            ))?;
            level += 1;
        }
    }

    /// Quantize `source` into `dest`, installing the reduced palette.
    ///
    /// `source` must be 24 or 32 bpp truecolor, `dest` 8, 4 or 1 bpp
    /// indexed and of identical dimensions.
    pub fn process(&mut self, source: &Frame, dest: &mut Frame) -> Result<(), FrameErrors>
    {
        let is32 = match source.get_format()
        {
            PixelFormat::Argb32 | PixelFormat::Rgb32 => true,
            PixelFormat::Rgb24 => false,
            other => return Err(FrameErrors::UnsupportedFormat(other, "octree quantize"))
        };
        let step = if is32 { 4 } else { 3 };
        let (width, height) = source.get_dimensions();

        self.prev_node = None;
        self.prev_color = None;

        // first pass, grow the tree over every pixel
        for y in 0..height
        {
            let row = source.scanline(y);
            for x in 0..width
            {
                let ptr = x * step;
                let (b, g, r) = (row[ptr], row[ptr + 1], row[ptr + 2]);
                self.add_color(r, g, b);
            }
        }

        let palette = self.create_palette(1 << self.max_color_bits)?;
        dest.set_palette(palette);

        // second pass, map every pixel to its palette position
        let mut prev_color: Option<u32> = None;
        let mut prev_value = 0u8;

        let dest_format = dest.get_format();
        let dest_stride = dest.stride();
        for y in 0..height
        {
            let row = source.scanline(y);
            let dest_row = &mut dest.data_mut()[y * dest_stride..];
            for x in 0..width
            {
                let ptr = x * step;
                let color = u32::from(row[ptr])
                    | u32::from(row[ptr + 1]) << 8
                    | u32::from(row[ptr + 2]) << 16;

                let value = if prev_color == Some(color)
                {
                    prev_value
                }
                else
                {
                    let value = self.palette_position(
                        (color >> 16) as u8,
                        (color >> 8) as u8,
                        color as u8
                    )? as u8;
                    prev_color = Some(color);
                    prev_value = value;
                    value
                };

                match dest_format
                {
                    PixelFormat::Indexed8 => dest_row[x] = value,
                    PixelFormat::Indexed4 => set_nibble(dest_row, x, value),
                    PixelFormat::Indexed1 => set_bit_msb(dest_row, x, value != 0),
                    other =>
                    {
                        return Err(FrameErrors::UnsupportedFormat(other, "octree quantize"))
                    }
                }
            }
        }
        Ok(())
    }
}

/// Build a reduced palette frame from a truecolor one.
///
/// The destination format decides the palette size, `2^bpp` colors at
/// most. This is the routine [`reformat`](crate::reformat::reformat)
/// delegates to for every truecolor to indexed conversion.
pub fn quantize(source: &Frame, format: PixelFormat) -> Result<Frame, FrameErrors>
{
    if !matches!(
        format,
        PixelFormat::Indexed1 | PixelFormat::Indexed4 | PixelFormat::Indexed8
    )
    {
        return Err(FrameErrors::UnsupportedFormat(format, "octree quantize"));
    }
    let (width, height) = source.get_dimensions();
    let mut dest = source.clone_shape(width, height, format);
    let mut octree = Octree::new(format.bits_per_pixel());
    octree.process(source, &mut dest)?;
    Ok(dest)
}

#[cfg(test)]
mod tests
{
    use framix_core::format::PixelFormat;

    use super::quantize;
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
    fn palette_size_is_bounded()
    {
        use nanorand::Rng;
        let mut rng = nanorand::WyRand::new();

        let mut colors = vec![0u32; 16 * 16];
        for color in &mut colors
        {
            *color = rng.generate::<u32>() & 0x00FF_FFFF;
        }
        let source = rgb24(16, 16, &colors);

        for (format, bits) in [
            (PixelFormat::Indexed8, 8),
            (PixelFormat::Indexed4, 4),
            (PixelFormat::Indexed1, 1)
        ]
        {
            let dest = quantize(&source, format).unwrap();
            let palette = dest.palette().unwrap();
            assert!(palette.len() <= 1 << bits);
            for y in 0..16
            {
                for x in 0..16
                {
                    // every stored value must be a valid position
                    let _ = dest.get_pixel(x, y).unwrap();
                }
            }
        }
    }

    #[test]
    fn few_distinct_colors_survive_exactly()
    {
        // twelve colors distinct in the top four bits of every channel
        // fit a 16 entry palette without any merging
        let colors: Vec<u32> = (0..12u32).map(|i| i * 0x0011_1111).collect();
        let mut pixels = Vec::new();
        for i in 0..64
        {
            pixels.push(colors[i % colors.len()]);
        }
        let source = rgb24(8, 8, &pixels);
        let dest = quantize(&source, PixelFormat::Indexed4).unwrap();
        let palette = dest.palette().unwrap().to_vec();

        assert_eq!(palette.len(), colors.len());
        for color in &colors
        {
            assert!(palette.contains(color), "{:06X} lost", color);
        }
        // every pixel maps back to its exact source color
        for y in 0..8
        {
            for x in 0..8
            {
                assert_eq!(
                    dest.get_pixel(x, y).unwrap(),
                    source.get_pixel(x, y).unwrap()
                );
            }
        }
    }

    #[test]
    fn uniform_image_yields_single_entry()
    {
        let source = rgb24(4, 4, &[0x123456; 16]);
        let dest = quantize(&source, PixelFormat::Indexed1).unwrap();
        assert_eq!(dest.palette().unwrap(), &[0x123456]);
        for y in 0..4
        {
            for x in 0..4
            {
                assert_eq!(dest.get_pixel(x, y).unwrap(), 0x123456);
            }
        }
    }

    #[test]
    fn four_corners_to_one_bit()
    {
        // the greedy reduction absorbs the first two equally populated
        // children in slot order, blue then green, leaving red and
        // white as the palette in traversal order
        let source = rgb24(2, 2, &[0xFF0000, 0x00FF00, 0x0000FF, 0xFFFFFF]);
        let dest = quantize(&source, PixelFormat::Indexed1).unwrap();

        assert_eq!(dest.palette().unwrap(), &[0xFF0000, 0xFFFFFF]);

        // red, green and blue collapse to position zero, white keeps
        // position one; 1 bpp rows are MSB first
        assert_eq!(dest.scanline(0)[0], 0b0000_0000);
        assert_eq!(dest.scanline(1)[0], 0b0100_0000);
    }

    #[test]
    fn rejects_non_truecolor_sources()
    {
        let mut source = Frame::new(2, 2, PixelFormat::Indexed8);
        source.set_palette(vec![0; 256]);
        assert!(quantize(&source, PixelFormat::Indexed4).is_err());
        // and non indexed destinations
        let source = rgb24(2, 2, &[0; 4]);
        assert!(quantize(&source, PixelFormat::Rgb565).is_err());
    }
}
