/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */
//! End to end runs through the conversion, quantization and resizing
//! pipeline, the way an icon writer would drive it.
use framix::frame::Frame;
use framix_core::format::PixelFormat;

fn two_tone(size: usize) -> Frame
{
    // left half red, right half blue
    let mut frame = Frame::new(size, size, PixelFormat::Rgb24);
    for y in 0..size
    {
        for x in 0..size
        {
            let color = if x < size / 2 { 0x00FF_0000 } else { 0x0000_00FF };
            frame.set_pixel(x, y, color).unwrap();
        }
    }
    frame
}

#[test]
fn quantize_shrink_and_restore()
{
    let source = two_tone(8);

    // two colors survive a 16 entry palette exactly
    let indexed = source.reformat(PixelFormat::Indexed4).unwrap();
    assert_eq!(indexed.palette().unwrap().len(), 2);

    // an exact 2:1 shrink of uniform blocks keeps both colors
    let small = indexed.scale(4, 4).unwrap();
    for y in 0..4
    {
        for x in 0..4
        {
            let want = if x < 2 { 0x00FF_0000 } else { 0x0000_00FF };
            assert_eq!(small.get_pixel(x, y).unwrap(), want, "pixel {} {}", x, y);
        }
    }

    // growing back and widening keeps the picture intact
    let restored = small
        .scale(8, 8)
        .unwrap()
        .reformat(PixelFormat::Rgb24)
        .unwrap();
    for y in 0..8
    {
        for x in 0..8
        {
            assert_eq!(
                restored.get_pixel(x, y).unwrap(),
                source.get_pixel(x, y).unwrap()
            );
        }
    }
}

#[test]
fn alpha_mask_follows_a_conversion()
{
    let mut frame = Frame::new(2, 2, PixelFormat::Argb32);
    // only (0, 0) is opaque
    frame.data_mut()[..4].copy_from_slice(&[0x20, 0x40, 0x60, 0xFF]);
    frame.build_mask().unwrap();

    let narrow = frame.reformat(PixelFormat::Rgb24).unwrap();
    assert!(narrow.get_mask(0, 0));
    assert!(!narrow.get_mask(1, 0));
    assert!(!narrow.get_mask(1, 1));
}

#[test]
fn adjust_degenerates_to_a_region_copy()
{
    let source = two_tone(8);
    let cut = source.adjust(2, 2, 4, 4, 4, 4).unwrap();
    assert_eq!(cut.get_dimensions(), (4, 4));
    for y in 0..4
    {
        for x in 0..4
        {
            assert_eq!(
                cut.get_pixel(x, y).unwrap(),
                source.get_pixel(x + 2, y + 2).unwrap()
            );
        }
    }
}

#[test]
fn scale_to_the_same_size_is_a_copy()
{
    let mut source = two_tone(6);
    source.set_mask(3, 3, true);
    let copy = source.scale(6, 6).unwrap();
    assert_eq!(copy.data(), source.data());
    assert!(copy.get_mask(3, 3));
}
