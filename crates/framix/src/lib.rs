/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! In memory framebuffer transformations
//!
//! This crate works on a [`Frame`](crate::frame::Frame), a packed pixel
//! buffer with a fixed width, height and [pixel format], an optional
//! palette for indexed formats and an optional 1 bpp transparency mask.
//! Container codecs (BMP, PNG, GIF, ICO readers and writers) live
//! outside this crate, they produce and consume frames.
//!
//! Three operations make up the public contract:
//!
//! - [`reformat`](crate::reformat::reformat) converts a frame to a
//!   different pixel format, quantizing through an adaptive octree when
//!   the destination is palette based.
//! - [`resize`](crate::resize::resize) resamples a sub rectangle of a
//!   frame to a new size, area filtering on shrink and replicating on
//!   expansion.
//! - [`quantize`](crate::octree::quantize) builds a reduced palette for
//!   a truecolor frame, it is what `reformat` calls internally for
//!   indexed destinations.
//!
//! Every operation allocates and returns a new frame, sources are never
//! modified in place. All work is synchronous and purely CPU bound.
//!
//! [pixel format]: framix_core::format::PixelFormat
#![warn(
    clippy::correctness,
    clippy::perf,
    clippy::pedantic,
    clippy::inline_always,
    clippy::panic
)]
#![allow(
    clippy::needless_return,
    clippy::similar_names,
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::redundant_field_names,
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

pub mod errors;
pub mod frame;
pub mod octree;
pub mod reformat;
pub mod resize;
