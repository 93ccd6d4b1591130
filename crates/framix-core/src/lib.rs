/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Core primitives shared by the framix family of crates
//!
//! This crate contains the pixel format enumeration together with the
//! layout arithmetic derived from it (bits per pixel, scanline strides)
//! and the small bit level helpers used by the conversion and resampling
//! routines in the `framix` crate.
//!
//! It carries no image data of its own, a pixel buffer and its format
//! live in the `Frame` type of the main crate.
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
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

pub mod format;
pub mod palette;
pub mod utils;
