/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Errors possible during frame transformations
use std::fmt::{Debug, Formatter};

use framix_core::format::PixelFormat;

/// All possible frame transformation errors.
///
/// Operations are deterministic and allocate their output up front,
/// a failing operation therefore never returns a partial frame.
pub enum FrameErrors
{
    /// The requested pixel format pair has no implemented code path.
    ///
    /// This is a hard capability error, retrying cannot succeed.
    UnsupportedConversion(PixelFormat, PixelFormat),
    /// The requested operation is not implemented for this format.
    UnsupportedFormat(PixelFormat, &'static str),
    /// An operation was invoked on frames that cannot support it, or
    /// an internal invariant was violated.
    InvalidOperation(&'static str),
    /// A frame flagged as indexed carries no palette.
    MissingPalette,
    /// Dimensions do not agree with what the operation expects.
    DimensionsMisMatch(usize, usize),
    /// Generic errors
    GenericStr(&'static str)
}

impl Debug for FrameErrors
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            Self::UnsupportedConversion(from, to) =>
            {
                writeln!(f, "No conversion path from {:?} to {:?}", from, to)
            }
            Self::UnsupportedFormat(format, operation) =>
            {
                writeln!(
                    f,
                    "The format {:?} is not supported by the operation {}",
                    format, operation
                )
            }
            Self::InvalidOperation(reason) =>
            {
                writeln!(f, "Invalid operation: {}", reason)
            }
            Self::MissingPalette =>
            {
                writeln!(f, "Indexed frame without a palette")
            }
            Self::DimensionsMisMatch(expected, found) =>
            {
                writeln!(
                    f,
                    "Dimensions mismatch, expected {} but found {}",
                    expected, found
                )
            }
            Self::GenericStr(err) =>
            {
                writeln!(f, "{}", err)
            }
        }
    }
}

impl From<&'static str> for FrameErrors
{
    fn from(s: &'static str) -> FrameErrors
    {
        FrameErrors::GenericStr(s)
    }
}
