/*
 Copyright (c) 2023 clone206
 Copyright (c) 2026 polyconv contributors

 This file is part of polyconv

 polyconv is free software: you can redistribute it and/or modify it
 under the terms of the GNU General Public License as published by the
 Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 polyconv is distributed in the hope that it will be useful, but
 WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU General Public License for more details.
 You should have received a copy of the GNU General Public License
 along with polyconv. If not, see <https://www.gnu.org/licenses/>.
*/

//! 2-D image convolution and rational-rate resampling.
//!
//! The convolution kernel comes in three evaluators that must agree
//! exactly ([`conv`]). Resampling by U/D comes in a direct
//! circular-buffer form and a polyphase filter-bank form that must agree
//! to float tolerance ([`direct_resampler`], [`polyphase`]).

pub mod buffer;
pub mod color_logger;
pub mod conv;
pub mod direct_resampler;
pub mod files;
pub mod filters;
pub mod model;
pub mod pgm;
pub mod polyphase;
pub mod postprocess;
pub mod resample;
pub mod signal_file;

pub use buffer::{Buffer1D, Buffer2D};
pub use color_logger::ColorLogger;
pub use conv::{CONV_POOL_SIZE, ConvStrategy, convolve};
pub use direct_resampler::DirectResampler;
pub use model::{Error, MyError, MyResult, TermResult};
pub use polyphase::PolyphaseResampler;
pub use resample::Resample;
