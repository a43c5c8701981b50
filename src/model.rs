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

use core::fmt;
use std::io;
use std::process::{ExitCode, Termination};

use log::error;

/// Errors raised by the file readers and resampler constructors.
#[derive(Debug)]
pub enum Error {
    /// Up or down factor is zero, or the two share a common divisor
    /// where the polyphase bank needs them reduced.
    InvalidFactors { up: usize, down: usize },
    /// Filter has fewer taps than the resampler needs.
    FilterTooShort { taps: usize, needed: usize },
    /// PGM header is malformed (bad magic, non-digit field, truncated).
    PgmHeader(&'static str),
    /// PGM maxval other than 255.
    PgmMaxVal(u32),
    /// Signal file announces a negative sample count.
    SignalLength(i32),
    IoError(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidFactors { up, down } => write!(
                f,
                "Invalid resampling factors U={} D={}: both must be non-zero.",
                up, down
            ),
            Error::FilterTooShort { taps, needed } => write!(
                f,
                "Filter has {} taps but at least {} are required.",
                taps, needed
            ),
            Error::PgmHeader(reason) => write!(f, "Malformed PGM header: {}", reason),
            Error::PgmMaxVal(max) => {
                write!(f, "Unsupported PGM maxval {}; only 255 is supported.", max)
            }
            Error::SignalLength(len) => {
                write!(f, "Signal file announces a negative length ({}).", len)
            }
            Error::IoError(io_error) => write!(f, "IO error: {}", io_error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(io_error) => Some(io_error),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::IoError(error)
    }
}

#[derive(Debug)]
pub enum MyError {
    Message(String),
}

impl std::fmt::Display for MyError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MyError::Message(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for MyError {}

pub type MyResult<T> = Result<T, MyError>;

/// Process exit wrapper: logs the error and maps it to a failure code.
pub struct TermResult(pub MyResult<()>);

impl Termination for TermResult {
    fn report(self) -> ExitCode {
        match self.0 {
            Ok(_) => ExitCode::SUCCESS,
            Err(err) => {
                error!("{}", err);
                ExitCode::FAILURE
            }
        }
    }
}

// Convert boxed dynamic errors into MyError
impl From<Box<dyn std::error::Error>> for MyError {
    fn from(err: Box<dyn std::error::Error>) -> Self {
        MyError::Message(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_keep_their_source() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn boxed_errors_become_messages() {
        let boxed: Box<dyn std::error::Error> = Error::PgmMaxVal(65535).into();
        let MyError::Message(msg) = MyError::from(boxed);
        assert!(msg.contains("65535"), "unexpected message: {}", msg);
    }
}
