/*
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

//! Binary greymap (`P5`) reading and writing. Only 8-bit images
//! (maxval 255) are supported.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::trace;

use crate::buffer::Buffer2D;
use crate::model::Error;

/// Cursor over the header bytes.
struct Header<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Header<'_> {
    fn bump(&mut self) -> Option<u8> {
        let b = self.bytes.get(self.pos).copied();
        self.pos += 1;
        b
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn magic(&mut self) -> Result<(), Error> {
        if self.bump() != Some(b'P') || self.bump() != Some(b'5') {
            return Err(Error::PgmHeader("missing P5 magic number"));
        }
        match self.bump() {
            Some(b) if is_space(b) => Ok(()),
            _ => Err(Error::PgmHeader("missing P5 magic number")),
        }
    }

    /// Skip whitespace and `#` comment lines, then parse one decimal field.
    /// Exactly one whitespace byte after the digits is consumed.
    fn field(&mut self) -> Result<u32, Error> {
        loop {
            match self.peek() {
                Some(b'#') => {
                    while let Some(b) = self.bump() {
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                Some(b) if is_space(b) => self.pos += 1,
                Some(_) => break,
                None => return Err(Error::PgmHeader("truncated header")),
            }
        }

        let mut value: u32 = 0;
        let mut digits = 0;
        loop {
            match self.bump() {
                Some(b) if b.is_ascii_digit() => {
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(u32::from(b - b'0')))
                        .ok_or(Error::PgmHeader("header value out of range"))?;
                    digits += 1;
                }
                Some(b) if is_space(b) && digits > 0 => return Ok(value),
                Some(_) => return Err(Error::PgmHeader("unexpected character in header")),
                None => return Err(Error::PgmHeader("truncated header")),
            }
        }
    }
}

#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0)
}

pub fn read_pgm_from<R: Read>(mut reader: R) -> Result<Buffer2D<u8>, Error> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let mut header = Header {
        bytes: &bytes,
        pos: 0,
    };
    header.magic()?;
    let width = header.field()? as usize;
    let height = header.field()? as usize;
    let maxval = header.field()?;
    if maxval != 255 {
        return Err(Error::PgmMaxVal(maxval));
    }
    if width == 0 || height == 0 {
        return Err(Error::PgmHeader("zero image dimension"));
    }

    let len = width * height;
    let pixels = &bytes[header.pos..];
    if pixels.len() < len {
        return Err(Error::PgmHeader("truncated pixel data"));
    }
    trace!("Parsed PGM header {}x{} ({} header bytes)", width, height, header.pos);

    Ok(Buffer2D::from_vec(width, height, pixels[..len].to_vec()))
}

pub fn write_pgm_to<W: Write>(mut writer: W, image: &Buffer2D<u8>) -> Result<(), Error> {
    write!(writer, "P5\n{} {} 255\n", image.width(), image.height())?;
    writer.write_all(image.as_slice())?;
    writer.flush()?;
    Ok(())
}

pub fn read_pgm<P: AsRef<Path>>(path: P) -> Result<Buffer2D<u8>, Error> {
    read_pgm_from(BufReader::new(File::open(path)?))
}

pub fn write_pgm<P: AsRef<Path>>(path: P, image: &Buffer2D<u8>) -> Result<(), Error> {
    write_pgm_to(BufWriter::new(File::create(path)?), image)
}
