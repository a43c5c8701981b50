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

// Raw float signals: little-endian i32 sample count, then that many
// little-endian f32 samples.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::model::Error;

pub fn read_signal_from<R: Read>(mut reader: R) -> Result<Vec<f32>, Error> {
    let mut count = [0u8; 4];
    reader.read_exact(&mut count)?;
    let count = i32::from_le_bytes(count);
    if count < 0 {
        return Err(Error::SignalLength(count));
    }

    // The header is untrusted; let the payload size the buffer.
    let expected = count as u64 * 4;
    let mut raw = Vec::new();
    reader.take(expected).read_to_end(&mut raw)?;
    if (raw.len() as u64) < expected {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("signal announces {} samples but holds {}", count, raw.len() / 4),
        )
        .into());
    }
    Ok(raw
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

pub fn write_signal_to<W: Write>(mut writer: W, samples: &[f32]) -> Result<(), Error> {
    let count = i32::try_from(samples.len()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "too many samples for an i32 count")
    })?;
    writer.write_all(&count.to_le_bytes())?;
    for s in samples {
        writer.write_all(&s.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_signal<P: AsRef<Path>>(path: P) -> Result<Vec<f32>, Error> {
    read_signal_from(BufReader::new(File::open(path)?))
}

pub fn write_signal<P: AsRef<Path>>(path: P, samples: &[f32]) -> Result<(), Error> {
    write_signal_to(BufWriter::new(File::create(path)?), samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let samples = [0.0f32, -1.5, 3.25, f32::MIN_POSITIVE];
        let mut bytes = Vec::new();
        write_signal_to(&mut bytes, &samples).unwrap();
        assert_eq!(bytes.len(), 4 + 16);
        assert_eq!(&bytes[..4], &[4, 0, 0, 0]);
        assert_eq!(read_signal_from(bytes.as_slice()).unwrap(), samples);
    }

    #[test]
    fn empty_signal() {
        let out = read_signal_from(&[0u8, 0, 0, 0][..]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn negative_count_is_rejected() {
        let bytes = (-3i32).to_le_bytes();
        let err = read_signal_from(&bytes[..]).unwrap_err();
        assert!(matches!(err, Error::SignalLength(-3)), "got {:?}", err);
    }

    #[test]
    fn short_payload_is_an_io_error() {
        let mut bytes = 2i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        let err = read_signal_from(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, Error::IoError(_)), "got {:?}", err);
    }

    #[test]
    fn huge_count_with_tiny_payload_is_an_io_error() {
        let mut bytes = i32::MAX.to_le_bytes().to_vec();
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        let err = read_signal_from(bytes.as_slice()).unwrap_err();
        match err {
            Error::IoError(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected an io error, got {:?}", other),
        }
    }
}
