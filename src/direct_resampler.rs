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

// Single-filter rational resampler working at the upsampled rate.
//
// Every input sample is scattered into an accumulation ring (event-driven
// convolution, no zero-stuffed samples are ever multiplied). Ring slot
// `t mod N` holds the filtered signal at upsampled time `t`; every D-th slot
// is emitted once no later input can reach it.

use log::trace;

use crate::model::Error;
use crate::resample::{Resample, check_factors};

pub struct DirectResampler {
    up: usize,
    down: usize,
    taps: Vec<f32>,
    ring: Vec<f32>,
    // Upsampled time of the current input, mod ring length.
    write_base: usize,
    // Next output time. Kept >= write_base; reduced lazily when write_base wraps.
    read_cursor: usize,
}

impl DirectResampler {
    pub fn new(up: usize, down: usize, taps: &[f32]) -> Result<Self, Error> {
        check_factors(up, down)?;
        if taps.is_empty() {
            return Err(Error::FilterTooShort { taps: 0, needed: 1 });
        }

        // Multiple of D, so the slots zeroed after an emission always line up
        // with the next output's slot one lap later.
        let ring_len = taps.len().max(up).next_multiple_of(down);
        trace!(
            "Direct resampler U={} D={} taps={} ring={}",
            up,
            down,
            taps.len(),
            ring_len
        );

        Ok(Self {
            up,
            down,
            taps: taps.to_vec(),
            ring: vec![0.0; ring_len],
            write_base: 0,
            read_cursor: 0,
        })
    }

    pub fn ring_len(&self) -> usize {
        self.ring.len()
    }

    /// Clear all history, as if freshly constructed.
    pub fn reset(&mut self) {
        self.ring.fill(0.0);
        self.write_base = 0;
        self.read_cursor = 0;
    }
}

impl Resample for DirectResampler {
    #[inline]
    fn feed(&mut self, x: f32, out: &mut Vec<f32>) -> usize {
        let n = self.ring.len();

        for (i, &h) in self.taps.iter().enumerate() {
            let slot = (self.write_base + i) % n;
            self.ring[slot] += x * h;
        }

        let end = self.write_base + self.up;
        let mut emitted = 0;
        while self.read_cursor < end {
            let slot = self.read_cursor % n;
            out.push(self.ring[slot]);
            for j in 0..self.down {
                self.ring[(slot + j) % n] = 0.0;
            }
            self.read_cursor += self.down;
            emitted += 1;
        }

        if end >= n {
            self.write_base = end - n;
            self.read_cursor -= n;
        } else {
            self.write_base = end;
        }

        emitted
    }

    fn up(&self) -> usize {
        self.up
    }

    fn down(&self) -> usize {
        self.down
    }
}
