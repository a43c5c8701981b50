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

use crate::model::Error;

/// Streaming rational-rate converter: upsample by U, FIR filter, keep every
/// D-th sample.
pub trait Resample {
    /// Push one input sample. Appends every output sample that became final
    /// to `out` and returns how many were appended.
    fn feed(&mut self, x: f32, out: &mut Vec<f32>) -> usize;

    /// Push a whole block, collecting the outputs.
    fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let mut out = Vec::with_capacity(input.len() * self.up() / self.down() + 1);
        for &x in input {
            self.feed(x, &mut out);
        }
        out
    }

    fn up(&self) -> usize;

    fn down(&self) -> usize;
}

pub(crate) fn check_factors(up: usize, down: usize) -> Result<(), Error> {
    if up == 0 || down == 0 {
        return Err(Error::InvalidFactors { up, down });
    }
    Ok(())
}

/// Largest absolute difference over the common prefix of two outputs.
pub fn max_deviation(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0f32, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_factors_are_rejected() {
        assert!(check_factors(0, 2).is_err());
        assert!(check_factors(3, 0).is_err());
        assert!(check_factors(3, 2).is_ok());
    }

    #[test]
    fn deviation_over_common_prefix() {
        let d = max_deviation(&[1.0, 2.0, 3.0], &[1.0, 2.5]);
        assert!((d - 0.5).abs() < 1e-6, "deviation was {}", d);
        assert_eq!(max_deviation(&[], &[1.0]), 0.0);
    }
}
