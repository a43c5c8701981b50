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

// Fixed 2-D kernels. Row-major, row index n.

use crate::buffer::Buffer2D;

const SMOOTH_1D: [f32; 5] = [1.0, 2.0, 3.0, 2.0, 1.0];

const SOBEL_X: [f32; 9] = [
    1.0, 0.0, -1.0, //
    2.0, 0.0, -2.0, //
    1.0, 0.0, -1.0,
];

const SOBEL_Y: [f32; 9] = [
    -1.0, -2.0, -1.0, //
    0.0, 0.0, 0.0, //
    1.0, 2.0, 1.0,
];

/// 5x5 weighted average `[1 2 3 2 1]' [1 2 3 2 1] / 81`. Sums to one.
pub fn smooth_5x5() -> Buffer2D<f32> {
    Buffer2D::from_fn(5, 5, |m, n| SMOOTH_1D[n] * SMOOTH_1D[m] / 81.0)
}

/// Horizontal-gradient Sobel kernel.
pub fn sobel_x() -> Buffer2D<f32> {
    Buffer2D::from_vec(3, 3, SOBEL_X.to_vec())
}

/// Vertical-gradient Sobel kernel.
pub fn sobel_y() -> Buffer2D<f32> {
    Buffer2D::from_vec(3, 3, SOBEL_Y.to_vec())
}

pub fn identity_3x3() -> Buffer2D<f32> {
    Buffer2D::from_fn(3, 3, |m, n| if m == 1 && n == 1 { 1.0 } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smooth_kernel_is_normalized_and_symmetric() {
        let h = smooth_5x5();
        let sum: f32 = h.as_slice().iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "sum was {}", sum);
        assert!((h.get(2, 2) - 9.0 / 81.0).abs() < 1e-7);
        for n in 0..5 {
            for m in 0..5 {
                assert_eq!(h.get(m, n), h.get(n, m));
            }
        }
    }

    #[test]
    fn sobel_kernels_are_transposed_pairs() {
        let (sx, sy) = (sobel_x(), sobel_y());
        assert_eq!(sx.get(0, 1), 2.0);
        assert_eq!(sy.get(1, 0), -2.0);
        for n in 0..3 {
            for m in 0..3 {
                assert_eq!(sx.get(m, n), -sy.get(n, m));
            }
        }
        assert_eq!(sx.as_slice().iter().sum::<f32>(), 0.0);
    }

    #[test]
    fn identity_has_one_center_tap() {
        let id = identity_3x3();
        assert_eq!(id.get(1, 1), 1.0);
        assert_eq!(id.as_slice().iter().filter(|&&v| v != 0.0).count(), 1);
    }
}
