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

//! Turning full convolution output back into 8-bit images.

use log::{debug, warn};

use crate::buffer::Buffer2D;

/// Clamp to `[0, 255]`, then truncate toward zero.
#[inline]
pub fn saturate_u8(v: f32) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

/// Cut the `(tail_m, tail_n)` border off a full convolution, leaving a
/// `width x height` result aligned with the original input.
pub fn trim_tails(
    full: &Buffer2D<f32>,
    width: usize,
    height: usize,
    tail: (usize, usize),
) -> Buffer2D<f32> {
    let (tm, tn) = tail;
    Buffer2D::from_fn(width, height, |m, n| {
        full.get((m + tm) as isize, (n + tn) as isize)
    })
}

pub fn to_u8(image: &Buffer2D<f32>) -> Buffer2D<u8> {
    Buffer2D::from_fn(image.width(), image.height(), |m, n| {
        saturate_u8(image.get(m as isize, n as isize))
    })
}

/// `|g1| + |g2|` clipped to 255. Both gradients must have the same shape.
pub fn edge_magnitude(g1: &Buffer2D<f32>, g2: &Buffer2D<f32>) -> Buffer2D<u8> {
    assert_eq!(
        (g1.width(), g1.height()),
        (g2.width(), g2.height()),
        "gradient images differ in size"
    );
    Buffer2D::from_fn(g1.width(), g1.height(), |m, n| {
        let (m, n) = (m as isize, n as isize);
        saturate_u8(g1.get(m, n).abs() + g2.get(m, n).abs())
    })
}

/// Smallest and largest cell.
pub fn min_max(image: &Buffer2D<f32>) -> (f32, f32) {
    let first = image.get(0, 0);
    image
        .cells()
        .fold((first, first), |(lo, hi), (_, v)| (lo.min(v), hi.max(v)))
}

/// Scale in place so the largest cell becomes 255. Left untouched when the
/// maximum is not positive.
pub fn normalize_max(image: &mut Buffer2D<f32>) {
    let (lo, hi) = min_max(image);
    debug!("Normalizing range [{}, {}] to max 255", lo, hi);
    if hi <= 0.0 || !hi.is_finite() {
        warn!("Cannot scale image with maximum {}; leaving it as is", hi);
        return;
    }
    image.map_in_place(|_, v| v * 255.0 / hi);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conv::{ConvStrategy, convolve};
    use crate::filters::identity_3x3;

    #[test]
    fn saturation_clamps_then_truncates() {
        assert_eq!(saturate_u8(300.0), 255);
        assert_eq!(saturate_u8(-10.0), 0);
        assert_eq!(saturate_u8(127.9), 127);
        assert_eq!(saturate_u8(255.0), 255);
        assert_eq!(saturate_u8(0.0), 0);
    }

    #[test]
    fn trimming_realigns_with_input() {
        let image = Buffer2D::from_fn(6, 4, |m, n| (m * 10 + n) as u8);
        let filter = identity_3x3();
        let full = convolve(&image, &filter, ConvStrategy::Direct);
        let trimmed = trim_tails(&full, 6, 4, filter.conv_tail());
        let back = to_u8(&trimmed);
        assert_eq!(back, image);
    }

    #[test]
    fn edge_magnitude_clips() {
        let g1 = Buffer2D::from_vec(2, 1, vec![-200.0, 10.0]);
        let g2 = Buffer2D::from_vec(2, 1, vec![100.0, -5.5]);
        let e = edge_magnitude(&g1, &g2);
        assert_eq!(e.as_slice(), &[255, 15]);
    }

    #[test]
    fn normalize_scales_max_to_255() {
        let mut img = Buffer2D::from_vec(3, 1, vec![-2.0, 5.0, 10.0]);
        normalize_max(&mut img);
        assert_eq!(min_max(&img), (-51.0, 255.0));
        assert_eq!(to_u8(&img).as_slice(), &[0, 127, 255]);
    }

    #[test]
    fn normalize_ignores_non_positive_max() {
        let mut img = Buffer2D::from_vec(2, 1, vec![-3.0, -1.0]);
        normalize_max(&mut img);
        assert_eq!(img.as_slice(), &[-3.0, -1.0]);
    }
}
