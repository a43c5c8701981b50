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

//! Dense owned buffers with zero-padded access.
//!
//! Reads outside the buffer return `T::default()` and writes outside it are
//! dropped. Convolution relies on this as its boundary condition, so the
//! kernels never have to special-case the edges.

/// Row-major 2-D grid. `m` runs along the width, `n` along the height;
/// cell `(m, n)` lives at `width * n + m`.
#[derive(Clone, Debug, PartialEq)]
pub struct Buffer2D<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Buffer2D<T> {
    /// Zero-filled buffer. Panics on a zero dimension.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }

    pub fn filled(width: usize, height: usize, value: T) -> Self {
        assert!(
            width > 0 && height > 0,
            "Buffer2D dimensions must be positive (got {}x{})",
            width,
            height
        );
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build a buffer by evaluating `f(m, n)` for every cell in storage order.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        assert!(
            width > 0 && height > 0,
            "Buffer2D dimensions must be positive (got {}x{})",
            width,
            height
        );
        let mut data = Vec::with_capacity(width * height);
        for n in 0..height {
            for m in 0..width {
                data.push(f(m, n));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Take ownership of a row-major vector. Panics if the length does not
    /// match the dimensions.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Self {
        assert!(
            width > 0 && height > 0,
            "Buffer2D dimensions must be positive (got {}x{})",
            width,
            height
        );
        assert_eq!(
            data.len(),
            width * height,
            "Buffer2D data length does not match {}x{}",
            width,
            height
        );
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Width of the border a full convolution with this filter adds on each
    /// side, per axis.
    #[inline]
    pub fn conv_tail(&self) -> (usize, usize) {
        (self.width / 2, self.height / 2)
    }

    #[inline]
    pub fn get(&self, m: isize, n: isize) -> T {
        if m < 0 || n < 0 || m as usize >= self.width || n as usize >= self.height {
            return T::default();
        }
        self.data[self.width * n as usize + m as usize]
    }

    #[inline]
    pub fn set(&mut self, m: isize, n: isize, value: T) {
        if m < 0 || n < 0 || m as usize >= self.width || n as usize >= self.height {
            return;
        }
        self.data[self.width * n as usize + m as usize] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Lazily yields `((m, n), value)` in storage order.
    pub fn cells(&self) -> impl Iterator<Item = ((usize, usize), T)> + '_ {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, &v)| ((i % width, i / width), v))
    }

    /// Per-cell callback in storage order. Goes through dynamic dispatch on
    /// every cell; batch passes only, not hot loops.
    pub fn for_each_cell(&self, f: &mut dyn FnMut(usize, usize, T)) {
        let mut i = 0;
        for n in 0..self.height {
            for m in 0..self.width {
                f(m, n, self.data[i]);
                i += 1;
            }
        }
    }

    /// Replace every cell with `f((m, n), value)`.
    pub fn map_in_place<F>(&mut self, mut f: F)
    where
        F: FnMut((usize, usize), T) -> T,
    {
        let width = self.width;
        for (i, v) in self.data.iter_mut().enumerate() {
            *v = f((i % width, i / width), *v);
        }
    }
}

/// Dense 1-D sequence with the same zero-padded access rules.
#[derive(Clone, Debug, PartialEq)]
pub struct Buffer1D<T> {
    data: Vec<T>,
}

impl<T: Copy + Default> Buffer1D<T> {
    /// Zero-filled sequence. Panics on zero length.
    pub fn new(len: usize) -> Self {
        assert!(len > 0, "Buffer1D length must be positive");
        Self {
            data: vec![T::default(); len],
        }
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        assert!(!data.is_empty(), "Buffer1D length must be positive");
        Self { data }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a constructed buffer.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Half the length, used to center a full convolution on its input.
    #[inline]
    pub fn half_length(&self) -> usize {
        self.data.len() / 2
    }

    #[inline]
    pub fn get(&self, i: isize) -> T {
        if i < 0 || i as usize >= self.data.len() {
            return T::default();
        }
        self.data[i as usize]
    }

    #[inline]
    pub fn set(&mut self, i: isize, value: T) {
        if i < 0 || i as usize >= self.data.len() {
            return;
        }
        self.data[i as usize] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_reads_are_zero() {
        let img = Buffer2D::<u8>::filled(3, 2, 7);
        for &(m, n) in &[(-1, 0), (0, -1), (3, 0), (0, 2), (-5, -5), (100, 100)] {
            assert_eq!(img.get(m, n), 0, "({}, {}) should read as zero", m, n);
        }
        assert_eq!(img.get(2, 1), 7);

        let f = Buffer2D::<f32>::filled(2, 2, 1.5);
        assert_eq!(f.get(2, 0), 0.0);
        assert_eq!(f.get(-1, 1), 0.0);

        let sig = Buffer1D::<f32>::from_vec(vec![1.0, 2.0, 3.0]);
        assert_eq!(sig.get(-1), 0.0);
        assert_eq!(sig.get(3), 0.0);
        assert_eq!(sig.get(1), 2.0);

        let ints = Buffer1D::<i32>::from_vec(vec![4, 5]);
        assert_eq!(ints.get(9), 0);
    }

    #[test]
    fn out_of_range_writes_are_dropped() {
        let mut img = Buffer2D::<f32>::new(2, 2);
        img.set(-1, 0, 9.0);
        img.set(2, 1, 9.0);
        img.set(1, 5, 9.0);
        assert!(img.as_slice().iter().all(|&v| v == 0.0));

        img.set(1, 1, 4.0);
        assert_eq!(img.as_slice(), &[0.0, 0.0, 0.0, 4.0]);

        let mut sig = Buffer1D::<u8>::new(2);
        sig.set(2, 1);
        sig.set(-1, 1);
        assert_eq!(sig.as_slice(), &[0, 0]);
    }

    #[test]
    fn storage_is_row_major() {
        let img = Buffer2D::from_fn(3, 2, |m, n| (10 * n + m) as u8);
        assert_eq!(img.as_slice(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(img.get(2, 1), 12);

        let cells: Vec<_> = img.cells().collect();
        assert_eq!(cells[4], ((1, 1), 11));
    }

    #[test]
    fn clone_is_deep() {
        let a = Buffer2D::<f32>::filled(2, 2, 1.0);
        let mut b = a.clone();
        b.set(0, 0, 5.0);
        assert_eq!(a.get(0, 0), 1.0);
        assert_eq!(b.get(0, 0), 5.0);
    }

    #[test]
    fn callbacks_visit_in_storage_order() {
        let img = Buffer2D::from_fn(2, 2, |m, n| (m + 2 * n) as f32);
        let mut seen = Vec::new();
        img.for_each_cell(&mut |m, n, v| seen.push((m, n, v)));
        assert_eq!(
            seen,
            vec![(0, 0, 0.0), (1, 0, 1.0), (0, 1, 2.0), (1, 1, 3.0)]
        );

        let mut doubled = img.clone();
        doubled.map_in_place(|_, v| v * 2.0);
        assert_eq!(doubled.as_slice(), &[0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn tails_and_half_length() {
        assert_eq!(Buffer2D::<f32>::new(5, 3).conv_tail(), (2, 1));
        assert_eq!(Buffer1D::<f32>::new(7).half_length(), 3);
    }

    #[test]
    #[should_panic]
    fn zero_dimension_is_fatal() {
        let _ = Buffer2D::<f32>::new(0, 4);
    }

    #[test]
    #[should_panic]
    fn mismatched_vec_is_fatal() {
        let _ = Buffer2D::from_vec(2, 2, vec![1u8, 2, 3]);
    }
}
