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

// Full linear 2-D convolution with three interchangeable evaluators.
//
// out[m, n] = sum_{k<=min(n,Nf-1)} sum_{l<=min(m,Mf-1)} F[l, k] * I[m-l, n-k]
//
// Every evaluator sums a cell in the same order (k outer, l inner), so the
// results are identical, not merely close.

use std::fmt;
use std::ops::Range;
use std::thread;

use log::{debug, trace};

use crate::buffer::Buffer2D;

/// Default number of worker threads for the parallel evaluator. The output
/// rows are divided roughly equally; the last worker may get less.
pub const CONV_POOL_SIZE: usize = 10;

/// Element types a convolution can read: anything that widens to `f32`.
pub trait Sample: Copy + Default + Into<f32> + Send + Sync {}

impl<T: Copy + Default + Into<f32> + Send + Sync> Sample for T {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvStrategy {
    /// Per-cell callback through dynamic dispatch. Slow on purpose.
    Naive,
    /// Inlined loops with truncated inner bounds.
    Direct,
    /// `Direct`, with output rows split across scoped worker threads.
    Parallel { workers: usize },
}

impl Default for ConvStrategy {
    fn default() -> Self {
        ConvStrategy::Parallel {
            workers: CONV_POOL_SIZE,
        }
    }
}

impl fmt::Display for ConvStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvStrategy::Naive => f.write_str("naive"),
            ConvStrategy::Direct => f.write_str("direct"),
            ConvStrategy::Parallel { workers } => write!(f, "parallel ({} workers)", workers),
        }
    }
}

/// Split `[0, total)` into exactly `workers` contiguous ranges of
/// `ceil(total / workers)` items. Trailing ranges may be short or empty.
pub fn partition(total: usize, workers: usize) -> Vec<Range<usize>> {
    assert!(workers > 0, "worker count must be positive");
    let dn = total.div_ceil(workers);
    (0..workers)
        .map(|i| {
            let n0 = (i * dn).min(total);
            let n1 = (n0 + dn).min(total);
            n0..n1
        })
        .collect()
}

/// One convolution job: borrowed input and filter plus derived sizes.
pub struct ConvolutionPlan<'a, T1, T2> {
    input: &'a Buffer2D<T1>,
    filter: &'a Buffer2D<T2>,
    mf: usize,
    nf: usize,
    m: usize,
    n: usize,
}

impl<'a, T1: Sample, T2: Sample> ConvolutionPlan<'a, T1, T2> {
    pub fn new(input: &'a Buffer2D<T1>, filter: &'a Buffer2D<T2>) -> Self {
        let (mi, ni) = (input.width(), input.height());
        let (mf, nf) = (filter.width(), filter.height());
        Self {
            input,
            filter,
            mf,
            nf,
            m: mi + mf - 1,
            n: ni + nf - 1,
        }
    }

    /// `(Mi + Mf - 1, Ni + Nf - 1)`
    pub fn output_dims(&self) -> (usize, usize) {
        (self.m, self.n)
    }

    pub fn execute(&self, strategy: ConvStrategy) -> Buffer2D<f32> {
        debug!(
            "Convolving {}x{} input with {}x{} filter -> {}x{} ({})",
            self.input.width(),
            self.input.height(),
            self.mf,
            self.nf,
            self.m,
            self.n,
            strategy
        );
        match strategy {
            ConvStrategy::Naive => self.execute_naive(),
            ConvStrategy::Direct => self.execute_direct(),
            ConvStrategy::Parallel { workers } => self.execute_parallel(workers),
        }
    }

    fn execute_naive(&self) -> Buffer2D<f32> {
        let input = self.input;
        let filter = self.filter;
        Buffer2D::from_fn(self.m, self.n, |m, n| {
            let mut sum = 0.0f32;
            filter.for_each_cell(&mut |l, k, v| {
                let f: f32 = v.into();
                let x: f32 = input.get(m as isize - l as isize, n as isize - k as isize).into();
                sum += f * x;
            });
            sum
        })
    }

    fn execute_direct(&self) -> Buffer2D<f32> {
        let mut output = Buffer2D::new(self.m, self.n);
        self.evaluate_rows(0..self.n, output.as_mut_slice());
        output
    }

    fn execute_parallel(&self, workers: usize) -> Buffer2D<f32> {
        let mut output = Buffer2D::new(self.m, self.n);
        let ranges = partition(self.n, workers);
        let width = self.m;

        thread::scope(|scope| {
            let mut rest = output.as_mut_slice();
            for range in ranges {
                let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(range.len() * width);
                rest = tail;
                if range.is_empty() {
                    continue;
                }
                trace!("Spawning convolution worker for rows {:?}", range);
                scope.spawn(move || self.evaluate_rows(range, chunk));
            }
        });

        output
    }

    /// Fill `out` (rows `rows` of the output, row-major) with convolution sums.
    fn evaluate_rows(&self, rows: Range<usize>, out: &mut [f32]) {
        debug_assert_eq!(out.len(), rows.len() * self.m);
        for (row, n) in out.chunks_exact_mut(self.m).zip(rows) {
            for (m, cell) in row.iter_mut().enumerate() {
                *cell = self.cell(m, n);
            }
        }
    }

    #[inline]
    fn cell(&self, m: usize, n: usize) -> f32 {
        let mut sum = 0.0f32;
        for k in 0..=n.min(self.nf - 1) {
            for l in 0..=m.min(self.mf - 1) {
                let f: f32 = self.filter.get(l as isize, k as isize).into();
                let x: f32 = self.input.get((m - l) as isize, (n - k) as isize).into();
                sum += f * x;
            }
        }
        sum
    }
}

/// Full linear convolution of `input` with `filter`, sized
/// `(Mi + Mf - 1, Ni + Nf - 1)`.
pub fn convolve<T1: Sample, T2: Sample>(
    input: &Buffer2D<T1>,
    filter: &Buffer2D<T2>,
    strategy: ConvStrategy,
) -> Buffer2D<f32> {
    ConvolutionPlan::new(input, filter).execute(strategy)
}
