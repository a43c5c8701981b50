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

// Polyphase form of the U/D resampler.
//
// The prototype filter h (length L) is split into U*D sub-filters of
// R = floor(L / (U*D)) taps: sub-filter f = u*D + d holds h[n*U*D + f].
// Coefficients past R*U*D are dropped, so this form matches the direct
// resampler run on taps[..R*U*D], not on the full filter.
//
// With input k = p*D + s and output j = q*U + r:
//     j*D - k*U = (q - p)*U*D + (r*D - s*U)
// so the pair (r, s) always meets the same sub-filter
//     f = (r*D - s*U) mod U*D
// and reads its tap q - p - c, where c = 1 when r*D < s*U. When U and D
// share a factor, several pairs meet the same sub-filter.
//
// Every (r, s) route owns an accumulation ring of R cells indexed by block;
// routes share only the coefficients. Routes with c = 1 finish one block
// before their output is due; their block sum is parked in `pending` and
// added to the next emission.

use log::trace;

use crate::model::Error;
use crate::resample::{Resample, check_factors};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Route {
    sub: usize,
    out_phase: usize,
    carry: bool,
}

pub struct PolyphaseResampler {
    up: usize,
    down: usize,
    taps_per_phase: usize,
    // bank[f][n] = h[n*U*D + f]
    bank: Vec<Vec<f32>>,
    // routes[s*U + r] and its ring acc[s*U + r]
    routes: Vec<Route>,
    acc: Vec<Vec<f32>>,
    pending: Vec<f32>,
    block: usize,
    phase: usize,
}

impl PolyphaseResampler {
    pub fn new(up: usize, down: usize, taps: &[f32]) -> Result<Self, Error> {
        check_factors(up, down)?;
        let phases = up * down;
        if taps.len() < phases {
            return Err(Error::FilterTooShort {
                taps: taps.len(),
                needed: phases,
            });
        }

        let taps_per_phase = taps.len() / phases;
        let bank: Vec<Vec<f32>> = (0..phases)
            .map(|f| (0..taps_per_phase).map(|n| taps[n * phases + f]).collect())
            .collect();

        let routes: Vec<Route> = (0..down)
            .flat_map(|s| {
                (0..up).map(move |r| {
                    let t = (r * down) as isize - (s * up) as isize;
                    Route {
                        sub: t.rem_euclid(phases as isize) as usize,
                        out_phase: r,
                        carry: t < 0,
                    }
                })
            })
            .collect();

        trace!(
            "Polyphase resampler U={} D={} phases={} taps/phase={} (dropped {})",
            up,
            down,
            phases,
            taps_per_phase,
            taps.len() - taps_per_phase * phases
        );

        Ok(Self {
            up,
            down,
            taps_per_phase,
            bank,
            acc: vec![vec![0.0; taps_per_phase]; routes.len()],
            routes,
            pending: vec![0.0; up],
            block: 0,
            phase: 0,
        })
    }

    pub fn taps_per_phase(&self) -> usize {
        self.taps_per_phase
    }

    /// Length of the prefix of the prototype filter the bank actually uses.
    pub fn used_taps(&self) -> usize {
        self.taps_per_phase * self.up * self.down
    }

    #[inline]
    fn sub_index(&self, u: usize, d: usize, n: usize) -> Option<usize> {
        (u < self.up && d < self.down && n < self.taps_per_phase).then_some(u * self.down + d)
    }

    /// Tap `n` of sub-filter `(u, d)`, i.e. `h[n*U*D + u*D + d]`. Zero when
    /// out of range.
    pub fn coefficient(&self, u: usize, d: usize, n: usize) -> f32 {
        match self.sub_index(u, d, n) {
            Some(f) => self.bank[f][n],
            None => 0.0,
        }
    }

    /// Overwrite one bank coefficient. Out-of-range writes are ignored.
    pub fn set_coefficient(&mut self, u: usize, d: usize, n: usize, value: f32) {
        if let Some(f) = self.sub_index(u, d, n) {
            self.bank[f][n] = value;
        }
    }

    /// Clear all history, keeping the coefficients.
    pub fn reset(&mut self) {
        for ring in &mut self.acc {
            ring.fill(0.0);
        }
        self.pending.fill(0.0);
        self.block = 0;
        self.phase = 0;
    }

    fn emit(&mut self, out: &mut Vec<f32>) -> usize {
        let start = out.len();
        out.extend_from_slice(&self.pending);
        self.pending.fill(0.0);

        let block = self.block;
        for (route, ring) in self.routes.iter().zip(&mut self.acc) {
            let cell = &mut ring[block];
            if route.carry {
                self.pending[route.out_phase] += *cell;
            } else {
                out[start + route.out_phase] += *cell;
            }
            *cell = 0.0;
        }

        self.block = (block + 1) % self.taps_per_phase;
        self.up
    }
}

impl Resample for PolyphaseResampler {
    #[inline]
    fn feed(&mut self, x: f32, out: &mut Vec<f32>) -> usize {
        let r_len = self.taps_per_phase;
        let first = self.phase * self.up;
        let routes = &self.routes[first..first + self.up];
        for (route, ring) in routes.iter().zip(&mut self.acc[first..first + self.up]) {
            for (i, &h) in self.bank[route.sub].iter().enumerate() {
                ring[(self.block + i) % r_len] += x * h;
            }
        }

        self.phase += 1;
        if self.phase < self.down {
            return 0;
        }
        self.phase = 0;
        self.emit(out)
    }

    fn up(&self) -> usize {
        self.up
    }

    fn down(&self) -> usize {
        self.down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direct_resampler::DirectResampler;
    use crate::resample::max_deviation;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn bank_layout() {
        let taps: Vec<f32> = (0..14).map(|i| i as f32).collect();
        let mut p = PolyphaseResampler::new(3, 2, &taps).unwrap();
        // R = 14 / 6 = 2; the last two taps are dropped.
        assert_eq!(p.taps_per_phase(), 2);
        for u in 0..3 {
            for d in 0..2 {
                for n in 0..2 {
                    assert_eq!(p.coefficient(u, d, n), (n * 6 + u * 2 + d) as f32);
                }
            }
        }
        assert_eq!(p.coefficient(3, 0, 0), 0.0);
        assert_eq!(p.coefficient(0, 0, 2), 0.0);

        p.set_coefficient(1, 1, 1, -9.0);
        assert_eq!(p.coefficient(1, 1, 1), -9.0);
        p.set_coefficient(0, 5, 0, 42.0);
        assert_eq!(p.coefficient(0, 0, 0), 0.0);
    }

    #[test]
    fn three_over_two_impulse() {
        let taps = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut p = PolyphaseResampler::new(3, 2, &taps).unwrap();
        let out = p.process(&[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(out, vec![1.0, 3.0, 5.0, 0.0, 0.0, 0.0]);

        // Impulse in the odd input phase: y[j] = h[2j - 3].
        p.reset();
        let out = p.process(&[0.0, 1.0, 0.0, 0.0]);
        assert_eq!(out, vec![0.0, 0.0, 2.0, 4.0, 6.0, 0.0]);
    }

    #[test]
    fn matches_direct_form() {
        let mut rng = StdRng::seed_from_u64(42);
        let taps: Vec<f32> = (0..48).map(|_| rng.random_range(-0.1f32..0.1)).collect();
        let input: Vec<f32> = (0..600).map(|_| rng.random_range(-1.0f32..1.0)).collect();

        for (up, down) in [(3, 2), (2, 3), (1, 1), (4, 3), (1, 2), (4, 2), (2, 2), (6, 4)] {
            let mut direct = DirectResampler::new(up, down, &taps).unwrap();
            let mut poly = PolyphaseResampler::new(up, down, &taps).unwrap();
            let a = direct.process(&input);
            let b = poly.process(&input);

            let expected = input.len() * up / down;
            assert!(
                a.len().abs_diff(expected) <= 1 && b.len().abs_diff(expected) <= 1,
                "U={} D={}: lengths {} / {}, expected about {}",
                up,
                down,
                a.len(),
                b.len(),
                expected
            );

            let dev = max_deviation(&a, &b);
            assert!(dev < 1e-5, "U={} D={}: max deviation {}", up, down, dev);
        }
    }

    #[test]
    fn bank_ignores_taps_past_the_last_block() {
        // 47 = 7 * 6 + 5: the last five taps fall outside the bank.
        let taps: Vec<f32> = (0..47).map(|i| 1.0 / (1.0 + i as f32)).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let input: Vec<f32> = (0..200).map(|_| rng.random_range(-1.0f32..1.0)).collect();

        let mut poly = PolyphaseResampler::new(3, 2, &taps).unwrap();
        assert_eq!(poly.used_taps(), 42);
        let out = poly.process(&input);

        let mut direct = DirectResampler::new(3, 2, &taps[..poly.used_taps()]).unwrap();
        let reference = direct.process(&input);
        assert_eq!(out.len(), reference.len());
        let dev = max_deviation(&out, &reference);
        assert!(dev < 1e-5, "max deviation against the used prefix {}", dev);

        let mut altered = taps.clone();
        for h in &mut altered[42..] {
            *h = 100.0;
        }
        let mut poly_altered = PolyphaseResampler::new(3, 2, &altered).unwrap();
        assert_eq!(poly_altered.process(&input), out);
    }

    #[test]
    fn shared_factor_matches_textbook_definition() {
        // U=4, D=2: y[j] = sum_k x[k] h[2j - 4k]
        let taps: Vec<f32> = (1..=16).map(|i| i as f32).collect();
        let input = [1.0f32, -2.0, 0.5, 3.0, 0.0, 0.0, 0.0, 0.0];
        let mut p = PolyphaseResampler::new(4, 2, &taps).unwrap();
        let out = p.process(&input);
        assert_eq!(out.len(), 16);
        for (j, &y) in out.iter().enumerate() {
            let expected: f32 = input
                .iter()
                .enumerate()
                .filter_map(|(k, &x)| {
                    let t = (2 * j) as isize - (4 * k) as isize;
                    (0..16).contains(&t).then(|| x * taps[t as usize])
                })
                .sum();
            assert!((y - expected).abs() < 1e-5, "y[{}] = {}, expected {}", j, y, expected);
        }
    }

    #[test]
    fn unity_gain_filter_passes_dc() {
        let taps = [0.25f32; 4];
        let mut p = PolyphaseResampler::new(1, 1, &taps).unwrap();
        let out = p.process(&[1.0; 16]);
        assert_eq!(out.len(), 16);
        assert!(out[3..].iter().all(|&y| (y - 1.0).abs() < 1e-6));
    }

    #[test]
    fn emits_in_blocks_of_up() {
        let mut p = PolyphaseResampler::new(3, 2, &[1.0; 12]).unwrap();
        let mut out = Vec::new();
        let counts: Vec<usize> = (0..6).map(|_| p.feed(1.0, &mut out)).collect();
        assert_eq!(counts, vec![0, 3, 0, 3, 0, 3]);
        assert_eq!(out.len(), 9);
    }

    #[test]
    fn rejects_unsupported_configurations() {
        assert!(matches!(
            PolyphaseResampler::new(0, 2, &[1.0; 16]),
            Err(Error::InvalidFactors { up: 0, down: 2 })
        ));
        assert!(matches!(
            PolyphaseResampler::new(3, 2, &[1.0; 5]),
            Err(Error::FilterTooShort { taps: 5, needed: 6 })
        ));
        assert!(PolyphaseResampler::new(3, 0, &[1.0; 6]).is_err());
    }
}
