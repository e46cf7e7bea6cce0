//! Natural cubic spline evaluation for tone curves.
//!
//! A tone curve is given as knot points `(x, y)` with strictly ascending
//! `x`. The curve passes through every knot with continuous first and
//! second derivatives; the second derivative is zero at both ends
//! (natural boundary). Outside the knot range the curve is held flat at the
//! first/last knot value.
//!
//! # Usage
//!
//! ```rust
//! use rawpipe_math::CubicSpline;
//!
//! let spline = CubicSpline::new(&[(0.0, 0.0), (0.5, 0.6), (1.0, 1.0)]).unwrap();
//! assert!((spline.eval(0.5) - 0.6).abs() < 1e-6);
//!
//! let table = spline.sample(65536);
//! assert_eq!(table.len(), 65536);
//! ```

/// Natural cubic spline through a set of knots.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    xs: Vec<f32>,
    ys: Vec<f32>,
    /// Second derivatives at each knot.
    m: Vec<f32>,
}

impl CubicSpline {
    /// Builds a spline through `knots`.
    ///
    /// Returns `None` for fewer than two knots, non-finite values or
    /// x coordinates that are not strictly ascending.
    pub fn new(knots: &[(f32, f32)]) -> Option<Self> {
        if knots.len() < 2 {
            return None;
        }
        if knots.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return None;
        }
        if knots.windows(2).any(|w| w[1].0 <= w[0].0) {
            return None;
        }

        let xs: Vec<f32> = knots.iter().map(|k| k.0).collect();
        let ys: Vec<f32> = knots.iter().map(|k| k.1).collect();
        let m = second_derivatives(&xs, &ys);
        Some(Self { xs, ys, m })
    }

    /// Number of knots.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always `false`; a spline holds at least two knots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Evaluates the curve at `x`.
    pub fn eval(&self, x: f32) -> f32 {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }

        // Binary search for the segment [lo, hi] containing x
        let mut lo = 0;
        let mut hi = n - 1;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if self.xs[mid] <= x {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let h = self.xs[hi] - self.xs[lo];
        let a = (self.xs[hi] - x) / h;
        let b = (x - self.xs[lo]) / h;
        a * self.ys[lo]
            + b * self.ys[hi]
            + ((a * a * a - a) * self.m[lo] + (b * b * b - b) * self.m[hi]) * (h * h) / 6.0
    }

    /// Samples the curve at `count` evenly spaced points over [0, 1].
    ///
    /// Output values are clamped to [0, 1].
    pub fn sample(&self, count: usize) -> Vec<f32> {
        let denom = (count.max(2) - 1) as f32;
        (0..count)
            .map(|i| self.eval(i as f32 / denom).clamp(0.0, 1.0))
            .collect()
    }
}

/// Identity sample table: `table[i] = i / (count - 1)`.
pub fn identity_samples(count: usize) -> Vec<f32> {
    let denom = (count.max(2) - 1) as f32;
    (0..count).map(|i| i as f32 / denom).collect()
}

/// Solves the tridiagonal system for natural spline second derivatives.
fn second_derivatives(xs: &[f32], ys: &[f32]) -> Vec<f32> {
    let n = xs.len();
    let mut m = vec![0.0f32; n];
    if n < 3 {
        return m;
    }

    // Thomas algorithm over the interior knots
    let mut c_prime = vec![0.0f32; n];
    let mut d_prime = vec![0.0f32; n];
    for i in 1..n - 1 {
        let h0 = xs[i] - xs[i - 1];
        let h1 = xs[i + 1] - xs[i];
        let a = h0 / 6.0;
        let b = (h0 + h1) / 3.0;
        let c = h1 / 6.0;
        let d = (ys[i + 1] - ys[i]) / h1 - (ys[i] - ys[i - 1]) / h0;

        let denom = b - a * c_prime[i - 1];
        c_prime[i] = c / denom;
        d_prime[i] = (d - a * d_prime[i - 1]) / denom;
    }
    for i in (1..n - 1).rev() {
        m[i] = d_prime[i] - c_prime[i] * m[i + 1];
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rejects_bad_knots() {
        assert!(CubicSpline::new(&[(0.0, 0.0)]).is_none());
        assert!(CubicSpline::new(&[(0.5, 0.0), (0.5, 1.0)]).is_none());
        assert!(CubicSpline::new(&[(0.6, 0.0), (0.2, 1.0)]).is_none());
        assert!(CubicSpline::new(&[(0.0, f32::NAN), (1.0, 1.0)]).is_none());
    }

    #[test]
    fn test_two_knots_is_linear() {
        let s = CubicSpline::new(&[(0.0, 0.0), (1.0, 1.0)]).unwrap();
        for i in 0..=10 {
            let x = i as f32 / 10.0;
            assert_abs_diff_eq!(s.eval(x), x, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_passes_through_knots() {
        let knots = [(0.0, 0.0), (0.25, 0.35), (0.5, 0.6), (0.75, 0.85), (1.0, 1.0)];
        let s = CubicSpline::new(&knots).unwrap();
        for (x, y) in knots {
            assert_abs_diff_eq!(s.eval(x), y, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_flat_outside_range() {
        let s = CubicSpline::new(&[(0.2, 0.1), (0.8, 0.9)]).unwrap();
        assert_eq!(s.eval(0.0), 0.1);
        assert_eq!(s.eval(1.0), 0.9);
    }

    #[test]
    fn test_sample_clamped() {
        let s = CubicSpline::new(&[(0.0, -0.5), (1.0, 1.5)]).unwrap();
        let table = s.sample(256);
        assert_eq!(table[0], 0.0);
        assert_eq!(table[255], 1.0);
    }

    #[test]
    fn test_identity_samples() {
        let t = identity_samples(65536);
        assert_eq!(t[0], 0.0);
        assert_eq!(t[65535], 1.0);
        assert_abs_diff_eq!(t[32768], 32768.0 / 65535.0, epsilon = 1e-7);
    }
}
