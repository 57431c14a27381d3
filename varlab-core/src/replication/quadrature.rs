//! Trapezoidal quadrature over an irregular strike grid.
//!
//! The replication integral is taken over the discrete strikes the market
//! actually quotes, which are unevenly spaced. The trapezoidal rule has
//! O(h^2) local error in the grid spacing h; the end-to-end approximation
//! error against a known flat-volatility surface is pinned to 1% by test.

/// Integrate y over x with the trapezoidal rule.
///
/// Points must be sorted by x ascending. Fewer than two points integrate
/// to zero (no interval to cover).
pub fn trapezoid(points: &[(f64, f64)]) -> f64 {
    points
        .windows(2)
        .map(|w| {
            let (x0, y0) = w[0];
            let (x1, y1) = w[1];
            (x1 - x0) * (y0 + y1) / 2.0
        })
        .sum()
}
