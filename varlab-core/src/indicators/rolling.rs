//! Rolling-window statistics over a raw f64 series.

/// Rolling sample standard deviation (divide by N-1) over a trailing
/// window including the current observation. Indices before the window
/// fills are NaN, as is any window containing a NaN.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    assert!(window >= 2, "rolling std window must be >= 2");
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = slice.iter().sum::<f64>() / window as f64;
        let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            / (window - 1) as f64;
        result[i] = var.sqrt();
    }
    result
}
