//! Rolling-window primitives.
//!
//! Every function returns one value per input element, aligned by index. Positions
//! without a full trailing window carry `None`.

/// Percent change over `period` elements: `(data[i] / data[i - period] - 1) * 100`
pub fn trailing_return(data: &[f64], period: usize) -> Vec<Option<f64>> {
    data.iter()
        .enumerate()
        .map(|(i, &current)| {
            if period == 0 || i < period {
                None
            } else {
                Some((current / data[i - period] - 1.0) * 100.0)
            }
        })
        .collect()
}

/// Simple Moving Average
pub fn rolling_mean(data: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(data, period, |window| {
        window.iter().sum::<f64>() / period as f64
    })
}

/// Highest value in the trailing window, current element included
pub fn rolling_max(data: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(data, period, |window| {
        window.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

/// Lowest value in the trailing window, current element included
pub fn rolling_min(data: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(data, period, |window| {
        window.iter().copied().fold(f64::INFINITY, f64::min)
    })
}

fn rolling<F>(data: &[f64], period: usize, reduce: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    (0..data.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                None
            } else {
                Some(reduce(&data[i + 1 - period..=i]))
            }
        })
        .collect()
}
