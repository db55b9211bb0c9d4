#[cfg(test)]
mod tests {
    use super::super::indicators::*;

    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]
    }

    #[test]
    fn test_rolling_mean_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = rolling_mean(&data, 3);

        assert_eq!(result.len(), data.len());
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert!((result[2].unwrap() - 2.0).abs() < 1e-12); // (1+2+3)/3
        assert!((result[3].unwrap() - 3.0).abs() < 1e-12);
        assert!((result[4].unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_mean_insufficient_data() {
        let data = vec![1.0, 2.0];
        let result = rolling_mean(&data, 5);

        assert_eq!(result, vec![None, None]);
    }

    #[test]
    fn test_rolling_mean_real_prices() {
        let prices = sample_prices();
        let result = rolling_mean(&prices, 5);

        let expected_first = (44.34 + 44.09 + 44.15 + 43.61 + 44.33) / 5.0;
        assert!((result[4].unwrap() - expected_first).abs() < 1e-9);
        assert!(result[..4].iter().all(Option::is_none));
    }

    #[test]
    fn test_rolling_extremes_include_current_element() {
        let data = vec![5.0, 1.0, 3.0, 9.0, 2.0];

        let highs = rolling_max(&data, 3);
        assert_eq!(highs, vec![None, None, Some(5.0), Some(9.0), Some(9.0)]);

        let lows = rolling_min(&data, 3);
        assert_eq!(lows, vec![None, None, Some(1.0), Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_rolling_extremes_forget_old_values() {
        let mut data = vec![1000.0];
        data.extend(std::iter::repeat(10.0).take(5));

        let highs = rolling_max(&data, 5);
        assert_eq!(highs[4], Some(1000.0));
        assert_eq!(highs[5], Some(10.0));
    }

    #[test]
    fn test_trailing_return() {
        let data = vec![100.0, 105.0, 110.0, 99.0];
        let result = trailing_return(&data, 2);

        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert!((result[2].unwrap() - 10.0).abs() < 1e-9);
        assert!((result[3].unwrap() - (99.0 / 105.0 - 1.0) * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_trailing_return_from_zero_is_not_finite() {
        let data = vec![0.0, 5.0];
        let result = trailing_return(&data, 1);

        assert!(!result[1].unwrap().is_finite());
    }

    #[test]
    fn test_zero_period_yields_nothing() {
        let prices = sample_prices();
        assert!(rolling_mean(&prices, 0).iter().all(Option::is_none));
        assert!(trailing_return(&prices, 0).iter().all(Option::is_none));
    }
}
