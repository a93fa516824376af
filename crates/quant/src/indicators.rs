//! Price-history indicators.
//!
//! Both functions read a tick-indexed price series whose last entry is
//! the most recent price, and return `None` while the series is too
//! short, which callers treat as "hold".

/// Simple moving average over the trailing `window` prices.
pub fn moving_average(prices: &[f64], window: usize) -> Option<f64> {
    if window == 0 || prices.len() < window {
        return None;
    }
    let sum: f64 = prices[prices.len() - window..].iter().sum();
    Some(sum / window as f64)
}

/// Relative Strength Index with Wilder's smoothing, over percentage
/// returns of the trailing `period + 1` prices.
///
/// The seed averages are the gains/losses of the first `period`
/// prices in the window; the most recent return is folded in with one
/// smoothing step. Returns exactly 100 when the window shows no
/// losses. The result is always within `[0, 100]`.
pub fn relative_strength_index(prices: &[f64], period: usize) -> Option<f64> {
    if period < 2 || prices.len() < period + 1 {
        return None;
    }
    let window = &prices[prices.len() - (period + 1)..];

    let mut cumulative_gain = 0.0;
    let mut cumulative_loss = 0.0;
    for pair in window[..period].windows(2) {
        let ret = percentage_return(pair[0], pair[1]);
        if ret > 0.0 {
            cumulative_gain += ret;
        } else {
            cumulative_loss += ret.abs();
        }
    }
    let avg_gain_seed = cumulative_gain / period as f64;
    let avg_loss_seed = cumulative_loss / period as f64;

    let current = percentage_return(window[period - 1], window[period]);
    let (current_gain, current_loss) = if current > 0.0 {
        (current, 0.0)
    } else {
        (0.0, current.abs())
    };

    let avg_gain = ((period - 1) as f64 * avg_gain_seed + current_gain) / period as f64;
    let avg_loss = ((period - 1) as f64 * avg_loss_seed + current_loss) / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
}

fn percentage_return(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average_trailing_window() {
        let prices = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(moving_average(&prices, 3), Some(4.0));
        assert_eq!(moving_average(&prices, 5), Some(3.0));
        assert_eq!(moving_average(&prices, 6), None);
    }

    #[test]
    fn test_rsi_requires_period_plus_one_prices() {
        let prices = vec![10.0; 14];
        assert!(relative_strength_index(&prices, 14).is_none());
        let prices = vec![10.0; 15];
        assert!(relative_strength_index(&prices, 14).is_some());
    }

    #[test]
    fn test_rsi_is_100_without_losses() {
        let prices: Vec<f64> = (1..=20).map(|t| t as f64).collect();
        assert_eq!(relative_strength_index(&prices, 14), Some(100.0));
        // Flat prices have zero average loss as well.
        let flat = vec![10.0; 20];
        assert_eq!(relative_strength_index(&flat, 14), Some(100.0));
    }

    #[test]
    fn test_rsi_is_low_in_steady_decline() {
        let prices: Vec<f64> = (0..20).map(|t| 100.0 - 2.0 * t as f64).collect();
        let rsi = relative_strength_index(&prices, 14).unwrap();
        assert!(rsi < 5.0, "steady decline should push RSI near 0, got {rsi}");
    }

    #[test]
    fn test_rsi_bounds() {
        // A mixed path stays strictly inside the bounds.
        let prices: Vec<f64> = (0..40)
            .map(|t| 50.0 + ((t * 31) % 7) as f64 - 3.0)
            .collect();
        let rsi = relative_strength_index(&prices, 14).unwrap();
        assert!((0.0..=100.0).contains(&rsi));
    }
}
