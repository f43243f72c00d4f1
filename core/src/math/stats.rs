pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Population mean and standard deviation in one pass over the slice.
    pub fn mean_std(values: &[f64]) -> (f64, f64) {
        if values.is_empty() {
            return (0.0, 0.0);
        }
        let mean = Self::mean(values);
        let variance =
            values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
        (mean, variance.sqrt())
    }

    /// Nearest-rank percentile, `p` in 0..=100. Empty input yields 0.
    pub fn percentile(values: &[f64], p: f64) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
        sorted[rank.clamp(1, sorted.len()) - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_std_of_constant_sequence() {
        let (mean, std) = StatsHelper::mean_std(&[3.0, 3.0, 3.0]);
        assert_eq!(mean, 3.0);
        assert_eq!(std, 0.0);
    }

    #[test]
    fn mean_std_empty_yields_zero() {
        assert_eq!(StatsHelper::mean_std(&[]), (0.0, 0.0));
    }

    #[test]
    fn percentile_picks_nearest_rank() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert_eq!(StatsHelper::percentile(&values, 50.0), 5.0);
        assert_eq!(StatsHelper::percentile(&values, 90.0), 9.0);
        assert_eq!(StatsHelper::percentile(&values, 100.0), 10.0);
    }
}
