//! Small descriptive statistics used by the reports.

/// Mean / median / min / max over a set of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    /// `None` for an empty slice.
    pub fn of(values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let (&min, &max) = (sorted.first()?, sorted.last()?);
        Some(Self {
            count: sorted.len(),
            mean: mean(&sorted)?,
            median: median_sorted(&sorted),
            min,
            max,
        })
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Middle value; the average of the two middle values for even counts.
fn median_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Ordinary least-squares fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Standard error of the slope.
    pub std_err: f64,
    pub n_points: usize,
}

/// Fits a line through `points`. Needs at least three points and some spread
/// in `x`; returns `None` otherwise.
pub fn linear_regression(points: &[(f64, f64)]) -> Option<Regression> {
    let n = points.len();
    if n < 3 {
        return None;
    }

    let nf = n as f64;
    let x_mean = points.iter().map(|(x, _)| x).sum::<f64>() / nf;
    let y_mean = points.iter().map(|(_, y)| y).sum::<f64>() / nf;

    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    let mut ss_xy = 0.0;
    for (x, y) in points {
        let dx = x - x_mean;
        let dy = y - y_mean;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
        ss_xy += dx * dy;
    }
    if ss_xx == 0.0 {
        return None;
    }

    let slope = ss_xy / ss_xx;
    let intercept = y_mean - slope * x_mean;
    let r = if ss_yy == 0.0 {
        0.0
    } else {
        (ss_xy / (ss_xx * ss_yy).sqrt()).clamp(-1.0, 1.0)
    };
    let r_squared = r * r;
    let std_err = ((1.0 - r_squared) * ss_yy / ss_xx / (nf - 2.0)).sqrt();

    Some(Regression {
        slope,
        intercept,
        r_squared,
        std_err,
        n_points: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_values() {
        let s = Summary::of(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);

        assert_eq!(Summary::of(&[]), None);
        assert_eq!(Summary::of(&[5.0, 1.0, 3.0]).map(|s| s.median), Some(3.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn regression_on_exact_line() {
        let points: Vec<(f64, f64)> = (1..=5).map(|x| (x as f64, 3.0 * x as f64 + 2.0)).collect();
        let reg = linear_regression(&points).unwrap();
        assert!((reg.slope - 3.0).abs() < 1e-12);
        assert!((reg.intercept - 2.0).abs() < 1e-12);
        assert!((reg.r_squared - 1.0).abs() < 1e-12);
        assert!(reg.std_err.abs() < 1e-6);
        assert_eq!(reg.n_points, 5);
    }

    #[test]
    fn regression_rejects_degenerate_input() {
        assert_eq!(linear_regression(&[(1.0, 1.0), (2.0, 2.0)]), None);
        assert_eq!(linear_regression(&[(1.0, 1.0), (1.0, 2.0), (1.0, 3.0)]), None);
    }

    #[test]
    fn regression_on_noisy_data() {
        let points = [(1.0, 2.0), (2.0, 4.5), (3.0, 5.5), (4.0, 8.0)];
        let reg = linear_regression(&points).unwrap();
        assert!((reg.slope - 1.9).abs() < 1e-9);
        assert!(reg.r_squared > 0.95 && reg.r_squared < 1.0);
    }
}
