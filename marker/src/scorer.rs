//! # Scorer Module
//!
//! Index-wise accuracy of a prediction sequence against a label sequence.

use serde::Serialize;

/// Outcome of a successful comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Accuracy {
    pub correct: usize,
    pub total: usize,
    /// Percentage in `[0, 100]`, rounded half-up to two decimals.
    pub percentage: f64,
}

/// Predictions and labels cannot be aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthMismatch {
    pub predictions: usize,
    pub labels: usize,
}

/// Computes `100 × matches / labels`.
///
/// Equality is exact value equality. Both sequences must have the same length;
/// otherwise no score is computed and the caller gets both counts back.
///
/// # Example
///
/// ```
/// use marker::scorer::compute_accuracy;
///
/// let acc = compute_accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]).unwrap();
/// assert_eq!(acc.correct, 3);
/// assert_eq!(acc.percentage, 75.0);
/// ```
pub fn compute_accuracy(predictions: &[i64], labels: &[i64]) -> Result<Accuracy, LengthMismatch> {
    if predictions.len() != labels.len() {
        return Err(LengthMismatch {
            predictions: predictions.len(),
            labels: labels.len(),
        });
    }

    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|(p, l)| p == l)
        .count();

    Ok(Accuracy {
        correct,
        total: labels.len(),
        percentage: percentage_half_up(correct, labels.len()),
    })
}

/// `100 × part / whole` rounded half-up to two decimals, computed in integer
/// hundredths so ties such as 12.345 never fall the wrong way through binary
/// floating point. An empty `whole` yields 0.
pub fn percentage_half_up(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let part = part as u128;
    let whole = whole as u128;
    let hundredths = (part * 10_000 * 2 + whole) / (whole * 2);
    hundredths as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_of_four_is_seventy_five() {
        let acc = compute_accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]).unwrap();
        assert_eq!(acc.correct, 3);
        assert_eq!(acc.total, 4);
        assert_eq!(acc.percentage, 75.00);
    }

    #[test]
    fn length_mismatch_reports_both_counts() {
        let err = compute_accuracy(&[1; 8], &[1; 10]).unwrap_err();
        assert_eq!(
            err,
            LengthMismatch {
                predictions: 8,
                labels: 10
            }
        );
    }

    #[test]
    fn perfect_and_zero_scores() {
        assert_eq!(compute_accuracy(&[4, 2], &[4, 2]).unwrap().percentage, 100.0);
        assert_eq!(compute_accuracy(&[1, 1], &[2, 2]).unwrap().percentage, 0.0);
    }

    #[test]
    fn rounds_to_two_decimals_half_up() {
        assert_eq!(percentage_half_up(2, 3), 66.67);
        assert_eq!(percentage_half_up(1, 3), 33.33);
        assert_eq!(percentage_half_up(1, 8), 12.5);
        // 1/16000 = 0.00625% -> 0.01
        assert_eq!(percentage_half_up(1, 16_000), 0.01);
        // 1/80000 = 0.00125% -> 0.00
        assert_eq!(percentage_half_up(1, 80_000), 0.0);
    }

    #[test]
    fn empty_sequences_score_zero() {
        let acc = compute_accuracy(&[], &[]).unwrap();
        assert_eq!(acc.total, 0);
        assert_eq!(acc.percentage, 0.0);
    }
}
