//! Linear-interpolation height estimator.
//!
//! Given a bracket of two known blocks, the average spacing between them is
//! used to project how many blocks were mined between `bracket.low` and the
//! target timestamp:
//!
//! ```text
//! estimate = low.height + floor((target - low.timestamp) * block_span / time_span)
//! ```
//!
//! The projection is computed in exact integer arithmetic (`i128`, Euclidean
//! division), so it is monotonic in the target timestamp for a fixed bracket.

use crate::error::EstimateError;
use crate::types::Bracket;

/// Estimate the height of the block mined at `target` from a bracket.
///
/// The result is clamped to at least 1 (height 0 is a sentinel, never an
/// estimate) and, when `frontier` is known, to at most the frontier height.
///
/// # Errors
///
/// [`EstimateError::InvalidBracket`] if the bracket's block span or time
/// span is not positive.
///
/// # Examples
///
/// ```
/// use blocktime_core::estimator::estimate_height;
/// use blocktime_core::types::{Bracket, ReferencePoint};
///
/// let bracket = Bracket::new(ReferencePoint::new(100, 0), ReferencePoint::new(110, 6_000));
/// assert_eq!(estimate_height(3_000, &bracket, None).unwrap(), 105);
/// ```
pub fn estimate_height(
    target: i64,
    bracket: &Bracket,
    frontier: Option<u64>,
) -> Result<u64, EstimateError> {
    let block_span = i128::from(bracket.high.height) - i128::from(bracket.low.height);
    let time_span = bracket.time_span();
    if block_span <= 0 || time_span <= 0 {
        return Err(EstimateError::InvalidBracket {
            low: bracket.low.to_string(),
            high: bracket.high.to_string(),
        });
    }

    let offset_seconds = i128::from(target) - i128::from(bracket.low.timestamp);
    let offset_blocks = match offset_seconds.checked_mul(block_span) {
        Some(product) => product.div_euclid(time_span),
        None if offset_seconds < 0 => i128::MIN,
        None => i128::MAX,
    };
    let estimate = i128::from(bracket.low.height).saturating_add(offset_blocks);

    Ok(clamp_estimate(estimate, frontier))
}

fn clamp_estimate(estimate: i128, frontier: Option<u64>) -> u64 {
    if estimate <= 0 {
        return 1;
    }
    let estimate = u64::try_from(estimate).unwrap_or(u64::MAX);
    match frontier {
        Some(frontier) if estimate >= frontier => frontier,
        _ => estimate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReferencePoint;

    fn bracket(low: (u64, i64), high: (u64, i64)) -> Bracket {
        Bracket::new(ReferencePoint::new(low.0, low.1), ReferencePoint::new(high.0, high.1))
    }

    #[test]
    fn interpolates_midpoint() {
        let b = bracket((1_000, 100_000), (1_100, 160_000));
        assert_eq!(estimate_height(130_000, &b, None).unwrap(), 1_050);
    }

    #[test]
    fn floors_partial_blocks() {
        let b = bracket((1_000, 0), (1_010, 6_000));
        assert_eq!(estimate_height(599, &b, None).unwrap(), 1_000);
        assert_eq!(estimate_height(600, &b, None).unwrap(), 1_001);
        assert_eq!(estimate_height(1_199, &b, None).unwrap(), 1_001);
    }

    #[test]
    fn extrapolates_before_low_with_floor() {
        let b = bracket((1_000, 6_000), (1_010, 12_000));
        // One second before low rounds down to the previous block.
        assert_eq!(estimate_height(5_999, &b, None).unwrap(), 999);
    }

    #[test]
    fn non_positive_estimate_clamps_to_one() {
        let b = bracket((5, 3_000), (10, 6_000));
        assert_eq!(estimate_height(0, &b, None).unwrap(), 1);
        assert_eq!(estimate_height(-1_000_000, &b, None).unwrap(), 1);
    }

    #[test]
    fn clamps_to_frontier() {
        let b = bracket((100, 0), (200, 60_000));
        assert_eq!(estimate_height(10_000_000, &b, Some(250)).unwrap(), 250);
        assert_eq!(estimate_height(30_000, &b, Some(250)).unwrap(), 150);
    }

    #[test]
    fn zero_block_span_is_invalid() {
        let b = bracket((100, 0), (100, 600));
        assert!(matches!(
            estimate_height(300, &b, None),
            Err(EstimateError::InvalidBracket { .. })
        ));
    }

    #[test]
    fn negative_block_span_is_invalid() {
        let b = bracket((101, 0), (100, 600));
        assert!(estimate_height(300, &b, None).is_err());
    }

    #[test]
    fn zero_time_span_is_invalid() {
        let b = bracket((100, 600), (105, 600));
        assert!(estimate_height(600, &b, None).is_err());
    }

    #[test]
    fn monotonic_over_a_sweep() {
        let b = bracket((807_500, 1_694_628_304), (807_619, 1_694_692_419));
        let mut previous = 0;
        for t in (1_694_600_000..1_694_720_000).step_by(97) {
            let e = estimate_height(t, &b, Some(807_619)).unwrap();
            assert!(e >= previous, "estimate went backwards at {t}");
            previous = e;
        }
    }

    #[test]
    fn extreme_brackets_clamp_instead_of_overflowing() {
        let wide = bracket((0, i64::MIN), (u64::MAX, i64::MAX));
        assert_eq!(estimate_height(i64::MIN, &wide, None).unwrap(), 1);
        assert_eq!(estimate_height(i64::MAX, &wide, None).unwrap(), u64::MAX);
        assert_eq!(estimate_height(i64::MAX, &wide, Some(900)).unwrap(), 900);

        let inverted = bracket((0, i64::MAX), (10, i64::MIN));
        assert!(matches!(
            estimate_height(0, &inverted, None),
            Err(EstimateError::InvalidBracket { .. })
        ));
    }
}
