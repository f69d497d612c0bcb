use rust_decimal::{Decimal, RoundingStrategy};

/// Two decimal places, half away from zero.
pub(crate) fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `part` as a percentage of `whole`, rounded to two places. Zero when
/// `whole` is zero.
pub(crate) fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    round2(part * Decimal::ONE_HUNDRED / whole)
}

/// `total / count` rounded to two places, zero for an empty set.
pub(crate) fn average(total: Decimal, count: i64) -> Decimal {
    if count <= 0 {
        return Decimal::ZERO;
    }
    round2(total / Decimal::from(count))
}

/// Split 100% across `parts` (each ≥ 0) at two decimal places so the shares
/// add up to exactly `percentage_of(sum(parts), whole)` after rounding.
/// Largest remainders receive the leftover hundredths.
pub(crate) fn apportion_percentages(parts: &[Decimal], whole: Decimal) -> Vec<Decimal> {
    if whole.is_zero() || parts.is_empty() {
        return vec![Decimal::ZERO; parts.len()];
    }
    let hundredths = Decimal::from(10_000);
    let exact: Vec<Decimal> = parts.iter().map(|p| *p * hundredths / whole).collect();
    let mut floors: Vec<Decimal> = exact.iter().map(|e| e.floor()).collect();

    let target = (parts.iter().copied().sum::<Decimal>() * hundredths / whole)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let mut leftover = target - floors.iter().copied().sum::<Decimal>();

    let mut order: Vec<usize> = (0..parts.len()).collect();
    order.sort_by(|&a, &b| (exact[b] - floors[b]).cmp(&(exact[a] - floors[a])).then(a.cmp(&b)));
    for idx in order {
        if leftover <= Decimal::ZERO {
            break;
        }
        floors[idx] += Decimal::ONE;
        leftover -= Decimal::ONE;
    }

    floors
        .into_iter()
        .map(|h| (h / Decimal::ONE_HUNDRED).round_dp(2))
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round2_half_up() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round2(dec!(1.004)), dec!(1.00));
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(dec!(85.00), dec!(100.00)), dec!(85.00));
        assert_eq!(percentage_of(dec!(1), dec!(3)), dec!(33.33));
        assert_eq!(percentage_of(dec!(2), dec!(3)), dec!(66.67));
        assert_eq!(percentage_of(dec!(5), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_average() {
        assert_eq!(average(dec!(10), 3), dec!(3.33));
        assert_eq!(average(dec!(10), 0), Decimal::ZERO);
    }

    #[test]
    fn test_apportion_sums_to_hundred() {
        let parts = [dec!(1), dec!(1), dec!(1)];
        let shares = apportion_percentages(&parts, dec!(3));
        assert_eq!(shares.iter().copied().sum::<Decimal>(), dec!(100));
        assert_eq!(shares, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    }

    #[test]
    fn test_apportion_partial_whole_stays_below_hundred() {
        let parts = [dec!(30), dec!(30)];
        let shares = apportion_percentages(&parts, dec!(90));
        let total: Decimal = shares.iter().copied().sum();
        assert!(total <= dec!(100));
        assert_eq!(total, dec!(66.67));
    }

    #[test]
    fn test_apportion_zero_whole() {
        assert_eq!(
            apportion_percentages(&[dec!(0), dec!(0)], Decimal::ZERO),
            vec![Decimal::ZERO, Decimal::ZERO]
        );
    }
}
