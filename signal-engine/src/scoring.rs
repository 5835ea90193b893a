// Parameter Scoring
// Bucketed per-contract scores. Breakpoints are fixed so that learned
// weight associations stay stable across sessions.

use common::{OptionQuote, OptionType, Parameter, ParameterScores, ValidationError, WeightVector};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Scores one option-chain row across all seven parameters.
/// Malformed rows are rejected rather than scored.
pub fn score_quote(
    quote: &OptionQuote,
    underlying_price: Decimal,
) -> Result<ParameterScores, ValidationError> {
    validate_quote(quote)?;
    if underlying_price <= Decimal::ZERO {
        return Err(ValidationError::NonPositive {
            field: "underlying_price",
        });
    }
    Ok(ParameterScores {
        delta: delta_score(quote.delta),
        oi_change: oi_change_score(quote.oi_change, quote.open_interest),
        volume: volume_score(quote.volume, quote.open_interest),
        momentum: momentum_score(quote.strike, quote.option_type, underlying_price),
        iv: iv_score(quote.implied_volatility),
        spread: spread_score(quote.bid, quote.ask, quote.last_price),
        liquidity: liquidity_score(quote.bid, quote.ask),
    })
}

fn validate_quote(quote: &OptionQuote) -> Result<(), ValidationError> {
    if quote.strike <= Decimal::ZERO {
        return Err(ValidationError::NonPositive { field: "strike" });
    }
    if !quote.delta.is_finite() {
        return Err(ValidationError::NotFinite { field: "delta" });
    }
    if quote.delta.abs() > 1.0 {
        return Err(ValidationError::OutOfRange {
            field: "delta",
            value: quote.delta,
            min: -1.0,
            max: 1.0,
        });
    }
    if !quote.implied_volatility.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "implied_volatility",
        });
    }
    if quote.implied_volatility <= 0.0 {
        return Err(ValidationError::NonPositive {
            field: "implied_volatility",
        });
    }
    if quote.bid < Decimal::ZERO {
        return Err(ValidationError::Negative { field: "bid" });
    }
    if quote.ask < Decimal::ZERO {
        return Err(ValidationError::Negative { field: "ask" });
    }
    if quote.last_price < Decimal::ZERO {
        return Err(ValidationError::Negative { field: "last_price" });
    }
    Ok(())
}

/// Directional conviction from the magnitude of delta. Sign is
/// irrelevant here; a deep put scores as high as a deep call.
pub fn delta_score(delta: f64) -> f64 {
    let magnitude = delta.abs();
    if magnitude > 0.7 {
        0.9
    } else if magnitude > 0.5 {
        0.7
    } else if magnitude > 0.3 {
        0.5
    } else {
        0.2
    }
}

/// Open-interest buildup (or unwinding) as a percentage of total OI.
/// Zero OI scores neutral rather than dividing by zero.
pub fn oi_change_score(oi_change: i64, open_interest: u64) -> f64 {
    if open_interest == 0 {
        return 0.3;
    }
    let percent = (oi_change as f64 / open_interest as f64) * 100.0;
    let magnitude = percent.abs();
    if magnitude > 20.0 {
        0.9
    } else if magnitude > 10.0 {
        0.7
    } else if magnitude > 5.0 {
        0.5
    } else {
        0.3
    }
}

/// Session volume relative to open interest.
pub fn volume_score(volume: u64, open_interest: u64) -> f64 {
    if open_interest == 0 {
        return 0.3;
    }
    let ratio = volume as f64 / open_interest as f64;
    if ratio > 0.5 {
        0.9
    } else if ratio > 0.3 {
        0.7
    } else if ratio > 0.1 {
        0.5
    } else {
        0.3
    }
}

/// Signed distance of spot from the strike, in the direction that
/// favors the contract: above the strike for calls, below for puts.
pub fn momentum_score(strike: Decimal, option_type: OptionType, underlying_price: Decimal) -> f64 {
    if underlying_price <= Decimal::ZERO {
        return 0.2;
    }
    let distance = match option_type {
        OptionType::Call => (underlying_price - strike) / underlying_price,
        OptionType::Put => (strike - underlying_price) / underlying_price,
    };
    let distance = distance.to_f64().unwrap_or(0.0);
    if distance > 0.02 {
        0.8
    } else if distance > 0.0 {
        0.6
    } else if distance > -0.02 {
        0.4
    } else {
        0.2
    }
}

/// Implied volatility band check, in percent. The 15-25 band is the
/// sweet spot for buying premium; very low IV means no movement and
/// very high IV means overpriced entries.
pub fn iv_score(implied_volatility: f64) -> f64 {
    if implied_volatility < 15.0 {
        0.3
    } else if implied_volatility < 25.0 {
        0.7
    } else if implied_volatility < 35.0 {
        0.5
    } else {
        0.2
    }
}

/// Bid-ask spread as a percentage of last traded price. A crossed or
/// unpriced book scores minimal.
pub fn spread_score(bid: Decimal, ask: Decimal, last_price: Decimal) -> f64 {
    if ask <= bid || last_price <= Decimal::ZERO {
        return 0.1;
    }
    let percent = ((ask - bid) / last_price).to_f64().unwrap_or(f64::MAX) * 100.0;
    if percent < 2.0 {
        0.9
    } else if percent < 5.0 {
        0.7
    } else if percent < 10.0 {
        0.5
    } else {
        0.2
    }
}

/// Quote presence on both sides of the book.
pub fn liquidity_score(bid: Decimal, ask: Decimal) -> f64 {
    let bid_live = bid > Decimal::ZERO;
    let ask_live = ask > Decimal::ZERO;
    if bid_live && ask_live {
        0.8
    } else if bid_live || ask_live {
        0.5
    } else {
        0.1
    }
}

/// Weighted sum of scores; in [0.0, 1.0] for normalized weights.
pub fn aggregate_confidence(scores: &ParameterScores, weights: &WeightVector) -> f64 {
    Parameter::ALL
        .iter()
        .map(|p| scores.get(*p) * weights.get(*p))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote() -> OptionQuote {
        OptionQuote {
            strike: dec!(22000),
            option_type: OptionType::Call,
            last_price: dec!(150),
            bid: dec!(149),
            ask: dec!(151),
            volume: 5000,
            open_interest: 20000,
            oi_change: 1500,
            implied_volatility: 20.0,
            delta: 0.55,
        }
    }

    #[test]
    fn delta_buckets() {
        assert_eq!(delta_score(0.75), 0.9);
        assert_eq!(delta_score(-0.75), 0.9);
        assert_eq!(delta_score(0.7), 0.7);
        assert_eq!(delta_score(0.55), 0.7);
        assert_eq!(delta_score(0.5), 0.5);
        assert_eq!(delta_score(0.31), 0.5);
        assert_eq!(delta_score(0.3), 0.2);
        assert_eq!(delta_score(0.0), 0.2);
    }

    #[test]
    fn oi_change_buckets() {
        // 25%, 15%, 8%, 3% of total OI.
        assert_eq!(oi_change_score(2500, 10000), 0.9);
        assert_eq!(oi_change_score(1500, 10000), 0.7);
        assert_eq!(oi_change_score(800, 10000), 0.5);
        assert_eq!(oi_change_score(300, 10000), 0.3);
        // Unwinding counts by magnitude.
        assert_eq!(oi_change_score(-2500, 10000), 0.9);
        // Exactly 20% stays in the lower bucket.
        assert_eq!(oi_change_score(2000, 10000), 0.7);
    }

    #[test]
    fn zero_open_interest_scores_neutral() {
        assert_eq!(oi_change_score(500, 0), 0.3);
        assert_eq!(oi_change_score(0, 0), 0.3);
        assert_eq!(volume_score(500, 0), 0.3);
        assert_eq!(volume_score(0, 0), 0.3);
    }

    #[test]
    fn volume_buckets() {
        assert_eq!(volume_score(6000, 10000), 0.9);
        assert_eq!(volume_score(4000, 10000), 0.7);
        assert_eq!(volume_score(2000, 10000), 0.5);
        assert_eq!(volume_score(500, 10000), 0.3);
        assert_eq!(volume_score(0, 10000), 0.3);
    }

    #[test]
    fn momentum_tracks_direction_per_side() {
        // Spot 22000: a 21000 call is 4.5% in the favorable direction.
        assert_eq!(momentum_score(dec!(21000), OptionType::Call, dec!(22000)), 0.8);
        assert_eq!(momentum_score(dec!(21900), OptionType::Call, dec!(22000)), 0.6);
        assert_eq!(momentum_score(dec!(22100), OptionType::Call, dec!(22000)), 0.4);
        assert_eq!(momentum_score(dec!(23000), OptionType::Call, dec!(22000)), 0.2);
        // The same strikes invert for puts.
        assert_eq!(momentum_score(dec!(23000), OptionType::Put, dec!(22000)), 0.8);
        assert_eq!(momentum_score(dec!(21000), OptionType::Put, dec!(22000)), 0.2);
        // At the money is weakly unfavorable, not neutral.
        assert_eq!(momentum_score(dec!(22000), OptionType::Call, dec!(22000)), 0.4);
    }

    #[test]
    fn iv_buckets() {
        assert_eq!(iv_score(10.0), 0.3);
        assert_eq!(iv_score(15.0), 0.7);
        assert_eq!(iv_score(24.9), 0.7);
        assert_eq!(iv_score(25.0), 0.5);
        assert_eq!(iv_score(34.9), 0.5);
        assert_eq!(iv_score(35.0), 0.2);
        assert_eq!(iv_score(60.0), 0.2);
    }

    #[test]
    fn spread_buckets() {
        assert_eq!(spread_score(dec!(99.5), dec!(100.5), dec!(100)), 0.9);
        assert_eq!(spread_score(dec!(98), dec!(102), dec!(100)), 0.7);
        assert_eq!(spread_score(dec!(96), dec!(103), dec!(100)), 0.5);
        assert_eq!(spread_score(dec!(90), dec!(110), dec!(100)), 0.2);
    }

    #[test]
    fn crossed_or_unpriced_book_scores_minimal() {
        assert_eq!(spread_score(dec!(101), dec!(100), dec!(100)), 0.1);
        assert_eq!(spread_score(dec!(100), dec!(100), dec!(100)), 0.1);
        assert_eq!(spread_score(dec!(99), dec!(100), dec!(0)), 0.1);
    }

    #[test]
    fn liquidity_counts_live_sides() {
        assert_eq!(liquidity_score(dec!(10), dec!(11)), 0.8);
        assert_eq!(liquidity_score(dec!(10), dec!(0)), 0.5);
        assert_eq!(liquidity_score(dec!(0), dec!(11)), 0.5);
        assert_eq!(liquidity_score(dec!(0), dec!(0)), 0.1);
    }

    #[test]
    fn all_scores_stay_in_range() {
        let deltas = [-1.0, -0.6, -0.2, 0.0, 0.4, 0.6, 0.8, 1.0];
        let ivs = [1.0, 14.9, 20.0, 30.0, 80.0];
        for delta in deltas {
            for iv in ivs {
                let mut q = quote();
                q.delta = delta;
                q.implied_volatility = iv;
                let scores = score_quote(&q, dec!(22150)).unwrap();
                for parameter in Parameter::ALL {
                    let score = scores.get(parameter);
                    assert!((0.0..=1.0).contains(&score), "{parameter} = {score}");
                }
            }
        }
    }

    #[test]
    fn aggregation_is_the_weighted_sum() {
        let scores = score_quote(&quote(), dec!(22150)).unwrap();
        let weights = WeightVector::default();
        let confidence = aggregate_confidence(&scores, &weights);
        let manual: f64 = Parameter::ALL
            .iter()
            .map(|p| scores.get(*p) * weights.get(*p))
            .sum();
        assert!((confidence - manual).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&confidence));
    }

    #[test]
    fn malformed_rows_are_rejected() {
        let mut q = quote();
        q.delta = 1.5;
        assert!(matches!(
            score_quote(&q, dec!(22000)),
            Err(ValidationError::OutOfRange { field: "delta", .. })
        ));

        let mut q = quote();
        q.delta = f64::NAN;
        assert!(matches!(
            score_quote(&q, dec!(22000)),
            Err(ValidationError::NotFinite { field: "delta" })
        ));

        let mut q = quote();
        q.strike = dec!(0);
        assert!(matches!(
            score_quote(&q, dec!(22000)),
            Err(ValidationError::NonPositive { field: "strike" })
        ));

        let mut q = quote();
        q.implied_volatility = 0.0;
        assert!(score_quote(&q, dec!(22000)).is_err());

        let mut q = quote();
        q.bid = dec!(-1);
        assert!(matches!(
            score_quote(&q, dec!(22000)),
            Err(ValidationError::Negative { field: "bid" })
        ));

        assert!(matches!(
            score_quote(&quote(), dec!(0)),
            Err(ValidationError::NonPositive {
                field: "underlying_price"
            })
        ));
    }
}
