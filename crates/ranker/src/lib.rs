use configuration::RankingThresholds;
use core_types::{AssetSignal, ProfitMargin, Recommendation, RecommendationAction};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

pub mod error;

pub use error::RankerError;

/// Classifies margins into recommendation bands and puts them in a total order.
#[derive(Debug, Clone)]
pub struct Ranker {
    thresholds: RankingThresholds,
}

impl Ranker {
    /// Creates a `Ranker`, rejecting thresholds whose bands overlap.
    pub fn new(thresholds: RankingThresholds) -> Result<Self, RankerError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &RankingThresholds {
        &self.thresholds
    }

    /// Maps a margin onto its band.
    ///
    /// Upper bounds are exclusive for the buy bands and lower bounds inclusive for the
    /// avoid bands, so a margin sitting exactly on a threshold falls towards Hold.
    pub fn classify(&self, margin: Decimal) -> RecommendationAction {
        let t = &self.thresholds;
        if margin > t.strong_buy {
            RecommendationAction::StrongBuy
        } else if margin > t.buy {
            RecommendationAction::Buy
        } else if margin >= t.avoid {
            RecommendationAction::Hold
        } else if margin >= t.strong_avoid {
            RecommendationAction::Avoid
        } else {
            RecommendationAction::StrongAvoid
        }
    }

    /// Classifies every computed margin and orders the result.
    ///
    /// The order is margin descending, ties broken by ascending asset identifier,
    /// which makes it total and independent of input order. Assets without an
    /// entry in `signals` are reported with a zero score and confidence.
    pub fn rank(
        &self,
        margins: &BTreeMap<String, ProfitMargin>,
        signals: &BTreeMap<String, AssetSignal>,
    ) -> Vec<Recommendation> {
        let mut recommendations: Vec<Recommendation> = margins
            .values()
            .map(|m| {
                let signal = signals.get(&m.asset).copied().unwrap_or(AssetSignal::ABSENT);
                Recommendation {
                    asset: m.asset.clone(),
                    action: self.classify(m.margin),
                    margin: m.margin,
                    movement_score: signal.movement_score,
                    confidence: signal.confidence,
                    signal_degraded: m.signal_degraded,
                }
            })
            .collect();

        recommendations.sort_by(|a, b| {
            b.margin
                .cmp(&a.margin)
                .then_with(|| a.asset.cmp(&b.asset))
        });

        tracing::debug!(count = recommendations.len(), "Recommendations ranked.");
        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn margin(asset: &str, value: Decimal) -> (String, ProfitMargin) {
        (
            asset.to_string(),
            ProfitMargin {
                asset: asset.to_string(),
                margin: value,
                volume_ref: dec!(100),
                signal_degraded: false,
            },
        )
    }

    fn default_ranker() -> Ranker {
        Ranker::new(RankingThresholds::default()).unwrap()
    }

    #[test]
    fn default_bands_classify_as_documented() {
        let ranker = default_ranker();
        assert_eq!(ranker.classify(dec!(0.06)), RecommendationAction::StrongBuy);
        assert_eq!(ranker.classify(dec!(0.05)), RecommendationAction::Buy);
        assert_eq!(ranker.classify(dec!(0.03)), RecommendationAction::Buy);
        assert_eq!(ranker.classify(dec!(0.01)), RecommendationAction::Hold);
        assert_eq!(ranker.classify(Decimal::ZERO), RecommendationAction::Hold);
        assert_eq!(ranker.classify(dec!(-0.01)), RecommendationAction::Hold);
        assert_eq!(ranker.classify(dec!(-0.02)), RecommendationAction::Avoid);
        assert_eq!(ranker.classify(dec!(-0.05)), RecommendationAction::Avoid);
        assert_eq!(ranker.classify(dec!(-0.051)), RecommendationAction::StrongAvoid);
    }

    #[test]
    fn injected_thresholds_change_classification() {
        let ranker = Ranker::new(RankingThresholds {
            strong_buy: dec!(0.2),
            buy: dec!(0.1),
            avoid: dec!(-0.1),
            strong_avoid: dec!(-0.2),
        })
        .unwrap();
        assert_eq!(ranker.classify(dec!(0.06)), RecommendationAction::Hold);
        assert_eq!(ranker.classify(dec!(0.15)), RecommendationAction::Buy);
    }

    #[test]
    fn overlapping_thresholds_are_rejected() {
        let result = Ranker::new(RankingThresholds {
            buy: dec!(0.5),
            ..RankingThresholds::default()
        });
        assert!(matches!(result, Err(RankerError::InvalidThresholds(_))));
    }

    #[test]
    fn ties_break_on_ascending_asset() {
        let margins = BTreeMap::from([
            margin("B", dec!(0.03)),
            margin("A", dec!(0.03)),
            margin("C", dec!(0.10)),
            margin("D", dec!(-0.2)),
        ]);
        let ranked = default_ranker().rank(&margins, &BTreeMap::new());

        let order: Vec<&str> = ranked.iter().map(|r| r.asset.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B", "D"]);
        assert_eq!(ranked[0].action, RecommendationAction::StrongBuy);
        assert_eq!(ranked[1].action, RecommendationAction::Buy);
        assert_eq!(ranked[3].action, RecommendationAction::StrongAvoid);
    }

    #[test]
    fn equal_values_with_different_scale_still_tie() {
        let margins = BTreeMap::from([margin("B", dec!(0.030)), margin("A", dec!(0.03))]);
        let ranked = default_ranker().rank(&margins, &BTreeMap::new());
        assert_eq!(ranked[0].asset, "A");
        assert_eq!(ranked[1].asset, "B");
    }

    #[test]
    fn recommendations_carry_the_applied_signal() {
        let margins = BTreeMap::from([margin("A", dec!(0.01))]);
        let signals = BTreeMap::from([("A".to_string(), AssetSignal::new(dec!(0.4), dec!(0.9)))]);
        let ranked = default_ranker().rank(&margins, &signals);

        assert_eq!(ranked[0].movement_score, dec!(0.4));
        assert_eq!(ranked[0].confidence, dec!(0.9));
        assert!(!ranked[0].signal_degraded);
    }
}
