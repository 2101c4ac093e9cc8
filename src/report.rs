use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use configuration::AnalysisOptions;
use core_types::{AnalysisResult, RecommendationAction};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// The JSON document printed by `diffmark analyze --format json`.
///
/// The run metadata lives here rather than on `AnalysisResult` so that two runs over
/// the same inputs still produce identical results.
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub options: &'a AnalysisOptions,
    pub partial: bool,
    pub summary: BTreeMap<RecommendationAction, usize>,
    pub result: &'a AnalysisResult,
}

impl<'a> AnalysisReport<'a> {
    pub fn new(result: &'a AnalysisResult, options: &'a AnalysisOptions) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            options,
            partial: result.is_partial(),
            summary: result.band_counts(),
            result,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Renders the recommendations, then any per-asset failures, then the band summary.
    pub fn to_table(&self) -> String {
        let mut ranking = Table::new();
        ranking
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                "#", "Asset", "Action", "Margin", "Score", "Confidence", "Signal",
            ]);
        for (rank, rec) in self.result.recommendations.iter().enumerate() {
            ranking.add_row(vec![
                (rank + 1).to_string(),
                rec.asset.clone(),
                rec.action.to_string(),
                format!("{:.4}", rec.margin),
                format!("{:.4}", rec.movement_score),
                format!("{:.2}", rec.confidence),
                if rec.signal_degraded { "degraded" } else { "ok" }.to_string(),
            ]);
        }

        let mut out = format!("Run {} at {}\n{ranking}\n", self.run_id, self.generated_at.to_rfc3339());

        if !self.result.errors.is_empty() {
            let mut failures = Table::new();
            failures
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["Asset", "Error"]);
            for error in &self.result.errors {
                failures.add_row(vec![error.asset().to_string(), error.to_string()]);
            }
            out.push_str(&format!("Assets without a margin:\n{failures}\n"));
        }

        let summary = self
            .summary
            .iter()
            .map(|(action, count)| format!("{action}: {count}"))
            .collect::<Vec<_>>()
            .join(" | ");
        out.push_str(&summary);
        if self.partial {
            out.push_str("\n(partial result)");
        }
        out
    }
}
