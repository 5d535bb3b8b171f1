//! Input for an external narrative generator, and the seam it plugs into.
//!
//! The narrative never feeds back into the numeric result: a failing
//! narrator degrades to [`NARRATIVE_PLACEHOLDER`].

use serde::Serialize;

use crate::config::ThresholdConfig;
use crate::model::{AnalysisResult, RouteComparisonRow};

pub const NARRATIVE_PLACEHOLDER: &str = "Automatic report could not be generated at this time.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeBrief {
    pub total_consumption_current: f64,
    pub total_consumption_prior: f64,
    pub total_injected_current: f64,
    pub total_injected_prior: f64,
    pub route_highlights: Vec<RouteHighlight>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteHighlight {
    pub route_label: String,
    pub count_current: i64,
    pub percent_variance: f64,
}

impl From<&RouteComparisonRow> for RouteHighlight {
    fn from(row: &RouteComparisonRow) -> Self {
        Self {
            route_label: row.route_label.clone(),
            count_current: row.count_current,
            percent_variance: row.percent_variance,
        }
    }
}

pub fn build_brief(result: &AnalysisResult, thresholds: &ThresholdConfig) -> NarrativeBrief {
    let mut brief = NarrativeBrief {
        total_consumption_current: 0.0,
        total_consumption_prior: 0.0,
        total_injected_current: 0.0,
        total_injected_prior: 0.0,
        route_highlights: Vec::new(),
    };
    for unit in &result.current_month {
        brief.total_consumption_current += unit.unit.current_consumption;
        brief.total_consumption_prior += unit.prior_consumption_resolved;
        brief.total_injected_current += unit.injected_current;
        brief.total_injected_prior += unit.injected_prior;
    }

    brief.route_highlights = result
        .comparison
        .iter()
        .filter(|row| row.count_current > 0 && row.percent_variance.abs() > thresholds.attention_variance_pct)
        .take(thresholds.attention_top_n)
        .map(RouteHighlight::from)
        .collect();
    brief
}

/// Turns a brief into prose. Implementations typically call out to a
/// language model or a report service.
pub trait Narrator {
    fn narrate(&self, brief: &NarrativeBrief) -> Result<String, String>;
}

pub fn narrate_or_placeholder(narrator: &dyn Narrator, brief: &NarrativeBrief) -> String {
    match narrator.narrate(brief) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("narrative generation failed: {e}");
            NARRATIVE_PLACEHOLDER.to_string()
        }
    }
}
