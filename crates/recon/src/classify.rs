use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::merge::calculate_variance;
use crate::model::{AnomalyTag, RouteComparisonRow, UnitRecord};

/// Classify one route. First matching rule wins.
pub fn classify_route(prior: i64, current: i64, percent: f64, critical_pct: f64) -> Option<AnomalyTag> {
    if prior == 0 && current > 0 {
        Some(AnomalyTag::NewRoute)
    } else if current == 0 && prior > 0 {
        Some(AnomalyTag::DiscontinuedRoute)
    } else if percent.abs() > critical_pct {
        Some(AnomalyTag::CriticalVariance)
    } else {
        None
    }
}

/// Build per-route comparison rows over the union of both periods' routes,
/// sorted descending by current count. Ties keep route-key order.
///
/// `current_records` / `previous_records` are only used to recover the
/// original-case label for each lower-cased key.
pub fn build_comparison<'a>(
    current_totals: &BTreeMap<String, i64>,
    previous_totals: &BTreeMap<String, i64>,
    current_records: impl IntoIterator<Item = &'a UnitRecord>,
    previous_records: impl IntoIterator<Item = &'a UnitRecord>,
    critical_pct: f64,
) -> Vec<RouteComparisonRow> {
    let keys: BTreeSet<&String> = current_totals.keys().chain(previous_totals.keys()).collect();

    let mut labels: HashMap<String, &str> = HashMap::new();
    for record in current_records.into_iter().chain(previous_records) {
        labels
            .entry(record.route_label.to_lowercase())
            .or_insert(record.route_label.as_str());
    }

    let mut rows: Vec<RouteComparisonRow> = keys
        .into_iter()
        .map(|key| {
            let prior = previous_totals.get(key).copied().unwrap_or(0);
            let current = current_totals.get(key).copied().unwrap_or(0);
            let raw_percent = calculate_variance(current as f64, prior as f64);

            RouteComparisonRow {
                route_label: labels.get(key).map(|l| l.to_string()).unwrap_or_else(|| key.clone()),
                count_prior: prior,
                count_current: current,
                difference: current - prior,
                percent_variance: round2(raw_percent),
                anomaly_tag: classify_route(prior, current, raw_percent, critical_pct),
            }
        })
        .collect();

    rows.sort_by(|a, b| b.count_current.cmp(&a.count_current));
    rows
}

/// Rows carrying an anomaly tag, in comparison order.
pub fn inconsistencies(rows: &[RouteComparisonRow]) -> Vec<RouteComparisonRow> {
    rows.iter().filter(|r| r.anomaly_tag.is_some()).cloned().collect()
}

/// Round to two decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
