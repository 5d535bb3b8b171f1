//! Filtering and ordering of the per-unit view.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::model::EnrichedUnitRecord;
use crate::natural::natural_cmp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GdFilter {
    #[default]
    All,
    /// Units with their own generation (flag S).
    Gd,
    /// Everything else.
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSortKey {
    UnitCode,
    ConsumerName,
    RouteCode,
    ConsumptionVariance,
    InjectionVariance,
    CurrentConsumption,
    PriorConsumption,
    InjectedCurrent,
    InjectedPrior,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default)]
pub struct UnitQuery {
    pub gd: GdFilter,
    pub route: Option<String>,
    pub reason: Option<String>,
    pub sort: Option<(UnitSortKey, SortDirection)>,
}

impl UnitQuery {
    pub fn matches(&self, unit: &EnrichedUnitRecord) -> bool {
        let flag_ok = match self.gd {
            GdFilter::All => true,
            GdFilter::Gd => unit.unit.micro_generation_flag.has_generation(),
            GdFilter::Normal => !unit.unit.micro_generation_flag.has_generation(),
        };
        flag_ok
            && self.route.as_deref().map_or(true, |r| unit.unit.route_code == r)
            && self.reason.as_deref().map_or(true, |r| unit.unit.non_read_reason == r)
    }

    /// Filtered units, in input order unless a sort key is set. Sorting is stable.
    pub fn apply<'a>(&self, units: &'a [EnrichedUnitRecord]) -> Vec<&'a EnrichedUnitRecord> {
        let mut selected: Vec<&EnrichedUnitRecord> = units.iter().filter(|u| self.matches(u)).collect();
        if let Some((key, direction)) = self.sort {
            selected.sort_by(|a, b| {
                let ord = compare_by(key, a, b);
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        selected
    }
}

fn compare_by(key: UnitSortKey, a: &EnrichedUnitRecord, b: &EnrichedUnitRecord) -> Ordering {
    let text = |x: &str, y: &str| x.to_lowercase().cmp(&y.to_lowercase()).then_with(|| x.cmp(y));
    match key {
        UnitSortKey::UnitCode => text(&a.unit.unit_code, &b.unit.unit_code),
        UnitSortKey::ConsumerName => text(&a.unit.consumer_name, &b.unit.consumer_name),
        UnitSortKey::RouteCode => text(&a.unit.route_code, &b.unit.route_code),
        UnitSortKey::ConsumptionVariance => a.consumption_variance_pct.total_cmp(&b.consumption_variance_pct),
        UnitSortKey::InjectionVariance => a.injection_variance_pct.total_cmp(&b.injection_variance_pct),
        UnitSortKey::CurrentConsumption => a.unit.current_consumption.total_cmp(&b.unit.current_consumption),
        UnitSortKey::PriorConsumption => a.prior_consumption_resolved.total_cmp(&b.prior_consumption_resolved),
        UnitSortKey::InjectedCurrent => a.injected_current.total_cmp(&b.injected_current),
        UnitSortKey::InjectedPrior => a.injected_prior.total_cmp(&b.injected_prior),
    }
}

/// Distinct non-empty route codes, numeric-aware order.
pub fn distinct_routes(units: &[EnrichedUnitRecord]) -> Vec<String> {
    let mut routes: Vec<String> = units
        .iter()
        .map(|u| u.unit.route_code.as_str())
        .filter(|r| !r.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    routes.sort_by(|a, b| natural_cmp(a, b));
    routes
}

/// Distinct non-empty reasons, optionally limited to one route code.
pub fn distinct_reasons(units: &[EnrichedUnitRecord], route: Option<&str>) -> Vec<String> {
    units
        .iter()
        .filter(|u| route.map_or(true, |r| u.unit.route_code == r))
        .map(|u| u.unit.non_read_reason.clone())
        .filter(|r| !r.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
