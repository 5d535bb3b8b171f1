//! Unit-level divergence between periods, restricted to routes billed in the
//! current period. Routes that only exist in the previous period are out of
//! scope: the audit covers what is being read today.

use std::collections::HashMap;

use crate::config::DuplicatePolicy;
use crate::lookup::UnitLookup;
use crate::model::{
    DivergenceEntry, DivergenceStatus, DivergenceTotals, MicroGeneration, UnitRecord, NOT_INFORMED,
    STATUS_UNAVAILABLE,
};
use crate::natural::natural_cmp;

pub fn find_divergences<'a>(
    current: impl IntoIterator<Item = &'a UnitRecord>,
    previous: impl IntoIterator<Item = &'a UnitRecord>,
    policy: DuplicatePolicy,
) -> Vec<DivergenceEntry> {
    let mut active: Vec<&str> = Vec::new();
    let mut current_by_route: HashMap<&str, Vec<&UnitRecord>> = HashMap::new();
    for record in current {
        let route = record.route_key();
        current_by_route
            .entry(route)
            .or_insert_with(|| {
                active.push(route);
                Vec::new()
            })
            .push(record);
    }

    let mut previous_by_route: HashMap<&str, Vec<&UnitRecord>> = HashMap::new();
    for record in previous {
        let route = record.route_key();
        if current_by_route.contains_key(route) {
            previous_by_route.entry(route).or_default().push(record);
        }
    }

    let mut entries = Vec::new();
    for route in active {
        let curr = UnitLookup::build(
            current_by_route[route].iter().copied(),
            |r| r.unit_code.as_str(),
            policy,
        );
        let prev = UnitLookup::build(
            previous_by_route.get(route).into_iter().flatten().copied(),
            |r| r.unit_code.as_str(),
            policy,
        );

        for (code, unit) in prev.iter() {
            if !curr.contains(code) {
                entries.push(entry(route, unit, DivergenceStatus::Missing));
            }
        }
        for (code, unit) in curr.iter() {
            if !prev.contains(code) {
                entries.push(entry(route, unit, DivergenceStatus::New));
            }
        }
    }

    entries.sort_by(|a, b| natural_cmp(&a.route_code, &b.route_code));

    log::debug!(
        "divergence: {} entries across {} active route(s)",
        entries.len(),
        current_by_route.len()
    );
    entries
}

fn entry(route: &str, unit: &UnitRecord, status: DivergenceStatus) -> DivergenceEntry {
    let or_placeholder = |value: &str, placeholder: &str| -> String {
        let shown = if value.is_empty() { placeholder } else { value };
        shown.to_string()
    };
    DivergenceEntry {
        unit_code: unit.unit_code.clone(),
        consumer_name: unit.consumer_name.clone(),
        address: or_placeholder(&unit.address, NOT_INFORMED),
        route_code: route.to_string(),
        connection_status: or_placeholder(&unit.connection_status, STATUS_UNAVAILABLE),
        micro_generation_flag: unit.micro_generation_flag,
        status,
    }
}

/// Keep entries on `route` (when given) with flag `flag` (when given).
pub fn filter_divergences(
    entries: &[DivergenceEntry],
    route: Option<&str>,
    flag: Option<MicroGeneration>,
) -> Vec<DivergenceEntry> {
    entries
        .iter()
        .filter(|e| route.map_or(true, |r| e.route_code == r))
        .filter(|e| flag.map_or(true, |f| e.micro_generation_flag == f))
        .cloned()
        .collect()
}

pub fn divergence_totals(entries: &[DivergenceEntry]) -> DivergenceTotals {
    let mut totals = DivergenceTotals::default();
    for e in entries {
        match e.status {
            DivergenceStatus::Missing => totals.missing += 1,
            DivergenceStatus::New => totals.new += 1,
        }
    }
    totals
}
