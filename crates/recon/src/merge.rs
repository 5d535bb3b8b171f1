use crate::config::DuplicatePolicy;
use crate::lookup::UnitLookup;
use crate::model::{EnrichedUnitRecord, UnitRecord};

/// Period-over-period variance in percent.
///
/// A non-positive baseline yields 100 when the new value is positive and 0
/// otherwise, so a unit or route appearing from nothing reads as a full swing.
pub fn calculate_variance(now: f64, before: f64) -> f64 {
    if before <= 0.0 {
        if now > 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        (now - before) / before * 100.0
    }
}

/// Join current-period records against the previous period by unit code.
///
/// Output has the same length and order as `current`.
pub fn merge_periods(
    current: &[UnitRecord],
    previous: &[UnitRecord],
    policy: DuplicatePolicy,
) -> Vec<EnrichedUnitRecord> {
    let lookup = UnitLookup::build(previous, |r| r.unit_code.as_str(), policy);
    if lookup.duplicates() > 0 {
        log::warn!(
            "previous period has {} repeated unit code(s); lookup keeps one record per code ({policy:?})",
            lookup.duplicates()
        );
    }

    let mut unmatched = 0usize;
    let merged: Vec<EnrichedUnitRecord> = current
        .iter()
        .map(|unit| {
            let matched = lookup.get(&unit.unit_code);
            if matched.is_none() {
                unmatched += 1;
            }
            enrich(unit, matched)
        })
        .collect();

    log::debug!(
        "merged {} current record(s), {} without a previous-period match",
        merged.len(),
        unmatched
    );
    merged
}

fn enrich(unit: &UnitRecord, matched: Option<&UnitRecord>) -> EnrichedUnitRecord {
    let injected_current = unit.injected_generation;
    let injected_prior = matched.map(|p| p.injected_generation).unwrap_or(0.0);
    let prior_consumption_resolved = if unit.prior_consumption != 0.0 {
        unit.prior_consumption
    } else {
        matched.map(|p| p.current_consumption).unwrap_or(0.0)
    };

    EnrichedUnitRecord {
        unit: unit.clone(),
        injected_current,
        injected_prior,
        prior_consumption_resolved,
        consumption_variance_pct: calculate_variance(
            unit.current_consumption,
            prior_consumption_resolved,
        ),
        injection_variance_pct: calculate_variance(injected_current, injected_prior),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MicroGeneration;

    fn unit(code: &str, consumption: f64, prior: f64, injected: f64) -> UnitRecord {
        UnitRecord {
            route_label: "R1".into(),
            unit_code: code.into(),
            consumer_name: "-".into(),
            route_code: "R1".into(),
            current_consumption: consumption,
            prior_consumption: prior,
            injected_generation: injected,
            micro_generation_flag: MicroGeneration::Normal,
            billed_quantity: 1,
            non_read_reason: "Leitura Realizada".into(),
            connection_status: "N/I".into(),
            address: "N/I".into(),
        }
    }

    #[test]
    fn variance_edges() {
        assert_eq!(calculate_variance(5.0, 0.0), 100.0);
        assert_eq!(calculate_variance(5.0, -2.0), 100.0);
        assert_eq!(calculate_variance(0.0, 0.0), 0.0);
        assert_eq!(calculate_variance(-1.0, 0.0), 0.0);
        assert_eq!(calculate_variance(40.0, 100.0), -60.0);
        assert_eq!(calculate_variance(150.0, 100.0), 50.0);
    }

    #[test]
    fn prior_consumption_falls_back_to_matched_record() {
        let current = vec![unit("U1", 120.0, 0.0, 0.0), unit("U2", 80.0, 100.0, 0.0)];
        let previous = vec![unit("U1", 100.0, 0.0, 0.0), unit("U2", 60.0, 0.0, 0.0)];
        let merged = merge_periods(&current, &previous, DuplicatePolicy::LastWins);

        assert_eq!(merged[0].prior_consumption_resolved, 100.0);
        assert_eq!(merged[0].consumption_variance_pct, 20.0);
        // Row's own prior value takes precedence over the join.
        assert_eq!(merged[1].prior_consumption_resolved, 100.0);
        assert_eq!(merged[1].consumption_variance_pct, -20.0);
    }

    #[test]
    fn injection_looked_up_from_previous() {
        let current = vec![unit("U1", 0.0, 0.0, 30.0)];
        let previous = vec![unit("U1", 0.0, 0.0, 20.0)];
        let merged = merge_periods(&current, &previous, DuplicatePolicy::LastWins);
        assert_eq!(merged[0].injected_current, 30.0);
        assert_eq!(merged[0].injected_prior, 20.0);
        assert_eq!(merged[0].injection_variance_pct, 50.0);
    }

    #[test]
    fn unmatched_units_get_zero_baseline() {
        let current = vec![unit("U9", 10.0, 0.0, 4.0)];
        let merged = merge_periods(&current, &[], DuplicatePolicy::LastWins);
        assert_eq!(merged[0].injected_prior, 0.0);
        assert_eq!(merged[0].prior_consumption_resolved, 0.0);
        assert_eq!(merged[0].consumption_variance_pct, 100.0);
        assert_eq!(merged[0].injection_variance_pct, 100.0);
    }

    #[test]
    fn duplicate_previous_codes_follow_policy() {
        let current = vec![unit("U1", 10.0, 0.0, 0.0)];
        let previous = vec![unit("U1", 5.0, 0.0, 0.0), unit("U1", 8.0, 0.0, 0.0)];

        let last = merge_periods(&current, &previous, DuplicatePolicy::LastWins);
        assert_eq!(last[0].prior_consumption_resolved, 8.0);

        let first = merge_periods(&current, &previous, DuplicatePolicy::FirstWins);
        assert_eq!(first[0].prior_consumption_resolved, 5.0);
    }

    #[test]
    fn preserves_order_and_count() {
        let current = vec![unit("B", 1.0, 0.0, 0.0), unit("A", 1.0, 0.0, 0.0), unit("B", 2.0, 0.0, 0.0)];
        let merged = merge_periods(&current, &[], DuplicatePolicy::LastWins);
        let codes: Vec<_> = merged.iter().map(|m| m.unit.unit_code.as_str()).collect();
        assert_eq!(codes, vec!["B", "A", "B"]);
    }
}
