use std::collections::HashMap;

use crate::model::{RouteUnitSummary, UnitRecord};

/// Unit-row counts per route active in the current period. Each row counts
/// once regardless of billed quantity; previous-only routes are left out.
/// Sorted descending by current count, ties in first-seen order.
pub fn route_unit_summary<'a>(
    current: impl IntoIterator<Item = &'a UnitRecord>,
    previous: impl IntoIterator<Item = &'a UnitRecord>,
) -> Vec<RouteUnitSummary> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, (i64, i64)> = HashMap::new();

    for record in current {
        let route = record.route_key();
        counts
            .entry(route)
            .or_insert_with(|| {
                order.push(route);
                (0, 0)
            })
            .1 += 1;
    }
    for record in previous {
        if let Some(entry) = counts.get_mut(record.route_key()) {
            entry.0 += 1;
        }
    }

    let mut rows: Vec<RouteUnitSummary> = order
        .into_iter()
        .map(|route| {
            let (previous, current) = counts[route];
            RouteUnitSummary {
                route: route.to_string(),
                total_previous: previous,
                total_current: current,
                diff: current - previous,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.total_current.cmp(&a.total_current));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MicroGeneration;

    fn unit(code: &str, route_code: &str, qty: i64) -> UnitRecord {
        UnitRecord {
            route_label: format!("Rota {route_code}"),
            unit_code: code.into(),
            consumer_name: "-".into(),
            route_code: route_code.into(),
            current_consumption: 0.0,
            prior_consumption: 0.0,
            injected_generation: 0.0,
            micro_generation_flag: MicroGeneration::Normal,
            billed_quantity: qty,
            non_read_reason: "Leitura Realizada".into(),
            connection_status: "N/I".into(),
            address: "N/I".into(),
        }
    }

    #[test]
    fn counts_rows_per_active_route() {
        let current = vec![unit("U1", "10", 5), unit("U2", "10", 0), unit("U3", "20", 1)];
        let previous = vec![unit("U1", "10", 1), unit("U4", "20", 1), unit("U5", "20", 1), unit("U6", "30", 1)];
        let rows = route_unit_summary(&current, &previous);

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            RouteUnitSummary { route: "10".into(), total_previous: 1, total_current: 2, diff: 1 }
        );
        assert_eq!(
            rows[1],
            RouteUnitSummary { route: "20".into(), total_previous: 2, total_current: 1, diff: -1 }
        );
    }

    #[test]
    fn keyed_by_route_code_not_label() {
        let mut a = unit("U1", "10", 1);
        a.route_label = "Centro".into();
        let mut b = unit("U2", "10", 1);
        b.route_label = "Norte".into();
        let current = vec![a, b];
        let previous: Vec<UnitRecord> = Vec::new();
        let rows = route_unit_summary(&current, &previous);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_current, 2);
    }
}
