use std::collections::BTreeSet;

use crate::config::{AuditConfig, DuplicatePolicy};
use crate::lookup::UnitLookup;
use crate::model::{RecurringOccurrence, UnitRecord, READ_SUCCESSFULLY};

/// Units whose non-read reason is the same (trimmed, case-insensitive) in
/// both periods. Output follows current-period order.
pub fn find_recurring<'a>(
    current: impl IntoIterator<Item = &'a UnitRecord>,
    previous: impl IntoIterator<Item = &'a UnitRecord>,
    config: &AuditConfig,
) -> Vec<RecurringOccurrence> {
    let policy: DuplicatePolicy = config.lookup.duplicates;
    let lookup = UnitLookup::build(previous, |r| r.unit_code.as_str(), policy);
    let success = normalize_reason(READ_SUCCESSFULLY);

    current
        .into_iter()
        .filter(|unit| {
            let reason = normalize_reason(&unit.non_read_reason);
            if reason.is_empty() {
                return false;
            }
            if config.recurrence.ignore_successful_reads && reason == success {
                return false;
            }
            lookup
                .get(&unit.unit_code)
                .is_some_and(|prev| normalize_reason(&prev.non_read_reason) == reason)
        })
        .map(|unit| RecurringOccurrence {
            unit_code: unit.unit_code.clone(),
            consumer_name: unit.consumer_name.clone(),
            route_code: unit.route_code.clone(),
            reason_text: unit.non_read_reason.clone(),
        })
        .collect()
}

fn normalize_reason(text: &str) -> String {
    text.trim().to_uppercase()
}

/// Distinct reason texts among the occurrences, sorted.
pub fn recurring_reasons(occurrences: &[RecurringOccurrence]) -> Vec<String> {
    occurrences
        .iter()
        .map(|o| o.reason_text.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Occurrences with exactly this reason text.
pub fn filter_by_reason(occurrences: &[RecurringOccurrence], reason: &str) -> Vec<RecurringOccurrence> {
    occurrences
        .iter()
        .filter(|o| o.reason_text == reason)
        .cloned()
        .collect()
}
