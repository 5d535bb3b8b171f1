use std::collections::BTreeMap;

use crate::model::UnitRecord;

/// Sum billed quantities per lower-cased route label. No filtering.
pub fn aggregate_by_route<'a, I>(records: I) -> BTreeMap<String, i64>
where
    I: IntoIterator<Item = &'a UnitRecord>,
{
    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    for record in records {
        *totals.entry(record.route_label.to_lowercase()).or_insert(0) += record.billed_quantity;
    }
    totals
}
