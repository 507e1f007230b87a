//! Per-construction totals

use std::collections::BTreeMap;

use tracing::debug;

use crate::data::ComponentRecord;

/// Summed quantity and weight of one construction across its selected components
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructionAggregate {
    pub construction: String,
    pub total_quantity: f64,
    pub total_weight: f64,
}

/// Sum values in ascending order, so the total is the same for any input order
pub(crate) fn ordered_sum(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    values.into_iter().sum()
}

/// Group component rows by construction, summing quantity and weight.
///
/// Duplicate (component, construction) rows are summed, not deduplicated.
/// The result is ordered by construction id and its totals do not depend on
/// the order of the input rows. An empty input gives an empty result.
pub fn aggregate_constructions(records: &[ComponentRecord]) -> Vec<ConstructionAggregate> {
    let mut values: BTreeMap<&str, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for record in records {
        let entry = values.entry(record.construction.as_str()).or_default();
        entry.0.push(record.quantity);
        entry.1.push(record.weight);
    }

    debug!(
        rows = records.len(),
        constructions = values.len(),
        "aggregated constructions"
    );

    values
        .into_iter()
        .map(|(construction, (quantities, weights))| ConstructionAggregate {
            construction: construction.to_string(),
            total_quantity: ordered_sum(quantities),
            total_weight: ordered_sum(weights),
        })
        .collect()
}
