//! Per-package totals across a run

use std::collections::{BTreeMap, HashMap};

use crate::aggregate::{ordered_sum, ConstructionAggregate};
use crate::model::PackageAssignment;

/// Total quantity and weight of one populated package
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub package_id: usize,
    pub total_quantity: f64,
    pub total_weight: f64,
}

/// Sum quantity and weight per package.
///
/// Only packages with at least one construction get a row, ordered by id.
/// Empty packages appear in the package reports but not here.
pub fn summarize_packages(
    aggregates: &[ConstructionAggregate],
    assignments: &[PackageAssignment],
) -> Vec<SummaryRow> {
    let package_of: HashMap<&str, usize> = assignments
        .iter()
        .map(|assignment| (assignment.construction.as_str(), assignment.package_id))
        .collect();

    let mut values: BTreeMap<usize, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for aggregate in aggregates {
        if let Some(&package_id) = package_of.get(aggregate.construction.as_str()) {
            let entry = values.entry(package_id).or_default();
            entry.0.push(aggregate.total_quantity);
            entry.1.push(aggregate.total_weight);
        }
    }

    values
        .into_iter()
        .map(|(package_id, (quantities, weights))| SummaryRow {
            package_id,
            total_quantity: ordered_sum(quantities),
            total_weight: ordered_sum(weights),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(construction: &str, quantity: f64, weight: f64) -> ConstructionAggregate {
        ConstructionAggregate {
            construction: construction.into(),
            total_quantity: quantity,
            total_weight: weight,
        }
    }

    fn assign(construction: &str, package_id: usize) -> PackageAssignment {
        PackageAssignment {
            construction: construction.into(),
            package_id,
        }
    }

    fn row(package_id: usize, total_quantity: f64, total_weight: f64) -> SummaryRow {
        SummaryRow {
            package_id,
            total_quantity,
            total_weight,
        }
    }

    #[test]
    fn test_sums_per_package() {
        let aggregates = vec![
            aggregate("K1", 20.0, 8.0),
            aggregate("K2", 50.0, 20.0),
            aggregate("K3", 45.0, 1.5),
        ];
        let assignments = vec![assign("K1", 0), assign("K2", 1), assign("K3", 1)];

        assert_eq!(
            summarize_packages(&aggregates, &assignments),
            vec![row(0, 20.0, 8.0), row(1, 95.0, 21.5)]
        );
    }

    #[test]
    fn test_empty_packages_omitted() {
        let aggregates = vec![aggregate("K1", 1.0, 1.0), aggregate("K2", 2.0, 2.0)];
        let assignments = vec![assign("K1", 0), assign("K2", 3)];

        let ids: Vec<_> = summarize_packages(&aggregates, &assignments)
            .iter()
            .map(|row| row.package_id)
            .collect();
        assert_eq!(ids, vec![0, 3]);
    }

    #[test]
    fn test_decimal_totals_independent_of_order() {
        let aggregates = vec![
            aggregate("K1", 0.1, 0.3),
            aggregate("K2", 0.2, 0.2),
            aggregate("K3", 0.3, 0.1),
        ];
        let assignments = vec![assign("K1", 0), assign("K2", 0), assign("K3", 0)];
        let mut reversed = aggregates.clone();
        reversed.reverse();

        assert_eq!(
            summarize_packages(&aggregates, &assignments),
            summarize_packages(&reversed, &assignments)
        );
    }
}
