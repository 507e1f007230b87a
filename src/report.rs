//! Per-package composition reports

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::aggregate::{ordered_sum, ConstructionAggregate};
use crate::data::ComponentRecord;
use crate::model::PackageAssignment;

/// Summed quantity of one component within a package
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentQuantity {
    pub component: String,
    pub quantity: f64,
}

/// Contents of one package
#[derive(Debug, Clone, PartialEq)]
pub struct PackageReport {
    pub package_id: usize,
    pub constructions: BTreeSet<String>,
    pub total_quantity: f64,
    pub total_weight: f64,
    /// Component totals in order of first appearance in the input
    pub component_breakdown: Vec<ComponentQuantity>,
}

impl PackageReport {
    pub fn is_empty(&self) -> bool {
        self.constructions.is_empty()
    }

    /// `"name: qty"` pairs joined with `"; "`
    pub fn composition(&self) -> String {
        self.component_breakdown
            .iter()
            .map(|entry| format!("{}: {}", entry.component, entry.quantity))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Values collected for one package before they are summed
#[derive(Default)]
struct PackageValues {
    constructions: BTreeSet<String>,
    quantities: Vec<f64>,
    weights: Vec<f64>,
    components: Vec<(String, Vec<f64>)>,
    component_index: HashMap<String, usize>,
}

impl PackageValues {
    fn add_component(&mut self, component: &str, quantity: f64) {
        match self.component_index.get(component) {
            Some(&pos) => self.components[pos].1.push(quantity),
            None => {
                self.component_index.insert(component.to_string(), self.components.len());
                self.components.push((component.to_string(), vec![quantity]));
            }
        }
    }

    fn into_report(self, package_id: usize) -> PackageReport {
        PackageReport {
            package_id,
            constructions: self.constructions,
            total_quantity: ordered_sum(self.quantities),
            total_weight: ordered_sum(self.weights),
            component_breakdown: self
                .components
                .into_iter()
                .map(|(component, quantities)| ComponentQuantity {
                    component,
                    quantity: ordered_sum(quantities),
                })
                .collect(),
        }
    }
}

/// Build one report per package id in `0..n_packages`, empty packages included
///
/// # Arguments
/// * `records` - The selected component rows the aggregates were built from
/// * `aggregates` - Per-construction totals
/// * `assignments` - Package of each construction
/// * `n_packages` - Requested package count
pub fn build_package_reports(
    records: &[ComponentRecord],
    aggregates: &[ConstructionAggregate],
    assignments: &[PackageAssignment],
    n_packages: usize,
) -> Vec<PackageReport> {
    let mut packages: Vec<PackageValues> =
        (0..n_packages).map(|_| PackageValues::default()).collect();

    let package_of: HashMap<&str, usize> = assignments
        .iter()
        .filter(|assignment| assignment.package_id < n_packages)
        .map(|assignment| (assignment.construction.as_str(), assignment.package_id))
        .collect();

    for aggregate in aggregates {
        if let Some(&package_id) = package_of.get(aggregate.construction.as_str()) {
            let package = &mut packages[package_id];
            package.constructions.insert(aggregate.construction.clone());
            package.quantities.push(aggregate.total_quantity);
            package.weights.push(aggregate.total_weight);
        }
    }

    for record in records {
        if let Some(&package_id) = package_of.get(record.construction.as_str()) {
            packages[package_id].add_component(&record.component, record.quantity);
        }
    }

    let reports: Vec<PackageReport> = packages
        .into_iter()
        .enumerate()
        .map(|(package_id, values)| values.into_report(package_id))
        .collect();

    for report in &reports {
        debug!(
            package = report.package_id,
            constructions = report.constructions.len(),
            weight = report.total_weight,
            composition = %report.composition(),
            "package report"
        );
    }

    reports
}
