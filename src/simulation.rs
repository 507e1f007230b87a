//! One complete packaging run: select, aggregate, partition, report, summarize

use tracing::{info, warn};

use crate::aggregate::{aggregate_constructions, ConstructionAggregate};
use crate::data::{ComponentFilter, ComponentRecord, ComponentTable};
use crate::model::{fit_packages, PackageAssignment, PackageModel, PartitionParams};
use crate::report::{build_package_reports, PackageReport};
use crate::summary::{summarize_packages, SummaryRow};

/// Caller-supplied inputs of a run
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub filter: ComponentFilter,
    pub partition: PartitionParams,
}

impl SimulationParams {
    pub fn new(n_packages: usize, filter: ComponentFilter) -> Self {
        Self {
            filter,
            partition: PartitionParams::new(n_packages),
        }
    }
}

/// All tables derived by a successful run
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    /// Component rows that passed the filter
    pub selected: Vec<ComponentRecord>,
    pub aggregates: Vec<ConstructionAggregate>,
    pub model: PackageModel,
    pub assignments: Vec<PackageAssignment>,
    /// One report per package id, empty packages included
    pub reports: Vec<PackageReport>,
    /// One row per populated package
    pub summary: Vec<SummaryRow>,
}

impl SimulationOutcome {
    pub fn package_of(&self, construction: &str) -> Option<usize> {
        self.assignments
            .iter()
            .find(|assignment| assignment.construction == construction)
            .map(|assignment| assignment.package_id)
    }
}

/// Run the whole pipeline on a loaded table.
///
/// Parameters are checked before anything is computed, and nothing is
/// returned unless every stage succeeds. The table is not modified, so a run
/// can be repeated with other parameters.
pub fn run_simulation(
    table: &ComponentTable,
    params: &SimulationParams,
) -> crate::Result<SimulationOutcome> {
    params.partition.validate()?;

    let selected = table.select(&params.filter);
    if selected.is_empty() {
        warn!(
            filter = ?params.filter,
            "component selection matched no rows"
        );
    }

    let aggregates = aggregate_constructions(&selected);
    let model = fit_packages(&aggregates, &params.partition)?;
    let assignments = model.assignments(&aggregates);
    let reports = build_package_reports(
        &selected,
        &aggregates,
        &assignments,
        model.n_packages,
    );
    let summary = summarize_packages(&aggregates, &assignments);

    let empty_packages = reports.iter().filter(|report| report.is_empty()).count();
    info!(
        rows = selected.len(),
        constructions = aggregates.len(),
        packages = model.n_packages,
        empty_packages,
        "simulation complete"
    );

    Ok(SimulationOutcome {
        selected,
        aggregates,
        model,
        assignments,
        reports,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PackagingError;

    fn scenario_table() -> ComponentTable {
        ComponentTable::new(vec![
            ComponentRecord::new("C1", "K1", 10.0, 5.0),
            ComponentRecord::new("C2", "K1", 10.0, 3.0),
            ComponentRecord::new("C1", "K2", 50.0, 20.0),
        ])
    }

    #[test]
    fn test_scenario_run() {
        let params = SimulationParams::new(2, ComponentFilter::only(["C1", "C2"]));
        let outcome = run_simulation(&scenario_table(), &params).unwrap();

        assert_eq!(outcome.aggregates.len(), 2);
        assert_eq!(outcome.aggregates[0].total_quantity, 20.0);
        assert_eq!(outcome.aggregates[0].total_weight, 8.0);

        let k1 = outcome.package_of("K1").unwrap();
        let k2 = outcome.package_of("K2").unwrap();
        assert_ne!(k1, k2);
        assert_eq!(outcome.reports[k1].composition(), "C1: 10; C2: 10");

        let total_weight: f64 = outcome.reports.iter().map(|r| r.total_weight).sum();
        assert_eq!(total_weight, 28.0);
    }

    #[test]
    fn test_filter_limits_components() {
        let params = SimulationParams::new(2, ComponentFilter::only(["C2"]));
        let outcome = run_simulation(&scenario_table(), &params).unwrap();

        assert_eq!(outcome.selected.len(), 1);
        assert_eq!(outcome.aggregates.len(), 1);
        assert_eq!(outcome.summary.len(), 1);
        assert_eq!(outcome.reports.len(), 2);
    }

    #[test]
    fn test_single_package_rejected() {
        let params = SimulationParams::new(1, ComponentFilter::All);
        let result = run_simulation(&scenario_table(), &params);
        assert!(matches!(result, Err(PackagingError::InvalidParameter(_))));
    }

    #[test]
    fn test_empty_selection_rejected() {
        let params = SimulationParams::new(3, ComponentFilter::only(["nothing"]));
        let result = run_simulation(&scenario_table(), &params);
        assert!(matches!(result, Err(PackagingError::InvalidParameter(_))));
    }

    #[test]
    fn test_rerun_is_identical() {
        let table = scenario_table();
        let params = SimulationParams::new(3, ComponentFilter::All);

        let first = run_simulation(&table, &params).unwrap();
        let second = run_simulation(&table, &params).unwrap();
        assert_eq!(first.assignments, second.assignments);
        assert_eq!(first.reports, second.reports);
        assert_eq!(first.summary, second.summary);
    }
}
