//! Terminal tables for the input data and run results

use comfy_table::{modifiers, presets, Cell, CellAlignment, Color, Table};

use crate::aggregate::ConstructionAggregate;
use crate::data::{
    ComponentRecord, COMPONENT_COLUMN, CONSTRUCTION_COLUMN, QUANTITY_COLUMN, WEIGHT_COLUMN,
};
use crate::export::package_label;
use crate::report::PackageReport;
use crate::summary::SummaryRow;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table
}

fn number(value: f64) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}

pub fn build_components_table(records: &[ComponentRecord]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        COMPONENT_COLUMN,
        CONSTRUCTION_COLUMN,
        QUANTITY_COLUMN,
        WEIGHT_COLUMN,
    ]);
    for record in records {
        table.add_row(vec![
            Cell::new(&record.component),
            Cell::new(&record.construction),
            number(record.quantity),
            number(record.weight),
        ]);
    }
    table
}

/// Constructions that belong to `report`, in aggregate order
pub fn build_package_table(report: &PackageReport, aggregates: &[ConstructionAggregate]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        CONSTRUCTION_COLUMN,
        QUANTITY_COLUMN,
        WEIGHT_COLUMN,
        "BALICEK",
    ]);
    for aggregate in aggregates
        .iter()
        .filter(|a| report.constructions.contains(&a.construction))
    {
        table.add_row(vec![
            Cell::new(&aggregate.construction),
            number(aggregate.total_quantity),
            number(aggregate.total_weight),
            Cell::new(package_label(report.package_id)),
        ]);
    }
    table
}

pub fn build_breakdown_table(report: &PackageReport) -> Table {
    let mut table = new_table();
    table.set_header(vec![COMPONENT_COLUMN, QUANTITY_COLUMN]);
    for entry in &report.component_breakdown {
        table.add_row(vec![Cell::new(&entry.component), number(entry.quantity)]);
    }
    table
}

pub fn build_summary_table(summary: &[SummaryRow]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["BALICEK", QUANTITY_COLUMN, WEIGHT_COLUMN]);
    for row in summary {
        table.add_row(vec![
            Cell::new(package_label(row.package_id)).fg(Color::Cyan),
            number(row.total_quantity),
            Cell::new(format!("{:.2}", row.total_weight))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_package_table_lists_members_only() {
        let aggregates = vec![
            ConstructionAggregate {
                construction: "K1".into(),
                total_quantity: 20.0,
                total_weight: 8.0,
            },
            ConstructionAggregate {
                construction: "K2".into(),
                total_quantity: 50.0,
                total_weight: 20.0,
            },
        ];
        let report = PackageReport {
            package_id: 1,
            constructions: BTreeSet::from(["K2".to_string()]),
            total_quantity: 50.0,
            total_weight: 20.0,
            component_breakdown: Vec::new(),
        };

        let rendered = build_package_table(&report, &aggregates).to_string();
        assert!(rendered.contains("K2"));
        assert!(!rendered.contains("K1"));
    }

    #[test]
    fn test_summary_table_rows() {
        let summary = vec![
            SummaryRow {
                package_id: 0,
                total_quantity: 20.0,
                total_weight: 8.0,
            },
            SummaryRow {
                package_id: 2,
                total_quantity: 50.0,
                total_weight: 20.126,
            },
        ];
        let table = build_summary_table(&summary);
        assert_eq!(table.row_iter().count(), 2);
        assert!(table.to_string().contains("20.13"));
    }
}
