//! Flat export tables and CSV writers

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::simulation::SimulationOutcome;
use crate::summary::SummaryRow;

/// One construction with its package and the package composition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "KONSTRUKCE")]
    pub construction: String,
    #[serde(rename = "MNOZSTVI")]
    pub total_quantity: f64,
    #[serde(rename = "HMOTNOST")]
    pub total_weight: f64,
    #[serde(rename = "BALICEK")]
    pub package_id: usize,
    #[serde(rename = "OZNACENI")]
    pub package_label: String,
    #[serde(rename = "KOMPONENTY")]
    pub composition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct SummaryExportRow {
    #[serde(rename = "BALICEK")]
    package_id: usize,
    #[serde(rename = "OZNACENI")]
    package_label: String,
    #[serde(rename = "MNOZSTVI")]
    total_quantity: f64,
    #[serde(rename = "HMOTNOST")]
    total_weight: f64,
}

/// Display label of a package: 0 → A, 1 → B, ...
pub fn package_label(package_id: usize) -> String {
    match u8::try_from(package_id) {
        Ok(id) if id < 26 => char::from(b'A' + id).to_string(),
        _ => format!("P{package_id}"),
    }
}

/// Rows grouped by package id, constructions in aggregate order within a package
pub fn build_export_rows(outcome: &SimulationOutcome) -> Vec<ExportRow> {
    let package_of: HashMap<&str, usize> = outcome
        .assignments
        .iter()
        .map(|assignment| (assignment.construction.as_str(), assignment.package_id))
        .collect();

    let mut rows = Vec::with_capacity(outcome.aggregates.len());
    for report in &outcome.reports {
        let composition = report.composition();
        for aggregate in &outcome.aggregates {
            if package_of.get(aggregate.construction.as_str()) == Some(&report.package_id) {
                rows.push(ExportRow {
                    construction: aggregate.construction.clone(),
                    total_quantity: aggregate.total_quantity,
                    total_weight: aggregate.total_weight,
                    package_id: report.package_id,
                    package_label: package_label(report.package_id),
                    composition: composition.clone(),
                });
            }
        }
    }
    rows
}

pub fn write_export<W: Write>(writer: W, rows: &[ExportRow]) -> crate::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_summary<W: Write>(writer: W, summary: &[SummaryRow]) -> crate::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in summary {
        csv_writer.serialize(SummaryExportRow {
            package_id: row.package_id,
            package_label: package_label(row.package_id),
            total_quantity: row.total_quantity,
            total_weight: row.total_weight,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the package export of a finished run to `path`
pub fn write_export_file(path: &Path, outcome: &SimulationOutcome) -> crate::Result<()> {
    let rows = build_export_rows(outcome);
    write_export(File::create(path)?, &rows)?;
    info!(path = %path.display(), rows = rows.len(), "export written");
    Ok(())
}

pub fn write_summary_file(path: &Path, summary: &[SummaryRow]) -> crate::Result<()> {
    write_summary(File::create(path)?, summary)?;
    info!(
        path = %path.display(),
        rows = summary.len(),
        "summary written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ComponentFilter, ComponentRecord, ComponentTable};
    use crate::simulation::{run_simulation, SimulationParams};

    fn outcome() -> SimulationOutcome {
        let table = ComponentTable::new(vec![
            ComponentRecord::new("C1", "K1", 10.0, 5.0),
            ComponentRecord::new("C2", "K1", 10.0, 3.0),
            ComponentRecord::new("C1", "K2", 50.0, 20.0),
        ]);
        run_simulation(&table, &SimulationParams::new(3, ComponentFilter::All)).unwrap()
    }

    #[test]
    fn test_package_label() {
        assert_eq!(package_label(0), "A");
        assert_eq!(package_label(9), "J");
        assert_eq!(package_label(30), "P30");
    }

    #[test]
    fn test_export_rows() {
        let rows = build_export_rows(&outcome());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].construction, "K1");
        assert_eq!(rows[0].package_label, "A");
        assert_eq!(rows[0].composition, "C1: 10; C2: 10");
        assert_eq!(rows[1].construction, "K2");
        assert_eq!(rows[1].package_id, 1);
    }

    #[test]
    fn test_write_export_csv() {
        let rows = build_export_rows(&outcome());
        let mut buffer = Vec::new();
        write_export(&mut buffer, &rows).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "KONSTRUKCE,MNOZSTVI,HMOTNOST,BALICEK,OZNACENI,KOMPONENTY"
        );
        assert_eq!(lines[1], "K1,20.0,8.0,0,A,C1: 10; C2: 10");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_write_summary_csv() {
        let mut buffer = Vec::new();
        write_summary(&mut buffer, &outcome().summary).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "BALICEK,OZNACENI,MNOZSTVI,HMOTNOST\n0,A,20.0,8.0\n1,B,50.0,20.0\n"
        );
    }
}
