//! Component data loading and schema validation
//!
//! The input is a table of component rows with four required columns. Rows are
//! validated once here so the rest of the pipeline works on typed records.

use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::error::PackagingError;

pub const COMPONENT_COLUMN: &str = "KOMPONENTA";
pub const CONSTRUCTION_COLUMN: &str = "KONSTRUKCE";
pub const QUANTITY_COLUMN: &str = "MNOZSTVI";
pub const WEIGHT_COLUMN: &str = "HMOTNOST";

/// Sheet the component table lives on in the source workbook
pub const DEFAULT_SHEET: &str = "komponenty";

/// One raw input row: a component used in a construction
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRecord {
    pub component: String,
    pub construction: String,
    pub quantity: f64,
    pub weight: f64,
}

impl ComponentRecord {
    pub fn new(
        component: impl Into<String>,
        construction: impl Into<String>,
        quantity: f64,
        weight: f64,
    ) -> Self {
        Self {
            component: component.into(),
            construction: construction.into(),
            quantity,
            weight,
        }
    }
}

/// Inclusion filter over component names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ComponentFilter {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl ComponentFilter {
    pub fn only<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(components.into_iter().map(Into::into).collect())
    }

    pub fn includes(&self, component: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(components) => components.contains(component),
        }
    }
}

/// Validated component table, loaded once and passed into each run by reference
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentTable {
    records: Vec<ComponentRecord>,
}

impl ComponentTable {
    pub fn new(records: Vec<ComponentRecord>) -> Self {
        Self { records }
    }

    /// Build a table from a header row and string cells.
    ///
    /// Fully blank rows are skipped. Any other row must carry all four required
    /// fields with a non-negative numeric quantity and weight; the first
    /// offending row aborts the whole load.
    pub fn from_raw_rows<I, R>(headers: &[String], rows: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[String]>,
    {
        let columns = ColumnIndex::locate(headers)?;
        let mut records = Vec::new();

        for (idx, row) in rows.into_iter().enumerate() {
            let row = row.as_ref();
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            records.push(columns.parse_row(idx + 1, row)?);
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[ComponentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct component names in order of first appearance
    pub fn component_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|record| seen.insert(record.component.as_str()))
            .map(|record| record.component.as_str())
            .collect()
    }

    /// Rows whose component passes the filter, in input order
    pub fn select(&self, filter: &ComponentFilter) -> Vec<ComponentRecord> {
        self.records
            .iter()
            .filter(|record| filter.includes(&record.component))
            .cloned()
            .collect()
    }
}

/// Positions of the required columns within a header row
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    component: usize,
    construction: usize,
    quantity: usize,
    weight: usize,
}

impl ColumnIndex {
    fn locate(headers: &[String]) -> crate::Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim() == name)
                .ok_or_else(|| PackagingError::schema(0, format!("missing column {name}")))
        };
        Ok(Self {
            component: find(COMPONENT_COLUMN)?,
            construction: find(CONSTRUCTION_COLUMN)?,
            quantity: find(QUANTITY_COLUMN)?,
            weight: find(WEIGHT_COLUMN)?,
        })
    }

    fn parse_row(&self, row_number: usize, row: &[String]) -> crate::Result<ComponentRecord> {
        Ok(ComponentRecord {
            component: text_field(row_number, row, self.component, COMPONENT_COLUMN)?,
            construction: text_field(row_number, row, self.construction, CONSTRUCTION_COLUMN)?,
            quantity: numeric_field(row_number, row, self.quantity, QUANTITY_COLUMN)?,
            weight: numeric_field(row_number, row, self.weight, WEIGHT_COLUMN)?,
        })
    }
}

fn text_field(
    row_number: usize,
    row: &[String],
    idx: usize,
    name: &str,
) -> crate::Result<String> {
    match row.get(idx).map(|cell| cell.trim()) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(PackagingError::schema(
            row_number,
            format!("missing value for {name}"),
        )),
    }
}

fn numeric_field(
    row_number: usize,
    row: &[String],
    idx: usize,
    name: &str,
) -> crate::Result<f64> {
    let raw = text_field(row_number, row, idx, name)?;
    let value: f64 = raw.replace(',', ".").parse().map_err(|_| {
        PackagingError::schema(row_number, format!("{name} is not a number: {raw}"))
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(PackagingError::schema(
            row_number,
            format!("{name} must be a non-negative finite number, got {raw}"),
        ));
    }
    Ok(value)
}

/// Load the component table from a spreadsheet or CSV file
///
/// # Arguments
/// * `file_path` - `.xlsx`, `.xls`, `.ods` or `.csv` file
/// * `sheet` - Worksheet name for spreadsheet formats (ignored for CSV)
pub fn load_component_table(file_path: &Path, sheet: &str) -> crate::Result<ComponentTable> {
    let ext = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(file_path)?,
        "xlsx" | "xlsm" | "xls" | "ods" => load_spreadsheet(file_path, sheet)?,
        _ => return Err(PackagingError::UnsupportedFormat(ext)),
    };

    info!(
        path = %file_path.display(),
        rows = table.len(),
        "component table loaded"
    );
    Ok(table)
}

fn load_csv(file_path: &Path) -> crate::Result<ComponentTable> {
    let file = File::open(file_path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    debug!(columns = ?headers, rows = rows.len(), "parsed CSV");
    ComponentTable::from_raw_rows(&headers, rows)
}

fn load_spreadsheet(file_path: &Path, sheet: &str) -> crate::Result<ComponentTable> {
    let mut workbook = open_workbook_auto(file_path)?;
    let range = workbook.worksheet_range(sheet)?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows.next().ok_or_else(|| {
        PackagingError::schema(0, format!("sheet {sheet} has no header row"))
    })?;

    debug!(sheet, columns = ?headers, "parsed worksheet header");
    ComponentTable::from_raw_rows(&headers, rows)
}

/// Cell text as the row parser expects it; whole floats print without a fraction
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(value) => value.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn headers() -> Vec<String> {
        [COMPONENT_COLUMN, CONSTRUCTION_COLUMN, QUANTITY_COLUMN, WEIGHT_COLUMN]
            .iter()
            .map(|h| h.to_string())
            .collect()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn create_test_csv() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "ID,KOMPONENTA,KONSTRUKCE,MNOZSTVI,HMOTNOST,POZNAMKA").unwrap();
        writeln!(file, "1,C1,K1,10,5,").unwrap();
        writeln!(file, "2,C2,K1,10,3.5,nosnik").unwrap();
        writeln!(file, ",,,,,").unwrap();
        writeln!(file, "3,C1,K2,50,20,").unwrap();
        file
    }

    #[test]
    fn test_load_csv_table() {
        let file = create_test_csv();
        let table = load_component_table(file.path(), DEFAULT_SHEET).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.records()[1],
            ComponentRecord::new("C2", "K1", 10.0, 3.5)
        );
        assert_eq!(table.component_names(), vec!["C1", "C2"]);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let result = load_component_table(file.path(), DEFAULT_SHEET);
        assert!(matches!(
            result,
            Err(PackagingError::UnsupportedFormat(ext)) if ext == "json"
        ));
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let headers = row(&[COMPONENT_COLUMN, CONSTRUCTION_COLUMN, QUANTITY_COLUMN]);
        let result = ComponentTable::from_raw_rows(&headers, vec![row(&["C1", "K1", "1"])]);
        assert!(matches!(
            result,
            Err(PackagingError::InconsistentSchema { row: 0, .. })
        ));
    }

    #[test]
    fn test_missing_value_reports_row() {
        let rows = vec![row(&["C1", "K1", "1", "2"]), row(&["C2", "", "3", "4"])];
        let result = ComponentTable::from_raw_rows(&headers(), rows);
        assert!(matches!(
            result,
            Err(PackagingError::InconsistentSchema { row: 2, .. })
        ));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        for bad in ["abc", "-1", "NaN", "inf"] {
            let rows = vec![row(&["C1", "K1", bad, "1"])];
            let result = ComponentTable::from_raw_rows(&headers(), rows);
            assert!(result.is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_decimal_comma_accepted() {
        let rows = vec![row(&["C1", "K1", "2", "1,25"])];
        let table = ComponentTable::from_raw_rows(&headers(), rows).unwrap();
        assert_eq!(table.records()[0].weight, 1.25);
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(10.0)), "10");
        assert_eq!(cell_text(&Data::Float(3.25)), "3.25");
        assert_eq!(cell_text(&Data::Int(3)), "3");
        assert_eq!(cell_text(&Data::String("kotva".into())), "kotva");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_select_by_filter() {
        let table = ComponentTable::new(vec![
            ComponentRecord::new("C1", "K1", 1.0, 1.0),
            ComponentRecord::new("C2", "K1", 2.0, 1.0),
            ComponentRecord::new("C3", "K2", 3.0, 1.0),
        ]);

        assert_eq!(table.select(&ComponentFilter::All).len(), 3);

        let selected = table.select(&ComponentFilter::only(["C1", "C3"]));
        let names: Vec<_> = selected.iter().map(|r| r.component.as_str()).collect();
        assert_eq!(names, vec!["C1", "C3"]);

        assert!(table.select(&ComponentFilter::only(["missing"])).is_empty());
    }
}
