//! PackForge: split construction items into packages using K-Means clustering
//!
//! Component rows are summed per construction, the constructions are
//! clustered on total quantity into a fixed number of packages, and each
//! package is reported with its weight and component composition.

pub mod aggregate;
pub mod cli;
pub mod data;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod report;
pub mod simulation;
pub mod summary;
pub mod tables;

// Re-export public items for easier access
pub use aggregate::{aggregate_constructions, ConstructionAggregate};
pub use cli::Args;
pub use data::{load_component_table, ComponentFilter, ComponentRecord, ComponentTable};
pub use error::{PackagingError, Result};
pub use export::{build_export_rows, package_label, ExportRow};
pub use model::{fit_packages, PackageAssignment, PackageModel, PartitionParams};
pub use report::{build_package_reports, ComponentQuantity, PackageReport};
pub use simulation::{run_simulation, SimulationOutcome, SimulationParams};
pub use summary::{summarize_packages, SummaryRow};
