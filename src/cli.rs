//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;

use crate::data::{ComponentFilter, DEFAULT_SHEET};
use crate::model::{
    PartitionParams, DEFAULT_MAX_ITERS, DEFAULT_N_RUNS, DEFAULT_SEED, DEFAULT_TOLERANCE,
};
use crate::simulation::SimulationParams;

/// Split constructions into packages using K-Means clustering on quantity
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the component table (.xlsx, .xls, .ods or .csv)
    #[arg(short, long, env = "PACKFORGE_INPUT", default_value = "DATA_test.xlsx")]
    pub input: PathBuf,

    /// Worksheet holding the component table
    #[arg(long, env = "PACKFORGE_SHEET", default_value = DEFAULT_SHEET)]
    pub sheet: String,

    /// Number of packages (2-10)
    #[arg(short = 'k', long, default_value = "3")]
    pub packages: usize,

    /// Components to include; repeat or separate with commas. All components when omitted
    #[arg(short, long = "component", value_delimiter = ',')]
    pub components: Vec<String>,

    /// Output path for the package export
    #[arg(short, long, default_value = "balicky_export.csv")]
    pub output: PathBuf,

    /// Optional output path for the package summary
    #[arg(long)]
    pub summary_output: Option<PathBuf>,

    /// Maximum iterations for K-Means algorithm
    #[arg(long, default_value_t = DEFAULT_MAX_ITERS)]
    pub max_iters: u64,

    /// Tolerance for K-Means convergence
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    pub tolerance: f64,

    /// Seed for centroid initialisation
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Print the loaded component table
    #[arg(long)]
    pub show_input: bool,

    /// List the distinct components and exit
    #[arg(long)]
    pub list_components: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Inclusion filter built from `--component`; empty means every component
    pub fn component_filter(&self) -> ComponentFilter {
        let names: Vec<&str> = self
            .components
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        if names.is_empty() {
            ComponentFilter::All
        } else {
            ComponentFilter::only(names)
        }
    }

    pub fn simulation_params(&self) -> SimulationParams {
        SimulationParams {
            filter: self.component_filter(),
            partition: PartitionParams {
                n_packages: self.packages,
                max_iters: self.max_iters,
                tolerance: self.tolerance,
                n_runs: DEFAULT_N_RUNS,
                seed: self.seed,
            },
        }
    }
}
