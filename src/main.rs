//! PackForge: package simulation CLI
//!
//! Loads the component table, runs the packaging simulation and writes the
//! export files.

use anyhow::{Context, Result};
use clap::Parser;
use packforge::{
    export, load_component_table, logging, run_simulation, tables, Args, SimulationOutcome,
};
use std::time::Instant;
use tracing::info;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let table = load_component_table(&args.input, &args.sheet).with_context(|| {
        format!(
            "failed to load component table from {}",
            args.input.display()
        )
    })?;

    if args.list_components {
        for name in table.component_names() {
            println!("{name}");
        }
        return Ok(());
    }

    if args.show_input {
        println!("=== Vstupní data ===");
        println!("{}", tables::build_components_table(table.records()));
    }

    let params = args.simulation_params();
    info!(
        packages = params.partition.n_packages,
        filter = ?params.filter,
        "starting simulation"
    );

    let start_time = Instant::now();
    let outcome = run_simulation(&table, &params).context("simulation failed")?;
    info!(elapsed = ?start_time.elapsed(), "simulation finished");

    print_packages(&outcome);
    if args.verbose {
        print_model_statistics(&outcome);
    }

    export::write_export_file(&args.output, &outcome)
        .with_context(|| format!("failed to write export to {}", args.output.display()))?;
    println!("\nExport saved to: {}", args.output.display());

    if let Some(path) = &args.summary_output {
        export::write_summary_file(path, &outcome.summary)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        println!("Summary saved to: {}", path.display());
    }

    Ok(())
}

/// Print every package followed by the summary table
fn print_packages(outcome: &SimulationOutcome) {
    println!("=== Výsledky rozdělení do balíčků ===");
    for report in &outcome.reports {
        println!("\n### Balíček {}", export::package_label(report.package_id));
        println!(
            "{}",
            tables::build_package_table(report, &outcome.aggregates)
        );
        println!("Celková hmotnost balíčku: {:.2} kg", report.total_weight);
        println!("Komponenty v balíčku:");
        println!("{}", tables::build_breakdown_table(report));
    }

    println!("\n=== Shrnutí balíčků ===");
    println!("{}", tables::build_summary_table(&outcome.summary));
}

fn print_model_statistics(outcome: &SimulationOutcome) {
    let model = &outcome.model;
    let features = packforge::model::quantity_features(&outcome.aggregates);
    let total = outcome.aggregates.len();

    println!("\n=== Cluster Statistics ===");
    println!(
        "Fitted packages: {} of {}",
        model.effective_packages, model.n_packages
    );
    println!("Within-package sum of squares: {:.2}", model.inertia);
    println!("Silhouette score: {:.3}", model.silhouette_score(&features));
    for (package_id, &size) in model.package_sizes().iter().enumerate() {
        let percentage = (size as f64 / total as f64) * 100.0;
        println!(
            "  {}: {} constructions ({:.1}%)",
            export::package_label(package_id),
            size,
            percentage
        );
    }
    for (package_id, centroid) in model.centroids.iter().enumerate() {
        println!(
            "  centroid {}: {:.2}",
            export::package_label(package_id),
            centroid
        );
    }
}
