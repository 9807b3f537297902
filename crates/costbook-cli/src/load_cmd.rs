//! `costbook load` command: import a JSON batch file.

use anyhow::{Context, Result};
use tracing::info;

use costbook_core::Engine;
use costbook_core::input::Batch;

/// Run the load command.
pub fn run_load(engine: &mut Engine, file: &str) -> Result<()> {
    let contents =
        std::fs::read_to_string(file).with_context(|| format!("failed to read {file}"))?;
    let batch: Batch =
        serde_json::from_str(&contents).with_context(|| format!("failed to parse {file}"))?;
    info!(file, "applying batch file");

    let summary = engine.import(&batch)?;

    println!(
        "Imported {} project(s), {} categorie(s), {} contributor record(s).",
        summary.projects, summary.categories, summary.contributors
    );
    for project in &batch.projects {
        let total = engine.project_total(&project.id)?;
        println!("  {}: {}", project.id, total);
    }
    Ok(())
}
