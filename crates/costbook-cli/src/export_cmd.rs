//! `costbook export` command: dump a project and its categories as JSON.

use anyhow::{Context, Result};
use serde::Serialize;

use costbook_core::Engine;
use costbook_db::models::{Category, Project};

#[derive(Serialize)]
struct ProjectExport {
    project: Project,
    categories: Vec<Category>,
}

/// Run the export command.
pub fn run_export(engine: &Engine, project_id: &str, output: Option<&str>) -> Result<()> {
    let project = engine
        .project(project_id)?
        .with_context(|| format!("project {project_id} not found"))?;
    let categories = engine.categories(project_id)?;

    let export = ProjectExport {
        project,
        categories,
    };
    let json = serde_json::to_string_pretty(&export).context("failed to serialize project")?;

    match output {
        Some(path) => {
            std::fs::write(path, &json).with_context(|| format!("failed to write {path}"))?;
            println!("Exported {project_id} to {path}");
        }
        None => println!("{json}"),
    }
    Ok(())
}
