//! `costbook report` and `costbook projects` commands.

use std::collections::BTreeMap;

use anyhow::{Context, Result};

use costbook_core::Engine;
use costbook_db::models::{Category, CategoryRole};

/// Run the projects command: one line per project.
pub fn run_projects(engine: &Engine) -> Result<()> {
    let projects = engine.projects()?;
    if projects.is_empty() {
        println!("No projects.");
        return Ok(());
    }
    println!("{:<16} {:<32} {:>16}", "ID", "NAME", "TOTAL");
    println!("{}", "-".repeat(66));
    for project in projects {
        println!(
            "{:<16} {:<32} {:>16}",
            project.id, project.name, project.total_cost
        );
    }
    Ok(())
}

/// Run the report command: the category tree with cached totals.
pub fn run_report(engine: &Engine, project_id: &str) -> Result<()> {
    let project = engine
        .project(project_id)?
        .with_context(|| format!("project {project_id} not found"))?;
    let categories = engine.categories(project_id)?;

    println!("Project: {} ({})", project.name, project.id);
    println!(
        "Contingency: {}%  Profit: {}%",
        project.contingency_pct, project.profit_pct
    );
    println!();

    let mut children: BTreeMap<Option<String>, Vec<&Category>> = BTreeMap::new();
    for cat in &categories {
        children.entry(cat.parent_id.clone()).or_default().push(cat);
    }
    if let Some(roots) = children.get(&None) {
        for root in roots.clone() {
            print_subtree(&children, root, 0);
        }
    }

    println!();
    println!("Total: {}", project.total_cost);
    Ok(())
}

fn print_subtree(
    children: &BTreeMap<Option<String>, Vec<&Category>>,
    category: &Category,
    depth: usize,
) {
    let indent = "  ".repeat(depth);
    let marker = role_marker(category.role);
    println!(
        "{indent}{} {}{:>width$}",
        category.name,
        marker,
        category.total_cost,
        width = 16usize.saturating_sub(indent.len())
    );
    if let Some(kids) = children.get(&Some(category.id.clone())) {
        for child in kids {
            print_subtree(children, child, depth + 1);
        }
    }
}

fn role_marker(role: CategoryRole) -> &'static str {
    match role {
        CategoryRole::Ordinary => "",
        CategoryRole::DetailEngineering => "[engineering]",
        CategoryRole::ProcurementManagement => "[procurement]",
        CategoryRole::Contingency => "[contingency]",
        CategoryRole::Profit => "[profit]",
        CategoryRole::VendorAssistance => "[vendor]",
    }
}
