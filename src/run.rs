use anyhow::Result;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::engine::BudgetAllocationEngine;
use crate::models::WorkflowStep;
use crate::store::Store;
use crate::workflow::ProjectWorkflowStore;

pub(crate) fn as_cli(args: &[String], store: &Store) -> Result<()> {
    match args[1].as_str() {
        "init" => cli_init(&args[2..], store),
        "summary" | "s" => cli_summary(store),
        "categories" => cli_categories(store),
        "allocate" => cli_allocate(&args[2..], store),
        "release" => cli_release(&args[2..], store),
        "allocations" => cli_allocations(store),
        "project" => cli_project(&args[2..], store),
        "projects" => cli_projects(store),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("skbudget {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

pub(crate) fn print_usage() {
    println!("SKBudget — ABYIP budget allocation tracker for SK councils");
    println!();
    println!("Usage: skbudget <command>");
    println!();
    println!("Commands:");
    println!("  init <file>                          Load the annual budget from CSV or JSON");
    println!("  summary                              Totals, percentage used, overall status");
    println!("  categories                           Per-category budget, allocated, available");
    println!("  allocate <project> <amount> <category>");
    println!("    --note <text>                      Commit budget to a project (replaces any prior)");
    println!("  release <project>                    Remove a project's allocation");
    println!("  allocations                          List current allocations");
    println!("  project add <id> <title>             Register a project");
    println!("  project delete <id>                  Delete a project and release its allocation");
    println!("  project doc <id> <step> <file>       Attach a document to a workflow step");
    println!("  project complete <id> <step>         Mark a workflow step complete");
    println!("  projects                             List projects and step progress");
    println!("  --help, -h                           Show this help");
    println!("  --version, -V                        Show version");
    println!();
    println!(
        "Workflow steps: {}",
        WorkflowStep::all()
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
}

fn cli_init(args: &[String], store: &Store) -> Result<()> {
    if args.is_empty() {
        anyhow::bail!("Usage: skbudget init <file.csv|file.json>");
    }
    let path = Path::new(&args[0]);
    if !path.exists() {
        anyhow::bail!("File not found: {}", args[0]);
    }

    let catalog = match crate::ingest::catalog_from_path(path) {
        Ok(c) => c,
        Err(e) => anyhow::bail!("Budget source rejected: {e}"),
    };

    let mut engine = BudgetAllocationEngine::load(store)?;
    let replacing = engine.catalog().is_some();
    let report = engine.replace_catalog(store, catalog)?;

    let summary = engine.summary();
    println!(
        "Loaded budget: {} across {} categories",
        format_amount(summary.total),
        engine.catalog().map(|c| c.items.len()).unwrap_or(0)
    );

    if replacing && !report.is_empty() {
        println!();
        println!("Warning: existing allocations exceed the new budget:");
        for r in &report {
            println!(
                "  {:<28} cap {:>14}  allocated {:>14}  over by {}",
                r.category,
                format_amount(r.cap),
                format_amount(r.allocated),
                format_amount(r.excess)
            );
        }
        println!("Release or re-allocate the projects above to reconcile.");
    }
    Ok(())
}

fn cli_summary(store: &Store) -> Result<()> {
    let engine = BudgetAllocationEngine::load(store)?;
    if engine.catalog().is_none() {
        println!("No budget data loaded. Run: skbudget init <file>");
        return Ok(());
    }
    if engine.recovered_from_corruption() {
        println!("Note: a stored record was unreadable and has been reset.");
    }

    let summary = engine.summary();
    println!("ABYIP Budget");
    println!("{}", "─".repeat(40));
    println!("  Total:       {}", format_amount(summary.total));
    println!("  Allocated:   {}", format_amount(summary.allocated));
    println!("  Available:   {}", format_amount(summary.available));
    println!("  Used:        {:.1}%", summary.percentage_used);
    println!("  Status:      {}", engine.overall_status());
    Ok(())
}

fn cli_categories(store: &Store) -> Result<()> {
    let engine = BudgetAllocationEngine::load(store)?;
    if engine.catalog().is_none() {
        println!("No budget data loaded. Run: skbudget init <file>");
        return Ok(());
    }

    println!(
        "{:<28} {:>14} {:>14} {:>14}  Status",
        "Category", "Budget", "Allocated", "Available"
    );
    println!("{}", "─".repeat(84));
    for row in engine.category_breakdown() {
        println!(
            "{:<28} {:>14} {:>14} {:>14}  {}",
            row.category,
            format_amount(row.cap),
            format_amount(row.allocated),
            format_amount(row.available),
            row.status
        );
    }
    Ok(())
}

fn cli_allocate(args: &[String], store: &Store) -> Result<()> {
    if args.len() < 3 {
        anyhow::bail!("Usage: skbudget allocate <project> <amount> <category> [--note <text>]");
    }
    let project_id = &args[0];
    let amount = parse_amount_arg(&args[1])?;
    let category = &args[2];
    let note = args
        .windows(2)
        .find(|w| w[0] == "--note")
        .map(|w| w[1].clone());

    let mut engine = BudgetAllocationEngine::load(store)?;
    if let Err(e) = engine.validate(amount, category, Some(project_id)) {
        anyhow::bail!("{e}");
    }
    if !engine.allocate(store, project_id, amount, category, note)? {
        // validate passed a moment ago; only a concurrent writer could get here
        anyhow::bail!("Allocation refused; re-check with: skbudget categories");
    }

    println!(
        "Allocated {} from '{}' to project '{}' ({} left in category)",
        format_amount(amount),
        category,
        project_id,
        format_amount(engine.category_available(category))
    );
    Ok(())
}

fn cli_release(args: &[String], store: &Store) -> Result<()> {
    if args.is_empty() {
        anyhow::bail!("Usage: skbudget release <project>");
    }
    let mut engine = BudgetAllocationEngine::load(store)?;
    let had = engine.get_allocation(&args[0]).is_some();
    engine.remove_allocation(store, &args[0])?;
    if had {
        println!("Released allocation for project '{}'", args[0]);
    } else {
        println!("Project '{}' had no allocation", args[0]);
    }
    Ok(())
}

fn cli_allocations(store: &Store) -> Result<()> {
    let engine = BudgetAllocationEngine::load(store)?;
    if engine.allocations().is_empty() {
        println!("No allocations");
        return Ok(());
    }

    println!(
        "{:<16} {:<28} {:>14}  Note",
        "Project", "Category", "Amount"
    );
    println!("{}", "─".repeat(72));
    for alloc in engine.allocations() {
        println!(
            "{:<16} {:<28} {:>14}  {}",
            alloc.project_id,
            alloc.category,
            format_amount(alloc.allocated_amount),
            alloc.description.as_deref().unwrap_or("")
        );
    }
    println!(
        "Total allocated: {} ({} available)",
        format_amount(engine.total_allocated()),
        format_amount(engine.total_available())
    );
    Ok(())
}

fn cli_project(args: &[String], store: &Store) -> Result<()> {
    let usage = "Usage: skbudget project <add|delete|doc|complete> ...";
    if args.is_empty() {
        anyhow::bail!("{usage}");
    }
    let mut projects = ProjectWorkflowStore::load(store)?;
    match args[0].as_str() {
        "add" => {
            if args.len() < 3 {
                anyhow::bail!("Usage: skbudget project add <id> <title>");
            }
            let title = args[2..].join(" ");
            if projects.add_project(store, &args[1], &title)? {
                println!("Added project '{}'", args[1]);
            } else {
                anyhow::bail!("Project '{}' already exists", args[1]);
            }
        }
        "delete" => {
            if args.len() < 2 {
                anyhow::bail!("Usage: skbudget project delete <id>");
            }
            let mut engine = BudgetAllocationEngine::load(store)?;
            if projects.delete_project(store, &mut engine, &args[1])? {
                println!("Deleted project '{}' and released its allocation", args[1]);
            } else {
                println!("No project '{}'", args[1]);
            }
        }
        "doc" => {
            if args.len() < 4 {
                anyhow::bail!("Usage: skbudget project doc <id> <step> <file>");
            }
            let step = parse_step(&args[2])?;
            let content = std::fs::read_to_string(&args[3])
                .map_err(|e| anyhow::anyhow!("Could not read {}: {e}", args[3]))?;
            if projects.set_document(store, &args[1], step, content)? {
                println!("Attached {} document to project '{}'", step, args[1]);
            } else {
                anyhow::bail!("No project '{}'", args[1]);
            }
        }
        "complete" => {
            if args.len() < 3 {
                anyhow::bail!("Usage: skbudget project complete <id> <step>");
            }
            let step = parse_step(&args[2])?;
            if projects.complete_step(store, &args[1], step)? {
                println!("Marked {} complete for project '{}'", step, args[1]);
            } else {
                anyhow::bail!(
                    "Project '{}' has no {} document to complete",
                    args[1],
                    step
                );
            }
        }
        other => anyhow::bail!("Unknown project command: {other}\n{usage}"),
    }
    Ok(())
}

fn cli_projects(store: &Store) -> Result<()> {
    let projects = ProjectWorkflowStore::load(store)?;
    let engine = BudgetAllocationEngine::load(store)?;
    if projects.recovered_from_corruption() {
        println!("Note: the stored project list was unreadable and has been reset.");
    }
    if projects.projects().is_empty() {
        println!("No projects");
        return Ok(());
    }

    println!(
        "{:<16} {:<32} {:>14}  Steps",
        "Project", "Title", "Allocated"
    );
    println!("{}", "─".repeat(76));
    for project in projects.projects() {
        let allocated = engine
            .get_allocation(&project.id)
            .map(|a| format_amount(a.allocated_amount))
            .unwrap_or_else(|| "-".into());
        let marks: String = WorkflowStep::all()
            .iter()
            .map(|s| if project.is_step_complete(*s) { '●' } else { '○' })
            .collect();
        println!(
            "{:<16} {:<32} {:>14}  {} {}/{}",
            project.id,
            project.title,
            allocated,
            marks,
            project.completed_steps(),
            WorkflowStep::all().len()
        );
    }
    Ok(())
}

fn parse_step(s: &str) -> Result<WorkflowStep> {
    WorkflowStep::parse(s).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown step '{s}'. Steps: {}",
            WorkflowStep::all()
                .iter()
                .map(|w| w.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}

fn parse_amount_arg(s: &str) -> Result<Decimal> {
    let cleaned = s.replace(['₱', ','], "");
    Decimal::from_str(cleaned.trim())
        .map_err(|_| anyhow::anyhow!("Could not parse amount '{s}'"))
}

/// Format a peso amount with thousand separators and 2 decimal places.
/// e.g. `1234567.89` → `"₱1,234,567.89"`
fn format_amount(val: Decimal) -> String {
    let abs = val.abs();
    let formatted = format!("{abs:.2}");
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    if val < Decimal::ZERO {
        format!("-₱{with_commas}.{dec_part}")
    } else {
        format!("₱{with_commas}.{dec_part}")
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
