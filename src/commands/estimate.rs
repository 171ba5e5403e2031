use anyhow::{Context, Result};
use buildcost::config;
use buildcost::models::{CostBreakdown, MaterialQuantity};
use buildcost::pipeline::Pipeline;
use colored::Colorize;
use std::path::Path;
use tracing::info;

/// Execute the estimate command
///
/// Loads the configuration and the quantities file, runs the pricing
/// pipeline, and prints the breakdown as a table or as JSON.
pub async fn execute(config_path: &Path, input: &Path, json: bool) -> Result<()> {
    let cfg = config::load_config(config_path)?;

    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("cannot read quantities file {}", input.display()))?;
    let quantities: Vec<MaterialQuantity> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid quantities file {}", input.display()))?;

    info!(
        materials = quantities.len(),
        input = %input.display(),
        "running cost estimate"
    );

    let pipeline = Pipeline::from_config(&cfg)?;
    let breakdown = pipeline.run(&quantities).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&breakdown)?);
    } else {
        print_breakdown(&breakdown);
    }

    Ok(())
}

fn print_breakdown(breakdown: &CostBreakdown) {
    println!("{}", "Cost Breakdown:".green().bold());
    println!();

    for item in &breakdown.line_items {
        let stale_marker = if item.is_stale_fallback {
            " (stale price)".red().to_string()
        } else {
            String::new()
        };
        println!(
            "  {} {} {} @ {} = {} {}{}",
            item.material_id.cyan(),
            item.quantity,
            item.unit,
            item.unit_price,
            item.line_total,
            breakdown.currency,
            stale_marker
        );
    }

    println!();
    println!("  {}: {} {}", "Materials".bold(), breakdown.material_subtotal, breakdown.currency);
    println!("  {}: {} {}", "Labor".bold(), breakdown.labor_cost, breakdown.currency);
    println!("  {}: {} {}", "Contingency".bold(), breakdown.contingency_cost, breakdown.currency);
    println!(
        "  {}: {} {}",
        "Total".green().bold(),
        breakdown.total_cost,
        breakdown.currency
    );

    if !breakdown.stale_materials.is_empty() {
        println!();
        println!(
            "{} {}",
            "⚠ stale fallback pricing used for:".yellow(),
            breakdown.stale_materials.join(", ")
        );
    }
}
