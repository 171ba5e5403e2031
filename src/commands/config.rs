use anyhow::Result;
use buildcost::config;
use colored::Colorize;
use std::path::Path;
use tracing::info;

/// Execute the config show command
pub fn show(config_path: &Path) -> Result<()> {
    println!("{}", "Loading configuration...".yellow());
    info!("Loading configuration for display");

    let cfg = config::load_config(config_path)?;

    println!("{}", "Current Configuration:".green().bold());
    println!();

    let toml_string = toml::to_string_pretty(&cfg)?;
    println!("{}", toml_string);

    Ok(())
}

/// Execute the config validate command
pub fn validate(config_path: &Path) -> Result<()> {
    println!("{}", "Validating configuration...".yellow());
    info!("Validating configuration file");

    let cfg = config::load_config(config_path)?;

    println!("{}", "✓ Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    println!("  {}: {}", "Currency".cyan(), cfg.pricing.currency);
    println!(
        "  {}: labor {}, contingency {}",
        "Rates".cyan(),
        cfg.pricing.labor_rate,
        cfg.pricing.contingency_rate
    );
    println!(
        "  {}: ttl {}s, capacity {}",
        "Cache".cyan(),
        cfg.cache.ttl_seconds,
        if cfg.cache.capacity == 0 {
            "unbounded".to_string()
        } else {
            cfg.cache.capacity.to_string()
        }
    );
    println!(
        "  {}: {}",
        "Provider Priority".cyan(),
        cfg.resolution.provider_priority.join(" → ")
    );

    let enabled = [
        ("marketplace", cfg.providers.marketplace.enabled),
        ("local_directory", cfg.providers.local_directory.enabled),
    ];
    for (name, is_enabled) in enabled {
        let status = if is_enabled {
            "enabled".green()
        } else {
            "disabled".red()
        };
        println!("    {} ({})", name, status);
    }

    info!("Configuration validation successful");
    Ok(())
}
