//! `plotwise config` handlers

use crate::cli::ConfigInitArgs;
use crate::config::PlotwiseConfig;
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../plotwise.example.toml");

/// Environment variables a config reads secrets from: endpoint API keys,
/// then the object store token.
pub fn secret_env_vars(config: &PlotwiseConfig) -> Vec<String> {
    let mut vars: Vec<String> = config
        .endpoints
        .iter()
        .filter_map(|e| e.api_key_env.clone())
        .collect();
    vars.extend(config.storage.api_key_env.clone());
    vars.dedup();
    vars
}

/// Handle `plotwise config init`: write the starter config and list the
/// secrets it expects in the environment.
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        )
        .into());
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;
    println!("✓ Configuration file created: {}", args.output.display());

    let template: PlotwiseConfig = toml::from_str(EXAMPLE_CONFIG)?;
    for var in secret_env_vars(&template) {
        println!("  export {}=...", var);
    }
    println!("  Point [sandbox] at your python and schematic compiler, then run `plotwise serve`.");

    Ok(())
}
