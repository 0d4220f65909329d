//! Config command implementation.

use anyhow::{Context, Result};
use docplan_backend::BackendConfig;

/// Show the effective configuration (file + environment + flags).
pub fn show(config: &BackendConfig) -> Result<()> {
    println!("docplan Backend Configuration");
    println!("{:-<40}", "");
    println!("Mode:        {}", config.mode);
    println!("Model:       {}", config.model_name);
    println!("Endpoint:    {}", config.endpoint());
    println!("Timeout:     {} s", config.timeout_secs);
    println!(
        "API Key:     {}",
        if config.api_key.is_some() { "(set)" } else { "(not set)" }
    );

    if let Some(path) = BackendConfig::config_file_path() {
        println!("\nConfig file: {}", path.display());
    }
    Ok(())
}

pub fn get(config: &BackendConfig, key: &str) -> Result<()> {
    match config.get(key) {
        Some(value) => println!("{value}"),
        None => anyhow::bail!(
            "Unknown or unset config key: {key}. Valid keys: mode, model_name, url, api_key, timeout_secs"
        ),
    }
    Ok(())
}

/// Set a value in the config file. Environment overrides are not persisted.
pub fn set(key: &str, value: &str) -> Result<()> {
    let mut config = match BackendConfig::config_file_path() {
        Some(path) if path.exists() => BackendConfig::load_from_toml(&path)?,
        _ => BackendConfig::default(),
    };
    config
        .set(key, value)
        .with_context(|| format!("Failed to set {key}"))?;

    if key == "api_key" {
        println!("API keys are not stored in the config file. Use the DOCPLAN_API_KEY env var.");
        return Ok(());
    }

    let path = config.save().context("Failed to save configuration")?;
    println!("Set {key} in {}", path.display());
    Ok(())
}
