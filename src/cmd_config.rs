//! Configuration loading and the `validate` subcommand.

use std::path::Path;

use watchkeeper_config::{Config, ConfigError, ConfigLoader, ConfigValidator, ValidationWarning};

/// Load and validate the configuration. Any validation error fails the load;
/// warnings are handed back for logging.
pub(crate) fn load_config(path: &Path) -> Result<(Config, Vec<ValidationWarning>), ConfigError> {
    let config = ConfigLoader::load(path)?;
    let warnings = ConfigValidator::validate(&config)?.into_result()?;
    Ok((config, warnings))
}

/// Print a summary of a configuration that passed validation.
pub(crate) fn validate(path: &Path, config: &Config, warnings: &[ValidationWarning]) {
    println!("Configuration OK: {}", path.display());
    println!(
        "  gateway:  {}",
        config
            .gateway
            .as_ref()
            .map(|g| g.url.as_str())
            .unwrap_or("(none, alerts are logged)")
    );
    println!("  services: {}", config.services.len());
    for service in &config.services {
        match service.health_url {
            Some(ref url) => println!("    - {} ({})", service.name, url),
            None => println!("    - {}", service.name),
        }
    }
    println!("  store:    {}", config.dedup.store_path.display());
    println!("  logs:     {}", config.logging.directory.display());

    if !warnings.is_empty() {
        println!("Warnings:");
        for warning in warnings {
            println!("  {}: {}", warning.path, warning.message);
        }
    }
}
