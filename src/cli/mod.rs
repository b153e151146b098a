//! Command-line interface.
//!
//! With no subcommand the binary starts the server. Subcommands:
//! - `config check` - Validate the configuration file and print a summary

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "fittrack")]
#[command(author, version, about = "Workout log, friends feed and coach goals", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "FITTRACK_CONFIG", default_value = "fittrack.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

/// Run a CLI subcommand. `None` is handled by main, which starts the server.
pub fn run_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Config(ConfigCommands::Check)) => cmd_config_check(cli),
        None => Ok(()),
    }
}

fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("Defaults (plus FITTRACK_* environment overrides) will be used.");
        println!("To customize, copy fittrack.example.toml to fittrack.toml");
        return Ok(());
    }

    let config = match Config::load(config_path).and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            println!("[FAIL] Configuration is invalid");
            println!();
            println!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    println!("[OK] Configuration file is valid!");
    println!();
    print_summary(&config);
    Ok(())
}

fn print_summary(config: &Config) {
    let on_off = |enabled: bool| if enabled { "Enabled" } else { "Disabled" };

    println!("=== Configuration Summary ===");
    println!();
    println!("Server:");
    println!("  Listen:       {}", config.bind_addr());
    println!("  Data Dir:     {}", config.server.data_dir.display());
    println!();
    println!("Auth:");
    println!("  Session TTL:  {}h", config.auth.session_ttl_hours);
    println!("  Min Password: {} chars", config.auth.min_password_length);
    println!("  Secure Cookie: {}", on_off(config.auth.secure_cookies));
    println!();
    println!("Rate Limiting:  {}", on_off(config.rate_limit.enabled));
    if config.rate_limit.enabled {
        println!(
            "  API:          {} req / {}s",
            config.rate_limit.api_requests_per_window, config.rate_limit.window_seconds
        );
        println!(
            "  Auth:         {} req / {}s",
            config.rate_limit.auth_requests_per_window, config.rate_limit.window_seconds
        );
        println!("  Trust Proxy:  {}", on_off(config.rate_limit.trust_proxy));
    }
    println!();
    println!("Logging:        {}", config.logging.level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_starts_server() {
        let cli = Cli::parse_from(["fittrack"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("fittrack.toml"));
    }

    #[test]
    fn test_config_check_parses() {
        let cli = Cli::parse_from(["fittrack", "-c", "custom.toml", "config", "check"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config(ConfigCommands::Check))
        ));
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
    }
}
