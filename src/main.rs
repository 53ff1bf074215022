mod channels;
mod config;
mod core;
mod cron_utils;
mod daemon;
mod dialog;
mod errors;
mod reminders;
mod state;
mod traits;
mod types;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config_path = PathBuf::from("config.toml");
    let mut command: Option<&str> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("daytally {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => match iter.next() {
                Some(path) => config_path = PathBuf::from(path),
                None => {
                    eprintln!("--config requires a path");
                    std::process::exit(2);
                }
            },
            "check-config" => command = Some("check-config"),
            other => {
                eprintln!("Unknown argument: '{}'. Try --help.", other);
                std::process::exit(2);
            }
        }
    }

    let config = config::AppConfig::load(&config_path)?;

    if command == Some("check-config") {
        return check_config(&config, &config_path);
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(crate::core::run(config))
}

fn print_help() {
    println!("daytally {}", env!("CARGO_PKG_VERSION"));
    println!("{}\n", env!("CARGO_PKG_DESCRIPTION"));
    println!("Usage: daytally [OPTIONS] [COMMAND]\n");
    println!("Commands:");
    println!("  check-config          Validate the config file and show the reminder schedule");
    println!("\nOptions:");
    println!("  -c, --config <PATH>   Config file (default: config.toml)");
    println!("  -h, --help            Print help");
    println!("  -V, --version         Print version");
}

fn check_config(config: &config::AppConfig, path: &std::path::Path) -> anyhow::Result<()> {
    let cron_expr = config.reminders.cron_expr()?;
    let next = cron_utils::compute_next_run_local(&cron_expr)?;
    println!("Config OK: {}", path.display());
    println!(
        "Reminders: {} (cron: {})",
        config.reminders.schedule, cron_expr
    );
    println!(
        "Next reminder: {} {}",
        next.format("%Y-%m-%d %H:%M"),
        cron_utils::system_timezone_display()
    );
    if config.telegram.allowed_user_ids.is_empty() {
        println!("Allowed users: everyone");
    } else {
        println!("Allowed users: {:?}", config.telegram.allowed_user_ids);
    }
    if config.daemon.health_port == 0 {
        println!("Health endpoint: disabled");
    } else {
        println!(
            "Health endpoint: http://{}:{}/health",
            config.daemon.health_bind, config.daemon.health_port
        );
    }
    Ok(())
}
