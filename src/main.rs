use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::debug;

use geofence_ip::cli::{Cli, Commands};
use geofence_ip::config::StaticConfig;
use geofence_ip::services::Geofence;
use geofence_ip::system::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            match e.downcast_ref::<geofence_ip::GeofenceError>() {
                Some(err) => eprintln!("{}", err.format_colored()),
                None => eprintln!("{} {:#}", "[ERROR]".red().bold(), e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    // 不需要加载配置的命令
    if let Commands::SampleConfig = cli.command {
        print!("{}", StaticConfig::generate_sample_config());
        return Ok(ExitCode::SUCCESS);
    }

    let config = StaticConfig::load(cli.config.as_deref())?;
    let _guard = init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    debug!("Configuration loaded: {:?}", config.geofence);

    let geofence = Geofence::new(&config)
        .await
        .context("Failed to initialize geofence")?;

    match cli.command {
        Commands::Anchor => {
            let anchor = geofence.anchor();
            println!(
                "{} {} ({}, cache: {})",
                "anchor".bold(),
                anchor,
                geofence.proximity(),
                geofence.cache_backend()
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { ips } => {
            let mut failed = false;
            for ip in &ips {
                match geofence.is_near(ip).await {
                    Ok(true) => println!("{}\t{}", ip, "near".green()),
                    Ok(false) => println!("{}\t{}", ip, "not near".yellow()),
                    Err(e) => {
                        failed = true;
                        eprintln!("{}\t{}", ip, e.format_colored());
                    }
                }
            }
            Ok(if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::SampleConfig => Ok(ExitCode::SUCCESS),
    }
}
