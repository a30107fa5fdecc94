mod catalog;
mod cli;
mod config;
mod metrics;
mod prober;
mod report;
mod resolver;
mod server;

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use catalog::{Catalog, Locale};
use cli::{Cli, Command};
use config::{AppConfig, LogFormat};
use prober::StatusProbe;
use prober::slp::SlpProbe;
use report::StatusReport;
use resolver::{DnsSrvLookup, Resolver};
use server::AppState;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).await?;
    let log_level = match cli.log_level {
        Some(level) => level.to_level(),
        None => config.get_tracing_level()?,
    };

    // Init tracing with configured log level
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("mcprobe={}", log_level.as_str().to_lowercase()).parse()?);
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }

    let catalog = Catalog::new(match &config.locale {
        Some(tag) => Locale::from_tag(tag),
        None => Locale::from_env(),
    });
    let resolver = Resolver::new(DnsSrvLookup::new(config.dns_timeout()), config.srv_patterns.clone());

    match cli.command {
        Command::Query { json, address } => {
            let Some(resolved) = resolve_or_report(&resolver, &catalog, &address).await else {
                return Ok(ExitCode::FAILURE);
            };
            let target = resolved.target;
            let result = SlpProbe::new(config.probe_timeout()).probe(&target).await;
            if let Err(e) = &result {
                info!("status probe {} failed: {}", target, e);
            }
            if json {
                let report = match &result {
                    Ok(status) => StatusReport::online(&target, status),
                    Err(e) => StatusReport::failed(&target, e),
                };
                println!("{}", serde_json::to_string(&report)?);
            } else {
                print!("{}", report::render_text(&catalog, &target, &result));
            }
            Ok(if result.is_ok() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Command::Resolve { address } => {
            let Some(resolved) = resolve_or_report(&resolver, &catalog, &address).await else {
                return Ok(ExitCode::FAILURE);
            };
            println!("{} ({})", resolved.target, resolved.via);
            Ok(ExitCode::SUCCESS)
        }
        Command::Server { port } => {
            println!("{}{}", catalog.get("app.server.startListenOn"), port);
            let state = Arc::new(AppState {
                resolver,
                probe: SlpProbe::new(config.probe_timeout()),
                catalog,
            });
            let addr: SocketAddr = ([0, 0, 0, 0], port).into();
            println!(
                "{}http://localhost:{port}/api?youraddress{}http://localhost:{port}/api?youraddress:yourport",
                catalog.get("app.server.started"),
                catalog.get("app.server.or"),
            );
            info!("listening on {} (metrics {})", addr, if config.metrics { "on" } else { "off" });

            tokio::select! {
                _ = server::serve(addr, state, config.metrics) => {}
                res = tokio::signal::ctrl_c() => {
                    if let Err(e) = res {
                        error!("waiting for ctrl-c failed: {:?}", e);
                    }
                    info!("shutting down");
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn resolve_or_report(
    resolver: &Resolver<DnsSrvLookup>,
    catalog: &Catalog,
    address: &str,
) -> Option<resolver::Resolved> {
    match resolver.resolve_detailed(address).await {
        Ok(resolved) => {
            info!("{:?} resolved to {} via {}", address, resolved.target, resolved.via);
            Some(resolved)
        }
        Err(e) => {
            eprintln!("{}{}", catalog.get("app.error.addressAnalyzeFailed"), catalog.describe(&e));
            None
        }
    }
}
