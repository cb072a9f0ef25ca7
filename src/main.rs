use clap::Parser;
use pollboard::api::ServiceApi;
use pollboard::cli::{Cli, Commands};
use pollboard::error::Result;
use pollboard::gateway::HttpGateway;
use pollboard::listener;
use pollboard::logging::LoggingConfig;
use pollboard::service::Service;
use pollboard::synchronizer::{Notice, Synchronizer};
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_config = LoggingConfig::from_args(cli.quiet, cli.verbose > 0, cli.json);
    if let Err(e) = pollboard::logging::init_logging(log_config) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&cli).await {
        let error_response = e.to_error_response();
        match serde_json::to_string_pretty(&error_response) {
            Ok(json) => eprintln!("{}", json),
            Err(_) => eprintln!("{}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let gateway = HttpGateway::new(&cli.base_url);

    match cli.command.clone() {
        Commands::Watch { events_url, topic } => {
            watch(gateway, events_url, topic).await;
        },

        Commands::List => {
            let services = gateway.fetch_all().await?;
            print_services(&services);
        },

        Commands::Add { url, name } => {
            let service = gateway.create_service(&url, &name).await?;
            println!("registered {} ({})", service.name, service.id);
        },

        Commands::Edit { id, url, name } => {
            let service = gateway.update_service(&id, &url, &name).await?;
            println!("updated {} ({})", service.name, service.id);
        },

        Commands::Delete { id } => {
            gateway.delete_service(&id).await?;
            println!("deleted {}", id);
        },
    }

    Ok(())
}

/// Run the full reconciliation loop: listener feeding deltas, synchronizer
/// owning the directory, every snapshot change printed to stdout.
async fn watch(gateway: HttpGateway, events_url: String, topic: String) {
    let (intent_tx, intent_rx) = mpsc::unbounded_channel();
    let (delta_tx, delta_rx) = mpsc::unbounded_channel();

    let (synchronizer, mut notices) = Synchronizer::new(Arc::new(gateway));
    let mut snapshots = synchronizer.watch_snapshots();

    tokio::spawn(listener::run(events_url, topic, delta_tx));
    tokio::spawn(synchronizer.run(intent_rx, delta_rx));

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print_services(&snapshot);
            }
            Some(notice) = notices.recv() => {
                report_notice(notice);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    drop(intent_tx);
}

fn print_services(services: &[Service]) {
    if services.is_empty() {
        println!("(no services)");
        return;
    }
    for service in services {
        println!(
            "{:<7} {:<12} {} ({})",
            service.status.as_str(),
            service.id,
            service.name,
            service.url
        );
    }
}

fn report_notice(notice: Notice) {
    match notice {
        Notice::RefreshFailed { error } => {
            tracing::warn!("directory refresh failed: {}", error);
        },
        Notice::MutationFailed { action, error } => {
            tracing::warn!(?action, "mutation failed: {}", error);
        },
        Notice::EditReady(service) => {
            tracing::info!(id = %service.id, "service ready for editing");
        },
        Notice::EditFailed { id, error } => {
            tracing::warn!(id = %id, "edit lookup failed: {}", error);
        },
    }
}
