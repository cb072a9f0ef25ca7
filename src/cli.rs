use clap::{Parser, Subcommand};

use crate::listener::UPDATES_TOPIC;

#[derive(Parser, Clone)]
#[command(name = "pollboard")]
#[command(about = "Terminal client for a service-poller dashboard backend")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output (-q)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output logs in JSON format
    #[arg(long)]
    pub json: bool,

    /// Base URL of the service CRUD API
    #[arg(
        long,
        env = "POLLBOARD_BASE_URL",
        default_value = "http://127.0.0.1:8080"
    )]
    pub base_url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Follow the directory and print every change
    Watch {
        /// WebSocket URL of the status update channel
        #[arg(
            long,
            env = "POLLBOARD_EVENTS_URL",
            default_value = "ws://127.0.0.1:8080/eventbus"
        )]
        events_url: String,

        /// Topic carrying the poller's status updates
        #[arg(long, default_value = UPDATES_TOPIC)]
        topic: String,
    },

    /// List monitored services
    List,

    /// Register a new service
    Add {
        /// Target URL to monitor
        url: String,
        /// Display name
        name: String,
    },

    /// Update a service's url and name
    Edit {
        /// Service identifier
        id: String,
        /// New target URL
        url: String,
        /// New display name
        name: String,
    },

    /// Remove a service
    Delete {
        /// Service identifier
        id: String,
    },
}
