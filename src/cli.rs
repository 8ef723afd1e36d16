// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the global connection flags and all subcommands.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dockwire")]
#[command(about = "Talk to a container engine daemon over its remote API")]
#[command(version)]
pub struct Cli {
    /// Daemon endpoint (unix:///path, tcp://host:port); overrides DOCKER_HOST
    #[arg(short = 'H', long, global = true)]
    pub host: Option<String>,

    /// Pin the API version used in request paths (e.g. 1.43)
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON lines
    #[arg(long, global = true, conflicts_with = "quiet")]
    pub json: bool,

    /// Print only ids and final results
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List containers
    Ps {
        /// Include stopped containers
        #[arg(short, long)]
        all: bool,
    },

    /// List images
    Images {
        /// Include intermediate images
        #[arg(short, long)]
        all: bool,
    },

    /// Pull an image from a registry
    Pull {
        /// Image reference, e.g. busybox:1.36
        image: String,
    },

    /// Show details of a container (or an image with --image)
    Inspect {
        /// Container id, name or unique id prefix
        target: String,

        /// Treat the target as an image
        #[arg(long)]
        image: bool,
    },

    /// Print container logs
    Logs {
        /// Container id, name or unique id prefix
        container: String,

        /// Number of lines to show from the end
        #[arg(short = 'n', long)]
        tail: Option<u64>,

        /// Follow log output
        #[arg(short, long)]
        follow: bool,

        /// Show timestamps
        #[arg(short, long)]
        timestamps: bool,
    },

    /// Remove one or more containers
    Rm {
        /// Container ids, names or unique id prefixes
        #[arg(required = true)]
        containers: Vec<String>,

        /// Kill and remove running containers
        #[arg(short, long)]
        force: bool,

        /// Also remove anonymous volumes
        #[arg(long)]
        volumes: bool,
    },

    /// Stop one or more running containers
    Stop {
        /// Container ids, names or unique id prefixes
        #[arg(required = true)]
        containers: Vec<String>,

        /// Seconds to wait before killing
        #[arg(short, long)]
        time: Option<u64>,
    },

    /// Search the registry for images
    Search {
        term: String,
    },

    /// Show daemon-wide information
    Info,

    /// Show daemon version
    Version,
}
