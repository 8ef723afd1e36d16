// ABOUTME: Entry point for the dockwire CLI application.
// ABOUTME: Parses arguments, builds the engine client and dispatches to command handlers.

mod cli;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use dockwire::config::{ClientConfig, ConfigError, Endpoint, EndpointError};
use dockwire::engine::{
    EngineClient, FullEngine, LogOptions, RemoveContainerOptions, SystemOps,
};
use dockwire::stream::StreamOrigin;
use dockwire::types::{ImageRef, ParseImageRefError};
use futures::StreamExt;
use futures::stream::FusedStream;
use output::{Output, OutputMode};
use std::io::Write;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid --host: {0}")]
    Host(#[from] EndpointError),

    #[error("invalid image reference: {0}")]
    ImageRef(#[from] ParseImageRefError),

    #[error(transparent)]
    Engine(#[from] dockwire::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{failed} of {total} containers failed")]
    Partial { failed: usize, total: usize },
}

type CliResult = Result<(), CliError>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut output = Output::new(OutputMode::from_flags(cli.json, cli.quiet));

    if let Err(e) = run(cli, &mut output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &mut Output) -> CliResult {
    let config = client_config(&cli)?;
    let engine = EngineClient::new(&config);

    match cli.command {
        Commands::Ps { all } => ps(&engine, output, all).await,
        Commands::Images { all } => images(&engine, output, all).await,
        Commands::Pull { image } => pull(&engine, output, &image).await,
        Commands::Inspect { target, image } => inspect(&engine, output, &target, image).await,
        Commands::Logs {
            container,
            tail,
            follow,
            timestamps,
        } => {
            let opts = LogOptions {
                follow,
                timestamps,
                tail,
                ..LogOptions::default()
            };
            logs(&engine, &container, &opts).await
        }
        Commands::Rm {
            containers,
            force,
            volumes,
        } => {
            let opts = RemoveContainerOptions {
                force,
                remove_volumes: volumes,
            };
            rm(&engine, output, &containers, &opts).await
        }
        Commands::Stop { containers, time } => {
            stop(&engine, output, &containers, time.map(Duration::from_secs)).await
        }
        Commands::Search { term } => search(&engine, output, &term).await,
        Commands::Info => {
            output.document(&engine.info().await?);
            Ok(())
        }
        Commands::Version => {
            output.document(&engine.version().await?);
            Ok(())
        }
    }
}

/// Config file and environment, then command-line overrides.
fn client_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let cwd = std::env::current_dir()?;
    let mut config = ClientConfig::discover(&cwd)?;

    if let Some(host) = &cli.host {
        config = config.with_host(Endpoint::parse(host)?);
    }
    if let Some(version) = &cli.api_version {
        config = config.with_api_version(version)?;
    }

    tracing::debug!(host = %config.host, "using daemon endpoint");
    Ok(config)
}

async fn ps(engine: &impl FullEngine, output: &Output, all: bool) -> CliResult {
    let containers = engine.list_containers(all).await?;

    let rows: Vec<Vec<String>> = containers
        .iter()
        .map(|c| {
            vec![
                c.container_id().short().to_string(),
                c.image.clone(),
                c.command.clone(),
                c.status.clone(),
                c.name().unwrap_or_default().to_string(),
            ]
        })
        .collect();

    output.table(
        &["CONTAINER ID", "IMAGE", "COMMAND", "STATUS", "NAMES"],
        &rows,
        &containers,
    );
    Ok(())
}

async fn images(engine: &impl FullEngine, output: &Output, all: bool) -> CliResult {
    let images = engine.list_images(all).await?;

    let rows: Vec<Vec<String>> = images
        .iter()
        .map(|image| {
            let (repo, tag) = image.repository_and_tag().unwrap_or(("<none>", "<none>"));
            vec![
                image.image_id().short().to_string(),
                repo.to_string(),
                tag.to_string(),
                human_size(image.size),
            ]
        })
        .collect();

    output.table(&["IMAGE ID", "REPOSITORY", "TAG", "SIZE"], &rows, &images);
    Ok(())
}

async fn pull(engine: &impl FullEngine, output: &mut Output, image: &str) -> CliResult {
    let reference = ImageRef::parse(image)?;
    output.start_timer();

    let mut stream = engine.pull_image_stream(&reference).await?;
    while let Some(item) = stream.next().await {
        match item {
            Ok(record) => output.progress(&record.display_line()),
            Err(e) if stream.has_failed() && stream.is_terminated() => return Err(e.into()),
            Err(e) => tracing::warn!(error = %e, "skipping progress record"),
        }
    }

    output.success(&format!("Pulled {reference}"));
    Ok(())
}

async fn inspect(
    engine: &impl FullEngine,
    output: &Output,
    target: &str,
    image: bool,
) -> CliResult {
    if image {
        output.document(&engine.inspect_image(target).await?);
    } else {
        let id = engine.resolve_container(target).await?;
        output.document(&engine.inspect_container(&id).await?);
    }
    Ok(())
}

async fn logs(engine: &impl FullEngine, container: &str, opts: &LogOptions) -> CliResult {
    let id = engine.resolve_container(container).await?;
    let mut stream = engine.container_logs(&id, opts).await?;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        match chunk.origin {
            StreamOrigin::Stderr => std::io::stderr().write_all(&chunk.data)?,
            StreamOrigin::Stdout | StreamOrigin::Stdin => {
                std::io::stdout().write_all(&chunk.data)?
            }
        }
    }

    std::io::stdout().flush()?;
    Ok(())
}

async fn rm(
    engine: &impl FullEngine,
    output: &Output,
    containers: &[String],
    opts: &RemoveContainerOptions,
) -> CliResult {
    let mut failed = 0;
    let mut ids = Vec::with_capacity(containers.len());

    for name in containers {
        match engine.resolve_container(name).await {
            Ok(id) => ids.push(id),
            Err(e) => {
                output.error(&e.to_string());
                failed += 1;
            }
        }
    }

    let results = engine.remove_containers(&ids, opts).await;
    for (id, result) in ids.iter().zip(results) {
        match result {
            Ok(()) => output.success(id.short()),
            Err(e) => {
                output.error(&e.to_string());
                failed += 1;
            }
        }
    }

    finish_bulk(failed, containers.len())
}

async fn stop(
    engine: &impl FullEngine,
    output: &Output,
    containers: &[String],
    timeout: Option<Duration>,
) -> CliResult {
    let mut failed = 0;

    for name in containers {
        let result = match engine.resolve_container(name).await {
            Ok(id) => engine.stop_container(&id, timeout).await.map(|()| id),
            Err(e) => Err(e),
        };

        match result {
            Ok(id) => output.success(id.short()),
            Err(e) => {
                output.error(&e.to_string());
                failed += 1;
            }
        }
    }

    finish_bulk(failed, containers.len())
}

fn finish_bulk(failed: usize, total: usize) -> CliResult {
    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::Partial { failed, total })
    }
}

async fn search(engine: &impl FullEngine, output: &Output, term: &str) -> CliResult {
    let results = engine.search_images(term).await?;

    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|item| {
            vec![
                item.name.clone(),
                item.description.clone(),
                item.star_count.to_string(),
                if item.is_official { "[OK]" } else { "" }.to_string(),
            ]
        })
        .collect();

    output.table(&["NAME", "DESCRIPTION", "STARS", "OFFICIAL"], &rows, &results);
    Ok(())
}

fn human_size(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];
    let mut value = bytes.max(0) as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        return format!("{value:.0}{}", UNITS[unit]);
    }
    let number = format!("{value:.2}");
    let number = number.trim_end_matches('0').trim_end_matches('.');
    format!("{number}{}", UNITS[unit])
}
