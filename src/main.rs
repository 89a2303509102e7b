use clap::Parser;
use log::*;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use releaser_pleaser::{
    ReconcileOutcome, Reconciler, Result,
    cli::{self, Command, RunArgs},
    config::{Config, ReconcileConfig},
    git::Git2Cloner,
    templates::{self, Templates},
};

fn initialize_logger(debug: bool) -> Result<()> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("releaser_pleaser")
        .add_filter_allow_str("rp")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

/// Cancel `token` on Ctrl-C or once `timeout` elapses.
fn spawn_cancellation(token: CancellationToken, timeout: Option<Duration>) {
    tokio::spawn(async move {
        let deadline = async {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => warn!("interrupted: cancelling run"),
            _ = deadline => warn!("timeout reached: cancelling run"),
            _ = token.cancelled() => return,
        }

        token.cancel();
    });
}

async fn run(args: RunArgs, templates: &'static Templates) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    let remote = args.get_remote(&config)?;
    let clients = remote.get_forge().await?;

    let reconciler = Reconciler::new(
        ReconcileConfig::from_config(&config, &args.branch)?,
        clients,
        Box::new(Git2Cloner),
        templates,
    );

    let cancel = CancellationToken::new();
    spawn_cancellation(cancel.clone(), args.timeout.map(Duration::from_secs));

    let outcome = reconciler.run(&cancel).await;
    cancel.cancel();

    match outcome? {
        ReconcileOutcome::NothingToRelease => {
            info!("nothing to release");
        }
        ReconcileOutcome::Reconciled {
            version,
            commit,
            pull_request,
        } => {
            info!(
                "release pull request #{} proposes {} at {commit}",
                pull_request.id, version.tag_name
            );
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli_args = cli::Args::parse();

    initialize_logger(cli_args.debug)?;

    let templates = templates::init()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli_args.command {
        Command::Run(args) => runtime.block_on(run(args, templates)),
    }
}
