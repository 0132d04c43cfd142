use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deposit_core::{
    error_labels::LabelTable, feedback::present, navigation::Location, DeleteOptions,
    DepositController, DepositDispatch, DepositError, DepositState, DepositStore,
    LoggingNavigator, RestDepositApi,
};
use shared::domain::{Community, CommunityId, Draft};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;

#[derive(Parser, Debug)]
#[command(name = "deposit", about = "Run draft lifecycle operations against a repository backend")]
struct Args {
    /// Settings file; missing files fall back to defaults and environment.
    #[arg(long, default_value = "deposit.toml")]
    config: PathBuf,
    /// Community to submit the draft to. Defaults to the draft's current review receiver.
    #[arg(long, global = true, conflicts_with = "no_community")]
    community: Option<Uuid>,
    /// Clear the community selection, removing any pending review request on save.
    #[arg(long, global = true)]
    no_community: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Save {
        draft: PathBuf,
    },
    Publish {
        draft: PathBuf,
    },
    SubmitReview {
        draft: PathBuf,
    },
    Preview {
        draft: PathBuf,
    },
    Delete {
        draft: PathBuf,
        #[arg(long)]
        discarding_version: bool,
    },
    ReservePid {
        draft: PathBuf,
        #[arg(default_value = "doi")]
        pid_type: String,
    },
    DiscardPid {
        draft: PathBuf,
        #[arg(default_value = "doi")]
        pid_type: String,
    },
}

impl Command {
    fn draft_path(&self) -> &PathBuf {
        match self {
            Command::Save { draft }
            | Command::Publish { draft }
            | Command::SubmitReview { draft }
            | Command::Preview { draft }
            | Command::Delete { draft, .. }
            | Command::ReservePid { draft, .. }
            | Command::DiscardPid { draft, .. } => draft,
        }
    }
}

fn read_draft(path: &PathBuf) -> Result<Draft> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read draft '{}'", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("'{}' is not a draft record", path.display()))
}

fn selected_community(args: &Args, draft: &Draft) -> Option<Community> {
    if args.no_community {
        return None;
    }
    let id = match args.community {
        Some(id) => CommunityId(id),
        None => draft.review()?.community()?,
    };
    Some(Community {
        id,
        slug: None,
        title: None,
    })
}

async fn run(
    controller: &DepositController,
    command: &Command,
    draft: &Draft,
) -> Result<(), DepositError> {
    match command {
        Command::Save { .. } => controller.save(draft).await.map(|_| ()),
        Command::Publish { .. } => controller.publish(draft).await.map(|_| ()),
        Command::SubmitReview { .. } => controller.submit_review(draft).await.map(|_| ()),
        Command::Preview { .. } => controller.preview(draft).await,
        Command::Delete {
            discarding_version, ..
        } => {
            controller
                .delete(DeleteOptions {
                    is_discarding_version: *discarding_version,
                })
                .await
        }
        Command::ReservePid { pid_type, .. } => {
            controller.reserve_pid(draft, pid_type).await.map(|_| ())
        }
        Command::DiscardPid { pid_type, .. } => {
            controller.discard_pid(draft, pid_type).await.map(|_| ())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let settings = config::load_settings(&args.config)?;
    info!(api_url = %settings.api_url, ui_url = %settings.ui_url, "deposit client configured");

    let draft = read_draft(args.command.draft_path())?;
    let selected = selected_community(&args, &draft);

    let api = RestDepositApi::with_options(
        settings.api_url.clone(),
        settings.access_token.clone(),
        Duration::from_secs(settings.request_timeout_secs),
    )?;
    let navigator = Arc::new(LoggingNavigator::new(config::ui_base(&settings)?));
    let store = DepositStore::new(DepositState::new(draft.clone(), selected));
    let controller = DepositController::new(Arc::new(api), store.clone(), navigator.clone());

    let outcome = run(&controller, &args.command, &draft).await;

    let state = store.deposit().await;
    if let Some(feedback) = present(&state, &LabelTable::default()) {
        println!("{feedback}");
    }
    match navigator.last() {
        Some(Location::Replaced(url)) => println!("Address: {url}"),
        Some(Location::Navigated(url)) => println!("Next: {url}"),
        None => {}
    }
    if let Some(id) = &state.record.id {
        println!("Draft: {id}");
    }

    if let Err(err) = outcome {
        warn!(error = %err, "deposit operation failed");
        return Err(err.into());
    }
    Ok(())
}
