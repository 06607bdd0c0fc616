//! `campus`: command-line complaint desk.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use campus_client::HttpComplaintClient;
use campus_common::{AppError, Config};
use campus_core::{
    Actor, AdminActions, CategoryFilter, ComplaintGateway, ComplaintList, ComplaintSource,
    ListQuery, LoadPhase, NormalizeOptions, SortOrder, Status, StatusFilter,
    StoreGateway, StoreScope, StoreSource, TracingNotifier, view,
};
use campus_store::{ComplaintRepository, InMemoryDocumentStore};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "campus", version, about = "Campus Resolve complaint desk")]
struct Cli {
    /// Read and write a JSON snapshot of the document store instead of the
    /// HTTP backend.
    #[arg(long, global = true, env = "CAMPUS_STORE_FILE")]
    store_file: Option<PathBuf>,

    /// Load settings from this file instead of `config/`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List complaints.
    List {
        /// Status tab: all, pending, in-progress, resolved or rejected.
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Category, or all.
        #[arg(long, default_value = "all")]
        category: CategoryFilter,
        /// Case-insensitive text to look for.
        #[arg(long, default_value = "")]
        search: String,
        /// newest or oldest.
        #[arg(long)]
        sort: Option<SortOrder>,
        /// Only this student's complaints.
        #[arg(long)]
        student: Option<String>,
        /// Admin table: search student fields and show actions.
        #[arg(long)]
        admin: bool,
        /// Fill missing priorities from keywords.
        #[arg(long)]
        suggest_priority: bool,
        /// Print rows as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Change a complaint's status.
    Status {
        /// Complaint id.
        id: String,
        /// New status.
        status: Status,
    },
    /// Add an admin comment to a complaint.
    Comment {
        /// Complaint id.
        id: String,
        /// Comment text.
        text: String,
    },
}

/// Where complaints are read from and written to.
struct Backend {
    source: Arc<dyn ComplaintSource>,
    gateway: Arc<dyn ComplaintGateway>,
    snapshot: Option<(Arc<InMemoryDocumentStore>, PathBuf)>,
}

impl Backend {
    fn connect(cli: &Cli, config: &Config, student: Option<&str>) -> anyhow::Result<Self> {
        if let Some(path) = &cli.store_file {
            let store = Arc::new(
                InMemoryDocumentStore::from_file(path)
                    .with_context(|| format!("loading {}", path.display()))?,
            );
            let repo = ComplaintRepository::new(store.clone(), &config.store.complaints_collection);
            let scope = student.map_or(StoreScope::All, |id| StoreScope::Student(id.to_string()));
            info!(path = %path.display(), "Using document-store snapshot");
            return Ok(Self {
                source: Arc::new(StoreSource::new(repo.clone(), scope)),
                gateway: Arc::new(StoreGateway::new(repo)),
                snapshot: Some((store, path.clone())),
            });
        }

        let client = HttpComplaintClient::new(&config.api)?;
        let client = match student {
            Some(id) => client.for_student(id),
            None => client,
        };
        info!(base_url = %config.api.base_url, "Using HTTP backend");
        let client = Arc::new(client);
        Ok(Self {
            source: client.clone(),
            gateway: client,
            snapshot: None,
        })
    }

    /// Write snapshot changes back to disk.
    async fn persist(&self) -> anyhow::Result<()> {
        if let Some((store, path)) = &self.snapshot {
            let snapshot = store.snapshot().await;
            let text = serde_json::to_string_pretty(&snapshot)?;
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
        }
        Ok(())
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let json = config.logging.json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

async fn load(
    backend: &Backend,
    query: ListQuery,
    options: NormalizeOptions,
) -> anyhow::Result<ComplaintList> {
    let mut list = ComplaintList::new(query).with_normalize_options(options);
    list.refresh(backend.source.as_ref(), &TracingNotifier::default())
        .await;
    if let LoadPhase::Failed(message) = list.phase() {
        bail!("{message}");
    }
    Ok(list)
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = err
                .downcast_ref::<AppError>()
                .map_or_else(|| format!("{err:#}"), AppError::user_message);
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    init_tracing(&config);

    let actor = Actor::admin(&config.session.user_id, &config.session.user_name);

    match &cli.command {
        Command::List {
            status,
            category,
            search,
            sort,
            student,
            admin,
            suggest_priority,
            json,
        } => {
            let backend = Backend::connect(&cli, &config, student.as_deref())?;
            let base = if *admin {
                ListQuery::admin()
            } else {
                ListQuery::default()
            };
            let query = ListQuery {
                status: *status,
                category: category.clone(),
                search: search.clone(),
                sort: sort.or(base.sort),
                scope: base.scope,
            };
            let options = NormalizeOptions {
                suggest_missing_priority: *suggest_priority,
            };
            let list = load(&backend, query, options).await?;

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&view::rows(&list, *admin))?
                );
                return Ok(());
            }

            let counts = list.counts();
            let tabs: Vec<String> = std::iter::once(StatusFilter::All)
                .chain(Status::ALL.into_iter().map(StatusFilter::Only))
                .map(|tab| {
                    let label = match tab {
                        StatusFilter::All => "All",
                        StatusFilter::Only(s) => s.label(),
                    };
                    format!("{label} ({})", counts.get(tab))
                })
                .collect();
            println!("{}", tabs.join(" | "));
            for line in view::render(&list, *admin) {
                println!("{line}");
            }
        }
        Command::Status { id, status } => {
            let backend = Backend::connect(&cli, &config, None)?;
            let mut list = load(&backend, ListQuery::admin(), NormalizeOptions::default()).await?;
            let actions = AdminActions::new(
                backend.gateway.clone(),
                Arc::new(TracingNotifier::default()),
                actor,
            );
            actions.change_status(&mut list, id, *status).await?;
            backend.persist().await?;
            print_row(&list, id);
        }
        Command::Comment { id, text } => {
            let backend = Backend::connect(&cli, &config, None)?;
            let mut list = load(&backend, ListQuery::admin(), NormalizeOptions::default()).await?;
            let actions = AdminActions::new(
                backend.gateway.clone(),
                Arc::new(TracingNotifier::default()),
                actor,
            );
            actions.add_comment(&mut list, id, text).await?;
            backend.persist().await?;
            print_row(&list, id);
        }
    }

    Ok(())
}

fn print_row(list: &ComplaintList, id: &str) {
    match list.get(id) {
        Some(complaint) => println!(
            "{}",
            view::ListRow::from_complaint(complaint, false).to_line()
        ),
        None => println!("{id}: not in the loaded list"),
    }
}
