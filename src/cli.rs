//! CLI surface for the companion core.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use micropebble_app::{Service, ServiceKind, ServiceRegistry, Settings};
use micropebble_core::prelude::*;
use micropebble_core::{deeplink, NavTarget};
use micropebble_store::{AppstoreCollectionPage, AppstoreSource, CollectionPager};
use micropebble_watch::validate_firmware_file;

/// Headless companion core for Pebble-family smartwatches
#[derive(Parser, Debug)]
#[command(name = "micropebble")]
#[command(about = "Browse the app store, manage sources, validate firmware", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// App-store browsing
    Store {
        #[command(subcommand)]
        command: StoreCommand,
    },
    /// Manage app-store sources
    Sources {
        #[command(subcommand)]
        command: SourcesCommand,
    },
    /// Firmware archive helpers
    Firmware {
        #[command(subcommand)]
        command: FirmwareCommand,
    },
    /// Resolve a deep-link URI to its in-app target
    Resolve {
        /// URI to resolve (content:// or micropebble://)
        uri: String,
    },
    /// Crash-report plumbing
    Crash {
        #[command(subcommand)]
        command: CrashCommand,
    },
    /// Print the path of the current log file
    Logs,
}

#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// Fetch and print the store home document
    Home {
        /// Watch platform (basalt, chalk, ...)
        #[arg(long)]
        platform: Option<String>,
    },
    /// Walk a paginated collection endpoint
    Collection {
        /// Collection URL (initial page endpoint)
        url: String,
        /// Number of pages to walk forward
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
}

#[derive(Subcommand, Debug)]
enum SourcesCommand {
    /// List sources in order
    List,
    /// Append a new source
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
    },
    /// Remove a source by id
    Remove { id: Uuid },
    /// Toggle a source's enabled flag
    Toggle { id: Uuid },
    /// Move a source to a new position
    Move { id: Uuid, index: usize },
    /// Restore the canonical default list
    Reset,
}

#[derive(Subcommand, Debug)]
enum FirmwareCommand {
    /// Check that a file is a valid firmware archive (.pbz)
    Validate { file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum CrashCommand {
    /// Print and clear the pending crash report, if any
    Pending,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let settings = Settings::load_default()?;
        let services = ServiceRegistry::with_defaults();
        debug!(endpoint = %settings.store.endpoint, "settings loaded");

        let reporter = crash_reporter(&settings, &services)?;
        reporter.install_panic_hook();

        match self.command {
            Command::Store { command } => run_store(command, &settings, &services).await,
            Command::Sources { command } => run_sources(command, &settings, &services).await,
            Command::Firmware { command } => run_firmware(command),
            Command::Resolve { uri } => run_resolve(&uri),
            Command::Crash { command } => run_crash(command, &settings, &services),
            Command::Logs => {
                println!("{}", micropebble_core::logging::get_current_log_file()?.display());
                Ok(())
            }
        }
    }
}

fn store_client(
    settings: &Settings,
    services: &ServiceRegistry,
) -> Result<micropebble_store::StoreClient> {
    match services.create(ServiceKind::StoreClient, settings)? {
        Service::StoreClient(client) => Ok(client),
        _ => Err(Error::config("store-client factory returned wrong service")),
    }
}

fn source_registry(
    settings: &Settings,
    services: &ServiceRegistry,
) -> Result<std::sync::Arc<micropebble_store::SourceRegistry>> {
    match services.create(ServiceKind::SourceRegistry, settings)? {
        Service::SourceRegistry(registry) => Ok(registry),
        _ => Err(Error::config(
            "source-registry factory returned wrong service",
        )),
    }
}

async fn run_store(
    command: StoreCommand,
    settings: &Settings,
    services: &ServiceRegistry,
) -> Result<()> {
    let client = store_client(settings, services)?;

    match command {
        StoreCommand::Home { platform } => {
            let platform = platform.unwrap_or_else(|| settings.store.platform.clone());
            let home = client
                .fetch_home(&settings.store.endpoint, &platform)
                .await?;
            println!(
                "{} applications, {} categories, {} collections",
                home.applications.len(),
                home.categories.len(),
                home.collections.len()
            );
            for collection in &home.collections {
                println!("  collection: {}", collection.name);
            }
            Ok(())
        }
        StoreCommand::Collection { url, pages } => {
            let mut pager = CollectionPager::new(client, url);
            let emit = |outcome: Outcome<AppstoreCollectionPage>| match outcome {
                Outcome::Progress(_) => eprintln!("fetching..."),
                Outcome::Success(page) => {
                    for app in &page.apps {
                        println!("{}  {}  ({})", app.id, app.title, app.author);
                    }
                }
                Outcome::Error(e) => eprintln!("error: {e}"),
            };

            pager.load(&emit).await;
            for _ in 1..pages {
                if pager.has_found_end()
                    && pager.current_page() + 1 >= pager.cached_pages()
                {
                    break;
                }
                pager.next_page(&emit).await;
            }
            Ok(())
        }
    }
}

async fn run_sources(
    command: SourcesCommand,
    settings: &Settings,
    services: &ServiceRegistry,
) -> Result<()> {
    let registry = source_registry(settings, services)?;

    match command {
        SourcesCommand::List => {
            for (i, source) in registry.sources().await.iter().enumerate() {
                let flag = if source.enabled { " " } else { "✗" };
                println!("{i}. [{flag}] {}  {}  ({})", source.name, source.url, source.id);
            }
            if registry.is_default_sources().await {
                println!("(default source list)");
            }
        }
        SourcesCommand::Add { name, url } => {
            let source = AppstoreSource::new(name, url);
            let id = source.id;
            registry.add(source).await?;
            println!("added {id}");
        }
        SourcesCommand::Remove { id } => {
            registry.remove(id).await?;
        }
        SourcesCommand::Toggle { id } => {
            let current = registry
                .sources()
                .await
                .into_iter()
                .find(|s| s.id == id)
                .ok_or_else(|| Error::validation(format!("no source with id {id}")))?;
            let mut updated = current;
            updated.enabled = !updated.enabled;
            registry.replace(updated).await?;
        }
        SourcesCommand::Move { id, index } => {
            let source = registry
                .sources()
                .await
                .into_iter()
                .find(|s| s.id == id)
                .ok_or_else(|| Error::validation(format!("no source with id {id}")))?;
            registry.reorder(&source, index).await?;
        }
        SourcesCommand::Reset => {
            if registry.is_default_sources().await {
                println!("sources already default");
            } else {
                registry.restore_defaults().await?;
                println!("sources restored to defaults");
            }
        }
    }
    Ok(())
}

fn run_firmware(command: FirmwareCommand) -> Result<()> {
    match command {
        FirmwareCommand::Validate { file } => {
            validate_firmware_file(&file)?;
            println!("{} looks like a firmware archive", file.display());
            Ok(())
        }
    }
}

fn run_resolve(uri: &str) -> Result<()> {
    match deeplink::parse(uri) {
        Some(NavTarget::WatchApps) => println!("navigate: watch apps"),
        Some(NavTarget::SideloadApp { uri }) => println!("navigate: sideload app from {uri}"),
        Some(NavTarget::SideloadFirmware { uri }) => {
            println!("navigate: sideload firmware from {uri}")
        }
        None => println!("not a micropebble link"),
    }
    Ok(())
}

fn crash_reporter(
    settings: &Settings,
    services: &ServiceRegistry,
) -> Result<std::sync::Arc<micropebble_app::CrashReporter>> {
    match services.create(ServiceKind::CrashReporter, settings)? {
        Service::CrashReporter(reporter) => Ok(reporter),
        _ => Err(Error::config(
            "crash-reporter factory returned wrong service",
        )),
    }
}

fn run_crash(
    command: CrashCommand,
    settings: &Settings,
    services: &ServiceRegistry,
) -> Result<()> {
    let reporter = crash_reporter(settings, services)?;

    match command {
        CrashCommand::Pending => {
            match reporter.take_pending_report() {
                Some(report) => println!("{report}"),
                None => println!("no pending crash report"),
            }
            Ok(())
        }
    }
}
