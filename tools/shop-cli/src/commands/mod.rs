//! CLI command implementations.

pub mod config;
pub mod demo;
pub mod feed;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand, ValueEnum};
use shop_cache::SessionId;
use shop_domain::StoreId;
use shop_services::seed::seed_demo;
use shop_services::stores::StoreService;
use shop_services::ServiceRegistry;
use shop_web::{ContextFactory, ShopConfig, WorkContext};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Write a default shop.toml in the current directory.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Show stores and effective settings.
    Show {
        /// Only show this store.
        #[arg(short, long)]
        store: Option<u64>,
    },
    /// Check the configuration for problems.
    Validate,
}

/// Arguments for the demo command.
#[derive(Args)]
pub struct DemoArgs {
    /// Store to run against.
    #[arg(short, long, default_value_t = 1)]
    pub store: u64,

    /// Print every view model, not just the summary.
    #[arg(long)]
    pub models: bool,
}

/// Arguments for the feed command.
#[derive(Args)]
pub struct FeedArgs {
    /// Which feed to print.
    #[arg(value_enum)]
    pub kind: FeedKind,

    /// Store to read from.
    #[arg(short, long, default_value_t = 1)]
    pub store: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FeedKind {
    /// Recently active forum topics.
    ActiveDiscussions,
    /// Products marked as new.
    NewProducts,
}

/// A seeded in-memory storefront for the configured stores.
pub struct Storefront {
    pub services: ServiceRegistry,
    pub factory: ContextFactory,
}

impl Storefront {
    /// Seed the demo catalog, then register every configured store that
    /// the seed does not already provide.
    pub fn open(config: &ShopConfig) -> Result<Self> {
        let services = ServiceRegistry::in_memory();
        seed_demo(&services.memory).context("Failed to seed demo data")?;
        for store in config.stores()? {
            if services.stores.get_store_by_id(store.id)?.is_none() {
                tracing::debug!(store_id = %store.id, "adding configured store");
                services.memory.add_store(store)?;
            }
        }
        let factory = ContextFactory::new(services.clone(), config.clone());
        Ok(Self { services, factory })
    }

    /// A fresh visitor session on `store_id`.
    pub fn visit(&self, store_id: u64) -> Result<WorkContext> {
        let store_id = StoreId::new(store_id);
        self.factory
            .resolve(store_id, &SessionId::generate())
            .with_context(|| format!("Store {} is not available", store_id))
    }
}
