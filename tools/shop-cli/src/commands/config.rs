//! Configuration management commands.

use std::fs;

use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use shop_domain::settings::StoreSettings;
use shop_domain::StoreId;
use shop_services::stores::ThemeRegistry;
use shop_web::config::generate_default_config;
use shop_web::ShopConfig;

use super::{ConfigArgs, ConfigCommand, Storefront};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Init { force } => init_config(force, ctx).await,
        ConfigCommand::Show { store } => show_config(store, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("shop.toml");

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

#[derive(Serialize)]
struct StoreView {
    id: StoreId,
    name: String,
    url: String,
    currency: String,
    ssl_enabled: bool,
    settings: StoreSettings,
}

fn store_views(config: &ShopConfig, only: Option<u64>) -> Result<Vec<StoreView>> {
    let mut views = Vec::new();
    for store in config.stores()? {
        if only.is_some_and(|id| StoreId::new(id) != store.id) {
            continue;
        }
        views.push(StoreView {
            id: store.id,
            settings: config.settings_for(store.id)?,
            name: store.name,
            url: store.url,
            currency: store.primary_currency.code().to_string(),
            ssl_enabled: store.ssl_enabled,
        });
    }
    if let (Some(id), true) = (only, views.is_empty()) {
        bail!("Store {} is not configured", id);
    }
    Ok(views)
}

async fn show_config(store: Option<u64>, ctx: &Context) -> Result<()> {
    let views = store_views(&ctx.config, store)?;

    if ctx.output.is_json() {
        ctx.output.json(&views);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(built-in defaults)"),
    }

    for view in &views {
        ctx.output.info("");
        ctx.output.info(&format!("[stores.{}]", view.id));
        ctx.output.kv("name", &view.name);
        ctx.output.kv("url", &view.url);
        ctx.output.kv("currency", &view.currency);
        ctx.output.kv("ssl_enabled", &view.ssl_enabled.to_string());

        let settings = &view.settings;
        ctx.output.kv("theme", &settings.theme.default_theme);
        ctx.output.kv(
            "registration",
            &format!("{:?}", settings.customer.user_registration_type),
        );
        ctx.output.kv(
            "anonymous_checkout_allowed",
            &settings.order.anonymous_checkout_allowed.to_string(),
        );
        ctx.output.kv("forums_enabled", &settings.forum.forums_enabled.to_string());
        ctx.output.kv(
            "payment_methods",
            &settings.payment.active_payment_method_system_names.join(", "),
        );
    }

    Ok(())
}

/// Installed theme names, as the seeded storefront provides them.
fn installed_themes(config: &ShopConfig) -> Result<Vec<String>> {
    let storefront = Storefront::open(config)?;
    Ok(storefront
        .services
        .themes
        .get_theme_configurations()?
        .into_iter()
        .map(|t| t.system_name)
        .collect())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let themes = installed_themes(&ctx.config)?;
    let problems = ctx.config.validate(&themes);

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "valid": problems.is_empty(),
            "problems": problems,
        }));
    }

    if problems.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for problem in &problems {
        ctx.output.error(&format!("Error: {}", problem));
    }

    bail!("Configuration has {} error(s)", problems.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_views_filter() {
        let config = ShopConfig::default();
        let views = store_views(&config, Some(1)).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].name, "Demo Store");
        assert!(store_views(&config, Some(9)).is_err());
    }

    #[test]
    fn test_generated_config_is_valid() {
        let config = ShopConfig::from_toml_str(&generate_default_config()).unwrap();
        let themes = installed_themes(&config).unwrap();
        assert!(themes.contains(&"DefaultClean".to_string()));
        assert!(config.validate(&themes).is_empty());
    }
}
