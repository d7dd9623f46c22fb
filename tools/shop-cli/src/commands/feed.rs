//! RSS feeds from the seeded storefront.

use anyhow::{bail, Context as _, Result};
use shop_web::prelude::*;

use super::{FeedArgs, FeedKind, Storefront};
use crate::context::Context;

/// Render the requested feed as RSS XML.
pub fn render(storefront: &Storefront, kind: FeedKind, store_id: u64) -> Result<String> {
    let mut ctx = storefront.visit(store_id)?;
    let services = storefront.services.clone();
    let result = match kind {
        FeedKind::ActiveDiscussions => BoardsController::new(services).active_discussions_rss(&mut ctx, None)?,
        FeedKind::NewProducts => ProductController::new(services).new_products_rss(&mut ctx)?,
    };
    match result.content_body() {
        Some(xml) => Ok(xml.to_string()),
        None => bail!("The {:?} feed is disabled for store {}", kind, store_id),
    }
}

/// Run the feed command.
pub async fn run(args: FeedArgs, ctx: &Context) -> Result<()> {
    let storefront = Storefront::open(&ctx.config)?;
    let xml = render(&storefront, args.kind, args.store).context("Failed to render feed")?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "feed": format!("{:?}", args.kind), "rss": xml }));
    } else {
        println!("{}", xml);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_web::ShopConfig;

    #[test]
    fn test_new_products_feed_lists_seeded_products() {
        let storefront = Storefront::open(&ShopConfig::default()).unwrap();
        let xml = render(&storefront, FeedKind::NewProducts, 1).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<title>Lumen Book 14</title>"));
    }

    #[test]
    fn test_active_discussions_feed() {
        let storefront = Storefront::open(&ShopConfig::default()).unwrap();
        let xml = render(&storefront, FeedKind::ActiveDiscussions, 1).unwrap();
        assert!(xml.contains("Welcome to the Demo Store forums"));
    }

    #[test]
    fn test_disabled_feed_is_an_error() {
        let config = ShopConfig::from_toml_str(
            r#"
[defaults.forum]
forums_enabled = false

[stores.1]
name = "Demo Store"
url = "http://localhost:8080/"
"#,
        )
        .unwrap();
        let storefront = Storefront::open(&config).unwrap();
        assert!(render(&storefront, FeedKind::ActiveDiscussions, 1).is_err());
    }
}
