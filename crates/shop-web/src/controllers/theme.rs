//! Theme selection.

use shop_domain::customer::CustomerAttribute;
use shop_domain::store::ThemeDescriptor;
use shop_services::ServiceRegistry;

use crate::context::WorkContext;
use crate::error::WebError;
use crate::models::theme::{ThemeModel, ThemeSelectorModel};
use crate::result::{ActionResult, RedirectTarget};
use crate::validation::is_local_url;
use crate::ActionOutcome;

/// Resolves the theme a request renders with.
#[derive(Clone)]
pub struct ThemeContext {
    services: ServiceRegistry,
}

impl ThemeContext {
    pub fn new(services: ServiceRegistry) -> Self {
        Self { services }
    }

    /// The customer's choice when allowed and installed, else the store
    /// default, else the first installed theme.
    pub fn working_theme(&self, ctx: &WorkContext) -> Result<String, WebError> {
        let themes = &self.services.themes;
        if ctx.settings.theme.allow_customer_to_select_theme {
            if let Some(chosen) = ctx.attribute(CustomerAttribute::WorkingThemeName) {
                if let Some(theme) = themes.get_theme(chosen)? {
                    return Ok(theme.system_name);
                }
            }
        }
        if let Some(theme) = themes.get_theme(&ctx.settings.theme.default_theme)? {
            return Ok(theme.system_name);
        }
        let first = themes.get_theme_configurations()?.into_iter().next();
        match first {
            Some(theme) => Ok(theme.system_name),
            None => {
                tracing::warn!(store_id = %ctx.store.id, "no themes installed");
                Ok(ctx.settings.theme.default_theme.clone())
            }
        }
    }

    /// Remember `name` for the current customer if it is installed.
    pub fn set_working_theme(&self, ctx: &mut WorkContext, name: &str) -> Result<bool, WebError> {
        if !ctx.settings.theme.allow_customer_to_select_theme {
            return Ok(false);
        }
        let Some(theme) = self.services.themes.get_theme(name)? else {
            return Ok(false);
        };
        ctx.save_attribute(
            self.services.customers.as_ref(),
            CustomerAttribute::WorkingThemeName,
            Some(theme.system_name),
        )?;
        Ok(true)
    }
}

fn theme_model(theme: ThemeDescriptor) -> ThemeModel {
    ThemeModel {
        name: theme.system_name,
        title: theme.friendly_name,
        preview_image_url: theme.preview_image_url,
    }
}

pub struct ThemeController {
    services: ServiceRegistry,
    theme_context: ThemeContext,
}

impl ThemeController {
    pub fn new(services: ServiceRegistry) -> Self {
        let theme_context = ThemeContext::new(services.clone());
        Self { services, theme_context }
    }

    pub fn selector(&self, ctx: &mut WorkContext) -> ActionOutcome<ThemeSelectorModel> {
        if !ctx.settings.theme.allow_customer_to_select_theme {
            return Ok(ActionResult::Empty);
        }
        let current = self.theme_context.working_theme(ctx)?;
        let available: Vec<ThemeModel> = self
            .services
            .themes
            .get_theme_configurations()?
            .into_iter()
            .map(theme_model)
            .collect();
        let model = ThemeSelectorModel {
            current_theme: available.iter().find(|t| t.name == current).cloned(),
            available_themes: available,
        };
        Ok(ActionResult::view("Theme/Selector", model))
    }

    /// Store the choice and go back to `return_url` when it is local.
    pub fn select_theme(&self, ctx: &mut WorkContext, name: &str, return_url: Option<&str>) -> ActionOutcome<()> {
        if self.theme_context.set_working_theme(ctx, name)? {
            tracing::debug!(customer_id = %ctx.customer.id, theme = name, "theme selected");
        }
        let target = match return_url {
            Some(url) if is_local_url(url) => RedirectTarget::Local(url.to_string()),
            _ => RedirectTarget::HomePage,
        };
        Ok(ActionResult::redirect(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_cache::SessionId;
    use shop_services::seed::{seed_demo, DEMO_STORE_ID};

    use crate::config::ShopConfig;
    use crate::context::ContextFactory;

    fn setup() -> (ServiceRegistry, WorkContext) {
        let services = ServiceRegistry::in_memory();
        seed_demo(&services.memory).unwrap();
        let factory = ContextFactory::new(services.clone(), ShopConfig::default());
        let ctx = factory.resolve(DEMO_STORE_ID, &SessionId::generate()).unwrap();
        (services, ctx)
    }

    #[test]
    fn test_selector_hidden_unless_allowed() {
        let (services, mut ctx) = setup();
        ctx.settings.theme.allow_customer_to_select_theme = false;
        let controller = ThemeController::new(services);
        assert!(matches!(controller.selector(&mut ctx).unwrap(), ActionResult::Empty));
    }

    #[test]
    fn test_select_theme_persists_choice() {
        let (services, mut ctx) = setup();
        ctx.settings.theme.allow_customer_to_select_theme = true;
        let controller = ThemeController::new(services.clone());

        let result = controller.select_theme(&mut ctx, "midnight", Some("/cart")).unwrap();
        assert_eq!(result.redirect_target(), Some(&RedirectTarget::Local("/cart".to_string())));
        assert_eq!(ThemeContext::new(services).working_theme(&ctx).unwrap(), "Midnight");

        let model = controller.selector(&mut ctx).unwrap().into_model().unwrap();
        assert_eq!(model.available_themes.len(), 2);
        assert_eq!(model.current_theme.unwrap().name, "Midnight");
    }

    #[test]
    fn test_unknown_theme_and_external_return_url() {
        let (services, mut ctx) = setup();
        ctx.settings.theme.allow_customer_to_select_theme = true;
        let controller = ThemeController::new(services.clone());

        let result = controller
            .select_theme(&mut ctx, "Neon", Some("https://evil.example/"))
            .unwrap();
        assert_eq!(result.redirect_target(), Some(&RedirectTarget::HomePage));
        assert_eq!(ThemeContext::new(services).working_theme(&ctx).unwrap(), "DefaultClean");
    }

    #[test]
    fn test_falls_back_to_first_installed_theme() {
        let (services, mut ctx) = setup();
        ctx.settings.theme.default_theme = "Retired".to_string();
        assert_eq!(ThemeContext::new(services).working_theme(&ctx).unwrap(), "DefaultClean");
    }
}
