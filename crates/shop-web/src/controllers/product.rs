//! Product pages, reviews, the compare list and related product blocks.

use serde_json::json;
use shop_domain::prelude::*;
use shop_services::catalog::{ProductSearch, ProductSortingEnum};
use shop_services::ServiceRegistry;
use validator::Validate;

use crate::context::WorkContext;
use crate::error::WebError;
use crate::feed::{SyndicationFeed, SyndicationItem};
use crate::helpers::{CatalogCacheEvent, CatalogHelper};
use crate::models::catalog::{
    CompareProductsModel, ProductDetailsModel, ProductEmailAFriendForm, ProductEmailAFriendModel,
    ProductOverviewModel, ProductOverviewOptions, ProductReviewForm, ProductReviewsModel,
};
use crate::result::{ActionResult, ModelState, RedirectTarget};
use crate::validation;
use crate::ActionOutcome;

/// Put `id` in front of a most-recent-first id list and cap its length.
fn push_recent(list: Vec<ProductId>, id: ProductId, max: usize) -> String {
    std::iter::once(id)
        .chain(list.into_iter().filter(|existing| *existing != id))
        .take(max.max(1))
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub struct ProductController {
    services: ServiceRegistry,
    catalog: CatalogHelper,
}

impl ProductController {
    pub fn new(services: ServiceRegistry) -> Self {
        let catalog = CatalogHelper::new(services.clone());
        Self { services, catalog }
    }

    fn visible_product(&self, ctx: &WorkContext, id: ProductId) -> Result<Option<Product>, WebError> {
        Ok(self
            .services
            .products
            .get_product_by_id(id)?
            .filter(|p| p.is_visible(ctx.store.id)))
    }

    /// Products from an id list attribute, keeping the list order.
    fn products_from_attribute(&self, ctx: &WorkContext, key: CustomerAttribute) -> Result<Vec<Product>, WebError> {
        let ids: Vec<ProductId> = ctx.customer.id_list_attribute(ctx.store.id, key);
        Ok(self
            .services
            .products
            .get_products_by_ids(&ids)?
            .into_iter()
            .filter(|p| p.is_visible(ctx.store.id))
            .collect())
    }

    fn record_recently_viewed(&self, ctx: &mut WorkContext, id: ProductId) -> Result<(), WebError> {
        let catalog = &ctx.settings.catalog;
        if !catalog.recently_viewed_products_enabled {
            return Ok(());
        }
        let max = catalog.recently_viewed_products_number;
        let current = ctx
            .customer
            .id_list_attribute(ctx.store.id, CustomerAttribute::RecentlyViewedProducts);
        let value = push_recent(current, id, max);
        ctx.save_attribute(
            self.services.customers.as_ref(),
            CustomerAttribute::RecentlyViewedProducts,
            Some(value),
        )?;
        Ok(())
    }

    /// Product page. `updated_cart_item_id` preloads the page from a cart
    /// line the customer is editing.
    pub fn product_details(
        &self,
        ctx: &mut WorkContext,
        id: ProductId,
        updated_cart_item_id: Option<CartItemId>,
    ) -> ActionOutcome<ProductDetailsModel> {
        let Some(product) = self.visible_product(ctx, id)? else {
            return Ok(ActionResult::NotFound);
        };
        let updated_item = match updated_cart_item_id {
            Some(item_id) => self
                .services
                .cart
                .get_cart_item(item_id)?
                .filter(|item| item.customer_id == ctx.customer.id && item.product_id == product.id),
            None => None,
        };
        let model = self
            .catalog
            .prepare_product_details_model(ctx, &product, updated_item.as_ref())?;
        self.record_recently_viewed(ctx, product.id)?;
        Ok(ActionResult::view("Product/Details", model))
    }

    pub fn product_reviews(&self, ctx: &mut WorkContext, id: ProductId) -> ActionOutcome<ProductReviewsModel> {
        let Some(product) = self.visible_product(ctx, id)? else {
            return Ok(ActionResult::NotFound);
        };
        if !ctx.settings.catalog.product_reviews_enabled || !product.allow_customer_reviews {
            return Ok(ActionResult::redirect(RedirectTarget::Product(product.id)));
        }
        let model = self.catalog.prepare_product_reviews_model(ctx, &product)?;
        Ok(ActionResult::view("Product/Reviews", model))
    }

    pub fn product_reviews_add(
        &self,
        ctx: &mut WorkContext,
        id: ProductId,
        form: &ProductReviewForm,
    ) -> ActionOutcome<ProductReviewsModel> {
        let Some(product) = self.visible_product(ctx, id)? else {
            return Ok(ActionResult::NotFound);
        };
        let catalog = &ctx.settings.catalog;
        if !catalog.product_reviews_enabled || !product.allow_customer_reviews {
            return Ok(ActionResult::redirect(RedirectTarget::Product(product.id)));
        }

        let mut state = ModelState::new();
        if ctx.is_guest() && !catalog.allow_anonymous_users_to_review_product {
            state.add_summary("Only registered users can write reviews");
        }
        validation::collect(&mut state, "", form.validate());
        if !state.is_valid() {
            let mut model = self.catalog.prepare_product_reviews_model(ctx, &product)?;
            model.add_product_review.title = form.title.clone();
            model.add_product_review.review_text = form.review_text.clone();
            model.add_product_review.rating = form.rating;
            return Ok(ActionResult::view_with_state("Product/Reviews", model, state));
        }

        let is_approved = !catalog.product_reviews_must_be_approved;
        let review = self.services.reviews.insert_review(ProductReview {
            id: ReviewId::default(),
            product_id: product.id,
            store_id: ctx.store.id,
            customer_id: ctx.customer.id,
            title: form.title.trim().to_string(),
            review_text: form.review_text.trim().to_string(),
            rating: form.rating.clamp(1, 5),
            is_approved,
            helpfulness: Vec::new(),
            created_at: current_timestamp(),
        })?;
        self.services
            .messages
            .send_product_review_notification(&ctx.store, &product, &review)?;
        tracing::info!(product_id = %product.id, review_id = %review.id, is_approved, "product review added");
        self.catalog.invalidate(CatalogCacheEvent::ProductChanged(product.id))?;

        // Ratings are recalculated on insert.
        let product = self.visible_product(ctx, id)?.unwrap_or(product);
        let mut model = self.catalog.prepare_product_reviews_model(ctx, &product)?;
        model.add_product_review.success_message = Some(if is_approved {
            "Product review is successfully added.".to_string()
        } else {
            "You will see the product review after approving by a store administrator.".to_string()
        });
        Ok(ActionResult::view("Product/Reviews", model))
    }

    /// Vote on a review. Answers `{ Result, TotalYes, TotalNo }`.
    pub fn set_review_helpfulness(
        &self,
        ctx: &mut WorkContext,
        review_id: ReviewId,
        was_helpful: bool,
    ) -> ActionOutcome<()> {
        let Some(mut review) = self.services.reviews.get_review_by_id(review_id)? else {
            return Ok(ActionResult::NotFound);
        };
        let totals = |review: &ProductReview, message: &str| {
            json!({
                "Result": message,
                "TotalYes": review.helpful_yes_total(),
                "TotalNo": review.helpful_no_total(),
            })
        };
        if ctx.is_guest() && !ctx.settings.catalog.allow_anonymous_users_to_review_product {
            return Ok(ActionResult::json(totals(
                &review,
                "Only registered customers can set review helpfulness",
            )));
        }
        if review.customer_id == ctx.customer.id {
            return Ok(ActionResult::json(totals(&review, "You cannot vote for your own review")));
        }
        review.vote(ctx.customer.id, was_helpful);
        self.services.reviews.update_review(&review)?;
        Ok(ActionResult::json(totals(&review, "Successfully voted")))
    }

    pub fn recently_viewed_products(&self, ctx: &mut WorkContext) -> ActionOutcome<Vec<ProductOverviewModel>> {
        if !ctx.settings.catalog.recently_viewed_products_enabled {
            return Ok(ActionResult::Empty);
        }
        let mut products = self.products_from_attribute(ctx, CustomerAttribute::RecentlyViewedProducts)?;
        products.truncate(ctx.settings.catalog.recently_viewed_products_number);
        let models = self
            .catalog
            .prepare_product_overview_models(ctx, &products, ProductOverviewOptions::default())?;
        Ok(ActionResult::view("Product/RecentlyViewedProducts", models))
    }

    fn new_product_list(&self, ctx: &WorkContext) -> Result<Vec<Product>, WebError> {
        let found = self.services.products.search_products(&ProductSearch {
            store_id: ctx.store.id,
            visible_individually_only: true,
            mark_as_new_only: true,
            order_by: ProductSortingEnum::CreatedOn,
            page_index: 0,
            page_size: ctx.settings.catalog.new_products_number,
            ..Default::default()
        })?;
        Ok(found.items)
    }

    pub fn new_products(&self, ctx: &mut WorkContext) -> ActionOutcome<Vec<ProductOverviewModel>> {
        if !ctx.settings.catalog.new_products_enabled {
            return Ok(ActionResult::NotFound);
        }
        let products = self.new_product_list(ctx)?;
        let models = self
            .catalog
            .prepare_product_overview_models(ctx, &products, ProductOverviewOptions::default())?;
        Ok(ActionResult::view("Product/NewProducts", models))
    }

    pub fn new_products_rss(&self, ctx: &mut WorkContext) -> ActionOutcome<()> {
        if !ctx.settings.catalog.new_products_enabled {
            return Ok(ActionResult::NotFound);
        }
        let products = self.new_product_list(ctx)?;
        let mut feed = SyndicationFeed::new(
            format!("{}: New products", ctx.store.name),
            "Information about products",
            ctx.store.absolute_url("/newproducts"),
            current_timestamp(),
        );
        feed.items = products
            .iter()
            .map(|product| SyndicationItem {
                title: product.name.clone(),
                description: product.short_description.clone(),
                link: ctx
                    .store
                    .absolute_url(&RedirectTarget::Product(product.id).path()),
                id: product.id.to_string(),
                published_at: product.created_at,
            })
            .collect();
        Ok(ActionResult::rss(feed.to_rss()))
    }

    pub fn home_page_products(&self, ctx: &mut WorkContext) -> ActionOutcome<Vec<ProductOverviewModel>> {
        let found = self.services.products.search_products(&ProductSearch {
            store_id: ctx.store.id,
            visible_individually_only: true,
            featured_on_home_page_only: true,
            ..Default::default()
        })?;
        let models = self
            .catalog
            .prepare_product_overview_models(ctx, &found.items, ProductOverviewOptions::default())?;
        Ok(ActionResult::view("Product/HomePageProducts", models))
    }

    pub fn compare_products(&self, ctx: &mut WorkContext) -> ActionOutcome<CompareProductsModel> {
        let catalog = &ctx.settings.catalog;
        if !catalog.compare_products_enabled {
            return Ok(ActionResult::redirect(RedirectTarget::HomePage));
        }
        let products = self.products_from_attribute(ctx, CustomerAttribute::CompareProducts)?;
        let options = ProductOverviewOptions {
            prepare_specifications: true,
            ..Default::default()
        };
        let model = CompareProductsModel {
            include_short_description: catalog.include_short_description_in_compare_products,
            include_full_description: catalog.include_full_description_in_compare_products,
            products: self.catalog.prepare_product_overview_models(ctx, &products, options)?,
        };
        Ok(ActionResult::view("Product/CompareProducts", model))
    }

    /// Answers `{ success, message }`.
    pub fn add_product_to_compare_list(&self, ctx: &mut WorkContext, id: ProductId) -> ActionOutcome<()> {
        let catalog = &ctx.settings.catalog;
        if !catalog.compare_products_enabled {
            return Ok(ActionResult::json(json!({
                "success": false,
                "message": "Product comparison is disabled",
            })));
        }
        let Some(product) = self.visible_product(ctx, id)? else {
            return Ok(ActionResult::json(json!({
                "success": false,
                "message": "No product found with the specified ID",
            })));
        };
        let max = catalog.compare_products_number;
        let current = ctx
            .customer
            .id_list_attribute(ctx.store.id, CustomerAttribute::CompareProducts);
        let value = push_recent(current, product.id, max);
        ctx.save_attribute(self.services.customers.as_ref(), CustomerAttribute::CompareProducts, Some(value))?;
        Ok(ActionResult::json(json!({
            "success": true,
            "message": "The product has been added to your product comparison",
        })))
    }

    pub fn remove_product_from_compare_list(&self, ctx: &mut WorkContext, id: ProductId) -> ActionOutcome<()> {
        if !ctx.settings.catalog.compare_products_enabled {
            return Ok(ActionResult::redirect(RedirectTarget::HomePage));
        }
        let remaining: Vec<String> = ctx
            .customer
            .id_list_attribute::<ProductId>(ctx.store.id, CustomerAttribute::CompareProducts)
            .into_iter()
            .filter(|existing| *existing != id)
            .map(|id| id.to_string())
            .collect();
        let value = (!remaining.is_empty()).then(|| remaining.join(","));
        ctx.save_attribute(self.services.customers.as_ref(), CustomerAttribute::CompareProducts, value)?;
        Ok(ActionResult::redirect(RedirectTarget::CompareProducts))
    }

    pub fn clear_compare_list(&self, ctx: &mut WorkContext) -> ActionOutcome<()> {
        if !ctx.settings.catalog.compare_products_enabled {
            return Ok(ActionResult::redirect(RedirectTarget::HomePage));
        }
        ctx.save_attribute(self.services.customers.as_ref(), CustomerAttribute::CompareProducts, None)?;
        Ok(ActionResult::redirect(RedirectTarget::CompareProducts))
    }

    fn email_a_friend_allowed(ctx: &WorkContext) -> bool {
        let catalog = &ctx.settings.catalog;
        catalog.email_a_friend_enabled && (!ctx.is_guest() || catalog.allow_anonymous_users_to_email_a_friend)
    }

    pub fn product_email_a_friend_form(
        &self,
        ctx: &mut WorkContext,
        id: ProductId,
    ) -> ActionOutcome<ProductEmailAFriendModel> {
        let Some(product) = self.visible_product(ctx, id)? else {
            return Ok(ActionResult::NotFound);
        };
        if !ctx.settings.catalog.email_a_friend_enabled {
            return Ok(ActionResult::redirect(RedirectTarget::Product(product.id)));
        }
        let model = ProductEmailAFriendModel {
            product_id: product.id,
            product_name: product.name.clone(),
            your_email_address: ctx.customer.email.clone().unwrap_or_default(),
            ..Default::default()
        };
        Ok(ActionResult::view("Product/EmailAFriend", model))
    }

    pub fn product_email_a_friend(
        &self,
        ctx: &mut WorkContext,
        id: ProductId,
        form: &ProductEmailAFriendForm,
    ) -> ActionOutcome<ProductEmailAFriendModel> {
        let Some(product) = self.visible_product(ctx, id)? else {
            return Ok(ActionResult::NotFound);
        };
        if !ctx.settings.catalog.email_a_friend_enabled {
            return Ok(ActionResult::redirect(RedirectTarget::Product(product.id)));
        }

        let mut state = ModelState::new();
        if !Self::email_a_friend_allowed(ctx) {
            state.add_summary("Only registered customers can use email a friend feature");
        }
        validation::collect(&mut state, "", form.validate());

        let mut model = ProductEmailAFriendModel {
            product_id: product.id,
            product_name: product.name.clone(),
            friend_email: form.friend_email.clone(),
            your_email_address: form.your_email_address.clone(),
            personal_message: form.personal_message.clone(),
            success_message: None,
        };
        if !state.is_valid() {
            return Ok(ActionResult::view_with_state("Product/EmailAFriend", model, state));
        }

        self.services.messages.send_product_email_a_friend_message(
            &ctx.store,
            form.your_email_address.trim(),
            form.friend_email.trim(),
            &product,
            form.personal_message.trim(),
        )?;
        model.success_message = Some("Your message has been sent.".to_string());
        Ok(ActionResult::view("Product/EmailAFriend", model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_cache::SessionId;
    use shop_services::messages::MessageTemplate;
    use shop_services::seed::{seed_demo, DemoData, DEMO_STORE_ID};

    use crate::config::ShopConfig;
    use crate::context::ContextFactory;

    fn setup() -> (ServiceRegistry, DemoData, WorkContext) {
        let services = ServiceRegistry::in_memory();
        let demo = seed_demo(&services.memory).unwrap();
        let factory = ContextFactory::new(services.clone(), ShopConfig::default());
        let ctx = factory.resolve(DEMO_STORE_ID, &SessionId::generate()).unwrap();
        (services, demo, ctx)
    }

    fn register(services: &ServiceRegistry, ctx: &mut WorkContext, email: &str) {
        let mut customer = ctx.customer.clone();
        customer.email = Some(email.to_string());
        customer.promote_to_registered();
        services.customers.update_customer(&customer).unwrap();
        ctx.switch_customer(customer);
    }

    #[test]
    fn test_push_recent() {
        let list = vec![ProductId::new(3), ProductId::new(1), ProductId::new(2)];
        assert_eq!(push_recent(list, ProductId::new(2), 3), "2,3,1");
        assert_eq!(push_recent(Vec::new(), ProductId::new(9), 0), "9");
    }

    #[test]
    fn test_details_records_recently_viewed() {
        let (services, demo, mut ctx) = setup();
        let products = ProductController::new(services);

        let page = products.product_details(&mut ctx, demo.laptop, None).unwrap();
        assert_eq!(page.view_name(), Some("Product/Details"));
        products.product_details(&mut ctx, demo.shirt, None).unwrap();

        let recent = products.recently_viewed_products(&mut ctx).unwrap().into_model().unwrap();
        let names: Vec<_> = recent.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Linen Shirt", "Lumen Book 14"]);
    }

    #[test]
    fn test_missing_product_is_not_found() {
        let (services, _demo, mut ctx) = setup();
        let products = ProductController::new(services);
        assert!(products.product_details(&mut ctx, ProductId::new(999), None).unwrap().is_not_found());
    }

    #[test]
    fn test_guest_review_is_rejected() {
        let (services, demo, mut ctx) = setup();
        let products = ProductController::new(services);
        let form = ProductReviewForm {
            title: "Great".into(),
            review_text: "Fast and light".into(),
            rating: 5,
        };
        let result = products.product_reviews_add(&mut ctx, demo.laptop, &form).unwrap();
        assert!(!result.model_state().unwrap().is_valid());
    }

    #[test]
    fn test_review_added_and_voted() {
        let (services, demo, mut ctx) = setup();
        register(&services, &mut ctx, "reviewer@example.com");
        let products = ProductController::new(services.clone());
        let helper = CatalogHelper::new(services.clone());
        assert_eq!(helper.get_category_product_number(&ctx, demo.laptops).unwrap(), 1);
        services
            .memory
            .add_product(
                Product::new(ProductId::default(), "Lumen Book 16", Money::new(149_900, Currency::USD))
                    .with_categories(vec![demo.laptops]),
            )
            .unwrap();
        assert_eq!(helper.get_category_product_number(&ctx, demo.laptops).unwrap(), 1);

        let form = ProductReviewForm {
            title: "Great".into(),
            review_text: "Fast and light".into(),
            rating: 9,
        };
        let result = products.product_reviews_add(&mut ctx, demo.laptop, &form).unwrap();
        let model = result.into_model().unwrap();
        assert_eq!(helper.get_category_product_number(&ctx, demo.laptops).unwrap(), 2);
        assert_eq!(model.items.len(), 1);
        assert_eq!(model.items[0].rating, 5);
        assert_eq!(
            model.add_product_review.success_message.as_deref(),
            Some("Product review is successfully added.")
        );
        let emails = services.memory.queued_emails().unwrap();
        assert!(emails.iter().any(|e| e.template == MessageTemplate::ProductReviewNotification));

        let review_id = model.items[0].id;
        let own = products.set_review_helpfulness(&mut ctx, review_id, true).unwrap();
        assert_eq!(own.json_body().unwrap()["Result"], "You cannot vote for your own review");

        let mut voter = services.customers.insert_guest_customer().unwrap();
        voter.promote_to_registered();
        services.customers.update_customer(&voter).unwrap();
        ctx.switch_customer(voter);
        let vote = products.set_review_helpfulness(&mut ctx, review_id, true).unwrap();
        assert_eq!(vote.json_body().unwrap()["TotalYes"], 1);
    }

    #[test]
    fn test_compare_list() {
        let (services, demo, mut ctx) = setup();
        let products = ProductController::new(services);

        for id in [demo.laptop, demo.shirt, demo.laptop] {
            let added = products.add_product_to_compare_list(&mut ctx, id).unwrap();
            assert_eq!(added.json_body().unwrap()["success"], true);
        }
        let model = products.compare_products(&mut ctx).unwrap().into_model().unwrap();
        let names: Vec<_> = model.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Lumen Book 14", "Linen Shirt"]);
        assert_eq!(model.products[0].specifications.len(), 2);

        products.remove_product_from_compare_list(&mut ctx, demo.laptop).unwrap();
        let model = products.compare_products(&mut ctx).unwrap().into_model().unwrap();
        assert_eq!(model.products.len(), 1);

        let cleared = products.clear_compare_list(&mut ctx).unwrap();
        assert_eq!(cleared.redirect_target(), Some(&RedirectTarget::CompareProducts));
        let model = products.compare_products(&mut ctx).unwrap().into_model().unwrap();
        assert!(model.products.is_empty());
    }

    #[test]
    fn test_new_products_and_rss() {
        let (services, _demo, mut ctx) = setup();
        let products = ProductController::new(services);
        let list = products.new_products(&mut ctx).unwrap().into_model().unwrap();
        let mut names: Vec<_> = list.iter().map(|p| p.name.clone()).collect();
        names.sort();
        assert_eq!(names, ["Linen Shirt", "Lumen Book 14"]);

        let rss = products.new_products_rss(&mut ctx).unwrap();
        let body = rss.content_body().unwrap();
        assert!(body.contains("<title>Lumen Book 14</title>"));
        assert!(body.contains("http://localhost:8080/product/"));
    }

    #[test]
    fn test_home_page_products() {
        let (services, _demo, mut ctx) = setup();
        let products = ProductController::new(services);
        let list = products.home_page_products(&mut ctx).unwrap().into_model().unwrap();
        let mut names: Vec<_> = list.iter().map(|p| p.name.clone()).collect();
        names.sort();
        assert_eq!(names, ["Gift Wrap", "Lumen Book 14"]);
    }

    #[test]
    fn test_email_a_friend() {
        let (services, demo, mut ctx) = setup();
        let products = ProductController::new(services.clone());
        let form = ProductEmailAFriendForm {
            friend_email: "friend@example.com".into(),
            your_email_address: "me@example.com".into(),
            personal_message: "Look at this".into(),
        };

        let rejected = products.product_email_a_friend(&mut ctx, demo.laptop, &form).unwrap();
        assert!(!rejected.model_state().unwrap().is_valid());

        register(&services, &mut ctx, "me@example.com");
        let sent = products.product_email_a_friend(&mut ctx, demo.laptop, &form).unwrap();
        assert!(sent.model().unwrap().success_message.is_some());
        let emails = services.memory.queued_emails().unwrap();
        let email = emails.iter().find(|e| e.template == MessageTemplate::EmailAFriend).unwrap();
        assert_eq!(email.to, "friend@example.com");
    }
}
