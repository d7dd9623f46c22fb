//! Catalog model preparation: product cards, product pages, navigation
//! blocks, specifications and reviews.
//!
//! Navigation trees, breadcrumbs, category product numbers, manufacturer
//! blocks and specification lists live in the shared cache for
//! `cache_minutes`; [`CatalogHelper::invalidate`] drops them when the catalog
//! changes, whichever helper instance cached them.

use std::collections::HashSet;
use std::time::Duration;

use shop_cache::cache_key;
use shop_domain::cart::{SelectedAttributes, ShoppingCartItem};
use shop_domain::catalog::{Category, Manufacturer, Product};
use shop_domain::prelude::*;
use shop_services::catalog::ProductSearch;
use shop_services::ServiceRegistry;

use crate::context::{Permission, WorkContext};
use crate::error::WebError;
use crate::helpers::format_date;
use crate::models::catalog::{
    AddProductReviewModel, AddToCartModel, CategoryBreadcrumbItem, CategoryNavigationModel, CategorySimpleModel,
    ManufacturerBriefInfoModel, ManufacturerNavigationModel, PictureModel, ProductAttributeModel,
    ProductAttributeValueModel, ProductDetailsModel, ProductOverviewModel, ProductOverviewOptions, ProductPriceModel,
    ProductReviewHelpfulnessModel, ProductReviewModel, ProductReviewOverviewModel, ProductReviewsModel,
    ProductSpecificationModel, TierPriceModel,
};

const CATEGORY_NAVIGATION_KEY: &str = "shop.category.navigation";
const CATEGORY_BREADCRUMB_KEY: &str = "shop.category.breadcrumb";
const CATEGORY_PRODUCT_NUMBER_KEY: &str = "shop.category.productnumber";
const MANUFACTURER_NAVIGATION_KEY: &str = "shop.manufacturer.navigation";
const MANUFACTURER_PICTURE_KEY: &str = "shop.manufacturer.picture";
const PRODUCT_SPECS_KEY: &str = "shop.product.specs";

/// Catalog changes that make cached models stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogCacheEvent {
    CategoriesChanged,
    ManufacturersChanged,
    ProductChanged(ProductId),
    SpecificationsChanged,
}

pub struct CatalogHelper {
    services: ServiceRegistry,
}

impl CatalogHelper {
    pub fn new(services: ServiceRegistry) -> Self {
        Self { services }
    }

    fn cache_ttl(ctx: &WorkContext) -> Option<Duration> {
        Some(Duration::from_secs(ctx.settings.catalog.cache_minutes * 60))
    }

    /// Price of `product` after tax for the customer's display type,
    /// formatted in the working currency.
    pub fn format_product_price(&self, ctx: &WorkContext, product: &Product, amount: Money) -> String {
        let taxed = self.services.tax.product_price(&ctx.settings.tax, product, amount);
        ctx.format_price(&taxed.for_display(ctx.tax_display_type))
    }

    /// `[+$200.00]` style attribute value adjustment, `None` for zero.
    fn format_price_adjustment(&self, ctx: &WorkContext, product: &Product, adjustment: Money) -> Option<String> {
        if adjustment.is_zero() {
            return None;
        }
        let taxed = self.services.tax.product_price(&ctx.settings.tax, product, adjustment);
        let shown = ctx.to_working(&taxed.for_display(ctx.tax_display_type));
        let sign = if shown.is_negative() { "-" } else { "+" };
        let magnitude = Money::new(shown.amount_cents.abs(), shown.currency);
        Some(format!("[{}{}]", sign, magnitude.display()))
    }

    pub fn prepare_product_price_model(
        &self,
        ctx: &WorkContext,
        product: &Product,
        force_redirection_after_adding_to_cart: bool,
    ) -> Result<ProductPriceModel, WebError> {
        let display_prices = ctx.authorize(Permission::DisplayPrices);
        let mut model = ProductPriceModel {
            hide_prices: !display_prices,
            disable_buy_button: product.disable_buy_button
                || !display_prices
                || !ctx.authorize(Permission::EnableShoppingCart),
            disable_wishlist_button: product.disable_wishlist_button
                || !display_prices
                || !ctx.authorize(Permission::EnableWishlist),
            force_redirection_after_adding_to_cart,
            ..Default::default()
        };
        if !display_prices {
            return Ok(model);
        }
        if product.call_for_price {
            model.call_for_price = true;
            model.price = Some("Call for pricing".to_string());
            return Ok(model);
        }
        if product.customer_enters_price {
            model.customer_enters_price = true;
            return Ok(model);
        }

        let scope = ctx.scope();
        let none = SelectedAttributes::new();
        if product.has_tier_prices() {
            let largest_tier = product.tier_prices.iter().map(|t| t.quantity).max().unwrap_or(1);
            let lowest = self
                .services
                .prices
                .final_price(&scope, product, &none, None, largest_tier, true)?;
            model.price = Some(format!("From {}", self.format_product_price(ctx, product, lowest.price)));
            return Ok(model);
        }

        let without_discount = self.services.prices.final_price(&scope, product, &none, None, 1, false)?;
        let with_discount = self.services.prices.final_price(&scope, product, &none, None, 1, true)?;
        if let Some(old_price) = product.old_price {
            if old_price.is_positive() && old_price != without_discount.price {
                model.old_price = Some(self.format_product_price(ctx, product, old_price));
            }
        }
        model.price = Some(self.format_product_price(ctx, product, without_discount.price));
        if with_discount.price != without_discount.price {
            model.price_with_discount = Some(self.format_product_price(ctx, product, with_discount.price));
        }
        Ok(model)
    }

    pub(crate) fn picture_model(
        &self,
        ctx: &WorkContext,
        picture_id: Option<PictureId>,
        size: u32,
        name: &str,
    ) -> Result<PictureModel, WebError> {
        let picture = match picture_id {
            Some(id) => self.services.pictures.get_picture_by_id(id)?,
            None => None,
        };
        let host = &ctx.settings.media.image_host;
        Ok(PictureModel {
            image_url: self.services.pictures.get_picture_url(picture.as_ref(), size, host),
            full_size_image_url: self.services.pictures.get_picture_url(picture.as_ref(), 0, host),
            title: picture
                .as_ref()
                .and_then(|p| p.title_attribute.clone())
                .unwrap_or_else(|| format!("Show details for {}", name)),
            alternate_text: picture
                .as_ref()
                .and_then(|p| p.alt_attribute.clone())
                .unwrap_or_else(|| format!("Picture of {}", name)),
        })
    }

    pub fn prepare_product_overview_models(
        &self,
        ctx: &WorkContext,
        products: &[Product],
        options: ProductOverviewOptions,
    ) -> Result<Vec<ProductOverviewModel>, WebError> {
        let mut models = Vec::with_capacity(products.len());
        for product in products {
            let mut model = ProductOverviewModel {
                id: product.id,
                name: product.name.clone(),
                short_description: product.short_description.clone(),
                full_description: product.full_description.clone(),
                sku: product.sku.clone().filter(|_| ctx.settings.catalog.show_sku),
                mark_as_new: product.mark_as_new,
                ..Default::default()
            };
            if options.prepare_price {
                // Attributes and entered prices can only be chosen on the product page.
                let force = options.force_redirection_after_adding_to_cart
                    || product.customer_enters_price
                    || product.attributes.iter().any(|a| a.is_required);
                model.price = Some(self.prepare_product_price_model(ctx, product, force)?);
            }
            if options.prepare_picture {
                let size = options
                    .picture_size
                    .unwrap_or(ctx.settings.media.product_thumb_picture_size);
                model.default_picture =
                    Some(self.picture_model(ctx, product.picture_ids.first().copied(), size, &product.name)?);
            }
            if options.prepare_specifications {
                model.specifications = self.prepare_product_specification_model(ctx, product.id)?;
            }
            if ctx.settings.catalog.show_product_reviews_in_lists {
                model.review_overview = Some(self.prepare_product_review_overview(ctx, product));
            }
            models.push(model);
        }
        Ok(models)
    }

    pub fn prepare_product_details_model(
        &self,
        ctx: &WorkContext,
        product: &Product,
        updated_cart_item: Option<&ShoppingCartItem>,
    ) -> Result<ProductDetailsModel, WebError> {
        let catalog = &ctx.settings.catalog;
        let media = &ctx.settings.media;

        let mut model = ProductDetailsModel {
            id: product.id,
            name: product.name.clone(),
            short_description: product.short_description.clone(),
            full_description: product.full_description.clone(),
            sku: product.sku.clone().filter(|_| catalog.show_sku),
            manufacturer_part_number: product
                .manufacturer_part_number
                .clone()
                .filter(|_| catalog.show_manufacturer_part_number),
            gtin: product.gtin.clone().filter(|_| catalog.show_gtin),
            is_free_shipping: product.is_free_shipping,
            mark_as_new: product.mark_as_new,
            email_a_friend_enabled: catalog.email_a_friend_enabled,
            compare_products_enabled: catalog.compare_products_enabled,
            ..Default::default()
        };
        if catalog.show_weight && product.weight > 0.0 {
            model.weight = Some(format!("{:.2} lb(s)", product.weight));
        }
        if catalog.show_dimensions && (product.length > 0.0 || product.width > 0.0 || product.height > 0.0) {
            model.dimensions = Some(format!(
                "{:.2} x {:.2} x {:.2}",
                product.length, product.width, product.height
            ));
        }
        if product.display_stock_availability {
            model.stock_availability = product.inventory.availability_message(product.display_stock_quantity);
        }

        if catalog.category_breadcrumb_enabled {
            if let Some(category_id) = product.category_ids.first() {
                if let Some(category) = self.services.categories.get_category_by_id(*category_id)? {
                    model.breadcrumb = self.get_category_breadcrumb(ctx, &category)?;
                }
            }
        }

        for id in &product.manufacturer_ids {
            if let Some(manufacturer) = self.services.manufacturers.get_manufacturer_by_id(*id)? {
                if manufacturer.is_visible(ctx.store.id) {
                    model.manufacturers.push(ManufacturerBriefInfoModel {
                        id: manufacturer.id,
                        name: manufacturer.name,
                        is_active: false,
                    });
                }
            }
        }

        for picture_id in &product.picture_ids {
            model
                .pictures
                .push(self.picture_model(ctx, Some(*picture_id), media.product_details_picture_size, &product.name)?);
        }
        model.default_picture = match model.pictures.first() {
            Some(first) => first.clone(),
            None => self.picture_model(ctx, None, media.product_details_picture_size, &product.name)?,
        };

        model.price = self.prepare_product_price_model(ctx, product, false)?;
        model.add_to_cart = self.prepare_add_to_cart_model(ctx, product, updated_cart_item, &model.price);
        model.attributes = self.prepare_attribute_models(ctx, product, updated_cart_item);

        if product.has_tier_prices() && !model.price.hide_prices {
            let scope = ctx.scope();
            let none = SelectedAttributes::new();
            for tier in product
                .tier_prices
                .iter()
                .filter(|t| t.store_id.map_or(true, |s| s == ctx.store.id))
            {
                let price = if catalog.display_tier_prices_with_discounts {
                    self.services
                        .prices
                        .final_price(&scope, product, &none, None, tier.quantity, true)?
                        .price
                } else {
                    tier.price
                };
                model.tier_prices.push(TierPriceModel {
                    quantity: tier.quantity,
                    price: self.format_product_price(ctx, product, price),
                });
            }
        }

        model.specifications = self.prepare_product_specification_model(ctx, product.id)?;
        model.review_overview = self.prepare_product_review_overview(ctx, product);
        Ok(model)
    }

    fn prepare_add_to_cart_model(
        &self,
        ctx: &WorkContext,
        product: &Product,
        updated_cart_item: Option<&ShoppingCartItem>,
        price: &ProductPriceModel,
    ) -> AddToCartModel {
        let mut model = AddToCartModel {
            product_id: product.id,
            entered_quantity: updated_cart_item
                .map(|item| item.quantity)
                .unwrap_or(product.order_minimum_quantity.max(1)),
            allowed_quantities: product.parse_allowed_quantities(),
            disable_buy_button: price.disable_buy_button,
            disable_wishlist_button: price.disable_wishlist_button,
            updated_cart_item_id: updated_cart_item.map(|item| item.id),
            update_cart_item_type: updated_cart_item.map(|item| item.cart_type),
            ..Default::default()
        };
        if product.customer_enters_price && !price.hide_prices {
            model.customer_enters_price = true;
            let entered = updated_cart_item
                .and_then(|item| item.customer_entered_price)
                .unwrap_or(product.minimum_customer_entered_price);
            model.customer_entered_price = Some(ctx.to_working(&entered).display_amount());
            model.customer_entered_price_range = Some(format!(
                "Enter price between {} and {}",
                ctx.format_plain(&product.minimum_customer_entered_price),
                ctx.format_plain(&product.maximum_customer_entered_price)
            ));
        }
        model
    }

    fn prepare_attribute_models(
        &self,
        ctx: &WorkContext,
        product: &Product,
        updated_cart_item: Option<&ShoppingCartItem>,
    ) -> Vec<ProductAttributeModel> {
        let mut mappings: Vec<_> = product.attributes.iter().collect();
        mappings.sort_by_key(|m| m.display_order);
        mappings
            .into_iter()
            .map(|mapping| {
                let mut values: Vec<_> = mapping.values.iter().collect();
                values.sort_by_key(|v| v.display_order);
                ProductAttributeModel {
                    id: mapping.id,
                    name: mapping.name.clone(),
                    text_prompt: mapping.text_prompt.clone(),
                    is_required: mapping.is_required,
                    control_type: mapping.control_type,
                    default_value: updated_cart_item
                        .and_then(|item| item.attributes.text_for(mapping.id))
                        .map(str::to_string),
                    values: values
                        .into_iter()
                        .map(|value| ProductAttributeValueModel {
                            id: value.id,
                            name: value.name.clone(),
                            price_adjustment: self.format_price_adjustment(ctx, product, value.price_adjustment),
                            is_preselected: match updated_cart_item {
                                Some(item) => item.attributes.values_for(mapping.id).contains(&value.id),
                                None => value.is_preselected,
                            },
                        })
                        .collect(),
                }
            })
            .collect()
    }

    /// Category tree of the store, with the active category marked.
    ///
    /// The active category is `current_category`, or the first category
    /// of `current_product` when no category is given.
    pub fn prepare_category_navigation_model(
        &self,
        ctx: &WorkContext,
        current_category: Option<CategoryId>,
        current_product: Option<ProductId>,
    ) -> Result<CategoryNavigationModel, WebError> {
        let active = match (current_category, current_product) {
            (Some(category), _) => Some(category),
            (None, Some(product_id)) => self
                .services
                .products
                .get_product_by_id(product_id)?
                .and_then(|p| p.category_ids.first().copied()),
            (None, None) => None,
        };

        let show_numbers = ctx.settings.catalog.show_category_product_number;
        let key = cache_key!(CATEGORY_NAVIGATION_KEY, ctx.store.id, show_numbers);
        let categories: Vec<CategorySimpleModel> =
            self.services
                .cache
                .get_or_insert_with(&key, Self::cache_ttl(ctx), || -> Result<_, WebError> {
                    let all = self.services.categories.get_all_categories(ctx.store.id)?;
                    let mut visited = HashSet::new();
                    self.build_category_tree(ctx, &all, None, show_numbers, &mut visited)
                })?;

        Ok(CategoryNavigationModel {
            current_category_id: active,
            categories,
        })
    }

    fn build_category_tree(
        &self,
        ctx: &WorkContext,
        all: &[Category],
        parent: Option<CategoryId>,
        show_numbers: bool,
        visited: &mut HashSet<CategoryId>,
    ) -> Result<Vec<CategorySimpleModel>, WebError> {
        let mut models = Vec::new();
        for category in all.iter().filter(|c| c.parent_id == parent) {
            if !visited.insert(category.id) {
                continue;
            }
            let number_of_products = if show_numbers {
                Some(self.get_category_product_number(ctx, category.id)?)
            } else {
                None
            };
            models.push(CategorySimpleModel {
                id: category.id,
                name: category.name.clone(),
                number_of_products,
                sub_categories: self.build_category_tree(ctx, all, Some(category.id), show_numbers, visited)?,
            });
        }
        Ok(models)
    }

    fn descendant_ids(all: &[Category], root: CategoryId) -> Vec<CategoryId> {
        let mut ids = vec![root];
        let mut index = 0;
        while index < ids.len() {
            let parent = ids[index];
            for child in all.iter().filter(|c| c.parent_id == Some(parent)) {
                if !ids.contains(&child.id) {
                    ids.push(child.id);
                }
            }
            index += 1;
        }
        ids
    }

    /// Visible products in a category, optionally counting subcategories.
    pub fn get_category_product_number(&self, ctx: &WorkContext, category_id: CategoryId) -> Result<usize, WebError> {
        let include_subcategories = ctx
            .settings
            .catalog
            .show_category_product_number_including_subcategories;
        let key = cache_key!(CATEGORY_PRODUCT_NUMBER_KEY, ctx.store.id, category_id, include_subcategories);

        self.services
            .cache
            .get_or_insert_with(&key, Self::cache_ttl(ctx), || -> Result<_, WebError> {
                let category_ids = if include_subcategories {
                    let all = self.services.categories.get_all_categories(ctx.store.id)?;
                    Self::descendant_ids(&all, category_id)
                } else {
                    vec![category_id]
                };
                let found = self.services.products.search_products(&ProductSearch {
                    store_id: ctx.store.id,
                    category_ids,
                    visible_individually_only: true,
                    page_index: 0,
                    page_size: 1,
                    ..Default::default()
                })?;
                Ok(found.total_count)
            })
    }

    /// Path from the root category down to `category`.
    pub fn get_category_breadcrumb(
        &self,
        ctx: &WorkContext,
        category: &Category,
    ) -> Result<Vec<CategoryBreadcrumbItem>, WebError> {
        let key = cache_key!(CATEGORY_BREADCRUMB_KEY, ctx.store.id, category.id);
        self.services
            .cache
            .get_or_insert_with(&key, Self::cache_ttl(ctx), || -> Result<_, WebError> {
                let mut path = Vec::new();
                let mut seen = HashSet::new();
                let mut current = Some(category.clone());
                while let Some(node) = current {
                    if !seen.insert(node.id) || !node.is_visible(ctx.store.id) {
                        break;
                    }
                    path.push(CategoryBreadcrumbItem {
                        id: node.id,
                        name: node.name.clone(),
                    });
                    current = match node.parent_id {
                        Some(parent) => self.services.categories.get_category_by_id(parent)?,
                        None => None,
                    };
                }
                path.reverse();
                Ok(path)
            })
    }

    pub fn prepare_manufacturer_navigation_model(
        &self,
        ctx: &WorkContext,
        current_manufacturer: Option<ManufacturerId>,
    ) -> Result<ManufacturerNavigationModel, WebError> {
        let limit = ctx.settings.catalog.manufacturers_block_items_to_display;
        let key = cache_key!(
            MANUFACTURER_NAVIGATION_KEY,
            ctx.store.id,
            current_manufacturer.map(|id| id.value()).unwrap_or(0),
            limit
        );
        self.services
            .cache
            .get_or_insert_with(&key, Self::cache_ttl(ctx), || -> Result<_, WebError> {
                let all = self.services.manufacturers.get_all_manufacturers(ctx.store.id)?;
                let total_manufacturers = all.len();
                let take = if limit == 0 { total_manufacturers } else { limit };
                Ok(ManufacturerNavigationModel {
                    manufacturers: all
                        .into_iter()
                        .take(take)
                        .map(|m| ManufacturerBriefInfoModel {
                            is_active: Some(m.id) == current_manufacturer,
                            id: m.id,
                            name: m.name,
                        })
                        .collect(),
                    total_manufacturers,
                })
            })
    }

    pub fn prepare_manufacturer_picture_model(
        &self,
        ctx: &WorkContext,
        manufacturer: &Manufacturer,
    ) -> Result<PictureModel, WebError> {
        let size = ctx.settings.media.manufacturer_thumb_picture_size;
        let key = cache_key!(MANUFACTURER_PICTURE_KEY, manufacturer.id, size);
        self.services
            .cache
            .get_or_insert_with(&key, Self::cache_ttl(ctx), || {
                self.picture_model(ctx, manufacturer.picture_id, size, &manufacturer.name)
            })
    }

    /// Specifications shown on the product page, in display order.
    pub fn prepare_product_specification_model(
        &self,
        ctx: &WorkContext,
        product_id: ProductId,
    ) -> Result<Vec<ProductSpecificationModel>, WebError> {
        let key = cache_key!(PRODUCT_SPECS_KEY, product_id);
        self.services
            .cache
            .get_or_insert_with(&key, Self::cache_ttl(ctx), || -> Result<_, WebError> {
                let mut specs = self
                    .services
                    .specifications
                    .get_product_specifications(product_id, Some(true))?;
                specs.sort_by_key(|s| s.display_order);
                let mut models = Vec::with_capacity(specs.len());
                for spec in specs {
                    let Some(attribute) = self
                        .services
                        .specifications
                        .get_specification_attribute_by_id(spec.attribute_id)?
                    else {
                        continue;
                    };
                    let value = spec
                        .custom_value
                        .clone()
                        .filter(|v| !v.trim().is_empty())
                        .or_else(|| attribute.option(spec.option_id).map(|o| o.name.clone()))
                        .unwrap_or_default();
                    models.push(ProductSpecificationModel {
                        attribute_id: attribute.id,
                        attribute_name: attribute.name,
                        value,
                    });
                }
                Ok(models)
            })
    }

    pub fn prepare_product_review_overview(&self, ctx: &WorkContext, product: &Product) -> ProductReviewOverviewModel {
        ProductReviewOverviewModel {
            product_id: product.id,
            rating_sum: product.approved_rating_sum,
            total_reviews: product.approved_total_reviews,
            allow_customer_reviews: product.allow_customer_reviews && ctx.settings.catalog.product_reviews_enabled,
        }
    }

    pub fn prepare_product_reviews_model(
        &self,
        ctx: &WorkContext,
        product: &Product,
    ) -> Result<ProductReviewsModel, WebError> {
        let reviews = self
            .services
            .reviews
            .get_product_reviews(product.id, ctx.store.id, true)?;
        let mut author_ids: Vec<CustomerId> = reviews.iter().map(|r| r.customer_id).collect();
        author_ids.sort();
        author_ids.dedup();
        let authors = self.services.customers.get_customers_by_ids(&author_ids)?;

        let items = reviews
            .iter()
            .map(|review| {
                let customer_name = authors
                    .iter()
                    .find(|c| c.id == review.customer_id)
                    .filter(|c| !c.is_guest())
                    .map(|c| c.display_name(ctx.store.id))
                    .unwrap_or_else(|| "Guest".to_string());
                ProductReviewModel {
                    id: review.id,
                    customer_id: review.customer_id,
                    customer_name,
                    title: review.title.clone(),
                    review_text: review.review_text.clone(),
                    rating: review.rating,
                    helpfulness: ProductReviewHelpfulnessModel {
                        review_id: review.id,
                        helpful_yes_total: review.helpful_yes_total(),
                        helpful_no_total: review.helpful_no_total(),
                    },
                    written_on: format_date(review.created_at),
                }
            })
            .collect();

        Ok(ProductReviewsModel {
            product_id: product.id,
            product_name: product.name.clone(),
            items,
            add_product_review: AddProductReviewModel {
                rating: 5,
                can_current_customer_leave_review: !ctx.is_guest()
                    || ctx.settings.catalog.allow_anonymous_users_to_review_product,
                ..Default::default()
            },
        })
    }

    /// Drop cached models affected by a catalog change.
    pub fn invalidate(&self, event: CatalogCacheEvent) -> Result<(), WebError> {
        let cache = &self.services.cache;
        match event {
            CatalogCacheEvent::CategoriesChanged => {
                cache.remove_by_prefix(CATEGORY_NAVIGATION_KEY)?;
                cache.remove_by_prefix(CATEGORY_BREADCRUMB_KEY)?;
                cache.remove_by_prefix(CATEGORY_PRODUCT_NUMBER_KEY)?;
            }
            CatalogCacheEvent::ManufacturersChanged => {
                cache.remove_by_prefix(MANUFACTURER_NAVIGATION_KEY)?;
                cache.remove_by_prefix(MANUFACTURER_PICTURE_KEY)?;
            }
            CatalogCacheEvent::ProductChanged(product_id) => {
                cache.remove(&cache_key!(PRODUCT_SPECS_KEY, product_id))?;
                cache.remove_by_prefix(CATEGORY_NAVIGATION_KEY)?;
                cache.remove_by_prefix(CATEGORY_PRODUCT_NUMBER_KEY)?;
            }
            CatalogCacheEvent::SpecificationsChanged => {
                cache.remove_by_prefix(PRODUCT_SPECS_KEY)?;
            }
        }
        tracing::debug!(?event, "catalog cache invalidated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_cache::SessionId;
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

    fn product(services: &ServiceRegistry, id: ProductId) -> Product {
        services.products.get_product_by_id(id).unwrap().unwrap()
    }

    #[test]
    fn test_price_model_variants() {
        let (services, demo, mut ctx) = setup();
        let helper = CatalogHelper::new(services.clone());

        let laptop = product(&services, demo.laptop);
        let model = helper.prepare_product_price_model(&ctx, &laptop, false).unwrap();
        assert_eq!(model.price.as_deref(), Some("From $1199.00"));

        let shirt = product(&services, demo.shirt);
        let model = helper.prepare_product_price_model(&ctx, &shirt, false).unwrap();
        assert_eq!(model.price.as_deref(), Some("$45.00"));
        assert_eq!(model.old_price, None);

        let mut call = shirt.clone();
        call.call_for_price = true;
        let model = helper.prepare_product_price_model(&ctx, &call, false).unwrap();
        assert_eq!(model.price.as_deref(), Some("Call for pricing"));

        let mut entered = shirt.clone();
        entered.customer_enters_price = true;
        let model = helper.prepare_product_price_model(&ctx, &entered, false).unwrap();
        assert!(model.customer_enters_price);
        assert_eq!(model.price, None);

        ctx.settings.permissions.display_prices = vec!["Registered".to_string()];
        let model = helper.prepare_product_price_model(&ctx, &shirt, false).unwrap();
        assert!(model.hide_prices);
        assert!(model.disable_buy_button);
        assert_eq!(model.price, None);
    }

    #[test]
    fn test_old_price_shown_when_different() {
        let (services, demo, ctx) = setup();
        let helper = CatalogHelper::new(services.clone());
        let mut laptop = product(&services, demo.laptop);
        laptop.tier_prices.clear();
        let model = helper.prepare_product_price_model(&ctx, &laptop, false).unwrap();
        assert_eq!(model.old_price.as_deref(), Some("$1399.00"));
        assert_eq!(model.price.as_deref(), Some("$1299.00"));
    }

    #[test]
    fn test_product_details_model() {
        let (services, demo, ctx) = setup();
        let helper = CatalogHelper::new(services.clone());
        let laptop = product(&services, demo.laptop);
        let model = helper.prepare_product_details_model(&ctx, &laptop, None).unwrap();

        assert_eq!(model.sku.as_deref(), Some("LB-14"));
        assert_eq!(model.stock_availability.as_deref(), Some("In stock"));
        let crumbs: Vec<_> = model.breadcrumb.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(crumbs, vec!["Electronics", "Laptops"]);
        assert_eq!(model.manufacturers[0].name, "Lumen");
        assert_eq!(model.add_to_cart.entered_quantity, 1);
        assert_eq!(model.tier_prices.len(), 1);
        assert_eq!(model.tier_prices[0].price, "$1199.00");

        let memory = &model.attributes[0];
        assert_eq!(memory.name, "Memory");
        assert!(memory.values[0].is_preselected);
        assert_eq!(memory.values[1].price_adjustment.as_deref(), Some("[+$200.00]"));
        assert_eq!(model.specifications.len(), 2);
        assert_eq!(model.specifications[0].value, "14 in");
    }

    #[test]
    fn test_details_follow_updated_cart_item() {
        let (services, demo, ctx) = setup();
        let helper = CatalogHelper::new(services.clone());
        let shirt = product(&services, demo.shirt);
        let mut attributes = SelectedAttributes::new();
        attributes.select(AttributeMappingId::new(2), AttributeValueId::new(5));
        attributes.set_text(AttributeMappingId::new(3), "JD");
        let item = ShoppingCartItem {
            id: CartItemId::new(9),
            store_id: ctx.store.id,
            customer_id: ctx.customer.id,
            cart_type: ShoppingCartType::ShoppingCart,
            product_id: shirt.id,
            attributes,
            customer_entered_price: None,
            quantity: 3,
            created_at: 0,
            updated_at: 0,
        };
        let model = helper.prepare_product_details_model(&ctx, &shirt, Some(&item)).unwrap();
        assert_eq!(model.add_to_cart.entered_quantity, 3);
        assert_eq!(model.add_to_cart.updated_cart_item_id, Some(CartItemId::new(9)));
        let size = &model.attributes[0];
        let selected: Vec<_> = size.values.iter().filter(|v| v.is_preselected).map(|v| v.name.as_str()).collect();
        assert_eq!(selected, vec!["XL"]);
        assert_eq!(model.attributes[1].default_value.as_deref(), Some("JD"));
    }

    #[test]
    fn test_category_navigation_counts_and_active() {
        let (services, demo, mut ctx) = setup();
        let helper = CatalogHelper::new(services.clone());
        let model = helper
            .prepare_category_navigation_model(&ctx, None, Some(demo.laptop))
            .unwrap();
        assert_eq!(model.current_category_id, Some(demo.laptops));
        assert_eq!(model.categories.len(), 2);
        let electronics = &model.categories[0];
        assert_eq!(electronics.name, "Electronics");
        assert_eq!(electronics.number_of_products, Some(0));
        assert_eq!(electronics.sub_categories[0].number_of_products, Some(1));

        ctx.settings.catalog.show_category_product_number_including_subcategories = true;
        assert_eq!(helper.get_category_product_number(&ctx, demo.electronics).unwrap(), 1);
    }

    #[test]
    fn test_breadcrumb_survives_parent_loop() {
        let (services, demo, ctx) = setup();
        let helper = CatalogHelper::new(services.clone());
        let looped = Category::new(demo.laptops, "Laptops").with_parent(demo.laptops);
        let crumbs = helper.get_category_breadcrumb(&ctx, &looped).unwrap();
        assert_eq!(crumbs.len(), 1);
    }

    #[test]
    fn test_manufacturer_navigation_is_cached_until_invalidated() {
        let (services, demo, ctx) = setup();
        let helper = CatalogHelper::new(services.clone());
        let model = helper.prepare_manufacturer_navigation_model(&ctx, Some(demo.manufacturer)).unwrap();
        assert_eq!(model.total_manufacturers, 1);
        assert!(model.manufacturers[0].is_active);

        services
            .memory
            .add_manufacturer(Manufacturer::new(ManufacturerId::default(), "Arden"))
            .unwrap();
        let cached = helper.prepare_manufacturer_navigation_model(&ctx, Some(demo.manufacturer)).unwrap();
        assert_eq!(cached.total_manufacturers, 1);

        helper.invalidate(CatalogCacheEvent::ManufacturersChanged).unwrap();
        let fresh = helper.prepare_manufacturer_navigation_model(&ctx, Some(demo.manufacturer)).unwrap();
        assert_eq!(fresh.total_manufacturers, 2);
    }

    #[test]
    fn test_manufacturer_picture_url() {
        let (services, demo, ctx) = setup();
        let helper = CatalogHelper::new(services.clone());
        let manufacturer = services
            .manufacturers
            .get_manufacturer_by_id(demo.manufacturer)
            .unwrap()
            .unwrap();
        let picture = helper.prepare_manufacturer_picture_model(&ctx, &manufacturer).unwrap();
        assert!(picture.image_url.starts_with("/images/"));
        assert!(picture.image_url.contains("lumen-logo_420"));
        assert_eq!(picture.alternate_text, "Picture of Lumen");
    }

    #[test]
    fn test_reviews_model_names_authors() {
        let (services, demo, ctx) = setup();
        let helper = CatalogHelper::new(services.clone());
        let mut author = services.customers.insert_guest_customer().unwrap();
        author.email = Some("ann@example.com".to_string());
        author.promote_to_registered();
        author.set_attribute(ctx.store.id, CustomerAttribute::FirstName, Some("Ann".to_string()));
        services.customers.update_customer(&author).unwrap();
        services
            .reviews
            .insert_review(ProductReview {
                id: ReviewId::default(),
                product_id: demo.shirt,
                store_id: ctx.store.id,
                customer_id: author.id,
                title: "Fits".to_string(),
                review_text: "Good linen".to_string(),
                rating: 4,
                is_approved: true,
                helpfulness: Vec::new(),
                created_at: 0,
            })
            .unwrap();

        let shirt = product(&services, demo.shirt);
        let model = helper.prepare_product_reviews_model(&ctx, &shirt).unwrap();
        assert_eq!(model.items.len(), 1);
        assert_eq!(model.items[0].customer_name, "Ann");
        assert!(!model.add_product_review.can_current_customer_leave_review);

        let overview = helper.prepare_product_review_overview(&ctx, &shirt);
        assert_eq!((overview.rating_sum, overview.total_reviews), (4, 1));
    }
}
