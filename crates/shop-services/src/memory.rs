//! In-memory tables backing the reference service implementations.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use shop_domain::cart::ShoppingCartItem;
use shop_domain::catalog::{
    Category, Manufacturer, Picture, Product, ProductReview, ProductSpecification,
    SpecificationAttribute,
};
use shop_domain::checkout::Order;
use shop_domain::customer::Customer;
use shop_domain::discount::{Discount, DiscountUsage, GiftCard};
use shop_domain::forum::{Forum, ForumGroup, ForumPost, ForumSubscription, ForumTopic};
use shop_domain::prelude::*;
use shop_domain::store::{Store, ThemeDescriptor};

use crate::messages::QueuedEmail;
use crate::ServiceError;

/// All storefront data.
#[derive(Default)]
pub(crate) struct Tables {
    pub stores: BTreeMap<StoreId, Store>,
    pub products: BTreeMap<ProductId, Product>,
    pub categories: BTreeMap<CategoryId, Category>,
    pub manufacturers: BTreeMap<ManufacturerId, Manufacturer>,
    pub pictures: BTreeMap<PictureId, Picture>,
    pub spec_attributes: BTreeMap<SpecAttributeId, SpecificationAttribute>,
    pub product_specs: Vec<ProductSpecification>,
    pub reviews: BTreeMap<ReviewId, ProductReview>,
    pub customers: BTreeMap<CustomerId, Customer>,
    pub cart_items: BTreeMap<CartItemId, ShoppingCartItem>,
    pub orders: BTreeMap<OrderId, Order>,
    pub discounts: BTreeMap<DiscountId, Discount>,
    pub discount_usage: Vec<DiscountUsage>,
    pub gift_cards: BTreeMap<GiftCardId, GiftCard>,
    pub forum_groups: BTreeMap<ForumGroupId, ForumGroup>,
    pub forums: BTreeMap<ForumId, Forum>,
    pub topics: BTreeMap<TopicId, ForumTopic>,
    pub posts: BTreeMap<PostId, ForumPost>,
    pub subscriptions: BTreeMap<SubscriptionId, ForumSubscription>,
    pub emails: Vec<QueuedEmail>,
    pub themes: Vec<ThemeDescriptor>,
    /// Exchange rates from the primary currency.
    pub currency_rates: Vec<(Currency, f64)>,
    next_id: u64,
}

impl Tables {
    /// Allocate the next identifier. One sequence serves every table.
    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Thread-safe in-memory database.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> ServiceError {
    ServiceError::LockPoisoned(e.to_string())
}

impl MemoryStore {
    pub fn new() -> Self {
        let store = Self::default();
        if let Ok(mut tables) = store.tables.write() {
            tables.currency_rates = vec![(Currency::USD, 1.0)];
        }
        store
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, ServiceError> {
        self.tables.read().map_err(poisoned)
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, ServiceError> {
        self.tables.write().map_err(poisoned)
    }

    pub fn add_store(&self, store: Store) -> Result<StoreId, ServiceError> {
        let mut tables = self.write()?;
        let id = store.id;
        tables.stores.insert(id, store);
        Ok(id)
    }

    pub fn add_product(&self, mut product: Product) -> Result<ProductId, ServiceError> {
        let mut tables = self.write()?;
        if !product.id.is_set() {
            product.id = ProductId::new(tables.next_id());
        }
        let id = product.id;
        tables.products.insert(id, product);
        Ok(id)
    }

    pub fn add_category(&self, mut category: Category) -> Result<CategoryId, ServiceError> {
        let mut tables = self.write()?;
        if !category.id.is_set() {
            category.id = CategoryId::new(tables.next_id());
        }
        let id = category.id;
        tables.categories.insert(id, category);
        Ok(id)
    }

    pub fn add_manufacturer(&self, mut manufacturer: Manufacturer) -> Result<ManufacturerId, ServiceError> {
        let mut tables = self.write()?;
        if !manufacturer.id.is_set() {
            manufacturer.id = ManufacturerId::new(tables.next_id());
        }
        let id = manufacturer.id;
        tables.manufacturers.insert(id, manufacturer);
        Ok(id)
    }

    pub fn add_picture(&self, mut picture: Picture) -> Result<PictureId, ServiceError> {
        let mut tables = self.write()?;
        if !picture.id.is_set() {
            picture.id = PictureId::new(tables.next_id());
        }
        let id = picture.id;
        tables.pictures.insert(id, picture);
        Ok(id)
    }

    pub fn add_specification_attribute(
        &self,
        attribute: SpecificationAttribute,
    ) -> Result<SpecAttributeId, ServiceError> {
        let mut tables = self.write()?;
        let id = attribute.id;
        tables.spec_attributes.insert(id, attribute);
        Ok(id)
    }

    pub fn add_product_specification(&self, spec: ProductSpecification) -> Result<(), ServiceError> {
        self.write()?.product_specs.push(spec);
        Ok(())
    }

    pub fn add_discount(&self, mut discount: Discount) -> Result<DiscountId, ServiceError> {
        let mut tables = self.write()?;
        if !discount.id.is_set() {
            discount.id = DiscountId::new(tables.next_id());
        }
        let id = discount.id;
        tables.discounts.insert(id, discount);
        Ok(id)
    }

    pub fn add_gift_card(&self, mut card: GiftCard) -> Result<GiftCardId, ServiceError> {
        let mut tables = self.write()?;
        if !card.id.is_set() {
            card.id = GiftCardId::new(tables.next_id());
        }
        let id = card.id;
        tables.gift_cards.insert(id, card);
        Ok(id)
    }

    pub fn add_forum_group(&self, name: &str, display_order: i32) -> Result<ForumGroupId, ServiceError> {
        let mut tables = self.write()?;
        let id = ForumGroupId::new(tables.next_id());
        tables.forum_groups.insert(
            id,
            ForumGroup {
                id,
                name: name.to_string(),
                display_order,
            },
        );
        Ok(id)
    }

    pub fn add_forum(
        &self,
        group_id: ForumGroupId,
        name: &str,
        description: &str,
        display_order: i32,
    ) -> Result<ForumId, ServiceError> {
        let mut tables = self.write()?;
        let id = ForumId::new(tables.next_id());
        tables.forums.insert(
            id,
            Forum {
                id,
                group_id,
                name: name.to_string(),
                description: description.to_string(),
                display_order,
                num_topics: 0,
                num_posts: 0,
                last_topic_id: None,
                last_post_id: None,
                last_post_customer_id: None,
                last_post_time: None,
                updated_at: current_timestamp(),
            },
        );
        Ok(id)
    }

    pub fn add_theme(&self, theme: ThemeDescriptor) -> Result<(), ServiceError> {
        self.write()?.themes.push(theme);
        Ok(())
    }

    /// Set the exchange rate from the primary currency to `currency`.
    pub fn set_currency_rate(&self, currency: Currency, rate: f64) -> Result<(), ServiceError> {
        let mut tables = self.write()?;
        tables.currency_rates.retain(|(c, _)| *c != currency);
        tables.currency_rates.push((currency, rate));
        Ok(())
    }

    /// Emails queued so far, oldest first.
    pub fn queued_emails(&self) -> Result<Vec<QueuedEmail>, ServiceError> {
        Ok(self.read()?.emails.clone())
    }
}
