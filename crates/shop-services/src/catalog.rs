//! Catalog lookups: products, categories, manufacturers, specifications,
//! pictures and reviews.

use shop_domain::catalog::{
    Category, Manufacturer, Picture, Product, ProductReview, ProductSpecification,
    SpecificationAttribute,
};
use shop_domain::prelude::*;

use crate::memory::MemoryStore;
use crate::ServiceError;

/// Product ordering for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSortingEnum {
    #[default]
    Position,
    NameAsc,
    PriceAsc,
    PriceDesc,
    CreatedOn,
}

/// Filter for product listings and counts.
#[derive(Debug, Clone, Default)]
pub struct ProductSearch {
    pub store_id: StoreId,
    /// Matches products in any of these categories.
    pub category_ids: Vec<CategoryId>,
    pub manufacturer_id: Option<ManufacturerId>,
    pub keywords: Option<String>,
    pub visible_individually_only: bool,
    pub mark_as_new_only: bool,
    pub featured_on_home_page_only: bool,
    pub order_by: ProductSortingEnum,
    pub page_index: usize,
    pub page_size: usize,
}

pub trait ProductService: Send + Sync {
    fn get_product_by_id(&self, id: ProductId) -> Result<Option<Product>, ServiceError>;

    /// Products in the order of `ids`, skipping missing ones.
    fn get_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, ServiceError>;

    /// Visible products matching `search`.
    fn search_products(&self, search: &ProductSearch) -> Result<PagedList<Product>, ServiceError>;

    fn update_product(&self, product: &Product) -> Result<(), ServiceError>;
}

pub trait CategoryService: Send + Sync {
    fn get_category_by_id(&self, id: CategoryId) -> Result<Option<Category>, ServiceError>;

    /// Visible categories of a store, ordered by display order then name.
    fn get_all_categories(&self, store_id: StoreId) -> Result<Vec<Category>, ServiceError>;

    /// Visible children of `parent` (`None` for root categories).
    fn get_categories_by_parent(
        &self,
        parent: Option<CategoryId>,
        store_id: StoreId,
    ) -> Result<Vec<Category>, ServiceError>;
}

pub trait ManufacturerService: Send + Sync {
    fn get_manufacturer_by_id(&self, id: ManufacturerId) -> Result<Option<Manufacturer>, ServiceError>;

    /// Visible manufacturers of a store, ordered by display order then name.
    fn get_all_manufacturers(&self, store_id: StoreId) -> Result<Vec<Manufacturer>, ServiceError>;
}

pub trait SpecificationAttributeService: Send + Sync {
    fn get_specification_attribute_by_id(
        &self,
        id: SpecAttributeId,
    ) -> Result<Option<SpecificationAttribute>, ServiceError>;

    /// A product's specification values, optionally only those shown on the
    /// product page, ordered by display order.
    fn get_product_specifications(
        &self,
        product_id: ProductId,
        show_on_product_page: Option<bool>,
    ) -> Result<Vec<ProductSpecification>, ServiceError>;
}

pub trait PictureService: Send + Sync {
    fn get_picture_by_id(&self, id: PictureId) -> Result<Option<Picture>, ServiceError>;

    /// URL of a resized picture, or of the placeholder when `picture` is `None`.
    fn get_picture_url(&self, picture: Option<&Picture>, target_size: u32, image_host: &str) -> String {
        match picture {
            Some(p) => format!(
                "{}{:07}_{}_{}.{}",
                image_host,
                p.id.value(),
                p.seo_filename,
                target_size,
                p.extension()
            ),
            None => format!("{}default-image_{}.png", image_host, target_size),
        }
    }
}

pub trait ReviewService: Send + Sync {
    fn get_review_by_id(&self, id: ReviewId) -> Result<Option<ProductReview>, ServiceError>;

    /// Reviews of a product in a store, newest first.
    fn get_product_reviews(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        approved_only: bool,
    ) -> Result<Vec<ProductReview>, ServiceError>;

    /// Store a review and refresh the product's rating totals.
    fn insert_review(&self, review: ProductReview) -> Result<ProductReview, ServiceError>;

    fn update_review(&self, review: &ProductReview) -> Result<(), ServiceError>;
}

impl ProductService for MemoryStore {
    fn get_product_by_id(&self, id: ProductId) -> Result<Option<Product>, ServiceError> {
        Ok(self.read()?.products.get(&id).filter(|p| !p.deleted).cloned())
    }

    fn get_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, ServiceError> {
        let tables = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| tables.products.get(id))
            .filter(|p| !p.deleted)
            .cloned()
            .collect())
    }

    fn search_products(&self, search: &ProductSearch) -> Result<PagedList<Product>, ServiceError> {
        let tables = self.read()?;
        let keywords = search.keywords.as_deref().map(str::to_lowercase);
        let mut found: Vec<Product> = tables
            .products
            .values()
            .filter(|p| p.is_visible(search.store_id))
            .filter(|p| !search.visible_individually_only || p.visible_individually)
            .filter(|p| !search.mark_as_new_only || p.mark_as_new)
            .filter(|p| !search.featured_on_home_page_only || p.show_on_home_page)
            .filter(|p| {
                search.category_ids.is_empty()
                    || p.category_ids.iter().any(|c| search.category_ids.contains(c))
            })
            .filter(|p| {
                search
                    .manufacturer_id
                    .map_or(true, |m| p.manufacturer_ids.contains(&m))
            })
            .filter(|p| {
                keywords.as_deref().map_or(true, |k| {
                    p.name.to_lowercase().contains(k) || p.short_description.to_lowercase().contains(k)
                })
            })
            .cloned()
            .collect();

        match search.order_by {
            ProductSortingEnum::Position => {
                found.sort_by(|a, b| a.display_order.cmp(&b.display_order).then(a.id.cmp(&b.id)))
            }
            ProductSortingEnum::NameAsc => found.sort_by(|a, b| a.name.cmp(&b.name)),
            ProductSortingEnum::PriceAsc => found.sort_by_key(|p| p.price.amount_cents),
            ProductSortingEnum::PriceDesc => {
                found.sort_by_key(|p| std::cmp::Reverse(p.price.amount_cents))
            }
            ProductSortingEnum::CreatedOn => {
                found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
            }
        }

        let page_size = if search.page_size == 0 {
            usize::MAX
        } else {
            search.page_size
        };
        Ok(PagedList::from_vec(found, search.page_index, page_size))
    }

    fn update_product(&self, product: &Product) -> Result<(), ServiceError> {
        let mut tables = self.write()?;
        match tables.products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(())
            }
            None => Err(ServiceError::not_found("Product", product.id)),
        }
    }
}

fn sort_categories(categories: &mut [Category]) {
    categories.sort_by(|a, b| a.display_order.cmp(&b.display_order).then(a.name.cmp(&b.name)));
}

impl CategoryService for MemoryStore {
    fn get_category_by_id(&self, id: CategoryId) -> Result<Option<Category>, ServiceError> {
        Ok(self.read()?.categories.get(&id).filter(|c| !c.deleted).cloned())
    }

    fn get_all_categories(&self, store_id: StoreId) -> Result<Vec<Category>, ServiceError> {
        let mut categories: Vec<Category> = self
            .read()?
            .categories
            .values()
            .filter(|c| c.is_visible(store_id))
            .cloned()
            .collect();
        sort_categories(&mut categories);
        Ok(categories)
    }

    fn get_categories_by_parent(
        &self,
        parent: Option<CategoryId>,
        store_id: StoreId,
    ) -> Result<Vec<Category>, ServiceError> {
        let mut categories: Vec<Category> = self
            .read()?
            .categories
            .values()
            .filter(|c| c.parent_id == parent && c.is_visible(store_id))
            .cloned()
            .collect();
        sort_categories(&mut categories);
        Ok(categories)
    }
}

impl ManufacturerService for MemoryStore {
    fn get_manufacturer_by_id(&self, id: ManufacturerId) -> Result<Option<Manufacturer>, ServiceError> {
        Ok(self.read()?.manufacturers.get(&id).filter(|m| !m.deleted).cloned())
    }

    fn get_all_manufacturers(&self, store_id: StoreId) -> Result<Vec<Manufacturer>, ServiceError> {
        let mut manufacturers: Vec<Manufacturer> = self
            .read()?
            .manufacturers
            .values()
            .filter(|m| m.is_visible(store_id))
            .cloned()
            .collect();
        manufacturers.sort_by(|a, b| a.display_order.cmp(&b.display_order).then(a.name.cmp(&b.name)));
        Ok(manufacturers)
    }
}

impl SpecificationAttributeService for MemoryStore {
    fn get_specification_attribute_by_id(
        &self,
        id: SpecAttributeId,
    ) -> Result<Option<SpecificationAttribute>, ServiceError> {
        Ok(self.read()?.spec_attributes.get(&id).cloned())
    }

    fn get_product_specifications(
        &self,
        product_id: ProductId,
        show_on_product_page: Option<bool>,
    ) -> Result<Vec<ProductSpecification>, ServiceError> {
        let mut specs: Vec<ProductSpecification> = self
            .read()?
            .product_specs
            .iter()
            .filter(|s| s.product_id == product_id)
            .filter(|s| show_on_product_page.map_or(true, |show| s.show_on_product_page == show))
            .cloned()
            .collect();
        specs.sort_by_key(|s| s.display_order);
        Ok(specs)
    }
}

impl PictureService for MemoryStore {
    fn get_picture_by_id(&self, id: PictureId) -> Result<Option<Picture>, ServiceError> {
        Ok(self.read()?.pictures.get(&id).cloned())
    }
}

impl ReviewService for MemoryStore {
    fn get_review_by_id(&self, id: ReviewId) -> Result<Option<ProductReview>, ServiceError> {
        Ok(self.read()?.reviews.get(&id).cloned())
    }

    fn get_product_reviews(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        approved_only: bool,
    ) -> Result<Vec<ProductReview>, ServiceError> {
        let mut reviews: Vec<ProductReview> = self
            .read()?
            .reviews
            .values()
            .filter(|r| r.product_id == product_id && r.store_id == store_id)
            .filter(|r| !approved_only || r.is_approved)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reviews)
    }

    fn insert_review(&self, mut review: ProductReview) -> Result<ProductReview, ServiceError> {
        let mut tables = self.write()?;
        if !tables.products.contains_key(&review.product_id) {
            return Err(ServiceError::not_found("Product", review.product_id));
        }
        review.id = ReviewId::new(tables.next_id());
        tables.reviews.insert(review.id, review.clone());
        refresh_review_totals(&mut tables, review.product_id);
        Ok(review)
    }

    fn update_review(&self, review: &ProductReview) -> Result<(), ServiceError> {
        let mut tables = self.write()?;
        match tables.reviews.get_mut(&review.id) {
            Some(existing) => *existing = review.clone(),
            None => return Err(ServiceError::not_found("Review", review.id)),
        }
        refresh_review_totals(&mut tables, review.product_id);
        Ok(())
    }
}

fn refresh_review_totals(tables: &mut crate::memory::Tables, product_id: ProductId) {
    let (sum, count) = tables
        .reviews
        .values()
        .filter(|r| r.product_id == product_id && r.is_approved)
        .fold((0i64, 0i64), |(sum, count), r| (sum + r.rating as i64, count + 1));
    if let Some(product) = tables.products.get_mut(&product_id) {
        product.approved_rating_sum = sum;
        product.approved_total_reviews = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    fn store_with_products() -> MemoryStore {
        let store = MemoryStore::new();
        let books = store.add_category(Category::new(CategoryId::new(100), "Books")).unwrap();
        store
            .add_product(Product::new(ProductId::new(1), "Zebra guide", usd(900)).with_categories(vec![books]))
            .unwrap();
        store
            .add_product(Product::new(ProductId::new(2), "Apple pie recipes", usd(1500)).with_categories(vec![books]))
            .unwrap();
        let mut hidden = Product::new(ProductId::new(3), "Hidden", usd(100));
        hidden.published = false;
        store.add_product(hidden).unwrap();
        store
    }

    #[test]
    fn test_search_filters_and_sorts() {
        let store = store_with_products();
        let result = store
            .search_products(&ProductSearch {
                store_id: StoreId::new(1),
                category_ids: vec![CategoryId::new(100)],
                order_by: ProductSortingEnum::NameAsc,
                ..Default::default()
            })
            .unwrap();
        let names: Vec<_> = result.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Apple pie recipes", "Zebra guide"]);
        assert_eq!(result.total_count, 2);
    }

    #[test]
    fn test_search_keywords_and_paging() {
        let store = store_with_products();
        let result = store
            .search_products(&ProductSearch {
                store_id: StoreId::new(1),
                keywords: Some("ZEBRA".into()),
                page_size: 1,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].id, ProductId::new(1));
    }

    #[test]
    fn test_products_by_ids_keeps_order() {
        let store = store_with_products();
        let products = store
            .get_products_by_ids(&[ProductId::new(2), ProductId::new(99), ProductId::new(1)])
            .unwrap();
        let ids: Vec<_> = products.iter().map(|p| p.id.value()).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_review_totals_follow_approval() {
        let store = store_with_products();
        let mut review = store
            .insert_review(ProductReview {
                id: ReviewId::default(),
                product_id: ProductId::new(1),
                store_id: StoreId::new(1),
                customer_id: CustomerId::new(5),
                title: "Great".into(),
                review_text: "Loved it".into(),
                rating: 4,
                is_approved: false,
                helpfulness: Vec::new(),
                created_at: 0,
            })
            .unwrap();
        let product = store.get_product_by_id(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(product.approved_total_reviews, 0);

        review.is_approved = true;
        store.update_review(&review).unwrap();
        let product = store.get_product_by_id(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(product.approved_total_reviews, 1);
        assert_eq!(product.approved_rating_sum, 4);
    }

    #[test]
    fn test_picture_url() {
        let store = MemoryStore::new();
        let picture = Picture {
            id: PictureId::new(12),
            mime_type: "image/png".into(),
            seo_filename: "red-mug".into(),
            alt_attribute: None,
            title_attribute: None,
        };
        assert_eq!(
            store.get_picture_url(Some(&picture), 100, "/images/"),
            "/images/0000012_red-mug_100.png"
        );
        assert_eq!(store.get_picture_url(None, 100, "/images/"), "/images/default-image_100.png");
    }
}
