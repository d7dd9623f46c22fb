//! Demo data for a single-store storefront.

use shop_domain::catalog::{
    AttributeControlType, LowStockActivity, ProductAttributeMapping, ProductAttributeValue, SpecificationOption,
};
use shop_domain::customer::CustomerRole;
use shop_domain::discount::GiftCard;
use shop_domain::forum::{ForumPost, ForumTopic, ForumTopicType};
use shop_domain::prelude::*;

use crate::customers::CustomerService;
use crate::forums::ForumService;
use crate::memory::MemoryStore;
use crate::ServiceError;

pub const DEMO_STORE_ID: StoreId = StoreId::new(1);
pub const DEMO_COUPON_CODE: &str = "WELCOME10";
pub const DEMO_GIFT_CARD_CODE: &str = "GIFT-25";

/// Ids of the seeded entities, for demos and tests.
#[derive(Debug, Clone)]
pub struct DemoData {
    pub store_id: StoreId,
    pub electronics: CategoryId,
    pub laptops: CategoryId,
    pub apparel: CategoryId,
    pub laptop: ProductId,
    pub shirt: ProductId,
    pub gift_wrap: ProductId,
    pub manufacturer: ManufacturerId,
    pub moderator: CustomerId,
    pub forum: ForumId,
    pub topic: TopicId,
}

fn usd(cents: i64) -> Money {
    Money::new(cents, Currency::USD)
}

fn value(id: u64, name: &str, adjustment: i64, preselected: bool) -> ProductAttributeValue {
    ProductAttributeValue {
        id: AttributeValueId::new(id),
        name: name.to_string(),
        price_adjustment: usd(adjustment),
        weight_adjustment: 0.0,
        is_preselected: preselected,
        display_order: id as i32,
    }
}

/// Fill `memory` with one store, a small catalog, a coupon, a gift card
/// and a forum with one conversation.
pub fn seed_demo(memory: &MemoryStore) -> Result<DemoData, ServiceError> {
    memory.add_store(
        Store::new(DEMO_STORE_ID, "Demo Store", "http://localhost:8080/").with_owner_email("owner@demo.local"),
    )?;
    for (system_name, friendly_name) in [("DefaultClean", "Default clean"), ("Midnight", "Midnight")] {
        memory.add_theme(ThemeDescriptor {
            system_name: system_name.to_string(),
            friendly_name: friendly_name.to_string(),
            preview_image_url: Some(format!("/themes/{system_name}/preview.jpg")),
            supports_rtl: false,
        })?;
    }
    memory.set_currency_rate(Currency::EUR, 0.92)?;

    let electronics = memory.add_category(Category::new(CategoryId::default(), "Electronics").with_display_order(1))?;
    let laptops = memory.add_category(Category::new(CategoryId::default(), "Laptops").with_parent(electronics))?;
    let apparel = memory.add_category(Category::new(CategoryId::default(), "Apparel").with_display_order(2))?;

    let picture = memory.add_picture(Picture {
        id: PictureId::default(),
        mime_type: "image/jpeg".to_string(),
        seo_filename: "lumen-logo".to_string(),
        alt_attribute: None,
        title_attribute: None,
    })?;
    let mut maker = Manufacturer::new(ManufacturerId::default(), "Lumen");
    maker.picture_id = Some(picture);
    let manufacturer = memory.add_manufacturer(maker)?;

    let mut laptop = Product::new(ProductId::default(), "Lumen Book 14", usd(129_900))
        .with_sku("LB-14")
        .with_old_price(usd(139_900))
        .with_categories(vec![laptops])
        .with_manufacturers(vec![manufacturer])
        .with_attribute(ProductAttributeMapping {
            id: AttributeMappingId::new(1),
            name: "Memory".to_string(),
            text_prompt: None,
            is_required: true,
            control_type: AttributeControlType::DropdownList,
            display_order: 1,
            values: vec![value(1, "16 GB", 0, true), value(2, "32 GB", 20_000, false)],
        });
    let mut inventory = InventoryLevel::new(25);
    inventory.min_stock_quantity = 2;
    inventory.low_stock_activity = LowStockActivity::DisableBuyButton;
    laptop.inventory = inventory;
    laptop.display_stock_availability = true;
    laptop.weight = 1.4;
    laptop.mark_as_new = true;
    laptop.show_on_home_page = true;
    laptop.tier_prices = vec![TierPrice {
        quantity: 5,
        price: usd(119_900),
        customer_role: None,
        store_id: None,
    }];
    let laptop = memory.add_product(laptop)?;

    let mut shirt = Product::new(ProductId::default(), "Linen Shirt", usd(4_500))
        .with_sku("LS-01")
        .with_categories(vec![apparel])
        .with_attribute(ProductAttributeMapping {
            id: AttributeMappingId::new(2),
            name: "Size".to_string(),
            text_prompt: None,
            is_required: true,
            control_type: AttributeControlType::RadioList,
            display_order: 1,
            values: vec![value(3, "S", 0, false), value(4, "M", 0, false), value(5, "XL", 300, false)],
        })
        .with_attribute(ProductAttributeMapping {
            id: AttributeMappingId::new(3),
            name: "Monogram".to_string(),
            text_prompt: Some("Monogram initials".to_string()),
            is_required: false,
            control_type: AttributeControlType::TextBox,
            display_order: 2,
            values: Vec::new(),
        });
    shirt.weight = 0.3;
    shirt.mark_as_new = true;
    let shirt = memory.add_product(shirt)?;

    let mut gift_wrap = Product::new(ProductId::default(), "Gift Wrap", usd(500));
    gift_wrap.is_shipping_enabled = false;
    gift_wrap.show_on_home_page = true;
    let gift_wrap = memory.add_product(gift_wrap)?;

    memory.add_specification_attribute(SpecificationAttribute {
        id: SpecAttributeId::new(1),
        name: "Screen size".to_string(),
        display_order: 1,
        options: vec![SpecificationOption {
            id: SpecOptionId::new(1),
            name: "14 in".to_string(),
            display_order: 1,
        }],
    })?;
    memory.add_specification_attribute(SpecificationAttribute {
        id: SpecAttributeId::new(2),
        name: "CPU".to_string(),
        display_order: 2,
        options: vec![SpecificationOption {
            id: SpecOptionId::new(2),
            name: "8 cores".to_string(),
            display_order: 1,
        }],
    })?;
    for (attribute, option, order) in [(1, 1, 1), (2, 2, 2)] {
        memory.add_product_specification(ProductSpecification {
            product_id: laptop,
            attribute_id: SpecAttributeId::new(attribute),
            option_id: SpecOptionId::new(option),
            custom_value: None,
            allow_filtering: true,
            show_on_product_page: true,
            display_order: order,
        })?;
    }

    memory.add_discount(
        Discount::percentage(
            DiscountId::default(),
            "Welcome 10%",
            DiscountType::AssignedToOrderSubTotal,
            10.0,
            Currency::USD,
        )
        .with_coupon(DEMO_COUPON_CODE),
    )?;
    memory.add_gift_card(GiftCard {
        id: GiftCardId::default(),
        coupon_code: DEMO_GIFT_CARD_CODE.to_string(),
        amount: usd(2_500),
        is_activated: true,
        usage: Vec::new(),
    })?;

    let mut moderator = memory.insert_guest_customer()?;
    moderator.email = Some("moderator@demo.local".to_string());
    moderator.username = Some("moderator".to_string());
    moderator.promote_to_registered();
    moderator.roles.push(CustomerRole::ForumModerators);
    memory.update_customer(&moderator)?;

    let group = memory.add_forum_group("General", 1)?;
    let forum = memory.add_forum(group, "Announcements", "News from the store", 1)?;
    memory.add_forum(group, "Help", "Questions about orders and products", 2)?;
    let topic = memory.insert_topic(ForumTopic {
        id: TopicId::default(),
        forum_id: forum,
        customer_id: moderator.id,
        topic_type: ForumTopicType::Announcement,
        subject: "Welcome to the Demo Store forums".to_string(),
        num_posts: 0,
        views: 0,
        first_post_id: None,
        last_post_id: None,
        last_post_customer_id: None,
        last_post_time: None,
        created_at: 0,
        updated_at: 0,
    })?;
    memory.insert_post(ForumPost {
        id: PostId::default(),
        topic_id: topic.id,
        customer_id: moderator.id,
        text: "Say [b]hello[/b] and tell us what you are looking for.".to_string(),
        ip_address: None,
        created_at: 0,
        updated_at: 0,
    })?;

    tracing::info!(store_id = %DEMO_STORE_ID, "demo data seeded");
    Ok(DemoData {
        store_id: DEMO_STORE_ID,
        electronics,
        laptops,
        apparel,
        laptop,
        shirt,
        gift_wrap,
        manufacturer,
        moderator: moderator.id,
        forum,
        topic: topic.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductService;

    #[test]
    fn test_seed_is_consistent() {
        let memory = MemoryStore::new();
        let demo = seed_demo(&memory).unwrap();
        let laptop = memory.get_product_by_id(demo.laptop).unwrap().unwrap();
        assert_eq!(laptop.category_ids, vec![demo.laptops]);
        let forum = memory.get_forum_by_id(demo.forum).unwrap().unwrap();
        assert_eq!((forum.num_topics, forum.num_posts), (1, 1));
    }
}
