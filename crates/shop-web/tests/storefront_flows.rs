//! End-to-end storefront journeys across several controllers.

use shop_cache::SessionId;
use shop_domain::prelude::*;
use shop_services::payments::CHECK_MONEY_ORDER;
use shop_services::seed::{seed_demo, DemoData, DEMO_STORE_ID};
use shop_services::ServiceRegistry;
use shop_web::models::boards::{PostForm, TopicForm};
use shop_web::models::catalog::ProductDetailsForm;
use shop_web::models::checkout::NewAddressForm;
use shop_web::models::customer::{LoginForm, RegisterForm};
use shop_web::models::AddressModel;
use shop_web::prelude::*;

struct Shop {
    services: ServiceRegistry,
    demo: DemoData,
    factory: ContextFactory,
}

impl Shop {
    fn open() -> Self {
        let services = ServiceRegistry::in_memory();
        let demo = seed_demo(&services.memory).unwrap();
        let factory = ContextFactory::new(services.clone(), ShopConfig::default());
        Self {
            services,
            demo,
            factory,
        }
    }

    fn visit(&self) -> WorkContext {
        self.factory.resolve(DEMO_STORE_ID, &SessionId::generate()).unwrap()
    }

    fn register(&self, ctx: &mut WorkContext, email: &str) {
        let form = RegisterForm {
            email: email.into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            ..Default::default()
        };
        let result = CustomerController::new(self.services.clone())
            .register(ctx, &form)
            .unwrap();
        assert_eq!(result.redirect_target(), Some(&RedirectTarget::RegisterResult { result: 1 }));
    }
}

fn shipping_address() -> NewAddressForm {
    NewAddressForm {
        address: AddressModel {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@example.com".into(),
            address1: "10 Harbor Rd".into(),
            city: "Arlington".into(),
            country_code: "us".into(),
            zip: "22201".into(),
            ..Default::default()
        },
        ship_to_same_address: true,
    }
}

#[test]
fn test_browse_register_checkout_and_reorder() {
    let shop = Shop::open();
    let mut ctx = shop.visit();
    let products = ProductController::new(shop.services.clone());
    let cart = ShoppingCartController::new(shop.services.clone());
    let checkout = CheckoutController::new(shop.services.clone());
    let customer = CustomerController::new(shop.services.clone());

    let details = products
        .product_details(&mut ctx, shop.demo.laptop, None)
        .unwrap()
        .into_model()
        .unwrap();
    assert_eq!(details.name, "Lumen Book 14");

    let mut form = ProductDetailsForm {
        quantity: 1,
        ..Default::default()
    };
    form.attributes.insert(AttributeMappingId::new(1), "2".to_string());
    let added = cart
        .add_product_details(&mut ctx, shop.demo.laptop, ShoppingCartType::ShoppingCart, &form)
        .unwrap();
    assert_eq!(added.json_body().unwrap()["success"], true);

    // Registering keeps the guest's cart on the same record.
    shop.register(&mut ctx, "grace@example.com");
    let lines = cart.cart(&mut ctx).unwrap().into_model().unwrap();
    assert_eq!(lines.items.len(), 1);
    assert_eq!(lines.items[0].attribute_info, "Memory: 32 GB");

    checkout.new_billing_address(&mut ctx, &shipping_address()).unwrap();
    let methods = checkout.shipping_method(&mut ctx).unwrap().into_model().unwrap();
    checkout
        .select_shipping_method(&mut ctx, &methods.shipping_methods[0].form_value)
        .unwrap();
    checkout.select_payment_method(&mut ctx, CHECK_MONEY_ORDER).unwrap();
    let placed = checkout.confirm_order(&mut ctx).unwrap();
    let Some(RedirectTarget::CheckoutCompleted(order_id)) = placed.redirect_target().cloned() else {
        panic!("order was not placed: {placed:?}");
    };

    let orders = customer.orders(&mut ctx).unwrap().into_model().unwrap();
    assert_eq!(orders.orders.len(), 1);
    assert_eq!(orders.orders[0].id, order_id);

    let order = customer.order_details(&mut ctx, order_id).unwrap().into_model().unwrap();
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].attribute_info, "Memory: 32 GB");
    assert_eq!(order.shipping_method.as_deref(), Some("Ground"));

    let emails = shop.services.memory.queued_emails().unwrap();
    assert!(emails.iter().any(|e| e.to == "grace@example.com" && e.body.contains(&order_id.to_string())));

    assert!(cart.cart(&mut ctx).unwrap().into_model().unwrap().items.is_empty());
    let again = customer.reorder(&mut ctx, order_id).unwrap();
    assert_eq!(again.redirect_target(), Some(&RedirectTarget::ShoppingCart));
    assert_eq!(cart.cart(&mut ctx).unwrap().into_model().unwrap().items.len(), 1);

    // Someone else cannot look at the order.
    let mut stranger = shop.visit();
    assert!(customer.order_details(&mut stranger, order_id).unwrap().is_unauthorized());
}

#[test]
fn test_returning_customer_gets_guest_cart_on_login() {
    let shop = Shop::open();
    let customer = CustomerController::new(shop.services.clone());
    let cart = ShoppingCartController::new(shop.services.clone());

    let mut first = shop.visit();
    shop.register(&mut first, "linus@example.com");
    customer.logout(&mut first).unwrap();

    let mut later = shop.visit();
    let added = cart
        .add_product_simple(&mut later, shop.demo.gift_wrap, ShoppingCartType::ShoppingCart)
        .unwrap();
    assert_eq!(added.json_body().unwrap()["success"], true);

    let login = LoginForm {
        username_or_email: "linus@example.com".into(),
        password: "secret1".into(),
        return_url: Some("https://elsewhere.example/".into()),
        ..Default::default()
    };
    let result = customer.login(&mut later, &login).unwrap();
    assert_eq!(result.redirect_target(), Some(&RedirectTarget::HomePage));
    assert!(later.is_registered());

    let model = cart.cart(&mut later).unwrap().into_model().unwrap();
    assert_eq!(model.items.len(), 1);
    assert_eq!(model.items[0].quantity, 1);
}

#[test]
fn test_forum_conversation_and_subscriptions() {
    let shop = Shop::open();
    let boards = BoardsController::new(shop.services.clone());

    let mut member = shop.visit();
    shop.register(&mut member, "ann@example.com");
    let created = boards
        .topic_create(
            &mut member,
            &TopicForm {
                forum_id: shop.demo.forum,
                subject: "Shipping to Canada?".into(),
                text: "Do you ship [b]north[/b]?".into(),
                subscribed: true,
                ..Default::default()
            },
        )
        .unwrap();
    let Some(RedirectTarget::BoardsTopic { id: topic_id, .. }) = created.redirect_target().cloned() else {
        panic!("topic was not created: {created:?}");
    };

    let moderator = shop.services.customers.get_customer_by_id(shop.demo.moderator).unwrap().unwrap();
    let mut staff = shop.visit();
    staff.switch_customer(moderator);
    boards
        .post_create(
            &mut staff,
            &PostForm {
                topic_id,
                text: "Yes, within five days.".into(),
                ..Default::default()
            },
        )
        .unwrap();

    let page = boards.topic(&mut member, topic_id, 1).unwrap().into_model().unwrap();
    assert_eq!(page.posts.len(), 2);
    assert!(page.posts[0].formatted_text.contains("<strong>north</strong>"));

    let notified = shop.services.memory.queued_emails().unwrap();
    assert!(notified.iter().any(|e| e.to == "ann@example.com" && e.subject.contains("Shipping to Canada?")));

    let subscriptions = boards
        .customer_forum_subscriptions(&mut member, 1)
        .unwrap()
        .into_model()
        .unwrap();
    assert_eq!(subscriptions.subscriptions.len(), 1);

    let feed = boards.active_discussions_rss(&mut member, None).unwrap();
    assert!(feed.content_body().unwrap().contains("Shipping to Canada?"));
}
