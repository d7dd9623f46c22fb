//! What an action hands back: a view model, a redirect or a payload.

use std::collections::BTreeMap;

use http::StatusCode;
use serde::Serialize;
use shop_domain::{CustomerId, ForumGroupId, ForumId, OrderId, ProductId, TopicId};

/// Where a redirect goes. Paths use numeric ids only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    HomePage,
    Login { return_url: Option<String> },
    RegisterResult { result: u8 },
    ShoppingCart,
    Wishlist { customer_guid: Option<String> },
    CheckoutIndex,
    CheckoutBillingAddress,
    CheckoutShippingAddress,
    CheckoutShippingMethod,
    CheckoutPaymentMethod,
    CheckoutPaymentInfo,
    CheckoutConfirm,
    CheckoutCompleted(OrderId),
    Product(ProductId),
    CompareProducts,
    Boards,
    BoardsForumGroup(ForumGroupId),
    BoardsForum(ForumId),
    BoardsTopic { id: TopicId, page: usize },
    CustomerInfo,
    CustomerAddresses,
    CustomerOrders,
    CustomerOrderDetails(OrderId),
    CustomerForumSubscriptions,
    CustomerProfile(CustomerId),
    External(String),
    Local(String),
}

impl RedirectTarget {
    pub fn path(&self) -> String {
        match self {
            RedirectTarget::HomePage => "/".to_string(),
            RedirectTarget::Login { return_url: None } => "/login".to_string(),
            RedirectTarget::Login {
                return_url: Some(url),
            } => format!("/login?returnUrl={}", encode_query_value(url)),
            RedirectTarget::RegisterResult { result } => format!("/registerresult/{}", result),
            RedirectTarget::ShoppingCart => "/cart".to_string(),
            RedirectTarget::Wishlist { customer_guid: None } => "/wishlist".to_string(),
            RedirectTarget::Wishlist {
                customer_guid: Some(guid),
            } => format!("/wishlist/{}", guid),
            RedirectTarget::CheckoutIndex => "/checkout".to_string(),
            RedirectTarget::CheckoutBillingAddress => "/checkout/billingaddress".to_string(),
            RedirectTarget::CheckoutShippingAddress => "/checkout/shippingaddress".to_string(),
            RedirectTarget::CheckoutShippingMethod => "/checkout/shippingmethod".to_string(),
            RedirectTarget::CheckoutPaymentMethod => "/checkout/paymentmethod".to_string(),
            RedirectTarget::CheckoutPaymentInfo => "/checkout/paymentinfo".to_string(),
            RedirectTarget::CheckoutConfirm => "/checkout/confirm".to_string(),
            RedirectTarget::CheckoutCompleted(id) => format!("/checkout/completed/{}", id),
            RedirectTarget::Product(id) => format!("/product/{}", id),
            RedirectTarget::CompareProducts => "/compareproducts".to_string(),
            RedirectTarget::Boards => "/boards".to_string(),
            RedirectTarget::BoardsForumGroup(id) => format!("/boards/forumgroup/{}", id),
            RedirectTarget::BoardsForum(id) => format!("/boards/forum/{}", id),
            RedirectTarget::BoardsTopic { id, page } if *page > 1 => {
                format!("/boards/topic/{}/page/{}", id, page)
            }
            RedirectTarget::BoardsTopic { id, .. } => format!("/boards/topic/{}", id),
            RedirectTarget::CustomerInfo => "/customer/info".to_string(),
            RedirectTarget::CustomerAddresses => "/customer/addresses".to_string(),
            RedirectTarget::CustomerOrders => "/customer/orders".to_string(),
            RedirectTarget::CustomerOrderDetails(id) => format!("/orderdetails/{}", id),
            RedirectTarget::CustomerForumSubscriptions => "/boards/forumsubscriptions".to_string(),
            RedirectTarget::CustomerProfile(id) => format!("/profile/{}", id),
            RedirectTarget::External(url) | RedirectTarget::Local(url) => url.clone(),
        }
    }
}

fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Validation errors collected while handling a form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelState {
    pub errors: BTreeMap<String, Vec<String>>,
    /// Errors not tied to one field.
    pub summary: Vec<String>,
}

impl ModelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_default().push(message.into());
    }

    pub fn add_summary(&mut self, message: impl Into<String>) {
        self.summary.push(message.into());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.summary.is_empty()
    }

    pub fn field_errors(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every message, field errors first.
    pub fn all_messages(&self) -> Vec<String> {
        self.errors
            .values()
            .flatten()
            .chain(self.summary.iter())
            .cloned()
            .collect()
    }
}

/// Result of a controller action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult<M> {
    View {
        view: &'static str,
        model: M,
        model_state: ModelState,
    },
    Redirect(RedirectTarget),
    Json {
        status: StatusCode,
        body: serde_json::Value,
    },
    Content {
        content_type: &'static str,
        body: String,
    },
    /// Nothing to show, e.g. a disabled block.
    Empty,
    NotFound,
    Unauthorized,
}

impl<M> ActionResult<M> {
    pub fn view(view: &'static str, model: M) -> Self {
        ActionResult::View {
            view,
            model,
            model_state: ModelState::default(),
        }
    }

    pub fn view_with_state(view: &'static str, model: M, model_state: ModelState) -> Self {
        ActionResult::View {
            view,
            model,
            model_state,
        }
    }

    pub fn redirect(target: RedirectTarget) -> Self {
        ActionResult::Redirect(target)
    }

    pub fn json(body: serde_json::Value) -> Self {
        ActionResult::Json {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn rss(body: String) -> Self {
        ActionResult::Content {
            content_type: "application/rss+xml",
            body,
        }
    }

    /// Transform the model of a view, passing other results through.
    pub fn map_model<N>(self, f: impl FnOnce(M) -> N) -> ActionResult<N> {
        match self {
            ActionResult::View {
                view,
                model,
                model_state,
            } => ActionResult::View {
                view,
                model: f(model),
                model_state,
            },
            ActionResult::Redirect(target) => ActionResult::Redirect(target),
            ActionResult::Json { status, body } => ActionResult::Json { status, body },
            ActionResult::Content { content_type, body } => ActionResult::Content { content_type, body },
            ActionResult::Empty => ActionResult::Empty,
            ActionResult::NotFound => ActionResult::NotFound,
            ActionResult::Unauthorized => ActionResult::Unauthorized,
        }
    }

    pub fn model(&self) -> Option<&M> {
        match self {
            ActionResult::View { model, .. } => Some(model),
            _ => None,
        }
    }

    pub fn into_model(self) -> Option<M> {
        match self {
            ActionResult::View { model, .. } => Some(model),
            _ => None,
        }
    }

    pub fn model_state(&self) -> Option<&ModelState> {
        match self {
            ActionResult::View { model_state, .. } => Some(model_state),
            _ => None,
        }
    }

    pub fn view_name(&self) -> Option<&'static str> {
        match self {
            ActionResult::View { view, .. } => Some(view),
            _ => None,
        }
    }

    pub fn redirect_target(&self) -> Option<&RedirectTarget> {
        match self {
            ActionResult::Redirect(target) => Some(target),
            _ => None,
        }
    }

    pub fn json_body(&self) -> Option<&serde_json::Value> {
        match self {
            ActionResult::Json { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn content_body(&self) -> Option<&str> {
        match self {
            ActionResult::Content { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ActionResult::NotFound)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ActionResult::Unauthorized)
    }

    /// Status code a front end would answer with.
    pub fn status(&self) -> StatusCode {
        match self {
            ActionResult::View { .. } | ActionResult::Content { .. } => StatusCode::OK,
            ActionResult::Redirect(_) => StatusCode::FOUND,
            ActionResult::Json { status, .. } => *status,
            ActionResult::Empty => StatusCode::NO_CONTENT,
            ActionResult::NotFound => StatusCode::NOT_FOUND,
            ActionResult::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_paths() {
        assert_eq!(RedirectTarget::BoardsTopic { id: TopicId::new(4), page: 1 }.path(), "/boards/topic/4");
        assert_eq!(
            RedirectTarget::BoardsTopic { id: TopicId::new(4), page: 3 }.path(),
            "/boards/topic/4/page/3"
        );
        assert_eq!(
            RedirectTarget::Login {
                return_url: Some("/checkout?step=1".to_string())
            }
            .path(),
            "/login?returnUrl=/checkout%3Fstep%3D1"
        );
        assert_eq!(RedirectTarget::CheckoutCompleted(OrderId::new(9)).path(), "/checkout/completed/9");
    }

    #[test]
    fn test_model_state() {
        let mut state = ModelState::new();
        assert!(state.is_valid());
        state.add_error("Email", "Email is required");
        state.add_summary("Login was unsuccessful");
        assert!(!state.is_valid());
        assert_eq!(state.field_errors("Email").len(), 1);
        assert_eq!(state.all_messages(), vec!["Email is required", "Login was unsuccessful"]);
    }

    #[test]
    fn test_statuses() {
        let result: ActionResult<()> = ActionResult::redirect(RedirectTarget::HomePage);
        assert_eq!(result.status(), StatusCode::FOUND);
        assert_eq!(ActionResult::<()>::NotFound.status(), StatusCode::NOT_FOUND);
        assert!(ActionResult::<()>::view("Index", ()).model().is_some());
    }
}
