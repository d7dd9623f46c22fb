//! Outgoing storefront emails.
//!
//! Messages are rendered to plain text and queued; delivery is someone
//! else's job.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shop_domain::catalog::{Product, ProductReview};
use shop_domain::checkout::Order;
use shop_domain::customer::Customer;
use shop_domain::forum::{ForumPost, ForumTopic};
use shop_domain::store::Store;

use crate::memory::MemoryStore;
use crate::ServiceError;

/// Which template produced a queued email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageTemplate {
    CustomerWelcome,
    CustomerEmailValidation,
    CustomerPasswordRecovery,
    EmailAFriend,
    ProductReviewNotification,
    NewForumTopic,
    NewForumPost,
    OrderPlaced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedEmail {
    pub template: MessageTemplate,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub created_at: i64,
}

pub trait WorkflowMessageService: Send + Sync {
    fn send_customer_welcome_message(&self, store: &Store, customer: &Customer) -> Result<(), ServiceError>;

    /// Activation link for the email-validation registration type.
    fn send_customer_email_validation_message(
        &self,
        store: &Store,
        customer: &Customer,
        token: &str,
    ) -> Result<(), ServiceError>;

    fn send_customer_password_recovery_message(
        &self,
        store: &Store,
        customer: &Customer,
        token: &str,
    ) -> Result<(), ServiceError>;

    fn send_product_email_a_friend_message(
        &self,
        store: &Store,
        sender_email: &str,
        friend_email: &str,
        product: &Product,
        personal_message: &str,
    ) -> Result<(), ServiceError>;

    /// Tell the store owner a review is waiting.
    fn send_product_review_notification(
        &self,
        store: &Store,
        product: &Product,
        review: &ProductReview,
    ) -> Result<(), ServiceError>;

    fn send_new_forum_topic_message(
        &self,
        store: &Store,
        subscriber: &Customer,
        topic: &ForumTopic,
        forum_name: &str,
    ) -> Result<(), ServiceError>;

    fn send_new_forum_post_message(
        &self,
        store: &Store,
        subscriber: &Customer,
        topic: &ForumTopic,
        post: &ForumPost,
        page: usize,
    ) -> Result<(), ServiceError>;

    fn send_order_placed_message(&self, store: &Store, customer_email: &str, order: &Order) -> Result<(), ServiceError>;
}

/// Queues messages into the in-memory store.
pub struct QueuedMessageService {
    store: Arc<MemoryStore>,
}

impl QueuedMessageService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    fn queue(&self, template: MessageTemplate, to: &str, subject: String, body: String) -> Result<(), ServiceError> {
        if to.trim().is_empty() {
            tracing::warn!(?template, "email has no recipient, dropped");
            return Ok(());
        }
        tracing::debug!(?template, to, "email queued");
        self.store.write()?.emails.push(QueuedEmail {
            template,
            to: to.to_string(),
            subject,
            body,
            created_at: shop_domain::current_timestamp(),
        });
        Ok(())
    }
}

fn recipient(customer: &Customer) -> &str {
    customer.email.as_deref().unwrap_or_default()
}

impl WorkflowMessageService for QueuedMessageService {
    fn send_customer_welcome_message(&self, store: &Store, customer: &Customer) -> Result<(), ServiceError> {
        self.queue(
            MessageTemplate::CustomerWelcome,
            recipient(customer),
            format!("Welcome to {}", store.name),
            format!(
                "Hello {},\n\nThanks for registering at {}.\n",
                customer.display_name(store.id),
                store.url
            ),
        )
    }

    fn send_customer_email_validation_message(
        &self,
        store: &Store,
        customer: &Customer,
        token: &str,
    ) -> Result<(), ServiceError> {
        self.queue(
            MessageTemplate::CustomerEmailValidation,
            recipient(customer),
            format!("{}. Email validation", store.name),
            format!(
                "To activate your account click here:\n{}customer/activation?token={}&guid={}\n",
                store.url, token, customer.guid
            ),
        )
    }

    fn send_customer_password_recovery_message(
        &self,
        store: &Store,
        customer: &Customer,
        token: &str,
    ) -> Result<(), ServiceError> {
        self.queue(
            MessageTemplate::CustomerPasswordRecovery,
            recipient(customer),
            format!("{}. Password recovery", store.name),
            format!(
                "To change your password click here:\n{}passwordrecovery/confirm?token={}&guid={}\n",
                store.url, token, customer.guid
            ),
        )
    }

    fn send_product_email_a_friend_message(
        &self,
        store: &Store,
        sender_email: &str,
        friend_email: &str,
        product: &Product,
        personal_message: &str,
    ) -> Result<(), ServiceError> {
        self.queue(
            MessageTemplate::EmailAFriend,
            friend_email,
            format!("{}. Referred item", store.name),
            format!(
                "{} was shopping on {} and wanted to share {} with you.\n{}product/{}\n\n{}\n",
                sender_email, store.name, product.name, store.url, product.id, personal_message
            ),
        )
    }

    fn send_product_review_notification(
        &self,
        store: &Store,
        product: &Product,
        review: &ProductReview,
    ) -> Result<(), ServiceError> {
        self.queue(
            MessageTemplate::ProductReviewNotification,
            &store.owner_email,
            format!("{}. New product review", store.name),
            format!(
                "A new review of \"{}\" has been posted: {}\nRating: {}\n",
                product.name, review.title, review.rating
            ),
        )
    }

    fn send_new_forum_topic_message(
        &self,
        store: &Store,
        subscriber: &Customer,
        topic: &ForumTopic,
        forum_name: &str,
    ) -> Result<(), ServiceError> {
        self.queue(
            MessageTemplate::NewForumTopic,
            recipient(subscriber),
            format!("{}. New Topic \"{}\"", store.name, topic.subject),
            format!(
                "A new topic \"{}\" has been created in \"{}\".\n{}boards/topic/{}\n",
                topic.subject, forum_name, store.url, topic.id
            ),
        )
    }

    fn send_new_forum_post_message(
        &self,
        store: &Store,
        subscriber: &Customer,
        topic: &ForumTopic,
        post: &ForumPost,
        page: usize,
    ) -> Result<(), ServiceError> {
        self.queue(
            MessageTemplate::NewForumPost,
            recipient(subscriber),
            format!("{}. New Post in \"{}\"", store.name, topic.subject),
            format!(
                "A new post has been created in \"{}\".\n{}boards/topic/{}/page/{}#{}\n",
                topic.subject, store.url, topic.id, page, post.id
            ),
        )
    }

    fn send_order_placed_message(&self, store: &Store, customer_email: &str, order: &Order) -> Result<(), ServiceError> {
        self.queue(
            MessageTemplate::OrderPlaced,
            customer_email,
            format!("{}. Order receipt #{}", store.name, order.id),
            format!(
                "Thanks for your order #{}.\nTotal: {}\n",
                order.id,
                order.display_in_customer_currency(&order.total)
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_domain::prelude::*;

    #[test]
    fn test_welcome_message_is_queued() {
        let store = Arc::new(MemoryStore::new());
        let service = QueuedMessageService::new(store.clone());
        let shop = Store::new(StoreId::new(1), "Demo", "http://demo.local/");
        let mut customer = Customer::guest(CustomerId::new(5));
        customer.email = Some("jo@example.com".into());

        service.send_customer_welcome_message(&shop, &customer).unwrap();
        let emails = store.queued_emails().unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].template, MessageTemplate::CustomerWelcome);
        assert_eq!(emails[0].to, "jo@example.com");
        assert_eq!(emails[0].subject, "Welcome to Demo");
    }

    #[test]
    fn test_message_without_recipient_is_dropped() {
        let store = Arc::new(MemoryStore::new());
        let service = QueuedMessageService::new(store.clone());
        let shop = Store::new(StoreId::new(1), "Demo", "http://demo.local/");
        let customer = Customer::guest(CustomerId::new(5));

        service.send_customer_welcome_message(&shop, &customer).unwrap();
        assert!(store.queued_emails().unwrap().is_empty());
    }
}
