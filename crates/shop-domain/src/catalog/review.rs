//! Product reviews.

use crate::ids::{CustomerId, ProductId, ReviewId, StoreId};
use serde::{Deserialize, Serialize};

/// One customer's vote on whether a review was useful.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewHelpfulness {
    pub customer_id: CustomerId,
    pub was_helpful: bool,
}

/// A customer review of a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductReview {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub customer_id: CustomerId,
    pub title: String,
    pub review_text: String,
    /// 1 to 5.
    pub rating: i32,
    pub is_approved: bool,
    pub helpfulness: Vec<ReviewHelpfulness>,
    pub created_at: i64,
}

impl ProductReview {
    pub fn helpful_yes_total(&self) -> usize {
        self.helpfulness.iter().filter(|h| h.was_helpful).count()
    }

    pub fn helpful_no_total(&self) -> usize {
        self.helpfulness.iter().filter(|h| !h.was_helpful).count()
    }

    /// Record a vote, replacing the customer's earlier vote if any.
    pub fn vote(&mut self, customer_id: CustomerId, was_helpful: bool) {
        match self
            .helpfulness
            .iter_mut()
            .find(|h| h.customer_id == customer_id)
        {
            Some(existing) => existing.was_helpful = was_helpful,
            None => self.helpfulness.push(ReviewHelpfulness {
                customer_id,
                was_helpful,
            }),
        }
    }
}
