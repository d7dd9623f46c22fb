//! Forum entities.

use crate::ids::{CustomerId, ForumGroupId, ForumId, PostId, SubscriptionId, TopicId};
use crate::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use std::str::FromStr;

/// A top-level grouping of forums.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForumGroup {
    pub id: ForumGroupId,
    pub name: String,
    pub display_order: i32,
}

/// A forum with denormalized counters for listing pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Forum {
    pub id: ForumId,
    pub group_id: ForumGroupId,
    pub name: String,
    pub description: String,
    pub display_order: i32,
    pub num_topics: u32,
    pub num_posts: u32,
    pub last_topic_id: Option<TopicId>,
    pub last_post_id: Option<PostId>,
    pub last_post_customer_id: Option<CustomerId>,
    pub last_post_time: Option<i64>,
    pub updated_at: i64,
}

/// Ordering class of a topic within a forum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum ForumTopicType {
    #[default]
    Normal,
    Sticky,
    Announcement,
}

impl ForumTopicType {
    /// Sort rank: announcements first, then sticky, then normal topics.
    pub fn rank(&self) -> u8 {
        match self {
            ForumTopicType::Announcement => 0,
            ForumTopicType::Sticky => 1,
            ForumTopicType::Normal => 2,
        }
    }
}

impl FromStr for ForumTopicType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" | "10" => Ok(ForumTopicType::Normal),
            "sticky" | "12" => Ok(ForumTopicType::Sticky),
            "announcement" | "15" => Ok(ForumTopicType::Announcement),
            _ => Err(DomainError::UnknownValue {
                kind: "topic type",
                value: s.to_string(),
            }),
        }
    }
}

/// A discussion thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForumTopic {
    pub id: TopicId,
    pub forum_id: ForumId,
    pub customer_id: CustomerId,
    pub topic_type: ForumTopicType,
    pub subject: String,
    pub num_posts: u32,
    pub views: u32,
    pub first_post_id: Option<PostId>,
    pub last_post_id: Option<PostId>,
    pub last_post_customer_id: Option<CustomerId>,
    pub last_post_time: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A message in a topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForumPost {
    pub id: PostId,
    pub topic_id: TopicId,
    pub customer_id: CustomerId,
    pub text: String,
    pub ip_address: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A customer's request to be notified about a forum or a topic.
/// Exactly one of `forum_id` and `topic_id` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForumSubscription {
    pub id: SubscriptionId,
    pub guid: Uuid,
    pub customer_id: CustomerId,
    pub forum_id: Option<ForumId>,
    pub topic_id: Option<TopicId>,
    pub created_at: i64,
}

/// Which text a forum search looks in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ForumSearchType {
    #[default]
    All,
    TopicTitlesOnly,
    PostTextOnly,
}

impl FromStr for ForumSearchType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" | "0" => Ok(ForumSearchType::All),
            "topictitlesonly" | "10" => Ok(ForumSearchType::TopicTitlesOnly),
            "posttextonly" | "20" => Ok(ForumSearchType::PostTextOnly),
            _ => Err(DomainError::UnknownValue {
                kind: "search type",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_type_rank() {
        let mut types = vec![
            ForumTopicType::Normal,
            ForumTopicType::Announcement,
            ForumTopicType::Sticky,
        ];
        types.sort_by_key(|t| t.rank());
        assert_eq!(
            types,
            vec![
                ForumTopicType::Announcement,
                ForumTopicType::Sticky,
                ForumTopicType::Normal
            ]
        );
    }

    #[test]
    fn test_parse_search_type() {
        assert_eq!("10".parse::<ForumSearchType>(), Ok(ForumSearchType::TopicTitlesOnly));
        assert_eq!("PostTextOnly".parse::<ForumSearchType>(), Ok(ForumSearchType::PostTextOnly));
        assert!("nope".parse::<ForumSearchType>().is_err());
    }
}
