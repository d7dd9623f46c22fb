use serde::{Deserialize, Serialize};
use shop_domain::forum::{ForumSearchType, ForumTopicType};
use shop_domain::{CustomerId, ForumGroupId, ForumId, PostId, SubscriptionId, TopicId};
use validator::Validate;

use crate::pager::PagerModel;
use crate::validation::non_blank;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastPostModel {
    pub post_id: PostId,
    pub topic_id: TopicId,
    pub topic_subject: String,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub posted_on: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumRowModel {
    pub id: ForumId,
    pub name: String,
    pub description: String,
    pub num_topics: u32,
    pub num_posts: u32,
    pub last_post: Option<LastPostModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumGroupModel {
    pub id: ForumGroupId,
    pub name: String,
    pub forums: Vec<ForumRowModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardsIndexModel {
    pub forum_groups: Vec<ForumGroupModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumTopicRowModel {
    pub id: TopicId,
    pub forum_id: ForumId,
    pub subject: String,
    pub topic_type: ForumTopicType,
    pub views: u32,
    pub num_posts: u32,
    pub num_replies: u32,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub last_post: Option<LastPostModel>,
    /// Pages of posts, for jump links in lists.
    pub total_post_pages: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveDiscussionsModel {
    pub forum_id: Option<ForumId>,
    pub topics: Vec<ForumTopicRowModel>,
    pub view_all_link_enabled: bool,
    pub active_discussions_feed_enabled: bool,
    pub pager: Option<PagerModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForumPageModel {
    pub id: ForumId,
    pub name: String,
    pub description: String,
    pub topics: Vec<ForumTopicRowModel>,
    pub pager: PagerModel,
    pub is_customer_allowed_to_subscribe: bool,
    pub watch_forum_subscribed: bool,
    pub forum_feeds_enabled: bool,
    pub can_create_topic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumPostModel {
    pub id: PostId,
    pub topic_id: TopicId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub customer_is_guest: bool,
    pub customer_post_count: Option<usize>,
    pub formatted_text: String,
    pub posted_on: String,
    pub is_current_customer_allowed_to_edit_post: bool,
    pub is_current_customer_allowed_to_delete_post: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForumTopicPageModel {
    pub id: TopicId,
    pub subject: String,
    pub forum_id: ForumId,
    pub forum_name: String,
    pub posts: Vec<ForumPostModel>,
    pub pager: PagerModel,
    pub is_customer_allowed_to_edit_topic: bool,
    pub is_customer_allowed_to_delete_topic: bool,
    pub is_customer_allowed_to_move_topic: bool,
    pub is_customer_allowed_to_subscribe: bool,
    pub watch_topic_subscribed: bool,
    pub can_reply: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumSelectItem {
    pub id: ForumId,
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicMoveModel {
    pub id: TopicId,
    pub topic_subject: String,
    pub forum_id: ForumId,
    pub forums: Vec<ForumSelectItem>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicMoveForm {
    pub topic_id: TopicId,
    pub forum_id: ForumId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditForumTopicModel {
    pub is_edit: bool,
    pub id: TopicId,
    pub forum_id: ForumId,
    pub forum_name: String,
    pub subject: String,
    pub text: String,
    pub topic_type: ForumTopicType,
    pub is_customer_allowed_to_set_topic_priority: bool,
    pub is_customer_allowed_to_subscribe: bool,
    pub subscribed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TopicForm {
    /// Zero when creating.
    pub id: TopicId,
    pub forum_id: ForumId,
    #[validate(custom(function = "non_blank", message = "Subject cannot be empty"))]
    pub subject: String,
    #[validate(custom(function = "non_blank", message = "Text cannot be empty"))]
    pub text: String,
    pub topic_type: ForumTopicType,
    pub subscribed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditForumPostModel {
    pub is_edit: bool,
    pub id: PostId,
    pub topic_id: TopicId,
    pub topic_subject: String,
    pub forum_id: ForumId,
    pub forum_name: String,
    pub text: String,
    pub is_customer_allowed_to_subscribe: bool,
    pub subscribed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PostForm {
    /// Zero when creating.
    pub id: PostId,
    pub topic_id: TopicId,
    #[validate(custom(function = "non_blank", message = "Text cannot be empty"))]
    pub text: String,
    pub subscribed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub search_terms: String,
    pub advanced: bool,
    pub forum_id: Option<ForumId>,
    pub within: ForumSearchType,
    pub limit_days: Option<u32>,
    /// 1-based.
    pub page: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchModel {
    pub search_terms: String,
    pub show_advanced_search: bool,
    pub forums: Vec<ForumSelectItem>,
    pub results: Vec<ForumTopicRowModel>,
    pub pager: Option<PagerModel>,
    pub no_results_is_visible: bool,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumSubscriptionModel {
    pub id: SubscriptionId,
    pub forum_id: Option<ForumId>,
    pub topic_id: Option<TopicId>,
    pub title: String,
    pub is_topic: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerForumSubscriptionsModel {
    pub subscriptions: Vec<ForumSubscriptionModel>,
    pub pager: PagerModel,
}
