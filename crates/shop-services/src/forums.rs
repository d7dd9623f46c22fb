//! Forums: groups, forums, topics, posts and subscriptions.
//!
//! Topic and forum counters (post counts, last post) are recomputed from the
//! post table after every change so they can never drift.

use shop_domain::customer::Customer;
use shop_domain::forum::{Forum, ForumGroup, ForumPost, ForumSearchType, ForumSubscription, ForumTopic};
use shop_domain::prelude::*;
use shop_domain::settings::StoreSettings;

use crate::memory::{MemoryStore, Tables};
use crate::ServiceError;

/// Filters for listing and searching topics.
#[derive(Debug, Clone, Default)]
pub struct TopicSearch {
    pub forum_id: Option<ForumId>,
    pub customer_id: Option<CustomerId>,
    pub keywords: Option<String>,
    pub search_type: ForumSearchType,
    /// Only topics with activity in the last N days.
    pub limit_days: Option<u32>,
    pub page_index: usize,
    pub page_size: usize,
}

/// Filters for listing subscriptions. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    pub customer_id: Option<CustomerId>,
    pub forum_id: Option<ForumId>,
    pub topic_id: Option<TopicId>,
    pub page_index: usize,
    pub page_size: usize,
}

pub trait ForumService: Send + Sync {
    /// Groups ordered by display order.
    fn get_all_forum_groups(&self) -> Result<Vec<ForumGroup>, ServiceError>;

    fn get_forum_group_by_id(&self, id: ForumGroupId) -> Result<Option<ForumGroup>, ServiceError>;

    fn get_forums_by_group(&self, group_id: ForumGroupId) -> Result<Vec<Forum>, ServiceError>;

    fn get_forum_by_id(&self, id: ForumId) -> Result<Option<Forum>, ServiceError>;

    /// Load a topic, counting a view when `increase_views` is set.
    fn get_topic_by_id(&self, id: TopicId, increase_views: bool) -> Result<Option<ForumTopic>, ServiceError>;

    /// Topics ordered announcements first, then sticky, then by latest activity.
    fn get_all_topics(&self, search: &TopicSearch) -> Result<PagedList<ForumTopic>, ServiceError>;

    /// Topics with the most recent posts, optionally within one forum.
    fn get_active_topics(&self, forum_id: Option<ForumId>, count: usize) -> Result<Vec<ForumTopic>, ServiceError>;

    fn insert_topic(&self, topic: ForumTopic) -> Result<ForumTopic, ServiceError>;

    fn update_topic(&self, topic: &ForumTopic) -> Result<(), ServiceError>;

    /// Delete a topic with its posts and subscriptions.
    fn delete_topic(&self, id: TopicId) -> Result<(), ServiceError>;

    fn move_topic(&self, id: TopicId, new_forum_id: ForumId) -> Result<ForumTopic, ServiceError>;

    /// Posts of a topic in creation order.
    fn get_all_posts(
        &self,
        topic_id: TopicId,
        customer_id: Option<CustomerId>,
        page_index: usize,
        page_size: usize,
    ) -> Result<PagedList<ForumPost>, ServiceError>;

    fn get_post_by_id(&self, id: PostId) -> Result<Option<ForumPost>, ServiceError>;

    fn insert_post(&self, post: ForumPost) -> Result<ForumPost, ServiceError>;

    fn update_post(&self, post: &ForumPost) -> Result<(), ServiceError>;

    /// Delete a post. Deleting the first post of a topic deletes the topic.
    fn delete_post(&self, id: PostId) -> Result<(), ServiceError>;

    /// Zero-based page of `topic_id` that holds `post_id`.
    fn calculate_topic_page_index(&self, topic_id: TopicId, page_size: usize, post_id: PostId) -> Result<usize, ServiceError>;

    fn get_all_subscriptions(&self, filter: &SubscriptionFilter) -> Result<PagedList<ForumSubscription>, ServiceError>;

    fn get_subscription_by_id(&self, id: SubscriptionId) -> Result<Option<ForumSubscription>, ServiceError>;

    fn insert_subscription(&self, subscription: ForumSubscription) -> Result<ForumSubscription, ServiceError>;

    fn delete_subscription(&self, id: SubscriptionId) -> Result<(), ServiceError>;

    fn get_customer_post_count(&self, customer_id: CustomerId) -> Result<usize, ServiceError>;
}

fn last_activity(topic: &ForumTopic) -> i64 {
    topic.last_post_time.unwrap_or(topic.created_at)
}

fn refresh_topic_stats(tables: &mut Tables, topic_id: TopicId) {
    let mut posts: Vec<&ForumPost> = tables.posts.values().filter(|p| p.topic_id == topic_id).collect();
    posts.sort_by_key(|p| (p.created_at, p.id));
    let first = posts.first().map(|p| p.id);
    let last = posts.last().map(|p| (p.id, p.customer_id, p.created_at));
    let count = posts.len() as u32;
    if let Some(topic) = tables.topics.get_mut(&topic_id) {
        topic.num_posts = count;
        topic.first_post_id = first;
        topic.last_post_id = last.map(|l| l.0);
        topic.last_post_customer_id = last.map(|l| l.1);
        topic.last_post_time = last.map(|l| l.2);
    }
}

fn refresh_forum_stats(tables: &mut Tables, forum_id: ForumId) {
    let topics: Vec<&ForumTopic> = tables.topics.values().filter(|t| t.forum_id == forum_id).collect();
    let num_topics = topics.len() as u32;
    let num_posts = topics.iter().map(|t| t.num_posts).sum();
    let last = topics
        .iter()
        .filter(|t| t.last_post_id.is_some())
        .max_by_key(|t| (t.last_post_time, t.last_post_id))
        .map(|t| (t.id, t.last_post_id, t.last_post_customer_id, t.last_post_time));
    if let Some(forum) = tables.forums.get_mut(&forum_id) {
        forum.num_topics = num_topics;
        forum.num_posts = num_posts;
        forum.last_topic_id = last.map(|l| l.0);
        forum.last_post_id = last.and_then(|l| l.1);
        forum.last_post_customer_id = last.and_then(|l| l.2);
        forum.last_post_time = last.and_then(|l| l.3);
        forum.updated_at = current_timestamp();
    }
}

fn remove_topic(tables: &mut Tables, topic_id: TopicId) -> Option<ForumId> {
    let topic = tables.topics.remove(&topic_id)?;
    tables.posts.retain(|_, p| p.topic_id != topic_id);
    tables.subscriptions.retain(|_, s| s.topic_id != Some(topic_id));
    Some(topic.forum_id)
}

fn keyword_match(tables: &Tables, topic: &ForumTopic, keywords: &str, search_type: ForumSearchType) -> bool {
    let needle = keywords.to_lowercase();
    let in_subject = || topic.subject.to_lowercase().contains(&needle);
    let in_posts = || {
        tables
            .posts
            .values()
            .any(|p| p.topic_id == topic.id && p.text.to_lowercase().contains(&needle))
    };
    match search_type {
        ForumSearchType::All => in_subject() || in_posts(),
        ForumSearchType::TopicTitlesOnly => in_subject(),
        ForumSearchType::PostTextOnly => in_posts(),
    }
}

impl ForumService for MemoryStore {
    fn get_all_forum_groups(&self) -> Result<Vec<ForumGroup>, ServiceError> {
        let mut groups: Vec<ForumGroup> = self.read()?.forum_groups.values().cloned().collect();
        groups.sort_by_key(|g| (g.display_order, g.id));
        Ok(groups)
    }

    fn get_forum_group_by_id(&self, id: ForumGroupId) -> Result<Option<ForumGroup>, ServiceError> {
        Ok(self.read()?.forum_groups.get(&id).cloned())
    }

    fn get_forums_by_group(&self, group_id: ForumGroupId) -> Result<Vec<Forum>, ServiceError> {
        let mut forums: Vec<Forum> = self
            .read()?
            .forums
            .values()
            .filter(|f| f.group_id == group_id)
            .cloned()
            .collect();
        forums.sort_by_key(|f| (f.display_order, f.id));
        Ok(forums)
    }

    fn get_forum_by_id(&self, id: ForumId) -> Result<Option<Forum>, ServiceError> {
        Ok(self.read()?.forums.get(&id).cloned())
    }

    fn get_topic_by_id(&self, id: TopicId, increase_views: bool) -> Result<Option<ForumTopic>, ServiceError> {
        if !increase_views {
            return Ok(self.read()?.topics.get(&id).cloned());
        }
        let mut tables = self.write()?;
        Ok(tables.topics.get_mut(&id).map(|topic| {
            topic.views += 1;
            topic.clone()
        }))
    }

    fn get_all_topics(&self, search: &TopicSearch) -> Result<PagedList<ForumTopic>, ServiceError> {
        let tables = self.read()?;
        let since = search
            .limit_days
            .map(|days| current_timestamp() - i64::from(days) * 86_400);
        let keywords = search.keywords.as_deref().map(str::trim).filter(|k| !k.is_empty());
        let mut topics: Vec<ForumTopic> = tables
            .topics
            .values()
            .filter(|t| search.forum_id.map_or(true, |f| t.forum_id == f))
            .filter(|t| search.customer_id.map_or(true, |c| t.customer_id == c))
            .filter(|t| since.map_or(true, |s| last_activity(t) >= s))
            .filter(|t| keywords.map_or(true, |k| keyword_match(&tables, t, k, search.search_type)))
            .cloned()
            .collect();
        topics.sort_by(|a, b| {
            a.topic_type
                .rank()
                .cmp(&b.topic_type.rank())
                .then(last_activity(b).cmp(&last_activity(a)))
                .then(b.id.cmp(&a.id))
        });
        Ok(PagedList::from_vec(topics, search.page_index, search.page_size))
    }

    fn get_active_topics(&self, forum_id: Option<ForumId>, count: usize) -> Result<Vec<ForumTopic>, ServiceError> {
        let mut topics: Vec<ForumTopic> = self
            .read()?
            .topics
            .values()
            .filter(|t| t.last_post_id.is_some())
            .filter(|t| forum_id.map_or(true, |f| t.forum_id == f))
            .cloned()
            .collect();
        topics.sort_by(|a, b| last_activity(b).cmp(&last_activity(a)).then(b.id.cmp(&a.id)));
        topics.truncate(count);
        Ok(topics)
    }

    fn insert_topic(&self, mut topic: ForumTopic) -> Result<ForumTopic, ServiceError> {
        let mut tables = self.write()?;
        if !tables.forums.contains_key(&topic.forum_id) {
            return Err(ServiceError::not_found("Forum", topic.forum_id));
        }
        topic.id = TopicId::new(tables.next_id());
        let now = current_timestamp();
        topic.created_at = now;
        topic.updated_at = now;
        tables.topics.insert(topic.id, topic.clone());
        refresh_forum_stats(&mut tables, topic.forum_id);
        tracing::debug!(topic_id = %topic.id, forum_id = %topic.forum_id, "topic created");
        Ok(topic)
    }

    fn update_topic(&self, topic: &ForumTopic) -> Result<(), ServiceError> {
        let mut tables = self.write()?;
        let stored = tables
            .topics
            .get_mut(&topic.id)
            .ok_or_else(|| ServiceError::not_found("Topic", topic.id))?;
        stored.subject = topic.subject.clone();
        stored.topic_type = topic.topic_type;
        stored.updated_at = current_timestamp();
        Ok(())
    }

    fn delete_topic(&self, id: TopicId) -> Result<(), ServiceError> {
        let mut tables = self.write()?;
        let forum_id = remove_topic(&mut tables, id).ok_or_else(|| ServiceError::not_found("Topic", id))?;
        refresh_forum_stats(&mut tables, forum_id);
        tracing::debug!(topic_id = %id, "topic deleted");
        Ok(())
    }

    fn move_topic(&self, id: TopicId, new_forum_id: ForumId) -> Result<ForumTopic, ServiceError> {
        let mut tables = self.write()?;
        if !tables.forums.contains_key(&new_forum_id) {
            return Err(ServiceError::not_found("Forum", new_forum_id));
        }
        let topic = tables
            .topics
            .get_mut(&id)
            .ok_or_else(|| ServiceError::not_found("Topic", id))?;
        let old_forum_id = topic.forum_id;
        topic.forum_id = new_forum_id;
        topic.updated_at = current_timestamp();
        let moved = topic.clone();
        if old_forum_id != new_forum_id {
            refresh_forum_stats(&mut tables, old_forum_id);
            refresh_forum_stats(&mut tables, new_forum_id);
        }
        Ok(moved)
    }

    fn get_all_posts(
        &self,
        topic_id: TopicId,
        customer_id: Option<CustomerId>,
        page_index: usize,
        page_size: usize,
    ) -> Result<PagedList<ForumPost>, ServiceError> {
        let mut posts: Vec<ForumPost> = self
            .read()?
            .posts
            .values()
            .filter(|p| p.topic_id == topic_id)
            .filter(|p| customer_id.map_or(true, |c| p.customer_id == c))
            .cloned()
            .collect();
        posts.sort_by_key(|p| (p.created_at, p.id));
        Ok(PagedList::from_vec(posts, page_index, page_size))
    }

    fn get_post_by_id(&self, id: PostId) -> Result<Option<ForumPost>, ServiceError> {
        Ok(self.read()?.posts.get(&id).cloned())
    }

    fn insert_post(&self, mut post: ForumPost) -> Result<ForumPost, ServiceError> {
        let mut tables = self.write()?;
        let forum_id = tables
            .topics
            .get(&post.topic_id)
            .map(|t| t.forum_id)
            .ok_or_else(|| ServiceError::not_found("Topic", post.topic_id))?;
        post.id = PostId::new(tables.next_id());
        let now = current_timestamp();
        post.created_at = now;
        post.updated_at = now;
        tables.posts.insert(post.id, post.clone());
        refresh_topic_stats(&mut tables, post.topic_id);
        refresh_forum_stats(&mut tables, forum_id);
        Ok(post)
    }

    fn update_post(&self, post: &ForumPost) -> Result<(), ServiceError> {
        let mut tables = self.write()?;
        let stored = tables
            .posts
            .get_mut(&post.id)
            .ok_or_else(|| ServiceError::not_found("Post", post.id))?;
        stored.text = post.text.clone();
        stored.updated_at = current_timestamp();
        Ok(())
    }

    fn delete_post(&self, id: PostId) -> Result<(), ServiceError> {
        let mut tables = self.write()?;
        let post = tables
            .posts
            .get(&id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("Post", id))?;
        let topic = tables
            .topics
            .get(&post.topic_id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("Topic", post.topic_id))?;
        if topic.first_post_id == Some(id) {
            remove_topic(&mut tables, topic.id);
            tracing::debug!(topic_id = %topic.id, "first post deleted, topic removed");
        } else {
            tables.posts.remove(&id);
            refresh_topic_stats(&mut tables, topic.id);
        }
        refresh_forum_stats(&mut tables, topic.forum_id);
        Ok(())
    }

    fn calculate_topic_page_index(&self, topic_id: TopicId, page_size: usize, post_id: PostId) -> Result<usize, ServiceError> {
        let posts = self.get_all_posts(topic_id, None, 0, usize::MAX)?;
        let position = posts.items.iter().position(|p| p.id == post_id).unwrap_or(0);
        Ok(position / page_size.max(1))
    }

    fn get_all_subscriptions(&self, filter: &SubscriptionFilter) -> Result<PagedList<ForumSubscription>, ServiceError> {
        let mut subscriptions: Vec<ForumSubscription> = self
            .read()?
            .subscriptions
            .values()
            .filter(|s| filter.customer_id.map_or(true, |c| s.customer_id == c))
            .filter(|s| filter.forum_id.map_or(true, |f| s.forum_id == Some(f)))
            .filter(|s| filter.topic_id.map_or(true, |t| s.topic_id == Some(t)))
            .cloned()
            .collect();
        subscriptions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(PagedList::from_vec(subscriptions, filter.page_index, filter.page_size))
    }

    fn get_subscription_by_id(&self, id: SubscriptionId) -> Result<Option<ForumSubscription>, ServiceError> {
        Ok(self.read()?.subscriptions.get(&id).cloned())
    }

    fn insert_subscription(&self, mut subscription: ForumSubscription) -> Result<ForumSubscription, ServiceError> {
        if subscription.forum_id.is_some() == subscription.topic_id.is_some() {
            return Err(ServiceError::Validation(
                "A subscription targets either a forum or a topic".to_string(),
            ));
        }
        let mut tables = self.write()?;
        subscription.id = SubscriptionId::new(tables.next_id());
        subscription.created_at = current_timestamp();
        tables.subscriptions.insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    fn delete_subscription(&self, id: SubscriptionId) -> Result<(), ServiceError> {
        self.write()?
            .subscriptions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::not_found("Subscription", id))
    }

    fn get_customer_post_count(&self, customer_id: CustomerId) -> Result<usize, ServiceError> {
        Ok(self
            .read()?
            .posts
            .values()
            .filter(|p| p.customer_id == customer_id)
            .count())
    }
}

/// Who may do what in the forums.
#[derive(Clone, Copy)]
pub struct ForumPermissions<'a> {
    pub settings: &'a StoreSettings,
}

impl<'a> ForumPermissions<'a> {
    pub fn new(settings: &'a StoreSettings) -> Self {
        Self { settings }
    }

    fn can_act(customer: &Customer) -> bool {
        customer.active && !customer.deleted
    }

    pub fn is_moderator(&self, customer: &Customer) -> bool {
        if !Self::can_act(customer) || customer.is_guest() {
            return false;
        }
        customer.is_forum_moderator()
            || customer.roles.iter().any(|r| {
                self.settings
                    .permissions
                    .manage_forums
                    .iter()
                    .any(|name| name == r.system_name())
            })
    }

    pub fn can_create_topic(&self, customer: &Customer, _forum: &Forum) -> bool {
        if !Self::can_act(customer) {
            return false;
        }
        !customer.is_guest() || self.settings.forum.allow_guests_to_create_topics
    }

    fn owns_or_moderates(&self, customer: &Customer, owner: CustomerId, allowed: bool) -> bool {
        if !Self::can_act(customer) || customer.is_guest() {
            return false;
        }
        self.is_moderator(customer) || (allowed && owner == customer.id)
    }

    pub fn can_edit_topic(&self, customer: &Customer, topic: &ForumTopic) -> bool {
        self.owns_or_moderates(customer, topic.customer_id, self.settings.forum.allow_customers_to_edit_posts)
    }

    pub fn can_move_topic(&self, customer: &Customer, _topic: &ForumTopic) -> bool {
        self.is_moderator(customer)
    }

    pub fn can_delete_topic(&self, customer: &Customer, topic: &ForumTopic) -> bool {
        self.owns_or_moderates(customer, topic.customer_id, self.settings.forum.allow_customers_to_delete_posts)
    }

    pub fn can_create_post(&self, customer: &Customer, _topic: &ForumTopic) -> bool {
        if !Self::can_act(customer) {
            return false;
        }
        !customer.is_guest() || self.settings.forum.allow_guests_to_create_posts
    }

    pub fn can_edit_post(&self, customer: &Customer, post: &ForumPost) -> bool {
        self.owns_or_moderates(customer, post.customer_id, self.settings.forum.allow_customers_to_edit_posts)
    }

    pub fn can_delete_post(&self, customer: &Customer, post: &ForumPost) -> bool {
        self.owns_or_moderates(customer, post.customer_id, self.settings.forum.allow_customers_to_delete_posts)
    }

    pub fn can_set_topic_priority(&self, customer: &Customer) -> bool {
        self.is_moderator(customer)
    }

    pub fn can_subscribe(&self, customer: &Customer) -> bool {
        Self::can_act(customer) && !customer.is_guest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_domain::customer::CustomerRole;
    use shop_domain::forum::ForumTopicType;
    use uuid::Uuid;

    fn topic(forum_id: ForumId, customer_id: CustomerId, subject: &str, topic_type: ForumTopicType) -> ForumTopic {
        ForumTopic {
            id: TopicId::default(),
            forum_id,
            customer_id,
            topic_type,
            subject: subject.to_string(),
            num_posts: 0,
            views: 0,
            first_post_id: None,
            last_post_id: None,
            last_post_customer_id: None,
            last_post_time: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn post(topic_id: TopicId, customer_id: CustomerId, text: &str) -> ForumPost {
        ForumPost {
            id: PostId::default(),
            topic_id,
            customer_id,
            text: text.to_string(),
            ip_address: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn forum_setup() -> (MemoryStore, ForumId) {
        let store = MemoryStore::new();
        let group = store.add_forum_group("General", 1).unwrap();
        let forum = store.add_forum(group, "Chat", "Anything goes", 1).unwrap();
        (store, forum)
    }

    #[test]
    fn test_counters_follow_posts() {
        let (store, forum_id) = forum_setup();
        let author = CustomerId::new(100);
        let t = store
            .insert_topic(topic(forum_id, author, "Hello", ForumTopicType::Normal))
            .unwrap();
        let first = store.insert_post(post(t.id, author, "first")).unwrap();
        let second = store.insert_post(post(t.id, CustomerId::new(101), "reply")).unwrap();

        let loaded = store.get_topic_by_id(t.id, false).unwrap().unwrap();
        assert_eq!(loaded.num_posts, 2);
        assert_eq!(loaded.first_post_id, Some(first.id));
        assert_eq!(loaded.last_post_id, Some(second.id));
        let forum = store.get_forum_by_id(forum_id).unwrap().unwrap();
        assert_eq!((forum.num_topics, forum.num_posts), (1, 2));
        assert_eq!(forum.last_post_id, Some(second.id));

        store.delete_post(second.id).unwrap();
        let forum = store.get_forum_by_id(forum_id).unwrap().unwrap();
        assert_eq!(forum.num_posts, 1);
        assert_eq!(store.get_customer_post_count(author).unwrap(), 1);

        store.delete_post(first.id).unwrap();
        assert!(store.get_topic_by_id(t.id, false).unwrap().is_none());
        let forum = store.get_forum_by_id(forum_id).unwrap().unwrap();
        assert_eq!((forum.num_topics, forum.num_posts), (0, 0));
    }

    #[test]
    fn test_topic_ordering_and_search() {
        let (store, forum_id) = forum_setup();
        let author = CustomerId::new(100);
        let normal = store
            .insert_topic(topic(forum_id, author, "Shipping times", ForumTopicType::Normal))
            .unwrap();
        store.insert_post(post(normal.id, author, "How long does delivery take?")).unwrap();
        let sticky = store
            .insert_topic(topic(forum_id, author, "Read me", ForumTopicType::Sticky))
            .unwrap();
        store.insert_post(post(sticky.id, author, "Rules")).unwrap();

        let page = store
            .get_all_topics(&TopicSearch {
                forum_id: Some(forum_id),
                page_size: 10,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.items[0].id, sticky.id);
        assert_eq!(page.items[1].id, normal.id);

        let found = store
            .get_all_topics(&TopicSearch {
                keywords: Some("delivery".into()),
                search_type: ForumSearchType::PostTextOnly,
                page_size: 10,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].id, normal.id);

        let titles = store
            .get_all_topics(&TopicSearch {
                keywords: Some("delivery".into()),
                search_type: ForumSearchType::TopicTitlesOnly,
                page_size: 10,
                ..Default::default()
            })
            .unwrap();
        assert!(titles.is_empty());

        let viewed = store.get_topic_by_id(normal.id, true).unwrap().unwrap();
        assert_eq!(viewed.views, 1);
    }

    #[test]
    fn test_page_index_and_move() {
        let (store, forum_id) = forum_setup();
        let group = store.add_forum_group("Other", 2).unwrap();
        let other = store.add_forum(group, "Support", "", 1).unwrap();
        let author = CustomerId::new(100);
        let t = store
            .insert_topic(topic(forum_id, author, "Long thread", ForumTopicType::Normal))
            .unwrap();
        let mut last = None;
        for i in 0..5 {
            last = Some(store.insert_post(post(t.id, author, &format!("post {i}"))).unwrap());
        }
        let last = last.unwrap();
        assert_eq!(store.calculate_topic_page_index(t.id, 2, last.id).unwrap(), 2);

        store.move_topic(t.id, other).unwrap();
        assert_eq!(store.get_forum_by_id(forum_id).unwrap().unwrap().num_topics, 0);
        assert_eq!(store.get_forum_by_id(other).unwrap().unwrap().num_posts, 5);
    }

    #[test]
    fn test_subscriptions() {
        let (store, forum_id) = forum_setup();
        let customer = CustomerId::new(7);
        let sub = store
            .insert_subscription(ForumSubscription {
                id: SubscriptionId::default(),
                guid: Uuid::nil(),
                customer_id: customer,
                forum_id: Some(forum_id),
                topic_id: None,
                created_at: 0,
            })
            .unwrap();
        let listed = store
            .get_all_subscriptions(&SubscriptionFilter {
                forum_id: Some(forum_id),
                page_size: 10,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(listed.items, vec![sub.clone()]);

        let invalid = ForumSubscription {
            forum_id: None,
            ..sub.clone()
        };
        assert!(store.insert_subscription(invalid).is_err());

        store.delete_subscription(sub.id).unwrap();
        assert!(store.get_subscription_by_id(sub.id).unwrap().is_none());
    }

    #[test]
    fn test_permissions() {
        let settings = StoreSettings::default();
        let perms = ForumPermissions::new(&settings);
        let guest = Customer::guest(CustomerId::new(1));
        let mut member = Customer::guest(CustomerId::new(2));
        member.promote_to_registered();
        let mut moderator = Customer::guest(CustomerId::new(3));
        moderator.promote_to_registered();
        moderator.roles.push(CustomerRole::ForumModerators);

        let own = topic(ForumId::new(1), member.id, "Mine", ForumTopicType::Normal);
        let theirs = topic(ForumId::new(1), CustomerId::new(99), "Theirs", ForumTopicType::Normal);

        assert!(!perms.can_create_post(&guest, &own));
        assert!(perms.can_create_post(&member, &own));
        assert!(perms.can_edit_topic(&member, &own));
        assert!(!perms.can_edit_topic(&member, &theirs));
        assert!(perms.can_delete_topic(&moderator, &theirs));
        assert!(!perms.can_move_topic(&member, &own));
        assert!(perms.can_set_topic_priority(&moderator));
        assert!(!perms.can_subscribe(&guest));
    }
}
