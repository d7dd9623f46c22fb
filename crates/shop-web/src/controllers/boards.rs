//! Forums: listings, topics, posting, search and subscriptions.

use serde_json::json;
use shop_domain::forum::{Forum, ForumPost, ForumSubscription, ForumTopic, ForumTopicType};
use shop_domain::prelude::*;
use shop_services::forums::{ForumPermissions, SubscriptionFilter, TopicSearch};
use shop_services::ServiceRegistry;
use uuid::Uuid;
use validator::Validate;

use super::{customer_name, truncate_chars};
use crate::bbcode::{format_post_text, quote_for_reply};
use crate::context::WorkContext;
use crate::error::WebError;
use crate::feed::{SyndicationFeed, SyndicationItem};
use crate::helpers::format_date;
use crate::models::boards::{
    ActiveDiscussionsModel, BoardsIndexModel, CustomerForumSubscriptionsModel, EditForumPostModel,
    EditForumTopicModel, ForumGroupModel, ForumPageModel, ForumPostModel, ForumRowModel, ForumSelectItem,
    ForumSubscriptionModel, ForumTopicPageModel, ForumTopicRowModel, LastPostModel, PostForm, SearchModel,
    SearchQuery, TopicForm, TopicMoveForm, TopicMoveModel,
};
use crate::pager::PagerModel;
use crate::result::{ActionResult, ModelState, RedirectTarget};
use crate::validation;
use crate::ActionOutcome;

pub struct BoardsController {
    services: ServiceRegistry,
}

fn disabled<M>() -> ActionOutcome<M> {
    Ok(ActionResult::redirect(RedirectTarget::HomePage))
}

/// 1-based page number to a 0-based index.
fn page_index(page: usize) -> usize {
    page.max(1) - 1
}

fn page_count(items: u32, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    (items as usize).div_ceil(page_size)
}

impl BoardsController {
    pub fn new(services: ServiceRegistry) -> Self {
        Self { services }
    }

    fn name_of(&self, ctx: &WorkContext, customer_id: CustomerId) -> Result<String, WebError> {
        Ok(customer_name(self.services.customers.as_ref(), ctx.store.id, customer_id)?)
    }

    fn last_post(
        &self,
        ctx: &WorkContext,
        topic_id: Option<TopicId>,
        post_id: Option<PostId>,
        customer_id: Option<CustomerId>,
        posted_at: Option<i64>,
    ) -> Result<Option<LastPostModel>, WebError> {
        let (Some(topic_id), Some(post_id), Some(customer_id)) = (topic_id, post_id, customer_id) else {
            return Ok(None);
        };
        let topic_subject = self
            .services
            .forums
            .get_topic_by_id(topic_id, false)?
            .map(|t| t.subject)
            .unwrap_or_default();
        Ok(Some(LastPostModel {
            post_id,
            topic_id,
            topic_subject,
            customer_id,
            customer_name: self.name_of(ctx, customer_id)?,
            posted_on: format_date(posted_at.unwrap_or_default()),
        }))
    }

    fn forum_row(&self, ctx: &WorkContext, forum: &Forum) -> Result<ForumRowModel, WebError> {
        Ok(ForumRowModel {
            id: forum.id,
            name: forum.name.clone(),
            description: forum.description.clone(),
            num_topics: forum.num_topics,
            num_posts: forum.num_posts,
            last_post: self.last_post(
                ctx,
                forum.last_topic_id,
                forum.last_post_id,
                forum.last_post_customer_id,
                forum.last_post_time,
            )?,
        })
    }

    fn topic_row(&self, ctx: &WorkContext, topic: &ForumTopic) -> Result<ForumTopicRowModel, WebError> {
        Ok(ForumTopicRowModel {
            id: topic.id,
            forum_id: topic.forum_id,
            subject: topic.subject.clone(),
            topic_type: topic.topic_type,
            views: topic.views,
            num_posts: topic.num_posts,
            num_replies: topic.num_posts.saturating_sub(1),
            customer_id: topic.customer_id,
            customer_name: self.name_of(ctx, topic.customer_id)?,
            last_post: self.last_post(
                ctx,
                Some(topic.id),
                topic.last_post_id,
                topic.last_post_customer_id,
                topic.last_post_time,
            )?,
            total_post_pages: page_count(topic.num_posts, ctx.settings.forum.posts_page_size),
        })
    }

    fn topic_rows(&self, ctx: &WorkContext, topics: &[ForumTopic]) -> Result<Vec<ForumTopicRowModel>, WebError> {
        topics.iter().map(|t| self.topic_row(ctx, t)).collect()
    }

    fn forum_select_items(&self, selected: Option<ForumId>) -> Result<Vec<ForumSelectItem>, WebError> {
        let mut items = Vec::new();
        for group in self.services.forums.get_all_forum_groups()? {
            for forum in self.services.forums.get_forums_by_group(group.id)? {
                items.push(ForumSelectItem {
                    id: forum.id,
                    name: format!("{} / {}", group.name, forum.name),
                    selected: Some(forum.id) == selected,
                });
            }
        }
        Ok(items)
    }

    fn find_subscription(
        &self,
        customer_id: CustomerId,
        forum_id: Option<ForumId>,
        topic_id: Option<TopicId>,
    ) -> Result<Option<ForumSubscription>, WebError> {
        let found = self.services.forums.get_all_subscriptions(&SubscriptionFilter {
            customer_id: Some(customer_id),
            forum_id,
            topic_id,
            page_index: 0,
            page_size: 1,
        })?;
        Ok(found.items.into_iter().next())
    }

    fn subscribe(&self, ctx: &WorkContext, forum_id: Option<ForumId>, topic_id: Option<TopicId>) -> Result<(), WebError> {
        if self.find_subscription(ctx.customer.id, forum_id, topic_id)?.is_none() {
            self.services.forums.insert_subscription(ForumSubscription {
                id: SubscriptionId::default(),
                guid: Uuid::new_v4(),
                customer_id: ctx.customer.id,
                forum_id,
                topic_id,
                created_at: current_timestamp(),
            })?;
        }
        Ok(())
    }

    fn set_subscription(
        &self,
        ctx: &WorkContext,
        forum_id: Option<ForumId>,
        topic_id: Option<TopicId>,
        subscribed: bool,
    ) -> Result<(), WebError> {
        match self.find_subscription(ctx.customer.id, forum_id, topic_id)? {
            Some(existing) if !subscribed => self.services.forums.delete_subscription(existing.id)?,
            None if subscribed => self.subscribe(ctx, forum_id, topic_id)?,
            _ => {}
        }
        Ok(())
    }

    /// Subscribers of a forum or topic other than the current customer.
    fn subscribers(
        &self,
        ctx: &WorkContext,
        forum_id: Option<ForumId>,
        topic_id: Option<TopicId>,
    ) -> Result<Vec<Customer>, WebError> {
        let subscriptions = self.services.forums.get_all_subscriptions(&SubscriptionFilter {
            forum_id,
            topic_id,
            page_index: 0,
            page_size: usize::MAX,
            ..Default::default()
        })?;
        let ids: Vec<CustomerId> = subscriptions
            .items
            .iter()
            .map(|s| s.customer_id)
            .filter(|id| *id != ctx.customer.id)
            .collect();
        Ok(self.services.customers.get_customers_by_ids(&ids)?)
    }

    fn topic_link(ctx: &WorkContext, topic_id: TopicId) -> String {
        ctx.store
            .absolute_url(&RedirectTarget::BoardsTopic { id: topic_id, page: 1 }.path())
    }

    fn feed_items(&self, ctx: &WorkContext, topics: &[ForumTopic]) -> Vec<SyndicationItem> {
        topics
            .iter()
            .map(|topic| SyndicationItem {
                title: topic.subject.clone(),
                description: format!("{} posts", topic.num_posts),
                link: Self::topic_link(ctx, topic.id),
                id: topic.id.to_string(),
                published_at: topic.last_post_time.unwrap_or(topic.created_at),
            })
            .collect()
    }

    pub fn index(&self, ctx: &mut WorkContext) -> ActionOutcome<BoardsIndexModel> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let mut model = BoardsIndexModel::default();
        for group in self.services.forums.get_all_forum_groups()? {
            let forums = self.services.forums.get_forums_by_group(group.id)?;
            model.forum_groups.push(ForumGroupModel {
                id: group.id,
                name: group.name,
                forums: forums.iter().map(|f| self.forum_row(ctx, f)).collect::<Result<_, _>>()?,
            });
        }
        Ok(ActionResult::view("Boards/Index", model))
    }

    /// Home page block. Empty when nothing has been posted yet.
    pub fn active_discussions_small(&self, ctx: &mut WorkContext) -> ActionOutcome<ActiveDiscussionsModel> {
        if !ctx.settings.forum.forums_enabled {
            return Ok(ActionResult::Empty);
        }
        let forum = &ctx.settings.forum;
        let topics = self
            .services
            .forums
            .get_active_topics(None, forum.home_page_active_discussions_topic_count)?;
        if topics.is_empty() {
            return Ok(ActionResult::Empty);
        }
        let model = ActiveDiscussionsModel {
            forum_id: None,
            topics: self.topic_rows(ctx, &topics)?,
            view_all_link_enabled: true,
            active_discussions_feed_enabled: forum.active_discussions_feed_enabled,
            pager: None,
        };
        Ok(ActionResult::view("Boards/ActiveDiscussionsSmall", model))
    }

    pub fn active_discussions(
        &self,
        ctx: &mut WorkContext,
        forum_id: Option<ForumId>,
        page: usize,
    ) -> ActionOutcome<ActiveDiscussionsModel> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let page_size = ctx.settings.forum.active_discussions_page_size;
        let topics = self.services.forums.get_active_topics(forum_id, usize::MAX)?;
        let paged = PagedList::from_vec(topics, page_index(page), page_size);
        let model = ActiveDiscussionsModel {
            forum_id,
            topics: self.topic_rows(ctx, &paged.items)?,
            view_all_link_enabled: false,
            active_discussions_feed_enabled: ctx.settings.forum.active_discussions_feed_enabled,
            pager: Some(PagerModel::from_list(&paged)),
        };
        Ok(ActionResult::view("Boards/ActiveDiscussions", model))
    }

    pub fn active_discussions_rss(&self, ctx: &mut WorkContext, forum_id: Option<ForumId>) -> ActionOutcome<()> {
        let forum = &ctx.settings.forum;
        if !forum.forums_enabled || !forum.active_discussions_feed_enabled {
            return disabled();
        }
        let topics = self
            .services
            .forums
            .get_active_topics(forum_id, forum.active_discussions_feed_count)?;
        let mut feed = SyndicationFeed::new(
            format!("{}: Active Discussions", ctx.store.name),
            "Latest active discussions",
            ctx.store.absolute_url(&RedirectTarget::Boards.path()),
            current_timestamp(),
        );
        feed.items = self.feed_items(ctx, &topics);
        Ok(ActionResult::rss(feed.to_rss()))
    }

    pub fn forum_group(&self, ctx: &mut WorkContext, id: ForumGroupId) -> ActionOutcome<ForumGroupModel> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let Some(group) = self.services.forums.get_forum_group_by_id(id)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        let forums = self.services.forums.get_forums_by_group(group.id)?;
        let model = ForumGroupModel {
            id: group.id,
            name: group.name,
            forums: forums.iter().map(|f| self.forum_row(ctx, f)).collect::<Result<_, _>>()?,
        };
        Ok(ActionResult::view("Boards/ForumGroup", model))
    }

    pub fn forum(&self, ctx: &mut WorkContext, id: ForumId, page: usize) -> ActionOutcome<ForumPageModel> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let Some(forum) = self.services.forums.get_forum_by_id(id)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        let topics = self.services.forums.get_all_topics(&TopicSearch {
            forum_id: Some(forum.id),
            page_index: page_index(page),
            page_size: ctx.settings.forum.topics_page_size,
            ..Default::default()
        })?;
        let permissions = ForumPermissions::new(&ctx.settings);
        let can_subscribe = permissions.can_subscribe(&ctx.customer);
        let watch_forum_subscribed =
            can_subscribe && self.find_subscription(ctx.customer.id, Some(forum.id), None)?.is_some();

        let model = ForumPageModel {
            id: forum.id,
            name: forum.name.clone(),
            description: forum.description.clone(),
            topics: self.topic_rows(ctx, &topics.items)?,
            pager: PagerModel::from_list(&topics),
            is_customer_allowed_to_subscribe: can_subscribe,
            watch_forum_subscribed,
            forum_feeds_enabled: ctx.settings.forum.forum_feeds_enabled,
            can_create_topic: permissions.can_create_topic(&ctx.customer, &forum),
        };
        Ok(ActionResult::view("Boards/Forum", model))
    }

    pub fn forum_rss(&self, ctx: &mut WorkContext, id: ForumId) -> ActionOutcome<()> {
        let settings = &ctx.settings.forum;
        if !settings.forums_enabled || !settings.forum_feeds_enabled {
            return disabled();
        }
        let Some(forum) = self.services.forums.get_forum_by_id(id)? else {
            return Ok(ActionResult::NotFound);
        };
        let topics = self
            .services
            .forums
            .get_active_topics(Some(forum.id), settings.forum_feed_count)?;
        let mut feed = SyndicationFeed::new(
            format!("{}: {}", ctx.store.name, forum.name),
            forum.description.clone(),
            ctx.store.absolute_url(&RedirectTarget::BoardsForum(forum.id).path()),
            forum.updated_at,
        );
        feed.items = self.feed_items(ctx, &topics);
        Ok(ActionResult::rss(feed.to_rss()))
    }

    /// Toggle the forum subscription. Answers `{ Subscribed, Text, Error }`.
    pub fn forum_watch(&self, ctx: &mut WorkContext, id: ForumId) -> ActionOutcome<()> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let Some(forum) = self.services.forums.get_forum_by_id(id)? else {
            return Ok(ActionResult::NotFound);
        };
        if !ForumPermissions::new(&ctx.settings).can_subscribe(&ctx.customer) {
            return Ok(ActionResult::json(
                json!({ "Subscribed": false, "Text": "Watch forum", "Error": true }),
            ));
        }
        let subscribed = match self.find_subscription(ctx.customer.id, Some(forum.id), None)? {
            Some(existing) => {
                self.services.forums.delete_subscription(existing.id)?;
                false
            }
            None => {
                self.subscribe(ctx, Some(forum.id), None)?;
                true
            }
        };
        let text = if subscribed { "Unwatch forum" } else { "Watch forum" };
        Ok(ActionResult::json(json!({ "Subscribed": subscribed, "Text": text, "Error": false })))
    }

    /// A page of posts. Counts a view; pages past the end show the last page.
    pub fn topic(&self, ctx: &mut WorkContext, id: TopicId, page: usize) -> ActionOutcome<ForumTopicPageModel> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let forums = &self.services.forums;
        let Some(topic) = forums.get_topic_by_id(id, true)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        let page_size = ctx.settings.forum.posts_page_size;
        let mut posts = forums.get_all_posts(topic.id, None, page_index(page), page_size)?;
        if posts.items.is_empty() && posts.total_count > 0 {
            let last = posts.total_pages().saturating_sub(1);
            posts = forums.get_all_posts(topic.id, None, last, page_size)?;
        }
        let forum = forums.get_forum_by_id(topic.forum_id)?;
        let permissions = ForumPermissions::new(&ctx.settings);

        let mut post_models = Vec::with_capacity(posts.items.len());
        for post in &posts.items {
            let author = self.services.customers.get_customer_by_id(post.customer_id)?;
            let customer_is_guest = author.as_ref().map_or(true, |c| c.is_guest());
            let customer_post_count = if ctx.settings.forum.show_customers_post_count && !customer_is_guest {
                Some(forums.get_customer_post_count(post.customer_id)?)
            } else {
                None
            };
            post_models.push(ForumPostModel {
                id: post.id,
                topic_id: post.topic_id,
                customer_id: post.customer_id,
                customer_name: author
                    .filter(|c| !c.is_guest())
                    .map(|c| c.display_name(ctx.store.id))
                    .unwrap_or_else(|| "Guest".to_string()),
                customer_is_guest,
                customer_post_count,
                formatted_text: format_post_text(&post.text),
                posted_on: format_date(post.created_at),
                is_current_customer_allowed_to_edit_post: permissions.can_edit_post(&ctx.customer, post),
                is_current_customer_allowed_to_delete_post: permissions.can_delete_post(&ctx.customer, post),
            });
        }

        let can_subscribe = permissions.can_subscribe(&ctx.customer);
        let model = ForumTopicPageModel {
            id: topic.id,
            subject: topic.subject.clone(),
            forum_id: topic.forum_id,
            forum_name: forum.map(|f| f.name).unwrap_or_default(),
            posts: post_models,
            pager: PagerModel::from_list(&posts),
            is_customer_allowed_to_edit_topic: permissions.can_edit_topic(&ctx.customer, &topic),
            is_customer_allowed_to_delete_topic: permissions.can_delete_topic(&ctx.customer, &topic),
            is_customer_allowed_to_move_topic: permissions.can_move_topic(&ctx.customer, &topic),
            is_customer_allowed_to_subscribe: can_subscribe,
            watch_topic_subscribed: can_subscribe
                && self.find_subscription(ctx.customer.id, None, Some(topic.id))?.is_some(),
            can_reply: permissions.can_create_post(&ctx.customer, &topic),
        };
        Ok(ActionResult::view("Boards/Topic", model))
    }

    /// Toggle the topic subscription. Answers `{ Subscribed, Text, Error }`.
    pub fn topic_watch(&self, ctx: &mut WorkContext, id: TopicId) -> ActionOutcome<()> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let Some(topic) = self.services.forums.get_topic_by_id(id, false)? else {
            return Ok(ActionResult::NotFound);
        };
        if !ForumPermissions::new(&ctx.settings).can_subscribe(&ctx.customer) {
            return Ok(ActionResult::json(
                json!({ "Subscribed": false, "Text": "Watch topic", "Error": true }),
            ));
        }
        let subscribed = match self.find_subscription(ctx.customer.id, None, Some(topic.id))? {
            Some(existing) => {
                self.services.forums.delete_subscription(existing.id)?;
                false
            }
            None => {
                self.subscribe(ctx, None, Some(topic.id))?;
                true
            }
        };
        let text = if subscribed { "Unwatch topic" } else { "Watch topic" };
        Ok(ActionResult::json(json!({ "Subscribed": subscribed, "Text": text, "Error": false })))
    }

    pub fn topic_move_form(&self, ctx: &mut WorkContext, id: TopicId) -> ActionOutcome<TopicMoveModel> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let Some(topic) = self.services.forums.get_topic_by_id(id, false)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        if !ForumPermissions::new(&ctx.settings).can_move_topic(&ctx.customer, &topic) {
            return Ok(ActionResult::Unauthorized);
        }
        let model = TopicMoveModel {
            id: topic.id,
            topic_subject: topic.subject.clone(),
            forum_id: topic.forum_id,
            forums: self.forum_select_items(Some(topic.forum_id))?,
        };
        Ok(ActionResult::view("Boards/TopicMove", model))
    }

    pub fn topic_move(&self, ctx: &mut WorkContext, form: &TopicMoveForm) -> ActionOutcome<TopicMoveModel> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let Some(topic) = self.services.forums.get_topic_by_id(form.topic_id, false)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        if !ForumPermissions::new(&ctx.settings).can_move_topic(&ctx.customer, &topic) {
            return Ok(ActionResult::Unauthorized);
        }
        if self.services.forums.get_forum_by_id(form.forum_id)?.is_none() {
            let mut state = ModelState::new();
            state.add_error("ForumId", "Forum not found");
            let model = TopicMoveModel {
                id: topic.id,
                topic_subject: topic.subject.clone(),
                forum_id: topic.forum_id,
                forums: self.forum_select_items(Some(topic.forum_id))?,
            };
            return Ok(ActionResult::view_with_state("Boards/TopicMove", model, state));
        }
        let moved = self.services.forums.move_topic(topic.id, form.forum_id)?;
        tracing::info!(topic_id = %moved.id, forum_id = %moved.forum_id, "topic moved");
        Ok(ActionResult::redirect(RedirectTarget::BoardsTopic { id: moved.id, page: 1 }))
    }

    pub fn topic_delete(&self, ctx: &mut WorkContext, id: TopicId) -> ActionOutcome<()> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let Some(topic) = self.services.forums.get_topic_by_id(id, false)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        if !ForumPermissions::new(&ctx.settings).can_delete_topic(&ctx.customer, &topic) {
            return Ok(ActionResult::Unauthorized);
        }
        self.services.forums.delete_topic(topic.id)?;
        tracing::info!(topic_id = %topic.id, customer_id = %ctx.customer.id, "topic deleted");
        Ok(ActionResult::redirect(RedirectTarget::BoardsForum(topic.forum_id)))
    }

    pub fn topic_create_form(&self, ctx: &mut WorkContext, forum_id: ForumId) -> ActionOutcome<EditForumTopicModel> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let Some(forum) = self.services.forums.get_forum_by_id(forum_id)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        let permissions = ForumPermissions::new(&ctx.settings);
        if !permissions.can_create_topic(&ctx.customer, &forum) {
            return Ok(ActionResult::Unauthorized);
        }
        let model = EditForumTopicModel {
            is_edit: false,
            forum_id: forum.id,
            forum_name: forum.name.clone(),
            topic_type: ForumTopicType::Normal,
            is_customer_allowed_to_set_topic_priority: permissions.can_set_topic_priority(&ctx.customer),
            is_customer_allowed_to_subscribe: permissions.can_subscribe(&ctx.customer),
            ..Default::default()
        };
        Ok(ActionResult::view("Boards/TopicCreate", model))
    }

    fn validate_topic_form(form: &TopicForm) -> ModelState {
        let mut state = ModelState::new();
        validation::collect(&mut state, "", form.validate());
        state
    }

    pub fn topic_create(&self, ctx: &mut WorkContext, form: &TopicForm) -> ActionOutcome<EditForumTopicModel> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let Some(forum) = self.services.forums.get_forum_by_id(form.forum_id)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        let permissions = ForumPermissions::new(&ctx.settings);
        if !permissions.can_create_topic(&ctx.customer, &forum) {
            return Ok(ActionResult::Unauthorized);
        }
        let can_set_priority = permissions.can_set_topic_priority(&ctx.customer);
        let can_subscribe = permissions.can_subscribe(&ctx.customer);

        let state = Self::validate_topic_form(form);
        if !state.is_valid() {
            let model = EditForumTopicModel {
                is_edit: false,
                forum_id: forum.id,
                forum_name: forum.name.clone(),
                subject: form.subject.clone(),
                text: form.text.clone(),
                topic_type: form.topic_type,
                is_customer_allowed_to_set_topic_priority: can_set_priority,
                is_customer_allowed_to_subscribe: can_subscribe,
                subscribed: form.subscribed,
                ..Default::default()
            };
            return Ok(ActionResult::view_with_state("Boards/TopicCreate", model, state));
        }

        let settings = &ctx.settings.forum;
        let topic = self.services.forums.insert_topic(ForumTopic {
            id: TopicId::default(),
            forum_id: forum.id,
            customer_id: ctx.customer.id,
            topic_type: if can_set_priority { form.topic_type } else { ForumTopicType::Normal },
            subject: truncate_chars(form.subject.trim(), settings.topic_subject_max_length),
            num_posts: 0,
            views: 0,
            first_post_id: None,
            last_post_id: None,
            last_post_customer_id: None,
            last_post_time: None,
            created_at: 0,
            updated_at: 0,
        })?;
        self.services.forums.insert_post(ForumPost {
            id: PostId::default(),
            topic_id: topic.id,
            customer_id: ctx.customer.id,
            text: truncate_chars(form.text.trim(), settings.post_max_length),
            ip_address: None,
            created_at: 0,
            updated_at: 0,
        })?;

        for subscriber in self.subscribers(ctx, Some(forum.id), None)? {
            self.services
                .messages
                .send_new_forum_topic_message(&ctx.store, &subscriber, &topic, &forum.name)?;
        }
        if can_subscribe && form.subscribed {
            self.subscribe(ctx, None, Some(topic.id))?;
        }
        tracing::info!(topic_id = %topic.id, forum_id = %forum.id, "topic created");
        Ok(ActionResult::redirect(RedirectTarget::BoardsTopic { id: topic.id, page: 1 }))
    }

    pub fn topic_edit_form(&self, ctx: &mut WorkContext, id: TopicId) -> ActionOutcome<EditForumTopicModel> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let forums = &self.services.forums;
        let Some(topic) = forums.get_topic_by_id(id, false)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        let permissions = ForumPermissions::new(&ctx.settings);
        if !permissions.can_edit_topic(&ctx.customer, &topic) {
            return Ok(ActionResult::Unauthorized);
        }
        let first_post = match topic.first_post_id {
            Some(post_id) => forums.get_post_by_id(post_id)?,
            None => None,
        };
        let can_subscribe = permissions.can_subscribe(&ctx.customer);
        let model = EditForumTopicModel {
            is_edit: true,
            id: topic.id,
            forum_id: topic.forum_id,
            forum_name: forums.get_forum_by_id(topic.forum_id)?.map(|f| f.name).unwrap_or_default(),
            subject: topic.subject.clone(),
            text: first_post.map(|p| p.text).unwrap_or_default(),
            topic_type: topic.topic_type,
            is_customer_allowed_to_set_topic_priority: permissions.can_set_topic_priority(&ctx.customer),
            is_customer_allowed_to_subscribe: can_subscribe,
            subscribed: can_subscribe && self.find_subscription(ctx.customer.id, None, Some(topic.id))?.is_some(),
        };
        Ok(ActionResult::view("Boards/TopicEdit", model))
    }

    pub fn topic_edit(&self, ctx: &mut WorkContext, form: &TopicForm) -> ActionOutcome<EditForumTopicModel> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let forums = &self.services.forums;
        let Some(mut topic) = forums.get_topic_by_id(form.id, false)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        let permissions = ForumPermissions::new(&ctx.settings);
        if !permissions.can_edit_topic(&ctx.customer, &topic) {
            return Ok(ActionResult::Unauthorized);
        }
        let can_set_priority = permissions.can_set_topic_priority(&ctx.customer);
        let can_subscribe = permissions.can_subscribe(&ctx.customer);

        let state = Self::validate_topic_form(form);
        if !state.is_valid() {
            let model = EditForumTopicModel {
                is_edit: true,
                id: topic.id,
                forum_id: topic.forum_id,
                subject: form.subject.clone(),
                text: form.text.clone(),
                topic_type: form.topic_type,
                is_customer_allowed_to_set_topic_priority: can_set_priority,
                is_customer_allowed_to_subscribe: can_subscribe,
                subscribed: form.subscribed,
                ..Default::default()
            };
            return Ok(ActionResult::view_with_state("Boards/TopicEdit", model, state));
        }

        let settings = &ctx.settings.forum;
        topic.subject = truncate_chars(form.subject.trim(), settings.topic_subject_max_length);
        if can_set_priority {
            topic.topic_type = form.topic_type;
        }
        forums.update_topic(&topic)?;
        if let Some(post_id) = topic.first_post_id {
            if let Some(mut first) = forums.get_post_by_id(post_id)? {
                first.text = truncate_chars(form.text.trim(), settings.post_max_length);
                forums.update_post(&first)?;
            }
        }
        if can_subscribe {
            self.set_subscription(ctx, None, Some(topic.id), form.subscribed)?;
        }
        Ok(ActionResult::redirect(RedirectTarget::BoardsTopic { id: topic.id, page: 1 }))
    }

    /// Reply form, optionally quoting an existing post of the topic.
    pub fn post_create_form(
        &self,
        ctx: &mut WorkContext,
        topic_id: TopicId,
        quote: Option<PostId>,
    ) -> ActionOutcome<EditForumPostModel> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let forums = &self.services.forums;
        let Some(topic) = forums.get_topic_by_id(topic_id, false)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        let permissions = ForumPermissions::new(&ctx.settings);
        if !permissions.can_create_post(&ctx.customer, &topic) {
            return Ok(ActionResult::Unauthorized);
        }
        let mut text = String::new();
        if let Some(quoted_id) = quote {
            if let Some(quoted) = forums.get_post_by_id(quoted_id)?.filter(|p| p.topic_id == topic.id) {
                text = quote_for_reply(&self.name_of(ctx, quoted.customer_id)?, &quoted.text);
            }
        }
        let can_subscribe = permissions.can_subscribe(&ctx.customer);
        let model = EditForumPostModel {
            is_edit: false,
            topic_id: topic.id,
            topic_subject: topic.subject.clone(),
            forum_id: topic.forum_id,
            forum_name: forums.get_forum_by_id(topic.forum_id)?.map(|f| f.name).unwrap_or_default(),
            text,
            is_customer_allowed_to_subscribe: can_subscribe,
            subscribed: can_subscribe && self.find_subscription(ctx.customer.id, None, Some(topic.id))?.is_some(),
            ..Default::default()
        };
        Ok(ActionResult::view("Boards/PostCreate", model))
    }

    /// Add a reply and go to the page that shows it.
    pub fn post_create(&self, ctx: &mut WorkContext, form: &PostForm) -> ActionOutcome<EditForumPostModel> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let forums = &self.services.forums;
        let Some(topic) = forums.get_topic_by_id(form.topic_id, false)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        let permissions = ForumPermissions::new(&ctx.settings);
        if !permissions.can_create_post(&ctx.customer, &topic) {
            return Ok(ActionResult::Unauthorized);
        }
        let can_subscribe = permissions.can_subscribe(&ctx.customer);

        let mut state = ModelState::new();
        validation::collect(&mut state, "", form.validate());
        if !state.is_valid() {
            let model = EditForumPostModel {
                is_edit: false,
                topic_id: topic.id,
                topic_subject: topic.subject.clone(),
                forum_id: topic.forum_id,
                text: form.text.clone(),
                is_customer_allowed_to_subscribe: can_subscribe,
                subscribed: form.subscribed,
                ..Default::default()
            };
            return Ok(ActionResult::view_with_state("Boards/PostCreate", model, state));
        }

        let post = forums.insert_post(ForumPost {
            id: PostId::default(),
            topic_id: topic.id,
            customer_id: ctx.customer.id,
            text: truncate_chars(form.text.trim(), ctx.settings.forum.post_max_length),
            ip_address: None,
            created_at: 0,
            updated_at: 0,
        })?;
        let page_size = ctx.settings.forum.posts_page_size;
        let page = forums.calculate_topic_page_index(topic.id, page_size, post.id)? + 1;

        for subscriber in self.subscribers(ctx, None, Some(topic.id))? {
            self.services
                .messages
                .send_new_forum_post_message(&ctx.store, &subscriber, &topic, &post, page)?;
        }
        if can_subscribe {
            self.set_subscription(ctx, None, Some(topic.id), form.subscribed)?;
        }
        tracing::debug!(post_id = %post.id, topic_id = %topic.id, page, "post created");
        Ok(ActionResult::redirect(RedirectTarget::BoardsTopic { id: topic.id, page }))
    }

    pub fn post_edit_form(&self, ctx: &mut WorkContext, id: PostId) -> ActionOutcome<EditForumPostModel> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let forums = &self.services.forums;
        let Some(post) = forums.get_post_by_id(id)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        let Some(topic) = forums.get_topic_by_id(post.topic_id, false)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        let permissions = ForumPermissions::new(&ctx.settings);
        if !permissions.can_edit_post(&ctx.customer, &post) {
            return Ok(ActionResult::Unauthorized);
        }
        let can_subscribe = permissions.can_subscribe(&ctx.customer);
        let model = EditForumPostModel {
            is_edit: true,
            id: post.id,
            topic_id: topic.id,
            topic_subject: topic.subject.clone(),
            forum_id: topic.forum_id,
            forum_name: forums.get_forum_by_id(topic.forum_id)?.map(|f| f.name).unwrap_or_default(),
            text: post.text.clone(),
            is_customer_allowed_to_subscribe: can_subscribe,
            subscribed: can_subscribe && self.find_subscription(ctx.customer.id, None, Some(topic.id))?.is_some(),
        };
        Ok(ActionResult::view("Boards/PostEdit", model))
    }

    pub fn post_edit(&self, ctx: &mut WorkContext, form: &PostForm) -> ActionOutcome<EditForumPostModel> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let forums = &self.services.forums;
        let Some(mut post) = forums.get_post_by_id(form.id)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        let permissions = ForumPermissions::new(&ctx.settings);
        if !permissions.can_edit_post(&ctx.customer, &post) {
            return Ok(ActionResult::Unauthorized);
        }
        let can_subscribe = permissions.can_subscribe(&ctx.customer);

        let mut state = ModelState::new();
        validation::collect(&mut state, "", form.validate());
        if !state.is_valid() {
            let model = EditForumPostModel {
                is_edit: true,
                id: post.id,
                topic_id: post.topic_id,
                text: form.text.clone(),
                is_customer_allowed_to_subscribe: can_subscribe,
                subscribed: form.subscribed,
                ..Default::default()
            };
            return Ok(ActionResult::view_with_state("Boards/PostEdit", model, state));
        }

        post.text = truncate_chars(form.text.trim(), ctx.settings.forum.post_max_length);
        forums.update_post(&post)?;
        if can_subscribe {
            self.set_subscription(ctx, None, Some(post.topic_id), form.subscribed)?;
        }
        let page = forums.calculate_topic_page_index(post.topic_id, ctx.settings.forum.posts_page_size, post.id)? + 1;
        Ok(ActionResult::redirect(RedirectTarget::BoardsTopic {
            id: post.topic_id,
            page,
        }))
    }

    /// Delete a post. Removing the first post removes the whole topic.
    pub fn post_delete(&self, ctx: &mut WorkContext, id: PostId) -> ActionOutcome<()> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let forums = &self.services.forums;
        let Some(post) = forums.get_post_by_id(id)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        if !ForumPermissions::new(&ctx.settings).can_delete_post(&ctx.customer, &post) {
            return Ok(ActionResult::Unauthorized);
        }
        let Some(topic) = forums.get_topic_by_id(post.topic_id, false)? else {
            return Ok(ActionResult::redirect(RedirectTarget::Boards));
        };
        forums.delete_post(post.id)?;
        tracing::info!(post_id = %post.id, topic_id = %topic.id, "post deleted");

        if forums.get_topic_by_id(topic.id, false)?.is_some() {
            Ok(ActionResult::redirect(RedirectTarget::BoardsTopic { id: topic.id, page: 1 }))
        } else {
            Ok(ActionResult::redirect(RedirectTarget::BoardsForum(topic.forum_id)))
        }
    }

    pub fn search(&self, ctx: &mut WorkContext, query: &SearchQuery) -> ActionOutcome<SearchModel> {
        if !ctx.settings.forum.forums_enabled {
            return disabled();
        }
        let settings = &ctx.settings.forum;
        let terms = query.search_terms.trim();
        let mut model = SearchModel {
            search_terms: terms.to_string(),
            show_advanced_search: query.advanced,
            forums: self.forum_select_items(query.forum_id)?,
            ..Default::default()
        };
        if terms.is_empty() {
            return Ok(ActionResult::view("Boards/Search", model));
        }
        if terms.chars().count() < settings.forum_search_term_minimum_length {
            model.warning = Some(format!(
                "Search term minimum length is {} characters",
                settings.forum_search_term_minimum_length
            ));
            return Ok(ActionResult::view("Boards/Search", model));
        }

        let mut search = TopicSearch {
            keywords: Some(terms.to_string()),
            page_index: page_index(query.page),
            page_size: settings.search_results_page_size,
            ..Default::default()
        };
        if query.advanced {
            search.forum_id = query.forum_id;
            search.search_type = query.within;
            search.limit_days = query.limit_days;
        }
        let found = self.services.forums.get_all_topics(&search)?;
        model.results = self.topic_rows(ctx, &found.items)?;
        model.no_results_is_visible = found.items.is_empty();
        model.pager = Some(PagerModel::from_list(&found));
        Ok(ActionResult::view("Boards/Search", model))
    }

    pub fn customer_forum_subscriptions(
        &self,
        ctx: &mut WorkContext,
        page: usize,
    ) -> ActionOutcome<CustomerForumSubscriptionsModel> {
        let settings = &ctx.settings.forum;
        if !settings.forums_enabled || !settings.allow_customers_to_manage_subscriptions {
            return disabled();
        }
        if !ctx.is_registered() {
            return Ok(ActionResult::Unauthorized);
        }
        let subscriptions = self.services.forums.get_all_subscriptions(&SubscriptionFilter {
            customer_id: Some(ctx.customer.id),
            page_index: page_index(page),
            page_size: settings.forum_subscriptions_page_size,
            ..Default::default()
        })?;

        let mut models = Vec::with_capacity(subscriptions.items.len());
        for subscription in &subscriptions.items {
            let title = match (subscription.topic_id, subscription.forum_id) {
                (Some(topic_id), _) => self.services.forums.get_topic_by_id(topic_id, false)?.map(|t| t.subject),
                (None, Some(forum_id)) => self.services.forums.get_forum_by_id(forum_id)?.map(|f| f.name),
                (None, None) => None,
            };
            models.push(ForumSubscriptionModel {
                id: subscription.id,
                forum_id: subscription.forum_id,
                topic_id: subscription.topic_id,
                title: title.unwrap_or_default(),
                is_topic: subscription.topic_id.is_some(),
            });
        }
        let model = CustomerForumSubscriptionsModel {
            subscriptions: models,
            pager: PagerModel::from_list(&subscriptions),
        };
        Ok(ActionResult::view("Customer/ForumSubscriptions", model))
    }

    /// Remove the given subscriptions. Ids of other customers are ignored.
    pub fn delete_forum_subscriptions(&self, ctx: &mut WorkContext, ids: &[SubscriptionId]) -> ActionOutcome<()> {
        let settings = &ctx.settings.forum;
        if !settings.forums_enabled || !settings.allow_customers_to_manage_subscriptions {
            return disabled();
        }
        if !ctx.is_registered() {
            return Ok(ActionResult::Unauthorized);
        }
        for id in ids {
            if let Some(subscription) = self.services.forums.get_subscription_by_id(*id)? {
                if subscription.customer_id == ctx.customer.id {
                    self.services.forums.delete_subscription(subscription.id)?;
                }
            }
        }
        Ok(ActionResult::redirect(RedirectTarget::CustomerForumSubscriptions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_cache::SessionId;
    use shop_services::seed::{seed_demo, DemoData, DEMO_STORE_ID};

    use crate::config::ShopConfig;
    use crate::context::ContextFactory;

    fn setup() -> (ServiceRegistry, DemoData, WorkContext) {
        let services = ServiceRegistry::in_memory();
        let demo = seed_demo(&services.memory).unwrap();
        let factory = ContextFactory::new(services.clone(), ShopConfig::default());
        let ctx = factory.resolve(DEMO_STORE_ID, &SessionId::generate()).unwrap();
        (services, demo, ctx)
    }

    fn as_moderator(services: &ServiceRegistry, demo: &DemoData, ctx: &mut WorkContext) {
        let moderator = services.customers.get_customer_by_id(demo.moderator).unwrap().unwrap();
        ctx.switch_customer(moderator);
    }

    #[test]
    fn test_index_lists_groups_with_last_post() {
        let (services, demo, mut ctx) = setup();
        let boards = BoardsController::new(services);
        let result = boards.index(&mut ctx).unwrap();
        let model = result.model().unwrap();
        assert_eq!(model.forum_groups.len(), 1);
        let announcements = &model.forum_groups[0].forums[0];
        assert_eq!(announcements.id, demo.forum);
        assert_eq!((announcements.num_topics, announcements.num_posts), (1, 1));
        let last = announcements.last_post.as_ref().unwrap();
        assert_eq!(last.customer_name, "moderator");
        assert_eq!(last.topic_subject, "Welcome to the Demo Store forums");
    }

    #[test]
    fn test_disabled_forums_redirect_home() {
        let (services, demo, mut ctx) = setup();
        ctx.settings.forum.forums_enabled = false;
        let boards = BoardsController::new(services);
        let result = boards.topic(&mut ctx, demo.topic, 1).unwrap();
        assert_eq!(result.redirect_target(), Some(&RedirectTarget::HomePage));
    }

    #[test]
    fn test_topic_counts_views_and_clamps_page() {
        let (services, demo, mut ctx) = setup();
        let boards = BoardsController::new(services.clone());
        let result = boards.topic(&mut ctx, demo.topic, 7).unwrap();
        let model = result.model().unwrap();
        assert_eq!(model.posts.len(), 1);
        assert_eq!(model.pager.page, 1);
        assert!(model.posts[0].formatted_text.contains("<strong>hello</strong>"));
        assert!(!model.can_reply);

        let topic = services.forums.get_topic_by_id(demo.topic, false).unwrap().unwrap();
        assert_eq!(topic.views, 1);
    }

    #[test]
    fn test_guest_cannot_create_topic() {
        let (services, demo, mut ctx) = setup();
        let boards = BoardsController::new(services);
        assert!(boards.topic_create_form(&mut ctx, demo.forum).unwrap().is_unauthorized());
    }

    #[test]
    fn test_moderator_creates_topic_and_replies() {
        let (services, demo, mut ctx) = setup();
        as_moderator(&services, &demo, &mut ctx);
        let boards = BoardsController::new(services.clone());

        let form = TopicForm {
            forum_id: demo.forum,
            subject: "Store hours".to_string(),
            text: "We are open daily.".to_string(),
            topic_type: ForumTopicType::Sticky,
            subscribed: true,
            ..Default::default()
        };
        let result = boards.topic_create(&mut ctx, &form).unwrap();
        let Some(RedirectTarget::BoardsTopic { id, page }) = result.redirect_target().cloned() else {
            panic!("expected topic redirect, got {:?}", result.redirect_target());
        };
        assert_eq!(page, 1);
        let topic = services.forums.get_topic_by_id(id, false).unwrap().unwrap();
        assert_eq!(topic.topic_type, ForumTopicType::Sticky);
        assert_eq!(topic.num_posts, 1);

        let reply = PostForm {
            topic_id: id,
            text: "Except holidays.".to_string(),
            subscribed: true,
            ..Default::default()
        };
        let result = boards.post_create(&mut ctx, &reply).unwrap();
        assert_eq!(result.redirect_target(), Some(&RedirectTarget::BoardsTopic { id, page: 1 }));
        let forum = services.forums.get_forum_by_id(demo.forum).unwrap().unwrap();
        assert_eq!((forum.num_topics, forum.num_posts), (2, 3));
    }

    #[test]
    fn test_topic_create_requires_subject() {
        let (services, demo, mut ctx) = setup();
        as_moderator(&services, &demo, &mut ctx);
        let boards = BoardsController::new(services);
        let form = TopicForm {
            forum_id: demo.forum,
            text: "Body".to_string(),
            ..Default::default()
        };
        let result = boards.topic_create(&mut ctx, &form).unwrap();
        let state = result.model_state().unwrap();
        assert_eq!(state.field_errors("Subject"), ["Subject cannot be empty".to_string()]);
    }

    #[test]
    fn test_watch_toggles() {
        let (services, demo, mut ctx) = setup();
        as_moderator(&services, &demo, &mut ctx);
        let boards = BoardsController::new(services);

        let first = boards.forum_watch(&mut ctx, demo.forum).unwrap();
        assert_eq!(first.json_body().unwrap()["Subscribed"], true);
        let second = boards.forum_watch(&mut ctx, demo.forum).unwrap();
        assert_eq!(second.json_body().unwrap()["Subscribed"], false);
        assert_eq!(second.json_body().unwrap()["Text"], "Watch forum");
    }

    #[test]
    fn test_guest_watch_is_an_error() {
        let (services, demo, mut ctx) = setup();
        let boards = BoardsController::new(services);
        let result = boards.topic_watch(&mut ctx, demo.topic).unwrap();
        assert_eq!(result.json_body().unwrap()["Error"], true);
    }

    #[test]
    fn test_deleting_first_post_removes_topic() {
        let (services, demo, mut ctx) = setup();
        as_moderator(&services, &demo, &mut ctx);
        let boards = BoardsController::new(services.clone());
        let topic = services.forums.get_topic_by_id(demo.topic, false).unwrap().unwrap();
        let result = boards.post_delete(&mut ctx, topic.first_post_id.unwrap()).unwrap();
        assert_eq!(result.redirect_target(), Some(&RedirectTarget::BoardsForum(demo.forum)));
        assert!(services.forums.get_topic_by_id(demo.topic, false).unwrap().is_none());
    }

    #[test]
    fn test_search_minimum_length() {
        let (services, _demo, mut ctx) = setup();
        let boards = BoardsController::new(services);
        let short = SearchQuery {
            search_terms: "we".to_string(),
            ..Default::default()
        };
        let result = boards.search(&mut ctx, &short).unwrap();
        assert!(result.model().unwrap().warning.is_some());

        let query = SearchQuery {
            search_terms: "welcome".to_string(),
            page: 1,
            ..Default::default()
        };
        let result = boards.search(&mut ctx, &query).unwrap();
        let model = result.model().unwrap();
        assert_eq!(model.results.len(), 1);
        assert!(!model.no_results_is_visible);
    }

    #[test]
    fn test_active_discussions_rss() {
        let (services, _demo, mut ctx) = setup();
        let boards = BoardsController::new(services);
        let result = boards.active_discussions_rss(&mut ctx, None).unwrap();
        let rss = result.content_body().unwrap();
        assert!(rss.contains("<title>Welcome to the Demo Store forums</title>"));
        assert!(rss.contains("http://localhost:8080/boards/topic/"));
    }

    #[test]
    fn test_subscriptions_page_and_delete() {
        let (services, demo, mut ctx) = setup();
        as_moderator(&services, &demo, &mut ctx);
        let boards = BoardsController::new(services);
        boards.topic_watch(&mut ctx, demo.topic).unwrap();

        let result = boards.customer_forum_subscriptions(&mut ctx, 1).unwrap();
        let model = result.model().unwrap();
        assert_eq!(model.subscriptions.len(), 1);
        assert!(model.subscriptions[0].is_topic);
        let ids: Vec<_> = model.subscriptions.iter().map(|s| s.id).collect();

        boards.delete_forum_subscriptions(&mut ctx, &ids).unwrap();
        let result = boards.customer_forum_subscriptions(&mut ctx, 1).unwrap();
        assert!(result.model().unwrap().subscriptions.is_empty());
    }
}
