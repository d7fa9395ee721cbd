use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

use crate::application::blog::PostInput;
use crate::application::error::{ErrorReport, HttpError};
use crate::domain::entities::{CommentRecord, PostRecord, UserRecord};
use crate::domain::featured::FeaturedEntry;
use crate::domain::posts::{card_image_url, detail_image_url, display_excerpt, format_human_date};
use crate::domain::stats::CategoryStats;
use crate::domain::types::Category;

pub const SITE_NAME: &str = "Voce";
const DEFAULT_DESCRIPTION: &str = "Stories, essays, and ideas from the Voce community.";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let content = ErrorPageView::not_found();
    let view = LayoutContext::new(chrome, content);
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct UserView {
    pub username: String,
}

#[derive(Clone)]
pub struct NavCategoryView {
    pub label: &'static str,
    pub href: String,
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
}

/// Shared page furniture: brand, navigation, signed-in user, footer year.
#[derive(Clone)]
pub struct LayoutChrome {
    pub site_name: &'static str,
    pub categories: Vec<NavCategoryView>,
    pub user: Option<UserView>,
    pub meta: PageMetaView,
    pub year: i32,
}

impl LayoutChrome {
    pub fn build(user: Option<&UserRecord>, title: &str) -> Self {
        let categories = Category::ALL
            .iter()
            .map(|category| NavCategoryView {
                label: category.as_str(),
                href: format!("/category/{}", category.as_str()),
            })
            .collect();

        Self {
            site_name: SITE_NAME,
            categories,
            user: user.map(|record| UserView {
                username: record.username.clone(),
            }),
            meta: PageMetaView {
                title: page_title(title),
                description: DEFAULT_DESCRIPTION.to_string(),
            },
            year: time::OffsetDateTime::now_utc().year(),
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            meta: PageMetaView {
                description: description.into(),
                ..self.meta
            },
            ..self
        }
    }
}

fn page_title(title: &str) -> String {
    if title.is_empty() {
        SITE_NAME.to_string()
    } else {
        format!("{title} | {SITE_NAME}")
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub site_name: &'static str,
    pub categories: Vec<NavCategoryView>,
    pub user: Option<UserView>,
    pub meta: PageMetaView,
    pub year: i32,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            site_name: chrome.site_name,
            categories: chrome.categories,
            user: chrome.user,
            meta: chrome.meta,
            year: chrome.year,
            content,
        }
    }
}

/// One post rendered as a grid card.
#[derive(Clone)]
pub struct PostCard {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub category: &'static str,
    pub published: String,
    pub views: i64,
    pub image_url: String,
}

impl PostCard {
    pub fn from_record(post: &PostRecord) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            excerpt: display_excerpt(post.excerpt.as_deref(), &post.content),
            author: post.author_name.clone(),
            category: post.category.as_str(),
            published: format_human_date(post.created_at.date()),
            views: post.views,
            image_url: card_image_url(post.image_url.as_deref()).to_string(),
        }
    }

    pub fn from_records(posts: &[PostRecord]) -> Vec<Self> {
        posts.iter().map(Self::from_record).collect()
    }
}

pub struct PostDetailView {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub category: &'static str,
    pub published: String,
    pub views: i64,
    pub image_url: String,
    pub tags: Vec<String>,
    pub content: String,
    pub can_edit: bool,
}

impl PostDetailView {
    pub fn from_record(post: &PostRecord, viewer: Option<Uuid>) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            author: post.author_name.clone(),
            category: post.category.as_str(),
            published: format_human_date(post.created_at.date()),
            views: post.views,
            image_url: detail_image_url(post.image_url.as_deref()).to_string(),
            tags: post.tags.clone(),
            content: post.content.clone(),
            can_edit: viewer == Some(post.author_id),
        }
    }
}

#[derive(Clone)]
pub struct CommentView {
    pub author: String,
    pub published: String,
    pub content: String,
}

impl CommentView {
    pub fn from_record(comment: &CommentRecord) -> Self {
        Self {
            author: comment.author_name.clone(),
            published: format_human_date(comment.created_at.date()),
            content: comment.content.clone(),
        }
    }
}

#[derive(Clone)]
pub struct FeaturedCard {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub category: &'static str,
    pub published: String,
    pub views: i64,
    pub image_url: String,
    pub tags: Vec<String>,
}

impl FeaturedCard {
    pub fn from_entry(entry: &FeaturedEntry) -> Self {
        Self {
            id: entry.id,
            title: entry.title.clone(),
            excerpt: entry.excerpt.clone(),
            author: entry.author.clone(),
            category: entry.category.as_str(),
            published: format_human_date(entry.created_at.date()),
            views: entry.views,
            image_url: entry.image_url.clone(),
            tags: entry.tags.clone(),
        }
    }
}

pub struct HomeContext {
    pub featured: Vec<PostCard>,
    pub recent: Vec<PostCard>,
}

/// One entry in the category filter row above the post list.
#[derive(Clone)]
pub struct FilterLink {
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

pub struct BlogIndexContext {
    pub posts: Vec<PostCard>,
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
    pub active_category: Option<&'static str>,
    pub filters: Vec<FilterLink>,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_href: String,
    pub next_href: String,
}

impl BlogIndexContext {
    pub fn build(
        posts: Vec<PostCard>,
        page: u32,
        total_pages: u32,
        total: u64,
        active_category: Option<Category>,
    ) -> Self {
        let active_category = active_category.map(|category| category.as_str());
        Self {
            posts,
            page,
            total_pages,
            total,
            active_category,
            filters: filter_links(active_category),
            has_prev: page > 1,
            has_next: page < total_pages,
            prev_href: page_href(page.saturating_sub(1), active_category),
            next_href: page_href(page + 1, active_category),
        }
    }
}

fn filter_links(active: Option<&'static str>) -> Vec<FilterLink> {
    let mut links = vec![FilterLink {
        label: "All",
        href: "/blog".to_string(),
        active: active.is_none(),
    }];
    links.extend(Category::ALL.iter().map(|category| {
        let label = category.as_str();
        FilterLink {
            label,
            href: format!("/blog?category={label}"),
            active: active == Some(label),
        }
    }));
    links
}

fn page_href(page: u32, category: Option<&str>) -> String {
    match category {
        Some(category) => format!("/blog?page={page}&category={category}"),
        None => format!("/blog?page={page}"),
    }
}

pub struct BlogShowContext {
    pub post: PostDetailView,
    pub comments: Vec<CommentView>,
    pub comment_count: usize,
    pub related: Vec<PostCard>,
}

/// One `<option>` in the category select.
#[derive(Clone)]
pub struct CategoryOption {
    pub value: &'static str,
    pub selected: bool,
}

/// Prefilled create/edit form. On validation failure the submitted values
/// come back so nothing the author typed is lost.
pub struct PostFormContext {
    pub heading: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub error: Option<String>,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub tags: String,
    pub image_url: String,
    pub categories: Vec<CategoryOption>,
}

impl PostFormContext {
    pub fn create() -> Self {
        Self {
            heading: "Write a New Post",
            action: "/blog/new".to_string(),
            submit_label: "Publish Post",
            error: None,
            title: String::new(),
            content: String::new(),
            excerpt: String::new(),
            tags: String::new(),
            image_url: String::new(),
            categories: category_options(""),
        }
    }

    pub fn edit_action(id: Uuid) -> Self {
        Self {
            heading: "Edit Post",
            action: format!("/blog/{id}/edit"),
            submit_label: "Save Changes",
            error: None,
            title: String::new(),
            content: String::new(),
            excerpt: String::new(),
            tags: String::new(),
            image_url: String::new(),
            categories: category_options(""),
        }
    }

    pub fn edit(post: &PostRecord) -> Self {
        let mut form = Self::edit_action(post.id);
        form.title = post.title.clone();
        form.content = post.content.clone();
        form.excerpt = post.excerpt.clone().unwrap_or_default();
        form.tags = post.tags.join(", ");
        form.image_url = post.image_url.clone().unwrap_or_default();
        form.categories = category_options(post.category.as_str());
        form
    }

    pub fn with_input(mut self, input: &PostInput, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.title = input.title.clone();
        self.content = input.content.clone();
        self.excerpt = input.excerpt.clone();
        self.tags = input.tags.clone();
        self.image_url = input.image_url.clone();
        self.categories = category_options(input.category.trim());
        self
    }
}

fn category_options(current: &str) -> Vec<CategoryOption> {
    Category::ALL
        .iter()
        .map(|category| CategoryOption {
            value: category.as_str(),
            selected: category.as_str() == current,
        })
        .collect()
}

pub struct CategoryContext {
    pub name: &'static str,
    pub posts: Vec<PostCard>,
    pub total_posts: u64,
    pub total_views: u64,
    pub top_tags: Vec<String>,
}

impl CategoryContext {
    pub fn build(category: Category, posts: Vec<PostCard>, stats: &CategoryStats) -> Self {
        Self {
            name: category.as_str(),
            posts,
            total_posts: stats.total_posts,
            total_views: stats.total_views,
            top_tags: stats.top_tags.clone(),
        }
    }
}

pub struct FeaturedPageContext {
    pub entries: Vec<FeaturedCard>,
}

pub struct ContactContext {
    pub sent: bool,
}

#[derive(Default)]
pub struct SignupContext {
    pub error: Option<String>,
    pub username: String,
    pub email: String,
}

#[derive(Default)]
pub struct LoginContext {
    pub error: Option<String>,
    pub email: String,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub primary_action: Option<ErrorAction>,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you are looking for does not exist or has been moved. Head back to the homepage to keep reading.".to_string(),
            primary_action: Some(ErrorAction::home()),
        }
    }
}

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

impl ErrorAction {
    pub fn home() -> Self {
        Self {
            href: "/".to_string(),
            label: "Back to home".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<HomeContext>,
}

#[derive(Template)]
#[template(path = "blog_index.html")]
pub struct BlogIndexTemplate {
    pub view: LayoutContext<BlogIndexContext>,
}

#[derive(Template)]
#[template(path = "blog_show.html")]
pub struct BlogShowTemplate {
    pub view: LayoutContext<BlogShowContext>,
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub view: LayoutContext<PostFormContext>,
}

#[derive(Template)]
#[template(path = "category.html")]
pub struct CategoryTemplate {
    pub view: LayoutContext<CategoryContext>,
}

#[derive(Template)]
#[template(path = "featured.html")]
pub struct FeaturedTemplate {
    pub view: LayoutContext<FeaturedPageContext>,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub view: LayoutContext<()>,
}

#[derive(Template)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub view: LayoutContext<ContactContext>,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub view: LayoutContext<SignupContext>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub view: LayoutContext<LoginContext>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn sample_post() -> PostRecord {
        PostRecord {
            id: Uuid::new_v4(),
            title: "Slow Trains Through Umbria".to_string(),
            content: "The regional line winds past olive groves.".to_string(),
            excerpt: None,
            author_id: Uuid::new_v4(),
            author_name: "giulia".to_string(),
            category: Category::Lifestyle,
            tags: vec!["travel".to_string(), "italy".to_string()],
            image_url: None,
            views: 41,
            published: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn card_fills_defaults_from_content() {
        let post = sample_post();
        let card = PostCard::from_record(&post);

        assert_eq!(card.excerpt, "The regional line winds past olive groves....");
        assert!(card.image_url.contains("unsplash.com"));
        assert_eq!(card.category, "Lifestyle");
    }

    #[test]
    fn detail_view_marks_author_as_editor() {
        let post = sample_post();

        let view = PostDetailView::from_record(&post, Some(post.author_id));
        assert!(view.can_edit);

        let view = PostDetailView::from_record(&post, None);
        assert!(!view.can_edit);
    }

    #[test]
    fn pagination_links_keep_the_category_filter() {
        let context = BlogIndexContext::build(Vec::new(), 2, 5, 40, Some(Category::Art));

        assert!(context.has_prev);
        assert!(context.has_next);
        assert_eq!(context.prev_href, "/blog?page=1&category=Art");
        assert_eq!(context.next_href, "/blog?page=3&category=Art");

        let active: Vec<&str> = context
            .filters
            .iter()
            .filter(|link| link.active)
            .map(|link| link.label)
            .collect();
        assert_eq!(active, vec!["Art"]);
    }

    #[test]
    fn unfiltered_list_marks_the_all_link_active() {
        let context = BlogIndexContext::build(Vec::new(), 1, 1, 0, None);

        assert_eq!(context.filters.len(), 9);
        assert!(context.filters[0].active);
        assert_eq!(context.filters[0].href, "/blog");
    }

    #[test]
    fn edit_form_round_trips_stored_fields() {
        let post = sample_post();
        let form = PostFormContext::edit(&post);

        assert_eq!(form.tags, "travel, italy");
        assert!(form.action.ends_with("/edit"));

        let selected: Vec<&str> = form
            .categories
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.value)
            .collect();
        assert_eq!(selected, vec!["Lifestyle"]);
    }

    #[test]
    fn chrome_lists_every_category() {
        let chrome = LayoutChrome::build(None, "Home");

        assert_eq!(chrome.categories.len(), 8);
        assert_eq!(chrome.meta.title, "Home | Voce");
        assert!(chrome.user.is_none());
    }
}
