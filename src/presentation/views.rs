use crate::application::error::{ErrorReport, HttpError};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

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
    let view = LayoutContext::new(chrome, ErrorPageView::not_found());
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// Error page for a failed request; the report from `error` stays attached.
pub fn render_error_response(chrome: LayoutChrome, error: HttpError) -> Response {
    let status = error.status();
    let view = LayoutContext::new(
        chrome.with_title("Something went wrong"),
        ErrorPageView::server_error(),
    );
    let mut response = render_template_response(ErrorTemplate { view }, status);
    error.into_report().attach(&mut response);
    response
}

#[derive(Clone)]
pub struct NavigationView {
    pub entries: Vec<NavigationLinkView>,
}

#[derive(Clone)]
pub struct FooterView {
    pub copy: String,
    pub description: String,
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub href: String,
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
}

impl LayoutChrome {
    /// Document title `<title> - <brand>`.
    pub fn with_title(self, title: &str) -> Self {
        let title = format!("{title} - {}", self.brand.title);
        Self {
            meta: self.meta.with_title(title),
            ..self
        }
    }

    pub fn with_meta(self, meta: PageMetaView) -> Self {
        Self { meta, ..self }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            navigation: chrome.navigation,
            footer: chrome.footer,
            meta: chrome.meta,
            content,
        }
    }
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
    pub og_image: Option<String>,
}

impl PageMetaView {
    pub fn with_title(self, title: String) -> Self {
        Self { title, ..self }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagBadge {
    pub value: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryBadge {
    pub name: String,
    pub href: String,
}

#[derive(Clone, Debug)]
pub struct PostCard {
    pub slug: String,
    pub href: String,
    pub title: String,
    pub excerpt: String,
    pub iso_date: String,
    pub published: String,
    pub reading_minutes: u32,
    pub image_url: Option<String>,
    pub category: Option<CategoryBadge>,
    pub badges: Vec<TagBadge>,
}

pub struct HeroView {
    pub title: String,
    pub subtitle: String,
}

pub struct HomeContext {
    pub hero: HeroView,
    pub posts: Vec<PostCard>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<HomeContext>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageLinkView {
    pub number: u32,
    pub href: String,
    pub is_current: bool,
}

#[derive(Clone, Debug)]
pub struct PaginationView {
    pub current: u32,
    pub total_pages: u32,
    pub previous: Option<String>,
    pub next: Option<String>,
    pub pages: Vec<PageLinkView>,
}

pub struct BlogIndexContext {
    pub posts: Vec<PostCard>,
    pub category: Option<String>,
    pub total_count: u64,
    pub pagination: Option<PaginationView>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "blog.html")]
pub struct BlogTemplate {
    pub view: LayoutContext<BlogIndexContext>,
}

pub struct PostDetailContext {
    pub slug: String,
    pub title: String,
    pub published: String,
    pub iso_date: String,
    pub reading_minutes: u32,
    pub excerpt: String,
    pub image_url: Option<String>,
    pub category: Option<CategoryBadge>,
    pub tags: Vec<TagBadge>,
    /// Sanitised HTML body.
    pub content_html: String,
    pub related: Vec<PostCard>,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

pub struct PageSectionView {
    pub heading: String,
    pub paragraphs: Vec<String>,
    pub items: Vec<String>,
}

pub struct PageView {
    pub title: String,
    pub lead: String,
    pub sections: Vec<PageSectionView>,
    pub primary_action: Option<ActionLink>,
}

#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    pub view: LayoutContext<PageView>,
}

pub struct SearchView {
    pub query: String,
    pub has_query: bool,
    pub notice: String,
}

#[derive(Template)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub view: LayoutContext<SearchView>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub primary_action: Option<ActionLink>,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist. Try returning to the homepage to continue exploring.".to_string(),
            primary_action: Some(ActionLink::home()),
        }
    }

    pub fn server_error() -> Self {
        Self {
            title: "Something went wrong".to_string(),
            message: "The content could not be loaded right now. Please try again in a moment."
                .to_string(),
            primary_action: Some(ActionLink::home()),
        }
    }
}

pub struct ActionLink {
    pub href: String,
    pub label: String,
}

impl ActionLink {
    pub fn home() -> Self {
        Self {
            href: "/".to_string(),
            label: "Back to home".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

pub fn build_tag_badges<'a, T>(tags: T) -> Vec<TagBadge>
where
    T: IntoIterator<Item = (&'a str, &'a str)>,
{
    tags.into_iter()
        .filter(|(slug, _)| !slug.is_empty())
        .map(|(slug, name)| TagBadge {
            value: slug.to_string(),
            label: format!("#{}", if name.is_empty() { slug } else { name }),
        })
        .collect()
}
