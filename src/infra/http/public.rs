use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::{
    application::{
        chrome::ChromeService,
        error::{ErrorReport, HttpError},
        feed::{BlogQuery, FeedError, FeedService},
        page::PageService,
    },
    presentation::views::{
        BlogTemplate, IndexTemplate, LayoutChrome, LayoutContext, PageMetaView, PageTemplate,
        PostDetailContext, PostTemplate, SearchTemplate, render_error_response,
        render_not_found_response, render_template_response,
    },
};

use super::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub pages: Arc<PageService>,
    pub chrome: Arc<ChromeService>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/blog", get(blog_index))
        .route("/blog/{slug}", get(post_detail))
        .route("/about", get(about))
        .route("/contact", get(contact))
        .route("/search", get(search))
        .route("/_health", get(health))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BlogParams {
    category: Option<String>,
    page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchParams {
    q: Option<String>,
}

async fn index(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome.load("/");
    let content = state.feed.home().await;
    let view = LayoutContext::new(chrome, content);
    render_template_response(IndexTemplate { view }, StatusCode::OK)
}

async fn blog_index(State(state): State<HttpState>, Query(params): Query<BlogParams>) -> Response {
    let chrome = state.chrome.load("/blog").with_title("Blog");
    let content = state
        .feed
        .blog_index(BlogQuery {
            category: params.category,
            page: params.page,
        })
        .await;
    let view = LayoutContext::new(chrome, content);
    render_template_response(BlogTemplate { view }, StatusCode::OK)
}

async fn post_detail(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    let chrome = state.chrome.load(&format!("/blog/{slug}"));

    match state.feed.post_detail(&slug).await {
        Ok(content) => {
            let meta = post_meta(&chrome, &content);
            let view = LayoutContext::new(chrome.with_meta(meta), content);
            render_template_response(PostTemplate { view }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err, chrome),
    }
}

async fn about(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome.load("/about").with_title("About");
    let view = LayoutContext::new(chrome, state.pages.about());
    render_template_response(PageTemplate { view }, StatusCode::OK)
}

async fn contact(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome.load("/contact").with_title("Contact");
    let view = LayoutContext::new(chrome, state.pages.contact());
    render_template_response(PageTemplate { view }, StatusCode::OK)
}

async fn search(State(state): State<HttpState>, Query(params): Query<SearchParams>) -> Response {
    let chrome = state.chrome.load("/search").with_title("Search");
    let view = LayoutContext::new(chrome, state.pages.search(params.q.as_deref()));
    render_template_response(SearchTemplate { view }, StatusCode::OK)
}

async fn health() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

async fn fallback(State(state): State<HttpState>, request: Request<Body>) -> Response {
    let chrome = state
        .chrome
        .load(request.uri().path())
        .with_title("Page Not Found");
    render_not_found_response(chrome)
}

fn feed_error_to_response(err: FeedError, chrome: LayoutChrome) -> Response {
    match err {
        FeedError::NotFound(slug) => {
            let mut response = render_not_found_response(chrome.with_title("Post Not Found"));
            ErrorReport::from_message(
                "infra::http::feed_error_to_response",
                StatusCode::NOT_FOUND,
                format!("No published post with slug `{slug}`"),
            )
            .attach(&mut response);
            response
        }
        err => render_error_response(chrome, HttpError::from(err)),
    }
}

pub(crate) fn post_meta(chrome: &LayoutChrome, content: &PostDetailContext) -> PageMetaView {
    let description = if content.excerpt.is_empty() {
        format!("Read {} on {}", content.title, chrome.brand.title)
    } else {
        content.excerpt.clone()
    };

    PageMetaView {
        title: format!("{} - {}", content.title, chrome.brand.title),
        description,
        og_image: content.image_url.clone(),
    }
}
