use std::sync::Arc;

use thiserror::Error;
use tracing::{error, warn};
use url::form_urlencoded;

use crate::application::pagination::{PageWindow, parse_page};
use crate::application::repos::{PostPageQuery, PostsRepo, RepoError};
use crate::config::SiteSettings;
use crate::domain::posts::{Category, Post, iso_date};
use crate::infra::assets::{AssetTransform, AssetUrlBuilder};
use crate::presentation::views::{
    BlogIndexContext, CategoryBadge, HeroView, HomeContext, PageLinkView, PaginationView,
    PostCard, PostDetailContext, build_tag_badges,
};

const CARD_EXCERPT_CHARS: usize = 160;
const DETAIL_EXCERPT_CHARS: usize = 220;
const RELATED_LIMIT: usize = 3;
const FETCH_FAILED: &str = "Failed to fetch posts";
const BLOG_PATH: &str = "/blog";

const CARD_IMAGE: AssetTransform = AssetTransform {
    width: Some(800),
    height: Some(450),
    quality: Some(80),
};
const HERO_IMAGE: AssetTransform = AssetTransform {
    width: Some(1600),
    height: Some(900),
    quality: Some(85),
};

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    assets: AssetUrlBuilder,
    site: SiteSettings,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("post `{0}` not found")]
    NotFound(String),
    #[error("failed to load post")]
    Repo(#[from] RepoError),
}

/// Raw query parameters of the blog index.
#[derive(Debug, Clone, Default)]
pub struct BlogQuery {
    pub category: Option<String>,
    pub page: Option<String>,
}

impl FeedService {
    pub fn new(posts: Arc<dyn PostsRepo>, assets: AssetUrlBuilder, site: SiteSettings) -> Self {
        Self {
            posts,
            assets,
            site,
        }
    }

    /// Hero plus the most recent posts. A failed fetch still renders, with an
    /// error banner instead of cards.
    pub async fn home(&self) -> HomeContext {
        let hero = HeroView {
            title: self.site.hero_title.clone(),
            subtitle: self.site.hero_subtitle.clone(),
        };
        let limit = self.site.home_recent_posts.get() as usize;

        match self.posts.list_published_posts().await {
            Ok(posts) => HomeContext {
                hero,
                posts: posts.take(limit).map(|post| self.card(&post)).collect(),
                error: None,
            },
            Err(err) => {
                error!(
                    target: "rehive::feed",
                    error = %err,
                    "failed to fetch posts for the home page"
                );
                HomeContext {
                    hero,
                    posts: Vec::new(),
                    error: Some(FETCH_FAILED.to_string()),
                }
            }
        }
    }

    pub async fn blog_index(&self, query: BlogQuery) -> BlogIndexContext {
        let category = query
            .category
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let window = PageWindow::new(parse_page(query.page.as_deref()), self.site.blog_page_size);
        let request = PostPageQuery {
            category: category.clone(),
            limit: window.limit(),
            offset: window.offset(),
        };

        match self.posts.list_published_page(&request).await {
            Ok(page) => {
                let total_pages = window.total_pages(page.total);
                BlogIndexContext {
                    posts: page.posts.iter().map(|post| self.card(post)).collect(),
                    pagination: build_pagination(window.page, total_pages, category.as_deref()),
                    category,
                    total_count: page.total,
                    error: None,
                }
            }
            Err(err) => {
                error!(
                    target: "rehive::feed",
                    error = %err,
                    page = window.page,
                    category = category.as_deref().unwrap_or(""),
                    "failed to fetch posts for the blog index"
                );
                BlogIndexContext {
                    posts: Vec::new(),
                    category,
                    total_count: 0,
                    pagination: None,
                    error: Some(FETCH_FAILED.to_string()),
                }
            }
        }
    }

    pub async fn post_detail(&self, slug: &str) -> Result<PostDetailContext, FeedError> {
        let post = self
            .posts
            .find_published_by_slug(slug)
            .await?
            .ok_or_else(|| FeedError::NotFound(slug.to_string()))?;

        let related = self.related_posts(&post).await;

        Ok(PostDetailContext {
            slug: post.slug.clone(),
            title: post.title.clone(),
            published: post.display_date(),
            iso_date: post.date_created.as_deref().and_then(iso_date).unwrap_or_default(),
            reading_minutes: post.reading_minutes(),
            excerpt: post.summary_text(DETAIL_EXCERPT_CHARS),
            image_url: post
                .featured_image
                .as_ref()
                .and_then(|image| self.assets.build(Some(image), HERO_IMAGE)),
            category: post.category.as_ref().map(category_badge),
            tags: build_tag_badges(tag_pairs(&post)),
            content_html: ammonia::clean(&post.content),
            related,
        })
    }

    /// Other posts in the same category. Failures only cost the section.
    async fn related_posts(&self, post: &Post) -> Vec<PostCard> {
        let Some(category) = post.category.as_ref().filter(|c| !c.slug.is_empty()) else {
            return Vec::new();
        };

        let query = PostPageQuery {
            category: Some(category.slug.clone()),
            limit: (RELATED_LIMIT + 1) as u32,
            offset: 0,
        };
        match self.posts.list_published_page(&query).await {
            Ok(page) => page
                .posts
                .iter()
                .filter(|candidate| candidate.slug != post.slug)
                .take(RELATED_LIMIT)
                .map(|candidate| self.card(candidate))
                .collect(),
            Err(err) => {
                warn!(
                    target: "rehive::feed",
                    error = %err,
                    slug = %post.slug,
                    "failed to load related posts"
                );
                Vec::new()
            }
        }
    }

    fn card(&self, post: &Post) -> PostCard {
        PostCard {
            slug: post.slug.clone(),
            href: format!("{BLOG_PATH}/{}", post.slug),
            title: post.title.clone(),
            excerpt: post.summary_text(CARD_EXCERPT_CHARS),
            iso_date: post.date_created.as_deref().and_then(iso_date).unwrap_or_default(),
            published: post.display_date(),
            reading_minutes: post.reading_minutes(),
            image_url: post
                .featured_image
                .as_ref()
                .and_then(|image| self.assets.build(Some(image), CARD_IMAGE)),
            category: post.category.as_ref().map(category_badge),
            badges: build_tag_badges(tag_pairs(post)),
        }
    }
}

fn tag_pairs(post: &Post) -> impl Iterator<Item = (&str, &str)> {
    post.tags
        .iter()
        .map(|tag| (tag.slug.as_str(), tag.name.as_str()))
}

fn category_badge(category: &Category) -> CategoryBadge {
    let slug = Some(category.slug.as_str()).filter(|slug| !slug.is_empty());
    CategoryBadge {
        name: category.name.clone(),
        href: blog_href(1, slug),
    }
}

/// `/blog` with the category and page carried as query parameters; page 1
/// is implied.
pub fn blog_href(page: u32, category: Option<&str>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(category) = category {
        query.append_pair("category", category);
    }
    if page > 1 {
        query.append_pair("page", &page.to_string());
    }
    let query = query.finish();

    if query.is_empty() {
        BLOG_PATH.to_string()
    } else {
        format!("{BLOG_PATH}?{query}")
    }
}

fn build_pagination(current: u32, total_pages: u32, category: Option<&str>) -> Option<PaginationView> {
    if total_pages <= 1 {
        return None;
    }

    let previous = (current > 1).then(|| blog_href(current.min(total_pages + 1) - 1, category));
    let next = (current < total_pages).then(|| blog_href(current + 1, category));
    let pages = (1..=total_pages)
        .map(|number| PageLinkView {
            number,
            href: blog_href(number, category),
            is_current: number == current,
        })
        .collect();

    Some(PaginationView {
        current,
        total_pages,
        previous,
        next,
        pages,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rehive_api_types::RawPost;
    use serde_json::{Value, json};
    use url::Url;

    use super::*;
    use crate::application::repos::{PostPage, PublishedPosts};

    #[derive(Default)]
    struct MemoryRepo {
        raw: Vec<Value>,
        fail: bool,
        page_queries: Mutex<Vec<PostPageQuery>>,
    }

    impl MemoryRepo {
        fn with(raw: Vec<Value>) -> Self {
            Self {
                raw,
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn raw_posts(&self) -> Vec<RawPost> {
            self.raw
                .iter()
                .cloned()
                .map(|value| serde_json::from_value(value).expect("raw post"))
                .collect()
        }

        fn check(&self) -> Result<(), RepoError> {
            if self.fail {
                Err(RepoError::unavailable("connection refused"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl PostsRepo for MemoryRepo {
        async fn list_published_posts(&self) -> Result<PublishedPosts, RepoError> {
            self.check()?;
            Ok(PublishedPosts::from_raw(self.raw_posts()))
        }

        async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
            self.check()?;
            Ok(PublishedPosts::from_raw(self.raw_posts()).find(|post| post.slug == slug))
        }

        async fn list_published_page(&self, query: &PostPageQuery) -> Result<PostPage, RepoError> {
            self.page_queries.lock().expect("lock").push(query.clone());
            self.check()?;
            let matching: Vec<Post> = PublishedPosts::from_raw(self.raw_posts())
                .filter(|post| match query.category.as_deref() {
                    Some(slug) => post.category.as_ref().is_some_and(|c| c.slug == slug),
                    None => true,
                })
                .collect();
            let total = matching.len() as u64;
            let posts = matching
                .into_iter()
                .skip(query.offset as usize)
                .take(query.limit as usize)
                .collect();
            Ok(PostPage { posts, total })
        }
    }

    fn post(slug: &str, category: Option<&str>) -> Value {
        let mut value = json!({
            "id": slug,
            "slug": slug,
            "title": slug.to_uppercase(),
            "status": "published",
            "content": "<p>Hello <strong>world</strong></p>",
            "date_created": "2024-11-25T10:00:00Z",
            "featured_image": "img-1"
        });
        if let Some(category) = category {
            value["category"] = json!({"id": category, "name": category, "slug": category});
        }
        value
    }

    fn service(repo: Arc<MemoryRepo>) -> FeedService {
        FeedService::new(
            repo,
            AssetUrlBuilder::new(Url::parse("http://cms.test/").expect("url")),
            SiteSettings::default(),
        )
    }

    #[tokio::test]
    async fn home_limits_recent_posts() {
        let raw = (0..8).map(|n| post(&format!("p{n}"), None)).collect();
        let home = service(Arc::new(MemoryRepo::with(raw))).home().await;

        assert_eq!(home.posts.len(), 6);
        assert_eq!(home.error, None);
        assert_eq!(home.hero.title, "Welcome to Re:hive Space");
        let card = &home.posts[0];
        assert_eq!(card.href, "/blog/p0");
        assert_eq!(card.published, "November 25, 2024");
        assert_eq!(card.iso_date, "2024-11-25");
        assert_eq!(card.excerpt, "Hello world");
        assert_eq!(card.reading_minutes, 1);
        assert_eq!(
            card.image_url.as_deref(),
            Some("http://cms.test/assets/img-1?width=800&height=450&quality=80&fit=cover")
        );
    }

    #[tokio::test]
    async fn home_degrades_on_failure() {
        let home = service(Arc::new(MemoryRepo::failing())).home().await;
        assert!(home.posts.is_empty());
        assert_eq!(home.error.as_deref(), Some("Failed to fetch posts"));
    }

    #[tokio::test]
    async fn blog_index_pages_through_posts() {
        let raw = (0..25).map(|n| post(&format!("p{n}"), None)).collect();
        let repo = Arc::new(MemoryRepo::with(raw));
        let index = service(repo.clone())
            .blog_index(BlogQuery {
                category: None,
                page: Some("3".into()),
            })
            .await;

        assert_eq!(index.posts.len(), 1);
        assert_eq!(index.total_count, 25);
        let pagination = index.pagination.expect("pagination");
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.previous.as_deref(), Some("/blog?page=2"));
        assert_eq!(pagination.next, None);
        assert_eq!(pagination.pages[0].href, "/blog");
        assert!(pagination.pages[2].is_current);

        let queries = repo.page_queries.lock().expect("lock");
        assert_eq!(queries[0].offset, 24);
        assert_eq!(queries[0].limit, 12);
    }

    #[tokio::test]
    async fn blog_index_treats_bad_pages_as_first() {
        let raw = (0..3).map(|n| post(&format!("p{n}"), None)).collect();
        let repo = Arc::new(MemoryRepo::with(raw));
        let service = service(repo.clone());
        for page in ["0", "-1", "two", ""] {
            let index = service
                .blog_index(BlogQuery {
                    category: None,
                    page: Some(page.into()),
                })
                .await;
            assert_eq!(index.posts.len(), 3);
            assert!(index.pagination.is_none());
        }
        let queries = repo.page_queries.lock().expect("lock");
        assert!(queries.iter().all(|query| query.offset == 0));
    }

    #[tokio::test]
    async fn blog_index_keeps_category_in_links() {
        let mut raw: Vec<Value> = (0..13).map(|n| post(&format!("r{n}"), Some("rust"))).collect();
        raw.push(post("other", Some("go")));
        let index = service(Arc::new(MemoryRepo::with(raw)))
            .blog_index(BlogQuery {
                category: Some("rust".into()),
                page: None,
            })
            .await;

        assert_eq!(index.total_count, 13);
        assert_eq!(index.category.as_deref(), Some("rust"));
        let pagination = index.pagination.expect("pagination");
        assert_eq!(pagination.next.as_deref(), Some("/blog?category=rust&page=2"));
        assert_eq!(index.posts[0].category.as_ref().map(|c| c.href.as_str()), Some("/blog?category=rust"));
    }

    #[tokio::test]
    async fn blog_index_degrades_on_failure() {
        let index = service(Arc::new(MemoryRepo::failing()))
            .blog_index(BlogQuery::default())
            .await;
        assert!(index.posts.is_empty());
        assert_eq!(index.total_count, 0);
        assert_eq!(index.error.as_deref(), Some("Failed to fetch posts"));
    }

    #[tokio::test]
    async fn post_detail_sanitizes_and_links_related() {
        let mut first = post("first", Some("rust"));
        first["content"] = json!("<p>Safe</p><script>alert(1)</script>");
        first["tags"] = json!([{"tags_id": {"id": "t1", "name": "Async", "slug": "async"}}]);
        let raw = vec![
            first,
            post("second", Some("rust")),
            post("third", Some("rust")),
            post("fourth", Some("rust")),
            post("fifth", Some("rust")),
            post("elsewhere", Some("go")),
        ];
        let detail = service(Arc::new(MemoryRepo::with(raw)))
            .post_detail("first")
            .await
            .expect("detail");

        assert_eq!(detail.title, "FIRST");
        assert!(detail.content_html.contains("<p>Safe</p>"));
        assert!(!detail.content_html.contains("script"));
        assert_eq!(detail.tags[0].label, "#Async");
        let related: Vec<&str> = detail.related.iter().map(|card| card.slug.as_str()).collect();
        assert_eq!(related, ["second", "third", "fourth"]);
        assert!(
            detail
                .image_url
                .as_deref()
                .is_some_and(|url| url.contains("width=1600"))
        );
    }

    #[tokio::test]
    async fn post_detail_reports_missing_and_failures() {
        let missing = service(Arc::new(MemoryRepo::with(vec![])))
            .post_detail("nope")
            .await;
        assert!(matches!(missing, Err(FeedError::NotFound(slug)) if slug == "nope"));

        let failed = service(Arc::new(MemoryRepo::failing()))
            .post_detail("any")
            .await;
        assert!(matches!(failed, Err(FeedError::Repo(_))));
    }

    #[test]
    fn blog_href_encodes_category() {
        assert_eq!(blog_href(1, None), "/blog");
        assert_eq!(blog_href(2, Some("c++ & more")), "/blog?category=c%2B%2B+%26+more&page=2");
    }

    #[test]
    fn pages_past_the_end_link_back() {
        let pagination = build_pagination(9, 3, None).expect("pagination");
        assert_eq!(pagination.previous.as_deref(), Some("/blog?page=3"));
        assert_eq!(pagination.next, None);
    }
}
