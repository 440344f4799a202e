//! Directus-backed implementation of [`PostsRepo`].

use async_trait::async_trait;
use metrics::counter;
use rehive_api_types::{ItemsEnvelope, RawPost};
use reqwest::{Client, Response, header::ACCEPT};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::application::repos::{PostPage, PostPageQuery, PostsRepo, PublishedPosts, RepoError};
use crate::config::CmsSettings;
use crate::domain::normalize::normalize_post;
use crate::domain::posts::Post;
use crate::domain::types::PostStatus;

use super::error::InfraError;

const POSTS_PATH: &str = "items/posts";
const POST_FIELDS: &str = "*,featured_image.*,category.id,category.name,category.slug,tags.*,tags.tags_id.id,tags.tags_id.name,tags.tags_id.slug";
const NEWEST_FIRST: &str = "-date_created";

#[derive(Debug, Clone)]
pub struct DirectusClient {
    http: Client,
    base: Url,
}

impl DirectusClient {
    pub fn new(settings: &CmsSettings) -> Result<Self, InfraError> {
        let mut builder = Client::builder().user_agent(Self::user_agent());
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(InfraError::CmsClient)?;

        Ok(Self {
            http,
            base: settings.url.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("rehive/", env!("CARGO_PKG_VERSION"))
    }

    fn posts_url(&self, query: &[(&str, String)]) -> Result<Url, RepoError> {
        let mut url = self
            .base
            .join(POSTS_PATH)
            .map_err(|err| RepoError::InvalidRequest(err.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &[(&str, String)],
    ) -> Result<ItemsEnvelope<T>, RepoError> {
        let url = self.posts_url(query)?;
        counter!("rehive_cms_request_total", "operation" => operation).increment(1);
        debug!(target: "rehive::cms", operation, url = %url, "querying content service");

        let result = match self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
        {
            Ok(response) => Self::handle(response).await,
            Err(err) => Err(RepoError::unavailable(err)),
        };

        if let Err(err) = &result {
            counter!("rehive_cms_failure_total", "operation" => operation).increment(1);
            warn!(target: "rehive::cms", operation, error = %err, "content query failed");
        }
        result
    }

    async fn handle<T: DeserializeOwned>(response: Response) -> Result<T, RepoError> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(RepoError::unavailable)?;
        if !status.is_success() {
            return Err(RepoError::Upstream {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        serde_json::from_slice(&bytes).map_err(RepoError::decode)
    }
}

fn published_filter() -> (&'static str, String) {
    ("filter[status][_eq]", PostStatus::Published.as_str().to_string())
}

#[async_trait]
impl PostsRepo for DirectusClient {
    async fn list_published_posts(&self) -> Result<PublishedPosts, RepoError> {
        let query = [
            published_filter(),
            ("sort", NEWEST_FIRST.to_string()),
            ("fields", POST_FIELDS.to_string()),
        ];
        let envelope: ItemsEnvelope<Vec<RawPost>> =
            self.fetch("list_published_posts", &query).await?;
        Ok(PublishedPosts::from_raw(envelope.data))
    }

    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let query = [
            ("filter[slug][_eq]", slug.to_string()),
            published_filter(),
            ("limit", "1".to_string()),
            ("fields", POST_FIELDS.to_string()),
        ];
        let envelope: ItemsEnvelope<Vec<RawPost>> =
            self.fetch("find_published_by_slug", &query).await?;

        Ok(envelope
            .data
            .into_iter()
            .next()
            .map(normalize_post)
            .filter(|post| post.is_published() && post.slug == slug))
    }

    async fn list_published_page(&self, query: &PostPageQuery) -> Result<PostPage, RepoError> {
        let mut params = vec![published_filter()];
        if let Some(category) = query.category.as_deref() {
            params.push(("filter[category][slug][_eq]", category.to_string()));
        }
        params.extend([
            ("sort", NEWEST_FIRST.to_string()),
            ("fields", POST_FIELDS.to_string()),
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
            ("meta", "filter_count".to_string()),
        ]);

        let envelope: ItemsEnvelope<Vec<RawPost>> =
            self.fetch("list_published_page", &params).await?;
        let fetched = envelope.data.len() as u64;
        let total = envelope
            .meta
            .and_then(|meta| meta.filter_count)
            .unwrap_or(u64::from(query.offset) + fetched);

        Ok(PostPage {
            posts: PublishedPosts::from_raw(envelope.data).collect(),
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::MockServer;
    use serde_json::json;

    use super::*;

    fn client(server: &MockServer) -> DirectusClient {
        let settings = CmsSettings {
            url: Url::parse(&format!("{}/", server.base_url())).expect("url"),
            public_url: Url::parse("http://cms.test/").expect("url"),
            request_timeout: Some(Duration::from_secs(5)),
        };
        DirectusClient::new(&settings).expect("client")
    }

    #[tokio::test]
    async fn list_requests_published_newest_first_with_relations() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET")
                .path("/items/posts")
                .query_param("filter[status][_eq]", "published")
                .query_param("sort", "-date_created")
                .query_param("fields", POST_FIELDS);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"data": [
                    {"id": "1", "slug": "newer", "title": "Newer", "status": "published",
                     "tags": [{"tags_id": {"id": "t", "name": "T", "slug": "t"}}]},
                    {"id": "2", "slug": "older", "title": "Older", "status": "published",
                     "category": {"id": "c", "name": "C"}}
                ]}));
        });

        let posts: Vec<Post> = client(&server)
            .list_published_posts()
            .await
            .expect("list")
            .collect();

        mock.assert();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].slug, "newer");
        assert_eq!(posts[0].tags.len(), 1);
        assert_eq!(posts[1].category, None);
    }

    #[tokio::test]
    async fn each_list_call_queries_again() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET").path("/items/posts");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"data": []}));
        });

        let client = client(&server);
        assert_eq!(client.list_published_posts().await.expect("first").count(), 0);
        assert_eq!(client.list_published_posts().await.expect("second").count(), 0);
        mock.assert_calls(2);
    }

    #[tokio::test]
    async fn missing_slug_returns_none() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET")
                .path("/items/posts")
                .query_param("filter[slug][_eq]", "missing")
                .query_param("filter[status][_eq]", "published")
                .query_param("limit", "1");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"data": []}));
        });

        let found = client(&server)
            .find_published_by_slug("missing")
            .await
            .expect("lookup");
        mock.assert();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn slug_lookup_normalizes_the_record() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET")
                .path("/items/posts")
                .query_param("filter[slug][_eq]", "hello");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"data": [
                    {"id": 5, "slug": "hello", "title": "Hello", "status": "published",
                     "reading_time": "12"}
                ]}));
        });

        let post = client(&server)
            .find_published_by_slug("hello")
            .await
            .expect("lookup")
            .expect("post");
        assert_eq!(post.id, "5");
        assert_eq!(post.reading_time, Some(12));
    }

    #[tokio::test]
    async fn page_query_sends_window_and_category() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET")
                .path("/items/posts")
                .query_param("filter[category][slug][_eq]", "rust")
                .query_param("limit", "12")
                .query_param("offset", "12")
                .query_param("meta", "filter_count");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "data": [{"id": "1", "slug": "a", "status": "published"}],
                    "meta": {"filter_count": 13}
                }));
        });

        let page = client(&server)
            .list_published_page(&PostPageQuery {
                category: Some("rust".into()),
                limit: 12,
                offset: 12,
            })
            .await
            .expect("page");
        mock.assert();
        assert_eq!(page.total, 13);
        assert_eq!(page.posts.len(), 1);
    }

    #[tokio::test]
    async fn server_errors_surface_as_upstream() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/items/posts");
            then.status(503).body("maintenance");
        });

        let err = client(&server)
            .list_published_posts()
            .await
            .expect_err("503 should fail");
        assert!(matches!(err, RepoError::Upstream { status: 503, .. }));
    }

    #[tokio::test]
    async fn garbage_bodies_surface_as_decode_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/items/posts");
            then.status(200).body("<html>");
        });

        let err = client(&server)
            .find_published_by_slug("x")
            .await
            .expect_err("html should fail");
        assert!(matches!(err, RepoError::Decode(_)));
    }
}
