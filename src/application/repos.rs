//! Repository traits describing content adapters.

use async_trait::async_trait;
use rehive_api_types::RawPost;
use thiserror::Error;

use crate::domain::normalize::normalize_post;
use crate::domain::posts::Post;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("content service unreachable: {0}")]
    Unavailable(String),
    #[error("content service responded with status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("content service returned an undecodable body: {0}")]
    Decode(String),
    #[error("invalid content request: {0}")]
    InvalidRequest(String),
}

impl RepoError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

/// One page of the published listing, optionally narrowed to a category slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPageQuery {
    pub category: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: u64,
}

/// Result set of a single published-posts query.
///
/// Records are normalised as they are pulled, and anything that is not
/// published is skipped. The set is consumed once; a fresh query is needed
/// to see it again.
#[derive(Debug)]
pub struct PublishedPosts {
    raw: std::vec::IntoIter<RawPost>,
}

impl PublishedPosts {
    pub fn from_raw(raw: Vec<RawPost>) -> Self {
        Self {
            raw: raw.into_iter(),
        }
    }
}

impl Iterator for PublishedPosts {
    type Item = Post;

    fn next(&mut self) -> Option<Post> {
        self.raw.by_ref().map(normalize_post).find(Post::is_published)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.raw.size_hint().1)
    }
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// All published posts, newest first.
    async fn list_published_posts(&self) -> Result<PublishedPosts, RepoError>;

    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Newest-first page of published posts together with the matching total.
    async fn list_published_page(&self, query: &PostPageQuery) -> Result<PostPage, RepoError>;
}
