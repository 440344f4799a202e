use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use rehive_api_types::{ItemId, ItemsEnvelope, LoginRequest, LoginResponse};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

const POSTS_PATH: &str = "items/posts";
const JSON: &str = "application/json";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Unable to read seed file at {path}: {source}")]
    ReadSeed {
        path: String,
        source: std::io::Error,
    },
    #[error("Unable to read seed file at {path}: {source}")]
    ParseSeed {
        path: String,
        source: serde_json::Error,
    },
    #[error("admin password is required (use --admin-password or ADMIN_PASSWORD)")]
    MissingPassword,
    #[error("invalid Directus URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to authenticate ({status}): {body}")]
    Auth { status: u16, body: String },
    #[error("Directus auth response missing access_token")]
    MissingToken,
    #[error("Request to {url} failed ({status}): {body}")]
    Request {
        url: String,
        status: u16,
        body: String,
    },
    #[error("failed to parse response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },
    #[error("existing post `{slug}` has no id")]
    MissingId { slug: String },
}

/// Unauthenticated handle on a Directus instance.
#[derive(Clone, Debug)]
pub struct DirectusClient {
    http: Client,
    base: Url,
}

impl DirectusClient {
    pub fn new(base_url: &str) -> Result<Self, SeedError> {
        let mut base = Url::parse(base_url.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self { http, base })
    }

    pub fn user_agent() -> &'static str {
        concat!("rehive-seed/", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self, path: &str) -> Result<Url, SeedError> {
        self.base.join(path).map_err(SeedError::Url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
    }

    /// Exchanges admin credentials for an access token.
    pub async fn login(self, email: &str, password: &str) -> Result<Session, SeedError> {
        let url = self.url("auth/login")?;
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let resp = self.request(Method::POST, url).json(&body).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(SeedError::Auth {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        // An unparsable success body is treated like one without a token.
        let token = serde_json::from_slice::<LoginResponse>(&bytes)
            .ok()
            .and_then(|login| login.access_token().map(str::to_string))
            .ok_or(SeedError::MissingToken)?;

        Ok(Session {
            client: self,
            token,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ExistingPost {
    #[serde(default)]
    id: ItemId,
}

/// Authenticated client; every request carries the bearer token.
#[derive(Clone, Debug)]
pub struct Session {
    client: DirectusClient,
    token: String,
}

impl Session {
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url).bearer_auth(&self.token)
    }

    /// Returns the id of the post stored under `slug`, if any.
    pub async fn find_post_id(&self, slug: &str) -> Result<Option<ItemId>, SeedError> {
        let mut url = self.client.url(POSTS_PATH)?;
        url.query_pairs_mut()
            .append_pair("filter[slug][_eq]", slug)
            .append_pair("limit", "1");

        let resp = self.request(Method::GET, url.clone()).send().await?;
        let envelope: ItemsEnvelope<Vec<ExistingPost>> = handle(&url, resp).await?;

        match envelope.data.into_iter().next() {
            Some(existing) if existing.id.is_empty() => Err(SeedError::MissingId {
                slug: slug.to_string(),
            }),
            Some(existing) => Ok(Some(existing.id)),
            None => Ok(None),
        }
    }

    pub async fn create_post(&self, payload: &Map<String, Value>) -> Result<(), SeedError> {
        let url = self.client.url(POSTS_PATH)?;
        let resp = self
            .request(Method::POST, url.clone())
            .json(payload)
            .send()
            .await?;
        handle_unit(&url, resp).await
    }

    pub async fn update_post(
        &self,
        id: &ItemId,
        payload: &Map<String, Value>,
    ) -> Result<(), SeedError> {
        let mut url = self.client.url(POSTS_PATH)?;
        url.path_segments_mut()
            .map_err(|()| SeedError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(id.as_str());

        let resp = self
            .request(Method::PATCH, url.clone())
            .json(payload)
            .send()
            .await?;
        handle_unit(&url, resp).await
    }
}

async fn handle<T: DeserializeOwned>(url: &Url, resp: Response) -> Result<T, SeedError> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    if !status.is_success() {
        return Err(request_error(url, status.as_u16(), &bytes));
    }
    serde_json::from_slice(&bytes).map_err(|source| SeedError::Decode {
        url: url.to_string(),
        source,
    })
}

async fn handle_unit(url: &Url, resp: Response) -> Result<(), SeedError> {
    let status = resp.status();
    if !status.is_success() {
        let bytes = resp.bytes().await?;
        return Err(request_error(url, status.as_u16(), &bytes));
    }
    Ok(())
}

fn request_error(url: &Url, status: u16, body: &[u8]) -> SeedError {
    SeedError::Request {
        url: url.to_string(),
        status,
        body: String::from_utf8_lossy(body).into_owned(),
    }
}
