//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::NonZeroU32,
    path::PathBuf,
    time::Duration,
};

use clap::{Args, Parser, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "rehive";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
pub(crate) const DEFAULT_CMS_URL: &str = "http://localhost:8055";
const DEFAULT_BRAND_TITLE: &str = "Re:hive Space";
const DEFAULT_HERO_TITLE: &str = "Welcome to Re:hive Space";
const DEFAULT_HERO_SUBTITLE: &str = "A modern tech blog built with Rust and Directus";
const DEFAULT_DESCRIPTION: &str = "Thoughtful perspectives on technology, development, and innovation";
const DEFAULT_BLOG_PAGE_SIZE: u32 = 12;
const DEFAULT_HOME_RECENT_POSTS: u32 = 6;

/// Command-line arguments for the Re:hive binary.
#[derive(Debug, Parser)]
#[command(name = "rehive", version, about = "Re:hive Space blog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "REHIVE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the Directus URL used for server-side queries.
    #[arg(long = "cms-url", env = "DIRECTUS_URL", value_name = "URL")]
    pub cms_url: Option<String>,

    /// Override the Directus URL embedded in asset links served to browsers.
    #[arg(long = "cms-public-url", value_name = "URL")]
    pub cms_public_url: Option<String>,

    /// Abort CMS requests that take longer than this many seconds.
    #[arg(long = "cms-request-timeout-seconds", value_name = "SECONDS")]
    pub cms_request_timeout_seconds: Option<u64>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub cms: CmsSettings,
    pub site: SiteSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CmsSettings {
    /// Origin for server-side API calls; always ends with `/`.
    pub url: Url,
    /// Origin browsers use to load assets; defaults to `url`.
    pub public_url: Url,
    /// `None` means requests wait indefinitely.
    pub request_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub brand_title: String,
    pub hero_title: String,
    pub hero_subtitle: String,
    pub description: String,
    pub footer_copy: String,
    pub blog_page_size: NonZeroU32,
    pub home_recent_posts: NonZeroU32,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            brand_title: DEFAULT_BRAND_TITLE.to_string(),
            hero_title: DEFAULT_HERO_TITLE.to_string(),
            hero_subtitle: DEFAULT_HERO_SUBTITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            footer_copy: default_footer_copy(DEFAULT_BRAND_TITLE),
            blog_page_size: NonZeroU32::new(DEFAULT_BLOG_PAGE_SIZE).unwrap_or(NonZeroU32::MIN),
            home_recent_posts: NonZeroU32::new(DEFAULT_HOME_RECENT_POSTS)
                .unwrap_or(NonZeroU32::MIN),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Parse the process arguments and load settings for them.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("REHIVE").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_serve_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    cms: RawCmsSettings,
    site: RawSiteSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.cms_url.as_ref() {
            self.cms.url = Some(url.clone());
        }
        if let Some(url) = overrides.cms_public_url.as_ref() {
            self.cms.public_url = Some(url.clone());
        }
        if let Some(seconds) = overrides.cms_request_timeout_seconds {
            self.cms.request_timeout_seconds = Some(seconds);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            cms,
            site,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let cms = build_cms_settings(cms)?;
        let site = build_site_settings(site)?;

        Ok(Self {
            server,
            logging,
            cms,
            site,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => level.parse::<LevelFilter>().map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cms_settings(cms: RawCmsSettings) -> Result<CmsSettings, LoadError> {
    let url = parse_base_url(cms.url.as_deref().unwrap_or(DEFAULT_CMS_URL))
        .map_err(|reason| LoadError::invalid("cms.url", reason))?;

    let public_url = match cms.public_url.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => {
            parse_base_url(value).map_err(|reason| LoadError::invalid("cms.public_url", reason))?
        }
        _ => url.clone(),
    };

    let request_timeout = match cms.request_timeout_seconds {
        Some(0) => {
            return Err(LoadError::invalid(
                "cms.request_timeout_seconds",
                "must be greater than zero when set",
            ));
        }
        Some(seconds) => Some(Duration::from_secs(seconds)),
        None => None,
    };

    Ok(CmsSettings {
        url,
        public_url,
        request_timeout,
    })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let defaults = SiteSettings::default();

    let brand_title = non_blank(site.brand_title).unwrap_or(defaults.brand_title);
    let footer_copy = non_blank(site.footer_copy).unwrap_or_else(|| default_footer_copy(&brand_title));

    let blog_page_size = non_zero_u32(
        site.blog_page_size.unwrap_or(DEFAULT_BLOG_PAGE_SIZE),
        "site.blog_page_size",
    )?;
    let home_recent_posts = non_zero_u32(
        site.home_recent_posts.unwrap_or(DEFAULT_HOME_RECENT_POSTS),
        "site.home_recent_posts",
    )?;

    Ok(SiteSettings {
        brand_title,
        hero_title: non_blank(site.hero_title).unwrap_or(defaults.hero_title),
        hero_subtitle: non_blank(site.hero_subtitle).unwrap_or(defaults.hero_subtitle),
        description: non_blank(site.description).unwrap_or(defaults.description),
        footer_copy,
        blog_page_size,
        home_recent_posts,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCmsSettings {
    url: Option<String>,
    public_url: Option<String>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    brand_title: Option<String>,
    hero_title: Option<String>,
    hero_subtitle: Option<String>,
    description: Option<String>,
    footer_copy: Option<String>,
    blog_page_size: Option<u32>,
    home_recent_posts: Option<u32>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_base_url(value: &str) -> Result<Url, String> {
    let mut url = Url::parse(value.trim()).map_err(|err| format!("failed to parse `{value}`: {err}"))?;
    if url.cannot_be_a_base() {
        return Err(format!("`{value}` cannot be used as a base URL"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn non_zero_u32(value: u32, key: &'static str) -> Result<NonZeroU32, LoadError> {
    NonZeroU32::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn default_footer_copy(brand: &str) -> String {
    format!("© {brand}. All rights reserved.")
}

#[cfg(test)]
mod tests;
