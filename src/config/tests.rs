use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_describe_a_local_deployment() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:3000");
    assert_eq!(settings.cms.url.as_str(), "http://localhost:8055/");
    assert_eq!(settings.cms.public_url, settings.cms.url);
    assert_eq!(settings.cms.request_timeout, None);
    assert_eq!(settings.site.blog_page_size.get(), 12);
    assert_eq!(settings.site.home_recent_posts.get(), 6);
    assert_eq!(settings.site.brand_title, "Re:hive Space");
    assert_eq!(settings.site.footer_copy, "© Re:hive Space. All rights reserved.");
}

#[test]
fn cms_urls_gain_a_trailing_slash() {
    let mut raw = RawSettings::default();
    raw.cms.url = Some("http://directus:8055/api".to_string());
    raw.cms.public_url = Some(" https://cms.example.com ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cms.url.as_str(), "http://directus:8055/api/");
    assert_eq!(settings.cms.public_url.as_str(), "https://cms.example.com/");
}

#[test]
fn blank_public_url_falls_back_to_api_url() {
    let mut raw = RawSettings::default();
    raw.cms.url = Some("http://directus:8055".to_string());
    raw.cms.public_url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cms.public_url.as_str(), "http://directus:8055/");
}

#[test]
fn invalid_cms_url_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cms.url = Some("not a url".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid url");
    assert!(matches!(err, LoadError::Invalid { key: "cms.url", .. }));
}

#[test]
fn zero_timeout_is_rejected() {
    let mut raw = RawSettings::default();
    raw.apply_serve_overrides(&ServeOverrides {
        cms_request_timeout_seconds: Some(0),
        ..Default::default()
    });

    let err = Settings::from_raw(raw).expect_err("zero timeout");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cms.request_timeout_seconds",
            ..
        }
    ));
}

#[test]
fn timeout_override_is_applied() {
    let mut raw = RawSettings::default();
    raw.apply_serve_overrides(&ServeOverrides {
        cms_request_timeout_seconds: Some(15),
        ..Default::default()
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cms.request_timeout, Some(Duration::from_secs(15)));
}

#[test]
fn zero_page_size_is_rejected() {
    let mut raw = RawSettings::default();
    raw.site.blog_page_size = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero page size");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "site.blog_page_size",
            ..
        }
    ));
}

#[test]
fn footer_follows_custom_brand() {
    let mut raw = RawSettings::default();
    raw.site.brand_title = Some("Field Notes".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.site.footer_copy, "© Field Notes. All rights reserved.");
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn unknown_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());

    let err = Settings::from_raw(raw).expect_err("bad level");
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));
}

#[test]
fn ipv6_hosts_are_accepted() {
    let mut raw = RawSettings::default();
    raw.server.host = Some("[::1]".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.server.addr.is_ipv6());
}

#[test]
fn cli_flags_parse_into_overrides() {
    let cli = CliArgs::parse_from([
        "rehive",
        "--server-port",
        "4000",
        "--log-json",
        "yes",
        "--cms-public-url",
        "https://cms.example.com",
    ]);

    assert_eq!(cli.overrides.server_port, Some(4000));
    assert_eq!(cli.overrides.log_json, Some(true));
    assert_eq!(
        cli.overrides.cms_public_url.as_deref(),
        Some("https://cms.example.com")
    );
}
