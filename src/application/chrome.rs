use crate::config::SiteSettings;
use crate::presentation::views::{
    BrandView, FooterView, LayoutChrome, NavigationLinkView, NavigationView, PageMetaView,
};

const NAVIGATION: &[(&str, &str)] = &[
    ("Home", "/"),
    ("Blog", "/blog"),
    ("About", "/about"),
    ("Contact", "/contact"),
    ("Search", "/search"),
];

/// Layout chrome shared by every public page. Built from site settings only,
/// so loading it cannot fail.
#[derive(Clone)]
pub struct ChromeService {
    site: SiteSettings,
}

impl ChromeService {
    pub fn new(site: SiteSettings) -> Self {
        Self { site }
    }

    pub fn load(&self, current_path: &str) -> LayoutChrome {
        let entries = NAVIGATION
            .iter()
            .map(|(label, href)| NavigationLinkView {
                label: (*label).to_string(),
                href: (*href).to_string(),
                is_active: is_active(href, current_path),
            })
            .collect();

        LayoutChrome {
            brand: BrandView {
                title: self.site.brand_title.clone(),
                href: "/".to_string(),
            },
            navigation: NavigationView { entries },
            footer: FooterView {
                copy: self.site.footer_copy.clone(),
                description: self.site.description.clone(),
            },
            meta: PageMetaView {
                title: self.site.brand_title.clone(),
                description: self.site.description.clone(),
                og_image: None,
            },
        }
    }
}

/// `/` matches only itself; other entries also match their sub-paths.
fn is_active(href: &str, current_path: &str) -> bool {
    if href == "/" {
        return current_path == "/";
    }
    current_path == href
        || current_path
            .strip_prefix(href)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_labels(chrome: &LayoutChrome) -> Vec<&str> {
        chrome
            .navigation
            .entries
            .iter()
            .filter(|entry| entry.is_active)
            .map(|entry| entry.label.as_str())
            .collect()
    }

    #[test]
    fn navigation_lists_every_section_in_order() {
        let chrome = ChromeService::new(SiteSettings::default()).load("/");
        let hrefs: Vec<&str> = chrome
            .navigation
            .entries
            .iter()
            .map(|entry| entry.href.as_str())
            .collect();
        assert_eq!(hrefs, ["/", "/blog", "/about", "/contact", "/search"]);
    }

    #[test]
    fn active_entry_follows_path() {
        let service = ChromeService::new(SiteSettings::default());
        assert_eq!(active_labels(&service.load("/")), ["Home"]);
        assert_eq!(active_labels(&service.load("/blog")), ["Blog"]);
        assert_eq!(active_labels(&service.load("/blog/hello-world")), ["Blog"]);
        assert!(active_labels(&service.load("/blogroll")).is_empty());
        assert!(active_labels(&service.load("/missing")).is_empty());
    }

    #[test]
    fn titles_carry_the_brand_suffix() {
        let chrome = ChromeService::new(SiteSettings::default()).load("/about");
        assert_eq!(chrome.meta.title, "Re:hive Space");
        let titled = chrome.with_title("About");
        assert_eq!(titled.meta.title, "About - Re:hive Space");
    }
}
