//! Pages whose copy lives with the site rather than in the CMS.

use crate::config::SiteSettings;
use crate::presentation::views::{ActionLink, PageSectionView, PageView, SearchView};

const SEARCH_UNAVAILABLE: &str = "Search is not available yet. Browse the blog in the meantime.";

#[derive(Clone)]
pub struct PageService {
    brand: String,
}

impl PageService {
    pub fn new(site: &SiteSettings) -> Self {
        Self {
            brand: site.brand_title.clone(),
        }
    }

    pub fn about(&self) -> PageView {
        PageView {
            title: format!("About {}", self.brand),
            lead: "A modern platform for sharing technology insights, tutorials, and industry knowledge.".to_string(),
            sections: vec![
                PageSectionView {
                    heading: "Our Mission".to_string(),
                    paragraphs: vec![
                        format!(
                            "{} is dedicated to creating a collaborative environment where developers, engineers, and technology enthusiasts can share knowledge, learn from each other, and stay updated with the latest trends in the tech world.",
                            self.brand
                        ),
                        "We believe that knowledge grows when shared, and our platform aims to be a catalyst for learning and innovation in the technology community.".to_string(),
                    ],
                    items: Vec::new(),
                },
                PageSectionView {
                    heading: "What We Cover".to_string(),
                    paragraphs: Vec::new(),
                    items: [
                        "Web Development & Modern Frameworks",
                        "Cloud Technologies & DevOps",
                        "Software Architecture & Best Practices",
                        "Emerging Technologies & Trends",
                        "Developer Tools & Productivity",
                    ]
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                },
                PageSectionView {
                    heading: "Built With".to_string(),
                    paragraphs: vec![
                        "Posts are written in Directus and served by a small Rust web server.".to_string(),
                    ],
                    items: Vec::new(),
                },
            ],
            primary_action: Some(ActionLink {
                href: "/contact".to_string(),
                label: "Contact Us".to_string(),
            }),
        }
    }

    pub fn contact(&self) -> PageView {
        PageView {
            title: "Contact Us".to_string(),
            lead: "Have questions or want to get in touch? We'd love to hear from you.".to_string(),
            sections: vec![PageSectionView {
                heading: "Get In Touch".to_string(),
                paragraphs: vec![
                    "Questions, suggestions, and offers to contribute are all welcome.".to_string(),
                ],
                items: Vec::new(),
            }],
            primary_action: Some(ActionLink {
                href: "/blog".to_string(),
                label: "Read the blog".to_string(),
            }),
        }
    }

    /// Echoes the query back; no lookup is performed.
    pub fn search(&self, query: Option<&str>) -> SearchView {
        let query = query.map(str::trim).unwrap_or_default().to_string();
        SearchView {
            has_query: !query.is_empty(),
            query,
            notice: SEARCH_UNAVAILABLE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PageService {
        PageService::new(&SiteSettings::default())
    }

    #[test]
    fn about_mentions_the_brand() {
        let about = service().about();
        assert_eq!(about.title, "About Re:hive Space");
        assert!(about.sections[0].paragraphs[0].starts_with("Re:hive Space is dedicated"));
    }

    #[test]
    fn search_echoes_trimmed_query() {
        let view = service().search(Some("  rust async "));
        assert!(view.has_query);
        assert_eq!(view.query, "rust async");

        let empty = service().search(Some("   "));
        assert!(!empty.has_query);
        assert!(service().search(None).query.is_empty());
    }
}
