//! URLs for images served by the CMS asset endpoint.
//!
//! Nothing here fetches or resizes images; the CMS does that when the browser
//! requests the URL.

use metrics::counter;
use rehive_api_types::ImageRef;
use tracing::warn;
use url::Url;

/// Optional transformation parameters understood by `/assets/<id>`.
/// Zero dimensions count as unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetTransform {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u32>,
}

impl AssetTransform {
    pub const ORIGINAL: Self = Self {
        width: None,
        height: None,
        quality: None,
    };

    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            quality: None,
        }
    }

    pub fn with_quality(self, quality: u32) -> Self {
        Self {
            quality: Some(quality),
            ..self
        }
    }

    fn query_pairs(self) -> Vec<(&'static str, String)> {
        let width = self.width.filter(|value| *value > 0);
        let height = self.height.filter(|value| *value > 0);
        let quality = self.quality.filter(|value| *value > 0);

        let mut pairs = Vec::with_capacity(4);
        if let Some(width) = width {
            pairs.push(("width", width.to_string()));
        }
        if let Some(height) = height {
            pairs.push(("height", height.to_string()));
        }
        if let Some(quality) = quality {
            pairs.push(("quality", quality.to_string()));
        }
        if width.is_some() || height.is_some() {
            pairs.push(("fit", "cover".to_string()));
        }
        pairs
    }
}

/// First non-empty identifier of the reference. File objects are checked in
/// the order `id`, `filename_disk`, `filename`, `key`, `uuid`.
pub fn resolve_asset_id(reference: &ImageRef) -> Option<&str> {
    match reference {
        ImageRef::Id(id) => Some(id.as_str()).filter(|id| !id.is_empty()),
        ImageRef::File(file) => [
            &file.id,
            &file.filename_disk,
            &file.filename,
            &file.key,
            &file.uuid,
        ]
        .into_iter()
        .filter_map(Option::as_deref)
        .find(|candidate| !candidate.is_empty()),
    }
}

#[derive(Debug, Clone)]
pub struct AssetUrlBuilder {
    base: Url,
}

impl AssetUrlBuilder {
    /// `base` is the CMS origin as seen by browsers.
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// `<base>/assets/<id>` plus transformation parameters, or `None` when the
    /// reference carries no usable identifier.
    pub fn build(&self, reference: Option<&ImageRef>, transform: AssetTransform) -> Option<String> {
        let Some(id) = reference.and_then(resolve_asset_id) else {
            counter!("rehive_asset_unresolved_total").increment(1);
            warn!(
                target: "rehive::assets",
                reference = ?reference,
                "no valid asset id found"
            );
            return None;
        };

        let mut url = self.base.clone();
        {
            let Ok(mut segments) = url.path_segments_mut() else {
                warn!(
                    target: "rehive::assets",
                    base = %self.base,
                    "asset base url cannot carry a path"
                );
                return None;
            };
            segments.pop_if_empty().push("assets").push(id);
        }

        let pairs = transform.query_pairs();
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in &pairs {
                query.append_pair(key, value);
            }
        }

        Some(url.into())
    }
}

#[cfg(test)]
mod tests {
    use rehive_api_types::ImageFile;

    use super::*;

    fn builder() -> AssetUrlBuilder {
        AssetUrlBuilder::new(Url::parse("http://localhost:8055").expect("url"))
    }

    fn file() -> ImageFile {
        ImageFile::default()
    }

    #[test]
    fn bare_identifier_builds_plain_url() {
        let url = builder().build(Some(&ImageRef::Id("abc".into())), AssetTransform::ORIGINAL);
        assert_eq!(url.as_deref(), Some("http://localhost:8055/assets/abc"));
    }

    #[test]
    fn missing_identifiers_yield_none() {
        let builder = builder();
        assert_eq!(builder.build(None, AssetTransform::ORIGINAL), None);
        assert_eq!(
            builder.build(Some(&ImageRef::Id(String::new())), AssetTransform::ORIGINAL),
            None
        );
        assert_eq!(
            builder.build(Some(&ImageRef::File(file())), AssetTransform::sized(10, 10)),
            None
        );
        let empty_fields = ImageFile {
            id: Some(String::new()),
            filename: Some(String::new()),
            ..file()
        };
        assert_eq!(
            builder.build(Some(&ImageRef::File(empty_fields)), AssetTransform::ORIGINAL),
            None
        );
    }

    #[test]
    fn identifier_priority_is_fixed() {
        let all = ImageFile {
            id: Some("by-id".into()),
            filename_disk: Some("by-disk".into()),
            filename: Some("by-name".into()),
            key: Some("by-key".into()),
            uuid: Some("by-uuid".into()),
        };
        assert_eq!(resolve_asset_id(&ImageRef::File(all.clone())), Some("by-id"));

        let no_id = ImageFile { id: None, ..all.clone() };
        assert_eq!(resolve_asset_id(&ImageRef::File(no_id.clone())), Some("by-disk"));

        let no_disk = ImageFile {
            filename_disk: Some(String::new()),
            ..no_id
        };
        assert_eq!(resolve_asset_id(&ImageRef::File(no_disk.clone())), Some("by-name"));

        let no_name = ImageFile {
            filename: None,
            ..no_disk
        };
        assert_eq!(resolve_asset_id(&ImageRef::File(no_name.clone())), Some("by-key"));

        let only_uuid = ImageFile { key: None, ..no_name };
        assert_eq!(resolve_asset_id(&ImageRef::File(only_uuid)), Some("by-uuid"));
    }

    #[test]
    fn fit_cover_follows_dimensions() {
        let builder = builder();
        let reference = ImageRef::Id("img".into());

        let sized = builder.build(Some(&reference), AssetTransform::sized(800, 450).with_quality(80));
        assert_eq!(
            sized.as_deref(),
            Some("http://localhost:8055/assets/img?width=800&height=450&quality=80&fit=cover")
        );

        let width_only = AssetTransform {
            width: Some(320),
            ..AssetTransform::ORIGINAL
        };
        assert_eq!(
            builder.build(Some(&reference), width_only).as_deref(),
            Some("http://localhost:8055/assets/img?width=320&fit=cover")
        );

        let quality_only = AssetTransform::ORIGINAL.with_quality(60);
        assert_eq!(
            builder.build(Some(&reference), quality_only).as_deref(),
            Some("http://localhost:8055/assets/img?quality=60")
        );

        let zero = AssetTransform::sized(0, 0);
        assert_eq!(
            builder.build(Some(&reference), zero).as_deref(),
            Some("http://localhost:8055/assets/img")
        );
    }

    #[test]
    fn base_path_is_preserved() {
        let builder =
            AssetUrlBuilder::new(Url::parse("https://cms.example.com/directus/").expect("url"));
        assert_eq!(
            builder
                .build(Some(&ImageRef::Id("k".into())), AssetTransform::ORIGINAL)
                .as_deref(),
            Some("https://cms.example.com/directus/assets/k")
        );
    }
}
