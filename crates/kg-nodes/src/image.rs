//! Responsive image helpers shared by image-bearing cards.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::render::RenderOptions;

static LOCAL_IMAGE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(/.*|__GHOST_URL__)/?content/images/").expect("invalid local image regex")
});
static CONTENT_IMAGE_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(.*/content/images)/(.*)").expect("invalid content image regex")
});

/// Width and height of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u64,
    pub height: u64,
}

impl Dimensions {
    pub fn new(width: u64, height: u64) -> Self {
        Self { width, height }
    }

    /// Both dimensions when both are known and non-zero.
    pub fn from_options(width: Option<u64>, height: Option<u64>) -> Option<Self> {
        match (width, height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => Some(Self { width, height }),
            _ => None,
        }
    }

    /// Scale to `width`, keeping the aspect ratio.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn resize_to_width(self, width: u64) -> Self {
        let ratio = self.width as f64 / self.height as f64;
        Self {
            width,
            height: round(width as f64 / ratio),
        }
    }

    /// Scale to `height`, keeping the aspect ratio.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn resize_to_height(self, height: u64) -> Self {
        let ratio = self.width as f64 / self.height as f64;
        Self {
            width: round(height as f64 * ratio),
            height,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round(value: f64) -> u64 {
    value.round().max(0.0) as u64
}

/// Responsive widths usable for an image `width` pixels wide.
///
/// Every configured width up to the image width, plus the image width
/// itself when it lies between the largest usable size and the largest
/// configured size.
pub fn available_image_widths(width: u64, sizes: &[u32]) -> Vec<u64> {
    let mut widths: Vec<u64> = sizes.iter().map(|w| u64::from(*w)).collect();
    widths.sort_unstable();

    let mut available: Vec<u64> = widths.iter().copied().filter(|w| *w <= width).collect();
    if let (Some(&largest_usable), Some(&largest)) = (available.last(), widths.last())
        && width > largest_usable
        && width < largest
    {
        available.push(width);
    }
    available
}

/// Whether `url` points at the site's own content images.
pub fn is_local_content_image(url: &str, site_url: &str) -> bool {
    let site = site_url.strip_suffix('/').unwrap_or(site_url);
    let path = if site.is_empty() {
        url.to_owned()
    } else {
        url.replacen(site, "", 1)
    };
    LOCAL_IMAGE_PATH.is_match(&path)
}

pub fn is_unsplash_image(url: &str) -> bool {
    url.contains("images.unsplash.com")
}

/// Path of a resized copy of a local content image.
pub fn sized_image_url(src: &str, width: u64) -> Option<String> {
    let caps = CONTENT_IMAGE_PARTS.captures(src)?;
    Some(format!("{}/size/w{width}/{}", &caps[1], &caps[2]))
}

/// The `srcset` for an image, when one applies.
pub fn srcset(src: &str, width: Option<u64>, options: &RenderOptions) -> Option<String> {
    let optimization = options.image_optimization.as_ref()?;
    let width = width.filter(|w| *w > 0)?;
    if !optimization.srcsets || optimization.content_image_sizes.is_empty() {
        return None;
    }

    let local = is_local_content_image(src, &options.site_url);
    if local && options.can_transform_image(src) == Some(false) {
        return None;
    }

    let widths = available_image_widths(width, &optimization.content_image_sizes);

    if local {
        let entries: Vec<String> = widths
            .iter()
            .filter_map(|w| {
                if *w == width {
                    Some(format!("{src} {w}w"))
                } else {
                    sized_image_url(src, *w).map(|sized| format!("{sized} {w}w"))
                }
            })
            .collect();
        if !entries.is_empty() {
            return Some(entries.join(", "));
        }
    }

    if is_unsplash_image(src) {
        let mut url = Url::parse(src).ok()?;
        let entries: Vec<String> = widths
            .iter()
            .map(|w| {
                set_query_param(&mut url, "w", &w.to_string());
                format!("{url} {w}w")
            })
            .collect();
        return Some(entries.join(", "));
    }

    None
}

/// Set one query parameter, keeping the others in place.
pub(crate) fn set_query_param(url: &mut Url, name: &str, value: &str) {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    match pairs.iter_mut().find(|(k, _)| k == name) {
        Some(pair) => value.clone_into(&mut pair.1),
        None => pairs.push((name.to_owned(), value.to_owned())),
    }
    url.query_pairs_mut().clear().extend_pairs(pairs);
}

/// The `sizes` attribute for a card image with a srcset.
pub(crate) fn sizes_attribute(width: u64, card_width: &str) -> Option<&'static str> {
    if width < 720 {
        return None;
    }
    match card_width {
        "wide" if width >= 1200 => Some("(min-width: 1200px) 1200px"),
        "" | "regular" => Some("(min-width: 720px) 720px"),
        _ => None,
    }
}

/// A higher-resolution source for email clients on dense screens.
///
/// Picks the first available width of at least 1200 pixels for local
/// images the image service can resize.
pub(crate) fn retina_src(src: &str, width: u64, options: &RenderOptions) -> Option<String> {
    if !is_local_content_image(src, &options.site_url) || !options.transforms_image(src) {
        return None;
    }
    let sizes = options
        .image_optimization
        .as_ref()
        .map(|o| o.content_image_sizes.as_slice())
        .unwrap_or_default();
    let retina = available_image_widths(width, sizes)
        .into_iter()
        .find(|w| *w >= 1200)?;
    if retina == width {
        return None;
    }
    sized_image_url(src, retina)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ImageOptimization;
    use pretty_assertions::assert_eq;

    const SIZES: &[u32] = &[600, 1000, 1600, 2400];

    fn options() -> RenderOptions {
        RenderOptions::default()
            .with_site_url("https://site.test/")
            .with_image_optimization(ImageOptimization::default())
    }

    #[test]
    fn test_available_widths_include_intrinsic() {
        assert_eq!(available_image_widths(1200, SIZES), vec![600, 1000, 1200]);
    }

    #[test]
    fn test_available_widths_exact_and_bounds() {
        assert_eq!(available_image_widths(1000, SIZES), vec![600, 1000]);
        assert_eq!(available_image_widths(3000, SIZES), vec![600, 1000, 1600, 2400]);
        assert_eq!(available_image_widths(500, SIZES), Vec::<u64>::new());
    }

    #[test]
    fn test_local_content_image() {
        assert!(is_local_content_image("/content/images/a.jpg", ""));
        assert!(is_local_content_image("__GHOST_URL__/content/images/a.jpg", ""));
        assert!(is_local_content_image(
            "https://site.test/content/images/2024/a.jpg",
            "https://site.test/"
        ));
        assert!(is_local_content_image(
            "https://site.test/blog/content/images/a.jpg",
            "https://site.test"
        ));
        assert!(!is_local_content_image("https://other.test/content/images/a.jpg", "https://site.test/"));
    }

    #[test]
    fn test_local_srcset() {
        let srcset = srcset("https://site.test/content/images/2024/a.jpg", Some(1200), &options());
        assert_eq!(
            srcset.as_deref(),
            Some(
                "https://site.test/content/images/size/w600/2024/a.jpg 600w, https://site.test/content/images/size/w1000/2024/a.jpg 1000w, https://site.test/content/images/2024/a.jpg 1200w"
            )
        );
    }

    #[test]
    fn test_srcset_respects_transform_check() {
        let options = options().with_can_transform_image(|_| false);
        assert_eq!(srcset("/content/images/a.jpg", Some(1200), &options), None);
    }

    #[test]
    fn test_srcset_requires_width_and_setting() {
        assert_eq!(srcset("/content/images/a.jpg", None, &options()), None);
        let mut disabled = ImageOptimization::default();
        disabled.srcsets = false;
        let options = options().with_image_optimization(disabled);
        assert_eq!(srcset("/content/images/a.jpg", Some(1200), &options), None);
        assert_eq!(srcset("/content/images/a.jpg", Some(1200), &RenderOptions::default()), None);
    }

    #[test]
    fn test_unsplash_srcset() {
        let srcset = srcset(
            "https://images.unsplash.com/photo-1?ixlib=rb-1.2.1&w=2000",
            Some(1000),
            &options(),
        );
        assert_eq!(
            srcset.as_deref(),
            Some(
                "https://images.unsplash.com/photo-1?ixlib=rb-1.2.1&w=600 600w, https://images.unsplash.com/photo-1?ixlib=rb-1.2.1&w=1000 1000w"
            )
        );
    }

    #[test]
    fn test_external_image_has_no_srcset() {
        assert_eq!(srcset("https://cdn.test/a.jpg", Some(1200), &options()), None);
    }

    #[test]
    fn test_resize() {
        let dims = Dimensions::new(3000, 2000);
        assert_eq!(dims.resize_to_width(600), Dimensions::new(600, 400));
        assert_eq!(dims.resize_to_height(100), Dimensions::new(150, 100));
        assert_eq!(Dimensions::new(1000, 333).resize_to_width(600), Dimensions::new(600, 200));
    }

    #[test]
    fn test_sizes_attribute() {
        assert_eq!(sizes_attribute(700, "regular"), None);
        assert_eq!(sizes_attribute(800, "regular"), Some("(min-width: 720px) 720px"));
        assert_eq!(sizes_attribute(1000, "wide"), None);
        assert_eq!(sizes_attribute(1300, "wide"), Some("(min-width: 1200px) 1200px"));
        assert_eq!(sizes_attribute(1300, "full"), None);
    }

    #[test]
    fn test_retina_src() {
        let transforming = options().with_can_transform_image(|_| true);
        assert_eq!(
            retina_src("/content/images/a.jpg", 2000, &transforming).as_deref(),
            Some("/content/images/size/w1600/a.jpg")
        );
        assert_eq!(retina_src("/content/images/a.jpg", 1200, &transforming), None);
        assert_eq!(retina_src("/content/images/a.jpg", 2000, &options()), None);
    }
}
