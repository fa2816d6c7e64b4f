use url::Url;

/// Path suffixes accepted as direct media links.
pub const MEDIA_EXTENSIONS: &[&str] = &[".jpeg", ".gif", ".mp4", ".jpg", ".png"];

const GIFV_HOSTS: &[&str] = &["i.imgur.com", "imgur.com"];
const GIFV_TARGET_HOST: &str = "i.imgur.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLink {
    pub url: String,
    pub extension: &'static str,
}

/// A classified entry ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub url: String,
    pub extension: &'static str,
    pub filename: String,
}

/// Resolve a link without touching the network.
///
/// Returns `None` when the link is not recognisably media (or not a URL);
/// callers may then try scraping the page it points to.
pub fn resolve_static(link: &str) -> Option<MediaLink> {
    let mut url = Url::parse(link).ok()?;

    let is_gifv_host = url.host_str().is_some_and(|host| GIFV_HOSTS.contains(&host));
    if is_gifv_host {
        if let Some(stem) = url.path().strip_suffix(".gifv").map(str::to_owned) {
            url.set_host(Some(GIFV_TARGET_HOST)).ok()?;
            url.set_path(&format!("{stem}.mp4"));
            return Some(MediaLink {
                url: url.into(),
                extension: ".mp4",
            });
        }
    }

    MEDIA_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| url.path().ends_with(ext))
        .map(|ext| MediaLink {
            url: link.to_string(),
            extension: ext,
        })
}
