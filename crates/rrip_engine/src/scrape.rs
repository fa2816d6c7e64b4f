use rrip_core::ScrapeMode;
use scraper::{Html, Selector};

/// Find the `og:` media link a page advertises in its head.
///
/// `Any` takes whichever of `og:video` / `og:image` comes first.
pub fn find_og_media(html: &str, mode: ScrapeMode) -> Option<String> {
    let wanted: &[&str] = match mode {
        ScrapeMode::Off => return None,
        ScrapeMode::Image => &["og:image"],
        ScrapeMode::Video => &["og:video"],
        ScrapeMode::Any => &["og:video", "og:image"],
    };

    let doc = Html::parse_document(html);
    let selector = Selector::parse("head meta[property]").ok()?;
    doc.select(&selector)
        .filter(|meta| {
            meta.value()
                .attr("property")
                .is_some_and(|property| wanted.contains(&property))
        })
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}
