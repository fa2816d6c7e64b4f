use std::fmt;

use regex::Regex;

use crate::{is_falsy, Filters, ListingEntry, PreviewMode, PreviewVariant, SortMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Title,
    Flair,
    Link,
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FilterField::Title => "title",
            FilterField::Flair => "flair",
            FilterField::Link => "link",
        })
    }
}

/// The rule that rejected an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    TemplateFilter { evaluated: String },
    NotMatched(FilterField),
    Excluded(FilterField),
    LowScore { score: i64, min_score: i64 },
    NoPreview,
    NotMedia,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::TemplateFilter { evaluated } => {
                write!(f, "template filter evaluated to {evaluated:?}")
            }
            DropReason::NotMatched(field) => write!(f, "{field} does not match regex"),
            DropReason::Excluded(field) => write!(f, "{field} skipped by regex"),
            DropReason::LowScore { score, min_score } => {
                write!(f, "score {score} below minimum {min_score}")
            }
            DropReason::NoPreview => write!(f, "no preview found"),
            DropReason::NotMedia => write!(f, "not a media link"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Drop(DropReason),
    /// Drop, and no later entry of this listing can pass either.
    Stop(DropReason),
}

/// Run the selection rules in order; the first rule that rejects wins.
pub fn evaluate_filters(entry: &ListingEntry, filters: &Filters, sort: SortMode) -> Verdict {
    if let Some(template) = &filters.skip_template {
        let evaluated = template.render(|field| entry.template_field(field, None));
        if is_falsy(&evaluated) {
            return Verdict::Drop(DropReason::TemplateFilter { evaluated });
        }
    }

    let fields: [(FilterField, &str, Option<&Regex>, Option<&Regex>); 3] = [
        (
            FilterField::Title,
            entry.title.as_str(),
            filters.title_contains.as_ref(),
            filters.title_not_contains.as_ref(),
        ),
        (
            FilterField::Flair,
            entry.flair_text(),
            filters.flair_contains.as_ref(),
            filters.flair_not_contains.as_ref(),
        ),
        (
            FilterField::Link,
            entry.url.as_str(),
            filters.link_contains.as_ref(),
            filters.link_not_contains.as_ref(),
        ),
    ];

    for &(field, text, contains, _) in &fields {
        if !chosen(contains, text) {
            return Verdict::Drop(DropReason::NotMatched(field));
        }
    }
    for &(field, text, _, not_contains) in &fields {
        if excluded(not_contains, text) {
            return Verdict::Drop(DropReason::Excluded(field));
        }
    }

    if entry.score < filters.min_score {
        let reason = DropReason::LowScore {
            score: entry.score,
            min_score: filters.min_score,
        };
        // Top listings are ordered by score.
        if sort.is_top() {
            return Verdict::Stop(reason);
        }
        return Verdict::Drop(reason);
    }

    Verdict::Keep
}

fn chosen(re: Option<&Regex>, text: &str) -> bool {
    re.map_or(true, |re| re.is_match(text))
}

fn excluded(re: Option<&Regex>, text: &str) -> bool {
    re.is_some_and(|re| re.is_match(text))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewChoice<'a> {
    /// Keep the posted link.
    Original,
    Preview(&'a PreviewVariant),
    Missing,
}

/// Pick the preview variant to download instead of the posted link.
pub fn select_preview(
    entry: &ListingEntry,
    mode: PreviewMode,
    width: Option<u32>,
) -> PreviewChoice<'_> {
    if mode == PreviewMode::Off {
        return PreviewChoice::Original;
    }
    let picked = entry.preview_images.first().and_then(|image| match width {
        None => Some(&image.source),
        Some(width) => image.resolutions.iter().find(|variant| variant.width == width),
    });
    match (picked, mode) {
        (Some(variant), _) => PreviewChoice::Preview(variant),
        (None, PreviewMode::Only) => PreviewChoice::Missing,
        (None, _) => PreviewChoice::Original,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PreviewImage, TimeWindow};

    fn entry(title: &str, flair: Option<&str>, score: i64) -> ListingEntry {
        ListingEntry {
            url: "https://i.redd.it/x.jpg".into(),
            name: "t3_x".into(),
            title: title.into(),
            score,
            subreddit: "pics".into(),
            author: "a".into(),
            flair: flair.map(Into::into),
            preview_images: Vec::new(),
            raw: serde_json::json!({"over_18": false, "title": title}),
        }
    }

    fn variant(width: u32) -> PreviewVariant {
        PreviewVariant {
            url: format!("https://preview.redd.it/x.jpg?width={width}"),
            width,
            height: width / 2,
        }
    }

    #[test]
    fn positive_filter_rejects_before_negative() {
        let filters = Filters {
            title_contains: Some(Regex::new("cat").unwrap()),
            flair_not_contains: Some(Regex::new("NSFW").unwrap()),
            ..Filters::default()
        };
        let verdict = evaluate_filters(&entry("dog", Some("NSFW"), 10), &filters, SortMode::Hot);
        assert_eq!(verdict, Verdict::Drop(DropReason::NotMatched(FilterField::Title)));
    }

    #[test]
    fn missing_flair_matches_as_empty_text() {
        let filters = Filters {
            flair_contains: Some(Regex::new("^OC$").unwrap()),
            ..Filters::default()
        };
        let verdict = evaluate_filters(&entry("t", None, 1), &filters, SortMode::Hot);
        assert_eq!(verdict, Verdict::Drop(DropReason::NotMatched(FilterField::Flair)));
    }

    #[test]
    fn negative_filter_drops_matching_link() {
        let filters = Filters {
            link_not_contains: Some(Regex::new("redd\\.it").unwrap()),
            ..Filters::default()
        };
        let verdict = evaluate_filters(&entry("t", None, 1), &filters, SortMode::Hot);
        assert_eq!(verdict, Verdict::Drop(DropReason::Excluded(FilterField::Link)));
    }

    #[test]
    fn template_filter_runs_first() {
        let filters = Filters {
            skip_template: Some("{{over_18}}".parse().unwrap()),
            title_contains: Some(Regex::new("never").unwrap()),
            ..Filters::default()
        };
        let verdict = evaluate_filters(&entry("t", None, 1), &filters, SortMode::Hot);
        assert_eq!(
            verdict,
            Verdict::Drop(DropReason::TemplateFilter { evaluated: "false".into() })
        );
    }

    #[test]
    fn low_score_stops_only_under_top_sort() {
        let filters = Filters {
            min_score: 100,
            ..Filters::default()
        };
        let low = entry("t", None, 5);
        assert!(matches!(
            evaluate_filters(&low, &filters, SortMode::New),
            Verdict::Drop(DropReason::LowScore { .. })
        ));
        assert!(matches!(
            evaluate_filters(&low, &filters, SortMode::Top(TimeWindow::Day)),
            Verdict::Stop(DropReason::LowScore { .. })
        ));
        assert_eq!(
            evaluate_filters(&entry("t", None, 100), &filters, SortMode::New),
            Verdict::Keep
        );
    }

    #[test]
    fn preview_selection_by_width_or_source() {
        let mut with_preview = entry("t", None, 1);
        with_preview.preview_images = vec![PreviewImage {
            source: variant(1920),
            resolutions: vec![variant(320), variant(640)],
        }];

        assert_eq!(
            select_preview(&with_preview, PreviewMode::Only, Some(640)),
            PreviewChoice::Preview(&variant(640))
        );
        assert_eq!(
            select_preview(&with_preview, PreviewMode::Prefer, None),
            PreviewChoice::Preview(&variant(1920))
        );
        assert_eq!(
            select_preview(&with_preview, PreviewMode::Only, Some(1080)),
            PreviewChoice::Missing
        );
        assert_eq!(
            select_preview(&with_preview, PreviewMode::Prefer, Some(1080)),
            PreviewChoice::Original
        );
        assert_eq!(
            select_preview(&entry("t", None, 1), PreviewMode::Off, None),
            PreviewChoice::Original
        );
    }
}
