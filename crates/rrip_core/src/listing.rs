use url::Url;

use crate::{RunConfig, SortMode};

/// Builds listing page URLs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    endpoint: Url,
}

impl ListingRequest {
    pub fn new(base: &str, config: &RunConfig) -> Result<Self, url::ParseError> {
        let path = config.path.trim_matches('/');
        let mut sort = config.sort;
        // The bare front page has no `best` listing.
        if path.is_empty() && config.search.is_none() && sort == SortMode::Best {
            sort = SortMode::Hot;
        }

        let mut segments: Vec<&str> = Vec::new();
        if !path.is_empty() {
            segments.push(path);
        }
        match &config.search {
            Some(_) => segments.push("search"),
            None => segments.extend(sort.api_name()),
        }

        let base = base.trim_end_matches('/');
        let mut endpoint = Url::parse(&format!("{base}/{}.json", segments.join("/")))?;
        {
            let mut query = endpoint.query_pairs_mut();
            if config.search.is_some() {
                if let Some(name) = sort.api_name() {
                    query.append_pair("sort", name);
                }
            }
            query.append_pair("limit", &config.page_size.to_string());
            if let Some(window) = sort.time_window() {
                query.append_pair("t", window.as_str());
            }
            if let Some(term) = &config.search {
                query.append_pair("q", term);
                query.append_pair("restrict_sr", "true");
            }
        }
        Ok(Self { endpoint })
    }

    /// URL of the page following `after`; the first page has no cursor.
    pub fn page_url(&self, after: Option<&str>) -> Url {
        let mut url = self.endpoint.clone();
        if let Some(after) = after {
            url.query_pairs_mut().append_pair("after", after);
        }
        url
    }
}
