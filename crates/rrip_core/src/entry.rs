use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

const FULLNAME_PREFIX: &str = "t3_";

#[derive(Debug, Error)]
pub enum ListingDecodeError {
    #[error("listing response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("listing response has no data.children array")]
    MissingChildren,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PreviewVariant {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PreviewImage {
    pub source: PreviewVariant,
    #[serde(default)]
    pub resolutions: Vec<PreviewVariant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Preview {
    #[serde(default)]
    images: Vec<PreviewImage>,
}

/// One post record of a listing page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListingEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    /// Stable identifier, `t3_`-prefixed.
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subreddit: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, rename = "link_flair_text")]
    pub flair: Option<String>,
    #[serde(default, rename = "preview", deserialize_with = "preview_images")]
    pub preview_images: Vec<PreviewImage>,
    /// The record as received, for templates and raw output.
    #[serde(skip)]
    pub raw: Value,
}

impl ListingEntry {
    /// Identifier without the `t3_` prefix, as used in filenames.
    pub fn short_id(&self) -> &str {
        short_id(&self.name)
    }

    pub fn flair_text(&self) -> &str {
        self.flair.as_deref().unwrap_or("")
    }

    /// Value of a named template field for this entry.
    ///
    /// Named fields come first; anything else is looked up among the raw
    /// record's top-level keys.
    pub fn template_field(&self, field: &str, final_url: Option<&str>) -> Option<String> {
        let value = match field {
            "final_url" => final_url.unwrap_or(&self.url).to_string(),
            "posted_url" => self.url.clone(),
            "subreddit" => self.subreddit.clone(),
            "id" => self.short_id().to_string(),
            "author" => self.author.clone(),
            "score" => self.score.to_string(),
            "title" => self.title.clone(),
            "quoted_title" => format!("{:?}", self.title),
            other => return self.raw.get(other).map(render_value),
        };
        Some(value)
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn short_id(name: &str) -> &str {
    name.strip_prefix(FULLNAME_PREFIX).unwrap_or(name)
}

/// Ensure a user supplied cursor carries the `t3_` prefix.
pub fn fullname(id: &str) -> String {
    if id.starts_with(FULLNAME_PREFIX) {
        id.to_string()
    } else {
        format!("{FULLNAME_PREFIX}{id}")
    }
}

/// Decode one listing page into its entries, in listing order.
pub fn decode_listing(bytes: &[u8]) -> Result<Vec<ListingEntry>, ListingDecodeError> {
    let mut response: Value = serde_json::from_slice(bytes)?;
    let children = response
        .pointer_mut("/data/children")
        .and_then(Value::as_array_mut)
        .map(std::mem::take)
        .ok_or(ListingDecodeError::MissingChildren)?;

    children
        .into_iter()
        .map(|mut child| {
            let raw = child.get_mut("data").map(Value::take).unwrap_or(Value::Null);
            let mut entry = ListingEntry::deserialize(&raw)?;
            entry.raw = raw;
            Ok(entry)
        })
        .collect()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn preview_images<'de, D>(deserializer: D) -> Result<Vec<PreviewImage>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Preview>::deserialize(deserializer)?
        .map(|preview| preview.images)
        .unwrap_or_default())
}
