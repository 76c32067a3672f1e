use crate::timestamp::Token;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One instrumented plotting call, as written by a capture session.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureRecord {
    pub token: Token,
    pub function_name: String,
    pub file_name: String,
    pub source: String,
    /// Rendered image written next to the code, if the surface had content.
    pub image: Option<PathBuf>,
    pub title: String,
    pub author: Option<String>,
    pub notes: Option<String>,
}

impl CaptureRecord {
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.token.datetime()
    }
}

/// The structured header of an entry's `index.md`.
///
/// Every field is optional on disk; [`crate::store::fs::FileStore`] fills in
/// title and date from the directory name when they are missing. Keys this
/// struct does not know are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryMeta {
    #[serde(default)]
    pub title: String,

    #[serde(
        default,
        with = "date_format",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        default,
        deserialize_with = "tag_list::deserialize",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,

    /// Image file name, relative to the entry directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_image: Option<String>,

    /// Source file name, relative to the entry directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,

    /// File the captured function lives in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Detail page template, without the `.html` suffix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_generated: bool,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl EntryMeta {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A loaded entry of a site collection.
#[derive(Debug, Clone)]
pub struct CollectionEntry {
    pub collection: String,
    /// Entry directory name, unique within its collection.
    pub slug: String,
    pub dir: PathBuf,
    pub meta: EntryMeta,
    /// Markdown body following the header.
    pub body: String,
    /// Effective creation instant used for ordering.
    pub date: DateTime<Utc>,
}

impl CollectionEntry {
    pub fn title(&self) -> &str {
        &self.meta.title
    }

    pub fn is_auto_generated(&self) -> bool {
        self.meta.auto_generated
    }

    /// Path of this entry's page relative to the site output root.
    pub fn url(&self) -> String {
        format!("{}/{}/", self.collection, self.slug)
    }
}

/// Display metadata of a collection, from `_index.md`, the site config or
/// derived from the collection name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionMeta {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(
        default,
        deserialize_with = "tag_list::deserialize",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,

    #[serde(
        default,
        with = "date_format",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Serializes dates as RFC 3339 UTC with milliseconds and reads any shape
/// [`stencil::parse_date`] understands.
pub(crate) mod date_format {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn to_string(date: &DateTime<Utc>) -> String {
        date.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&to_string(date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = serde_yaml::Value::deserialize(deserializer)?;
        let text = match raw {
            serde_yaml::Value::Null => return Ok(None),
            serde_yaml::Value::String(s) => s,
            other => {
                return Err(D::Error::custom(format!(
                    "expected a date string, found {:?}",
                    other
                )))
            }
        };
        stencil::parse_date(text.trim())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("unrecognized date {:?}", text)))
    }
}

/// Accepts tags as a YAML list or a comma-separated string. Duplicates are
/// dropped, first occurrence wins.
mod tag_list {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let raw = serde_yaml::Value::deserialize(deserializer)?;
        let items: Vec<String> = match raw {
            serde_yaml::Value::Null => Vec::new(),
            serde_yaml::Value::String(s) => s.split(',').map(|t| t.trim().to_string()).collect(),
            serde_yaml::Value::Sequence(seq) => seq
                .into_iter()
                .map(|v| match v {
                    serde_yaml::Value::String(s) => Ok(s),
                    serde_yaml::Value::Number(n) => Ok(n.to_string()),
                    serde_yaml::Value::Bool(b) => Ok(b.to_string()),
                    other => Err(D::Error::custom(format!("invalid tag {:?}", other))),
                })
                .collect::<Result<_, _>>()?,
            other => return Err(D::Error::custom(format!("invalid tags {:?}", other))),
        };

        let mut tags: Vec<String> = Vec::with_capacity(items.len());
        for tag in items {
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entry_meta_minimal_header() {
        let meta: EntryMeta = serde_yaml::from_str("title: Sine Wave\n").unwrap();
        assert_eq!(meta.title, "Sine Wave");
        assert!(meta.date.is_none());
        assert!(meta.tags.is_empty());
        assert!(!meta.auto_generated);
    }

    #[test]
    fn test_entry_meta_accepts_naive_and_plain_dates() {
        let meta: EntryMeta =
            serde_yaml::from_str("date: 2025-07-17T15:27:01.767000\n").unwrap();
        assert_eq!(
            meta.date.unwrap().timestamp_millis(),
            Utc.with_ymd_and_hms(2025, 7, 17, 15, 27, 1).unwrap().timestamp_millis() + 767
        );

        let meta: EntryMeta = serde_yaml::from_str("date: 2025-07-17\n").unwrap();
        assert_eq!(
            meta.date,
            Some(Utc.with_ymd_and_hms(2025, 7, 17, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_entry_meta_rejects_bad_date() {
        assert!(serde_yaml::from_str::<EntryMeta>("date: yesterday\n").is_err());
    }

    #[test]
    fn test_tags_from_string_or_list() {
        let meta: EntryMeta = serde_yaml::from_str("tags: [a, b, a]\n").unwrap();
        assert_eq!(meta.tags, vec!["a", "b"]);

        let meta: EntryMeta = serde_yaml::from_str("tags: 'ml, physics'\n").unwrap();
        assert_eq!(meta.tags, vec!["ml", "physics"]);
        assert!(meta.has_tag("physics"));
    }

    #[test]
    fn test_unknown_keys_survive_roundtrip() {
        let meta: EntryMeta = serde_yaml::from_str("title: T\nexperiment: 42\n").unwrap();
        assert_eq!(
            meta.extra.get("experiment"),
            Some(&serde_yaml::Value::Number(42.into()))
        );
        let yaml = serde_yaml::to_string(&meta).unwrap();
        assert!(yaml.contains("experiment: 42"));
    }

    #[test]
    fn test_date_written_with_millis() {
        let mut meta = EntryMeta::new("T");
        meta.date = Some(Utc.with_ymd_and_hms(2024, 12, 1, 14, 30, 22).unwrap());
        let yaml = serde_yaml::to_string(&meta).unwrap();
        assert!(yaml.contains("2024-12-01T14:30:22.000Z"));
    }
}
