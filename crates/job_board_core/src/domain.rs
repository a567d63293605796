//! crates/job_board_core/src/domain.rs
//!
//! Defines the core data structures of the client: job records as they come
//! off the feed, persisted bookmark entries and the color scheme.
//! Only the fields the core inspects are typed; everything else the upstream
//! feed sends is kept in an opaque payload so records survive a round trip
//! through storage unchanged.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::identity::IDENTITY_FIELDS;

//=========================================================================================
// Job Records
//=========================================================================================

/// One job posting. `identity` is assigned once by the identity resolver and
/// is written back under the primary `id` key when the record is serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    #[serde(rename = "id", default)]
    pub identity: String,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub fees: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub openings: Option<u32>,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub expires_on: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<AdditionalInfo>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub company_details: Option<CompanyDetails>,
    #[serde(default, deserialize_with = "lenient")]
    pub media: Media,
    /// Upstream fields the core never inspects.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobRecord {
    /// Builds a record from a raw feed object and an already resolved identity.
    ///
    /// Never fails: the legacy identity keys are stripped so the record carries
    /// exactly one identity. A mistyped field degrades on its own (text fields
    /// accept numbers, counters accept numeric strings, anything else reads as
    /// absent) while the rest of the record keeps its values.
    pub fn from_raw(raw: Value, identity: String) -> Self {
        let mut object = match raw {
            Value::Object(object) => object,
            _ => Map::new(),
        };
        for key in IDENTITY_FIELDS {
            object.shift_remove(*key);
        }

        match serde_json::from_value::<JobRecord>(Value::Object(object.clone())) {
            Ok(mut record) => {
                record.identity = identity;
                record
            }
            Err(e) => {
                warn!(%identity, error = %e, "job record has unexpected field types, keeping it opaque");
                Self::opaque(identity, object)
            }
        }
    }

    /// A record carrying only its identity and an untyped payload.
    pub fn opaque(identity: String, extra: Map<String, Value>) -> Self {
        Self {
            identity,
            title: None,
            company: None,
            location: None,
            salary: None,
            description: None,
            phone: None,
            job_type: None,
            experience: None,
            requirements: None,
            fees: None,
            openings: None,
            created_on: None,
            expires_on: None,
            additional_info: None,
            company_details: None,
            media: Media::default(),
            extra,
        }
    }

    pub fn is_premium(&self) -> bool {
        self.additional_info.as_ref().is_some_and(|info| info.is_premium)
    }

    pub fn views(&self) -> u64 {
        self.additional_info.as_ref().map_or(0, |info| info.views)
    }

    pub fn applications(&self) -> u64 {
        self.additional_info.as_ref().map_or(0, |info| info.applications)
    }

    /// Direct shares plus Facebook shares.
    pub fn total_shares(&self) -> u64 {
        self.additional_info
            .as_ref()
            .map_or(0, |info| info.shares.saturating_add(info.fb_shares))
    }

    pub fn tags(&self) -> &[Tag] {
        self.additional_info
            .as_ref()
            .map(|info| info.tags.as_slice())
            .unwrap_or_default()
    }

    pub fn cover_image(&self) -> Option<&MediaImage> {
        self.media.images.first()
    }

    /// The preferred call window, e.g. `"10:00 AM - 6:00 PM"`.
    pub fn call_window(&self) -> Option<String> {
        let details = self.company_details.as_ref()?;
        let start = details.call_start_time.as_deref()?;
        let end = details.call_end_time.as_deref().unwrap_or_default();
        Some(format!("{} - {}", start, end))
    }

    /// The label of the call button; `None` when the posting has no phone.
    pub fn contact_label(&self) -> Option<String> {
        let phone = self.phone.as_deref()?;
        let custom = self
            .company_details
            .as_ref()
            .and_then(|details| details.button_text.clone());
        Some(custom.unwrap_or_else(|| format!("Call: {}", phone)))
    }

    pub fn whatsapp_link(&self) -> Option<&str> {
        self.company_details.as_ref()?.whatsapp_link.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub tags: Vec<Tag>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_premium: bool,
    #[serde(default, deserialize_with = "lenient_count")]
    pub views: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub shares: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub fb_shares: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub applications: u64,
    /// Free-form "name/value" info blocks shown under additional information.
    #[serde(rename = "contentV3", default, deserialize_with = "lenient", skip_serializing_if = "Map::is_empty")]
    pub content: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AdditionalInfo {
    /// The `contentV3` blocks as `(name, value)` pairs, skipping blocks without a name.
    pub fn info_entries(&self) -> Vec<(String, String)> {
        self.content
            .values()
            .filter_map(|block| {
                let name = block.get("name")?.as_str()?.to_string();
                let value = match block.get("value") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                };
                Some((name, value))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDetails {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub whatsapp_link: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub button_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub call_start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub call_end_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Media {
    #[serde(default, deserialize_with = "lenient")]
    pub images: Vec<MediaImage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaImage {
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

//=========================================================================================
// Bookmarks
//=========================================================================================

/// A job record persisted because the user bookmarked it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkEntry {
    pub record: JobRecord,
    pub bookmarked_at: DateTime<Utc>,
}

impl BookmarkEntry {
    pub fn new(record: JobRecord) -> Self {
        Self {
            record,
            bookmarked_at: Utc::now(),
        }
    }
}

//=========================================================================================
// Color Scheme
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl ColorScheme {
    pub fn toggled(self) -> Self {
        match self {
            ColorScheme::Light => ColorScheme::Dark,
            ColorScheme::Dark => ColorScheme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorScheme::Light => "light",
            ColorScheme::Dark => "dark",
        }
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a color scheme, expected 'light' or 'dark'")]
pub struct UnknownScheme(pub String);

impl FromStr for ColorScheme {
    type Err = UnknownScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ColorScheme::Light),
            "dark" => Ok(ColorScheme::Dark),
            _ => Err(UnknownScheme(s.to_string())),
        }
    }
}

/// The colors every screen paints with for one scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub primary: &'static str,
    pub background: &'static str,
    pub card: &'static str,
    pub text: &'static str,
    pub border: &'static str,
    pub notification: &'static str,
    pub secondary_text: &'static str,
    pub tab_bar: &'static str,
    pub tab_bar_active: &'static str,
    pub tab_bar_inactive: &'static str,
}

pub const LIGHT_PALETTE: Palette = Palette {
    primary: "#007AFF",
    background: "#FFFFFF",
    card: "#F2F2F7",
    text: "#000000",
    border: "#C6C6C8",
    notification: "#FF3B30",
    secondary_text: "#8E8E93",
    tab_bar: "#F2F2F7",
    tab_bar_active: "#007AFF",
    tab_bar_inactive: "#8E8E93",
};

pub const DARK_PALETTE: Palette = Palette {
    primary: "#0A84FF",
    background: "#000000",
    card: "#1C1C1E",
    text: "#FFFFFF",
    border: "#38383A",
    notification: "#FF453A",
    secondary_text: "#8E8E93",
    tab_bar: "#1C1C1E",
    tab_bar_active: "#0A84FF",
    tab_bar_inactive: "#8E8E93",
};

impl Palette {
    pub fn for_scheme(scheme: ColorScheme) -> Self {
        match scheme {
            ColorScheme::Light => LIGHT_PALETTE,
            ColorScheme::Dark => DARK_PALETTE,
        }
    }
}

//=========================================================================================
// Lenient Field Decoding
//=========================================================================================

/// Any value that does not decode as `T` (including `null`) becomes `T::default()`.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Strings as they are, numbers and booleans in their JSON text form.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Numbers, or strings holding one; anything else is `None`.
fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().parse().ok(),
        other => serde_json::from_value(other).ok(),
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?.unwrap_or_default())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_timestamp))
}

/// Accepts RFC 3339 strings, bare dates and epoch milliseconds; anything else is `None`.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            }),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}
