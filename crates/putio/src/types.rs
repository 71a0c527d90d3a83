//! API response types for put.io.
//!
//! The API returns `null` for many fields that are normally present, so most
//! fields decode through [`nullable`] into their default value.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// Decodes `null` as `T::default()`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Timestamps are sent as naive UTC, e.g. `2013-09-07T21:32:03`.
pub(crate) mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub(crate) fn parse(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim_end_matches('Z');
        NaiveDateTime::parse_from_str(s, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => parse(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}"))),
        }
    }

    pub(crate) fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(t) => serializer.serialize_str(&t.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }
}

/// A put.io file or folder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub size: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub content_type: String,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp")]
    pub first_accessed_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent_id: i64,
    #[serde(default)]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub opensubtitles_hash: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub is_mp4_available: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub icon: String,
    #[serde(default)]
    pub crc32: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub is_shared: bool,
}

impl File {
    /// Returns `true` if the entry is a folder.
    pub fn is_dir(&self) -> bool {
        self.content_type == "application/x-directory"
    }
}

/// Result of a multipart upload.
///
/// Torrent files are turned into transfers by the server, in which case
/// `transfer` is set instead of `file`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Upload {
    #[serde(default)]
    pub file: Option<File>,
    #[serde(default)]
    pub transfer: Option<Transfer>,
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Search {
    #[serde(default, deserialize_with = "nullable")]
    pub files: Vec<File>,
    /// URL of the next page, empty on the last one.
    #[serde(default, deserialize_with = "nullable")]
    pub next: String,
}

/// A torrent/URL transfer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default)]
    pub availability: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub callback_url: String,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "nullable")]
    pub created_torrent: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub client_ip: String,
    #[serde(default, deserialize_with = "nullable")]
    pub current_ratio: f64,
    #[serde(default, rename = "down_speed", deserialize_with = "nullable")]
    pub download_speed: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub downloaded: i64,
    #[serde(default)]
    pub download_id: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub estimated_time: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub extract: bool,
    #[serde(default)]
    pub file_id: Option<i64>,
    #[serde(default, with = "timestamp")]
    pub finished_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "nullable")]
    pub is_private: bool,
    #[serde(default, rename = "magneturi", deserialize_with = "nullable")]
    pub magnet_uri: String,
    #[serde(default, deserialize_with = "nullable")]
    pub peers_connected: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub peers_getting_from_us: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub peers_sending_to_us: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub percent_done: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub save_parent_id: i64,
    #[serde(default)]
    pub seconds_seeding: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub size: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub source: String,
    #[serde(default, deserialize_with = "nullable")]
    pub status: String,
    #[serde(default, deserialize_with = "nullable")]
    pub status_message: String,
    #[serde(default)]
    pub subscription_id: Option<i64>,
    #[serde(default)]
    pub torrent_link: Option<String>,
    #[serde(default)]
    pub tracker_message: Option<String>,
    #[serde(default, rename = "tracker")]
    pub trackers: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "nullable")]
    pub kind: String,
    #[serde(default, rename = "up_speed", deserialize_with = "nullable")]
    pub upload_speed: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub uploaded: i64,
}

/// Disk usage in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    #[serde(default)]
    pub avail: i64,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub used: i64,
}

/// Account information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub account_active: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub avatar_url: String,
    #[serde(default)]
    pub days_until_files_deletion: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub default_subtitle_language: String,
    #[serde(default, deserialize_with = "nullable")]
    pub disk: Disk,
    #[serde(default, deserialize_with = "nullable")]
    pub has_voucher: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub mail: String,
    #[serde(default, deserialize_with = "nullable")]
    pub passive_account: bool,
    #[serde(default, with = "timestamp")]
    pub plan_expiration_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "nullable")]
    pub settings: Settings,
    #[serde(default, deserialize_with = "nullable")]
    pub simultaneous_download_limit: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub subtitle_languages: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub user_id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub username: String,
}

/// Personal account settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub default_download_folder: i64,
    #[serde(default)]
    pub default_subtitle_language: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub download_folder_unset: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub is_invisible: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub nextepisode: bool,
    #[serde(default)]
    pub private_download_host_ip: Option<serde_json::Value>,
    #[serde(default)]
    pub pushover_token: Option<String>,
    #[serde(default)]
    pub routing: Option<String>,
    #[serde(default)]
    pub sorting: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub ssl_enabled: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub start_from: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub subtitle_languages: Vec<String>,
}

/// Partial settings update. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_download_folder: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_invisible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle_languages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_subtitle_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nextepisode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_from: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorting: Option<String>,
}

/// A put.io friend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Friend {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub avatar_url: String,
}

/// A zip archive being prepared for download.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Zip {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "nullable")]
    pub size: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub status: String,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    /// Files that could not be added to the archive.
    #[serde(default, deserialize_with = "nullable")]
    pub missing_files: Vec<File>,
}

/// An available subtitle for a video file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subtitle {
    #[serde(default, deserialize_with = "nullable")]
    pub key: String,
    #[serde(default, deserialize_with = "nullable")]
    pub language: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub source: String,
}

/// A dashboard event: a finished transfer or a file shared by a friend.
///
/// The events endpoint returns different shapes per event type, so every
/// field besides `id` is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default)]
    pub file_id: Option<i64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub transfer_name: Option<String>,
    #[serde(default)]
    pub transfer_size: Option<i64>,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<NaiveDateTime>,
}

/// A file shared with friends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Share {
    #[serde(default, deserialize_with = "nullable")]
    pub file_id: i64,
    #[serde(default, rename = "file_name", deserialize_with = "nullable")]
    pub filename: String,
    /// Number of friends the file is shared with.
    #[serde(default, deserialize_with = "nullable")]
    pub shared_with: i64,
}

/// A user a file is shared with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedWith {
    #[serde(default, deserialize_with = "nullable")]
    pub share_id: i64,
    #[serde(default, rename = "user_name", deserialize_with = "nullable")]
    pub username: String,
    #[serde(default, deserialize_with = "nullable")]
    pub user_avatar_url: String,
}
