use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use super::model::{Post, PostMedia, Timestamp};

const SECONDS_CUTOFF: f64 = 1_000_000_000_000.0;

const TWITTER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";
const NAIVE_DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn resolve_timestamp(value: &Timestamp) -> Option<f64> {
    match value {
        Timestamp::Number(number) => scale_epoch(*number),
        Timestamp::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            match text.parse::<f64>() {
                Ok(number) => scale_epoch(number),
                Err(_) => parse_date(text),
            }
        }
    }
}

fn scale_epoch(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    Some(if value < SECONDS_CUTOFF {
        value * 1000.0
    } else {
        value
    })
}

fn parse_date(text: &str) -> Option<f64> {
    let parsed = DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .or_else(|_| DateTime::parse_from_str(text, TWITTER_DATE_FORMAT));
    if let Ok(date) = parsed {
        return Some(date.timestamp_millis() as f64);
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(date) = NaiveDateTime::parse_from_str(text, format) {
            return Some(date.and_utc().timestamp_millis() as f64);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc().timestamp_millis() as f64)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(super) enum RawPostType {
    Text,
    Image,
    Video,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawPost {
    #[serde(default, deserialize_with = "null_as_default")]
    pub(super) id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) user_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) user_avatar: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub(super) post_type: Option<RawPostType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) video_thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) timestamp: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) retweeted_tweet: Option<Box<RawPost>>,
}

impl From<RawPost> for Post {
    fn from(raw: RawPost) -> Self {
        let media = match raw.post_type {
            None | Some(RawPostType::Text | RawPostType::Unknown) => PostMedia::Text,
            Some(RawPostType::Image) => PostMedia::Image { url: raw.media_url },
            Some(RawPostType::Video) => PostMedia::Video {
                url: raw.media_url,
                thumbnail: raw.video_thumbnail,
            },
        };

        Post {
            id: raw.id,
            source: raw.source,
            user_name: raw.user_name,
            user_handle: raw.user_handle,
            user_avatar: raw.user_avatar,
            content: raw.content,
            media,
            timestamp: raw.timestamp,
            retweeted: raw.retweeted_tweet.map(|retweet| Box::new(Post::from(*retweet))),
        }
    }
}

impl From<Post> for RawPost {
    fn from(post: Post) -> Self {
        let (post_type, media_url, video_thumbnail) = match post.media {
            PostMedia::Text => (RawPostType::Text, None, None),
            PostMedia::Image { url } => (RawPostType::Image, url, None),
            PostMedia::Video { url, thumbnail } => (RawPostType::Video, url, thumbnail),
        };

        RawPost {
            id: post.id,
            source: post.source,
            user_name: post.user_name,
            user_handle: post.user_handle,
            user_avatar: post.user_avatar,
            post_type: Some(post_type),
            content: post.content,
            media_url,
            video_thumbnail,
            timestamp: post.timestamp,
            retweeted_tweet: post.retweeted.map(|retweet| Box::new(RawPost::from(*retweet))),
        }
    }
}
