use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Content fields recognized inside a post's `content` JSON blob. Keys are
/// camelCase because the blob is stored exactly as clients send it.
pub const CONTENT_FIELDS: &[&str] = &[
    "text",
    "hashtags",
    "imageUrl",
    "videoUrl",
    "carouselImages",
    "coverUrl",
    "generationStatus",
    "generationProgress",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Post,
    Carousel,
    Reel,
    Story,
    Video,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Post => "post",
            PostType::Carousel => "carousel",
            PostType::Reel => "reel",
            PostType::Story => "story",
            PostType::Video => "video",
        }
    }
}

/// Shallow merge of a partial content object on top of the stored blob.
/// Only recognized fields supplied by the caller are written; everything
/// else in the stored blob stays untouched. The blob is never replaced
/// wholesale so generation progress written by other flows survives edits.
pub fn merge_content(existing: &Value, update: &Value) -> Value {
    let mut merged = match existing {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    if let Value::Object(update) = update {
        for field in CONTENT_FIELDS {
            if let Some(value) = update.get(*field) {
                merged.insert((*field).to_string(), value.clone());
            }
        }
    }

    Value::Object(merged)
}

/// A non-empty `carouselImages` array forces the carousel type regardless of
/// what the caller asked for.
pub fn classify_post_type(content: &Value, requested: Option<PostType>) -> PostType {
    let has_carousel = content
        .get("carouselImages")
        .and_then(Value::as_array)
        .map_or(false, |images| !images.is_empty());

    if has_carousel {
        return PostType::Carousel;
    }

    requested.unwrap_or(PostType::Post)
}
