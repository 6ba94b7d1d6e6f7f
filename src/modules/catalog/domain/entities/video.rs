use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoKind {
    Trailer,
    Teaser,
    Clip,
    Featurette,
    BehindTheScenes,
    Bloopers,
    Other,
}

impl VideoKind {
    /// Parse the `type` string TMDB attaches to a video
    pub fn from_tmdb(value: &str) -> Self {
        match value {
            "Trailer" => VideoKind::Trailer,
            "Teaser" => VideoKind::Teaser,
            "Clip" => VideoKind::Clip,
            "Featurette" => VideoKind::Featurette,
            "Behind the Scenes" => VideoKind::BehindTheScenes,
            "Bloopers" => VideoKind::Bloopers,
            _ => VideoKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoKind::Trailer => "trailer",
            VideoKind::Teaser => "teaser",
            VideoKind::Clip => "clip",
            VideoKind::Featurette => "featurette",
            VideoKind::BehindTheScenes => "behind_the_scenes",
            VideoKind::Bloopers => "bloopers",
            VideoKind::Other => "other",
        }
    }
}

impl std::fmt::Display for VideoKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub key: String,
    pub name: String,
    pub site: String,
    pub kind: VideoKind,
    pub official: bool,
    /// Vertical resolution (360, 720, 1080, ...)
    pub size: u32,
    /// RFC 3339 timestamp, compared lexically
    pub published_at: Option<String>,
}

impl Video {
    /// Check if this is a YouTube video
    pub fn is_youtube(&self) -> bool {
        self.site.eq_ignore_ascii_case("youtube")
    }

    pub fn youtube_url(&self) -> Option<String> {
        if self.is_youtube() {
            Some(format!("https://www.youtube.com/watch?v={}", self.key))
        } else {
            None
        }
    }

    /// Lower is better: official trailer, trailer, official teaser, teaser, anything else
    fn priority(&self) -> u8 {
        match (self.kind, self.official) {
            (VideoKind::Trailer, true) => 0,
            (VideoKind::Trailer, false) => 1,
            (VideoKind::Teaser, true) => 2,
            (VideoKind::Teaser, false) => 3,
            _ => 4,
        }
    }
}

/// Pick the video to play on the details screen.
///
/// Only YouTube videos are playable. Within the same priority the larger
/// resolution wins, then the most recently published one.
pub fn select_trailer(videos: &[Video]) -> Option<&Video> {
    videos
        .iter()
        .filter(|video| video.is_youtube())
        .min_by_key(|video| {
            (
                video.priority(),
                Reverse(video.size),
                Reverse(video.published_at.clone()),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(key: &str, kind: VideoKind, official: bool, size: u32, published: &str) -> Video {
        Video {
            key: key.to_string(),
            name: key.to_string(),
            site: "YouTube".to_string(),
            kind,
            official,
            size,
            published_at: Some(published.to_string()),
        }
    }

    #[test]
    fn test_official_trailer_beats_everything() {
        let videos = vec![
            video("teaser", VideoKind::Teaser, true, 1080, "2024-01-01T00:00:00Z"),
            video("fan", VideoKind::Trailer, false, 1080, "2024-03-01T00:00:00Z"),
            video("official", VideoKind::Trailer, true, 720, "2023-12-01T00:00:00Z"),
        ];
        assert_eq!(select_trailer(&videos).unwrap().key, "official");
    }

    #[test]
    fn test_falls_back_to_teaser_then_other() {
        let videos = vec![
            video("clip", VideoKind::Clip, true, 1080, "2024-01-01T00:00:00Z"),
            video("teaser", VideoKind::Teaser, false, 480, "2024-01-01T00:00:00Z"),
        ];
        assert_eq!(select_trailer(&videos).unwrap().key, "teaser");

        let videos = vec![video("clip", VideoKind::Clip, false, 1080, "2024-01-01T00:00:00Z")];
        assert_eq!(select_trailer(&videos).unwrap().key, "clip");
    }

    #[test]
    fn test_ties_break_on_size_then_recency() {
        let videos = vec![
            video("old-hd", VideoKind::Trailer, true, 1080, "2020-01-01T00:00:00Z"),
            video("new-sd", VideoKind::Trailer, true, 480, "2024-01-01T00:00:00Z"),
            video("new-hd", VideoKind::Trailer, true, 1080, "2024-01-01T00:00:00Z"),
        ];
        assert_eq!(select_trailer(&videos).unwrap().key, "new-hd");
    }

    #[test]
    fn test_non_youtube_is_ignored() {
        let mut vimeo = video("vimeo", VideoKind::Trailer, true, 1080, "2024-01-01T00:00:00Z");
        vimeo.site = "Vimeo".to_string();
        assert!(select_trailer(&[vimeo]).is_none());
        assert!(select_trailer(&[]).is_none());
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(VideoKind::from_tmdb("Trailer"), VideoKind::Trailer);
        assert_eq!(VideoKind::from_tmdb("Behind the Scenes"), VideoKind::BehindTheScenes);
        assert_eq!(VideoKind::from_tmdb("Opening Credits"), VideoKind::Other);
    }
}
