//! Practice sessions as authored elsewhere: sections of ordered items.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSession {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub share_slug: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub break_enabled: bool,
    /// Length of the automatic break between items.
    #[serde(default)]
    pub break_seconds: Option<u32>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub order_index: u32,
    #[serde(default)]
    pub items: Vec<SessionItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionItem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub order_index: u32,
    #[serde(flatten)]
    pub kind: ItemKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    /// Advances when the embed reports the end of playback.
    VimeoVideo {
        #[serde(rename = "videoRef")]
        video_ref: String,
    },
    /// Sheet music shown with a manual countdown.
    Pdf {
        #[serde(rename = "pdfRef")]
        pdf_ref: String,
        #[serde(default, rename = "durationSeconds")]
        duration_seconds: Option<u32>,
    },
    /// A rest with a mandatory countdown.
    Pause {
        #[serde(default, rename = "durationSeconds")]
        duration_seconds: Option<u32>,
    },
}

impl ItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::VimeoVideo { .. } => "Video",
            ItemKind::Pdf { .. } => "Sheet music",
            ItemKind::Pause { .. } => "Pause",
        }
    }
}

/// Sessions available to the player.
#[derive(Debug, Clone, Default)]
pub struct SessionLibrary {
    sessions: Vec<PracticeSession>,
}

impl SessionLibrary {
    pub fn new(sessions: Vec<PracticeSession>) -> Self {
        Self { sessions }
    }

    /// Loads a JSON array of sessions; a missing file is an empty library.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no session library file");
            return Ok(Self::default());
        }
        let mut file = File::open(path)?;
        let mut data = String::new();
        file.read_to_string(&mut data)?;
        let sessions: Vec<PracticeSession> = serde_json::from_str(&data)?;
        Ok(Self { sessions })
    }

    pub fn sessions(&self) -> &[PracticeSession] {
        &self.sessions
    }

    pub fn find_by_id(&self, id: &str) -> Option<&PracticeSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Resolves a share link. Only public sessions can be shared.
    pub fn find_by_share_slug(&self, slug: &str) -> Option<&PracticeSession> {
        self.sessions
            .iter()
            .find(|s| s.is_public && s.share_slug.as_deref() == Some(slug))
    }

    /// Looks up a session id, a share slug or a full share link ending in
    /// the slug.
    pub fn resolve(&self, reference: &str) -> Result<&PracticeSession, StoreError> {
        let key = reference
            .trim()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        self.find_by_id(key)
            .or_else(|| self.find_by_share_slug(key))
            .ok_or_else(|| StoreError::SessionNotFound(reference.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = r#"[
        {
            "id": "s1",
            "name": "Warm-up",
            "shareSlug": "warm-up",
            "isPublic": true,
            "breakEnabled": true,
            "breakSeconds": 20,
            "sections": [
                {
                    "title": "Long tones",
                    "orderIndex": 0,
                    "items": [
                        {"id": "i1", "title": "Intro", "orderIndex": 0, "type": "vimeo_video", "videoRef": "123"},
                        {"id": "i2", "title": "Etude", "orderIndex": 1, "type": "pdf", "pdfRef": "etude.pdf", "durationSeconds": 90},
                        {"id": "i3", "orderIndex": 2, "type": "pause"}
                    ]
                }
            ]
        },
        {"id": "s2", "name": "Private", "shareSlug": "secret", "sections": []}
    ]"#;

    #[test]
    fn items_deserialize_by_type_tag() {
        let sessions: Vec<PracticeSession> = serde_json::from_str(LIBRARY).unwrap();
        let items = &sessions[0].sections[0].items;
        assert_eq!(
            items[0].kind,
            ItemKind::VimeoVideo {
                video_ref: "123".into()
            }
        );
        assert_eq!(
            items[1].kind,
            ItemKind::Pdf {
                pdf_ref: "etude.pdf".into(),
                duration_seconds: Some(90)
            }
        );
        assert_eq!(
            items[2].kind,
            ItemKind::Pause {
                duration_seconds: None
            }
        );
        assert_eq!(sessions[0].break_seconds, Some(20));
    }

    #[test]
    fn share_slug_only_resolves_public_sessions() {
        let sessions: Vec<PracticeSession> = serde_json::from_str(LIBRARY).unwrap();
        let library = SessionLibrary::new(sessions);
        assert_eq!(library.find_by_share_slug("warm-up").unwrap().id, "s1");
        assert!(library.find_by_share_slug("secret").is_none());
        assert!(library.find_by_id("s2").is_some());
        assert!(library.find_by_id("nope").is_none());
    }

    #[test]
    fn share_links_resolve_to_public_sessions_only() {
        let sessions: Vec<PracticeSession> = serde_json::from_str(LIBRARY).unwrap();
        let library = SessionLibrary::new(sessions);
        assert_eq!(library.resolve("s2").unwrap().id, "s2");
        assert_eq!(library.resolve(" warm-up ").unwrap().id, "s1");
        assert_eq!(
            library.resolve("https://trainer.example/s/warm-up/").unwrap().id,
            "s1"
        );

        let err = library.resolve("secret").unwrap_err();
        assert!(matches!(&err, StoreError::SessionNotFound(slug) if slug == "secret"));
        assert_eq!(err.to_string(), "practice session 'secret' not found");
    }

    #[test]
    fn missing_library_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let library = SessionLibrary::load(dir.path().join("sessions.json")).unwrap();
        assert!(library.sessions().is_empty());
    }
}
