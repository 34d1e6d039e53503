//! Core domain types for transcript collections and course exports.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LessonPressError, Result};

/// Fixed extension for local transcript files. The extractor only ingests
/// `*.md` files, which keeps the deployer's rename target unambiguous.
pub const TRANSCRIPT_EXTENSION: &str = "md";

// ---------------------------------------------------------------------------
// TranscriptRecord / TranscriptCollection
// ---------------------------------------------------------------------------

/// One lesson's transcript, keyed by its filename-derived slug.
///
/// Immutable once read: the extractor never rewrites `enhanced_transcript`,
/// and neither does the deployer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    /// Filesystem-safe lesson identifier (filename minus extension).
    pub lesson_slug: String,
    /// Raw transcript contents, Markdown with enhancements.
    pub enhanced_transcript: String,
}

/// The persisted extraction output: source directory plus the ordered
/// transcripts found under its `lessons/` subdirectory.
///
/// Field names are the wire/disk contract — downstream tooling reads this
/// JSON as `{ directory, transcripts: [{ lesson_slug, enhanced_transcript }] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptCollection {
    /// The course directory the transcripts were extracted from.
    pub directory: String,
    /// Records in directory enumeration order (no guaranteed sort).
    pub transcripts: Vec<TranscriptRecord>,
}

impl TranscriptCollection {
    /// Load a collection from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| LessonPressError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| LessonPressError::Json {
            message: format!("invalid collection at {}: {e}", path.display()),
        })
    }

    /// Write the collection as JSON. Serialization happens fully in memory
    /// first, so a failure never leaves a partial file behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| LessonPressError::Json {
            message: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| LessonPressError::io(path, e))
    }
}

// ---------------------------------------------------------------------------
// LessonLookup
// ---------------------------------------------------------------------------

/// Response from the remote lesson-lookup endpoint. Only the canonical
/// slug is required; any other fields the service returns are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonLookup {
    /// Canonical slug as tracked by the remote content service. May differ
    /// from the local slug when the lesson was renamed upstream.
    pub slug: String,
    /// Lesson title, if the service returns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

// ---------------------------------------------------------------------------
// CourseExport (assembler input)
// ---------------------------------------------------------------------------

/// Instructor block inside a course export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructorInfo {
    pub full_name: String,
    pub http_url: String,
}

/// Course metadata used for the combined document header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseInfo {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub square_cover_url: String,
    pub http_url: String,
    pub instructor: InstructorInfo,
}

/// One lesson's contribution to the combined document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonSection {
    /// Display title for the `##` section heading.
    pub title: String,
    /// Enhanced-transcript Markdown body.
    pub markdown: String,
}

/// Assembler input: course metadata plus per-slug lesson sections. The
/// lesson ordering is supplied separately (the export does not order them).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseExport {
    pub course: CourseInfo,
    pub lessons: HashMap<String, LessonSection>,
}

impl CourseExport {
    /// Load a course export from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| LessonPressError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| LessonPressError::Json {
            message: format!("invalid course export at {}: {e}", path.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_roundtrip() {
        let collection = TranscriptCollection {
            directory: "/tmp/course".into(),
            transcripts: vec![
                TranscriptRecord {
                    lesson_slug: "intro".into(),
                    enhanced_transcript: "# Intro\n\nWelcome.".into(),
                },
                TranscriptRecord {
                    lesson_slug: "setup".into(),
                    enhanced_transcript: "# Setup\n\nInstall things.".into(),
                },
            ],
        };

        let json = serde_json::to_string_pretty(&collection).expect("serialize");
        let parsed: TranscriptCollection = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, collection);
    }

    #[test]
    fn collection_wire_field_names() {
        // The on-disk shape is a contract with the deploy tooling.
        let json = r#"{
            "directory": "/tmp/course",
            "transcripts": [
                {"lesson_slug": "intro", "enhanced_transcript": "hello"}
            ]
        }"#;
        let parsed: TranscriptCollection = serde_json::from_str(json).expect("deserialize");
        assert_eq!(parsed.directory, "/tmp/course");
        assert_eq!(parsed.transcripts[0].lesson_slug, "intro");
        assert_eq!(parsed.transcripts[0].enhanced_transcript, "hello");

        let out = serde_json::to_value(&parsed).expect("serialize");
        assert!(out["transcripts"][0].get("lesson_slug").is_some());
        assert!(out["transcripts"][0].get("enhanced_transcript").is_some());
    }

    #[test]
    fn lookup_ignores_extra_fields() {
        let json = r#"{"slug": "setup-2024", "title": "Setup", "position": 3}"#;
        let parsed: LessonLookup = serde_json::from_str(json).expect("deserialize");
        assert_eq!(parsed.slug, "setup-2024");
        assert_eq!(parsed.title.as_deref(), Some("Setup"));
    }

    #[test]
    fn course_export_parses() {
        let json = r#"{
            "course": {
                "title": "Build a Thing",
                "slug": "build-a-thing",
                "description": "A course.",
                "square_cover_url": "https://cdn.example.com/cover.png",
                "http_url": "https://courses.example.com/build-a-thing",
                "instructor": {
                    "full_name": "Jane Doe",
                    "http_url": "https://courses.example.com/instructors/jane"
                }
            },
            "lessons": {
                "intro": {"title": "Introduction", "markdown": "Welcome."}
            }
        }"#;
        let parsed: CourseExport = serde_json::from_str(json).expect("deserialize");
        assert_eq!(parsed.course.slug, "build-a-thing");
        assert_eq!(parsed.lessons["intro"].title, "Introduction");
    }
}
