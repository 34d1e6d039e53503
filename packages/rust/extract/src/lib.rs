//! Transcript extractor: course directory → `TranscriptCollection` JSON.
//!
//! Reads every `*.md` file under `<course_dir>/lessons/`, derives each
//! lesson slug from the filename, and persists the whole collection as one
//! JSON document. Source files are never mutated, and nothing is written
//! until the entire collection has been read and serialized.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use lessonpress_shared::{
    LessonPressError, Result, TRANSCRIPT_EXTENSION, TranscriptCollection, TranscriptRecord,
};

/// Subdirectory of the course directory that holds transcript files.
const LESSONS_DIR: &str = "lessons";

// ---------------------------------------------------------------------------
// ExtractConfig / ExtractSummary
// ---------------------------------------------------------------------------

/// Configuration for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Course directory containing a `lessons/` subdirectory.
    pub course_dir: PathBuf,
    /// Where to write the collection JSON.
    pub output_path: PathBuf,
}

/// Summary of a completed extraction.
#[derive(Debug, Clone)]
pub struct ExtractSummary {
    /// Number of transcript records extracted.
    pub record_count: usize,
    /// Number of directory entries skipped (wrong extension, non-files).
    pub skipped: usize,
    /// Path the collection was written to.
    pub output_path: PathBuf,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract all lesson transcripts from `<course_dir>/lessons` and write the
/// collection JSON to `output_path`.
///
/// Record order follows directory enumeration order; no sort is applied.
/// A missing or unreadable directory fails before any output is written.
#[instrument(skip_all, fields(course_dir = %config.course_dir.display()))]
pub fn extract(config: &ExtractConfig) -> Result<ExtractSummary> {
    let lessons_dir = config.course_dir.join(LESSONS_DIR);

    info!(path = %lessons_dir.display(), "extracting transcripts");

    let collection = read_collection(&config.course_dir, &lessons_dir)?;
    let skipped = count_skipped(&lessons_dir, collection.transcripts.len())?;

    collection.save(&config.output_path)?;

    info!(
        records = collection.transcripts.len(),
        skipped,
        output = %config.output_path.display(),
        "extraction complete"
    );

    Ok(ExtractSummary {
        record_count: collection.transcripts.len(),
        skipped,
        output_path: config.output_path.clone(),
    })
}

/// Read every transcript file into an in-memory collection.
pub fn read_collection(course_dir: &Path, lessons_dir: &Path) -> Result<TranscriptCollection> {
    let entries =
        std::fs::read_dir(lessons_dir).map_err(|e| LessonPressError::io(lessons_dir, e))?;

    let mut transcripts: Vec<TranscriptRecord> = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| LessonPressError::io(lessons_dir, e))?;
        let path = entry.path();

        let Some(slug) = transcript_slug(&path) else {
            debug!(path = %path.display(), "skipping non-transcript entry");
            continue;
        };

        // Unique-slug invariant: one fixed extension makes collisions
        // impossible in practice, but a case-folding filesystem can still
        // surprise us, so fail loudly rather than silently overwrite.
        if transcripts.iter().any(|t| t.lesson_slug == slug) {
            return Err(LessonPressError::validation(format!(
                "duplicate lesson slug '{slug}' in {}",
                lessons_dir.display()
            )));
        }

        let enhanced_transcript =
            std::fs::read_to_string(&path).map_err(|e| LessonPressError::io(&path, e))?;

        debug!(slug = %slug, bytes = enhanced_transcript.len(), "read transcript");

        transcripts.push(TranscriptRecord {
            lesson_slug: slug,
            enhanced_transcript,
        });
    }

    Ok(TranscriptCollection {
        directory: course_dir.to_string_lossy().to_string(),
        transcripts,
    })
}

/// Derive the lesson slug for a directory entry, or `None` if the entry is
/// not a regular `*.md` file.
fn transcript_slug(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    if path.extension().and_then(|e| e.to_str()) != Some(TRANSCRIPT_EXTENSION) {
        return None;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(String::from)
}

/// Count directory entries that were not ingested, for the summary line.
fn count_skipped(lessons_dir: &Path, ingested: usize) -> Result<usize> {
    let total = std::fs::read_dir(lessons_dir)
        .map_err(|e| LessonPressError::io(lessons_dir, e))?
        .count();
    Ok(total.saturating_sub(ingested))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_course(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "lp-extract-{name}-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        std::fs::create_dir_all(dir.join(LESSONS_DIR)).unwrap();
        dir
    }

    #[test]
    fn extracts_one_record_per_transcript_file() {
        let course = temp_course("basic");
        std::fs::write(course.join("lessons/intro.md"), "intro contents").unwrap();
        std::fs::write(course.join("lessons/setup.md"), "setup contents").unwrap();

        let out = course.join("enhancedTranscripts.json");
        let summary = extract(&ExtractConfig {
            course_dir: course.clone(),
            output_path: out.clone(),
        })
        .unwrap();

        assert_eq!(summary.record_count, 2);

        let collection = TranscriptCollection::load(&out).unwrap();
        assert_eq!(collection.directory, course.to_string_lossy());
        assert_eq!(collection.transcripts.len(), 2);

        let intro = collection
            .transcripts
            .iter()
            .find(|t| t.lesson_slug == "intro")
            .expect("intro record");
        assert_eq!(intro.enhanced_transcript, "intro contents");

        let setup = collection
            .transcripts
            .iter()
            .find(|t| t.lesson_slug == "setup")
            .expect("setup record");
        assert_eq!(setup.enhanced_transcript, "setup contents");

        let _ = std::fs::remove_dir_all(&course);
    }

    #[test]
    fn slugs_are_unique_and_filename_derived() {
        let course = temp_course("slugs");
        for name in ["01-intro.md", "02-setup.md", "03-deploy.md"] {
            std::fs::write(course.join(LESSONS_DIR).join(name), "x").unwrap();
        }

        let out = course.join("out.json");
        extract(&ExtractConfig {
            course_dir: course.clone(),
            output_path: out.clone(),
        })
        .unwrap();

        let collection = TranscriptCollection::load(&out).unwrap();
        let mut slugs: Vec<_> = collection
            .transcripts
            .iter()
            .map(|t| t.lesson_slug.clone())
            .collect();
        slugs.sort();
        assert_eq!(slugs, vec!["01-intro", "02-setup", "03-deploy"]);

        let _ = std::fs::remove_dir_all(&course);
    }

    #[test]
    fn skips_non_markdown_entries() {
        let course = temp_course("skips");
        std::fs::write(course.join("lessons/intro.md"), "intro").unwrap();
        std::fs::write(course.join("lessons/notes.txt"), "not a transcript").unwrap();
        std::fs::create_dir_all(course.join("lessons/assets")).unwrap();

        let out = course.join("out.json");
        let summary = extract(&ExtractConfig {
            course_dir: course.clone(),
            output_path: out.clone(),
        })
        .unwrap();

        assert_eq!(summary.record_count, 1);
        assert_eq!(summary.skipped, 2);

        let _ = std::fs::remove_dir_all(&course);
    }

    #[test]
    fn missing_directory_fails_without_output() {
        let course = std::env::temp_dir().join("lp-extract-does-not-exist");
        let out = std::env::temp_dir().join("lp-extract-no-output.json");
        let _ = std::fs::remove_file(&out);

        let result = extract(&ExtractConfig {
            course_dir: course,
            output_path: out.clone(),
        });

        assert!(matches!(result, Err(LessonPressError::Io { .. })));
        // Fatal errors abort before producing output — no partial file.
        assert!(!out.exists());
    }

    #[test]
    fn roundtrip_preserves_order_and_content() {
        let course = temp_course("roundtrip");
        std::fs::write(course.join("lessons/a.md"), "alpha").unwrap();
        std::fs::write(course.join("lessons/b.md"), "beta").unwrap();

        let lessons = course.join(LESSONS_DIR);
        let collection = read_collection(&course, &lessons).unwrap();

        let out = course.join("out.json");
        collection.save(&out).unwrap();
        let reloaded = TranscriptCollection::load(&out).unwrap();
        assert_eq!(reloaded, collection);

        let _ = std::fs::remove_dir_all(&course);
    }
}
