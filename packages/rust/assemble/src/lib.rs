//! Course document assembler: export + lesson order → Markdown + PDF.
//!
//! Concatenates per-lesson Markdown fragments into one combined document
//! (course header, description, then one section per lesson in the
//! supplied order) and renders it to PDF by invoking an external renderer
//! command. A slug missing from the export is warn-logged and its section
//! omitted; the document continues.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, instrument, warn};

use lessonpress_shared::{CourseExport, LessonPressError, Result};

// ---------------------------------------------------------------------------
// AssembleConfig / AssembleResult
// ---------------------------------------------------------------------------

/// External renderer invocation: `<command> <input.md> -o <output.pdf>`.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Renderer binary name or path (e.g. `pandoc`).
    pub command: String,
}

/// Configuration for one assembly run.
#[derive(Debug, Clone)]
pub struct AssembleConfig {
    /// Path to the course export JSON.
    pub export_path: PathBuf,
    /// Path to the lesson-order file (one slug per line).
    pub order_path: PathBuf,
    /// Root directory for output; files land at `<root>/<slug>/<slug>.{md,pdf}`.
    pub output_root: PathBuf,
    /// Renderer to produce the PDF; `None` skips rendering.
    pub renderer: Option<RendererConfig>,
}

/// Result of a completed assembly.
#[derive(Debug, Clone)]
pub struct AssembleResult {
    /// Path of the combined Markdown document.
    pub markdown_path: PathBuf,
    /// Path of the rendered PDF, when rendering ran.
    pub rendered_path: Option<PathBuf>,
    /// Lesson sections written, in order.
    pub sections_written: usize,
    /// Slugs from the order file with no entry in the export.
    pub sections_missing: Vec<String>,
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Assemble the combined course document and optionally render it to PDF.
#[instrument(skip_all, fields(export = %config.export_path.display()))]
pub fn assemble(config: &AssembleConfig) -> Result<AssembleResult> {
    let export = CourseExport::load(&config.export_path)?;
    let order = read_lesson_order(&config.order_path)?;

    if order.is_empty() {
        return Err(LessonPressError::validation(format!(
            "lesson order file {} contains no slugs",
            config.order_path.display()
        )));
    }

    let (markdown, missing) = build_document(&export, &order);
    let sections_written = order.len() - missing.len();

    // Deterministic paths derived from the course slug.
    let course_dir = config.output_root.join(&export.course.slug);
    std::fs::create_dir_all(&course_dir).map_err(|e| LessonPressError::io(&course_dir, e))?;

    let markdown_path = course_dir.join(format!("{}.md", export.course.slug));
    std::fs::write(&markdown_path, &markdown)
        .map_err(|e| LessonPressError::io(&markdown_path, e))?;

    info!(
        path = %markdown_path.display(),
        sections = sections_written,
        missing = missing.len(),
        "wrote combined markdown"
    );

    let rendered_path = match &config.renderer {
        Some(renderer) => {
            let pdf_path = course_dir.join(format!("{}.pdf", export.course.slug));
            render_pdf(renderer, &markdown_path, &pdf_path)?;
            info!(path = %pdf_path.display(), "rendered document");
            Some(pdf_path)
        }
        None => None,
    };

    Ok(AssembleResult {
        markdown_path,
        rendered_path,
        sections_written,
        sections_missing: missing,
    })
}

/// Read the lesson-order file: one slug per line, `#` comments and blank
/// lines ignored.
pub fn read_lesson_order(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| LessonPressError::io(path, e))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

/// Build the combined document: course header followed by one `##` section
/// per ordered slug. Returns the document and the slugs that were missing
/// from the export.
pub fn build_document(export: &CourseExport, order: &[String]) -> (String, Vec<String>) {
    let course = &export.course;

    let mut markdown = format!(
        "# {}\n\n![course image]({})\n\nTranscripts for [{}]({}) course on [{}]({}).\n\n## Description\n\n{}",
        course.title,
        course.square_cover_url,
        course.instructor.full_name,
        course.instructor.http_url,
        course.title,
        course.http_url,
        course.description,
    );

    let mut missing = Vec::new();

    for slug in order {
        match export.lessons.get(slug) {
            Some(section) => {
                markdown.push_str(&format!("\n\n## {}\n\n{}", section.title, section.markdown));
            }
            None => {
                warn!(slug = %slug, "missing transcript, omitting section");
                missing.push(slug.clone());
            }
        }
    }

    (markdown, missing)
}

/// Render the Markdown document to PDF via the external renderer.
fn render_pdf(renderer: &RendererConfig, input: &Path, output: &Path) -> Result<()> {
    let status = Command::new(&renderer.command)
        .arg(input)
        .arg("-o")
        .arg(output)
        .status()
        .map_err(|e| {
            LessonPressError::Render(format!(
                "failed to run '{}': {e}. Is the renderer installed?",
                renderer.command
            ))
        })?;

    if !status.success() {
        return Err(LessonPressError::Render(format!(
            "'{}' exited with status {}",
            renderer.command,
            status.code().unwrap_or(-1)
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use lessonpress_shared::{CourseInfo, InstructorInfo, LessonSection};

    fn sample_export() -> CourseExport {
        let mut lessons = HashMap::new();
        lessons.insert(
            "intro".to_string(),
            LessonSection {
                title: "Introduction".into(),
                markdown: "Welcome to the course.".into(),
            },
        );
        lessons.insert(
            "setup".to_string(),
            LessonSection {
                title: "Setting Up".into(),
                markdown: "Install the tools.".into(),
            },
        );

        CourseExport {
            course: CourseInfo {
                title: "Build a Thing".into(),
                slug: "build-a-thing".into(),
                description: "A course about things.".into(),
                square_cover_url: "https://cdn.example.com/cover.png".into(),
                http_url: "https://courses.example.com/build-a-thing".into(),
                instructor: InstructorInfo {
                    full_name: "Jane Doe".into(),
                    http_url: "https://courses.example.com/instructors/jane".into(),
                },
            },
            lessons,
        }
    }

    #[test]
    fn document_follows_supplied_order() {
        let export = sample_export();
        let order = vec!["setup".to_string(), "intro".to_string()];

        let (doc, missing) = build_document(&export, &order);
        assert!(missing.is_empty());

        let setup_pos = doc.find("## Setting Up").unwrap();
        let intro_pos = doc.find("## Introduction").unwrap();
        assert!(setup_pos < intro_pos);

        // Header comes first.
        assert!(doc.starts_with("# Build a Thing"));
        assert!(doc.contains("## Description"));
        assert!(doc.contains("[Jane Doe](https://courses.example.com/instructors/jane)"));
    }

    #[test]
    fn missing_slug_omits_section_and_continues() {
        let export = sample_export();
        let order = vec![
            "intro".to_string(),
            "does-not-exist".to_string(),
            "setup".to_string(),
        ];

        let (doc, missing) = build_document(&export, &order);
        assert_eq!(missing, vec!["does-not-exist"]);
        assert!(doc.contains("## Introduction"));
        assert!(doc.contains("## Setting Up"));
    }

    #[test]
    fn order_file_skips_comments_and_blanks() {
        let dir = std::env::temp_dir().join(format!("lp-assemble-order-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("order.txt");
        std::fs::write(&path, "# curated order\nintro\n\nsetup\n").unwrap();

        let order = read_lesson_order(&path).unwrap();
        assert_eq!(order, vec!["intro", "setup"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn assemble_writes_markdown_at_deterministic_path() {
        let dir = std::env::temp_dir().join(format!("lp-assemble-out-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let export_path = dir.join("export.json");
        std::fs::write(
            &export_path,
            serde_json::to_string(&sample_export()).unwrap(),
        )
        .unwrap();

        let order_path = dir.join("order.txt");
        std::fs::write(&order_path, "intro\nsetup\n").unwrap();

        let result = assemble(&AssembleConfig {
            export_path,
            order_path,
            output_root: dir.clone(),
            renderer: None,
        })
        .unwrap();

        assert_eq!(
            result.markdown_path,
            dir.join("build-a-thing/build-a-thing.md")
        );
        assert!(result.markdown_path.exists());
        assert!(result.rendered_path.is_none());
        assert_eq!(result.sections_written, 2);

        let doc = std::fs::read_to_string(&result.markdown_path).unwrap();
        assert!(doc.contains("Welcome to the course."));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_renderer_is_a_render_error() {
        let dir = std::env::temp_dir().join(format!("lp-assemble-render-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let export_path = dir.join("export.json");
        std::fs::write(
            &export_path,
            serde_json::to_string(&sample_export()).unwrap(),
        )
        .unwrap();

        let order_path = dir.join("order.txt");
        std::fs::write(&order_path, "intro\n").unwrap();

        let result = assemble(&AssembleConfig {
            export_path,
            order_path,
            output_root: dir.clone(),
            renderer: Some(RendererConfig {
                command: "lp-test-renderer-that-does-not-exist".into(),
            }),
        });

        assert!(matches!(result, Err(LessonPressError::Render(_))));
        // The markdown is still written before rendering fails.
        assert!(dir.join("build-a-thing/build-a-thing.md").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
