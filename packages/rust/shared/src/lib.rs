//! Shared types, error model, and configuration for lessonpress.
//!
//! This crate is the foundation depended on by all other lessonpress crates.
//! It provides:
//! - [`LessonPressError`] — the unified error type
//! - Domain types ([`TranscriptCollection`], [`TranscriptRecord`], [`CourseExport`])
//! - Configuration ([`AppConfig`], config loading, token resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiConfig, AppConfig, DefaultsConfig, RenderConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_auth_token,
};
pub use error::{LessonPressError, Result};
pub use types::{
    CourseExport, CourseInfo, InstructorInfo, LessonLookup, LessonSection, TRANSCRIPT_EXTENSION,
    TranscriptCollection, TranscriptRecord,
};
