//! Transcript deployer: `TranscriptCollection` → remote content API.
//!
//! For each record the deployer resolves the canonical lesson slug via the
//! remote lookup endpoint, submits the transcript to the submission
//! endpoint, and best-effort renames the local source file when the
//! canonical slug diverges from the local one. Records are independent:
//! one record's failure is logged and never aborts the run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use url::Url;

use lessonpress_shared::{
    LessonLookup, LessonPressError, Result, TRANSCRIPT_EXTENSION, TranscriptCollection,
    TranscriptRecord,
};

/// User-Agent string for deploy requests.
const USER_AGENT: &str = concat!("lessonpress/", env!("CARGO_PKG_VERSION"));

/// Subdirectory of the collection's source directory holding the files
/// that get renamed when slugs converge.
const LESSONS_DIR: &str = "lessons";

// ---------------------------------------------------------------------------
// DeployConfig
// ---------------------------------------------------------------------------

/// Configuration for one deploy run.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Target domain, including scheme (e.g. `https://api.example.com`).
    pub domain: Url,
    /// Static bearer token attached to every request.
    pub auth_token: String,
    /// Maximum concurrent in-flight records.
    pub concurrency: usize,
    /// Whether to rename local files to match resolved slugs.
    pub rename_local: bool,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Terminal state of one record's deploy attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    /// Lookup and submission both succeeded.
    Deployed,
    /// Lookup failed; the record was skipped without a submission.
    LookupFailed(String),
    /// Lookup succeeded but the submission was rejected.
    SubmissionFailed(String),
}

/// Per-record result, reported in collection order.
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    /// Local slug from the collection.
    pub lesson_slug: String,
    /// Canonical slug resolved from the remote service (when lookup succeeded).
    pub resolved_slug: Option<String>,
    /// How the record ended up.
    pub status: RecordStatus,
    /// Whether the local source file was renamed to the resolved slug.
    pub renamed: bool,
}

/// Summary of a completed deploy run.
#[derive(Debug)]
pub struct DeploySummary {
    /// Per-record outcomes in collection order.
    pub outcomes: Vec<RecordOutcome>,
    /// Total duration of the run.
    pub duration: Duration,
}

impl DeploySummary {
    /// Number of records fully deployed.
    pub fn deployed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == RecordStatus::Deployed)
            .count()
    }

    /// Number of records that failed lookup or submission.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.deployed()
    }

    /// Number of local files renamed to their resolved slug.
    pub fn renamed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.renamed).count()
    }

    /// Failures as (slug, message) pairs for the summary printout.
    pub fn failures(&self) -> Vec<(String, String)> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.status {
                RecordStatus::Deployed => None,
                RecordStatus::LookupFailed(msg) => {
                    Some((o.lesson_slug.clone(), format!("lookup: {msg}")))
                }
                RecordStatus::SubmissionFailed(msg) => {
                    Some((o.lesson_slug.clone(), format!("submission: {msg}")))
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting deploy status.
pub trait ProgressReporter: Send + Sync {
    /// Called when a record's deploy begins.
    fn record_started(&self, slug: &str, current: usize, total: usize);
    /// Called when a record's deploy finishes (in collection order).
    fn record_finished(&self, outcome: &RecordOutcome);
    /// Called when the run completes.
    fn done(&self, summary: &DeploySummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn record_started(&self, _slug: &str, _current: usize, _total: usize) {}
    fn record_finished(&self, _outcome: &RecordOutcome) {}
    fn done(&self, _summary: &DeploySummary) {}
}

// ---------------------------------------------------------------------------
// Deployer
// ---------------------------------------------------------------------------

/// Deploys a transcript collection against the remote content API.
pub struct Deployer {
    config: DeployConfig,
    client: Client,
}

impl Deployer {
    /// Create a new deployer. Builds the HTTP client once, with the bearer
    /// token installed as a default header on every request.
    pub fn new(config: DeployConfig) -> Result<Self> {
        let mut auth_value =
            HeaderValue::from_str(&format!("Bearer {}", config.auth_token)).map_err(|e| {
                LessonPressError::Network(format!("invalid auth token for header: {e}"))
            })?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_value);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                LessonPressError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    /// Deploy every record in the collection.
    ///
    /// Records run in independent tasks bounded by the configured
    /// concurrency; outcomes are collected in collection order so logs and
    /// the summary stay attributable.
    #[instrument(skip_all, fields(domain = %self.config.domain, records = collection.transcripts.len()))]
    pub async fn deploy(
        &self,
        collection: &TranscriptCollection,
        progress: &dyn ProgressReporter,
    ) -> Result<DeploySummary> {
        let start = std::time::Instant::now();
        let total = collection.transcripts.len();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));

        info!(
            total,
            concurrency = self.config.concurrency,
            rename_local = self.config.rename_local,
            "starting deploy"
        );

        let mut handles = Vec::with_capacity(total);

        for (i, record) in collection.transcripts.iter().enumerate() {
            progress.record_started(&record.lesson_slug, i + 1, total);

            let client = self.client.clone();
            let domain = self.config.domain.clone();
            let rename_local = self.config.rename_local;
            let directory = collection.directory.clone();
            let record = record.clone();
            let sem = semaphore.clone();

            handles.push(tokio::spawn(async move {
                let _permit = sem.acquire_owned().await.expect("semaphore closed");
                deploy_record(&client, &domain, &directory, &record, rename_local).await
            }));
        }

        let mut outcomes = Vec::with_capacity(total);
        for (handle, record) in handles.into_iter().zip(&collection.transcripts) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => RecordOutcome {
                    lesson_slug: record.lesson_slug.clone(),
                    resolved_slug: None,
                    status: RecordStatus::LookupFailed(format!("task panicked: {e}")),
                    renamed: false,
                },
            };
            progress.record_finished(&outcome);
            outcomes.push(outcome);
        }

        let summary = DeploySummary {
            outcomes,
            duration: start.elapsed(),
        };

        info!(
            deployed = summary.deployed(),
            failed = summary.failed(),
            renamed = summary.renamed(),
            duration_ms = summary.duration.as_millis(),
            "deploy completed"
        );

        progress.done(&summary);
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Per-record deploy
// ---------------------------------------------------------------------------

/// Run the lookup → submit → rename sequence for one record.
///
/// Never returns an error: per-record failures are folded into the outcome
/// and warn-logged, per the non-fatal policy.
async fn deploy_record(
    client: &Client,
    domain: &Url,
    directory: &str,
    record: &TranscriptRecord,
    rename_local: bool,
) -> RecordOutcome {
    let slug = &record.lesson_slug;

    // Step 1: resolve the canonical slug.
    let resolved = match lookup_lesson(client, domain, slug).await {
        Ok(lookup) => lookup.slug,
        Err(e) => {
            warn!(slug = %slug, error = %e, "lookup failed, skipping record");
            return RecordOutcome {
                lesson_slug: slug.clone(),
                resolved_slug: None,
                status: RecordStatus::LookupFailed(e.to_string()),
                renamed: false,
            };
        }
    };

    debug!(slug = %slug, resolved = %resolved, "lookup resolved");

    // Step 2: submit the transcript under the resolved slug.
    if let Err(e) = submit_transcript(client, domain, &resolved, &record.enhanced_transcript).await
    {
        warn!(slug = %slug, error = %e, "submission failed");
        return RecordOutcome {
            lesson_slug: slug.clone(),
            resolved_slug: Some(resolved),
            status: RecordStatus::SubmissionFailed(e.to_string()),
            renamed: false,
        };
    }

    info!(slug = %slug, resolved = %resolved, "transcript deployed");

    // Step 3: converge the local filename with the resolved slug.
    let mut renamed = false;
    if rename_local && resolved != *slug {
        match rename_source_file(directory, slug, &resolved) {
            Ok(()) => {
                info!(from = %slug, to = %resolved, "renamed local transcript");
                renamed = true;
            }
            Err(e) => {
                // Best-effort only: log and keep going.
                warn!(slug = %slug, error = %e, "rename failed, continuing");
            }
        }
    }

    RecordOutcome {
        lesson_slug: slug.clone(),
        resolved_slug: Some(resolved),
        status: RecordStatus::Deployed,
        renamed,
    }
}

/// GET the lesson-lookup endpoint for a local slug.
async fn lookup_lesson(client: &Client, domain: &Url, slug: &str) -> Result<LessonLookup> {
    let url = endpoint(domain, &format!("api/v1/lessons/{slug}"));

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| LessonPressError::lookup(slug, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LessonPressError::lookup(slug, format!("HTTP {status}")));
    }

    response
        .json::<LessonLookup>()
        .await
        .map_err(|e| LessonPressError::lookup(slug, format!("invalid lookup response: {e}")))
}

/// POST the transcript to the submission endpoint under the resolved slug.
/// The server treats this as an idempotent upsert.
async fn submit_transcript(
    client: &Client,
    domain: &Url,
    resolved_slug: &str,
    markdown: &str,
) -> Result<()> {
    let url = endpoint(
        domain,
        &format!("api/v1/lessons/{resolved_slug}/enhanced_transcript"),
    );

    let body = serde_json::json!({
        "enhanced_transcript": {
            "markdown": markdown,
            "title": resolved_slug,
        }
    });

    let response = client
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| LessonPressError::submission(resolved_slug, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LessonPressError::submission(
            resolved_slug,
            format!("HTTP {status}"),
        ));
    }

    Ok(())
}

/// Rename `<directory>/lessons/<from>.md` to `<to>.md`.
fn rename_source_file(directory: &str, from: &str, to: &str) -> Result<()> {
    let lessons_dir = PathBuf::from(directory).join(LESSONS_DIR);
    let source = lessons_dir.join(format!("{from}.{TRANSCRIPT_EXTENSION}"));
    let target = lessons_dir.join(format!("{to}.{TRANSCRIPT_EXTENSION}"));

    std::fs::rename(&source, &target)
        .map_err(|e| LessonPressError::rename(from, format!("{} -> {}: {e}", source.display(), target.display())))
}

/// Join an API path onto the target domain.
fn endpoint(domain: &Url, path: &str) -> String {
    format!("{}/{path}", domain.as_str().trim_end_matches('/'))
}
