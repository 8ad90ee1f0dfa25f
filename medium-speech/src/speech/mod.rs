//! Speech synthesis: one audio artifact per line, named by document index.
//!
//! A line whose request fails is logged and skipped; the rest of the article
//! is still synthesized. Payloads are written to a partial file and renamed
//! into place, so a failed line never leaves a truncated artifact behind.

mod retry;

pub use retry::RetryConfig;

use crate::text::{Chunk, Line};
use crate::workdir::{WorkDir, index_width};
use anyhow::Context;
use futures_util::stream::{self, StreamExt};
use log::{debug, info};
use std::path::Path;
use tts_client::{SpeechProvider, SpeechRequest, TtsError};

/// Characters of line text kept in a skipped-line report.
const EXCERPT_CHARS: usize = 40;

/// Options for a synthesis run.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// Language code passed to the provider
    pub lang: String,
    /// Request slower speech
    pub slow: bool,
    /// Maximum number of requests in flight
    pub jobs: usize,
    pub retry: RetryConfig,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            slow: false,
            jobs: 1,
            retry: RetryConfig::default(),
        }
    }
}

/// A line that produced no audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub index: usize,
    pub excerpt: String,
    pub reason: String,
}

/// Outcome of a synthesis run.
#[derive(Debug, Clone, Default)]
pub struct SynthesisReport {
    pub attempted: usize,
    pub produced: usize,
    /// Skipped lines in document order
    pub skipped: Vec<SkippedLine>,
}

pub struct Synthesizer<'a> {
    provider: &'a dyn SpeechProvider,
    options: SynthesisOptions,
}

impl<'a> Synthesizer<'a> {
    pub fn new(provider: &'a dyn SpeechProvider, options: SynthesisOptions) -> Self {
        Self { provider, options }
    }

    /// Synthesize every line of every chunk into `workdir`.
    ///
    /// Stale artifacts from an earlier run are removed first, so afterwards the
    /// directory only holds this run's audio. `on_progress` is called with
    /// `(finished, total)` after each line.
    pub async fn synthesize<F>(
        &self,
        chunks: &[Chunk],
        workdir: &WorkDir,
        mut on_progress: F,
    ) -> anyhow::Result<SynthesisReport>
    where
        F: FnMut(usize, usize),
    {
        workdir.ensure().with_context(|| {
            format!(
                "Failed to create working directory {}",
                workdir.path().display()
            )
        })?;

        let stale = workdir.clear_artifacts().with_context(|| {
            format!("Failed to clean working directory {}", workdir.path().display())
        })?;
        if stale > 0 {
            debug!(
                "Removed {} stale audio files from {}",
                stale,
                workdir.path().display()
            );
        }

        let lines: Vec<&Line> = chunks.iter().flat_map(Chunk::lines).collect();
        let total = lines.len();
        let width = index_width(lines.iter().map(|l| l.index).max().unwrap_or(0));

        info!(
            "Generating speech for {} lines using {} ({} files)",
            total,
            self.provider.name(),
            workdir.extension()
        );

        let mut outcomes = stream::iter(
            lines
                .into_iter()
                .map(|line| self.synthesize_line(line, workdir, width)),
        )
        .buffer_unordered(self.options.jobs.max(1));

        let mut report = SynthesisReport {
            attempted: total,
            ..SynthesisReport::default()
        };
        let mut finished = 0;

        while let Some(outcome) = outcomes.next().await {
            finished += 1;
            match outcome {
                Ok(()) => report.produced += 1,
                Err(skipped) => report.skipped.push(skipped),
            }
            on_progress(finished, total);
        }

        report.skipped.sort_by_key(|s| s.index);
        info!(
            "Done: generated {}/{} audio files",
            report.produced, report.attempted
        );

        Ok(report)
    }

    async fn synthesize_line(
        &self,
        line: &Line,
        workdir: &WorkDir,
        width: usize,
    ) -> Result<(), SkippedLine> {
        let skip = |reason: String| {
            debug!("Skipping line {}: {}", line.index, reason);
            SkippedLine {
                index: line.index,
                excerpt: excerpt(&line.text),
                reason,
            }
        };

        debug!("[{}] {}", line.index, line.text);
        let request = SpeechRequest::new(line.text.as_str(), self.options.lang.as_str())
            .slow(self.options.slow);

        let audio = self
            .request_with_retry(&request, line.index)
            .await
            .map_err(|e| skip(e.to_string()))?;

        let path = workdir.artifact_path(line.index, width);
        write_artifact(workdir, &path, &audio)
            .await
            .map_err(|e| skip(format!("failed to write {}: {}", path.display(), e)))?;

        Ok(())
    }

    async fn request_with_retry(
        &self,
        request: &SpeechRequest,
        index: usize,
    ) -> Result<Vec<u8>, TtsError> {
        let retry = &self.options.retry;
        let mut attempt = 0;

        loop {
            match self.provider.synthesize(request).await {
                Ok(audio) => return Ok(audio),
                Err(e) if e.is_transient() && attempt < retry.max_retries => {
                    let delay = retry.delay_after(attempt, &e);
                    attempt += 1;
                    debug!(
                        "Line {} failed (attempt {}/{}): {}. Retrying in {:?}",
                        index,
                        attempt,
                        retry.max_retries + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Write a payload next to its final path, then move it into place.
async fn write_artifact(workdir: &WorkDir, path: &Path, audio: &[u8]) -> std::io::Result<()> {
    let partial = workdir.partial_path(path);

    let written = match tokio::fs::write(&partial, audio).await {
        Ok(()) => tokio::fs::rename(&partial, path).await,
        Err(e) => Err(e),
    };

    if written.is_err() {
        let _ = tokio::fs::remove_file(&partial).await;
    }
    written
}

fn excerpt(text: &str) -> String {
    let mut excerpt: String = text.chars().take(EXCERPT_CHARS).collect();
    if text.chars().count() > EXCERPT_CHARS {
        excerpt.push_str("...");
    }
    excerpt
}
