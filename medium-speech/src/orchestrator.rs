//! Runs one article through the pipeline: retrieve, extract, chunk,
//! synthesize, play.

use crate::playback::{self, CommandRunner, PlaybackOptions, PlaybackReport, Player};
use crate::source::{self, Exporter, RawDocument, Source};
use crate::speech::{SynthesisOptions, SynthesisReport, Synthesizer};
use crate::text::{chunk, extract_document};
use crate::workdir::WorkDir;
use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Duration;
use tts_client::SpeechProvider;

/// How to play the generated audio.
#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    pub player: String,
    pub options: PlaybackOptions,
    /// Delete the audio files after playing them
    pub cleanup: bool,
}

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct SpeakRequest {
    pub source: Source,
    pub workdir: WorkDir,
    /// `None` generates the audio and leaves it in the working directory
    pub playback: Option<PlaybackRequest>,
    pub chunk_size: usize,
    pub tab_width: usize,
    pub synthesis: SynthesisOptions,
    pub exporter_image: String,
    /// Limit for each docker invocation
    pub export_timeout: Duration,
    /// Limit for the URL reachability check
    pub check_timeout: Duration,
    /// Keep a copy of the retrieved document here
    pub save_document: Option<PathBuf>,
    /// Probe the URL before exporting it
    pub check_url: bool,
}

#[derive(Debug, Clone)]
pub struct SpeakSummary {
    pub lines: usize,
    pub chunks: usize,
    pub synthesis: SynthesisReport,
    pub playback: Option<PlaybackReport>,
}

pub struct Orchestrator<'a> {
    provider: &'a dyn SpeechProvider,
    runner: &'a dyn CommandRunner,
}

impl<'a> Orchestrator<'a> {
    pub fn new(provider: &'a dyn SpeechProvider, runner: &'a dyn CommandRunner) -> Self {
        Self { provider, runner }
    }

    /// Speak the article named by `request`.
    ///
    /// Required programs are located before any network or synthesis work, so
    /// a missing player or docker fails the run without side effects.
    pub async fn speak<F>(&self, request: &SpeakRequest, on_progress: F) -> Result<SpeakSummary>
    where
        F: FnMut(usize, usize),
    {
        let player = request
            .playback
            .as_ref()
            .map(|p| Player::locate(&p.player))
            .transpose()?;

        let document = self.retrieve(request).await?;

        if let Some(path) = &request.save_document {
            document
                .save(path)
                .await
                .with_context(|| format!("Failed to save document to {}", path.display()))?;
            info!("Saved document to {}", path.display());
        }

        self.speak_document(request, &document, player.as_ref(), on_progress)
            .await
    }

    async fn retrieve(&self, request: &SpeakRequest) -> Result<RawDocument> {
        match &request.source {
            Source::File(path) => Ok(source::read_file(path).await?),
            Source::Url(url) => {
                let exporter = Exporter::locate(&request.exporter_image, request.export_timeout)?;
                if request.check_url {
                    source::check_url(url, request.check_timeout).await?;
                }
                exporter.ensure_image().await?;
                info!("Exporting {} with {}", url, exporter.image());
                Ok(exporter.export(url).await?)
            }
        }
    }

    /// Everything after retrieval. `player` must be set when playback is requested.
    pub(crate) async fn speak_document<F>(
        &self,
        request: &SpeakRequest,
        document: &RawDocument,
        player: Option<&Player>,
        on_progress: F,
    ) -> Result<SpeakSummary>
    where
        F: FnMut(usize, usize),
    {
        let lines = extract_document(document, request.tab_width)
            .context("Failed to extract article text")?;
        if lines.is_empty() {
            bail!("The article contains no readable text; nothing to speak");
        }
        let line_count = lines.len();

        let chunks = chunk(lines, request.chunk_size)?;
        info!("Extracted {} lines in {} chunks", line_count, chunks.len());
        for (i, c) in chunks.iter().enumerate() {
            debug!("Chunk {}: {} lines", i + 1, c.lines().len());
        }

        let synthesis = Synthesizer::new(self.provider, request.synthesis.clone())
            .synthesize(&chunks, &request.workdir, on_progress)
            .await?;

        if synthesis.produced == 0 {
            bail!(
                "Speech synthesis failed for all {} lines.\nCheck your network connection and the language setting.",
                synthesis.attempted
            );
        }

        let playback = match (&request.playback, player) {
            (Some(playback), Some(player)) => Some(playback::play(
                &request.workdir,
                player,
                self.runner,
                &playback.options,
                playback.cleanup,
            )
            .await?),
            (Some(_), None) => bail!("Playback requested without a player"),
            (None, _) => {
                info!("Audio files left in {}", request.workdir.path().display());
                None
            }
        };

        Ok(SpeakSummary {
            lines: line_count,
            chunks: chunks.len(),
            synthesis,
            playback,
        })
    }
}
