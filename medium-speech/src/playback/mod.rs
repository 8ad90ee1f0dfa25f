//! Playback of synthesized audio through an external player.
//!
//! Tracks are played one at a time in filename order. A track the player
//! fails on is logged and playback moves on to the next one.

mod player;

pub use player::{DEFAULT_PLAYER, PlaybackOptions, Player};

use crate::workdir::{WorkDir, remove_quietly};
use async_trait::async_trait;
use log::{debug, info};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Player '{name}' not found on PATH.\nEnsure that {name} is installed in your system\nRun 'sudo apt install {name}'")]
    PlayerNotFound { name: String },

    #[error("Failed to list audio files in {}: {source}", path.display())]
    ListArtifacts {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Runs an external program to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and return its exit code (`None` when it was
    /// killed by a signal).
    async fn run(&self, program: &Path, args: &[OsString]) -> io::Result<Option<i32>>;
}

/// Runs programs directly (no shell) with all standard streams silenced.
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &Path, args: &[OsString]) -> io::Result<Option<i32>> {
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await?;
        Ok(status.code())
    }
}

/// A track the player did not play successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTrack {
    pub file: String,
    /// Exit code, `None` if the player could not be started or was killed
    pub exit_code: Option<i32>,
}

/// Outcome of a playback run.
#[derive(Debug, Clone, Default)]
pub struct PlaybackReport {
    /// Tracks handed to the player
    pub tracks: usize,
    pub failed: Vec<FailedTrack>,
    /// Artifacts deleted afterwards
    pub removed: usize,
}

/// Play every artifact in `workdir`, then delete them if `cleanup` is set.
pub async fn play(
    workdir: &WorkDir,
    player: &Player,
    runner: &dyn CommandRunner,
    options: &PlaybackOptions,
    cleanup: bool,
) -> Result<PlaybackReport, PlaybackError> {
    let tracks = workdir
        .list_artifacts()
        .map_err(|source| PlaybackError::ListArtifacts {
            path: workdir.path().to_path_buf(),
            source,
        })?;

    let mut report = PlaybackReport {
        tracks: tracks.len(),
        ..PlaybackReport::default()
    };

    if tracks.is_empty() {
        info!("No audio files to play in {}", workdir.path().display());
        return Ok(report);
    }

    info!("Playing {} tracks with {}", tracks.len(), player.path().display());
    debug!("Player kind: {:?}", player.kind());

    for track in &tracks {
        debug!("Playing {}", track.display());
        let file = track
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match runner.run(player.path(), &player.args_for(track, options)).await {
            Ok(Some(0)) => {}
            Ok(exit_code) => {
                debug!("{} exited with {:?} while playing {}", player.name(), exit_code, file);
                report.failed.push(FailedTrack { file, exit_code });
            }
            Err(e) => {
                debug!("Failed to start {} for {}: {}", player.name(), file, e);
                report.failed.push(FailedTrack {
                    file,
                    exit_code: None,
                });
            }
        }
    }

    if cleanup {
        report.removed = tracks.iter().filter(|track| remove_quietly(track)).count();
        debug!("Removed {} audio files", report.removed);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records invocations and fails for selected file names.
    struct RecordingRunner {
        calls: Mutex<Vec<(PathBuf, Vec<OsString>)>>,
        failing: HashSet<String>,
    }

    fn track_name(args: &[OsString]) -> String {
        Path::new(args.last().unwrap())
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned()
    }

    impl RecordingRunner {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                failing: HashSet::new(),
            }
        }

        fn failing_on(names: &[&str]) -> Self {
            Self {
                failing: names.iter().map(|n| n.to_string()).collect(),
                ..Self::new()
            }
        }

        fn played(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(_, args)| track_name(args))
                .collect()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, program: &Path, args: &[OsString]) -> io::Result<Option<i32>> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_path_buf(), args.to_vec()));
            if self.failing.contains(&track_name(args)) {
                Ok(Some(1))
            } else {
                Ok(Some(0))
            }
        }
    }

    fn setup(names: &[&str]) -> (tempfile::TempDir, WorkDir) {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            std::fs::write(dir.path().join(name), b"ID3").unwrap();
        }
        let workdir = WorkDir::new(dir.path(), "mp3");
        (dir, workdir)
    }

    fn mpg123() -> Player {
        Player::at("mpg123", "/usr/bin/mpg123")
    }

    #[tokio::test]
    async fn test_plays_in_lexicographic_order_and_cleans_up() {
        let (_dir, workdir) = setup(&["01.mp3", "10.mp3", "02.mp3"]);
        let runner = RecordingRunner::new();

        let report = play(&workdir, &mpg123(), &runner, &PlaybackOptions::default(), true)
            .await
            .unwrap();

        assert_eq!(runner.played(), vec!["01.mp3", "02.mp3", "10.mp3"]);
        assert_eq!(report.tracks, 3);
        assert!(report.failed.is_empty());
        assert_eq!(report.removed, 3);
        assert!(workdir.list_artifacts().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_player_path_is_used() {
        let (_dir, workdir) = setup(&["0001.mp3"]);
        let runner = RecordingRunner::new();

        play(&workdir, &mpg123(), &runner, &PlaybackOptions::default(), false)
            .await
            .unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].0, PathBuf::from("/usr/bin/mpg123"));
        assert_eq!(calls[0].1[0], OsString::from("-q"));
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let (_dir, workdir) = setup(&[]);
        let runner = RecordingRunner::new();

        let report = play(&workdir, &mpg123(), &runner, &PlaybackOptions::default(), true)
            .await
            .unwrap();

        assert_eq!(report.tracks, 0);
        assert_eq!(report.removed, 0);
        assert!(runner.played().is_empty());
    }

    #[tokio::test]
    async fn test_failed_track_does_not_stop_playback() {
        let (_dir, workdir) = setup(&["0001.mp3", "0002.mp3", "0003.mp3"]);
        let runner = RecordingRunner::failing_on(&["0002.mp3"]);

        let report = play(&workdir, &mpg123(), &runner, &PlaybackOptions::default(), true)
            .await
            .unwrap();

        assert_eq!(runner.played(), vec!["0001.mp3", "0002.mp3", "0003.mp3"]);
        assert_eq!(
            report.failed,
            vec![FailedTrack {
                file: "0002.mp3".to_string(),
                exit_code: Some(1)
            }]
        );
        assert_eq!(report.removed, 3);
    }

    #[tokio::test]
    async fn test_keep_files_without_cleanup() {
        let (_dir, workdir) = setup(&["0001.mp3", "0002.mp3"]);
        let runner = RecordingRunner::new();

        let report = play(&workdir, &mpg123(), &runner, &PlaybackOptions::default(), false)
            .await
            .unwrap();

        assert_eq!(report.removed, 0);
        assert_eq!(workdir.list_artifacts().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unrelated_files_are_ignored() {
        let (dir, workdir) = setup(&["0001.mp3", "music.mp3", "0002.wav"]);
        let runner = RecordingRunner::new();

        play(&workdir, &mpg123(), &runner, &PlaybackOptions::default(), true)
            .await
            .unwrap();

        assert_eq!(runner.played(), vec!["0001.mp3"]);
        assert!(dir.path().join("music.mp3").exists());
        assert!(dir.path().join("0002.wav").exists());
    }

    #[tokio::test]
    async fn test_system_runner_missing_program() {
        let missing = SystemRunner
            .run(Path::new("/definitely/not/a/program"), &[])
            .await;
        assert!(missing.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_reports_exit_code() {
        let truthy = which::which("true").unwrap();
        let falsy = which::which("false").unwrap();

        assert_eq!(SystemRunner.run(&truthy, &[]).await.unwrap(), Some(0));
        assert_eq!(SystemRunner.run(&falsy, &[]).await.unwrap(), Some(1));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_silences_output() {
        // A player that writes to stdout and stderr still reports its own code.
        let sh = which::which("sh").unwrap();
        let args = ["-c", "echo noise; echo more >&2; exit 7"].map(OsString::from);

        assert_eq!(SystemRunner.run(&sh, &args).await.unwrap(), Some(7));
    }
}
