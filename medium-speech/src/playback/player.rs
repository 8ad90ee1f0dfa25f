//! External audio player discovery and argument building.

use super::PlaybackError;
use log::debug;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Default player program.
pub const DEFAULT_PLAYER: &str = "mpg123";

/// Playback tweaks forwarded to the player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackOptions {
    /// Playback rate, 1.0 is normal speed
    pub speed: f32,
    /// How many times each track is played
    pub loops: u32,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            loops: 1,
        }
    }
}

impl PlaybackOptions {
    fn changes_speed(&self) -> bool {
        (self.speed - 1.0).abs() > f32::EPSILON
    }
}

/// Players whose command line we know how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerKind {
    Mpg123,
    Mpv,
    Ffplay,
    Other,
}

impl PlayerKind {
    fn from_name(name: &str) -> Self {
        let program = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name);

        match program {
            "mpg123" | "mpg321" => Self::Mpg123,
            "mpv" => Self::Mpv,
            "ffplay" => Self::Ffplay,
            _ => Self::Other,
        }
    }
}

/// A located player executable.
#[derive(Debug, Clone)]
pub struct Player {
    name: String,
    path: PathBuf,
    kind: PlayerKind,
}

impl Player {
    /// Find `name` on PATH (or use it directly when it is a path).
    pub fn locate(name: &str) -> Result<Self, PlaybackError> {
        let path = which::which(name).map_err(|_| PlaybackError::PlayerNotFound {
            name: name.to_string(),
        })?;
        debug!("Using player {}", path.display());
        Ok(Self::at(name, path))
    }

    /// A player at a known path.
    pub fn at(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
            kind: PlayerKind::from_name(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> PlayerKind {
        self.kind
    }

    /// Arguments that play `track` once with `options` applied.
    pub fn args_for(&self, track: &Path, options: &PlaybackOptions) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        let loops = options.loops.max(1);

        match self.kind {
            PlayerKind::Mpg123 => {
                args.push("-q".into());
                if options.changes_speed() {
                    args.push("--pitch".into());
                    args.push(format!("{:.2}", options.speed - 1.0).into());
                }
                if loops > 1 {
                    args.push("--loop".into());
                    args.push(loops.to_string().into());
                }
            }
            PlayerKind::Mpv => {
                args.push("--no-video".into());
                args.push("--really-quiet".into());
                if options.changes_speed() {
                    args.push(format!("--speed={}", options.speed).into());
                }
                if loops > 1 {
                    args.push(format!("--loop-file={}", loops - 1).into());
                }
            }
            PlayerKind::Ffplay => {
                args.extend(["-nodisp", "-autoexit", "-loglevel", "quiet"].map(OsString::from));
                if options.changes_speed() {
                    args.push("-af".into());
                    args.push(format!("atempo={}", options.speed).into());
                }
                if loops > 1 {
                    args.push("-loop".into());
                    args.push(loops.to_string().into());
                }
            }
            PlayerKind::Other => {}
        }

        args.push(track.as_os_str().to_os_string());
        args
    }
}
