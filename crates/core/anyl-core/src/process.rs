//! Starting verified games: the [`ProcessStarter`] seam used by the launch
//! sequencer and its OS-backed implementation.

use crate::models::{GameId, GameKind};
use std::path::{Path, PathBuf};
use std::process::Command;

/// A game that passed verification and is ready to be handed to the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTarget {
    pub id: GameId,
    pub path: PathBuf,
    pub kind: GameKind,
    /// Directory the game runs in: the directory containing the file.
    pub working_dir: PathBuf,
}

impl LaunchTarget {
    pub fn new(id: GameId, path: PathBuf) -> Self {
        let kind = GameKind::from_path(&path);
        let working_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            id,
            path,
            kind,
            working_dir,
        }
    }
}

/// What the OS reported back after starting a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    /// PID of the spawned process, when one was spawned directly.
    pub pid: Option<u32>,
}

/// Hands a verified game over to the operating system.
///
/// Implementations report process creation only; the spawned process is not
/// tracked afterwards.
pub trait ProcessStarter {
    fn start(&self, target: &LaunchTarget) -> std::io::Result<Started>;
}

/// Starts executables directly and opens HTML games in a browser.
#[derive(Debug, Clone, Default)]
pub struct SystemStarter {
    html_opener: Option<String>,
}

impl SystemStarter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `program` instead of the platform opener for HTML games.
    pub fn with_html_opener(mut self, program: Option<String>) -> Self {
        self.html_opener = program.filter(|p| !p.trim().is_empty());
        self
    }

    fn start_executable(&self, target: &LaunchTarget) -> std::io::Result<Started> {
        let child = Command::new(&target.path)
            .current_dir(&target.working_dir)
            .spawn()?;
        Ok(Started {
            pid: Some(child.id()),
        })
    }

    fn open_html(&self, target: &LaunchTarget) -> std::io::Result<Started> {
        let mut command = match &self.html_opener {
            Some(program) => {
                let mut c = Command::new(program);
                c.arg(&target.path);
                c
            }
            None => platform_opener(&target.path),
        };
        let child = command.current_dir(&target.working_dir).spawn()?;
        Ok(Started {
            pid: Some(child.id()),
        })
    }
}

impl ProcessStarter for SystemStarter {
    fn start(&self, target: &LaunchTarget) -> std::io::Result<Started> {
        match target.kind {
            GameKind::Executable => self.start_executable(target),
            GameKind::Html => self.open_html(target),
        }
    }
}

#[cfg(windows)]
fn platform_opener(path: &Path) -> Command {
    let mut c = Command::new("cmd");
    c.args(["/C", "start", ""]).arg(path);
    c
}

#[cfg(target_os = "macos")]
fn platform_opener(path: &Path) -> Command {
    let mut c = Command::new("open");
    c.arg(path);
    c
}

#[cfg(all(not(windows), not(target_os = "macos")))]
fn platform_opener(path: &Path) -> Command {
    let mut c = Command::new("xdg-open");
    c.arg(path);
    c
}
