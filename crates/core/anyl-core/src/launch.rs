//! Integrity-verified game launch.
//!
//! A launch walks `Idle -> Verifying -> Launching | VerifyFailed -> Idle`.
//! Nothing is carried between launches: every call reads the entry fresh
//! from the registry and re-fingerprints the file on disk.

use crate::error::{AppError, AppResult};
use crate::fingerprint::{Fingerprint, fingerprint};
use crate::models::{GameEntry, GameId, GameKind};
use crate::process::{LaunchTarget, ProcessStarter, SystemStarter};
use crate::storage::registry::GameRegistry;
use log::{debug, info, warn};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    Idle,
    Verifying,
    Launching,
    VerifyFailed,
}

impl LaunchState {
    fn advance(&mut self, next: LaunchState) {
        debug!("Launch state {:?} -> {:?}", self, next);
        *self = next;
    }
}

/// Result of comparing a game's file with its recorded fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Intact,
    Tampered {
        expected: Fingerprint,
        actual: Fingerprint,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launched {
    pub id: GameId,
    pub path: PathBuf,
    pub kind: GameKind,
    pub pid: Option<u32>,
}

pub struct LaunchSequencer<S = SystemStarter> {
    starter: S,
}

impl<S: ProcessStarter> LaunchSequencer<S> {
    pub fn new(starter: S) -> Self {
        Self { starter }
    }

    pub fn starter(&self) -> &S {
        &self.starter
    }

    /// Checks the file behind `id` without launching it.
    pub fn verify(&self, registry: &GameRegistry, id: &GameId) -> AppResult<Verification> {
        let entry = resolve(registry, id)?;
        verify_entry(entry)
    }

    /// Verifies and launches the last selected game.
    pub fn launch_selected(&self, registry: &GameRegistry) -> AppResult<Launched> {
        let id = registry
            .last_selected_id()
            .cloned()
            .ok_or(AppError::NothingSelected)?;
        self.launch(registry, &id)
    }

    /// Verifies the game's file and, only if it is unchanged, starts it.
    ///
    /// A fingerprint mismatch refuses the launch with `IntegrityMismatch`.
    /// The stored fingerprint is never updated here; accepting new content
    /// takes an explicit `repath`.
    pub fn launch(&self, registry: &GameRegistry, id: &GameId) -> AppResult<Launched> {
        let mut state = LaunchState::Idle;
        let result = self.run(&mut state, registry, id);
        state.advance(LaunchState::Idle);
        result
    }

    fn run(
        &self,
        state: &mut LaunchState,
        registry: &GameRegistry,
        id: &GameId,
    ) -> AppResult<Launched> {
        state.advance(LaunchState::Verifying);
        let entry = resolve(registry, id)?;

        if let Verification::Tampered { expected, actual } = verify_entry(entry)? {
            state.advance(LaunchState::VerifyFailed);
            warn!(
                "Refusing to launch {}: {} changed since it was registered",
                entry.id,
                entry.path.display()
            );
            return Err(AppError::IntegrityMismatch {
                id: entry.id.clone(),
                path: entry.path.clone(),
                expected,
                actual,
            });
        }

        state.advance(LaunchState::Launching);
        let target = LaunchTarget::new(entry.id.clone(), entry.path.clone());
        let started = self
            .starter
            .start(&target)
            .map_err(|source| AppError::LaunchFailed {
                path: target.path.clone(),
                source,
            })?;

        info!("Launched {} ({})", entry.name, entry.path.display());
        Ok(Launched {
            id: target.id,
            path: target.path,
            kind: target.kind,
            pid: started.pid,
        })
    }
}

impl Default for LaunchSequencer<SystemStarter> {
    fn default() -> Self {
        Self::new(SystemStarter::new())
    }
}

fn resolve<'a>(registry: &'a GameRegistry, id: &GameId) -> AppResult<&'a GameEntry> {
    registry
        .get(id)
        .ok_or_else(|| AppError::NotFound { id: id.clone() })
}

fn verify_entry(entry: &GameEntry) -> AppResult<Verification> {
    let actual = fingerprint(&entry.path)?;
    if actual == entry.fingerprint {
        Ok(Verification::Intact)
    } else {
        Ok(Verification::Tampered {
            expected: entry.fingerprint.clone(),
            actual,
        })
    }
}
