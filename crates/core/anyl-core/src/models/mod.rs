pub mod game;

pub use crate::fingerprint::Fingerprint;
pub use game::{GameEntry, GameId, GameKind, RegistryDocument};
