//! Error types for the combat simulation.

use thiserror::Error;

use crate::enums::FighterKind;
use crate::types::{FormationId, UnitId};

/// Result type alias using [`CombatError`].
pub type Result<T> = std::result::Result<T, CombatError>;

/// Errors surfaced by the public simulation API.
///
/// Missing targets during a tick are not errors; missions referencing a
/// vanished unit are silently dropped.
#[derive(Debug, Error)]
pub enum CombatError {
    /// No live unit with this id.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// Order mission does not fit the addressed unit.
    #[error("Unit {unit} does not accept {expected} missions")]
    MissionKindMismatch {
        unit: UnitId,
        /// Kind of mission the order carried.
        expected: &'static str,
    },

    /// Unit has no hangar of the requested kind.
    #[error("Unit {0} has no matching hangar")]
    NotACarrier(UnitId),

    #[error("Carrier {carrier} has {available} {kind} aboard, {requested} requested")]
    InsufficientFighters {
        carrier: UnitId,
        kind: FighterKind,
        available: u32,
        requested: u32,
    },

    /// A formation already has its leader.
    #[error("Formation {0} already has a leader")]
    FormationLeaderAlreadySet(FormationId),

    #[error("Formation not found: {0}")]
    FormationNotFound(FormationId),

    /// Archive contains a handle the registry cannot reproduce.
    #[error("Invalid unit handle in archive: {0:#x}")]
    InvalidHandle(u64),

    /// Missile launch from something that is not a launcher part.
    #[error("Unit {unit} has no launcher part named '{part}'")]
    UnknownLauncher { unit: UnitId, part: String },

    #[error("Unsupported archive version {found}, expected {expected}")]
    ArchiveVersion { found: u32, expected: u32 },

    #[error("Archive encoding error: {0}")]
    Archive(#[from] serde_json::Error),
}
