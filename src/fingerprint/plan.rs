// src/fingerprint/plan.rs

use std::fmt;

use tracing::info;

use crate::errors::Result;
use crate::fingerprint::{Fingerprint, StampStore, TreeStamp};

/// Whether a source's dependents must be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildDecision {
    /// No previous stamp recorded.
    New,
    Changed { previous: Fingerprint },
    Unchanged,
}

impl RebuildDecision {
    pub fn needs_rebuild(&self) -> bool {
        !matches!(self, RebuildDecision::Unchanged)
    }
}

impl fmt::Display for RebuildDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebuildDecision::New => f.write_str("new"),
            RebuildDecision::Changed { .. } => f.write_str("changed"),
            RebuildDecision::Unchanged => f.write_str("unchanged"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub source: String,
    pub fingerprint: Fingerprint,
    pub decision: RebuildDecision,
}

/// Compare fresh stamps against the previous ones, in the given order.
pub fn plan_rebuilds(stamps: &[TreeStamp], previous: &dyn StampStore) -> Result<Vec<PlanEntry>> {
    let mut entries = Vec::with_capacity(stamps.len());

    for stamp in stamps {
        let decision = match previous.load(&stamp.name)? {
            None => RebuildDecision::New,
            Some(prev) if prev == stamp.fingerprint => RebuildDecision::Unchanged,
            Some(prev) => RebuildDecision::Changed { previous: prev },
        };
        info!(source = %stamp.name, decision = %decision, "rebuild decision");
        entries.push(PlanEntry {
            source: stamp.name.clone(),
            fingerprint: stamp.fingerprint.clone(),
            decision,
        });
    }

    Ok(entries)
}
