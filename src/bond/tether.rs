// bond/tether.rs
// Boundary to the physics engine's six-degree-of-freedom tether constraint

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ultraviolet::DVec3;

use crate::body::BodyId;

/// Opaque handle to a constraint owned by the physics engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TetherHandle(pub u64);

/// One end of a tether, in the body's local frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TetherAnchor {
    pub body: BodyId,
    /// Attachment point, body-local
    pub position: DVec3,
    /// Bond axis leaving the attachment point, body-local
    pub axis: DVec3,
}

/// Creates and removes tether constraints in the physics engine.
pub trait TetherSink {
    fn attach(&mut self, receptor: TetherAnchor, ligand: TetherAnchor, rest_length: f64) -> TetherHandle;
    fn detach(&mut self, handle: TetherHandle);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TetherRecord {
    pub receptor: TetherAnchor,
    pub ligand: TetherAnchor,
    pub rest_length: f64,
}

/// In-memory tether sink for headless runs: records what the physics engine
/// would have been asked to create.
#[derive(Debug, Default)]
pub struct TetherLedger {
    next_handle: u64,
    live: HashMap<TetherHandle, TetherRecord>,
    pub attached_total: u64,
    pub detached_total: u64,
}

impl TetherLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn get(&self, handle: TetherHandle) -> Option<&TetherRecord> {
        self.live.get(&handle)
    }
}

impl TetherSink for TetherLedger {
    fn attach(&mut self, receptor: TetherAnchor, ligand: TetherAnchor, rest_length: f64) -> TetherHandle {
        let handle = TetherHandle(self.next_handle);
        self.next_handle += 1;
        self.attached_total += 1;
        self.live.insert(
            handle,
            TetherRecord {
                receptor,
                ligand,
                rest_length,
            },
        );
        handle
    }

    fn detach(&mut self, handle: TetherHandle) {
        if self.live.remove(&handle).is_some() {
            self.detached_total += 1;
        }
    }
}
