//! Observability side channel. The pipeline records what it did each step;
//! nothing here is required for correctness and a host that never reads the
//! ledger pays only the push cost.

use keelphys_core::Scalar;

/// What the debug printer shows, and how often. `print_every == 0`
/// disables printing entirely.
#[derive(Copy, Clone, Debug)]
pub struct DebugSettings {
    pub print_every: u32,
    pub show_bodies: bool,
    pub show_contacts: bool,
    pub show_energy: bool,
    pub max_lines: usize,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self { print_every: 0, show_bodies: true, show_contacts: true, show_energy: false, max_lines: 16 }
    }
}

/// One pipeline event. Body references are raw slot indices.
#[derive(Copy, Clone, Debug)]
pub enum SimEvent {
    VelocityReset { id: u32 },
    PositionRescue { id: u32 },
    NormalImpulse { a: u32, b: u32, j: Scalar },
    FrictionImpulse { a: u32, b: u32, jt: Scalar },
    PositionCorrection { a: u32, b: u32, mag: Scalar },
    FellAsleep { id: u32 },
    Substeps { n: u32 },
}

/// Bounded in-memory event log, cleared at the top of every step. Acts as
/// the optional observability hook: the world pushes, hosts may drain.
pub struct EventLog {
    items: Vec<SimEvent>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self { items: Vec::with_capacity(capacity.min(1024)), capacity }
    }

    pub fn push(&mut self, e: SimEvent) {
        if self.items.len() < self.capacity {
            self.items.push(e);
        }
    }

    pub fn clear(&mut self) { self.items.clear(); }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> { self.items.iter() }
}
