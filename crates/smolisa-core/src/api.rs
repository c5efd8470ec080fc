//! Public host-facing API contracts for embedding the simulator core.

use crate::bus::WriteMask;
use crate::memory::DEFAULT_MEMORY_WORDS;
use crate::{Fault, Memory, RegisterFile, RegisterId};

/// Opcode dispatch profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum IsaProfile {
    /// Complete smolisa opcode set.
    #[default]
    Full,
    /// Only the opcodes the hardware datapath exercises (`LI`, `OR`).
    Datapath,
}

/// Top-level immutable configuration for a simulator instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Memory capacity in 16-bit words.
    pub memory_words: usize,
    /// Opcode dispatch profile.
    pub profile: IsaProfile,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            memory_words: DEFAULT_MEMORY_WORDS,
            profile: IsaProfile::Full,
        }
    }
}

/// Retirement record for one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepOutcome {
    /// Address the instruction was fetched from.
    pub ip: u16,
    /// Raw instruction word.
    pub word: u16,
    /// Reference cycle cost of the instruction.
    pub cycles: u16,
}

/// Run loop boundary modes for batched execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunBoundary {
    /// Run exactly `max_steps` instructions.
    Steps,
    /// Stop after the first instruction that leaves registers and memory
    /// unchanged, the idle loop of an ISA with no halt instruction.
    SelfLoop,
}

/// Aggregated outcome from running multiple steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Number of retired steps during this call.
    pub steps: u64,
    /// Reference cycles consumed during this call.
    pub cycles: u64,
    /// Whether the requested boundary was reached before the step limit.
    pub boundary_reached: bool,
}

/// Cumulative execution counters since the last reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Stats {
    /// Retired instructions.
    pub instructions: u64,
    /// Reference cycles.
    pub cycles: u64,
}

impl Stats {
    /// Average cycles per instruction, `None` before the first retirement.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_cpi(&self) -> Option<f64> {
        (self.instructions != 0).then(|| self.cycles as f64 / self.instructions as f64)
    }
}

/// Stable snapshot wire-version identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u16)]
pub enum SnapshotVersion {
    /// Initial schema revision.
    V1 = 1,
}

impl SnapshotVersion {
    /// Converts wire value to known snapshot version.
    #[must_use]
    pub const fn from_u16(version: u16) -> Option<Self> {
        match version {
            1 => Some(Self::V1),
            _ => None,
        }
    }
}

/// Full architectural state for export, import, and replay fixtures.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreSnapshot {
    /// Snapshot schema version.
    pub version: SnapshotVersion,
    /// Register file contents.
    pub registers: RegisterFile,
    /// Memory contents.
    pub memory: Memory,
    /// Execution counters.
    pub stats: Stats,
}

/// Deterministic trace events, emitted in commit order after each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// Instruction word latched by the control unit.
    InstructionFetched {
        /// Fetch address.
        ip: u16,
        /// Raw instruction word.
        word: u16,
    },
    /// Committed register write, one per register the step wrote,
    /// including the instruction pointer.
    RegisterWrite {
        /// Destination register.
        reg: RegisterId,
        /// Register value after the write.
        value: u16,
        /// Byte lanes written.
        mask: WriteMask,
    },
    /// Committed memory write.
    MemoryWrite {
        /// Word index.
        index: usize,
        /// Word value after the write.
        value: u16,
        /// Byte lanes written.
        mask: WriteMask,
    },
    /// Instruction retired.
    InstructionRetired {
        /// Fetch address of the retired instruction.
        ip: u16,
        /// Reference cycle cost.
        cycles: u16,
    },
    /// Step aborted with a fault; nothing was committed.
    FaultRaised {
        /// Raised fault.
        fault: Fault,
    },
}

/// Sink trait for deterministic trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn on_event(&mut self, _event: TraceEvent) {}
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CoreConfig, IsaProfile, NullTrace, SnapshotVersion, Stats, TraceEvent, TraceSink,
    };
    use crate::memory::DEFAULT_MEMORY_WORDS;
    use crate::Fault;

    #[test]
    fn default_core_config_matches_reference_machine() {
        let config = CoreConfig::default();

        assert_eq!(config.memory_words, DEFAULT_MEMORY_WORDS);
        assert_eq!(config.profile, IsaProfile::Full);
    }

    #[test]
    fn snapshot_version_roundtrip_is_stable() {
        assert_eq!(SnapshotVersion::from_u16(1), Some(SnapshotVersion::V1));
        assert_eq!(SnapshotVersion::from_u16(2), None);
    }

    #[test]
    fn average_cpi_needs_a_retired_instruction() {
        assert_eq!(Stats::default().average_cpi(), None);

        let stats = Stats {
            instructions: 4,
            cycles: 10,
        };
        assert_eq!(stats.average_cpi(), Some(2.5));
    }

    #[test]
    fn vec_sink_records_in_order_and_null_sink_discards() {
        let first = TraceEvent::InstructionRetired { ip: 0, cycles: 2 };
        let second = TraceEvent::FaultRaised {
            fault: Fault::MisalignedFetch { ip: 1 },
        };

        let mut events = Vec::new();
        events.on_event(first);
        events.on_event(second);
        assert_eq!(events, vec![first, second]);

        NullTrace.on_event(first);
    }
}
