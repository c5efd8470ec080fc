use thiserror::Error;

/// Fault classes used for diagnostics aggregation and policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// The control unit could not decode the fetched word.
    Decode,
    /// Fetch alignment or data address violation.
    Memory,
    /// Host-side program image rejected before any stepping.
    Load,
}

/// Hard simulation faults.
///
/// Every fault is local and terminal for the step that raised it: the step
/// commits nothing, and the core latches the fault until `reset` or `load`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// Decode dispatch has no entry for the fetched opcode nibble.
    #[error("unknown opcode {opcode:#03x} at ip {ip:#06x}")]
    UnknownOpcode {
        /// Opcode nibble of the fetched word.
        opcode: u8,
        /// Instruction pointer the word was fetched from.
        ip: u16,
    },
    /// A memory word index fell outside the configured capacity.
    #[error("memory word index {index} is outside capacity {capacity}")]
    OutOfBoundsAddress {
        /// Offending word index.
        index: usize,
        /// Memory capacity in words.
        capacity: usize,
    },
    /// Program image is larger than memory.
    #[error("program image of {len} words exceeds memory capacity {capacity}")]
    ImageTooLarge {
        /// Image length in words.
        len: usize,
        /// Memory capacity in words.
        capacity: usize,
    },
    /// Instruction fetch from an odd byte address.
    #[error("instruction pointer {ip:#06x} is not word aligned")]
    MisalignedFetch {
        /// Offending instruction pointer.
        ip: u16,
    },
}

impl Fault {
    /// Returns the diagnostics fault class for this fault.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::UnknownOpcode { .. } => FaultClass::Decode,
            Self::OutOfBoundsAddress { .. } | Self::MisalignedFetch { .. } => FaultClass::Memory,
            Self::ImageTooLarge { .. } => FaultClass::Load,
        }
    }
}
