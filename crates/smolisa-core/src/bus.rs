//! Per-cycle control signals linking the control unit to the datapath.
//!
//! A [`ControlBus`] is a plain value computed from the latched instruction
//! and the sequencer phase. It is never stored as shared state; the datapath
//! consumes it and produces the writes to commit.

use crate::alu::AluOp;

/// Source of a register-file address port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegAddrSrc {
    /// Instruction bits 4..8.
    R1,
    /// Instruction bits 8..12.
    R2,
    /// Instruction bits 12..16.
    R3,
    /// Fixed index 14, the instruction pointer.
    RefIp,
}

/// Source of the register write data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegDataSrc {
    /// `imm8` into the low byte.
    Imm8Low,
    /// `imm8` into the high byte.
    Imm8High,
    /// Low byte of the memory read data into the low byte.
    Mem8,
    /// Full memory read word.
    Mem16,
    /// Full ALU result.
    Alu,
}

/// Source of an ALU operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluDataSrc {
    /// Current instruction pointer.
    Ip,
    /// First register read port.
    Reg1,
    /// Second register read port.
    Reg2,
    /// Constant 2, one instruction word in bytes.
    Two,
}

/// Source of the memory address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemAddrSrc {
    /// Current instruction pointer.
    Ip,
    /// First register read port.
    Reg1,
}

/// Source of the memory write data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemDataSrc {
    /// Current instruction pointer.
    Ip,
    /// Second register read port.
    Reg2,
}

/// 2-bit byte-lane write mask shared by the register file and memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum WriteMask {
    /// No lanes; the write is a no-op.
    #[default]
    None,
    /// Bits 0..8 only.
    Low,
    /// Bits 8..16 only.
    High,
    /// Whole word.
    Both,
}

impl WriteMask {
    /// Decodes the 2-bit hardware mask (`0b01` low, `0b10` high).
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::None,
            0b01 => Self::Low,
            0b10 => Self::High,
            _ => Self::Both,
        }
    }

    /// Returns the 2-bit hardware encoding.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::None => 0b00,
            Self::Low => 0b01,
            Self::High => 0b10,
            Self::Both => 0b11,
        }
    }

    /// Bit mask of the lanes this write affects.
    #[must_use]
    pub const fn lanes(self) -> u16 {
        match self {
            Self::None => 0x0000,
            Self::Low => 0x00FF,
            Self::High => 0xFF00,
            Self::Both => 0xFFFF,
        }
    }

    /// Lanes written by either mask.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self::from_bits(self.bits() | other.bits())
    }

    /// Merges `data` into `old`, preserving untouched lanes.
    #[must_use]
    pub const fn apply(self, old: u16, data: u16) -> u16 {
        let lanes = self.lanes();
        (old & !lanes) | (data & lanes)
    }
}

/// Snapshot of every routing decision for one datapath cycle.
///
/// The ALU zero flag is an output of the cycle, not a routing decision; it
/// comes back in [`AluOutput::zero`](crate::alu::AluOutput) through
/// `CycleEffects::alu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlBus {
    /// Register write enable.
    pub reg_we: bool,
    /// Register write address source.
    pub reg_waddr_src: RegAddrSrc,
    /// Register write data source.
    pub reg_data_src: RegDataSrc,
    /// First read port address source.
    pub reg_addr1_src: RegAddrSrc,
    /// Second read port address source.
    pub reg_addr2_src: RegAddrSrc,
    /// Memory write enable.
    pub mem_we: bool,
    /// Restricts an enabled memory write to the low byte.
    pub mem_half_write: bool,
    /// Memory address source.
    pub mem_addr_src: MemAddrSrc,
    /// Memory write data source.
    pub mem_data_src: MemDataSrc,
    /// Whether this cycle samples the memory read port.
    pub mem_read: bool,
    /// ALU operation.
    pub alu_op: AluOp,
    /// ALU operand A source.
    pub alu_a_src: AluDataSrc,
    /// ALU operand B source.
    pub alu_b_src: AluDataSrc,
}

impl ControlBus {
    /// Bus with every enable deasserted and don't-care selectors at rest.
    pub const IDLE: Self = Self {
        reg_we: false,
        reg_waddr_src: RegAddrSrc::R1,
        reg_data_src: RegDataSrc::Alu,
        reg_addr1_src: RegAddrSrc::R1,
        reg_addr2_src: RegAddrSrc::R2,
        mem_we: false,
        mem_half_write: false,
        mem_addr_src: MemAddrSrc::Ip,
        mem_data_src: MemDataSrc::Reg2,
        mem_read: false,
        alu_op: AluOp::Add,
        alu_a_src: AluDataSrc::Reg1,
        alu_b_src: AluDataSrc::Reg2,
    };

    /// Memory write mask: none when disabled, low byte on half writes.
    #[must_use]
    pub const fn mem_mask(&self) -> WriteMask {
        if !self.mem_we {
            WriteMask::None
        } else if self.mem_half_write {
            WriteMask::Low
        } else {
            WriteMask::Both
        }
    }

    /// Register write mask implied by the data source.
    #[must_use]
    pub const fn reg_mask(&self) -> WriteMask {
        if !self.reg_we {
            return WriteMask::None;
        }

        match self.reg_data_src {
            RegDataSrc::Imm8Low | RegDataSrc::Mem8 => WriteMask::Low,
            RegDataSrc::Imm8High => WriteMask::High,
            RegDataSrc::Mem16 | RegDataSrc::Alu => WriteMask::Both,
        }
    }

    /// Returns `true` when the cycle drives the memory address port.
    #[must_use]
    pub const fn touches_memory(&self) -> bool {
        self.mem_read || self.mem_we
    }
}

impl Default for ControlBus {
    fn default() -> Self {
        Self::IDLE
    }
}
