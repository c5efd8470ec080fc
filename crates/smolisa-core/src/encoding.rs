use crate::api::IsaProfile;
use crate::state::RegisterId;

/// Mask selecting the opcode nibble (bits 0..4).
pub const OPCODE_MASK: u16 = 0x000F;
/// Bit offset of the `R1` register field.
pub const R1_SHIFT: u16 = 4;
/// Bit offset of the `R2` register field.
pub const R2_SHIFT: u16 = 8;
/// Bit offset of the `R3` register field.
pub const R3_SHIFT: u16 = 12;
/// Bit offset of the 8-bit immediate, aliasing `R2`/`R3`.
pub const IMM8_SHIFT: u16 = 8;

/// Operand layout of an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionFormat {
    /// `R1` plus an 8-bit immediate in bits 8..16.
    Immediate,
    /// Three register-index fields.
    Register,
}

/// Assigned opcode nibbles of the smolisa instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Opcode {
    Li = 0x0,
    Liu = 0x1,
    Lb = 0x2,
    Sb = 0x3,
    Lw = 0x4,
    Sw = 0x5,
    Lrz = 0x6,
    Lrnz = 0x7,
    Add = 0x8,
    Sub = 0x9,
    And = 0xA,
    Or = 0xB,
    Xor = 0xC,
    Shl = 0xD,
    Shr = 0xE,
    Swb = 0xF,
}

/// Single source-of-truth opcode table for [`IsaProfile::Full`].
pub const OPCODE_TABLE: &[(u8, Opcode)] = &[
    (0x0, Opcode::Li),
    (0x1, Opcode::Liu),
    (0x2, Opcode::Lb),
    (0x3, Opcode::Sb),
    (0x4, Opcode::Lw),
    (0x5, Opcode::Sw),
    (0x6, Opcode::Lrz),
    (0x7, Opcode::Lrnz),
    (0x8, Opcode::Add),
    (0x9, Opcode::Sub),
    (0xA, Opcode::And),
    (0xB, Opcode::Or),
    (0xC, Opcode::Xor),
    (0xD, Opcode::Shl),
    (0xE, Opcode::Shr),
    (0xF, Opcode::Swb),
];

impl Opcode {
    /// Returns the 4-bit encoding of this opcode.
    #[must_use]
    pub const fn nibble(self) -> u8 {
        self as u8
    }

    /// Assembly mnemonic, lowercase.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Li => "li",
            Self::Liu => "liu",
            Self::Lb => "lb",
            Self::Sb => "sb",
            Self::Lw => "lw",
            Self::Sw => "sw",
            Self::Lrz => "lrz",
            Self::Lrnz => "lrnz",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Shl => "shl",
            Self::Shr => "shr",
            Self::Swb => "swb",
        }
    }

    /// Operand layout used by this opcode.
    #[must_use]
    pub const fn format(self) -> InstructionFormat {
        match self {
            Self::Li | Self::Liu => InstructionFormat::Immediate,
            _ => InstructionFormat::Register,
        }
    }
}

/// Resolves an opcode nibble under the given dispatch profile.
///
/// [`IsaProfile::Datapath`] only admits the two opcodes the hardware
/// datapath exercises (`LI`, `OR`); anything else is unassigned.
#[must_use]
pub fn classify_opcode(nibble: u8, profile: IsaProfile) -> Option<Opcode> {
    let opcode = OPCODE_TABLE
        .iter()
        .find_map(|(entry, opcode)| (*entry == nibble).then_some(*opcode))?;

    match profile {
        IsaProfile::Full => Some(opcode),
        IsaProfile::Datapath => matches!(opcode, Opcode::Li | Opcode::Or).then_some(opcode),
    }
}

/// Raw 16-bit instruction word with field accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct InstructionWord(pub u16);

impl InstructionWord {
    /// Opcode nibble, bits 0..4.
    #[must_use]
    pub const fn opcode_nibble(self) -> u8 {
        (self.0 & OPCODE_MASK) as u8
    }

    /// `R1` register field, bits 4..8.
    #[must_use]
    pub const fn r1(self) -> RegisterId {
        RegisterId::from_nibble((self.0 >> R1_SHIFT) as u8)
    }

    /// `R2` register field, bits 8..12.
    #[must_use]
    pub const fn r2(self) -> RegisterId {
        RegisterId::from_nibble((self.0 >> R2_SHIFT) as u8)
    }

    /// `R3` register field, bits 12..16.
    #[must_use]
    pub const fn r3(self) -> RegisterId {
        RegisterId::from_nibble((self.0 >> R3_SHIFT) as u8)
    }

    /// 8-bit immediate, bits 8..16.
    #[must_use]
    pub const fn imm8(self) -> u8 {
        (self.0 >> IMM8_SHIFT) as u8
    }
}

/// Encodes a register-format instruction.
#[must_use]
pub const fn encode_register(op: Opcode, r1: RegisterId, r2: RegisterId, r3: RegisterId) -> u16 {
    (op.nibble() as u16)
        | ((r1.index() as u16) << R1_SHIFT)
        | ((r2.index() as u16) << R2_SHIFT)
        | ((r3.index() as u16) << R3_SHIFT)
}

/// Encodes an immediate-format instruction.
#[must_use]
pub const fn encode_immediate(op: Opcode, r1: RegisterId, imm8: u8) -> u16 {
    (op.nibble() as u16) | ((r1.index() as u16) << R1_SHIFT) | ((imm8 as u16) << IMM8_SHIFT)
}
