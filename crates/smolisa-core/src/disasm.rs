//! Instruction disassembly and register dumps for trace consumers.

use crate::api::IsaProfile;
use crate::encoding::{classify_opcode, InstructionWord, Opcode};
use crate::memory::word_index;
use crate::{Memory, RegisterFile, RegisterId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Byte address of the instruction.
    pub addr: u16,
    /// Raw instruction word.
    pub word: u16,
    /// Mnemonic, or `.word` for undecodable words.
    pub mnemonic: String,
    /// Formatted operands.
    pub operands: String,
    /// Whether the opcode is unassigned under the active profile.
    pub is_illegal: bool,
}

impl DisassemblyRow {
    /// Decodes one word at `addr`.
    #[must_use]
    pub fn decode(addr: u16, word: u16, profile: IsaProfile) -> Self {
        let instr = InstructionWord(word);
        match classify_opcode(instr.opcode_nibble(), profile) {
            Some(opcode) => Self {
                addr,
                word,
                mnemonic: opcode.mnemonic().to_string(),
                operands: format_operands(opcode, instr),
                is_illegal: false,
            },
            None => Self {
                addr,
                word,
                mnemonic: ".word".to_string(),
                operands: format!("{word:#06x} ; illegal"),
                is_illegal: true,
            },
        }
    }

    /// `mnemonic operands` as a single line.
    #[must_use]
    pub fn text(&self) -> String {
        format!("{} {}", self.mnemonic, self.operands)
    }
}

/// Disassembles one instruction word.
#[must_use]
pub fn disassemble(word: u16, profile: IsaProfile) -> String {
    DisassemblyRow::decode(0, word, profile).text()
}

/// Disassembles up to `count` instructions starting at byte address `start`.
///
/// Rows stop early at the end of memory.
#[must_use]
pub fn disassemble_window(
    start: u16,
    count: usize,
    memory: &Memory,
    profile: IsaProfile,
) -> Vec<DisassemblyRow> {
    let start = start & !1;
    (0..count)
        .map_while(|slot| {
            let addr = u16::try_from(slot * 2).ok()?.checked_add(start)?;
            let word = memory.read(word_index(addr)).ok()?;
            Some(DisassemblyRow::decode(addr, word, profile))
        })
        .collect()
}

fn format_operands(opcode: Opcode, instr: InstructionWord) -> String {
    let (r1, r2, r3) = (instr.r1().name(), instr.r2().name(), instr.r3().name());
    match opcode {
        Opcode::Li | Opcode::Liu => format!("{r1}, {:#04x}", instr.imm8()),
        Opcode::Lb | Opcode::Lw => format!("{r2}, [{r1}]"),
        Opcode::Sb | Opcode::Sw => format!("[{r1}], {r2}"),
        Opcode::Lrz
        | Opcode::Lrnz
        | Opcode::Add
        | Opcode::Sub
        | Opcode::And
        | Opcode::Or
        | Opcode::Xor
        | Opcode::Shl
        | Opcode::Shr
        | Opcode::Swb => format!("{r1}, {r2}, {r3}"),
    }
}

/// Layout of a register dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DumpStyle {
    /// Tab-separated, one line, suitable for per-step traces.
    #[default]
    Oneline,
    /// One register per line with a heading.
    Multiline,
}

/// Formats every register and the latched instruction.
#[must_use]
pub fn debug_state(
    registers: &RegisterFile,
    current: Option<InstructionWord>,
    profile: IsaProfile,
    style: DumpStyle,
) -> String {
    let separator = match style {
        DumpStyle::Oneline => "\t\t",
        DumpStyle::Multiline => "\n",
    };

    let mut ret = String::new();
    if style == DumpStyle::Multiline {
        ret.push_str("\nRegister dump:\n");
    }

    for reg in RegisterId::ALL {
        ret.push_str(&format!(
            "${:<4}: {:#06x}{separator}",
            reg.name(),
            registers.get(reg)
        ));
    }

    match current {
        Some(word) => ret.push_str(&format!(
            "opcode: {:#06x} ({}){separator}",
            word.0,
            disassemble(word.0, profile)
        )),
        None => ret.push_str(&format!("opcode: none{separator}")),
    }

    ret
}
