//! Control unit: instruction latch and micro-cycle sequencer.
//!
//! Every instruction runs as a fetch micro-cycle followed by the opcode's
//! execute micro-program. Each micro-cycle is fully described by the
//! [`ControlBus`] this module computes for it.

use crate::alu::{AluOp, AluOutput};
use crate::api::IsaProfile;
use crate::bus::{AluDataSrc, ControlBus, MemAddrSrc, MemDataSrc, RegAddrSrc, RegDataSrc};
use crate::encoding::{classify_opcode, InstructionWord, Opcode};
use crate::Fault;

/// One datapath cycle within an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MicroOp {
    /// Read the word at `IP` and advance `IP` by 2 through the ALU.
    Fetch,
    /// Single-cycle execute of the latched instruction.
    Execute,
    /// Route the condition register through the ALU and latch its zero flag.
    TestCondition,
    /// Move the source register into the destination if the latched
    /// condition holds.
    ConditionalMove,
}

const SINGLE_CYCLE: &[MicroOp] = &[MicroOp::Execute];
const CONDITIONAL_MOVE: &[MicroOp] = &[MicroOp::TestCondition, MicroOp::ConditionalMove];

/// Execute micro-program for an opcode (the fetch cycle is implicit).
#[must_use]
pub const fn micro_program(opcode: Opcode) -> &'static [MicroOp] {
    match opcode {
        Opcode::Lrz | Opcode::Lrnz => CONDITIONAL_MOVE,
        _ => SINGLE_CYCLE,
    }
}

/// Bus for the fetch micro-cycle: `IP <- ALU(IP, 2, ADD)`.
pub const FETCH_BUS: ControlBus = ControlBus {
    reg_we: true,
    reg_waddr_src: RegAddrSrc::RefIp,
    reg_data_src: RegDataSrc::Alu,
    mem_addr_src: MemAddrSrc::Ip,
    mem_read: true,
    alu_op: AluOp::Add,
    alu_a_src: AluDataSrc::Ip,
    alu_b_src: AluDataSrc::Two,
    ..ControlBus::IDLE
};

/// Decode dispatch table: bus for one execute micro-cycle of `opcode`.
///
/// `zero_latch` is the ALU zero flag sampled by a preceding
/// [`MicroOp::TestCondition`] cycle.
#[must_use]
pub const fn decode_bus(opcode: Opcode, micro_op: MicroOp, zero_latch: bool) -> ControlBus {
    match micro_op {
        MicroOp::Fetch => FETCH_BUS,
        MicroOp::TestCondition => ControlBus {
            reg_addr1_src: RegAddrSrc::R3,
            alu_op: AluOp::Or,
            alu_a_src: AluDataSrc::Reg1,
            alu_b_src: AluDataSrc::Reg1,
            ..ControlBus::IDLE
        },
        MicroOp::ConditionalMove => ControlBus {
            reg_we: match opcode {
                Opcode::Lrz => zero_latch,
                Opcode::Lrnz => !zero_latch,
                _ => false,
            },
            reg_waddr_src: RegAddrSrc::R1,
            reg_data_src: RegDataSrc::Alu,
            reg_addr1_src: RegAddrSrc::R2,
            alu_op: AluOp::Or,
            alu_a_src: AluDataSrc::Reg1,
            alu_b_src: AluDataSrc::Reg1,
            ..ControlBus::IDLE
        },
        MicroOp::Execute => execute_bus(opcode),
    }
}

const fn execute_bus(opcode: Opcode) -> ControlBus {
    match opcode {
        Opcode::Li | Opcode::Liu => ControlBus {
            reg_we: true,
            reg_waddr_src: RegAddrSrc::R1,
            reg_data_src: if matches!(opcode, Opcode::Li) {
                RegDataSrc::Imm8Low
            } else {
                RegDataSrc::Imm8High
            },
            ..ControlBus::IDLE
        },
        Opcode::Lb | Opcode::Lw => ControlBus {
            reg_we: true,
            reg_waddr_src: RegAddrSrc::R2,
            reg_data_src: if matches!(opcode, Opcode::Lb) {
                RegDataSrc::Mem8
            } else {
                RegDataSrc::Mem16
            },
            reg_addr1_src: RegAddrSrc::R1,
            mem_addr_src: MemAddrSrc::Reg1,
            mem_read: true,
            ..ControlBus::IDLE
        },
        Opcode::Sb | Opcode::Sw => ControlBus {
            reg_addr1_src: RegAddrSrc::R1,
            reg_addr2_src: RegAddrSrc::R2,
            mem_we: true,
            mem_half_write: matches!(opcode, Opcode::Sb),
            mem_addr_src: MemAddrSrc::Reg1,
            mem_data_src: MemDataSrc::Reg2,
            ..ControlBus::IDLE
        },
        // Conditional moves are sequenced through their own micro-ops.
        Opcode::Lrz | Opcode::Lrnz => ControlBus::IDLE,
        Opcode::Add => register_alu_bus(AluOp::Add),
        Opcode::Sub => register_alu_bus(AluOp::Sub),
        Opcode::And => register_alu_bus(AluOp::And),
        Opcode::Or => register_alu_bus(AluOp::Or),
        Opcode::Xor => register_alu_bus(AluOp::Xor),
        Opcode::Shl => register_alu_bus(AluOp::Shl),
        Opcode::Shr => register_alu_bus(AluOp::Shr),
        Opcode::Swb => register_alu_bus(AluOp::Swb),
    }
}

/// `R1 <- ALU(R2, R3)`.
const fn register_alu_bus(op: AluOp) -> ControlBus {
    ControlBus {
        reg_we: true,
        reg_waddr_src: RegAddrSrc::R1,
        reg_data_src: RegDataSrc::Alu,
        reg_addr1_src: RegAddrSrc::R2,
        reg_addr2_src: RegAddrSrc::R3,
        alu_op: op,
        alu_a_src: AluDataSrc::Reg1,
        alu_b_src: AluDataSrc::Reg2,
        ..ControlBus::IDLE
    }
}

/// Sequencer state: the latched instruction and the condition latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlUnit {
    instruction: Option<InstructionWord>,
    opcode: Option<Opcode>,
    zero_latch: bool,
}

impl ControlUnit {
    /// Creates an empty control unit with nothing latched.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            instruction: None,
            opcode: None,
            zero_latch: false,
        }
    }

    /// Clears the instruction latch and condition latch.
    pub const fn reset(&mut self) {
        *self = Self::new();
    }

    /// Latches a fetched word and decodes its opcode.
    ///
    /// The word stays latched even when decode fails, for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::UnknownOpcode`] when `profile` has no entry for the
    /// word's opcode nibble.
    pub fn latch(&mut self, word: u16, ip: u16, profile: IsaProfile) -> Result<Opcode, Fault> {
        let word = InstructionWord(word);
        self.instruction = Some(word);
        self.zero_latch = false;
        self.opcode = classify_opcode(word.opcode_nibble(), profile);

        self.opcode.ok_or(Fault::UnknownOpcode {
            opcode: word.opcode_nibble(),
            ip,
        })
    }

    /// Bus for `micro_op` of the latched instruction.
    #[must_use]
    pub const fn bus(&self, micro_op: MicroOp) -> ControlBus {
        match (micro_op, self.opcode) {
            (MicroOp::Fetch, _) => FETCH_BUS,
            (_, Some(opcode)) => decode_bus(opcode, micro_op, self.zero_latch),
            (_, None) => ControlBus::IDLE,
        }
    }

    /// Samples datapath feedback at the end of a micro-cycle.
    pub const fn observe(&mut self, micro_op: MicroOp, alu: AluOutput) {
        if matches!(micro_op, MicroOp::TestCondition) {
            self.zero_latch = alu.zero;
        }
    }

    /// Most recently latched instruction word.
    #[must_use]
    pub const fn current_instruction(&self) -> Option<InstructionWord> {
        self.instruction
    }

    /// Opcode of the latched word, `None` if nothing is latched or it failed
    /// to decode.
    #[must_use]
    pub const fn current_opcode(&self) -> Option<Opcode> {
        self.opcode
    }
}
