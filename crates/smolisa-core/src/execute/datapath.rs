//! Datapath muxes: resolves one [`ControlBus`] against the current state.
//!
//! Nothing here mutates state. Each cycle returns the writes it would commit
//! so the caller can stage them and keep steps precise.

use crate::alu::{Alu, AluOutput};
use crate::bus::{AluDataSrc, ControlBus, MemAddrSrc, MemDataSrc, RegAddrSrc, RegDataSrc, WriteMask};
use crate::encoding::InstructionWord;
use crate::memory::word_index;
use crate::state::{RegisterFile, RegisterId};
use crate::{Fault, Memory};

/// Register write produced by one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterWrite {
    /// Destination register.
    pub reg: RegisterId,
    /// Write data before masking.
    pub data: u16,
    /// Byte lanes written.
    pub mask: WriteMask,
}

/// Memory write produced by one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryWrite {
    /// Word index.
    pub index: usize,
    /// Write data before masking.
    pub data: u16,
    /// Byte lanes written.
    pub mask: WriteMask,
}

/// Combinational outputs of one datapath cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CycleEffects {
    /// ALU result lines.
    pub alu: AluOutput,
    /// Memory read data; zero when the bus does not sample memory.
    pub mem_rdata: u16,
    /// Pending register write, if enabled.
    pub reg_write: Option<RegisterWrite>,
    /// Pending memory write, if enabled.
    pub mem_write: Option<MemoryWrite>,
}

/// Register address mux.
#[must_use]
pub const fn resolve_reg_addr(word: InstructionWord, src: RegAddrSrc) -> RegisterId {
    match src {
        RegAddrSrc::R1 => word.r1(),
        RegAddrSrc::R2 => word.r2(),
        RegAddrSrc::R3 => word.r3(),
        RegAddrSrc::RefIp => RegisterId::Ip,
    }
}

/// ALU operand mux.
#[must_use]
pub const fn resolve_alu_src(src: AluDataSrc, rip: u16, rdata1: u16, rdata2: u16) -> u16 {
    match src {
        AluDataSrc::Ip => rip,
        AluDataSrc::Reg1 => rdata1,
        AluDataSrc::Reg2 => rdata2,
        AluDataSrc::Two => 2,
    }
}

/// Drives one cycle of the datapath.
///
/// Reads observe `regs` and `memory` as given; the returned writes have not
/// been applied.
///
/// # Errors
///
/// Returns [`Fault::OutOfBoundsAddress`] when the bus drives the memory port
/// with an address past the end of memory.
pub fn drive(
    bus: &ControlBus,
    word: InstructionWord,
    regs: &RegisterFile,
    memory: &Memory,
) -> Result<CycleEffects, Fault> {
    let rip = regs.rip();
    let (rdata1, rdata2) = regs.read(
        resolve_reg_addr(word, bus.reg_addr1_src),
        resolve_reg_addr(word, bus.reg_addr2_src),
    );

    let alu = Alu::compute(
        bus.alu_op,
        resolve_alu_src(bus.alu_a_src, rip, rdata1, rdata2),
        resolve_alu_src(bus.alu_b_src, rip, rdata1, rdata2),
    );

    let mem_addr = match bus.mem_addr_src {
        MemAddrSrc::Ip => rip,
        MemAddrSrc::Reg1 => rdata1,
    };
    let mem_index = word_index(mem_addr);
    let mem_rdata = if bus.touches_memory() {
        memory.read(mem_index)?
    } else {
        0
    };

    let reg_write = bus.reg_we.then(|| {
        let imm8 = u16::from(word.imm8());
        let data = match bus.reg_data_src {
            RegDataSrc::Imm8Low => imm8,
            RegDataSrc::Imm8High => imm8 << 8,
            RegDataSrc::Mem8 => mem_rdata & 0x00FF,
            RegDataSrc::Mem16 => mem_rdata,
            RegDataSrc::Alu => alu.result,
        };
        RegisterWrite {
            reg: resolve_reg_addr(word, bus.reg_waddr_src),
            data,
            mask: bus.reg_mask(),
        }
    });

    let mem_write = bus.mem_we.then(|| MemoryWrite {
        index: mem_index,
        data: match bus.mem_data_src {
            MemDataSrc::Ip => rip,
            MemDataSrc::Reg2 => rdata2,
        },
        mask: bus.mem_mask(),
    });

    Ok(CycleEffects {
        alu,
        mem_rdata,
        reg_write,
        mem_write,
    })
}

#[cfg(test)]
mod tests {
    use super::{drive, resolve_alu_src, resolve_reg_addr, MemoryWrite, RegisterWrite};
    use crate::bus::{AluDataSrc, RegAddrSrc, WriteMask};
    use crate::control::{decode_bus, MicroOp, FETCH_BUS};
    use crate::encoding::{encode_immediate, encode_register, InstructionWord, Opcode};
    use crate::state::{RegisterFile, RegisterId};
    use crate::{Fault, Memory};

    #[test]
    fn register_address_mux_selects_fields_and_fixed_ip() {
        let word = InstructionWord(encode_register(
            Opcode::Add,
            RegisterId::G1,
            RegisterId::G2,
            RegisterId::G3,
        ));
        assert_eq!(resolve_reg_addr(word, RegAddrSrc::R1), RegisterId::G1);
        assert_eq!(resolve_reg_addr(word, RegAddrSrc::R2), RegisterId::G2);
        assert_eq!(resolve_reg_addr(word, RegAddrSrc::R3), RegisterId::G3);
        assert_eq!(resolve_reg_addr(word, RegAddrSrc::RefIp), RegisterId::Ip);
    }

    #[test]
    fn alu_operand_mux_includes_constant_two() {
        assert_eq!(resolve_alu_src(AluDataSrc::Ip, 10, 20, 30), 10);
        assert_eq!(resolve_alu_src(AluDataSrc::Reg1, 10, 20, 30), 20);
        assert_eq!(resolve_alu_src(AluDataSrc::Reg2, 10, 20, 30), 30);
        assert_eq!(resolve_alu_src(AluDataSrc::Two, 10, 20, 30), 2);
    }

    #[test]
    fn fetch_cycle_reads_word_at_ip_and_proposes_ip_plus_two() {
        let mut memory = Memory::default();
        memory.load_image(&[0x1111, 0x2222]).expect("image fits");
        let mut regs = RegisterFile::default();
        regs.write(RegisterId::Ip, 2, WriteMask::Both);

        let effects = drive(&FETCH_BUS, InstructionWord::default(), &regs, &memory)
            .expect("in-range fetch");

        assert_eq!(effects.mem_rdata, 0x2222);
        assert_eq!(
            effects.reg_write,
            Some(RegisterWrite {
                reg: RegisterId::Ip,
                data: 4,
                mask: WriteMask::Both
            })
        );
        assert_eq!(effects.mem_write, None);
    }

    #[test]
    fn store_word_addresses_memory_through_reg1() {
        let memory = Memory::default();
        let mut regs = RegisterFile::default();
        regs.write(RegisterId::G4, 0x0010, WriteMask::Both);
        regs.write(RegisterId::G5, 0xBEEF, WriteMask::Both);
        let word = InstructionWord(encode_register(
            Opcode::Sw,
            RegisterId::G4,
            RegisterId::G5,
            RegisterId::G0,
        ));

        let effects = drive(
            &decode_bus(Opcode::Sw, MicroOp::Execute, false),
            word,
            &regs,
            &memory,
        )
        .expect("in-range store");

        assert_eq!(
            effects.mem_write,
            Some(MemoryWrite {
                index: 8,
                data: 0xBEEF,
                mask: WriteMask::Both
            })
        );
        assert_eq!(effects.reg_write, None);
    }

    #[test]
    fn out_of_range_register_address_faults() {
        let memory = Memory::default();
        let mut regs = RegisterFile::default();
        regs.write(RegisterId::G1, 0x0800, WriteMask::Both);
        let word = InstructionWord(encode_register(
            Opcode::Lw,
            RegisterId::G1,
            RegisterId::G2,
            RegisterId::G0,
        ));

        let result = drive(
            &decode_bus(Opcode::Lw, MicroOp::Execute, false),
            word,
            &regs,
            &memory,
        );

        assert_eq!(
            result,
            Err(Fault::OutOfBoundsAddress {
                index: 1024,
                capacity: 1024
            })
        );
    }

    #[test]
    fn immediate_forms_route_imm8_into_selected_lane() {
        let memory = Memory::default();
        let regs = RegisterFile::default();
        let word = InstructionWord(encode_immediate(Opcode::Liu, RegisterId::G7, 0xA5));

        let effects = drive(
            &decode_bus(Opcode::Liu, MicroOp::Execute, false),
            word,
            &regs,
            &memory,
        )
        .expect("no memory access");

        assert_eq!(
            effects.reg_write,
            Some(RegisterWrite {
                reg: RegisterId::G7,
                data: 0xA500,
                mask: WriteMask::High
            })
        );
    }
}
