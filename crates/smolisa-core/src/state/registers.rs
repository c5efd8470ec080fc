use crate::bus::WriteMask;

/// Number of addressable registers (4-bit address space).
pub const REGISTER_COUNT: usize = 16;
/// Register index hard-wired as the instruction pointer.
pub const IP_INDEX: usize = 14;

/// Register identifier decoded from a 4-bit field.
///
/// `G0..G13` are general-purpose, `Ip` is the instruction pointer and `G15`
/// is reserved by the architecture but behaves as general-purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum RegisterId {
    G0 = 0,
    G1 = 1,
    G2 = 2,
    G3 = 3,
    G4 = 4,
    G5 = 5,
    G6 = 6,
    G7 = 7,
    G8 = 8,
    G9 = 9,
    G10 = 10,
    G11 = 11,
    G12 = 12,
    G13 = 13,
    Ip = 14,
    G15 = 15,
}

impl RegisterId {
    /// Ordered list of all registers.
    pub const ALL: [Self; REGISTER_COUNT] = [
        Self::G0,
        Self::G1,
        Self::G2,
        Self::G3,
        Self::G4,
        Self::G5,
        Self::G6,
        Self::G7,
        Self::G8,
        Self::G9,
        Self::G10,
        Self::G11,
        Self::G12,
        Self::G13,
        Self::Ip,
        Self::G15,
    ];

    /// Returns the array index for this register (`0..=15`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decodes the low four bits of `bits`. Every nibble names a register.
    #[must_use]
    pub const fn from_nibble(bits: u8) -> Self {
        Self::ALL[(bits & 0xF) as usize]
    }

    /// Assembly name (`g0`..`g13`, `ip`, `g15`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        const NAMES: [&str; REGISTER_COUNT] = [
            "g0", "g1", "g2", "g3", "g4", "g5", "g6", "g7", "g8", "g9", "g10", "g11", "g12", "g13",
            "ip", "g15",
        ];
        NAMES[self.index()]
    }
}

/// Sixteen 16-bit registers with two read ports and one masked write port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    cells: [u16; REGISTER_COUNT],
}

impl RegisterFile {
    /// Reads both ports combinationally.
    #[must_use]
    pub const fn read(&self, addr1: RegisterId, addr2: RegisterId) -> (u16, u16) {
        (self.cells[addr1.index()], self.cells[addr2.index()])
    }

    /// Reads a single register.
    #[must_use]
    pub const fn get(&self, reg: RegisterId) -> u16 {
        self.cells[reg.index()]
    }

    /// Instruction pointer alias (register 14).
    #[must_use]
    pub const fn rip(&self) -> u16 {
        self.cells[IP_INDEX]
    }

    /// Masked write; untouched byte lanes keep their value.
    pub const fn write(&mut self, addr: RegisterId, data: u16, mask: WriteMask) {
        let cell = &mut self.cells[addr.index()];
        *cell = mask.apply(*cell, data);
    }

    /// All register values in index order.
    #[must_use]
    pub const fn as_array(&self) -> &[u16; REGISTER_COUNT] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::{RegisterFile, RegisterId, IP_INDEX, REGISTER_COUNT};
    use crate::bus::WriteMask;

    #[test]
    fn register_count_and_decode_match_architecture() {
        assert_eq!(REGISTER_COUNT, 16);
        assert_eq!(RegisterId::Ip.index(), IP_INDEX);

        for bits in 0_u8..16 {
            assert_eq!(RegisterId::from_nibble(bits).index(), usize::from(bits));
        }
        assert_eq!(RegisterId::from_nibble(0x1E), RegisterId::Ip);
    }

    #[test]
    fn register_file_tracks_each_register_independently() {
        let mut regs = RegisterFile::default();

        for (offset, reg) in (0_u16..).zip(RegisterId::ALL) {
            regs.write(reg, 0x1000 + offset, WriteMask::Both);
        }

        for (offset, reg) in (0_u16..).zip(RegisterId::ALL) {
            assert_eq!(regs.get(reg), 0x1000 + offset);
        }
        assert_eq!(regs.rip(), 0x100E);
    }

    #[test]
    fn partial_writes_preserve_untouched_byte() {
        let mut regs = RegisterFile::default();
        regs.write(RegisterId::G3, 0xBEEF, WriteMask::Both);

        regs.write(RegisterId::G3, 0x0012, WriteMask::Low);
        assert_eq!(regs.get(RegisterId::G3), 0xBE12);

        regs.write(RegisterId::G3, 0x3400, WriteMask::High);
        assert_eq!(regs.get(RegisterId::G3), 0x3412);
    }

    #[test]
    fn empty_mask_is_a_no_op() {
        let mut regs = RegisterFile::default();
        regs.write(RegisterId::G15, 0x5A5A, WriteMask::Both);
        regs.write(RegisterId::G15, 0xFFFF, WriteMask::None);

        assert_eq!(regs.get(RegisterId::G15), 0x5A5A);
    }

    #[test]
    fn read_ports_are_independent() {
        let mut regs = RegisterFile::default();
        regs.write(RegisterId::G1, 0x1111, WriteMask::Both);
        regs.write(RegisterId::G15, 0xFFFF, WriteMask::Both);

        assert_eq!(regs.read(RegisterId::G1, RegisterId::G15), (0x1111, 0xFFFF));
        assert_eq!(regs.read(RegisterId::G15, RegisterId::G15), (0xFFFF, 0xFFFF));
    }
}
