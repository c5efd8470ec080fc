use crate::Opcode;

/// Instruction classes that share a fixed reference cycle cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleCostKind {
    /// Immediate byte load (`LI`, `LIU`).
    LoadImmediate,
    /// Memory load or store (`LB`, `SB`, `LW`, `SW`).
    MemoryAccess,
    /// Conditional register move (`LRZ`, `LRNZ`).
    ConditionalMove,
    /// Register-register ALU operation.
    Alu,
}

/// Single source-of-truth cycle-cost table.
pub const CYCLE_COST_TABLE: &[(CycleCostKind, u16)] = &[
    (CycleCostKind::LoadImmediate, 2),
    (CycleCostKind::MemoryAccess, 4),
    (CycleCostKind::ConditionalMove, 3),
    (CycleCostKind::Alu, 3),
];

impl CycleCostKind {
    /// Classifies an opcode.
    #[must_use]
    pub const fn of(opcode: Opcode) -> Self {
        match opcode {
            Opcode::Li | Opcode::Liu => Self::LoadImmediate,
            Opcode::Lb | Opcode::Sb | Opcode::Lw | Opcode::Sw => Self::MemoryAccess,
            Opcode::Lrz | Opcode::Lrnz => Self::ConditionalMove,
            Opcode::Add
            | Opcode::Sub
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor
            | Opcode::Shl
            | Opcode::Shr
            | Opcode::Swb => Self::Alu,
        }
    }
}

/// Looks up the cycle cost for a cycle-cost kind.
#[must_use]
pub fn cycle_cost(kind: CycleCostKind) -> Option<u16> {
    CYCLE_COST_TABLE
        .iter()
        .find_map(|(entry_kind, cycles)| (*entry_kind == kind).then_some(*cycles))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{cycle_cost, CycleCostKind, CYCLE_COST_TABLE};
    use crate::encoding::OPCODE_TABLE;

    #[test]
    fn table_contains_unique_kinds() {
        let kinds: HashSet<_> = CYCLE_COST_TABLE.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds.len(), CYCLE_COST_TABLE.len());
    }

    #[test]
    fn table_values_match_reference_costs() {
        assert_eq!(cycle_cost(CycleCostKind::LoadImmediate), Some(2));
        assert_eq!(cycle_cost(CycleCostKind::MemoryAccess), Some(4));
        assert_eq!(cycle_cost(CycleCostKind::ConditionalMove), Some(3));
        assert_eq!(cycle_cost(CycleCostKind::Alu), Some(3));
    }

    #[test]
    fn every_opcode_has_a_cost() {
        for (_, opcode) in OPCODE_TABLE {
            assert!(cycle_cost(CycleCostKind::of(*opcode)).is_some());
        }
    }
}
