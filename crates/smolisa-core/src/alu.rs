//! Combinational arithmetic/logic unit.

/// ALU operation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AluOp {
    /// Wrapping addition.
    Add,
    /// Wrapping subtraction.
    Sub,
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise exclusive or.
    Xor,
    /// Logical shift left; shifts of 16 or more yield zero.
    Shl,
    /// Logical shift right; shifts of 16 or more yield zero.
    Shr,
    /// High byte of A into the low byte, low byte of B into the high byte.
    Swb,
}

impl AluOp {
    /// Every operation, in selector order.
    pub const ALL: [Self; 8] = [
        Self::Add,
        Self::Sub,
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Shl,
        Self::Shr,
        Self::Swb,
    ];
}

/// ALU result lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AluOutput {
    /// 16-bit result.
    pub result: u16,
    /// Set when `result == 0`.
    pub zero: bool,
}

/// Stateless ALU.
pub struct Alu;

impl Alu {
    /// Computes `op(a, b)` and the zero flag.
    #[must_use]
    pub const fn compute(op: AluOp, a: u16, b: u16) -> AluOutput {
        let result = match op {
            AluOp::Add => a.wrapping_add(b),
            AluOp::Sub => a.wrapping_sub(b),
            AluOp::And => a & b,
            AluOp::Or => a | b,
            AluOp::Xor => a ^ b,
            AluOp::Shl => {
                if b < 16 {
                    a << b
                } else {
                    0
                }
            }
            AluOp::Shr => {
                if b < 16 {
                    a >> b
                } else {
                    0
                }
            }
            AluOp::Swb => (a >> 8) | (b << 8),
        };

        AluOutput {
            result,
            zero: result == 0,
        }
    }
}
