//! Execution core for the smolisa 16-bit CPU.

/// Fault taxonomy for decode, memory, and image-load failures.
pub mod fault;
pub use fault::{Fault, FaultClass};

/// Opcode table, instruction-field extraction, and word encoders.
pub mod encoding;
pub use encoding::{
    classify_opcode, encode_immediate, encode_register, InstructionFormat, InstructionWord, Opcode,
    OPCODE_TABLE,
};

/// Per-cycle control signals and byte-lane write masks.
pub mod bus;
pub use bus::{AluDataSrc, ControlBus, MemAddrSrc, MemDataSrc, RegAddrSrc, RegDataSrc, WriteMask};

/// Combinational arithmetic/logic unit.
pub mod alu;
pub use alu::{Alu, AluOp, AluOutput};

/// Architectural register state and run state.
pub mod state;
pub use state::{RegisterFile, RegisterId, RunState, IP_INDEX, REGISTER_COUNT};

/// Word-addressable main memory.
pub mod memory;
pub use memory::{word_index, Memory, DEFAULT_MEMORY_WORDS};

/// Instruction latch, decode dispatch table, and micro-cycle sequencing.
pub mod control;
pub use control::{decode_bus, micro_program, ControlUnit, MicroOp, FETCH_BUS};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    CoreConfig, CoreSnapshot, IsaProfile, NullTrace, RunBoundary, RunOutcome, SnapshotVersion,
    Stats, StepOutcome, TraceEvent, TraceSink,
};

/// Reference instruction cycle-cost table and lookup helpers.
pub mod timing;
pub use timing::{cycle_cost, CycleCostKind, CYCLE_COST_TABLE};

/// Instruction disassembly and register dumps.
pub mod disasm;
pub use disasm::{debug_state, disassemble, disassemble_window, DisassemblyRow, DumpStyle};

/// Simulator context and instruction commit sequence.
pub mod execute;
pub use execute::Simulator;

#[cfg(test)]
use proptest as _;
