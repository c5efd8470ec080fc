//! Deterministic execution fingerprint used for cross-host comparison.

use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use smolisa_core::{
    encode_immediate, encode_register, CoreConfig, Opcode, RegisterId, RunBoundary, Simulator,
};
use thiserror as _;

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn fingerprint() -> String {
    let image = [
        encode_immediate(Opcode::Li, RegisterId::G1, 0x40),
        encode_immediate(Opcode::Li, RegisterId::G2, 1),
        encode_register(Opcode::Add, RegisterId::G0, RegisterId::G0, RegisterId::G2),
        encode_register(Opcode::Sw, RegisterId::G1, RegisterId::G0, RegisterId::G0),
        encode_register(Opcode::Sub, RegisterId::G3, RegisterId::G0, RegisterId::G1),
        encode_immediate(Opcode::Li, RegisterId::G4, 0x04),
        encode_register(Opcode::Lrnz, RegisterId::Ip, RegisterId::G4, RegisterId::G3),
        encode_immediate(Opcode::Li, RegisterId::G5, 0x10),
        encode_register(Opcode::Or, RegisterId::Ip, RegisterId::G5, RegisterId::G5),
    ];

    let mut sim = match Simulator::with_image(CoreConfig::default(), &image) {
        Ok(sim) => sim,
        Err(fault) => return format!("load fault: {fault}"),
    };

    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    match sim.run_until(RunBoundary::SelfLoop, 10_000) {
        Ok(outcome) => {
            hash_bytes(&mut hash, &[0x10, u8::from(outcome.boundary_reached)]);
            hash_bytes(&mut hash, &outcome.steps.to_le_bytes());
            hash_bytes(&mut hash, &outcome.cycles.to_le_bytes());
        }
        Err(fault) => hash_bytes(&mut hash, &[0x14, fault.class() as u8]),
    }

    for cell in sim.registers().as_array() {
        hash_bytes(&mut hash, &cell.to_le_bytes());
    }
    for word in sim.memory().words() {
        hash_bytes(&mut hash, &word.to_le_bytes());
    }

    format!("{hash:016x}")
}

fn main() {
    println!("{}", fingerprint());
}
