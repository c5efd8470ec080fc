#![no_main]

use libfuzzer_sys::fuzz_target;
use smolisa_core::{
    disassemble, CoreConfig, IsaProfile, RunBoundary, RunState, Simulator, DEFAULT_MEMORY_WORDS,
};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };

    let image: Vec<u16> = rest
        .chunks_exact(2)
        .take(DEFAULT_MEMORY_WORDS)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    let profile = if selector & 1 == 0 {
        IsaProfile::Full
    } else {
        IsaProfile::Datapath
    };
    let config = CoreConfig {
        profile,
        ..CoreConfig::default()
    };

    for &word in &image {
        let _ = disassemble(word, profile);
    }

    let Ok(mut sim) = Simulator::with_image(config, &image) else {
        return;
    };
    let before = sim.snapshot();
    match sim.run_until(RunBoundary::SelfLoop, u64::from(selector) * 4) {
        Ok(_) => assert_eq!(sim.run_state(), RunState::Running),
        Err(fault) => {
            assert_eq!(sim.run_state(), RunState::FaultLatched(fault));
            assert_eq!(sim.step(), Err(fault));
        }
    }

    sim.restore(&before).expect("snapshot came from the same configuration");
    assert_eq!(sim.snapshot(), before);
});
