//! Simulator context and the per-instruction commit sequence.
//!
//! One step runs the fetch micro-cycle and the opcode's execute
//! micro-program against a working copy of the register file:
//! 1. Check `IP` alignment
//! 2. Fetch the word at `IP` and decode it (decode faults stop here)
//! 3. Stage `IP <- IP + 2`
//! 4. Drive each execute micro-cycle, staging its writes
//! 5. Commit the memory write, then the register file
//!
//! Faults are precise: a faulting step commits nothing.

/// Bus-driven datapath mux resolution.
pub mod datapath;

pub use datapath::{drive, CycleEffects, MemoryWrite, RegisterWrite};

use crate::api::{
    CoreConfig, CoreSnapshot, NullTrace, RunBoundary, RunOutcome, SnapshotVersion, StepOutcome,
    Stats, TraceEvent, TraceSink,
};
use crate::bus::WriteMask;
use crate::control::{micro_program, ControlUnit, FETCH_BUS};
use crate::disasm::{debug_state, DumpStyle};
use crate::encoding::InstructionWord;
use crate::state::{RegisterFile, RunState};
use crate::timing::{cycle_cost, CycleCostKind};
use crate::{Fault, Memory};

/// Writes accumulated by a step, applied only once the step succeeds.
///
/// `register_writes` holds one entry per written register with its final
/// value and the union of the lanes written, for tracing.
#[derive(Debug, Default)]
struct StagedCommit {
    registers: RegisterFile,
    register_writes: Vec<RegisterWrite>,
    memory_write: Option<MemoryWrite>,
}

/// Single owner of the register file, memory, and control unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simulator {
    config: CoreConfig,
    registers: RegisterFile,
    memory: Memory,
    control: ControlUnit,
    run_state: RunState,
    stats: Stats,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(CoreConfig::default())
    }
}

impl Simulator {
    /// Creates a simulator with zeroed memory and registers.
    #[must_use]
    pub fn new(config: CoreConfig) -> Self {
        let memory = Memory::new(config.memory_words);
        Self {
            config,
            registers: RegisterFile::default(),
            memory,
            control: ControlUnit::new(),
            run_state: RunState::Running,
            stats: Stats::default(),
        }
    }

    /// Creates a simulator and loads `image` at address 0.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::ImageTooLarge`] when the image does not fit.
    pub fn with_image(config: CoreConfig, image: &[u16]) -> Result<Self, Fault> {
        let mut simulator = Self::new(config);
        simulator.load(image)?;
        Ok(simulator)
    }

    /// Loads a program image at address 0 and resets the core.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::ImageTooLarge`] when the image does not fit; the
    /// simulator is left untouched in that case.
    pub fn load(&mut self, image: &[u16]) -> Result<(), Fault> {
        self.memory.load_image(image)?;
        self.reset();
        Ok(())
    }

    /// Zeroes every register (including `IP`), clears the control unit,
    /// counters, and any latched fault. Memory is preserved.
    pub fn reset(&mut self) {
        self.registers = RegisterFile::default();
        self.control.reset();
        self.run_state = RunState::Running;
        self.stats = Stats::default();
    }

    /// Executes exactly one instruction.
    ///
    /// # Errors
    ///
    /// Returns the fault raised by this step, or the already latched fault.
    pub fn step(&mut self) -> Result<StepOutcome, Fault> {
        self.step_traced(&mut NullTrace)
    }

    /// Executes exactly one instruction, reporting committed effects to
    /// `sink`.
    ///
    /// # Errors
    ///
    /// Returns the fault raised by this step, or the already latched fault.
    pub fn step_traced(&mut self, sink: &mut dyn TraceSink) -> Result<StepOutcome, Fault> {
        self.step_inner(sink).map(|(outcome, _)| outcome)
    }

    /// Executes `steps` instructions.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first fault.
    pub fn run(&mut self, steps: u64) -> Result<RunOutcome, Fault> {
        self.run_until(RunBoundary::Steps, steps)
    }

    /// Executes until `boundary` is reached or `max_steps` have retired.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first fault.
    pub fn run_until(&mut self, boundary: RunBoundary, max_steps: u64) -> Result<RunOutcome, Fault> {
        let mut outcome = RunOutcome {
            steps: 0,
            cycles: 0,
            boundary_reached: matches!(boundary, RunBoundary::Steps),
        };

        while outcome.steps < max_steps {
            let (step, changed) = self.step_inner(&mut NullTrace)?;
            outcome.steps += 1;
            outcome.cycles += u64::from(step.cycles);

            if matches!(boundary, RunBoundary::SelfLoop) && !changed {
                outcome.boundary_reached = true;
                break;
            }
        }

        Ok(outcome)
    }

    fn step_inner(&mut self, sink: &mut dyn TraceSink) -> Result<(StepOutcome, bool), Fault> {
        if let RunState::FaultLatched(fault) = self.run_state {
            return Err(fault);
        }

        let result = self.sequence().and_then(|(outcome, staged)| {
            let changed = self.commit(&staged, outcome, sink)?;
            Ok((outcome, changed))
        });

        match result {
            Ok(retired) => Ok(retired),
            Err(fault) => {
                self.run_state = RunState::FaultLatched(fault);
                sink.on_event(TraceEvent::FaultRaised { fault });
                Err(fault)
            }
        }
    }

    fn sequence(&mut self) -> Result<(StepOutcome, StagedCommit), Fault> {
        let mut staged = StagedCommit {
            registers: self.registers,
            ..StagedCommit::default()
        };

        let ip = staged.registers.rip();
        if ip & 1 != 0 {
            return Err(Fault::MisalignedFetch { ip });
        }

        let fetch = drive(
            &FETCH_BUS,
            InstructionWord::default(),
            &staged.registers,
            &self.memory,
        )?;
        let word = fetch.mem_rdata;
        let opcode = self.control.latch(word, ip, self.config.profile)?;
        staged.apply(fetch);

        for &micro_op in micro_program(opcode) {
            let bus = self.control.bus(micro_op);
            let effects = drive(
                &bus,
                InstructionWord(word),
                &staged.registers,
                &self.memory,
            )?;
            self.control.observe(micro_op, effects.alu);
            staged.apply(effects);
        }

        let cycles = cycle_cost(CycleCostKind::of(opcode)).unwrap_or_default();
        Ok((StepOutcome { ip, word, cycles }, staged))
    }

    fn commit(
        &mut self,
        staged: &StagedCommit,
        outcome: StepOutcome,
        sink: &mut dyn TraceSink,
    ) -> Result<bool, Fault> {
        let mut changed = staged.registers != self.registers;

        // Only the memory write can fail; it lands before anything else.
        let memory_write = match staged.memory_write {
            Some(write) => {
                let before = self.memory.read(write.index)?;
                let value = write.mask.apply(before, write.data);
                self.memory.write(write.index, value, WriteMask::Both)?;
                changed |= before != value;
                Some((write, value))
            }
            None => None,
        };

        sink.on_event(TraceEvent::InstructionFetched {
            ip: outcome.ip,
            word: outcome.word,
        });

        if let Some((write, value)) = memory_write {
            sink.on_event(TraceEvent::MemoryWrite {
                index: write.index,
                value,
                mask: write.mask,
            });
        }

        self.registers = staged.registers;
        for write in &staged.register_writes {
            sink.on_event(TraceEvent::RegisterWrite {
                reg: write.reg,
                value: write.data,
                mask: write.mask,
            });
        }

        self.stats.instructions += 1;
        self.stats.cycles += u64::from(outcome.cycles);
        sink.on_event(TraceEvent::InstructionRetired {
            ip: outcome.ip,
            cycles: outcome.cycles,
        });

        Ok(changed)
    }

    /// Exports the architectural state.
    #[must_use]
    pub fn snapshot(&self) -> CoreSnapshot {
        CoreSnapshot {
            version: SnapshotVersion::V1,
            registers: self.registers,
            memory: self.memory.clone(),
            stats: self.stats,
        }
    }

    /// Imports a snapshot, clearing the control unit and any latched fault.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::ImageTooLarge`] when the snapshot memory exceeds the
    /// configured capacity; the simulator is left untouched in that case.
    /// A snapshot taken from a smaller memory is zero-extended.
    pub fn restore(&mut self, snapshot: &CoreSnapshot) -> Result<(), Fault> {
        self.memory.load_image(snapshot.memory.words())?;
        self.registers = snapshot.registers;
        self.stats = snapshot.stats;
        self.control.reset();
        self.run_state = RunState::Running;
        Ok(())
    }

    /// Register file contents.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Memory contents.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Current instruction pointer.
    #[must_use]
    pub const fn ip(&self) -> u16 {
        self.registers.rip()
    }

    /// Control unit latch state.
    #[must_use]
    pub const fn control(&self) -> &ControlUnit {
        &self.control
    }

    /// Current run state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Counters since the last reset.
    #[must_use]
    pub const fn stats(&self) -> Stats {
        self.stats
    }

    /// Configuration this simulator was built with.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Register dump with the latched instruction.
    #[must_use]
    pub fn debug_state(&self, style: DumpStyle) -> String {
        debug_state(
            &self.registers,
            self.control.current_instruction(),
            self.config.profile,
            style,
        )
    }
}

impl StagedCommit {
    fn apply(&mut self, effects: CycleEffects) {
        if let Some(write) = effects.reg_write {
            self.registers.write(write.reg, write.data, write.mask);
            let data = self.registers.get(write.reg);
            match self
                .register_writes
                .iter_mut()
                .find(|staged| staged.reg == write.reg)
            {
                Some(staged) => {
                    staged.data = data;
                    staged.mask = staged.mask.union(write.mask);
                }
                None => self.register_writes.push(RegisterWrite { data, ..write }),
            }
        }
        if let Some(write) = effects.mem_write {
            self.memory_write = Some(write);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Simulator;
    use crate::api::{CoreConfig, IsaProfile, RunBoundary, TraceEvent};
    use crate::bus::WriteMask;
    use crate::encoding::{encode_immediate, encode_register, Opcode};
    use crate::state::{RegisterId, RunState};
    use crate::Fault;

    fn loop_image() -> [u16; 2] {
        [
            encode_immediate(Opcode::Li, RegisterId::G0, 2),
            encode_register(Opcode::Or, RegisterId::Ip, RegisterId::G0, RegisterId::G0),
        ]
    }

    #[test]
    fn fetch_advances_ip_by_one_word() {
        let mut sim = Simulator::with_image(CoreConfig::default(), &loop_image())
            .expect("image fits");

        let outcome = sim.step().expect("li retires");

        assert_eq!(outcome.ip, 0);
        assert_eq!(outcome.word, loop_image()[0]);
        assert_eq!(outcome.cycles, 2);
        assert_eq!(sim.ip(), 2);
        assert_eq!(sim.registers().get(RegisterId::G0), 2);
    }

    #[test]
    fn trace_reports_fetch_writes_and_retirement_in_order() {
        let mut sim = Simulator::with_image(CoreConfig::default(), &loop_image())
            .expect("image fits");
        let mut events = Vec::new();

        sim.step_traced(&mut events).expect("li retires");

        assert_eq!(
            events,
            vec![
                TraceEvent::InstructionFetched {
                    ip: 0,
                    word: loop_image()[0]
                },
                TraceEvent::RegisterWrite {
                    reg: RegisterId::Ip,
                    value: 2,
                    mask: WriteMask::Both
                },
                TraceEvent::RegisterWrite {
                    reg: RegisterId::G0,
                    value: 2,
                    mask: WriteMask::Low
                },
                TraceEvent::InstructionRetired { ip: 0, cycles: 2 },
            ]
        );
    }

    #[test]
    fn store_traces_memory_write_before_register_writes() {
        let image = [
            encode_immediate(Opcode::Li, RegisterId::G1, 0x10),
            encode_immediate(Opcode::Li, RegisterId::G2, 0x34),
            encode_register(Opcode::Sw, RegisterId::G1, RegisterId::G2, RegisterId::G0),
        ];
        let mut sim = Simulator::with_image(CoreConfig::default(), &image).expect("image fits");
        sim.run(2).expect("constant loads retire");
        let mut events = Vec::new();

        sim.step_traced(&mut events).expect("store retires");

        assert_eq!(
            events,
            vec![
                TraceEvent::InstructionFetched {
                    ip: 4,
                    word: image[2]
                },
                TraceEvent::MemoryWrite {
                    index: 8,
                    value: 0x0034,
                    mask: WriteMask::Both
                },
                TraceEvent::RegisterWrite {
                    reg: RegisterId::Ip,
                    value: 6,
                    mask: WriteMask::Both
                },
                TraceEvent::InstructionRetired { ip: 4, cycles: 4 },
            ]
        );
        assert_eq!(sim.memory().read(8), Ok(0x0034));
    }

    #[test]
    fn jump_traces_only_the_committed_ip() {
        let image = [
            encode_immediate(Opcode::Li, RegisterId::G0, 0x40),
            encode_register(Opcode::Or, RegisterId::Ip, RegisterId::G0, RegisterId::G0),
        ];
        let mut sim = Simulator::with_image(CoreConfig::default(), &image).expect("image fits");
        sim.step().expect("li retires");
        let mut events = Vec::new();

        sim.step_traced(&mut events).expect("jump retires");

        assert_eq!(
            events,
            vec![
                TraceEvent::InstructionFetched {
                    ip: 2,
                    word: image[1]
                },
                TraceEvent::RegisterWrite {
                    reg: RegisterId::Ip,
                    value: 0x40,
                    mask: WriteMask::Both
                },
                TraceEvent::InstructionRetired { ip: 2, cycles: 3 },
            ]
        );
    }

    #[test]
    fn faulting_step_traces_only_the_fault() {
        let config = CoreConfig {
            profile: IsaProfile::Datapath,
            ..CoreConfig::default()
        };
        let image = [encode_register(
            Opcode::Add,
            RegisterId::G1,
            RegisterId::G0,
            RegisterId::G0,
        )];
        let mut sim = Simulator::with_image(config, &image).expect("image fits");
        let fault = Fault::UnknownOpcode { opcode: 8, ip: 0 };
        let mut events = Vec::new();

        assert_eq!(sim.step_traced(&mut events), Err(fault));
        assert_eq!(events, vec![TraceEvent::FaultRaised { fault }]);

        assert_eq!(sim.step_traced(&mut events), Err(fault));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn unknown_opcode_latches_and_commits_nothing() {
        let config = CoreConfig {
            profile: IsaProfile::Datapath,
            ..CoreConfig::default()
        };
        let mut sim = Simulator::with_image(config, &[0x0008]).expect("image fits");
        let fault = Fault::UnknownOpcode { opcode: 8, ip: 0 };

        assert_eq!(sim.step(), Err(fault));
        assert_eq!(sim.ip(), 0);
        assert_eq!(sim.run_state(), RunState::FaultLatched(fault));
        assert_eq!(sim.stats().instructions, 0);

        assert_eq!(sim.step(), Err(fault));

        sim.reset();
        assert_eq!(sim.run_state(), RunState::Running);
    }

    #[test]
    fn self_loop_boundary_stops_on_first_idle_step() {
        let mut sim = Simulator::with_image(CoreConfig::default(), &loop_image())
            .expect("image fits");

        let outcome = sim
            .run_until(RunBoundary::SelfLoop, 100)
            .expect("loop never faults");

        assert!(outcome.boundary_reached);
        assert_eq!(outcome.steps, 2);
        assert_eq!(outcome.cycles, 5);
        assert_eq!(sim.ip(), 2);
    }

    #[test]
    fn snapshot_restore_reproduces_state() {
        let mut sim = Simulator::with_image(CoreConfig::default(), &loop_image())
            .expect("image fits");
        sim.run(3).expect("loop never faults");
        let snapshot = sim.snapshot();

        let mut other = Simulator::default();
        other.restore(&snapshot).expect("same capacity");

        assert_eq!(other.registers(), sim.registers());
        assert_eq!(other.memory(), sim.memory());
        assert_eq!(other.stats(), sim.stats());
    }

    #[test]
    fn restore_rejects_snapshot_larger_than_memory() {
        let sim = Simulator::default();
        let snapshot = sim.snapshot();
        let mut small = Simulator::new(CoreConfig {
            memory_words: 16,
            ..CoreConfig::default()
        });

        assert_eq!(
            small.restore(&snapshot),
            Err(Fault::ImageTooLarge {
                len: 1024,
                capacity: 16
            })
        );
    }
}
