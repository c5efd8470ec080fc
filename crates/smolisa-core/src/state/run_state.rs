use crate::Fault;

/// Host-observable execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// The next `step` fetches at `IP`.
    #[default]
    Running,
    /// A fault is latched; no progress is possible until reset or load.
    FaultLatched(Fault),
}

impl RunState {
    /// Returns the currently latched fault, if any.
    #[must_use]
    pub const fn latched_fault(self) -> Option<Fault> {
        match self {
            Self::FaultLatched(fault) => Some(fault),
            Self::Running => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RunState;
    use crate::Fault;

    #[test]
    fn fresh_core_is_running_without_fault() {
        let state = RunState::default();
        assert!(matches!(state, RunState::Running));
        assert!(state.latched_fault().is_none());
    }

    #[test]
    fn latched_state_exposes_its_fault() {
        let fault = Fault::MisalignedFetch { ip: 3 };
        assert_eq!(RunState::FaultLatched(fault).latched_fault(), Some(fault));
    }
}
