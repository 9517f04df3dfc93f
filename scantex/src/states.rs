use crate::gpu::{
    BackendError, Pass, PassOutput, RenderBackend, TriangleId, TriangleState,
};

/// CPU mirror of the backend's per-triangle state buffer.
///
/// Transitions are handed to the backend first and applied to the mirror
/// only once the sync pass succeeded, so a failed frame leaves both sides on
/// the previous frame's states.
#[derive(Debug, Default)]
pub struct TriangleStates {
    states: Vec<TriangleState>,
}

impl TriangleStates {
    pub fn get(&self, id: TriangleId) -> TriangleState {
        self.states
            .get(id.get() as usize)
            .copied()
            .unwrap_or_default()
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (TriangleId, TriangleState)> + '_ {
        self.states
            .iter()
            .enumerate()
            .map(|(id, state)| (TriangleId::new(id as u32), *state))
    }

    /// Ids currently in the given state.
    pub fn ids_in(
        &self,
        state: TriangleState,
    ) -> impl Iterator<Item = TriangleId> + '_ {
        self.iter()
            .filter(move |(_, current)| *current == state)
            .map(|(id, _)| id)
    }

    /// Applies a batch of transitions, in order, to the backend state buffer
    /// and then to the mirror.
    pub fn apply<B>(
        &mut self,
        backend: &mut B,
        changes: &[(TriangleId, TriangleState)],
        id_count: u32,
    ) -> Result<(), BackendError>
    where
        B: RenderBackend + ?Sized,
    {
        let output = backend.run_pass(Pass::SyncStates { changes, id_count })?;

        assert!(
            matches!(output, PassOutput::Done),
            "backend returned {output:?} for a state sync"
        );

        if self.states.len() < id_count as usize {
            self.states.resize(id_count as usize, TriangleState::Unknown);
        }

        for (id, state) in changes {
            self.states[id.get() as usize] = *state;
        }

        Ok(())
    }
}
