use parking_lot::Mutex;

/// Identifies the frame selection an asynchronous load was started for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    frame: u32,
    generation: u64,
}

impl LoadTicket {
    pub fn frame(&self) -> u32 {
        self.frame
    }
}

struct SelectionState<T> {
    frame: Option<u32>,
    generation: u64,
    committed: Option<(u32, T)>,
}

/// The currently selected frame of one viewer and the load result committed for it.
///
/// Loads are never cancelled when the selection changes. A load that finishes
/// late presents its ticket to [`FrameSelection::commit`], which drops the
/// result unless the ticket still belongs to the current selection.
pub struct FrameSelection<T> {
    state: Mutex<SelectionState<T>>,
}

impl<T> Default for FrameSelection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameSelection<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SelectionState {
                frame: None,
                generation: 0,
                committed: None,
            }),
        }
    }

    pub fn select(&self, frame: u32) -> LoadTicket {
        let mut state = self.state.lock();
        state.generation += 1;
        state.frame = Some(frame);
        if state.committed.as_ref().is_some_and(|(f, _)| *f != frame) {
            state.committed = None;
        }
        LoadTicket {
            frame,
            generation: state.generation,
        }
    }

    pub fn current_frame(&self) -> Option<u32> {
        self.state.lock().frame
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.state.lock().generation == ticket.generation
    }

    /// Stores `value` if `ticket` is still current. Returns whether it was stored.
    pub fn commit(&self, ticket: LoadTicket, value: T) -> bool {
        let mut state = self.state.lock();
        if state.generation != ticket.generation {
            tracing::debug!(
                "dropping stale load for frame {} (selected {:?})",
                ticket.frame,
                state.frame
            );
            return false;
        }
        state.committed = Some((ticket.frame, value));
        true
    }

    pub fn with_committed<R>(&self, f: impl FnOnce(Option<(u32, &T)>) -> R) -> R {
        let state = self.state.lock();
        f(state.committed.as_ref().map(|(frame, value)| (*frame, value)))
    }
}

impl<T: Clone> FrameSelection<T> {
    pub fn committed(&self) -> Option<(u32, T)> {
        self.state.lock().committed.clone()
    }
}
