use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One-shot "bring this rider into view" commands for the map client.
/// Each request is handed out exactly once, in arrival order.
#[derive(Clone, Default)]
pub struct FocusQueue {
    pending: Arc<Mutex<VecDeque<String>>>,
}

impl FocusQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, pid: impl Into<String>) {
        let pid = pid.into();
        let mut pending = self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // Repeated clicks on the same rider collapse into one command.
        if pending.back() != Some(&pid) {
            pending.push_back(pid);
        }
    }

    pub fn take(&self) -> Option<String> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
