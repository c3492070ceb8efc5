use core::sync::atomic::{AtomicU32, Ordering};

/// Commanded speed shared between the control loop and the pulse path.
///
/// The control loop is the only writer. The pulse path reads it when it
/// branches on an edge, so a read never observes a torn value.
pub struct SharedSpeed {
    level: AtomicU32,
}

impl SharedSpeed {
    pub const fn new(initial: u32) -> Self {
        Self {
            level: AtomicU32::new(initial),
        }
    }

    pub fn load(&self) -> u32 {
        self.level.load(Ordering::Acquire)
    }

    pub fn store(&self, level: u32) {
        self.level.store(level, Ordering::Release);
    }
}
