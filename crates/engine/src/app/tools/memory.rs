use sysinfo::System;

/// Memory counters in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct MemoryStats {
    pub free: u64,
    pub used: u64,
    pub total: u64,
    /// Physical plus swap: the most the process could ever be handed.
    pub max: u64,
}

/// Refreshing `System` is comparatively slow, so the loop samples once per
/// stats window rather than per frame.
pub(crate) struct MemoryProbe {
    system: System,
}

impl MemoryProbe {
    pub(crate) fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    pub(crate) fn sample(&mut self) -> MemoryStats {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        MemoryStats {
            free: self.system.available_memory(),
            used: self.system.used_memory(),
            total,
            max: total.saturating_add(self.system.total_swap()),
        }
    }
}
