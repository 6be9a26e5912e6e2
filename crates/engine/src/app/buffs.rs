use std::collections::BTreeMap;

use super::CountdownState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuffId(pub u32);

/// A timed status effect shown in the HUD.
#[derive(Debug, Clone, PartialEq)]
pub struct Buff {
    pub id: BuffId,
    pub resource: String,
    pub tooltip: Option<String>,
    /// Bar drawn under the icon, 0..=100.
    pub meter: Option<u8>,
    /// Small number drawn over the icon.
    pub counter: Option<i32>,
    pub countdown: CountdownState,
    pub major: bool,
}

impl Buff {
    pub fn new(id: BuffId, resource: impl Into<String>) -> Self {
        Self {
            id,
            resource: resource.into(),
            tooltip: None,
            meter: None,
            counter: None,
            countdown: CountdownState::unknown(),
            major: false,
        }
    }

    /// Tooltip text, or empty while the resource has none.
    pub fn name(&self) -> &str {
        self.tooltip.as_deref().unwrap_or("")
    }

    pub fn counter_label(&self) -> Option<String> {
        self.counter.map(|value| value.to_string())
    }

    pub fn time_left(&self, now_millis: u64) -> u8 {
        self.countdown.compute_remaining(now_millis)
    }
}

/// Buffs of one entity, kept in id order.
#[derive(Debug, Clone, Default)]
pub struct BuffTable {
    buffs: BTreeMap<BuffId, Buff>,
}

impl BuffTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the buff, creating it on first sight.
    pub fn observe(&mut self, id: BuffId, resource: &str) -> &mut Buff {
        self.buffs
            .entry(id)
            .or_insert_with(|| Buff::new(id, resource))
    }

    /// Replaces the countdown in one step. Returns false for unknown ids.
    pub fn refresh(&mut self, id: BuffId, countdown: CountdownState) -> bool {
        match self.buffs.get_mut(&id) {
            Some(buff) => {
                buff.countdown = countdown;
                true
            }
            None => false,
        }
    }

    pub fn set_meter(&mut self, id: BuffId, meter: Option<u8>) -> bool {
        match self.buffs.get_mut(&id) {
            Some(buff) => {
                buff.meter = meter.map(|value| value.min(100));
                true
            }
            None => false,
        }
    }

    pub fn set_counter(&mut self, id: BuffId, counter: Option<i32>) -> bool {
        match self.buffs.get_mut(&id) {
            Some(buff) => {
                buff.counter = counter;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: BuffId) -> Option<Buff> {
        self.buffs.remove(&id)
    }

    pub fn get(&self, id: BuffId) -> Option<&Buff> {
        self.buffs.get(&id)
    }

    pub fn time_left(&self, id: BuffId, now_millis: u64) -> Option<u8> {
        self.buffs.get(&id).map(|buff| buff.time_left(now_millis))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Buff> {
        self.buffs.values()
    }

    pub fn len(&self) -> usize {
        self.buffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 50_000;

    #[test]
    fn observe_creates_once_and_keeps_state() {
        let mut table = BuffTable::new();
        table.observe(BuffId(7), "gfx/buff/haste").major = true;
        let again = table.observe(BuffId(7), "gfx/buff/other");

        assert!(again.major);
        assert_eq!(again.resource, "gfx/buff/haste");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn fresh_buff_has_no_time_left() {
        let mut table = BuffTable::new();
        table.observe(BuffId(1), "gfx/buff/a");

        assert_eq!(table.time_left(BuffId(1), NOW), Some(0));
        assert_eq!(table.time_left(BuffId(2), NOW), None);
    }

    #[test]
    fn refresh_replaces_the_whole_countdown() {
        let mut table = BuffTable::new();
        table.observe(BuffId(3), "gfx/buff/a");
        assert!(table.refresh(BuffId(3), CountdownState::from_wire(100, 100, NOW)));
        assert_eq!(table.time_left(BuffId(3), NOW + 3_000), Some(50));

        assert!(table.refresh(BuffId(3), CountdownState::from_wire(80, -1, NOW + 3_000)));
        assert_eq!(table.time_left(BuffId(3), NOW + 9_000), Some(80));
        assert!(!table.refresh(BuffId(9), CountdownState::unknown()));
    }

    #[test]
    fn meter_is_capped_and_counter_labelled() {
        let mut table = BuffTable::new();
        table.observe(BuffId(4), "gfx/buff/a");
        table.set_meter(BuffId(4), Some(180));
        table.set_counter(BuffId(4), Some(12));

        let buff = table.get(BuffId(4)).expect("buff");
        assert_eq!(buff.meter, Some(100));
        assert_eq!(buff.counter_label().as_deref(), Some("12"));
        assert_eq!(buff.name(), "");
    }

    #[test]
    fn removal_and_iteration_order() {
        let mut table = BuffTable::new();
        for id in [5, 2, 9] {
            table.observe(BuffId(id), "gfx/buff/a");
        }
        assert!(table.remove(BuffId(9)).is_some());
        assert!(table.remove(BuffId(9)).is_none());

        let ids: Vec<u32> = table.iter().map(|buff| buff.id.0).collect();
        assert_eq!(ids, vec![2, 5]);
    }
}
