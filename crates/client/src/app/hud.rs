use std::time::Duration;

use engine::{
    Buff, BuffId, BuffTable, Coord, CountdownState, CursorResource, FullscreenRequests, KeyCode,
    ModifiersState, PixelFrame, PointerButton, Rgba, SceneError, TextLabel, Tooltip, Ui,
};
use tracing::{debug, info};

use super::cursors::CursorSet;
use super::icons::{IconCache, ICON_SIZE};

const SLOT: i32 = 32;
const SLOT_GAP: i32 = 6;
const MARGIN: i32 = 12;
const METER_HEIGHT: i32 = 3;
const MAX_TYPED_CHARS: usize = 24;
const REFRESH_INTERVAL_MILLIS: u64 = 2_000;
const METER_WHEEL_STEP: i32 = 10;

const BACKGROUND: Rgba = [24, 28, 36, 255];
const SLOT_FILL: Rgba = [58, 66, 84, 255];
const SLOT_FILL_MAJOR: Rgba = [112, 92, 40, 255];
const SLOT_BORDER: Rgba = [150, 160, 176, 255];
const ELAPSED_SHADE: Rgba = [0, 0, 0, 140];
const METER_COLOR: Rgba = [80, 200, 120, 255];
const TEXT_COLOR: Rgba = [230, 234, 240, 255];
const TOOLTIP_TEXT: Rgba = [255, 240, 200, 255];

/// Demo scene: a row of buff icons whose timers are projected from the last
/// simulated server sample.
pub(crate) struct HudScene {
    size: Coord,
    clock_millis: u64,
    next_refresh_millis: u64,
    buffs: BuffTable,
    fullscreen: FullscreenRequests,
    cursors: CursorSet,
    icons: IconCache,
    hovered: Option<BuffId>,
    typed: String,
}

impl HudScene {
    pub(crate) fn new(
        width: u32,
        height: u32,
        fullscreen: FullscreenRequests,
        cursors: CursorSet,
        icons: IconCache,
    ) -> Self {
        Self {
            size: Coord::new(width as i32, height as i32),
            clock_millis: 0,
            next_refresh_millis: REFRESH_INTERVAL_MILLIS,
            buffs: seed_buffs(),
            fullscreen,
            cursors,
            icons,
            hovered: None,
            typed: String::new(),
        }
    }

    fn slot_origin(&self, index: usize) -> Coord {
        Coord::new(
            MARGIN + index as i32 * (SLOT + SLOT_GAP),
            self.size.y - SLOT - MARGIN,
        )
    }

    fn buff_at(&self, pointer: Coord) -> Option<&Buff> {
        self.buffs.iter().enumerate().find_map(|(index, buff)| {
            let origin = self.slot_origin(index);
            let inside = pointer.x >= origin.x
                && pointer.y >= origin.y
                && pointer.x < origin.x + SLOT
                && pointer.y < origin.y + SLOT;
            inside.then_some(buff)
        })
    }

    /// Stands in for server updates: expired timers start over.
    fn simulate_server_refresh(&mut self) {
        let now = self.clock_millis;
        let expired: Vec<(BuffId, Option<u32>)> = self
            .buffs
            .iter()
            .filter(|buff| buff.countdown.percent_remaining.is_some() && buff.time_left(now) == 0)
            .map(|buff| (buff.id, buff.countdown.tick_count))
            .collect();
        for (id, ticks) in expired {
            let ticks = ticks.map_or(-1, |ticks| ticks as i32);
            self.buffs
                .refresh(id, CountdownState::from_wire(100, ticks, now));
            debug!(buff = id.0, "buff_refreshed");
        }
    }
}

fn seed_buffs() -> BuffTable {
    let mut buffs = BuffTable::new();

    let swim = buffs.observe(BuffId(1), "gfx/hud/buffs/swim");
    swim.tooltip = Some("Swimming".to_string());
    swim.countdown = CountdownState::from_wire(100, 100, 0);
    swim.meter = Some(60);

    let tea = buffs.observe(BuffId(2), "gfx/hud/buffs/tea");
    tea.tooltip = Some("Tea".to_string());
    tea.countdown = CountdownState::from_wire(80, 250, 0);
    tea.counter = Some(3);

    let travel = buffs.observe(BuffId(3), "gfx/hud/buffs/travel");
    travel.major = true;
    travel.countdown = CountdownState::from_wire(-1, -1, 0);

    buffs
}

impl Ui for HudScene {
    fn tick(&mut self, delta: Duration) -> Result<(), SceneError> {
        self.clock_millis = self.clock_millis.saturating_add(delta.as_millis() as u64);
        if self.clock_millis >= self.next_refresh_millis {
            self.simulate_server_refresh();
            self.next_refresh_millis = self.clock_millis + REFRESH_INTERVAL_MILLIS;
        }
        Ok(())
    }

    fn key_down(&mut self, code: KeyCode, _modifiers: ModifiersState) -> Result<(), SceneError> {
        match code {
            KeyCode::F11 => {
                self.fullscreen.toggle();
                info!(desired = ?self.fullscreen.desired(), "fullscreen_toggled");
            }
            KeyCode::Escape => self.fullscreen.request_windowed(),
            KeyCode::Backspace => {
                self.typed.pop();
            }
            _ => {}
        }
        Ok(())
    }

    fn key_up(&mut self, _code: KeyCode, _modifiers: ModifiersState) -> Result<(), SceneError> {
        Ok(())
    }

    fn key_char(&mut self, ch: char) -> Result<(), SceneError> {
        if self.typed.chars().count() < MAX_TYPED_CHARS {
            self.typed.push(ch);
        }
        Ok(())
    }

    fn pointer_down(&mut self, position: Coord, button: PointerButton) -> Result<(), SceneError> {
        let Some((id, counter)) = self.buff_at(position).map(|buff| (buff.id, buff.counter)) else {
            return Ok(());
        };
        match button {
            PointerButton::Left => {
                self.buffs
                    .set_counter(id, Some(counter.unwrap_or(0).saturating_add(1)));
            }
            PointerButton::Right => {
                self.buffs.remove(id);
                info!(buff = id.0, "buff_dismissed");
            }
            PointerButton::Middle | PointerButton::Other(_) => {}
        }
        Ok(())
    }

    fn pointer_up(&mut self, _position: Coord, _button: PointerButton) -> Result<(), SceneError> {
        Ok(())
    }

    fn pointer_move(&mut self, position: Coord) -> Result<(), SceneError> {
        self.hovered = self.buff_at(position).map(|buff| buff.id);
        Ok(())
    }

    fn pointer_wheel(&mut self, position: Coord, delta: i32) -> Result<(), SceneError> {
        let Some((id, meter)) = self.buff_at(position).map(|buff| (buff.id, buff.meter)) else {
            return Ok(());
        };
        let current = i32::from(meter.unwrap_or(0));
        let next = (current - delta * METER_WHEEL_STEP).clamp(0, 100);
        self.buffs.set_meter(id, Some(next as u8));
        Ok(())
    }

    fn draw(&mut self, frame: &mut PixelFrame<'_>) -> Result<(), SceneError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(SceneError::NotReady("hud surface"));
        }
        frame.fill_rect(Coord::ZERO, frame.size(), BACKGROUND);

        let header = if self.typed.is_empty() {
            "F11 fullscreen".to_string()
        } else {
            format!("> {}", self.typed)
        };
        let header_y = self.size.y - SLOT - MARGIN - frame.text_size(&header).y - MARGIN / 2;
        frame.text(Coord::new(MARGIN, header_y), &header, TEXT_COLOR);

        let now = self.clock_millis;
        for (index, buff) in self.buffs.iter().enumerate() {
            let origin = self.slot_origin(index);
            let fill = if buff.major { SLOT_FILL_MAJOR } else { SLOT_FILL };
            frame.fill_rect(origin, Coord::new(SLOT, SLOT), fill);
            let inset = (SLOT - ICON_SIZE as i32) / 2;
            frame.blit(&self.icons.get(&buff.resource), origin + Coord::new(inset, inset));

            if buff.countdown.percent_remaining.is_some() {
                let left = i32::from(buff.time_left(now));
                let shade = SLOT - SLOT * left / 100;
                frame.fill_rect(origin, Coord::new(SLOT, shade), ELAPSED_SHADE);
            }
            let border = if self.hovered == Some(buff.id) {
                TEXT_COLOR
            } else {
                SLOT_BORDER
            };
            frame.rect_outline(origin, Coord::new(SLOT, SLOT), border);

            if let Some(meter) = buff.meter {
                let width = SLOT * i32::from(meter) / 100;
                frame.fill_rect(
                    origin + Coord::new(0, SLOT + 1),
                    Coord::new(width, METER_HEIGHT),
                    METER_COLOR,
                );
            }
            if let Some(label) = buff.counter_label() {
                frame.text(origin + Coord::new(3, 3), &label, TEXT_COLOR);
            }
        }
        Ok(())
    }

    fn tooltip(&self, pointer: Coord) -> Option<Tooltip> {
        let buff = self.buff_at(pointer)?;
        if buff.name().is_empty() {
            return Some(Tooltip::Plain(buff.resource.clone()));
        }
        let text = match buff.countdown.percent_remaining {
            Some(_) => format!("{} {}%", buff.name(), buff.time_left(self.clock_millis)),
            None => buff.name().to_string(),
        };
        Some(Tooltip::Text(TextLabel::new(text, TOOLTIP_TEXT)))
    }

    fn cursor(&self, pointer: Coord) -> CursorResource {
        if self.buff_at(pointer).is_some() {
            self.cursors.hand.clone()
        } else {
            self.cursors.arrow.clone()
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = Coord::new(width as i32, height as i32);
    }
}
