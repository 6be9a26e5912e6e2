use std::time::Instant;

pub use winit::keyboard::{KeyCode, ModifiersState};

use super::Coord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
    Other(u16),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputKind {
    KeyDown {
        code: KeyCode,
        modifiers: ModifiersState,
    },
    KeyUp {
        code: KeyCode,
        modifiers: ModifiersState,
    },
    KeyChar {
        ch: char,
    },
    PointerDown {
        position: Coord,
        button: PointerButton,
    },
    PointerUp {
        position: Coord,
        button: PointerButton,
    },
    PointerMove {
        position: Coord,
    },
    PointerWheel {
        position: Coord,
        delta: i32,
    },
}

/// One host input event, stamped when the producer created it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub produced_at: Instant,
}

impl InputEvent {
    pub fn new(kind: InputKind) -> Self {
        Self {
            kind,
            produced_at: Instant::now(),
        }
    }

    pub fn pointer_position(&self) -> Option<Coord> {
        match self.kind {
            InputKind::PointerDown { position, .. }
            | InputKind::PointerUp { position, .. }
            | InputKind::PointerMove { position }
            | InputKind::PointerWheel { position, .. } => Some(position),
            InputKind::KeyDown { .. } | InputKind::KeyUp { .. } | InputKind::KeyChar { .. } => {
                None
            }
        }
    }
}
