use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowBuilder};

use super::config::LoopConfig;
use super::cursor::{CursorError, CursorHost};
use super::fullscreen::{DisplayMode, DisplayModeBackend, DisplayModeError, FullscreenRequests};
use super::input::{InputEvent, InputKind, PointerButton};
use super::loop_runner::{FrameLoop, LoopServices, PanelHandle, PanelParts};
use super::rendering::{Coord, Image, PixelsBackend, RenderError};
use super::ui::Ui;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] RenderError),
    #[error("failed to spawn frame loop thread: {0}")]
    SpawnLoop(#[source] std::io::Error),
    #[error("frame loop thread panicked")]
    LoopPanicked,
    #[error("frame loop stopped on render failure: {0}")]
    Render(#[source] RenderError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

const WINIT_CURSOR_COLORS: u32 = 0;

/// Posted by the loop thread when `FrameLoop::run` returns.
#[derive(Debug, Clone, Copy)]
struct LoopExited;

pub fn run_app(
    config: LoopConfig,
    scene: Box<dyn Ui>,
    fullscreen: FullscreenRequests,
) -> Result<(), AppError> {
    run_app_with_services(config, scene, fullscreen, LoopServices::default())
}

/// Like [`run_app`], with the loop's stats, profile history and resource
/// counters shared with the caller.
pub fn run_app_with_services(
    config: LoopConfig,
    scene: Box<dyn Ui>,
    fullscreen: FullscreenRequests,
    services: LoopServices,
) -> Result<(), AppError> {
    let event_loop = EventLoopBuilder::<LoopExited>::with_user_event()
        .build()
        .map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let backend =
        PixelsBackend::new(Arc::clone(&window), config.text_scale).map_err(AppError::CreateRenderer)?;

    let parts = PanelParts {
        scene,
        display: Box::new(WinitDisplayMode::new(Arc::clone(&window))),
        fullscreen,
        backend: Box::new(backend),
        cursor_host: Box::new(WinitCursorHost::new(Arc::clone(&window))),
    };
    let (frame_loop, handle) = FrameLoop::new(&config, parts);
    let frame_loop = frame_loop.with_services(services);
    info!(
        width = config.window_width,
        height = config.window_height,
        "startup"
    );

    let proxy = event_loop.create_proxy();
    let loop_thread = frame_loop
        .start(move || {
            if proxy.send_event(LoopExited).is_err() {
                warn!("event_loop_already_closed");
            }
        })
        .map_err(AppError::SpawnLoop)?;

    event_loop.set_control_flow(ControlFlow::Wait);
    let mut translator = InputTranslator::default();
    let run_result = event_loop.run(|event, window_target| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested => {
                info!(reason = "window_close", "shutdown_requested");
                handle.stop();
            }
            WindowEvent::Resized(size) => handle.resize(size.width, size.height),
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = window.inner_size();
                handle.resize(size.width, size.height);
            }
            other => translator.translate(&other, &handle),
        },
        Event::UserEvent(LoopExited) => window_target.exit(),
        Event::LoopExiting => handle.stop(),
        _ => {}
    });

    handle.stop();
    let loop_result = loop_thread.join().map_err(|_| AppError::LoopPanicked)?;
    run_result.map_err(AppError::EventLoopRun)?;
    loop_result.map_err(AppError::Render)
}

/// Turns winit window events into queued input events.
#[derive(Debug, Default)]
struct InputTranslator {
    modifiers: ModifiersState,
    cursor: Coord,
}

impl InputTranslator {
    fn translate(&mut self, event: &WindowEvent, handle: &PanelHandle) {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Coord::new(position.x as i32, position.y as i32);
                handle.on_input_event(InputEvent::new(InputKind::PointerMove {
                    position: self.cursor,
                }));
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = map_pointer_button(*button);
                let kind = match state {
                    ElementState::Pressed => InputKind::PointerDown {
                        position: self.cursor,
                        button,
                    },
                    ElementState::Released => InputKind::PointerUp {
                        position: self.cursor,
                        button,
                    },
                };
                handle.on_input_event(InputEvent::new(kind));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = wheel_rotation(*delta);
                if delta != 0 {
                    handle.on_input_event(InputEvent::new(InputKind::PointerWheel {
                        position: self.cursor,
                        delta,
                    }));
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let text = event.text.as_ref().map(|text| text.as_str());
                for kind in key_input_kinds(code, event.state, text, self.modifiers) {
                    handle.on_input_event(InputEvent::new(kind));
                }
            }
            _ => {}
        }
    }
}

/// Key press followed by the characters it typed, or a bare key release.
fn key_input_kinds(
    code: KeyCode,
    state: ElementState,
    text: Option<&str>,
    modifiers: ModifiersState,
) -> Vec<InputKind> {
    match state {
        ElementState::Pressed => {
            let mut kinds = vec![InputKind::KeyDown { code, modifiers }];
            kinds.extend(
                text.unwrap_or_default()
                    .chars()
                    .filter(|ch| !ch.is_control())
                    .map(|ch| InputKind::KeyChar { ch }),
            );
            kinds
        }
        ElementState::Released => vec![InputKind::KeyUp { code, modifiers }],
    }
}

fn map_pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Left,
        MouseButton::Right => PointerButton::Right,
        MouseButton::Middle => PointerButton::Middle,
        MouseButton::Back => PointerButton::Other(3),
        MouseButton::Forward => PointerButton::Other(4),
        MouseButton::Other(code) => PointerButton::Other(code),
    }
}

/// Wheel notches, positive when scrolling toward the user.
fn wheel_rotation(delta: MouseScrollDelta) -> i32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -(y.round() as i32),
        MouseScrollDelta::PixelDelta(position) => {
            if position.y > 0.0 {
                -1
            } else if position.y < 0.0 {
                1
            } else {
                0
            }
        }
    }
}

struct WinitDisplayMode {
    window: Arc<Window>,
}

impl WinitDisplayMode {
    fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl DisplayModeBackend for WinitDisplayMode {
    fn current_mode(&self) -> DisplayMode {
        if self.window.fullscreen().is_some() {
            DisplayMode::Fullscreen
        } else {
            DisplayMode::Windowed
        }
    }

    fn apply(&mut self, mode: DisplayMode) -> Result<(), DisplayModeError> {
        match mode {
            DisplayMode::Fullscreen => {
                let Some(monitor) = self.window.current_monitor() else {
                    return Err(DisplayModeError {
                        requested: mode,
                        reason: "window is not on any monitor".to_string(),
                    });
                };
                self.window
                    .set_fullscreen(Some(Fullscreen::Borderless(Some(monitor))));
            }
            DisplayMode::Windowed => self.window.set_fullscreen(None),
        }
        Ok(())
    }
}

/// winit 0.29 only exposes the stock cursor icons, so this host reports no
/// image cursor colors and the controller draws the software overlay.
struct WinitCursorHost {
    window: Arc<Window>,
}

impl WinitCursorHost {
    fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl CursorHost for WinitCursorHost {
    fn max_cursor_colors(&self) -> u32 {
        WINIT_CURSOR_COLORS
    }

    fn install_cursor(&mut self, _image: &Image, _hotspot: Coord) -> Result<(), CursorError> {
        Err(CursorError::Unsupported)
    }

    fn hide_system_cursor(&mut self) {
        self.window.set_cursor_visible(false);
    }
}
