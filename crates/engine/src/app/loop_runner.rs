use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tracing::{error, info, warn};

use super::config::LoopConfig;
use super::cursor::{CursorController, CursorHost};
use super::event_queue::EventQueue;
use super::fullscreen::{DisplayModeBackend, FullscreenRequests, FullscreenSync};
use super::input::{InputEvent, InputKind};
use super::metrics::{CacheCounters, MetricsHandle, StatsAccumulator};
use super::profile::{ProfileFrame, ProfileHandle};
use super::rendering::{Coord, RenderBackend, RenderError, Rgba};
use super::tools::{draw_overlay, draw_tooltip, MemoryProbe, MemoryStats, OverlayData};
use super::ui::{NoResourceStats, ResourceStats, SceneError, Ui};

const CLEAR_COLOR: Rgba = [0, 0, 0, 255];
const LOOP_THREAD_NAME: &str = "frame-loop";

#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl FrameError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Scene(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Continue,
    Stopped,
}

/// Interruptible sleep shared by the loop and its handles.
#[derive(Debug, Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

impl StopSignal {
    fn stop(&self) {
        let mut stopped = self.stopped.lock();
        *stopped = true;
        self.condvar.notify_all();
    }

    fn is_stopped(&self) -> bool {
        *self.stopped.lock()
    }

    /// Sleeps up to `timeout`; returns true if stopped.
    fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.condvar.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

/// Everything the render lock guards: draw never overlaps dispatch.
struct RenderState {
    scene: Box<dyn Ui>,
    display: FullscreenSync,
    pointer: Coord,
}

struct PanelShared {
    render: Mutex<RenderState>,
    events: EventQueue,
    fullscreen: FullscreenRequests,
    stop: StopSignal,
    pending_resize: Mutex<Option<(u32, u32)>>,
}

/// Host-side handle; cheap to clone and safe to use from any thread.
#[derive(Clone)]
pub struct PanelHandle {
    shared: Arc<PanelShared>,
}

impl PanelHandle {
    /// Queues the event for the next frame, then applies any pending
    /// display mode change if the render lock happens to be free.
    pub fn on_input_event(&self, event: InputEvent) {
        self.shared.events.enqueue(event);
        if let Some(mut state) = self.shared.render.try_lock() {
            state.display.reconcile();
        }
    }

    pub fn request_fullscreen(&self) {
        self.shared.fullscreen.request_fullscreen();
    }

    pub fn request_windowed(&self) {
        self.shared.fullscreen.request_windowed();
    }

    /// Latest size wins; applied at the start of the next frame.
    pub fn resize(&self, width: u32, height: u32) {
        *self.shared.pending_resize.lock() = Some((width, height));
    }

    pub fn stop(&self) {
        self.shared.stop.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stop.is_stopped()
    }

    pub fn queue_depth(&self) -> usize {
        self.shared.events.len()
    }
}

/// Handles shared between the frame loop and whoever hosts it. Anything left
/// at its default is private to the loop.
#[derive(Default)]
pub struct LoopServices {
    pub metrics: MetricsHandle,
    /// Replaces the loop's own history; its capacity wins over the config.
    pub profile: Option<ProfileHandle>,
    pub cache: CacheCounters,
    pub resources: Option<Box<dyn ResourceStats>>,
}

/// Collaborators a frame loop is assembled from.
pub struct PanelParts {
    pub scene: Box<dyn Ui>,
    pub display: Box<dyn DisplayModeBackend>,
    pub fullscreen: FullscreenRequests,
    pub backend: Box<dyn RenderBackend + Send>,
    pub cursor_host: Box<dyn CursorHost + Send>,
}

pub struct FrameLoop {
    shared: Arc<PanelShared>,
    backend: Box<dyn RenderBackend + Send>,
    cursor_host: Box<dyn CursorHost + Send>,
    cursor: CursorController,
    resources: Box<dyn ResourceStats>,
    period: Duration,
    profile_enabled: bool,
    debug_text: bool,
    render_enabled: bool,
    text_scale: i32,
    stats: StatsAccumulator,
    metrics: MetricsHandle,
    profile: ProfileHandle,
    memory: MemoryProbe,
    memory_stats: Option<MemoryStats>,
    backlog: VecDeque<InputEvent>,
    last_tick: Instant,
}

impl FrameLoop {
    pub fn new(config: &LoopConfig, parts: PanelParts) -> (Self, PanelHandle) {
        let PanelParts {
            scene,
            display,
            fullscreen,
            backend,
            mut cursor_host,
        } = parts;

        let display = FullscreenSync::new(display, fullscreen.clone());
        let shared = Arc::new(PanelShared {
            render: Mutex::new(RenderState {
                scene,
                display,
                pointer: Coord::ZERO,
            }),
            events: EventQueue::new(),
            fullscreen,
            stop: StopSignal::default(),
            pending_resize: Mutex::new(None),
        });
        let cursor = CursorController::new(cursor_host.as_mut());
        let now = Instant::now();
        let mut memory = MemoryProbe::new();
        let memory_stats = config.debug_text.then(|| memory.sample());

        let frame_loop = Self {
            shared: Arc::clone(&shared),
            backend,
            cursor_host,
            cursor,
            resources: Box::new(NoResourceStats),
            period: config.frame_period(),
            profile_enabled: config.profile,
            debug_text: config.debug_text,
            render_enabled: config.render_enabled,
            text_scale: config.text_scale.max(1),
            stats: StatsAccumulator::new(config.stats_window(), now),
            metrics: MetricsHandle::default(),
            profile: ProfileHandle::with_capacity(config.profile_history),
            memory,
            memory_stats,
            backlog: VecDeque::new(),
            last_tick: now,
        };
        (frame_loop, PanelHandle { shared })
    }

    pub fn with_resource_stats(mut self, resources: Box<dyn ResourceStats>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Publishes profile frames into `profile` instead of a private history.
    pub fn with_profile(mut self, profile: ProfileHandle) -> Self {
        self.profile = profile;
        self
    }

    /// Reads hit/miss traffic from counters the resource layer already holds.
    pub fn with_cache_counters(mut self, counters: CacheCounters) -> Self {
        self.stats.set_counters(counters);
        self
    }

    /// Applies the host-supplied collaborators in one go.
    pub fn with_services(self, services: LoopServices) -> Self {
        let LoopServices {
            metrics,
            profile,
            cache,
            resources,
        } = services;
        let frame_loop = self.with_metrics(metrics).with_cache_counters(cache);
        let frame_loop = match profile {
            Some(profile) => frame_loop.with_profile(profile),
            None => frame_loop,
        };
        match resources {
            Some(resources) => frame_loop.with_resource_stats(resources),
            None => frame_loop,
        }
    }

    pub fn handle(&self) -> PanelHandle {
        PanelHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn metrics_handle(&self) -> MetricsHandle {
        self.metrics.clone()
    }

    pub fn profile_handle(&self) -> ProfileHandle {
        self.profile.clone()
    }

    /// Hit/miss counters for the resource layer; reset every stats window.
    pub fn cache_counters(&self) -> CacheCounters {
        self.stats.counters()
    }

    /// Moves the loop onto its own thread; `on_exit` runs there once `run`
    /// has returned.
    pub fn start<F>(mut self, on_exit: F) -> io::Result<JoinHandle<Result<(), RenderError>>>
    where
        F: FnOnce() + Send + 'static,
    {
        thread::Builder::new()
            .name(LOOP_THREAD_NAME.to_string())
            .spawn(move || {
                let result = self.run();
                on_exit();
                result
            })
    }

    /// Runs frames until stopped. Scene errors are logged and skipped; a
    /// render error ends the loop and is returned.
    pub fn run(&mut self) -> Result<(), RenderError> {
        info!(
            frame_period_ms = self.period.as_millis() as u64,
            profile = self.profile_enabled,
            debug_text = self.debug_text,
            render_enabled = self.render_enabled,
            cursor_mode = ?self.cursor.mode(),
            "loop_config"
        );

        while !self.shared.stop.is_stopped() {
            if self.run_frame()? == FrameStatus::Stopped {
                break;
            }
        }

        info!("shutdown");
        Ok(())
    }

    fn run_frame(&mut self) -> Result<FrameStatus, RenderError> {
        let then = Instant::now();
        let mut profile = self.profile_enabled.then(|| ProfileFrame::begin(then));

        match self.update_and_draw(then, &mut profile) {
            Ok((update, render)) => self.stats.record_frame(update, render),
            Err(FrameError::Scene(error)) => {
                warn!(error = %error, "frame_transient_error");
            }
            Err(FrameError::Render(error)) => {
                error!(error = %error, "frame_render_failed");
                return Err(error);
            }
        }

        let sleep = compute_pacing_sleep(then.elapsed(), self.period);
        if !sleep.is_zero() && self.shared.stop.wait_timeout(sleep) {
            return Ok(FrameStatus::Stopped);
        }
        mark(&mut profile, "wait");

        if let Some(snapshot) = self.stats.maybe_snapshot(Instant::now()) {
            self.metrics.publish(snapshot);
            if self.debug_text {
                self.memory_stats = Some(self.memory.sample());
            }
            info!(
                fps = snapshot.fps,
                texture_hits = snapshot.texture_hits,
                texture_misses = snapshot.texture_misses,
                update_avg_ms = snapshot.update.avg_ms,
                render_avg_ms = snapshot.render.avg_ms,
                "loop_metrics"
            );
        }

        if let Some(frame) = profile {
            self.profile.publish(frame);
        }
        Ok(FrameStatus::Continue)
    }

    fn update_and_draw(
        &mut self,
        then: Instant,
        profile: &mut Option<ProfileFrame>,
    ) -> Result<(Duration, Duration), FrameError> {
        self.apply_pending_resize()?;

        self.update(then)?;
        mark(profile, "dispatch");
        let update_done = Instant::now();

        self.draw(profile)?;
        let render = update_done.elapsed();
        Ok((update_done.saturating_duration_since(then), render))
    }

    fn apply_pending_resize(&mut self) -> Result<(), RenderError> {
        let Some((width, height)) = self.shared.pending_resize.lock().take() else {
            return Ok(());
        };
        self.backend.resize(width, height)?;
        self.shared.render.lock().scene.resize(width, height);
        Ok(())
    }

    fn update(&mut self, now: Instant) -> Result<(), SceneError> {
        let delta = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;

        let mut guard = self.shared.render.lock();
        let state = &mut *guard;
        let dispatched = state.scene.tick(delta).and_then(|()| {
            self.backlog.extend(self.shared.events.drain_all());
            dispatch_backlog(state.scene.as_mut(), &mut state.pointer, &mut self.backlog)
        });
        state.display.reconcile();
        dispatched
    }

    fn draw(&mut self, profile: &mut Option<ProfileFrame>) -> Result<(), FrameError> {
        let overlay = (self.render_enabled && self.debug_text).then(|| self.overlay_data());
        if self.render_enabled {
            self.backend.render_deferred()?;
            mark(profile, "texrt");
        }

        let mut frame = self.backend.frame();
        let (pointer, cursor) = {
            let mut state = self.shared.render.lock();
            if self.render_enabled {
                frame.clear(CLEAR_COLOR);
                mark(profile, "cls");
                state.scene.draw(&mut frame)?;
                mark(profile, "draw");
                if let Some(overlay) = &overlay {
                    draw_overlay(&mut frame, self.text_scale, overlay);
                }
                if let Some(tooltip) = state.scene.tooltip(state.pointer) {
                    draw_tooltip(&mut frame, state.pointer, &tooltip);
                }
            }
            (state.pointer, state.scene.cursor(state.pointer))
        };
        self.cursor
            .update(pointer, &cursor, self.cursor_host.as_mut(), &mut frame);
        drop(frame);

        self.backend.present()?;
        mark(profile, "aux");
        Ok(())
    }

    fn overlay_data(&self) -> OverlayData {
        OverlayData {
            stats: self.stats.last(),
            memory: self.memory_stats,
            layer_cache: self.resources.layer_cache(),
            render_targets: self.backend.render_target_count(),
            pending_loads: self.resources.pending_loads(),
            loaded_count: self.resources.loaded_count(),
            input_queue_depth: self.shared.events.len(),
        }
    }
}

/// Dispatches in FIFO order; on error the failed event is dropped and the
/// rest stay queued for the next frame.
fn dispatch_backlog(
    scene: &mut dyn Ui,
    pointer: &mut Coord,
    backlog: &mut VecDeque<InputEvent>,
) -> Result<(), SceneError> {
    while let Some(event) = backlog.pop_front() {
        dispatch_event(scene, pointer, event)?;
    }
    Ok(())
}

fn dispatch_event(scene: &mut dyn Ui, pointer: &mut Coord, event: InputEvent) -> Result<(), SceneError> {
    match event.kind {
        InputKind::KeyDown { code, modifiers } => scene.key_down(code, modifiers),
        InputKind::KeyUp { code, modifiers } => scene.key_up(code, modifiers),
        InputKind::KeyChar { ch } => scene.key_char(ch),
        InputKind::PointerDown { position, button } => scene.pointer_down(position, button),
        InputKind::PointerUp { position, button } => scene.pointer_up(position, button),
        InputKind::PointerMove { position } => {
            *pointer = position;
            scene.pointer_move(position)
        }
        InputKind::PointerWheel { position, delta } => scene.pointer_wheel(position, delta),
    }
}

fn mark(profile: &mut Option<ProfileFrame>, stage: &'static str) {
    if let Some(frame) = profile {
        frame.tick(stage);
    }
}

/// Time left in the period, measured from the frame start so that slow
/// frames are not followed by a full extra sleep.
pub(crate) fn compute_pacing_sleep(elapsed: Duration, period: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::thread;

    use super::*;
    use crate::app::cursor::{CursorError, CursorImage, CursorResource};
    use crate::app::fullscreen::{DisplayMode, DisplayModeError};
    use crate::app::input::{KeyCode, ModifiersState, PointerButton};
    use crate::app::rendering::{Image, PixelFrame};

    type Log = Arc<StdMutex<Vec<String>>>;

    const RED: Rgba = [255, 0, 0, 255];
    const SCENE_FILL: Rgba = [20, 40, 60, 255];

    struct FakeScene {
        log: Log,
        fail_char: Option<char>,
        draw_failures: Arc<AtomicUsize>,
        draw_work_ms: Arc<AtomicU64>,
        cursor: CursorResource,
    }

    impl FakeScene {
        fn push(&self, entry: String) {
            self.log.lock().expect("log").push(entry);
        }
    }

    impl Ui for FakeScene {
        fn tick(&mut self, _delta: Duration) -> Result<(), SceneError> {
            self.push("tick".to_string());
            Ok(())
        }

        fn key_down(&mut self, code: KeyCode, _modifiers: ModifiersState) -> Result<(), SceneError> {
            self.push(format!("down {code:?}"));
            Ok(())
        }

        fn key_up(&mut self, code: KeyCode, _modifiers: ModifiersState) -> Result<(), SceneError> {
            self.push(format!("up {code:?}"));
            Ok(())
        }

        fn key_char(&mut self, ch: char) -> Result<(), SceneError> {
            self.push(format!("char {ch}"));
            if self.fail_char == Some(ch) {
                return Err(SceneError::NotReady("text field"));
            }
            Ok(())
        }

        fn pointer_down(&mut self, position: Coord, _button: PointerButton) -> Result<(), SceneError> {
            self.push(format!("press {},{}", position.x, position.y));
            Ok(())
        }

        fn pointer_up(&mut self, position: Coord, _button: PointerButton) -> Result<(), SceneError> {
            self.push(format!("release {},{}", position.x, position.y));
            Ok(())
        }

        fn pointer_move(&mut self, position: Coord) -> Result<(), SceneError> {
            self.push(format!("move {},{}", position.x, position.y));
            Ok(())
        }

        fn pointer_wheel(&mut self, _position: Coord, delta: i32) -> Result<(), SceneError> {
            self.push(format!("wheel {delta}"));
            Ok(())
        }

        fn draw(&mut self, frame: &mut PixelFrame<'_>) -> Result<(), SceneError> {
            let failures = self.draw_failures.load(Ordering::SeqCst);
            if failures > 0 {
                self.draw_failures.store(failures - 1, Ordering::SeqCst);
                return Err(SceneError::NotReady("widgets"));
            }
            let work = self.draw_work_ms.load(Ordering::SeqCst);
            if work > 0 {
                thread::sleep(Duration::from_millis(work));
            }
            frame.fill_rect(Coord::ZERO, frame.size(), SCENE_FILL);
            self.push("draw".to_string());
            Ok(())
        }

        fn cursor(&self, _pointer: Coord) -> CursorResource {
            self.cursor.clone()
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.push(format!("resize {width}x{height}"));
        }
    }

    struct FakeBackend {
        buffer: Vec<u8>,
        width: u32,
        height: u32,
        presented: Arc<StdMutex<Vec<u8>>>,
        present_count: Arc<AtomicUsize>,
        fail_present: Arc<AtomicBool>,
    }

    impl RenderBackend for FakeBackend {
        fn frame(&mut self) -> PixelFrame<'_> {
            PixelFrame::new(&mut self.buffer, self.width, self.height)
        }

        fn present(&mut self) -> Result<(), RenderError> {
            if self.fail_present.load(Ordering::SeqCst) {
                return Err(RenderError::ContextLost("device removed".to_string()));
            }
            *self.presented.lock().expect("presented") = self.buffer.clone();
            self.present_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
            self.width = width;
            self.height = height;
            self.buffer = vec![0; (width * height * 4) as usize];
            Ok(())
        }
    }

    struct FakeDisplay {
        log: Log,
        mode: DisplayMode,
    }

    impl DisplayModeBackend for FakeDisplay {
        fn current_mode(&self) -> DisplayMode {
            self.mode
        }

        fn apply(&mut self, mode: DisplayMode) -> Result<(), DisplayModeError> {
            self.log.lock().expect("log").push(format!("display {mode:?}"));
            self.mode = mode;
            Ok(())
        }
    }

    struct SoftwareOnlyHost;

    impl CursorHost for SoftwareOnlyHost {
        fn max_cursor_colors(&self) -> u32 {
            0
        }

        fn install_cursor(&mut self, _image: &Image, _hotspot: Coord) -> Result<(), CursorError> {
            Err(CursorError::Unsupported)
        }
    }

    struct Harness {
        log: Log,
        presented: Arc<StdMutex<Vec<u8>>>,
        present_count: Arc<AtomicUsize>,
        fail_present: Arc<AtomicBool>,
        draw_failures: Arc<AtomicUsize>,
        draw_work_ms: Arc<AtomicU64>,
    }

    impl Harness {
        fn entries(&self) -> Vec<String> {
            self.log.lock().expect("log").clone()
        }

        fn presented_pixel(&self, x: usize, y: usize, width: usize) -> Rgba {
            let presented = self.presented.lock().expect("presented");
            let offset = (y * width + x) * 4;
            [
                presented[offset],
                presented[offset + 1],
                presented[offset + 2],
                presented[offset + 3],
            ]
        }
    }

    fn test_config() -> LoopConfig {
        LoopConfig {
            frame_period_ms: 1,
            text_scale: 1,
            ..LoopConfig::default()
        }
    }

    fn build_with(
        config: &LoopConfig,
        fail_char: Option<char>,
        cursor: CursorResource,
    ) -> (FrameLoop, PanelHandle, Harness) {
        let log: Log = Arc::default();
        let harness = Harness {
            log: Arc::clone(&log),
            presented: Arc::default(),
            present_count: Arc::default(),
            fail_present: Arc::default(),
            draw_failures: Arc::default(),
            draw_work_ms: Arc::default(),
        };
        let parts = PanelParts {
            scene: Box::new(FakeScene {
                log: Arc::clone(&log),
                fail_char,
                draw_failures: Arc::clone(&harness.draw_failures),
                draw_work_ms: Arc::clone(&harness.draw_work_ms),
                cursor,
            }),
            display: Box::new(FakeDisplay {
                log,
                mode: DisplayMode::Windowed,
            }),
            fullscreen: FullscreenRequests::default(),
            backend: Box::new(FakeBackend {
                buffer: vec![0; 64 * 48 * 4],
                width: 64,
                height: 48,
                presented: Arc::clone(&harness.presented),
                present_count: Arc::clone(&harness.present_count),
                fail_present: Arc::clone(&harness.fail_present),
            }),
            cursor_host: Box::new(SoftwareOnlyHost),
        };
        let (frame_loop, handle) = FrameLoop::new(config, parts);
        (frame_loop, handle, harness)
    }

    fn build(config: &LoopConfig) -> (FrameLoop, PanelHandle, Harness) {
        build_with(config, None, CursorResource::Loading)
    }

    fn key_char(ch: char) -> InputEvent {
        InputEvent::new(InputKind::KeyChar { ch })
    }

    fn pointer_move(x: i32, y: i32) -> InputEvent {
        InputEvent::new(InputKind::PointerMove {
            position: Coord::new(x, y),
        })
    }

    #[test]
    fn pacing_sleep_is_remainder_of_period() {
        let period = Duration::from_millis(20);
        assert_eq!(
            compute_pacing_sleep(Duration::from_millis(5), period),
            Duration::from_millis(15)
        );
        assert_eq!(compute_pacing_sleep(period, period), Duration::ZERO);
        assert_eq!(
            compute_pacing_sleep(Duration::from_millis(35), period),
            Duration::ZERO
        );
    }

    #[test]
    fn events_dispatch_in_fifo_order_and_track_pointer() {
        let (mut frame_loop, handle, harness) = build(&test_config());
        handle.on_input_event(key_char('a'));
        handle.on_input_event(pointer_move(5, 6));
        handle.on_input_event(InputEvent::new(InputKind::PointerDown {
            position: Coord::new(5, 6),
            button: PointerButton::Left,
        }));
        handle.on_input_event(key_char('b'));

        assert_eq!(frame_loop.run_frame().expect("frame"), FrameStatus::Continue);
        assert_eq!(
            harness.entries(),
            vec!["tick", "char a", "move 5,6", "press 5,6", "char b", "draw"]
        );
        assert_eq!(frame_loop.shared.render.lock().pointer, Coord::new(5, 6));
        assert_eq!(handle.queue_depth(), 0);
    }

    #[test]
    fn transient_dispatch_error_keeps_remaining_events() {
        let (mut frame_loop, handle, harness) =
            build_with(&test_config(), Some('x'), CursorResource::Loading);
        handle.on_input_event(key_char('a'));
        handle.on_input_event(key_char('x'));
        handle.on_input_event(key_char('b'));

        assert_eq!(frame_loop.run_frame().expect("frame"), FrameStatus::Continue);
        assert_eq!(harness.entries(), vec!["tick", "char a", "char x"]);

        handle.on_input_event(key_char('c'));
        frame_loop.run_frame().expect("frame");
        assert_eq!(
            harness.entries()[3..],
            ["tick", "char b", "char c", "draw"].map(String::from)
        );
    }

    #[test]
    fn transient_draw_errors_do_not_stop_the_loop() {
        let (mut frame_loop, _handle, harness) = build(&test_config());
        harness.draw_failures.store(2, Ordering::SeqCst);

        for _ in 0..3 {
            assert_eq!(frame_loop.run_frame().expect("frame"), FrameStatus::Continue);
        }
        assert_eq!(harness.present_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn render_error_propagates_out_of_run() {
        let (mut frame_loop, _handle, harness) = build(&test_config());
        harness.fail_present.store(true, Ordering::SeqCst);

        let result = frame_loop.run();
        assert!(matches!(result, Err(RenderError::ContextLost(_))));
        assert!(!FrameError::from(RenderError::ContextLost(String::new())).is_transient());
        assert!(FrameError::from(SceneError::NotReady("x")).is_transient());
    }

    #[test]
    fn stop_from_another_thread_ends_run() {
        let (mut frame_loop, handle, harness) = build(&test_config());

        thread::scope(|scope| {
            scope.spawn(|| {
                thread::sleep(Duration::from_millis(30));
                handle.stop();
            });
            frame_loop.run().expect("clean stop");
        });

        assert!(handle.is_stopped());
        assert!(harness.present_count.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn started_loop_runs_on_named_thread_until_stopped() {
        let (frame_loop, handle, harness) = build(&test_config());
        let (exit_tx, exit_rx) = std::sync::mpsc::channel();

        let join = frame_loop
            .start(move || {
                let name = thread::current().name().map(str::to_string);
                exit_tx.send(name).expect("exit notification");
            })
            .expect("spawn loop");
        thread::sleep(Duration::from_millis(20));
        handle.stop();

        join.join().expect("loop thread").expect("clean stop");
        assert_eq!(
            exit_rx.recv().expect("exit notification"),
            Some("frame-loop".to_string())
        );
        assert!(harness.present_count.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn stop_interrupts_pacing_sleep() {
        let config = LoopConfig {
            frame_period_ms: 10_000,
            ..test_config()
        };
        let (mut frame_loop, handle, _harness) = build(&config);
        let started = Instant::now();

        let status = thread::scope(|scope| {
            scope.spawn(|| {
                thread::sleep(Duration::from_millis(20));
                handle.stop();
            });
            frame_loop.run_frame().expect("frame")
        });

        assert_eq!(status, FrameStatus::Stopped);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn frames_are_paced_to_the_period() {
        let config = LoopConfig {
            frame_period_ms: 10,
            ..test_config()
        };
        let (mut frame_loop, _handle, _harness) = build(&config);
        let started = Instant::now();
        for _ in 0..3 {
            frame_loop.run_frame().expect("frame");
        }
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(30));
        assert!(elapsed < Duration::from_millis(30 + 150), "took {elapsed:?}");
    }

    #[test]
    fn slow_frame_is_not_followed_by_a_sleep() {
        let config = LoopConfig {
            frame_period_ms: 50,
            ..test_config()
        };
        let (mut frame_loop, _handle, harness) = build(&config);
        harness.draw_work_ms.store(60, Ordering::SeqCst);

        let started = Instant::now();
        frame_loop.run_frame().expect("frame");
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(60));
        assert!(elapsed < Duration::from_millis(60 + 40), "took {elapsed:?}");
    }

    #[test]
    fn fullscreen_request_is_applied_before_draw() {
        let (mut frame_loop, handle, harness) = build(&test_config());
        handle.request_fullscreen();
        frame_loop.run_frame().expect("frame");

        let entries = harness.entries();
        let display = entries
            .iter()
            .position(|entry| entry == "display Fullscreen")
            .expect("display change");
        let draw = entries
            .iter()
            .position(|entry| entry == "draw")
            .expect("draw");
        assert!(display < draw);
    }

    #[test]
    fn input_event_reconciles_when_render_lock_is_free() {
        let (_frame_loop, handle, harness) = build(&test_config());
        handle.request_fullscreen();
        handle.on_input_event(key_char('a'));

        assert_eq!(harness.entries(), vec!["display Fullscreen"]);
    }

    #[test]
    fn disabled_rendering_still_draws_cursor() {
        let config = LoopConfig {
            render_enabled: false,
            ..test_config()
        };
        let cursor = CursorResource::ready(CursorImage {
            name: "arrow".to_string(),
            image: Image::filled(2, 2, RED),
            hotspot: Coord::ZERO,
        });
        let (mut frame_loop, handle, harness) = build_with(&config, None, cursor);
        handle.on_input_event(pointer_move(3, 3));
        frame_loop.run_frame().expect("frame");

        assert!(!harness.entries().contains(&"draw".to_string()));
        assert_eq!(harness.presented_pixel(3, 3, 64), RED);
        assert_eq!(harness.presented_pixel(10, 10, 64), [0, 0, 0, 0]);
    }

    #[test]
    fn overlay_is_drawn_over_the_scene_when_enabled() {
        let (mut plain_loop, _plain_handle, plain) = build(&test_config());
        plain_loop.run_frame().expect("frame");
        assert_eq!(plain.presented_pixel(2, 3, 64), SCENE_FILL);

        let config = LoopConfig {
            debug_text: true,
            ..test_config()
        };
        let (mut frame_loop, _handle, harness) = build(&config);
        frame_loop.run_frame().expect("frame");
        assert_ne!(harness.presented_pixel(2, 3, 64), SCENE_FILL);
    }

    #[test]
    fn resize_reaches_backend_and_scene() {
        let (mut frame_loop, handle, harness) = build(&test_config());
        handle.resize(40, 30);
        handle.resize(32, 24);
        frame_loop.run_frame().expect("frame");

        assert_eq!(harness.entries()[0], "resize 32x24");
        assert_eq!(harness.presented.lock().expect("presented").len(), 32 * 24 * 4);
    }

    #[test]
    fn stats_window_publishes_fps_and_cache_counters() {
        let config = LoopConfig {
            stats_window_ms: 1,
            ..test_config()
        };
        let (mut frame_loop, _handle, _harness) = build(&config);
        let counters = frame_loop.cache_counters();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();

        frame_loop.run_frame().expect("frame");
        let stats = frame_loop.metrics_handle().snapshot();
        assert_eq!(stats.fps, 1);
        assert_eq!((stats.texture_hits, stats.texture_misses), (2, 1));
        assert_eq!(counters.pending(), (0, 0));
    }

    struct FakeResources;

    impl ResourceStats for FakeResources {
        fn layer_cache(&self) -> Option<(usize, usize)> {
            Some((5, 4))
        }

        fn pending_loads(&self) -> usize {
            2
        }

        fn loaded_count(&self) -> usize {
            7
        }
    }

    #[test]
    fn host_services_are_fed_by_the_loop() {
        let config = LoopConfig {
            stats_window_ms: 1,
            profile: true,
            ..test_config()
        };
        let cache = CacheCounters::default();
        let profile = ProfileHandle::with_capacity(8);
        let metrics = MetricsHandle::default();
        let (frame_loop, _handle, _harness) = build(&config);
        let mut frame_loop = frame_loop.with_services(LoopServices {
            metrics: metrics.clone(),
            profile: Some(profile.clone()),
            cache: cache.clone(),
            resources: Some(Box::new(FakeResources)),
        });

        cache.record_hit();
        cache.record_miss();
        cache.record_miss();
        frame_loop.run_frame().expect("frame");

        let stats = metrics.snapshot();
        assert_eq!((stats.texture_hits, stats.texture_misses), (1, 2));
        assert_eq!(cache.pending(), (0, 0));
        assert_eq!(profile.len(), 1);
        let overlay = frame_loop.overlay_data();
        assert_eq!(overlay.layer_cache, Some((5, 4)));
        assert_eq!((overlay.pending_loads, overlay.loaded_count), (2, 7));
    }

    #[test]
    fn profile_frames_record_each_stage() {
        let config = LoopConfig {
            profile: true,
            profile_history: 4,
            ..test_config()
        };
        let (mut frame_loop, _handle, _harness) = build(&config);
        for _ in 0..6 {
            frame_loop.run_frame().expect("frame");
        }

        let profile = frame_loop.profile_handle();
        assert_eq!(profile.len(), 4);
        let stages: Vec<&str> = profile
            .latest()
            .expect("latest frame")
            .samples()
            .iter()
            .map(|(stage, _)| *stage)
            .collect();
        assert_eq!(stages, vec!["dispatch", "texrt", "cls", "draw", "aux", "wait"]);
    }
}
