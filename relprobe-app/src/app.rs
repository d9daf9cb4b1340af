use std::sync::Arc;
use std::thread::{self, JoinHandle};

use ab_glyph::FontVec;
use anyhow::Result;
use pixels::{Pixels, SurfaceTexture};
use relprobe_core::{KeyPress, ResponseKey};
use relprobe_experiment::{run_session, ExperimentConfig, SessionTrial, TrialRecord};
use relprobe_render::{load_font, SkiaSurface};
use relprobe_timing::{FrameTimer, Timer};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::cli::Args;
use crate::surface::{ProxySurface, UserEvent};

const KEY_QUEUE: usize = 32;
const FRAME_LOG_INTERVAL: usize = 300;
const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 960;

/// Everything the session thread needs, handed over once the window exists.
struct SessionLaunch {
    config: ExperimentConfig,
    trials: Vec<SessionTrial>,
    keys: mpsc::Receiver<KeyPress>,
}

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    surface: Option<SkiaSurface>,
    font: Option<FontVec>,
    timer: FrameTimer,
    frames: usize,

    keys: mpsc::Sender<KeyPress>,
    launch: Option<SessionLaunch>,
    proxy: Option<EventLoopProxy<UserEvent>>,
    session: Option<JoinHandle<()>>,
    finished: bool,

    should_exit: bool,
}

impl App {
    pub fn new(args: Args, config: ExperimentConfig, trials: Vec<SessionTrial>) -> Result<Self> {
        let font = args.font.as_deref().map(load_font).transpose()?;
        if font.is_none() {
            warn!("no font given, buttons and notices are drawn without text");
        }
        let (keys, receiver) = mpsc::channel(KEY_QUEUE);

        Ok(Self {
            window: None,
            pixels: None,
            surface: None,
            font,
            timer: FrameTimer::new(),
            frames: 0,
            keys,
            launch: Some(SessionLaunch {
                config,
                trials,
                keys: receiver,
            }),
            proxy: None,
            session: None,
            finished: false,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;
        self.proxy = Some(event_loop.create_proxy());
        info!(
            platform = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            "starting session window"
        );

        let result = event_loop.run_app(&mut self);

        // An aborted session is left to die with the process.
        if self.finished {
            if let Some(handle) = self.session.take() {
                if handle.join().is_err() {
                    error!("session thread panicked");
                }
            }
        }
        result.map_err(Into::into)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow::anyhow!("no monitor available"))?;

        let refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let attributes = Window::default_attributes()
            .with_title("Relprobe")
            .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        info!(
            width = size.width,
            height = size.height,
            scale_factor = window.scale_factor(),
            refresh_hz = refresh_rate,
            "display configured"
        );

        let texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, texture)?);

        let mut surface = SkiaSurface::new(size.width, size.height)?;
        if let Some(font) = self.font.take() {
            surface = surface.with_font(font);
        }
        if let Some(launch) = &self.launch {
            let started = self.timer.now();
            let stimuli = launch.trials.iter().flat_map(|trial| {
                trial.inference.iter().chain(std::iter::once(trial.config.stimulus()))
            });
            let decoded = surface.prepare_stimuli(stimuli);
            info!(
                decoded,
                elapsed_ms = self.timer.elapsed(started).as_secs_f64() * 1e3,
                "stimuli decoded"
            );
        }
        self.surface = Some(surface);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);

        Ok(())
    }

    fn start_session(&mut self) -> Result<()> {
        let (Some(launch), Some(proxy)) = (self.launch.take(), self.proxy.clone()) else {
            return Ok(());
        };
        let handle = thread::Builder::new()
            .name("session".into())
            .spawn(move || session_thread(launch, proxy))?;
        self.session = Some(handle);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(surface)) = (self.pixels.as_mut(), self.surface.as_mut()) else {
            return Ok(());
        };
        let started = self.timer.now();
        if !surface.present(pixels.frame_mut()) {
            return Ok(());
        }
        pixels.render()?;

        let elapsed = self.timer.elapsed(started);
        self.timer.record_frame(elapsed);
        self.frames += 1;
        debug!(render_ms = elapsed.as_secs_f64() * 1e3, "frame presented");
        if self.frames % FRAME_LOG_INTERVAL == 0 {
            let stats = self.timer.calibration_stats();
            info!(
                frames = self.frames,
                average_ms = stats.average_frame_time_ns / 1e6,
                jitter_ms = stats.jitter_ns / 1e6,
                "render timing"
            );
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, event_loop: &ActiveEventLoop) {
        if code == KeyCode::Escape {
            info!("session aborted from keyboard");
            self.cleanup_and_exit(event_loop);
            return;
        }
        let Some(key) = response_key(code) else {
            return;
        };
        match self.keys.try_send(KeyPress::now(key)) {
            Ok(()) => {}
            Err(TrySendError::Full(press)) => warn!(key = %press.key, "key queue full, press dropped"),
            Err(TrySendError::Closed(_)) => debug!(%key, "session finished, press ignored"),
        }
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(size.width, size.height) {
                error!("failed to resize surface: {e}");
            }
            if let Err(e) = pixels.resize_buffer(size.width, size.height) {
                error!("failed to resize buffer: {e}");
            }
        }
        if let Some(surface) = &mut self.surface {
            if let Err(e) = surface.resize(size.width, size.height) {
                error!("failed to resize canvas: {e}");
            }
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
        debug!(width = size.width, height = size.height, "display resized");
    }

    fn finish_session(&mut self, records: Vec<TrialRecord>, event_loop: &ActiveEventLoop) {
        let answered = records.iter().filter(|r| !r.timed_out()).count();
        info!(trials = records.len(), answered, "session complete");
        self.finished = true;
        self.cleanup_and_exit(event_loop);
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        self.should_exit = true;
        event_loop.exit();
    }
}

fn session_thread(launch: SessionLaunch, proxy: EventLoopProxy<UserEvent>) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to start session runtime: {e}");
            return;
        }
    };

    let SessionLaunch {
        config,
        trials,
        mut keys,
    } = launch;
    let mut surface = ProxySurface::new(proxy.clone());
    let records = runtime.block_on(run_session(&config, &trials, &mut surface, &mut keys));

    if proxy.send_event(UserEvent::SessionFinished(records)).is_err() {
        debug!("event loop closed before session finished");
    }
}

fn response_key(code: KeyCode) -> Option<ResponseKey> {
    match code {
        KeyCode::ArrowUp => Some(ResponseKey::ArrowUp),
        KeyCode::ArrowLeft => Some(ResponseKey::ArrowLeft),
        KeyCode::ArrowRight => Some(ResponseKey::ArrowRight),
        KeyCode::ArrowDown => Some(ResponseKey::ArrowDown),
        KeyCode::Space => Some(ResponseKey::Space),
        _ => None,
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window_and_surface(event_loop) {
            error!("failed to create window and surface: {e}");
            event_loop.exit();
            return;
        }
        if let Err(e) = self.start_session() {
            error!("failed to start session thread: {e}");
            event_loop.exit();
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Surface(command) => {
                if let Some(surface) = &mut self.surface {
                    command.apply(surface);
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            UserEvent::SessionFinished(records) => self.finish_session(records, event_loop),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    error!("render failed: {e}");
                    self.cleanup_and_exit(event_loop);
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.handle_key(code, event_loop);
                }
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.handle_resize(size);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}
