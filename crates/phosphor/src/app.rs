use std::sync::{Arc, Mutex};
use std::time::Instant;

use eframe::egui;

use phosphor_audio::Playback;
use phosphor_core::{AudioSource, ScopeConfig, SignalSource};
use phosphor_render::{EventSender, RenderError, RenderSettings, ScopeDriver, ScopeEvent, ScopeRenderer, Size};

/// State shared between the egui layout code and the glow paint callback.
struct GpuScope {
    renderer: Option<ScopeRenderer>,
    driver: ScopeDriver,
    settings: RenderSettings,
    posted_size: Size,
    fatal: Option<String>,
}

impl GpuScope {
    fn paint(&mut self, gl: &glow::Context, viewport: [i32; 4], now: f64) {
        if self.fatal.is_some() {
            return;
        }

        let size = Size::new(viewport[2].max(0) as u32, viewport[3].max(0) as u32);
        if size != self.posted_size {
            self.driver.events().send(ScopeEvent::Resize(size));
            self.posted_size = size;
        }

        // Lazy-initialize on the first callback, where the GL context is current
        if self.renderer.is_none() {
            match ScopeRenderer::new(gl, &self.settings) {
                Ok(renderer) => self.renderer = Some(renderer),
                Err(err) => return self.fail(err),
            }
        }

        if let Some(renderer) = &mut self.renderer {
            if let Err(err) = renderer.render(gl, &mut self.driver, now, viewport) {
                self.fail(err);
            }
        }
    }

    fn fail(&mut self, err: RenderError) {
        log::error!("scope renderer failed: {err}");
        self.fatal = Some(err.to_string());
    }
}

pub struct ScopeApp {
    scope: Arc<Mutex<GpuScope>>,
    events: EventSender,
    start: Instant,
    _playback: Option<Playback>,
}

impl ScopeApp {
    fn new(scope: Arc<Mutex<GpuScope>>, events: EventSender, playback: Option<Playback>) -> Self {
        Self {
            scope,
            events,
            start: Instant::now(),
            _playback: playback,
        }
    }

    fn handle_keys(&self, ctx: &egui::Context) {
        let (start, restart, close) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::R),
                i.key_pressed(egui::Key::Escape),
            )
        });
        if restart {
            self.events.send(ScopeEvent::RestartPlayback);
        } else if start {
            self.events.send(ScopeEvent::StartPlayback);
        }
        if close {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

impl eframe::App for ScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        let failed = self.scope.lock().map_or(true, |scope| scope.fatal.is_some());
        if failed {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::default())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let scope = Arc::clone(&self.scope);
                let start = self.start;

                let cb = egui_glow::CallbackFn::new(move |info, painter| {
                    let vp = info.viewport_in_pixels();
                    let viewport = [vp.left_px, vp.from_bottom_px, vp.width_px, vp.height_px];
                    let Ok(mut scope) = scope.lock() else {
                        return;
                    };
                    scope.paint(painter.gl(), viewport, start.elapsed().as_secs_f64());
                });

                ui.painter().add(egui::PaintCallback {
                    rect,
                    callback: Arc::new(cb),
                });
            });

        ctx.request_repaint();
    }

    fn on_exit(&mut self, gl: Option<&glow::Context>) {
        let (Some(gl), Ok(mut scope)) = (gl, self.scope.lock()) else {
            return;
        };
        if let Some(mut renderer) = scope.renderer.take() {
            renderer.destroy(gl);
            log::debug!("scope GL resources released");
        }
    }
}

/// Open the scope window and run until it is closed.
pub fn run(config: ScopeConfig, source: SignalSource, audio: Option<Arc<AudioSource>>) -> anyhow::Result<()> {
    let mut driver = ScopeDriver::new(&config, source);

    let playback = audio.and_then(|audio| match Playback::open(audio) {
        Ok(playback) => Some(playback),
        Err(err) => {
            log::warn!("{err}; advancing playback from the frame clock");
            None
        }
    });
    driver.set_audio_output(playback.is_some());
    if driver.stage().audio().is_some() {
        log::info!("press Space to start playback, R to restart");
    }

    let events = driver.events();
    let scope = Arc::new(Mutex::new(GpuScope {
        renderer: None,
        driver,
        settings: RenderSettings::from(&config),
        posted_size: Size::default(),
        fatal: None,
    }));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 800.0])
            .with_title("phosphor"),
        vsync: true,
        ..Default::default()
    };

    let app_scope = Arc::clone(&scope);
    eframe::run_native(
        "phosphor",
        options,
        Box::new(move |_cc| Ok(Box::new(ScopeApp::new(app_scope, events, playback)))),
    )
    .map_err(|err| anyhow::anyhow!("window error: {err}"))?;

    let fatal = scope.lock().ok().and_then(|mut scope| scope.fatal.take());
    match fatal {
        Some(msg) => anyhow::bail!("rendering stopped: {msg}"),
        None => Ok(()),
    }
}
