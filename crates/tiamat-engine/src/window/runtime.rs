use std::time::Instant;

use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::backend::wgpu::{WgpuBackend, WgpuInit};
use crate::core::{App, AppControl};
use crate::engine::Engine;
use crate::settings::EngineSettings;
use crate::time::{FrameClock, RedrawGate};

/// Entry point for the runtime: one window, one engine, one app.
pub struct Runtime;

impl Runtime {
    /// Runs the app until it exits or the window closes. Blocks the calling
    /// thread for the lifetime of the event loop.
    pub fn run<A>(settings: EngineSettings, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = RuntimeState {
            settings,
            app,
            entry: None,
            exit_requested: false,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,
    gate: RedrawGate,

    window: Window,

    #[borrows(window)]
    #[covariant]
    engine: Engine<WgpuBackend<'this>>,
}

struct RuntimeState<A>
where
    A: App + 'static,
{
    settings: EngineSettings,
    app: A,
    entry: Option<WindowEntry>,
    exit_requested: bool,
}

impl<A> RuntimeState<A>
where
    A: App + 'static,
{
    fn create_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.settings.window_title.clone())
            .with_inner_size(LogicalSize::new(
                self.settings.window_width as f64,
                self.settings.window_height as f64,
            ));

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = WgpuInit {
            prefer_srgb: self.settings.prefer_srgb,
            present_mode: self.settings.present_mode,
            ..WgpuInit::default()
        };
        let clear_color = self.settings.clear_color;

        let mut entry = WindowEntryTryBuilder {
            clock: FrameClock::default(),
            gate: RedrawGate::sixty_hz(),
            window,
            engine_builder: |w| {
                let backend = pollster::block_on(WgpuBackend::new(w, gpu_init))
                    .context("GPU initialization failed")?;
                Ok::<_, anyhow::Error>(Engine::new(backend))
            },
        }
        .try_build()?;

        entry.with_engine_mut(|engine| engine.set_clear_color(clear_color));

        // Resource setup happens before the first frame.
        let app = &mut self.app;
        let mut init_result = Ok(());
        entry.with_engine_mut(|engine| init_result = app.init(engine));
        if let Err(err) = init_result {
            log::error!("app init failed: {err}");
            return Err(err.into());
        }

        self.entry = Some(entry);
        Ok(())
    }

    /// Tears the app and engine down in order: app callback, then engine
    /// resources, then the window itself.
    fn destroy_entry(&mut self) {
        let Some(mut entry) = self.entry.take() else {
            return;
        };
        let app = &mut self.app;
        entry.with_engine_mut(|engine| {
            app.teardown(engine);
            engine.finalize();
        });
    }

    fn render_frame(&mut self) -> AppControl {
        let Some(entry) = self.entry.as_mut() else {
            return AppControl::Continue;
        };

        if !entry.with_gate_mut(|gate| gate.ready(Instant::now())) {
            return AppControl::Continue;
        }

        let app = &mut self.app;
        let mut control = AppControl::Continue;
        entry.with_mut(|fields| {
            let ft = fields.clock.tick();

            control = app.draw(fields.engine, ft);
            if control == AppControl::Exit {
                return;
            }

            if let Err(err) = fields.engine.draw_frame() {
                log::error!("frame submission failed: {err}");
                control = app.on_error(&err);
            }
        });

        control
    }
}

impl<A> ApplicationHandler for RuntimeState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(err) = self.create_entry(event_loop) {
            log::error!("failed to start runtime: {err:#}");
            self.exit_requested = true;
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Poll so the redraw gate keeps ticking at its fixed cadence.
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.destroy_entry();
            self.exit_requested = true;
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.destroy_entry();
                self.exit_requested = true;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.with_engine_mut(|engine| {
                        engine.resize_surface(new_size.width, new_size.height);
                    });
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.entry.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_engine_mut(|engine| {
                        engine.resize_surface(new_size.width, new_size.height);
                    });
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::RedrawRequested => {
                if self.render_frame() == AppControl::Exit {
                    self.destroy_entry();
                    self.exit_requested = true;
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}
