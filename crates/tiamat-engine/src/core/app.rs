use winit::event::WindowEvent;

use crate::backend::wgpu::WgpuBackend;
use crate::engine::{Engine, EngineError};
use crate::time::FrameTime;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by the runtime.
///
/// Lifecycle: `init` once after the GPU context is ready, `draw` once per
/// rendered frame (the runtime submits the frame after it returns), then
/// `teardown` before engine resources are finalized on shutdown.
pub trait App {
    /// Allocate resources and register render passes here.
    fn init(&mut self, engine: &mut Engine<WgpuBackend<'_>>) -> Result<(), EngineError>;

    /// Per-frame update: edit buffers and passes; submission happens after
    /// this returns.
    fn draw(&mut self, engine: &mut Engine<WgpuBackend<'_>>, time: FrameTime) -> AppControl;

    /// Last callback before the engine tears its resources down.
    fn teardown(&mut self, engine: &mut Engine<WgpuBackend<'_>>) {
        let _ = engine;
    }

    /// Called when an engine operation driven by the runtime fails. The
    /// default gives up; override to log and continue.
    fn on_error(&mut self, error: &EngineError) -> AppControl {
        let _ = error;
        AppControl::Exit
    }

    /// Raw window events, before the runtime's own handling.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }
}
