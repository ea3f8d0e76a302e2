//! Engine configuration.

/// Startup settings consumed by [`Runtime::run`].
///
/// [`Runtime::run`]: crate::window::Runtime::run
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,

    /// Clear color applied at the start of every frame, linear RGBA.
    pub clear_color: [f32; 4],

    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior). FIFO is broadly supported.
    pub present_mode: wgpu::PresentMode,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            window_title: "tiamat".to_string(),
            window_width: 1280,
            window_height: 720,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
        }
    }
}
