use std::path::PathBuf;
use serde::Deserialize;

/// Contains configuration options for the renderer like vsync and the swapchain depth
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// `true` presents in FIFO order without tearing, `false` picks the lowest-latency
    /// present mode the surface offers.
    pub vsync: bool,
    /// Requested number of presentable images. The surface may raise it.
    pub image_count: u32,
    pub clear_color: [f32; 4],
    /// Directory holding `triangle.vert.spv` and `triangle.frag.spv`. When unset the
    /// binaries compiled into the executable are used.
    pub shader_dir: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            vsync: true,
            image_count: 2,
            clear_color: [1.0, 0.5, 1.0, 1.0],
            shader_dir: None,
        }
    }
}
