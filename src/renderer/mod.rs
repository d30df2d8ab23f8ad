pub mod config;
pub mod error;

mod contexts;
mod internals;
mod resources;

pub use contexts::frame_ctx::{FrameInfo, FrameTarget, RenderFrameContext};
pub use contexts::device_ctx::device::{find_memory_type, find_memory_type_index, pick_physical_device};
pub use contexts::device_ctx::queue::QueueFamily;
pub use internals::swapchain::{
    choose_extent, choose_image_count, choose_present_mode, choose_surface_format,
};

use std::sync::{Arc, Mutex};
use ash::vk;
use gpu_allocator::vulkan::Allocator;
use winit::window::Window;
use crate::renderer::config::RenderConfig;
use crate::renderer::contexts::device_ctx::RenderDeviceContext;
use crate::renderer::contexts::device_ctx::target::RenderTarget;
use crate::renderer::contexts::frame_ctx::presenter::Presenter;
use crate::renderer::contexts::pipeline_ctx::RenderPipelineContext;
use crate::renderer::error::{FrameError, InitError};

pub struct Renderer {
    // Field order is drop order
    pip: RenderPipelineContext,
    frm: RenderFrameContext,
    tgt: RenderTarget,
    dev: RenderDeviceContext,

    clear_color: [f32; 4],
}

impl Renderer {
    pub fn new(
        window: Arc<Window>,
        config: &RenderConfig,
    ) -> Result<Self, InitError> {
        let dev = RenderDeviceContext::new(&window)?;
        let tgt = RenderTarget::new(window, &dev, config)?;
        let pip = RenderPipelineContext::new(&dev, tgt.render_pass(), config)?;
        let frm = RenderFrameContext::new();

        Ok(Self {
            pip,
            frm,
            tgt,
            dev,
            clear_color: config.clear_color,
        })
    }

    /// Renders and presents one frame.
    ///
    /// [`FrameError::SessionEnd`] means the swapchain no longer fits the
    /// window. The caller should stop drawing and drop the renderer.
    pub fn draw(&mut self) -> Result<FrameInfo, FrameError> {
        let mut presenter = Presenter {
            dev: &self.dev,
            target: &self.tgt,
            pipeline: &self.pip,
            clear_color: self.clear_color,
        };
        self.frm.draw_frame(&mut presenter)
    }

    pub fn frame_count(&self) -> u64 {
        self.frm.frame_count()
    }

    pub fn image_count(&self) -> usize {
        self.tgt.image_count()
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.tgt.extent()
    }

    pub fn surface_format(&self) -> vk::SurfaceFormatKHR {
        self.tgt.surface_format()
    }

    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.tgt.present_mode()
    }

    pub fn memory_allocator(&self) -> &Mutex<Allocator> {
        self.dev.memory_allocator()
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.tgt.window
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Nothing may be destroyed while the GPU still uses it
        if let Err(err) = self.dev.wait_idle() {
            log::error!("Failed to wait for device idle before teardown: {}", err);
        }
    }
}
