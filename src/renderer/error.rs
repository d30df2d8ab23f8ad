use ash::vk;
use thiserror::Error;

/// Fatal failure while building the GPU context, the swapchain or the pipeline.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("No Vulkan capable physical device found")]
    NoSuitableDevice,

    #[error("No queue family supports both graphics and transfer operations")]
    NoSuitableQueue,

    #[error("Queue family {queue_family} cannot present to the window surface")]
    UnsupportedSurface { queue_family: u32 },

    #[error("Surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("No memory type in filter {type_bits:#034b} has properties {properties:?}")]
    NoSuitableMemoryType {
        type_bits: u32,
        properties: vk::MemoryPropertyFlags,
    },

    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),

    #[error("Allocator error: {0}")]
    Allocator(#[from] gpu_allocator::AllocationError),

    #[error("Window handle error: {0}")]
    WindowHandle(#[from] raw_window_handle::HandleError),

    #[error("Shader error: {0}")]
    Shader(#[from] std::io::Error),
}

/// Why a rendering session ended without a crash.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndReason {
    #[error("surface is out of date")]
    OutOfDate,

    #[error("surface is suboptimal")]
    Suboptimal,

    #[error("surface was lost")]
    SurfaceLost,
}

/// Failure of a single pass through the acquire/record/submit/present cycle.
#[derive(Error, Debug)]
pub enum FrameError {
    /// The presentation surface no longer matches the window. The loop must
    /// stop and tear down normally.
    #[error("Session ended: {0}")]
    SessionEnd(SessionEndReason),

    /// Any other result code from the device. Fatal.
    #[error("Device error during frame: {0}")]
    Device(#[from] vk::Result),
}

impl FrameError {
    pub fn is_session_end(&self) -> bool {
        matches!(self, Self::SessionEnd(_))
    }
}

/// Surface trouble ends the session, anything else is a device failure.
pub(crate) fn classify_swapchain_result(result: vk::Result) -> FrameError {
    match result {
        vk::Result::ERROR_OUT_OF_DATE_KHR => FrameError::SessionEnd(SessionEndReason::OutOfDate),
        vk::Result::SUBOPTIMAL_KHR => FrameError::SessionEnd(SessionEndReason::Suboptimal),
        vk::Result::ERROR_SURFACE_LOST_KHR => FrameError::SessionEnd(SessionEndReason::SurfaceLost),
        other => FrameError::Device(other),
    }
}
