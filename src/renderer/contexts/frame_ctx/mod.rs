pub mod frame;
pub mod presenter;

use ash::prelude::VkResult;
use crate::renderer::error::{classify_swapchain_result, FrameError, SessionEndReason};

/// The device-side steps of one frame, addressed by frame slot.
///
/// [`RenderFrameContext::draw_frame`] calls these in a fixed order. The
/// swapchain-backed implementation is [`presenter::Presenter`].
pub trait FrameTarget {
    /// Number of frame slots, equal to the number of presentable images.
    fn slot_count(&self) -> usize;

    /// Blocks until the GPU has retired the last submission made from `slot`.
    /// Does not reset anything.
    fn wait_for_slot(&mut self, slot: usize) -> VkResult<()>;

    /// Acquires the next presentable image, signaling the slot's acquire
    /// semaphore once it is ready. Returns the image index and whether the
    /// swapchain is suboptimal.
    fn acquire_image(&mut self, slot: usize) -> VkResult<(u32, bool)>;

    /// Unsignals the slot's fence and resets its command pool.
    fn reset_slot(&mut self, slot: usize) -> VkResult<()>;

    /// Records the slot's command buffer, rendering into image `image_index`.
    fn record(&mut self, slot: usize, image_index: u32) -> VkResult<()>;

    /// Submits the slot's command buffer, signaling its fence on completion.
    fn submit(&mut self, slot: usize) -> VkResult<()>;

    /// Queues image `image_index` for presentation. Returns whether the
    /// swapchain is suboptimal.
    fn present(&mut self, slot: usize, image_index: u32) -> VkResult<bool>;
}

/// What a successfully presented frame used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub frame: u64,
    pub slot: usize,
    pub image_index: u32,
}

/// Responsibilities:
/// - Pick the frame slot for every frame
/// - Drive the acquire, record, submit and present cycle
/// - Turn swapchain results into session end or fatal errors
pub struct RenderFrameContext {
    frame_counter: u64,
}

impl RenderFrameContext {
    pub fn new() -> Self {
        Self {
            frame_counter: 0,
        }
    }

    /// Number of frames presented so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }

    /// Runs one full frame against `target`.
    ///
    /// The slot's fence is waited on before the acquire, so the slot's acquire
    /// semaphore never gets signaled while an older submission still waits on
    /// it. The fence and command pool are only reset after the acquire
    /// succeeded, so a failed acquire leaves no fence that would never be
    /// signaled again.
    pub fn draw_frame<T: FrameTarget + ?Sized>(
        &mut self,
        target: &mut T,
    ) -> Result<FrameInfo, FrameError> {
        let frame = self.frame_counter;
        let slot = (frame % target.slot_count() as u64) as usize;

        target.wait_for_slot(slot)?;

        let (image_index, acquire_suboptimal) = target
            .acquire_image(slot)
            .map_err(classify_swapchain_result)?;
        if acquire_suboptimal {
            // The semaphore is signaled, so the frame still has to be submitted
            log::debug!("Acquired image {} from a suboptimal swapchain", image_index);
        }

        target.reset_slot(slot)?;
        target.record(slot, image_index)?;
        target.submit(slot)?;

        let present_suboptimal = target
            .present(slot, image_index)
            .map_err(classify_swapchain_result)?;
        self.frame_counter += 1;

        if present_suboptimal || acquire_suboptimal {
            return Err(FrameError::SessionEnd(SessionEndReason::Suboptimal));
        }

        Ok(FrameInfo {
            frame,
            slot,
            image_index,
        })
    }
}

impl Default for RenderFrameContext {
    fn default() -> Self {
        Self::new()
    }
}
