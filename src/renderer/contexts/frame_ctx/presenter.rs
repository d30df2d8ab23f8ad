use ash::prelude::VkResult;
use ash::vk;
use crate::renderer::contexts::device_ctx::RenderDeviceContext;
use crate::renderer::contexts::device_ctx::target::RenderTarget;
use crate::renderer::contexts::frame_ctx::FrameTarget;
use crate::renderer::contexts::pipeline_ctx::RenderPipelineContext;

/// Runs the frame steps on the real device queue and swapchain.
pub struct Presenter<'a> {
    pub dev: &'a RenderDeviceContext,
    pub target: &'a RenderTarget,
    pub pipeline: &'a RenderPipelineContext,
    pub clear_color: [f32; 4],
}

impl FrameTarget for Presenter<'_> {
    fn slot_count(&self) -> usize {
        self.target.image_count()
    }

    fn wait_for_slot(&mut self, slot: usize) -> VkResult<()> {
        let fences = [self.target.slot(slot).in_flight];
        unsafe {
            self.dev.logical().wait_for_fences(&fences, true, u64::MAX)
        }
    }

    fn acquire_image(&mut self, slot: usize) -> VkResult<(u32, bool)> {
        unsafe {
            self.target.swapchain_loader().acquire_next_image(
                self.target.swapchain(),
                u64::MAX,
                self.target.slot(slot).image_available,
                vk::Fence::null(),
            )
        }
    }

    fn reset_slot(&mut self, slot: usize) -> VkResult<()> {
        let frame = self.target.slot(slot);
        unsafe {
            self.dev.logical().reset_fences(&[frame.in_flight])?;
            self.dev.logical().reset_command_pool(
                frame.command_pool,
                vk::CommandPoolResetFlags::empty(),
            )
        }
    }

    fn record(&mut self, slot: usize, image_index: u32) -> VkResult<()> {
        let device = self.dev.logical();
        let cmd = self.target.slot(slot).command_buffer;
        let extent = self.target.extent();

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: self.clear_color,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];
        let render_pass_info = vk::RenderPassBeginInfo::default()
            .render_pass(self.target.render_pass())
            .framebuffer(self.target.framebuffer(image_index))
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(&clear_values);

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };

        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe {
            device.begin_command_buffer(cmd, &begin_info)?;
            device.cmd_begin_render_pass(cmd, &render_pass_info, vk::SubpassContents::INLINE);
            device.cmd_set_viewport(cmd, 0, &[viewport]);
            device.cmd_set_scissor(cmd, 0, &[scissor]);
            self.pipeline.draw(device, cmd);
            device.cmd_end_render_pass(cmd);
            device.end_command_buffer(cmd)
        }
    }

    fn submit(&mut self, slot: usize) -> VkResult<()> {
        let frame = self.target.slot(slot);
        let wait_semaphores = [frame.image_available];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [frame.command_buffer];
        let signal_semaphores = [frame.render_complete];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.dev.logical().queue_submit(
                self.dev.queue().handle,
                &[submit_info],
                frame.in_flight,
            )
        }
    }

    fn present(&mut self, slot: usize, image_index: u32) -> VkResult<bool> {
        let wait_semaphores = [self.target.slot(slot).render_complete];
        let swapchains = [self.target.swapchain()];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            self.target
                .swapchain_loader()
                .queue_present(self.dev.queue().handle, &present_info)
        }
    }
}
