use std::sync::Arc;
use ash::vk;
use crate::renderer::config::RenderConfig;
use crate::renderer::contexts::device_ctx::RenderDeviceContext;
use crate::renderer::error::InitError;
use crate::renderer::resources::shader::GraphicsShader;

/// Responsibilities:
/// - Own the pipeline layout and the graphics pipeline drawn every frame
/// - Bind the pipeline and issue its draw into a command buffer
pub struct RenderPipelineContext {
    pub layout: vk::PipelineLayout,
    pub pipeline: vk::Pipeline,
    device: Arc<ash::Device>,
}

impl RenderPipelineContext {
    pub fn new(
        dev_ctx: &RenderDeviceContext,
        render_pass: vk::RenderPass,
        config: &RenderConfig,
    ) -> Result<Self, InitError> {
        let device = dev_ctx.device.logical.clone();
        let shader = GraphicsShader::triangle(device.clone(), config.shader_dir.as_deref())?;

        let mut ctx = Self {
            layout: vk::PipelineLayout::null(),
            pipeline: vk::Pipeline::null(),
            device,
        };

        ctx.layout = unsafe {
            ctx.device.create_pipeline_layout(&vk::PipelineLayoutCreateInfo::default(), None)?
        };

        let stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(shader.vert.handle)
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(shader.frag.handle)
                .name(c"main"),
        ];

        // Vertices are generated from gl_VertexIndex
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default();
        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST);

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);
        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(vk::PolygonMode::FILL)
            .cull_mode(vk::CullModeFlags::NONE)
            .front_face(vk::FrontFace::CLOCKWISE)
            .line_width(1.0);
        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);
        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(true)
            .depth_write_enable(true)
            .depth_compare_op(vk::CompareOp::LESS);

        let blend_attachments = [
            vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA),
        ];
        let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
            .attachments(&blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default()
            .dynamic_states(&dynamic_states);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blend)
            .dynamic_state(&dynamic_state)
            .layout(ctx.layout)
            .render_pass(render_pass)
            .subpass(0);

        ctx.pipeline = unsafe {
            ctx.device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
                .map_err(|(_, err)| err)?[0]
        };

        Ok(ctx)
    }

    /// Records the draw of the pipeline's single triangle. Must be called
    /// inside a render pass compatible with the one the pipeline was built for.
    pub fn draw(&self, device: &ash::Device, cmd: vk::CommandBuffer) {
        unsafe {
            device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, self.pipeline);
            device.cmd_draw(cmd, 3, 1, 0, 0);
        }
    }
}

impl Drop for RenderPipelineContext {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}
