use std::sync::Arc;
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::Window;
use crate::renderer::config::RenderConfig;
use crate::renderer::contexts::device_ctx::RenderDeviceContext;
use crate::renderer::contexts::frame_ctx::frame::FrameSlot;
use crate::renderer::error::InitError;
use crate::renderer::internals::per_image::PerImage;
use crate::renderer::internals::swapchain;

pub const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// Presentation target of the renderer, encapsulating the window, surface, and swapchain
///
/// Also owns everything sized or counted by the swapchain: the shared depth
/// buffer, the render pass, one framebuffer per image and one [`FrameSlot`]
/// per image.
pub struct RenderTarget {
    pub window: Arc<Window>,

    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
    surface_format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,

    swapchain: vk::SwapchainKHR,
    swapchain_loader: ash::khr::swapchain::Device,
    extent: vk::Extent2D,
    images: Vec<vk::Image>,

    depth_image: vk::Image,
    depth_memory: vk::DeviceMemory,
    depth_view: vk::ImageView,

    render_pass: vk::RenderPass,
    per_image: PerImage<vk::ImageView, vk::Framebuffer, FrameSlot>,

    device: Arc<ash::Device>,
}

impl RenderTarget {
    pub fn new(
        window: Arc<Window>,
        dev: &RenderDeviceContext,
        config: &RenderConfig,
    ) -> Result<Self, InitError> {
        let ins = &dev.instance;
        let mut target = Self {
            window,
            surface: vk::SurfaceKHR::null(),
            surface_loader: ash::khr::surface::Instance::new(&ins.entry, &ins.instance),
            surface_format: vk::SurfaceFormatKHR::default(),
            present_mode: vk::PresentModeKHR::FIFO,
            swapchain: vk::SwapchainKHR::null(),
            swapchain_loader: ash::khr::swapchain::Device::new(&ins.instance, dev.logical()),
            extent: vk::Extent2D::default(),
            images: Vec::new(),
            depth_image: vk::Image::null(),
            depth_memory: vk::DeviceMemory::null(),
            depth_view: vk::ImageView::null(),
            render_pass: vk::RenderPass::null(),
            per_image: PerImage::new(),
            device: dev.device.logical.clone(),
        };

        target.create_surface(dev)?;
        target.create_swapchain(dev, config)?;
        target.create_depth_buffer(dev)?;
        target.create_render_pass()?;
        target.create_per_image_resources(dev)?;

        log::info!(
            "Created swapchain: {} images, {:?} {:?}, {:?}, {}x{}",
            target.image_count(),
            target.surface_format.format,
            target.surface_format.color_space,
            target.present_mode,
            target.extent.width,
            target.extent.height,
        );

        Ok(target)
    }

    fn create_surface(&mut self, dev: &RenderDeviceContext) -> Result<(), InitError> {
        self.surface = unsafe {
            ash_window::create_surface(
                &dev.instance.entry,
                &dev.instance.instance,
                self.window.display_handle()?.as_raw(),
                self.window.window_handle()?.as_raw(),
                None,
            )?
        };

        let queue_family = dev.queue_family_index();
        let supported = unsafe {
            self.surface_loader.get_physical_device_surface_support(
                dev.physical(),
                queue_family,
                self.surface,
            )?
        };
        if !supported {
            return Err(InitError::UnsupportedSurface { queue_family });
        }

        Ok(())
    }

    fn create_swapchain(
        &mut self,
        dev: &RenderDeviceContext,
        config: &RenderConfig,
    ) -> Result<(), InitError> {
        let (capabilities, formats, present_modes) = unsafe {
            (
                self.surface_loader
                    .get_physical_device_surface_capabilities(dev.physical(), self.surface)?,
                self.surface_loader
                    .get_physical_device_surface_formats(dev.physical(), self.surface)?,
                self.surface_loader
                    .get_physical_device_surface_present_modes(dev.physical(), self.surface)?,
            )
        };

        let min_image_count = swapchain::choose_image_count(&capabilities, config.image_count);
        self.surface_format = swapchain::choose_surface_format(&formats)
            .ok_or(InitError::NoSurfaceFormat)?;
        self.present_mode = swapchain::choose_present_mode(&present_modes, config.vsync);
        self.extent = swapchain::choose_extent(&capabilities, self.window.inner_size());

        let swapchain_info = vk::SwapchainCreateInfoKHR::default()
            .surface(self.surface)
            .min_image_count(min_image_count)
            .image_format(self.surface_format.format)
            .image_color_space(self.surface_format.color_space)
            .image_extent(self.extent)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(swapchain::choose_pre_transform(&capabilities))
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(self.present_mode)
            .clipped(true)
            .image_array_layers(1);

        self.swapchain = unsafe {
            self.swapchain_loader.create_swapchain(&swapchain_info, None)?
        };

        // The driver may hand out more images than requested
        self.images = unsafe {
            self.swapchain_loader.get_swapchain_images(self.swapchain)?
        };
        if self.images.len() as u32 != min_image_count {
            log::debug!("Requested {} swapchain images, got {}", min_image_count, self.images.len());
        }

        Ok(())
    }

    fn create_depth_buffer(&mut self, dev: &RenderDeviceContext) -> Result<(), InitError> {
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(DEPTH_FORMAT)
            .extent(vk::Extent3D {
                width: self.extent.width,
                height: self.extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);
        self.depth_image = unsafe {
            self.device.create_image(&image_info, None)?
        };

        let requirements = unsafe {
            self.device.get_image_memory_requirements(self.depth_image)
        };
        let memory_type_index = dev.find_memory_type(
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;
        let allocate_info = vk::MemoryAllocateInfo::default()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);

        unsafe {
            self.depth_memory = self.device.allocate_memory(&allocate_info, None)?;
            self.device.bind_image_memory(self.depth_image, self.depth_memory, 0)?;
        }

        self.depth_view = create_image_view(
            &self.device,
            self.depth_image,
            DEPTH_FORMAT,
            vk::ImageAspectFlags::DEPTH,
        )?;

        Ok(())
    }

    fn create_render_pass(&mut self) -> Result<(), InitError> {
        let attachments = [
            vk::AttachmentDescription::default()
                .format(self.surface_format.format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::PRESENT_SRC_KHR),
            vk::AttachmentDescription::default()
                .format(DEPTH_FORMAT)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        ];

        let color_refs = [vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let depth_ref = vk::AttachmentReference {
            attachment: 1,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };
        let subpasses = [
            vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .color_attachments(&color_refs)
                .depth_stencil_attachment(&depth_ref),
        ];

        // Orders this frame's color and depth writes after any earlier use,
        // including the previous frame's depth writes to the shared depth image
        let dependencies = [
            vk::SubpassDependency::default()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(0)
                .src_stage_mask(
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                        | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
                        | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
                )
                .src_access_mask(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
                .dst_stage_mask(
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                        | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                )
                .dst_access_mask(
                    vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                        | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                ),
        ];

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        self.render_pass = unsafe {
            self.device.create_render_pass(&render_pass_info, None)?
        };

        Ok(())
    }

    fn create_per_image_resources(&mut self, dev: &RenderDeviceContext) -> Result<(), InitError> {
        let device = &self.device;
        let format = self.surface_format.format;
        let depth_view = self.depth_view;
        let render_pass = self.render_pass;
        let extent = self.extent;
        let queue_family_index = dev.queue_family_index();

        self.per_image.fill(
            &self.images,
            |image| create_image_view(device, image, format, vk::ImageAspectFlags::COLOR),
            |view| {
                let attachments = [*view, depth_view];
                let framebuffer_info = vk::FramebufferCreateInfo::default()
                    .render_pass(render_pass)
                    .attachments(&attachments)
                    .width(extent.width)
                    .height(extent.height)
                    .layers(1);
                unsafe {
                    device.create_framebuffer(&framebuffer_info, None)
                }
            },
            || FrameSlot::new(device.clone(), queue_family_index),
        )?;

        Ok(())
    }

    pub fn swapchain(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    pub fn swapchain_loader(&self) -> &ash::khr::swapchain::Device {
        &self.swapchain_loader
    }

    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    /// Framebuffer wrapping the swapchain image with the given index.
    pub fn framebuffer(&self, image_index: u32) -> vk::Framebuffer {
        self.per_image.framebuffers[image_index as usize]
    }

    pub fn slot(&self, slot: usize) -> &FrameSlot {
        &self.per_image.slots[slot]
    }

    /// Number of presentable images. Also the number of framebuffers and frame slots.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn surface_format(&self) -> vk::SurfaceFormatKHR {
        self.surface_format
    }

    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }
}

fn create_image_view(
    device: &ash::Device,
    image: vk::Image,
    format: vk::Format,
    aspect_mask: vk::ImageAspectFlags,
) -> Result<vk::ImageView, vk::Result> {
    let view_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });

    unsafe {
        device.create_image_view(&view_info, None)
    }
}

impl Drop for RenderTarget {
    /// The caller must make sure the device is idle first.
    fn drop(&mut self) {
        self.per_image.slots.clear();
        unsafe {
            for framebuffer in self.per_image.framebuffers.drain(..) {
                self.device.destroy_framebuffer(framebuffer, None);
            }
            self.device.destroy_image_view(self.depth_view, None);
            for view in self.per_image.views.drain(..) {
                self.device.destroy_image_view(view, None);
            }
            self.device.destroy_image(self.depth_image, None);
            self.device.free_memory(self.depth_memory, None);
            self.device.destroy_render_pass(self.render_pass, None);
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            self.surface_loader.destroy_surface(self.surface, None);
        }
        log::debug!("Destroyed swapchain and surface");
    }
}
