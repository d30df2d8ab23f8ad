use ash::vk;
use winit::dpi::PhysicalSize;

/// Format + color space pairs tried in order before falling back to whatever
/// the surface lists first.
const PREFERRED_SURFACE_FORMATS: [vk::SurfaceFormatKHR; 2] = [
    vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_SRGB,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    },
    vk::SurfaceFormatKHR {
        format: vk::Format::R8G8B8A8_SRGB,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    },
];

/// Number of images to request from the surface.
///
/// Never fewer than two and never fewer than the surface minimum. A request
/// above the surface maximum is lowered to it, where `max_image_count == 0`
/// means the surface has no upper limit.
pub fn choose_image_count(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    requested: u32,
) -> u32 {
    let requested = if capabilities.max_image_count > 0 {
        requested.min(capabilities.max_image_count)
    } else {
        requested
    };
    requested.max(capabilities.min_image_count).max(2)
}

pub fn choose_surface_format(
    formats: &[vk::SurfaceFormatKHR],
) -> Option<vk::SurfaceFormatKHR> {
    PREFERRED_SURFACE_FORMATS
        .iter()
        .find_map(|preferred| {
            formats.iter().find(|format| {
                format.format == preferred.format && format.color_space == preferred.color_space
            })
        })
        .or(formats.first())
        .copied()
}

/// FIFO is the only mode every surface must support, so it is always the
/// last resort.
pub fn choose_present_mode(
    present_modes: &[vk::PresentModeKHR],
    vsync: bool,
) -> vk::PresentModeKHR {
    if vsync {
        return vk::PresentModeKHR::FIFO;
    }
    [vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::MAILBOX]
        .into_iter()
        .find(|mode| present_modes.contains(mode))
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    window_size: PhysicalSize<u32>,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: window_size.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: window_size.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

pub fn choose_pre_transform(
    capabilities: &vk::SurfaceCapabilitiesKHR,
) -> vk::SurfaceTransformFlagsKHR {
    if capabilities
        .supported_transforms
        .contains(vk::SurfaceTransformFlagsKHR::IDENTITY)
    {
        vk::SurfaceTransformFlagsKHR::IDENTITY
    } else {
        capabilities.current_transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capabilities(min_image_count: u32, max_image_count: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count,
            max_image_count,
            current_extent: vk::Extent2D { width: u32::MAX, height: u32::MAX },
            min_image_extent: vk::Extent2D { width: 16, height: 32 },
            max_image_extent: vk::Extent2D { width: 4096, height: 2048 },
            ..Default::default()
        }
    }

    fn chosen(formats: &[vk::SurfaceFormatKHR]) -> Option<(vk::Format, vk::ColorSpaceKHR)> {
        choose_surface_format(formats).map(|f| (f.format, f.color_space))
    }

    fn format(format: vk::Format) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }

    #[test]
    fn image_count_is_at_least_two_min_and_requested() {
        for min in 1..=8 {
            for requested in 0..=8 {
                let caps = capabilities(min, 0);
                let expected = 2u32.max(min).max(requested);
                assert_eq!(choose_image_count(&caps, requested), expected);
            }
        }
    }

    #[test]
    fn image_count_request_is_capped_by_surface_max() {
        assert_eq!(choose_image_count(&capabilities(2, 3), 8), 3);
        assert_eq!(choose_image_count(&capabilities(3, 3), 2), 3);
        assert_eq!(choose_image_count(&capabilities(1, 16), 8), 8);
    }

    #[test]
    fn single_image_surface_with_only_unorm_format() {
        let caps = capabilities(1, 0);
        let formats = [format(vk::Format::R8G8B8A8_UNORM)];

        assert_eq!(choose_image_count(&caps, 2), 2);
        assert_eq!(chosen(&formats), Some((vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR)));
    }

    #[test]
    fn srgb_formats_are_preferred_in_order() {
        let formats = [
            format(vk::Format::R8G8B8A8_UNORM),
            format(vk::Format::R8G8B8A8_SRGB),
            format(vk::Format::B8G8R8A8_SRGB),
        ];
        assert_eq!(chosen(&formats).map(|f| f.0), Some(vk::Format::B8G8R8A8_SRGB));
        assert_eq!(chosen(&formats[..2]).map(|f| f.0), Some(vk::Format::R8G8B8A8_SRGB));
    }

    #[test]
    fn srgb_format_with_other_color_space_is_not_preferred() {
        let formats = [
            format(vk::Format::A2B10G10R10_UNORM_PACK32),
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT,
            },
        ];
        assert_eq!(chosen(&formats).map(|f| f.0), Some(vk::Format::A2B10G10R10_UNORM_PACK32));
    }

    #[test]
    fn no_formats_yields_none() {
        assert!(choose_surface_format(&[]).is_none());
    }

    #[test]
    fn vsync_always_uses_fifo() {
        let modes = [
            vk::PresentModeKHR::IMMEDIATE,
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::FIFO,
        ];
        assert_eq!(choose_present_mode(&modes, true), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn no_vsync_prefers_immediate_then_mailbox() {
        let all = [
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::IMMEDIATE,
        ];
        assert_eq!(choose_present_mode(&all, false), vk::PresentModeKHR::IMMEDIATE);
        assert_eq!(choose_present_mode(&all[..2], false), vk::PresentModeKHR::MAILBOX);
        assert_eq!(choose_present_mode(&all[..1], false), vk::PresentModeKHR::FIFO);
        assert_eq!(
            choose_present_mode(&[vk::PresentModeKHR::FIFO_RELAXED], false),
            vk::PresentModeKHR::FIFO,
        );
    }

    #[test]
    fn defined_current_extent_is_used_as_is() {
        let mut caps = capabilities(2, 0);
        caps.current_extent = vk::Extent2D { width: 640, height: 480 };
        let extent = choose_extent(&caps, PhysicalSize::new(1920, 1080));
        assert_eq!(extent, vk::Extent2D { width: 640, height: 480 });
    }

    #[test]
    fn undefined_extent_is_clamped_into_bounds() {
        let caps = capabilities(2, 0);
        let sizes = [0, 1, 16, 31, 32, 800, 2048, 2049, 4096, 10_000, u32::MAX - 1];
        for &width in &sizes {
            for &height in &sizes {
                let extent = choose_extent(&caps, PhysicalSize::new(width, height));
                assert!((16..=4096).contains(&extent.width), "width {}", extent.width);
                assert!((32..=2048).contains(&extent.height), "height {}", extent.height);
            }
        }

        let extent = choose_extent(&caps, PhysicalSize::new(800, 600));
        assert_eq!(extent, vk::Extent2D { width: 800, height: 600 });
    }

    #[test]
    fn identity_transform_is_preferred() {
        let mut caps = capabilities(2, 0);
        caps.supported_transforms = vk::SurfaceTransformFlagsKHR::IDENTITY
            | vk::SurfaceTransformFlagsKHR::ROTATE_90;
        caps.current_transform = vk::SurfaceTransformFlagsKHR::ROTATE_90;
        assert_eq!(choose_pre_transform(&caps), vk::SurfaceTransformFlagsKHR::IDENTITY);

        caps.supported_transforms = vk::SurfaceTransformFlagsKHR::ROTATE_90;
        assert_eq!(choose_pre_transform(&caps), vk::SurfaceTransformFlagsKHR::ROTATE_90);
    }
}
