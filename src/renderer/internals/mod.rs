/// "Internals" refers to device-independent policy used to build the contexts.

pub mod per_image;
pub mod swapchain;
