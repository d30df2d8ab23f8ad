use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use ash::vk;
use crate::renderer::error::InitError;

const TRIANGLE_VERT_SPV: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/shaders/triangle.vert.spv"));
const TRIANGLE_FRAG_SPV: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/shaders/triangle.frag.spv"));

/// A single SPIR-V shader module, destroyed on drop.
pub struct ShaderModule {
    pub handle: vk::ShaderModule,
    device: Arc<ash::Device>,
}

impl ShaderModule {
    /// `bytes` must be SPIR-V: a multiple of four bytes starting with the magic number.
    /// Alignment does not matter.
    pub fn from_spv(device: Arc<ash::Device>, bytes: &[u8]) -> Result<Self, InitError> {
        let code = ash::util::read_spv(&mut Cursor::new(bytes))?;
        let shader_module_info = vk::ShaderModuleCreateInfo::default()
            .code(&code);

        let handle = unsafe {
            device.create_shader_module(&shader_module_info, None)?
        };

        Ok(Self { handle, device })
    }

    pub fn from_file(device: Arc<ash::Device>, filepath: &Path) -> Result<Self, InitError> {
        let bytes = std::fs::read(filepath)?;
        Self::from_spv(device, &bytes)
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.handle, None);
        }
    }
}

pub struct GraphicsShader {
    pub vert: ShaderModule,
    pub frag: ShaderModule,
}

impl GraphicsShader {
    /// Loads `<shader_dir>/triangle.vert.spv` and `<shader_dir>/triangle.frag.spv`,
    /// or the copies compiled into the binary when no directory is given.
    pub fn triangle(device: Arc<ash::Device>, shader_dir: Option<&Path>) -> Result<Self, InitError> {
        match shader_dir {
            Some(dir) => {
                log::info!("Loading shaders from {:?}", dir);
                Ok(Self {
                    vert: ShaderModule::from_file(device.clone(), &dir.join("triangle.vert.spv"))?,
                    frag: ShaderModule::from_file(device, &dir.join("triangle.frag.spv"))?,
                })
            }
            None => Ok(Self {
                vert: ShaderModule::from_spv(device.clone(), TRIANGLE_VERT_SPV)?,
                frag: ShaderModule::from_spv(device, TRIANGLE_FRAG_SPV)?,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_shaders_are_spirv() {
        for bytes in [TRIANGLE_VERT_SPV, TRIANGLE_FRAG_SPV] {
            let words = ash::util::read_spv(&mut Cursor::new(bytes)).unwrap();
            assert_eq!(words[0], 0x0723_0203);
        }
    }

    #[test]
    fn truncated_spirv_is_rejected() {
        let bytes = &TRIANGLE_VERT_SPV[..TRIANGLE_VERT_SPV.len() - 1];
        assert!(ash::util::read_spv(&mut Cursor::new(bytes)).is_err());
    }
}
