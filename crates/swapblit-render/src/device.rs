// SPDX-License-Identifier: CEPL-1.0
use std::rc::Rc;

use ash::vk;
use thiserror::Error;

use crate::handle::{
    Buffer, BufferInfo, BufferSlice, Image, ImageInfo, ImageView, ImageViewInfo, Sampler,
    SamplerInfo, Shader, ShaderInfo,
};

/// Optional capabilities that change how resources are built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceFeatures {
    /// `VK_AMD_shader_fragment_mask`: lets a shader fetch multisampled
    /// texels through the fragment mask.
    pub amd_shader_fragment_mask: bool,
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("out of device memory: {requested} bytes requested, limit is {limit}")]
    OutOfDeviceMemory { requested: u64, limit: u64 },

    #[error("format {format:?} not supported for {usage}")]
    FormatNotSupported {
        format: vk::Format,
        usage: &'static str,
    },

    #[error("shader module `{0}` is not available")]
    MissingShaderModule(&'static str),
}

/// Resource factory. Creation failures are fatal to the caller.
pub trait Device {
    fn features(&self) -> DeviceFeatures;

    fn create_image(
        &self,
        info: &ImageInfo,
        memory: vk::MemoryPropertyFlags,
    ) -> Result<Rc<Image>, DeviceError>;

    fn create_image_view(
        &self,
        image: &Rc<Image>,
        info: &ImageViewInfo,
    ) -> Result<Rc<ImageView>, DeviceError>;

    fn create_buffer(
        &self,
        info: &BufferInfo,
        memory: vk::MemoryPropertyFlags,
    ) -> Result<Rc<Buffer>, DeviceError>;

    /// Returns a fresh host-mapped region spanning the whole buffer.
    fn allocate_buffer_slice(&self, buffer: &Buffer) -> Result<BufferSlice, DeviceError>;

    fn create_sampler(&self, info: &SamplerInfo) -> Result<Rc<Sampler>, DeviceError>;

    fn create_shader(&self, info: ShaderInfo) -> Result<Rc<Shader>, DeviceError>;
}
