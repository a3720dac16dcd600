// SPDX-License-Identifier: CEPL-1.0
//! Resource descriptors and the reference-counted handles a [`Device`] hands out.
//!
//! Handles are shared between their owner and any recorded command that uses
//! them, so dropping the owner's `Rc` never destroys a resource that is still
//! referenced by pending GPU work.
//!
//! [`Device`]: crate::Device

use std::fmt;
use std::rc::Rc;

use ash::vk;

/// Backend-assigned identity of a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ImageInfo {
    pub ty: vk::ImageType,
    pub format: vk::Format,
    pub sample_count: vk::SampleCountFlags,
    pub extent: vk::Extent3D,
    pub num_layers: u32,
    pub mip_levels: u32,
    pub usage: vk::ImageUsageFlags,
    pub stages: vk::PipelineStageFlags,
    pub access: vk::AccessFlags,
    pub tiling: vk::ImageTiling,
    pub layout: vk::ImageLayout,
}

impl Default for ImageInfo {
    fn default() -> Self {
        Self {
            ty: vk::ImageType::TYPE_2D,
            format: vk::Format::UNDEFINED,
            sample_count: vk::SampleCountFlags::TYPE_1,
            extent: vk::Extent3D {
                width: 1,
                height: 1,
                depth: 1,
            },
            num_layers: 1,
            mip_levels: 1,
            usage: vk::ImageUsageFlags::empty(),
            stages: vk::PipelineStageFlags::empty(),
            access: vk::AccessFlags::empty(),
            tiling: vk::ImageTiling::OPTIMAL,
            layout: vk::ImageLayout::GENERAL,
        }
    }
}

impl ImageInfo {
    /// Width and height of mip level 0.
    pub fn extent_2d(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.extent.width,
            height: self.extent.height,
        }
    }
}

#[derive(Debug)]
pub struct Image {
    id: ResourceId,
    info: ImageInfo,
    memory: vk::MemoryPropertyFlags,
}

impl Image {
    pub fn new(id: ResourceId, info: ImageInfo, memory: vk::MemoryPropertyFlags) -> Self {
        Self { id, info, memory }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    pub fn memory(&self) -> vk::MemoryPropertyFlags {
        self.memory
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ImageViewInfo {
    pub view_type: vk::ImageViewType,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
    pub aspects: vk::ImageAspectFlags,
    pub mip_index: u32,
    pub mip_count: u32,
    pub layer_index: u32,
    pub layer_count: u32,
}

impl ImageViewInfo {
    /// Single-mip, single-layer color view.
    pub fn color(
        view_type: vk::ImageViewType,
        format: vk::Format,
        usage: vk::ImageUsageFlags,
    ) -> Self {
        Self {
            view_type,
            format,
            usage,
            aspects: vk::ImageAspectFlags::COLOR,
            mip_index: 0,
            mip_count: 1,
            layer_index: 0,
            layer_count: 1,
        }
    }
}

#[derive(Debug)]
pub struct ImageView {
    id: ResourceId,
    image: Rc<Image>,
    info: ImageViewInfo,
}

impl ImageView {
    pub fn new(id: ResourceId, image: Rc<Image>, info: ImageViewInfo) -> Self {
        Self { id, image, info }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn image(&self) -> &Rc<Image> {
        &self.image
    }

    pub fn info(&self) -> &ImageViewInfo {
        &self.info
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BufferInfo {
    pub size: vk::DeviceSize,
    pub usage: vk::BufferUsageFlags,
    pub stages: vk::PipelineStageFlags,
    pub access: vk::AccessFlags,
}

#[derive(Debug)]
pub struct Buffer {
    id: ResourceId,
    info: BufferInfo,
    memory: vk::MemoryPropertyFlags,
}

impl Buffer {
    pub fn new(id: ResourceId, info: BufferInfo, memory: vk::MemoryPropertyFlags) -> Self {
        Self { id, info, memory }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn info(&self) -> &BufferInfo {
        &self.info
    }

    pub fn memory(&self) -> vk::MemoryPropertyFlags {
        self.memory
    }
}

/// A host-mapped backing region for a [`Buffer`].
///
/// Writing into a fresh slice never disturbs the region previously recorded
/// commands read from. The slice becomes the buffer's backing store once it is
/// handed to [`GraphicsContext::invalidate_buffer`].
///
/// [`GraphicsContext::invalidate_buffer`]: crate::GraphicsContext::invalidate_buffer
#[derive(Clone, Debug)]
pub struct BufferSlice {
    id: ResourceId,
    buffer: ResourceId,
    mapped: Vec<u8>,
}

impl BufferSlice {
    pub fn new(id: ResourceId, buffer: ResourceId, len: usize) -> Self {
        Self {
            id,
            buffer,
            mapped: vec![0; len],
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Buffer this slice was carved from.
    pub fn buffer(&self) -> ResourceId {
        self.buffer
    }

    pub fn len(&self) -> usize {
        self.mapped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapped.is_empty()
    }

    pub fn mapped(&self) -> &[u8] {
        &self.mapped
    }

    pub fn mapped_mut(&mut self) -> &mut [u8] {
        &mut self.mapped
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerInfo {
    pub mag_filter: vk::Filter,
    pub min_filter: vk::Filter,
    pub mipmap_mode: vk::SamplerMipmapMode,
    pub address_modes: [vk::SamplerAddressMode; 3],
    pub use_pixel_coordinates: bool,
}

impl Default for SamplerInfo {
    fn default() -> Self {
        Self {
            mag_filter: vk::Filter::NEAREST,
            min_filter: vk::Filter::NEAREST,
            mipmap_mode: vk::SamplerMipmapMode::NEAREST,
            address_modes: [vk::SamplerAddressMode::REPEAT; 3],
            use_pixel_coordinates: false,
        }
    }
}

impl SamplerInfo {
    pub fn set_filter(
        &mut self,
        min: vk::Filter,
        mag: vk::Filter,
        mipmap: vk::SamplerMipmapMode,
    ) -> &mut Self {
        self.min_filter = min;
        self.mag_filter = mag;
        self.mipmap_mode = mipmap;
        self
    }

    pub fn set_address_modes(
        &mut self,
        u: vk::SamplerAddressMode,
        v: vk::SamplerAddressMode,
        w: vk::SamplerAddressMode,
    ) -> &mut Self {
        self.address_modes = [u, v, w];
        self
    }

    pub fn set_use_pixel_coordinates(&mut self, on: bool) -> &mut Self {
        self.use_pixel_coordinates = on;
        self
    }
}

#[derive(Debug)]
pub struct Sampler {
    id: ResourceId,
    info: SamplerInfo,
}

impl Sampler {
    pub fn new(id: ResourceId, info: SamplerInfo) -> Self {
        Self { id, info }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn info(&self) -> &SamplerInfo {
        &self.info
    }
}

/// One resource slot a shader declares.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BindingInfo {
    pub descriptor_type: vk::DescriptorType,
    pub slot: u32,
    pub view_type: vk::ImageViewType,
    pub stages: vk::ShaderStageFlags,
    pub access: vk::AccessFlags,
}

#[derive(Clone, Debug)]
pub struct ShaderInfo {
    pub stage: vk::ShaderStageFlags,
    /// Name of a precompiled module the device resolves to SPIR-V.
    pub module: &'static str,
    pub bindings: Vec<BindingInfo>,
    pub push_const_stages: vk::ShaderStageFlags,
    pub push_const_size: u32,
    pub input_mask: u32,
    pub output_mask: u32,
}

#[derive(Debug)]
pub struct Shader {
    id: ResourceId,
    info: ShaderInfo,
}

impl Shader {
    pub fn new(id: ResourceId, info: ShaderInfo) -> Self {
        Self { id, info }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn info(&self) -> &ShaderInfo {
        &self.info
    }
}
