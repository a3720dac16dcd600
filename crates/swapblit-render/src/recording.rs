// SPDX-License-Identifier: CEPL-1.0
//! Headless backend that records instead of executing.
//!
//! [`RecordingDevice`] hands out handles with fresh ids and counts what it
//! created. [`RecordingContext`] stores every command together with clones of
//! the handles it references; [`RecordingContext::retire`] plays the role of
//! GPU completion and drops them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ash::vk;
use tracing::debug;

use crate::context::GraphicsContext;
use crate::device::{Device, DeviceError, DeviceFeatures};
use crate::format::texel_size;
use crate::handle::{
    Buffer, BufferInfo, BufferSlice, Image, ImageInfo, ImageView, ImageViewInfo, ResourceId,
    Sampler, SamplerInfo, Shader, ShaderInfo,
};
use crate::state::{
    BlendMode, DepthStencilState, InputAssemblyState, LogicOpState, MultisampleState,
    RasterizerState,
};

/// Running totals of everything a [`RecordingDevice`] created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub images: u32,
    pub image_views: u32,
    pub buffers: u32,
    pub buffer_slices: u32,
    pub samplers: u32,
    pub shaders: u32,
}

pub struct RecordingDevice {
    features: DeviceFeatures,
    allocation_limit: Option<u64>,
    next_id: Cell<u64>,
    stats: Cell<DeviceStats>,
    images: RefCell<Vec<ImageInfo>>,
}

impl RecordingDevice {
    pub fn new(features: DeviceFeatures) -> Self {
        Self {
            features,
            allocation_limit: None,
            next_id: Cell::new(1),
            stats: Cell::new(DeviceStats::default()),
            images: RefCell::new(Vec::new()),
        }
    }

    /// Fails any single image or buffer allocation larger than `bytes`.
    pub fn with_allocation_limit(mut self, bytes: u64) -> Self {
        self.allocation_limit = Some(bytes);
        self
    }

    pub fn stats(&self) -> DeviceStats {
        self.stats.get()
    }

    /// Create infos of every image made so far, oldest first.
    pub fn created_images(&self) -> Vec<ImageInfo> {
        self.images.borrow().clone()
    }

    /// 2D color image usable as a render target and as a sampled source,
    /// wrapped in a full view. Stands in for swapchain and back-buffer images.
    pub fn color_target(
        &self,
        extent: vk::Extent2D,
        format: vk::Format,
        sample_count: vk::SampleCountFlags,
    ) -> Result<Rc<ImageView>, DeviceError> {
        let info = ImageInfo {
            format,
            sample_count,
            extent: vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            },
            usage: vk::ImageUsageFlags::COLOR_ATTACHMENT
                | vk::ImageUsageFlags::SAMPLED
                | vk::ImageUsageFlags::TRANSFER_SRC,
            stages: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::FRAGMENT_SHADER,
            access: vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::SHADER_READ,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            ..ImageInfo::default()
        };
        let image = self.create_image(&info, vk::MemoryPropertyFlags::DEVICE_LOCAL)?;
        let view_info = ImageViewInfo::color(
            vk::ImageViewType::TYPE_2D,
            format,
            vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
        );
        self.create_image_view(&image, &view_info)
    }

    fn alloc_id(&self) -> ResourceId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        ResourceId(id)
    }

    fn bump(&self, f: impl FnOnce(&mut DeviceStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    fn check_allocation(&self, requested: u64) -> Result<(), DeviceError> {
        match self.allocation_limit {
            Some(limit) if requested > limit => {
                Err(DeviceError::OutOfDeviceMemory { requested, limit })
            }
            _ => Ok(()),
        }
    }
}

impl Device for RecordingDevice {
    fn features(&self) -> DeviceFeatures {
        self.features
    }

    fn create_image(
        &self,
        info: &ImageInfo,
        memory: vk::MemoryPropertyFlags,
    ) -> Result<Rc<Image>, DeviceError> {
        let texel = texel_size(info.format).ok_or(DeviceError::FormatNotSupported {
            format: info.format,
            usage: "image",
        })?;
        let bytes = u64::from(info.extent.width)
            * u64::from(info.extent.height)
            * u64::from(info.extent.depth)
            * u64::from(info.num_layers)
            * u64::from(info.sample_count.as_raw().max(1))
            * texel;
        self.check_allocation(bytes)?;

        let id = self.alloc_id();
        debug!(
            "image {id}: {}x{}x{} {:?} samples={} ({bytes} bytes)",
            info.extent.width,
            info.extent.height,
            info.extent.depth,
            info.format,
            info.sample_count.as_raw()
        );
        self.images.borrow_mut().push(*info);
        self.bump(|s| s.images += 1);
        Ok(Rc::new(Image::new(id, *info, memory)))
    }

    fn create_image_view(
        &self,
        image: &Rc<Image>,
        info: &ImageViewInfo,
    ) -> Result<Rc<ImageView>, DeviceError> {
        let id = self.alloc_id();
        self.bump(|s| s.image_views += 1);
        Ok(Rc::new(ImageView::new(id, Rc::clone(image), *info)))
    }

    fn create_buffer(
        &self,
        info: &BufferInfo,
        memory: vk::MemoryPropertyFlags,
    ) -> Result<Rc<Buffer>, DeviceError> {
        self.check_allocation(info.size)?;
        let id = self.alloc_id();
        debug!("buffer {id}: {} bytes", info.size);
        self.bump(|s| s.buffers += 1);
        Ok(Rc::new(Buffer::new(id, *info, memory)))
    }

    fn allocate_buffer_slice(&self, buffer: &Buffer) -> Result<BufferSlice, DeviceError> {
        let id = self.alloc_id();
        self.bump(|s| s.buffer_slices += 1);
        Ok(BufferSlice::new(id, buffer.id(), buffer.info().size as usize))
    }

    fn create_sampler(&self, info: &SamplerInfo) -> Result<Rc<Sampler>, DeviceError> {
        let id = self.alloc_id();
        self.bump(|s| s.samplers += 1);
        Ok(Rc::new(Sampler::new(id, *info)))
    }

    fn create_shader(&self, info: ShaderInfo) -> Result<Rc<Shader>, DeviceError> {
        if info.module.is_empty() {
            return Err(DeviceError::MissingShaderModule(info.module));
        }
        let id = self.alloc_id();
        debug!("shader {id}: {}", info.module);
        self.bump(|s| s.shaders += 1);
        Ok(Rc::new(Shader::new(id, info)))
    }
}

/// A command as it was recorded, holding its resources alive.
#[derive(Clone, Debug)]
pub enum Command {
    SetInputAssemblyState(InputAssemblyState),
    SetInputLayout {
        attributes: usize,
        bindings: usize,
    },
    SetRasterizerState(RasterizerState),
    SetMultisampleState(MultisampleState),
    SetDepthStencilState(DepthStencilState),
    SetLogicOpState(LogicOpState),
    SetBlendMode {
        attachment: u32,
        mode: BlendMode,
    },
    SetViewport {
        viewport: vk::Viewport,
        scissor: vk::Rect2D,
    },
    BindRenderTarget {
        view: Rc<ImageView>,
        layout: vk::ImageLayout,
    },
    DiscardImageView {
        view: Rc<ImageView>,
        aspects: vk::ImageAspectFlags,
    },
    ClearRenderTarget {
        view: Rc<ImageView>,
        aspects: vk::ImageAspectFlags,
        color: [f32; 4],
    },
    BindSampler {
        stage: vk::ShaderStageFlags,
        slot: u32,
        sampler: Rc<Sampler>,
    },
    BindImageView {
        stage: vk::ShaderStageFlags,
        slot: u32,
        view: Option<Rc<ImageView>>,
    },
    BindShader {
        stage: vk::ShaderStageFlags,
        shader: Rc<Shader>,
    },
    PushConstants {
        offset: u32,
        data: Vec<u8>,
    },
    SetSpecConstant {
        bind_point: vk::PipelineBindPoint,
        id: u32,
        value: u32,
    },
    ResolveImage {
        dst: Rc<Image>,
        src: Rc<Image>,
        region: vk::ImageResolve,
        format: vk::Format,
    },
    InvalidateBuffer {
        buffer: Rc<Buffer>,
        slice: BufferSlice,
    },
    CopyBufferToImage {
        dst: Rc<Image>,
        subresource: vk::ImageSubresourceLayers,
        offset: vk::Offset3D,
        extent: vk::Extent3D,
        src: Rc<Buffer>,
        src_offset: vk::DeviceSize,
    },
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
}

#[derive(Default)]
pub struct RecordingContext {
    commands: Vec<Command>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last [`retire`](Self::retire).
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn count(&self, pred: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    /// Value of the last `id` spec constant recorded, if any.
    pub fn spec_constant(&self, id: u32) -> Option<u32> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::SetSpecConstant { id: i, value, .. } if *i == id => Some(*value),
            _ => None,
        })
    }

    /// Treats all recorded work as complete and releases what it referenced.
    /// Returns how many commands were retired.
    pub fn retire(&mut self) -> usize {
        let n = self.commands.len();
        self.commands.clear();
        n
    }

    fn push(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }
}

impl GraphicsContext for RecordingContext {
    fn set_input_assembly_state(&mut self, state: InputAssemblyState) {
        self.push(Command::SetInputAssemblyState(state));
    }

    fn set_input_layout(
        &mut self,
        attributes: &[vk::VertexInputAttributeDescription],
        bindings: &[vk::VertexInputBindingDescription],
    ) {
        self.push(Command::SetInputLayout {
            attributes: attributes.len(),
            bindings: bindings.len(),
        });
    }

    fn set_rasterizer_state(&mut self, state: RasterizerState) {
        self.push(Command::SetRasterizerState(state));
    }

    fn set_multisample_state(&mut self, state: MultisampleState) {
        self.push(Command::SetMultisampleState(state));
    }

    fn set_depth_stencil_state(&mut self, state: DepthStencilState) {
        self.push(Command::SetDepthStencilState(state));
    }

    fn set_logic_op_state(&mut self, state: LogicOpState) {
        self.push(Command::SetLogicOpState(state));
    }

    fn set_blend_mode(&mut self, attachment: u32, mode: BlendMode) {
        self.push(Command::SetBlendMode { attachment, mode });
    }

    fn set_viewport(&mut self, viewport: vk::Viewport, scissor: vk::Rect2D) {
        self.push(Command::SetViewport { viewport, scissor });
    }

    fn bind_render_target(&mut self, view: &Rc<ImageView>, layout: vk::ImageLayout) {
        self.push(Command::BindRenderTarget {
            view: Rc::clone(view),
            layout,
        });
    }

    fn discard_image_view(&mut self, view: &Rc<ImageView>, aspects: vk::ImageAspectFlags) {
        self.push(Command::DiscardImageView {
            view: Rc::clone(view),
            aspects,
        });
    }

    fn clear_render_target(
        &mut self,
        view: &Rc<ImageView>,
        aspects: vk::ImageAspectFlags,
        color: [f32; 4],
    ) {
        self.push(Command::ClearRenderTarget {
            view: Rc::clone(view),
            aspects,
            color,
        });
    }

    fn bind_sampler(&mut self, stage: vk::ShaderStageFlags, slot: u32, sampler: &Rc<Sampler>) {
        self.push(Command::BindSampler {
            stage,
            slot,
            sampler: Rc::clone(sampler),
        });
    }

    fn bind_image_view(
        &mut self,
        stage: vk::ShaderStageFlags,
        slot: u32,
        view: Option<&Rc<ImageView>>,
    ) {
        self.push(Command::BindImageView {
            stage,
            slot,
            view: view.cloned(),
        });
    }

    fn bind_shader(&mut self, stage: vk::ShaderStageFlags, shader: &Rc<Shader>) {
        self.push(Command::BindShader {
            stage,
            shader: Rc::clone(shader),
        });
    }

    fn push_constants(&mut self, offset: u32, data: &[u8]) {
        self.push(Command::PushConstants {
            offset,
            data: data.to_vec(),
        });
    }

    fn set_spec_constant(&mut self, bind_point: vk::PipelineBindPoint, id: u32, value: u32) {
        self.push(Command::SetSpecConstant {
            bind_point,
            id,
            value,
        });
    }

    fn resolve_image(
        &mut self,
        dst: &Rc<Image>,
        src: &Rc<Image>,
        region: vk::ImageResolve,
        format: vk::Format,
    ) {
        self.push(Command::ResolveImage {
            dst: Rc::clone(dst),
            src: Rc::clone(src),
            region,
            format,
        });
    }

    fn invalidate_buffer(&mut self, buffer: &Rc<Buffer>, slice: BufferSlice) {
        self.push(Command::InvalidateBuffer {
            buffer: Rc::clone(buffer),
            slice,
        });
    }

    fn copy_buffer_to_image(
        &mut self,
        dst: &Rc<Image>,
        subresource: vk::ImageSubresourceLayers,
        offset: vk::Offset3D,
        extent: vk::Extent3D,
        src: &Rc<Buffer>,
        src_offset: vk::DeviceSize,
        _row_alignment: vk::DeviceSize,
        _slice_alignment: vk::DeviceSize,
    ) {
        self.push(Command::CopyBufferToImage {
            dst: Rc::clone(dst),
            subresource,
            offset,
            extent,
            src: Rc::clone(src),
            src_offset,
        });
    }

    fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        self.push(Command::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        });
    }
}
