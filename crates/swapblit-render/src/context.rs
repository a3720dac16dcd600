// SPDX-License-Identifier: CEPL-1.0
use std::rc::Rc;

use ash::vk;

use crate::handle::{Buffer, BufferSlice, Image, ImageView, Sampler, Shader};
use crate::state::{
    BlendMode, DepthStencilState, InputAssemblyState, LogicOpState, MultisampleState,
    RasterizerState,
};

/// Command stream the presenter records into.
///
/// Every call enqueues work; nothing executes synchronously. Commands are
/// ordered as recorded. Implementations keep clones of the handles they are
/// given until the corresponding GPU work has completed.
pub trait GraphicsContext {
    fn set_input_assembly_state(&mut self, state: InputAssemblyState);

    fn set_input_layout(
        &mut self,
        attributes: &[vk::VertexInputAttributeDescription],
        bindings: &[vk::VertexInputBindingDescription],
    );

    fn set_rasterizer_state(&mut self, state: RasterizerState);

    fn set_multisample_state(&mut self, state: MultisampleState);

    fn set_depth_stencil_state(&mut self, state: DepthStencilState);

    fn set_logic_op_state(&mut self, state: LogicOpState);

    fn set_blend_mode(&mut self, attachment: u32, mode: BlendMode);

    fn set_viewport(&mut self, viewport: vk::Viewport, scissor: vk::Rect2D);

    fn bind_render_target(&mut self, view: &Rc<ImageView>, layout: vk::ImageLayout);

    /// Marks the view's contents as undefined; cheaper than a clear.
    fn discard_image_view(&mut self, view: &Rc<ImageView>, aspects: vk::ImageAspectFlags);

    fn clear_render_target(
        &mut self,
        view: &Rc<ImageView>,
        aspects: vk::ImageAspectFlags,
        color: [f32; 4],
    );

    fn bind_sampler(&mut self, stage: vk::ShaderStageFlags, slot: u32, sampler: &Rc<Sampler>);

    /// `None` leaves the slot unbound.
    fn bind_image_view(
        &mut self,
        stage: vk::ShaderStageFlags,
        slot: u32,
        view: Option<&Rc<ImageView>>,
    );

    fn bind_shader(&mut self, stage: vk::ShaderStageFlags, shader: &Rc<Shader>);

    fn push_constants(&mut self, offset: u32, data: &[u8]);

    fn set_spec_constant(&mut self, bind_point: vk::PipelineBindPoint, id: u32, value: u32);

    /// `format == UNDEFINED` resolves in the images' own format.
    fn resolve_image(
        &mut self,
        dst: &Rc<Image>,
        src: &Rc<Image>,
        region: vk::ImageResolve,
        format: vk::Format,
    );

    /// Replaces the buffer's backing store with `slice` for all commands
    /// recorded from here on.
    fn invalidate_buffer(&mut self, buffer: &Rc<Buffer>, slice: BufferSlice);

    #[allow(clippy::too_many_arguments)]
    fn copy_buffer_to_image(
        &mut self,
        dst: &Rc<Image>,
        subresource: vk::ImageSubresourceLayers,
        offset: vk::Offset3D,
        extent: vk::Extent3D,
        src: &Rc<Buffer>,
        src_offset: vk::DeviceSize,
        row_alignment: vk::DeviceSize,
        slice_alignment: vk::DeviceSize,
    );

    fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    );
}
