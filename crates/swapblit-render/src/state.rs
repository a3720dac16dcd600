// SPDX-License-Identifier: CEPL-1.0
//! Fixed-function pipeline state handed to [`GraphicsContext`](crate::GraphicsContext).

use ash::vk;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputAssemblyState {
    pub primitive_topology: vk::PrimitiveTopology,
    pub primitive_restart: bool,
    pub patch_vertex_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterizerState {
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub depth_clip_enable: bool,
    pub depth_bias_enable: bool,
    pub sample_count: vk::SampleCountFlags,
    pub flat_shading: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MultisampleState {
    pub sample_mask: u32,
    pub enable_alpha_to_coverage: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct DepthStencilState {
    pub enable_depth_test: bool,
    pub enable_depth_write: bool,
    pub enable_stencil_test: bool,
    pub depth_compare_op: vk::CompareOp,
    pub stencil_op_front: vk::StencilOpState,
    pub stencil_op_back: vk::StencilOpState,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogicOpState {
    pub enable_logic_op: bool,
    pub logic_op: vk::LogicOp,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendMode {
    pub enable_blending: bool,
    pub color_src_factor: vk::BlendFactor,
    pub color_dst_factor: vk::BlendFactor,
    pub color_blend_op: vk::BlendOp,
    pub alpha_src_factor: vk::BlendFactor,
    pub alpha_dst_factor: vk::BlendFactor,
    pub alpha_blend_op: vk::BlendOp,
    pub write_mask: vk::ColorComponentFlags,
}
