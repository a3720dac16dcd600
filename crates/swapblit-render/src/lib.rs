// SPDX-License-Identifier: CEPL-1.0
//! Interfaces the presenter consumes from the graphics layer.
//!
//! [`Device`] creates resources, [`GraphicsContext`] records commands. Both are
//! implemented by the headless [`recording`] backend, which keeps every
//! recorded command (and the resources it references) until it is retired.
#![deny(unsafe_op_in_unsafe_fn)]

mod context;
mod device;
mod format;
mod handle;
pub mod recording;
mod state;

pub use ash::vk;

pub use context::GraphicsContext;
pub use device::{Device, DeviceError, DeviceFeatures};
pub use format::texel_size;
pub use handle::{
    BindingInfo, Buffer, BufferInfo, BufferSlice, Image, ImageInfo, ImageView, ImageViewInfo,
    ResourceId, Sampler, SamplerInfo, Shader, ShaderInfo,
};
pub use state::{
    BlendMode, DepthStencilState, InputAssemblyState, LogicOpState, MultisampleState,
    RasterizerState,
};
