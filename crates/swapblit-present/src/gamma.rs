// SPDX-License-Identifier: CEPL-1.0
//! Gamma ramp upload.
//!
//! `set` only stages the control points in host memory and marks the ramp
//! dirty; the GPU texture is rebuilt/uploaded by `materialize` at the start of
//! the next present. Several `set` calls between presents therefore cost a
//! single upload.

use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use ash::vk;
use bytemuck::{Pod, Zeroable};
use swapblit_render::{
    Buffer, BufferInfo, BufferSlice, Device, GraphicsContext, Image, ImageInfo, ImageView,
    ImageViewInfo,
};
use tracing::debug;

use crate::cache::KeyedCache;

pub const GAMMA_FORMAT: vk::Format = vk::Format::R16G16B16A16_UNORM;

/// One control point: 16-bit unorm RGBA, laid out as in the lookup texture.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct GammaPoint {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    pub a: u16,
}

impl GammaPoint {
    pub const fn new(r: u16, g: u16, b: u16, a: u16) -> Self {
        Self { r, g, b, a }
    }

    /// Maps normalized channel values onto the 16-bit range, clamping to 0..=1.
    pub fn from_normalized(rgba: [f32; 4]) -> Self {
        let map = |x: f32| (x.clamp(0.0, 1.0) * 65535.0).round() as u16;
        Self::new(map(rgba[0]), map(rgba[1]), map(rgba[2]), map(rgba[3]))
    }
}

/// `count` evenly spaced points of `x^(1/exponent)` on all color channels,
/// alpha left at zero.
pub fn power_ramp(exponent: f32, count: u32) -> Vec<GammaPoint> {
    let last = count.saturating_sub(1).max(1) as f32;
    (0..count)
        .map(|i| {
            let y = (i as f32 / last).powf(1.0 / exponent);
            GammaPoint::from_normalized([y, y, y, 0.0])
        })
        .collect()
}

/// The 1D lookup texture and its view.
#[derive(Debug)]
pub struct GammaTexture {
    pub image: Rc<Image>,
    pub view: Rc<ImageView>,
}

impl GammaTexture {
    fn create(device: &dyn Device, width: u32) -> Result<Self> {
        let info = ImageInfo {
            ty: vk::ImageType::TYPE_1D,
            format: GAMMA_FORMAT,
            extent: vk::Extent3D {
                width,
                height: 1,
                depth: 1,
            },
            usage: vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
            stages: vk::PipelineStageFlags::TRANSFER | vk::PipelineStageFlags::FRAGMENT_SHADER,
            access: vk::AccessFlags::TRANSFER_WRITE | vk::AccessFlags::SHADER_READ,
            tiling: vk::ImageTiling::OPTIMAL,
            layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            ..ImageInfo::default()
        };
        let image = device.create_image(&info, vk::MemoryPropertyFlags::DEVICE_LOCAL)?;
        let view = device.create_image_view(
            &image,
            &ImageViewInfo::color(
                vk::ImageViewType::TYPE_1D,
                GAMMA_FORMAT,
                vk::ImageUsageFlags::SAMPLED,
            ),
        )?;
        debug!("gamma texture rebuilt: {width} points");
        Ok(Self { image, view })
    }
}

#[derive(Default)]
pub struct GammaRamp {
    staging: Option<Rc<Buffer>>,
    pending: Option<BufferSlice>,
    count: u32,
    dirty: bool,
    texture: KeyedCache<u32, GammaTexture>,
    uploads: u64,
}

impl GammaRamp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a new table. An empty table turns gamma correction off.
    pub fn set(&mut self, device: &dyn Device, points: &[GammaPoint]) -> Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(points);
        let size = bytes.len() as vk::DeviceSize;

        if points.is_empty() {
            self.staging = None;
            self.pending = None;
        } else {
            let reusable = self
                .staging
                .as_ref()
                .filter(|buffer| buffer.info().size >= size);
            let mut slice = match reusable {
                Some(buffer) => device
                    .allocate_buffer_slice(buffer)
                    .context("allocate gamma staging slice")?,
                None => {
                    let info = BufferInfo {
                        size,
                        usage: vk::BufferUsageFlags::TRANSFER_SRC,
                        stages: vk::PipelineStageFlags::TRANSFER,
                        access: vk::AccessFlags::TRANSFER_READ,
                    };
                    let buffer = device
                        .create_buffer(
                            &info,
                            vk::MemoryPropertyFlags::HOST_VISIBLE
                                | vk::MemoryPropertyFlags::HOST_COHERENT,
                        )
                        .context("create gamma staging buffer")?;
                    let slice = device
                        .allocate_buffer_slice(&buffer)
                        .context("allocate gamma staging slice")?;
                    self.staging = Some(buffer);
                    slice
                }
            };
            slice.mapped_mut()[..bytes.len()].copy_from_slice(bytes);
            self.pending = Some(slice);
        }

        self.count = points.len() as u32;
        self.dirty = true;
        Ok(())
    }

    /// Brings the texture in line with the last staged table. No-op unless dirty.
    pub fn materialize(
        &mut self,
        device: &dyn Device,
        ctx: &mut dyn GraphicsContext,
    ) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let n = self.count;
        if n == 0 {
            if self.texture.release() {
                debug!("gamma ramp cleared");
            }
        } else {
            let texture = self
                .texture
                .ensure(&n, |&width| GammaTexture::create(device, width))
                .context("create gamma texture")?;
            let staging = self
                .staging
                .as_ref()
                .ok_or_else(|| anyhow!("gamma ramp has {n} points but no staging buffer"))?;
            let slice = self
                .pending
                .take()
                .ok_or_else(|| anyhow!("gamma ramp marked dirty without staged points"))?;

            ctx.invalidate_buffer(staging, slice);
            ctx.copy_buffer_to_image(
                &texture.image,
                vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                },
                vk::Offset3D { x: 0, y: 0, z: 0 },
                vk::Extent3D {
                    width: n,
                    height: 1,
                    depth: 1,
                },
                staging,
                0,
                0,
                0,
            );
            self.uploads += 1;
            debug!("gamma ramp uploaded: {n} points");
        }

        self.dirty = false;
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// View to sample from, or `None` while gamma correction is off.
    pub fn view(&self) -> Option<&Rc<ImageView>> {
        self.texture.get().map(|t| &t.view)
    }

    pub fn texture(&self) -> Option<&GammaTexture> {
        self.texture.get()
    }

    pub fn staging_buffer(&self) -> Option<&Rc<Buffer>> {
        self.staging.as_ref()
    }

    /// Uploads recorded so far.
    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    /// Texture (re)builds so far.
    pub fn rebuilds(&self) -> u64 {
        self.texture.builds()
    }
}
