// SPDX-License-Identifier: CEPL-1.0
use std::rc::Rc;

use anyhow::{Context, Result};
use ash::vk;
use swapblit_render::{Device, GraphicsContext, Image, ImageInfo, ImageView, ImageViewInfo};
use tracing::debug;

use crate::cache::KeyedCache;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolveKey {
    pub extent: vk::Extent3D,
    pub format: vk::Format,
}

impl ResolveKey {
    pub fn of(info: &ImageInfo) -> Self {
        Self {
            extent: info.extent,
            format: info.format,
        }
    }
}

/// Single-sampled copy of a multisampled source, sampled by the blit pass.
#[derive(Debug)]
pub struct ResolveTarget {
    pub image: Rc<Image>,
    pub view: Rc<ImageView>,
}

impl ResolveTarget {
    fn create(device: &dyn Device, key: &ResolveKey) -> Result<Self> {
        let info = ImageInfo {
            ty: vk::ImageType::TYPE_2D,
            format: key.format,
            sample_count: vk::SampleCountFlags::TYPE_1,
            extent: key.extent,
            num_layers: 1,
            mip_levels: 1,
            usage: vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
            stages: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::FRAGMENT_SHADER,
            access: vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::SHADER_READ,
            tiling: vk::ImageTiling::OPTIMAL,
            layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        };
        let image = device.create_image(&info, vk::MemoryPropertyFlags::DEVICE_LOCAL)?;
        let view = device.create_image_view(
            &image,
            &ImageViewInfo::color(
                vk::ImageViewType::TYPE_2D,
                key.format,
                vk::ImageUsageFlags::SAMPLED,
            ),
        )?;
        debug!(
            "resolve image rebuilt: {}x{} {:?}",
            key.extent.width, key.extent.height, key.format
        );
        Ok(Self { image, view })
    }
}

/// Keeps at most one resolve target, matching the last multisampled source
/// that needed one.
#[derive(Default)]
pub struct ResolveImageCache {
    cache: KeyedCache<ResolveKey, ResolveTarget>,
}

impl ResolveImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a target matching `source`'s extent and format, rebuilding it
    /// if the cached one differs or none exists.
    pub fn ensure(&mut self, device: &dyn Device, source: &ImageInfo) -> Result<&ResolveTarget> {
        self.cache
            .ensure(&ResolveKey::of(source), |key| ResolveTarget::create(device, key))
            .context("create resolve image")
    }

    pub fn release(&mut self) {
        if self.cache.release() {
            debug!("resolve image released");
        }
    }

    pub fn target(&self) -> Option<&ResolveTarget> {
        self.cache.get()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn builds(&self) -> u64 {
        self.cache.builds()
    }
}

/// Records a full-extent resolve of `src` into `dst`.
pub(crate) fn record_resolve(
    ctx: &mut dyn GraphicsContext,
    dst: &ImageView,
    src: &ImageView,
) {
    let layer = vk::ImageSubresourceLayers {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        mip_level: 0,
        base_array_layer: 0,
        layer_count: 1,
    };
    let region = vk::ImageResolve {
        src_subresource: layer,
        src_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
        dst_subresource: layer,
        dst_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
        extent: dst.image().info().extent,
    };
    ctx.resolve_image(dst.image(), src.image(), region, vk::Format::UNDEFINED);
}

#[cfg(test)]
mod tests {
    use super::*;
    use swapblit_render::recording::{Command, RecordingContext, RecordingDevice};
    use swapblit_render::DeviceFeatures;

    fn source(width: u32, height: u32, format: vk::Format) -> ImageInfo {
        ImageInfo {
            format,
            sample_count: vk::SampleCountFlags::TYPE_8,
            extent: vk::Extent3D {
                width,
                height,
                depth: 1,
            },
            ..ImageInfo::default()
        }
    }

    #[test]
    fn rebuilds_only_on_extent_or_format_change() {
        let device = RecordingDevice::new(DeviceFeatures::default());
        let mut cache = ResolveImageCache::new();
        let unorm = vk::Format::B8G8R8A8_UNORM;

        cache.ensure(&device, &source(1920, 1080, unorm)).unwrap();
        cache.ensure(&device, &source(1920, 1080, unorm)).unwrap();
        assert_eq!(cache.builds(), 1);

        cache.ensure(&device, &source(1280, 720, unorm)).unwrap();
        assert_eq!(cache.builds(), 2);

        let target = cache
            .ensure(&device, &source(1280, 720, vk::Format::R16G16B16A16_SFLOAT))
            .unwrap();
        assert_eq!(target.image.info().format, vk::Format::R16G16B16A16_SFLOAT);
        assert_eq!(cache.builds(), 3);
        assert_eq!(device.stats().images, 3);
    }

    #[test]
    fn target_is_single_sampled_and_sampleable() {
        let device = RecordingDevice::new(DeviceFeatures::default());
        let mut cache = ResolveImageCache::new();
        let target = cache
            .ensure(&device, &source(640, 480, vk::Format::R8G8B8A8_UNORM))
            .unwrap();

        let info = target.image.info();
        assert_eq!(info.sample_count, vk::SampleCountFlags::TYPE_1);
        assert_eq!(info.extent.width, 640);
        assert!(info.usage.contains(vk::ImageUsageFlags::SAMPLED));
        assert!(info.usage.contains(vk::ImageUsageFlags::COLOR_ATTACHMENT));
        assert!(!info.usage.contains(vk::ImageUsageFlags::TRANSFER_DST));
        assert!(Rc::ptr_eq(target.view.image(), &target.image));
        assert_eq!(target.image.memory(), vk::MemoryPropertyFlags::DEVICE_LOCAL);
        assert_eq!(device.created_images()[0].format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn release_drops_target() {
        let device = RecordingDevice::new(DeviceFeatures::default());
        let mut cache = ResolveImageCache::new();
        let weak = Rc::downgrade(
            &cache
                .ensure(&device, &source(64, 64, vk::Format::R8G8B8A8_UNORM))
                .unwrap()
                .image,
        );
        cache.release();
        assert!(cache.is_empty());
        assert!(cache.target().is_none());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn device_failure_leaves_no_target() {
        let device = RecordingDevice::new(DeviceFeatures::default()).with_allocation_limit(4096);
        let mut cache = ResolveImageCache::new();
        let err = cache
            .ensure(&device, &source(1920, 1080, vk::Format::B8G8R8A8_UNORM))
            .unwrap_err();
        assert!(format!("{err:#}").contains("create resolve image"));
        assert!(cache.is_empty());
    }

    #[test]
    fn resolve_covers_destination_extent() {
        let device = RecordingDevice::new(DeviceFeatures::default());
        let extent = vk::Extent2D {
            width: 320,
            height: 200,
        };
        let src = device
            .color_target(extent, vk::Format::B8G8R8A8_UNORM, vk::SampleCountFlags::TYPE_4)
            .unwrap();
        let dst = device
            .color_target(extent, vk::Format::B8G8R8A8_UNORM, vk::SampleCountFlags::TYPE_1)
            .unwrap();

        let mut ctx = RecordingContext::new();
        record_resolve(&mut ctx, &dst, &src);
        match &ctx.commands()[0] {
            Command::ResolveImage {
                dst: d,
                src: s,
                region,
                format,
            } => {
                assert!(Rc::ptr_eq(d, dst.image()));
                assert!(Rc::ptr_eq(s, src.image()));
                assert_eq!(region.extent.width, 320);
                assert_eq!(region.extent.height, 200);
                assert_eq!(*format, vk::Format::UNDEFINED);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
