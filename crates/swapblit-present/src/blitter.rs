// SPDX-License-Identifier: CEPL-1.0
use std::rc::Rc;

use anyhow::{Context, Result};
use ash::vk;
use swapblit_render::{Device, GraphicsContext, ImageView};
use tracing::trace;

use crate::draw::{draw, DrawResources, PresentSamplers};
use crate::gamma::{GammaPoint, GammaRamp};
use crate::path::{normalize_rect, PresentPath};
use crate::resolve::{record_resolve, ResolveImageCache, ResolveTarget};
use crate::shaders::{FragmentVariant, PresentShaders, ResolveVariant};

/// Draws a rendered image onto a swapchain image.
///
/// Owns the present shaders, samplers, the gamma lookup texture and the
/// transient resolve image. Not reentrant: calls must come from one thread,
/// in order.
pub struct SwapchainBlitter {
    device: Rc<dyn Device>,
    shaders: PresentShaders,
    samplers: PresentSamplers,
    gamma: GammaRamp,
    resolve: ResolveImageCache,
}

impl SwapchainBlitter {
    pub fn new(device: Rc<dyn Device>) -> Result<Self> {
        let samplers = PresentSamplers::create(device.as_ref())?;
        let shaders = PresentShaders::create(device.as_ref())?;
        Ok(Self {
            device,
            shaders,
            samplers,
            gamma: GammaRamp::new(),
            resolve: ResolveImageCache::new(),
        })
    }

    /// Records the commands that present `src_rect` of `src_view` into
    /// `dst_rect` of `dst_view`. A rect with zero width or height stands for
    /// the whole image. Returns the path that was taken.
    pub fn present(
        &mut self,
        ctx: &mut dyn GraphicsContext,
        dst_view: &Rc<ImageView>,
        dst_rect: vk::Rect2D,
        src_view: &Rc<ImageView>,
        src_rect: vk::Rect2D,
    ) -> Result<PresentPath> {
        if self.gamma.is_dirty() {
            self.gamma
                .materialize(self.device.as_ref(), ctx)
                .context("upload gamma ramp")?;
        }

        let dst_rect = normalize_rect(dst_rect, dst_view);
        let src_rect = normalize_rect(src_rect, src_view);
        let src_info = src_view.image().info();

        let same_size = dst_rect.extent == src_rect.extent;
        let path = PresentPath::select(src_info.sample_count, same_size);
        trace!(
            "present {:?}: {}x{} -> {}x{}, samples={}",
            path,
            src_rect.extent.width,
            src_rect.extent.height,
            dst_rect.extent.width,
            dst_rect.extent.height,
            src_info.sample_count.as_raw()
        );

        match path {
            PresentPath::Copy | PresentPath::Blit | PresentPath::Resolve => {
                self.draw(ctx, path.fragment(), dst_view, dst_rect, src_view, src_rect);
            }
            PresentPath::ResolveThenBlit => {
                let resolved = Rc::clone(
                    &self
                        .resolve
                        .ensure(self.device.as_ref(), src_info)?
                        .view,
                );
                record_resolve(ctx, &resolved, src_view);
                // The resolve image shares the source's coordinate space.
                self.draw(ctx, FragmentVariant::Blit, dst_view, dst_rect, &resolved, src_rect);
            }
        }

        if !path.uses_resolve_image() {
            self.resolve.release();
        }

        Ok(path)
    }

    /// Stages a new gamma ramp, uploaded by the next [`present`](Self::present).
    /// An empty ramp disables gamma correction.
    pub fn set_gamma_ramp(&mut self, points: &[GammaPoint]) -> Result<()> {
        self.gamma.set(self.device.as_ref(), points)
    }

    /// Whether draws currently sample a gamma texture.
    pub fn gamma_enabled(&self) -> bool {
        self.gamma.view().is_some()
    }

    /// Whether a ramp is staged but not yet uploaded.
    pub fn gamma_dirty(&self) -> bool {
        self.gamma.is_dirty()
    }

    pub fn gamma(&self) -> &GammaRamp {
        &self.gamma
    }

    pub fn resolve_target(&self) -> Option<&ResolveTarget> {
        self.resolve.target()
    }

    pub fn resolve_variant(&self) -> ResolveVariant {
        self.shaders.resolve_variant()
    }

    fn draw(
        &self,
        ctx: &mut dyn GraphicsContext,
        variant: FragmentVariant,
        dst_view: &Rc<ImageView>,
        dst_rect: vk::Rect2D,
        src_view: &Rc<ImageView>,
        src_rect: vk::Rect2D,
    ) {
        let res = DrawResources {
            shaders: &self.shaders,
            samplers: &self.samplers,
            gamma: self.gamma.view(),
        };
        draw(ctx, &res, variant, dst_view, dst_rect, src_view, src_rect);
    }
}
