// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use swapblit_render::ImageView;

use crate::shaders::FragmentVariant;

/// Strategy used for one present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PresentPath {
    /// Single-sampled, same size: texel fetch.
    Copy,
    /// Single-sampled, different size: filtered sampling.
    Blit,
    /// Multisampled, same size: resolved in the fragment shader.
    Resolve,
    /// Multisampled, different size: resolve into a transient image, then blit.
    ResolveThenBlit,
}

impl PresentPath {
    pub fn select(sample_count: vk::SampleCountFlags, same_size: bool) -> Self {
        match (sample_count == vk::SampleCountFlags::TYPE_1, same_size) {
            (true, true) => Self::Copy,
            (true, false) => Self::Blit,
            (false, true) => Self::Resolve,
            (false, false) => Self::ResolveThenBlit,
        }
    }

    pub fn uses_resolve_image(self) -> bool {
        self == Self::ResolveThenBlit
    }

    /// Fragment shader of the final draw.
    pub fn fragment(self) -> FragmentVariant {
        match self {
            Self::Copy => FragmentVariant::Copy,
            Self::Blit | Self::ResolveThenBlit => FragmentVariant::Blit,
            Self::Resolve => FragmentVariant::Resolve,
        }
    }
}

/// A rect with zero width or height stands for the whole image.
pub fn normalize_rect(rect: vk::Rect2D, view: &ImageView) -> vk::Rect2D {
    if rect.extent.width != 0 && rect.extent.height != 0 {
        return rect;
    }
    vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent: view.image().info().extent_2d(),
    }
}
