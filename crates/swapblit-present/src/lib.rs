// SPDX-License-Identifier: CEPL-1.0
//! Presents a rendered image onto a swapchain image.
//!
//! [`SwapchainBlitter`] reconciles size differences (copy vs. filtered blit),
//! multisampling (in-shader resolve or resolve-then-blit through a transient
//! image) and an optional gamma lookup applied while drawing.
#![deny(unsafe_op_in_unsafe_fn)]

mod args;
mod blitter;
mod cache;
mod draw;
mod gamma;
mod path;
mod resolve;
mod shaders;

pub use args::{PresentTransform, PresenterArgs};
pub use blitter::SwapchainBlitter;
pub use cache::KeyedCache;
pub use gamma::{power_ramp, GammaPoint, GammaRamp, GammaTexture};
pub use path::{normalize_rect, PresentPath};
pub use resolve::{ResolveImageCache, ResolveKey, ResolveTarget};
pub use shaders::{FragmentVariant, PresentShaders, ResolveVariant, GAMMA_BINDING, IMAGE_BINDING};
