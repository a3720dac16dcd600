// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use bytemuck::{Pod, Zeroable};

/// How destination pixels map back onto the source rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentTransform {
    /// Extents match: pure translation from the destination offset.
    Translate { dst_offset: vk::Offset2D },
    /// Extents differ: the shader scales by `src_extent / viewport extent`.
    Scale { src_extent: vk::Extent2D },
}

impl PresentTransform {
    pub fn between(dst_rect: vk::Rect2D, src_rect: vk::Rect2D) -> Self {
        if dst_rect.extent == src_rect.extent {
            Self::Translate {
                dst_offset: dst_rect.offset,
            }
        } else {
            Self::Scale {
                src_extent: src_rect.extent,
            }
        }
    }
}

/// Push-constant block shared with the present shaders.
///
/// `slot` aliases two fields. It holds the destination offset (as two's
/// complement `i32` bits) iff source and destination extents are equal, and
/// the source extent otherwise. Readers must branch on the same condition.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct PresenterArgs {
    pub src_offset: [i32; 2],
    pub slot: [u32; 2],
}

impl PresenterArgs {
    pub const SIZE: u32 = std::mem::size_of::<Self>() as u32;

    pub fn new(src_offset: vk::Offset2D, transform: PresentTransform) -> Self {
        let slot = match transform {
            PresentTransform::Translate { dst_offset } => {
                [dst_offset.x as u32, dst_offset.y as u32]
            }
            PresentTransform::Scale { src_extent } => [src_extent.width, src_extent.height],
        };
        Self {
            src_offset: [src_offset.x, src_offset.y],
            slot,
        }
    }

    /// Reads `slot` back the way the shader does.
    pub fn transform(&self, same_size: bool) -> PresentTransform {
        if same_size {
            PresentTransform::Translate {
                dst_offset: vk::Offset2D {
                    x: self.slot[0] as i32,
                    y: self.slot[1] as i32,
                },
            }
        } else {
            PresentTransform::Scale {
                src_extent: vk::Extent2D {
                    width: self.slot[0],
                    height: self.slot[1],
                },
            }
        }
    }

    /// Source pixel coordinate sampled for destination fragment `frag`.
    ///
    /// Mirrors the fragment shaders: copy and resolve fetch
    /// `src_offset + frag - dst_offset`; blit samples
    /// `src_offset + (frag - viewport.offset) * src_extent / viewport.extent`.
    pub fn map_to_source(&self, same_size: bool, frag: [f32; 2], viewport: vk::Rect2D) -> [f32; 2] {
        let src = [self.src_offset[0] as f32, self.src_offset[1] as f32];
        match self.transform(same_size) {
            PresentTransform::Translate { dst_offset } => [
                src[0] + frag[0] - dst_offset.x as f32,
                src[1] + frag[1] - dst_offset.y as f32,
            ],
            PresentTransform::Scale { src_extent } => {
                let sx = src_extent.width as f32 / viewport.extent.width as f32;
                let sy = src_extent.height as f32 / viewport.extent.height as f32;
                [
                    src[0] + (frag[0] - viewport.offset.x as f32) * sx,
                    src[1] + (frag[1] - viewport.offset.y as f32) * sy,
                ]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: i32, y: i32, width: u32, height: u32) -> vk::Rect2D {
        vk::Rect2D {
            offset: vk::Offset2D { x, y },
            extent: vk::Extent2D { width, height },
        }
    }

    #[test]
    fn layout_is_sixteen_bytes() {
        assert_eq!(PresenterArgs::SIZE, 16);
        let args = PresenterArgs {
            src_offset: [1, 2],
            slot: [3, 4],
        };
        let bytes = bytemuck::bytes_of(&args);
        assert_eq!(&bytes[0..4], &1i32.to_ne_bytes());
        assert_eq!(&bytes[12..16], &4u32.to_ne_bytes());
    }

    #[test]
    fn equal_extents_carry_destination_offset() {
        let dst = rect(-5, 40, 640, 480);
        let src = rect(10, 20, 640, 480);
        let transform = PresentTransform::between(dst, src);
        assert_eq!(
            transform,
            PresentTransform::Translate {
                dst_offset: vk::Offset2D { x: -5, y: 40 }
            }
        );

        let args = PresenterArgs::new(src.offset, transform);
        assert_eq!(args.src_offset, [10, 20]);
        assert_eq!(args.transform(true), transform);
    }

    #[test]
    fn differing_extents_carry_source_extent() {
        let dst = rect(0, 0, 1920, 1080);
        let src = rect(0, 0, 1280, 720);
        let args = PresenterArgs::new(src.offset, PresentTransform::between(dst, src));
        assert_eq!(args.slot, [1280, 720]);
        assert_eq!(
            args.transform(false),
            PresentTransform::Scale {
                src_extent: vk::Extent2D {
                    width: 1280,
                    height: 720
                }
            }
        );
    }

    #[test]
    fn translate_maps_destination_corner_to_source_offset() {
        let dst = rect(100, 50, 320, 240);
        let src = rect(8, 4, 320, 240);
        let args = PresenterArgs::new(src.offset, PresentTransform::between(dst, src));
        assert_eq!(args.map_to_source(true, [100.0, 50.0], dst), [8.0, 4.0]);
        assert_eq!(args.map_to_source(true, [420.0, 290.0], dst), [328.0, 244.0]);
    }

    #[test]
    fn scale_maps_viewport_onto_source_extent() {
        let dst = rect(0, 0, 1920, 1080);
        let src = rect(0, 0, 1280, 720);
        let args = PresenterArgs::new(src.offset, PresentTransform::between(dst, src));
        assert_eq!(args.map_to_source(false, [1920.0, 1080.0], dst), [1280.0, 720.0]);
        assert_eq!(args.map_to_source(false, [960.0, 540.0], dst), [640.0, 360.0]);
    }
}
