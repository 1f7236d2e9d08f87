//! Values the host hands to the bridge: sizes, formats, texture handles and
//! display settings.

use gl::types::{GLenum, GLuint};
use num_derive::FromPrimitive;

use crate::ffi::*;

/// GL texture name. `0` means "unbound".
pub type TextureId = GLuint;

/// Width and height of a frame in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const ZERO: FrameSize = FrameSize {
        width: 0,
        height: 0,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Convert host-side signed dimensions. Returns `None` unless both are
    /// strictly positive.
    pub fn from_host(width: i32, height: i32) -> Option<Self> {
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(Self::new(width as u32, height as u32))
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)
    }

    /// Byte length of an RGBA8 frame of this size, or `None` on overflow.
    pub fn rgba_len(&self) -> Option<usize> {
        self.pixel_count()?.checked_mul(OG_BYTES_PER_PIXEL)
    }

    /// Dimensions as the host sees them (`jint`-style), saturating.
    pub fn to_host(self) -> (i32, i32) {
        (
            i32::try_from(self.width).unwrap_or(i32::MAX),
            i32::try_from(self.height).unwrap_or(i32::MAX),
        )
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Binding target of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    /// Regular `GL_TEXTURE_2D`.
    Texture2d,
    /// Camera/video stream texture (`GL_TEXTURE_EXTERNAL_OES`).
    External,
}

impl TextureKind {
    pub fn gl_target(self) -> GLenum {
        match self {
            TextureKind::Texture2d => GL_TEXTURE_2D,
            TextureKind::External => GL_TEXTURE_EXTERNAL_OES,
        }
    }
}

/// Pixel format the pipeline should prepare its input stage for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Input arrives as a texture; no upload buffer is needed.
    None,
    /// Input arrives as RGBA8 host pixels.
    Rgba,
}

impl InputFormat {
    pub fn from_prepare_input(prepare_input: bool) -> Self {
        if prepare_input {
            InputFormat::Rgba
        } else {
            InputFormat::None
        }
    }

    pub fn gl_enum(self) -> GLenum {
        match self {
            InputFormat::None => GL_NONE,
            InputFormat::Rgba => GL_RGBA,
        }
    }
}

/// Rotation applied when presenting a texture on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromPrimitive)]
pub enum RenderOrientation {
    #[default]
    Deg0 = OG_RENDER_ORIENTATION_0 as isize,
    Deg90 = OG_RENDER_ORIENTATION_90 as isize,
    Deg180 = OG_RENDER_ORIENTATION_180 as isize,
    Deg270 = OG_RENDER_ORIENTATION_270 as isize,
}

impl RenderOrientation {
    pub fn degrees(self) -> u32 {
        match self {
            RenderOrientation::Deg0 => 0,
            RenderOrientation::Deg90 => 90,
            RenderOrientation::Deg180 => 180,
            RenderOrientation::Deg270 => 270,
        }
    }

    /// Whether the presented image swaps width and height.
    pub fn is_transposed(self) -> bool {
        matches!(self, RenderOrientation::Deg90 | RenderOrientation::Deg270)
    }
}

/// Which texture the display presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum ShowMode {
    Input = OG_RENDER_DISP_MODE_INPUT as isize,
    Output = OG_RENDER_DISP_MODE_OUTPUT as isize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn host_dimensions_must_be_positive() {
        assert_eq!(FrameSize::from_host(64, 32), Some(FrameSize::new(64, 32)));
        assert_eq!(FrameSize::from_host(0, 32), None);
        assert_eq!(FrameSize::from_host(64, -1), None);
    }

    #[test]
    fn rgba_len_is_four_bytes_per_pixel() {
        assert_eq!(FrameSize::new(64, 64).rgba_len(), Some(16384));
        assert_eq!(FrameSize::new(128, 256).rgba_len(), Some(131072));
        assert_eq!(FrameSize::new(u32::MAX, u32::MAX).rgba_len(), None);
    }

    #[test]
    fn orientation_codes_decode() {
        assert_eq!(RenderOrientation::from_i32(0), Some(RenderOrientation::Deg0));
        assert_eq!(RenderOrientation::from_i32(3), Some(RenderOrientation::Deg270));
        assert_eq!(RenderOrientation::from_i32(4), None);
        assert!(RenderOrientation::Deg90.is_transposed());
        assert!(!RenderOrientation::Deg180.is_transposed());
    }

    #[test]
    fn show_mode_codes_decode() {
        assert_eq!(ShowMode::from_i32(OG_RENDER_DISP_MODE_INPUT), Some(ShowMode::Input));
        assert_eq!(ShowMode::from_i32(OG_RENDER_DISP_MODE_OUTPUT), Some(ShowMode::Output));
        assert_eq!(ShowMode::from_i32(7), None);
    }

    #[test]
    fn texture_kinds_map_to_gl_targets() {
        assert_eq!(TextureKind::Texture2d.gl_target(), gl::TEXTURE_2D);
        assert_eq!(TextureKind::External.gl_target(), 0x8D65);
        assert_eq!(InputFormat::from_prepare_input(true).gl_enum(), gl::RGBA);
        assert_eq!(InputFormat::from_prepare_input(false).gl_enum(), gl::NONE);
    }
}
