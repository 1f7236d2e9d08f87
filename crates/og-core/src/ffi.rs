//! Boundary constants and C-repr structs shared with the host.
//!
//! Values that cross the C ABI are plain integers. The enums in
//! [`crate::inputs`] decode them through `num_traits::FromPrimitive`.

#![allow(non_upper_case_globals)]

use gl::types::GLenum;

// =====================================================================
// Result codes
// =====================================================================
pub const OG_SUCCESS: u32 = 0;
pub const OG_FAIL: u32 = 0xFFFFFFFF;

// =====================================================================
// Display show modes
// =====================================================================
pub const OG_RENDER_DISP_MODE_INPUT: i32 = 0;
pub const OG_RENDER_DISP_MODE_OUTPUT: i32 = 1;

// =====================================================================
// Display orientations
// =====================================================================
pub const OG_RENDER_ORIENTATION_0: i32 = 0;
pub const OG_RENDER_ORIENTATION_90: i32 = 1;
pub const OG_RENDER_ORIENTATION_180: i32 = 2;
pub const OG_RENDER_ORIENTATION_270: i32 = 3;

// =====================================================================
// GL enums used at the boundary
// =====================================================================
pub const GL_NONE: GLenum = gl::NONE;
pub const GL_RGBA: GLenum = gl::RGBA;
pub const GL_TEXTURE_2D: GLenum = gl::TEXTURE_2D;

/// `GL_OES_EGL_image_external` target. Not part of desktop GL, so the `gl`
/// crate does not export it.
pub const GL_TEXTURE_EXTERNAL_OES: GLenum = 0x8D65;

/// Bytes per output pixel (RGBA8).
pub const OG_BYTES_PER_PIXEL: usize = 4;

// =====================================================================
// C-repr structs
// =====================================================================

/// Output pixel view filled by `og_bridge_get_output_pixels`.
///
/// `data` aliases memory owned by the bridge. It stays readable until the
/// next prepare or cleanup on the same handle; `generation` lets the host ask
/// whether that has happened yet.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct OutputPixelsStruct {
    pub data: *const u8,
    pub len: usize,
    pub width: u32,
    pub height: u32,
    pub generation: u64,
}

impl OutputPixelsStruct {
    pub const fn empty() -> Self {
        Self {
            data: std::ptr::null(),
            len: 0,
            width: 0,
            height: 0,
            generation: 0,
        }
    }
}

impl Default for OutputPixelsStruct {
    fn default() -> Self {
        Self::empty()
    }
}

// =====================================================================
// Utility
// =====================================================================

/// Copy `values` into a host-provided `f64` buffer, truncating to
/// `capacity`. Returns the number of values written.
///
/// # Safety
///
/// `dst` must be valid for writes of `capacity` values, or `capacity` must be
/// zero.
pub unsafe fn copy_f64_to_host_buffer(dst: *mut f64, capacity: usize, values: &[f64]) -> usize {
    let count = values.len().min(capacity);
    if count == 0 || dst.is_null() {
        return 0;
    }

    let dest = unsafe { std::slice::from_raw_parts_mut(dst, count) };
    dest.copy_from_slice(&values[..count]);
    count
}
