//! Byte views over host pixel arrays.

/// View packed 32-bit host pixels as the RGBA8 bytes they contain.
///
/// No copy and no byte swapping: each `i32` contributes its four bytes in
/// native order.
pub fn pixels_as_bytes(pixels: &[i32]) -> &[u8] {
    bytemuck::cast_slice(pixels)
}

/// Borrow a host pixel array.
///
/// # Safety
///
/// `ptr` must be valid for reads of `len` values for the returned lifetime,
/// or `len` must be zero.
pub unsafe fn host_pixels<'a>(ptr: *const i32, len: usize) -> &'a [i32] {
    if len == 0 {
        return &[];
    }
    assert!(!ptr.is_null(), "null pixel array with length {len}");
    unsafe { std::slice::from_raw_parts(ptr, len) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_four_per_pixel() {
        let pixels = vec![0i32; 64 * 64];
        assert_eq!(pixels_as_bytes(&pixels).len(), 16384);
    }

    #[test]
    fn bytes_keep_native_order() {
        let pixel = i32::from_ne_bytes([1, 2, 3, 4]);
        assert_eq!(pixels_as_bytes(&[pixel]), &[1, 2, 3, 4]);
    }

    #[test]
    fn empty_host_array_may_be_null() {
        let pixels = unsafe { host_pixels(std::ptr::null(), 0) };
        assert!(pixels.is_empty());
    }

    #[test]
    #[should_panic(expected = "null pixel array")]
    fn null_host_array_with_length_is_rejected() {
        let _ = unsafe { host_pixels(std::ptr::null(), 4) };
    }
}
