//! C ABI over a caller-owned [`Controller`] handle.
//!
//! The functions here are plain Rust; [`bridge_main!`](crate::bridge_main)
//! wraps each of them in a `#[no_mangle] extern "C"` export. Errors are
//! logged by the controller and reported as [`OG_FAIL`]. Contract violations
//! panic, which aborts the process at the `extern "C"` boundary.

use num_traits::FromPrimitive;
use og_core::ffi::{copy_f64_to_host_buffer, OutputPixelsStruct, OG_FAIL, OG_SUCCESS};
use og_core::logging::init_logging;
use og_core::{Backend, RenderOrientation, ShowMode, TextureId};
use tracing::{debug, error};

use crate::bytes::host_pixels;
use crate::controller::{Controller, InitOptions};
use crate::error::Result;

fn result_code(result: Result<()>) -> u32 {
    match result {
        Ok(()) => OG_SUCCESS,
        Err(_) => OG_FAIL,
    }
}

/// Borrow the controller behind a handle.
///
/// # Safety
///
/// `handle` must come from [`create`] and not have been passed to
/// [`destroy`].
unsafe fn controller<'a>(handle: *mut Controller) -> &'a mut Controller {
    assert!(!handle.is_null(), "null bridge handle");
    unsafe { &mut *handle }
}

pub fn create(backend: Box<dyn Backend>) -> *mut Controller {
    init_logging();
    let handle = Box::into_raw(Box::new(Controller::new(backend)));
    debug!(?handle, "bridge handle created");
    handle
}

/// Free a handle, cleaning up a live session first. A null handle is
/// ignored.
///
/// # Safety
///
/// `handle` must be null or come from [`create`], and must not be used
/// afterwards.
pub unsafe fn destroy(handle: *mut Controller) {
    if handle.is_null() {
        return;
    }
    debug!(?handle, "bridge handle destroyed");
    drop(unsafe { Box::from_raw(handle) });
}

/// # Safety
///
/// `handle` must be a live handle from [`create`].
pub unsafe fn init(
    handle: *mut Controller,
    platform_optimizations: bool,
    setup_gpu_context: bool,
    create_display: bool,
) -> u32 {
    let ctrl = unsafe { controller(handle) };
    result_code(ctrl.init(InitOptions {
        platform_optimizations,
        setup_gpu_context,
        create_display,
    }))
}

/// # Safety
///
/// `handle` must be a live handle from [`create`].
pub unsafe fn cleanup(handle: *mut Controller) {
    unsafe { controller(handle) }.cleanup();
}

/// # Safety
///
/// `handle` must be a live handle from [`create`].
pub unsafe fn prepare(handle: *mut Controller, width: i32, height: i32, prepare_input: bool) -> u32 {
    result_code(unsafe { controller(handle) }.prepare(width, height, prepare_input))
}

/// # Safety
///
/// `handle` must be a live handle from [`create`].
pub unsafe fn set_render_disp(
    handle: *mut Controller,
    width: i32,
    height: i32,
    orientation: i32,
) -> u32 {
    let ctrl = unsafe { controller(handle) };
    let Some(orientation) = RenderOrientation::from_i32(orientation) else {
        panic!("invalid render orientation code {orientation}");
    };
    result_code(ctrl.set_render_disp(width, height, orientation))
}

/// # Safety
///
/// `handle` must be a live handle from [`create`].
pub unsafe fn set_render_disp_show_mode(handle: *mut Controller, mode: i32) {
    let ctrl = unsafe { controller(handle) };
    let Some(mode) = ShowMode::from_i32(mode) else {
        panic!("invalid show mode code {mode}");
    };
    ctrl.set_render_disp_show_mode(mode);
}

/// # Safety
///
/// `handle` must be a live handle from [`create`]. `pixels` must be valid
/// for reads of `len` values.
pub unsafe fn set_input_pixels(handle: *mut Controller, pixels: *const i32, len: usize) -> u32 {
    let ctrl = unsafe { controller(handle) };
    let pixels = unsafe { host_pixels(pixels, len) };
    result_code(ctrl.set_input_pixels(pixels))
}

/// # Safety
///
/// `handle` must be a live handle from [`create`].
pub unsafe fn set_input_texture(handle: *mut Controller, texture: TextureId) {
    unsafe { controller(handle) }.set_input_texture(texture);
}

/// # Safety
///
/// `handle` must be a live handle from [`create`].
pub unsafe fn process(handle: *mut Controller) {
    unsafe { controller(handle) }.process();
}

/// # Safety
///
/// `handle` must be a live handle from [`create`].
pub unsafe fn render_output(handle: *mut Controller) {
    unsafe { controller(handle) }.render_output();
}

/// Read back the output frame and describe it in `out`.
///
/// The buffer is registered for the host once per generation: repeated
/// readbacks into the same buffer share one registration, which ends with
/// [`release_output_pixels`] or when the next prepare or cleanup revokes it.
///
/// # Safety
///
/// `handle` must be a live handle from [`create`]; `out` must be valid for
/// one write.
pub unsafe fn get_output_pixels(handle: *mut Controller, out: *mut OutputPixelsStruct) -> u32 {
    assert!(!out.is_null(), "null output pixel struct");
    let ctrl = unsafe { controller(handle) };

    let view = ctrl.get_output_pixels();
    ctrl.output_buffers().export_view();
    let pixels = match ctrl.output_pixels(&view) {
        Ok(bytes) => OutputPixelsStruct {
            data: bytes.as_ptr(),
            len: bytes.len(),
            width: view.size().width,
            height: view.size().height,
            generation: view.generation(),
        },
        Err(err) => {
            error!("get_output_pixels aborted: {}", err.report());
            unsafe { out.write(OutputPixelsStruct::empty()) };
            return OG_FAIL;
        }
    };
    unsafe { out.write(pixels) };
    OG_SUCCESS
}

/// # Safety
///
/// `handle` must be a live handle from [`create`].
pub unsafe fn release_output_pixels(handle: *mut Controller, generation: u64) -> bool {
    unsafe { controller(handle) }
        .output_buffers()
        .release_export(generation)
}

/// # Safety
///
/// `handle` must be a live handle from [`create`].
pub unsafe fn output_pixels_valid(handle: *mut Controller, generation: u64) -> bool {
    unsafe { controller(handle) }
        .output_buffers()
        .is_generation_live(generation)
}

/// # Safety
///
/// `handle` must be a live handle from [`create`].
pub unsafe fn output_frame_w(handle: *mut Controller) -> i32 {
    unsafe { controller(handle) }.output_frame_w()
}

/// # Safety
///
/// `handle` must be a live handle from [`create`].
pub unsafe fn output_frame_h(handle: *mut Controller) -> i32 {
    unsafe { controller(handle) }.output_frame_h()
}

/// Copy up to `capacity` stage timings into `dst`. Returns the number
/// written, or `-1` when timings are not compiled in.
///
/// # Safety
///
/// `handle` must be a live handle from [`create`]; `dst` must be valid for
/// `capacity` writes or null.
pub unsafe fn time_measurements(handle: *mut Controller, dst: *mut f64, capacity: usize) -> i32 {
    match unsafe { controller(handle) }.time_measurements() {
        Some(values) => {
            let written = unsafe { copy_f64_to_host_buffer(dst, capacity, &values) };
            i32::try_from(written).unwrap_or(i32::MAX)
        }
        None => -1,
    }
}

/// Export the bridge C ABI for a backend.
///
/// `$backend` is evaluated on every `og_bridge_create` call and must yield a
/// type implementing [`og_core::Backend`].
///
/// ```ignore
/// og_bridge::bridge_main!(og_bridge::backend::scaled(0.5));
/// ```
#[macro_export]
macro_rules! bridge_main {
    ($backend:expr) => {
        #[no_mangle]
        pub extern "C" fn og_bridge_create() -> *mut $crate::Controller {
            $crate::ffi::create(::std::boxed::Box::new($backend))
        }

        #[no_mangle]
        pub unsafe extern "C" fn og_bridge_destroy(handle: *mut $crate::Controller) {
            unsafe { $crate::ffi::destroy(handle) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn og_bridge_init(
            handle: *mut $crate::Controller,
            platform_optimizations: bool,
            setup_gpu_context: bool,
            create_display: bool,
        ) -> u32 {
            unsafe {
                $crate::ffi::init(
                    handle,
                    platform_optimizations,
                    setup_gpu_context,
                    create_display,
                )
            }
        }

        #[no_mangle]
        pub unsafe extern "C" fn og_bridge_cleanup(handle: *mut $crate::Controller) {
            unsafe { $crate::ffi::cleanup(handle) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn og_bridge_prepare(
            handle: *mut $crate::Controller,
            width: i32,
            height: i32,
            prepare_input: bool,
        ) -> u32 {
            unsafe { $crate::ffi::prepare(handle, width, height, prepare_input) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn og_bridge_set_render_disp(
            handle: *mut $crate::Controller,
            width: i32,
            height: i32,
            orientation: i32,
        ) -> u32 {
            unsafe { $crate::ffi::set_render_disp(handle, width, height, orientation) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn og_bridge_set_render_disp_show_mode(
            handle: *mut $crate::Controller,
            mode: i32,
        ) {
            unsafe { $crate::ffi::set_render_disp_show_mode(handle, mode) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn og_bridge_set_input_pixels(
            handle: *mut $crate::Controller,
            pixels: *const i32,
            len: usize,
        ) -> u32 {
            unsafe { $crate::ffi::set_input_pixels(handle, pixels, len) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn og_bridge_set_input_texture(
            handle: *mut $crate::Controller,
            texture: u32,
        ) {
            unsafe { $crate::ffi::set_input_texture(handle, texture) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn og_bridge_process(handle: *mut $crate::Controller) {
            unsafe { $crate::ffi::process(handle) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn og_bridge_render_output(handle: *mut $crate::Controller) {
            unsafe { $crate::ffi::render_output(handle) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn og_bridge_get_output_pixels(
            handle: *mut $crate::Controller,
            out: *mut $crate::OutputPixelsStruct,
        ) -> u32 {
            unsafe { $crate::ffi::get_output_pixels(handle, out) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn og_bridge_release_output_pixels(
            handle: *mut $crate::Controller,
            generation: u64,
        ) -> bool {
            unsafe { $crate::ffi::release_output_pixels(handle, generation) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn og_bridge_output_pixels_valid(
            handle: *mut $crate::Controller,
            generation: u64,
        ) -> bool {
            unsafe { $crate::ffi::output_pixels_valid(handle, generation) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn og_bridge_get_output_frame_w(
            handle: *mut $crate::Controller,
        ) -> i32 {
            unsafe { $crate::ffi::output_frame_w(handle) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn og_bridge_get_output_frame_h(
            handle: *mut $crate::Controller,
        ) -> i32 {
            unsafe { $crate::ffi::output_frame_h(handle) }
        }

        #[no_mangle]
        pub unsafe extern "C" fn og_bridge_get_time_measurements(
            handle: *mut $crate::Controller,
            dst: *mut f64,
            capacity: usize,
        ) -> i32 {
            unsafe { $crate::ffi::time_measurements(handle, dst, capacity) }
        }
    };
}
