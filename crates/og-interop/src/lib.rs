//! Raw OpenGL implementations of the bridge facades.
//!
//! - [`HostGlContext`] adopts a GL context the host already made current.
//! - [`GlTransferPipeline`] is a pass-through/scale pipeline: host pixels or a
//!   host texture in, an RGBA8 output texture and synchronous readback out.
//!
//! Both run in the host's own GL context, so no cross-API texture sharing is
//! involved.

use std::sync::Once;

pub mod context;
pub mod transfer;

pub use context::HostGlContext;
pub use transfer::GlTransferPipeline;

static GL_INIT_ONCE: Once = Once::new();

/// Load GL function pointers. Only the first call does any work.
pub fn load_gl() {
    GL_INIT_ONCE.call_once(|| {
        gl_loader::init_gl();
        gl::load_with(|s| gl_loader::get_proc_address(s).cast());
    });
}

/// Whether a GL context is current on the calling thread.
pub fn is_context_current() -> bool {
    if !gl::GetString::is_loaded() {
        return false;
    }
    unsafe { !gl::GetString(gl::VERSION).is_null() }
}

fn clear_gl_errors() {
    unsafe {
        while gl::GetError() != gl::NO_ERROR {}
    }
}
