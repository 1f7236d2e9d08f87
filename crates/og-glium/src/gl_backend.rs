//! glium backend over the host's current GL surface.

use std::cell::Cell;
use std::sync::Once;
use std::thread::{self, ThreadId};

use og_core::FrameSize;

static LOADER_ONCE: Once = Once::new();

/// The surface the display draws into.
///
/// The host owns the GL context and the window surface. This type only
/// remembers the drawable size and the thread the display was created on;
/// glium treats the context as current exactly on that thread.
#[derive(Debug)]
pub(crate) struct HostSurface {
    size: Cell<FrameSize>,
    owner: ThreadId,
}

impl HostSurface {
    pub(crate) fn new(size: FrameSize) -> Self {
        LOADER_ONCE.call_once(|| {
            gl_loader::init_gl();
        });

        Self {
            size: Cell::new(size),
            owner: thread::current().id(),
        }
    }

    pub(crate) fn size(&self) -> FrameSize {
        self.size.get()
    }
}

/// # Safety
///
/// The host keeps its GL context current on the owner thread for as long as
/// the display lives.
unsafe impl glium::backend::Backend for HostSurface {
    fn swap_buffers(&self) -> Result<(), glium::SwapBuffersError> {
        // Presentation is the host's job.
        Ok(())
    }

    unsafe fn get_proc_address(&self, symbol: &str) -> *const std::os::raw::c_void {
        gl_loader::get_proc_address(symbol).cast()
    }

    fn get_framebuffer_dimensions(&self) -> (u32, u32) {
        let size = self.size.get();
        (size.width, size.height)
    }

    fn is_current(&self) -> bool {
        thread::current().id() == self.owner
    }

    unsafe fn make_current(&self) {}

    fn resize(&self, (width, height): (u32, u32)) {
        self.size.set(FrameSize::new(width, height));
    }
}
