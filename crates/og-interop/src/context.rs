//! [`HostGlContext`]: the GPU context facade for hosts that own the context.
//!
//! Embedders such as a video host or a native activity create the GL context
//! and surface themselves. This facade checks that the context is current,
//! and treats the offscreen surface as a viewport over the host's surface.

use anyhow::{bail, Result};
use og_core::{FrameSize, GpuContext};
use tracing::debug;

use crate::{clear_gl_errors, is_context_current, load_gl};

#[derive(Debug, Default)]
pub struct HostGlContext {
    ready: bool,
    surface: FrameSize,
}

impl HostGlContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the current offscreen surface; zero before the first prepare.
    pub fn surface_size(&self) -> FrameSize {
        self.surface
    }
}

impl GpuContext for HostGlContext {
    fn setup(&mut self) -> Result<()> {
        load_gl();
        if !is_context_current() {
            bail!("no GL context is current on this thread");
        }
        clear_gl_errors();
        self.ready = true;
        debug!("adopted host GL context");
        Ok(())
    }

    fn create_offscreen_surface(&mut self, size: FrameSize) -> Result<()> {
        if !self.ready {
            bail!("GL context was not set up");
        }
        if size.is_empty() {
            bail!("offscreen surface must not be empty, got {size}");
        }

        let (w, h) = size.to_host();
        unsafe {
            gl::Viewport(0, 0, w, h);
        }
        self.surface = size;
        debug!(%size, "offscreen surface ready");
        Ok(())
    }

    fn activate(&mut self) -> Result<()> {
        if !self.ready {
            bail!("GL context was not set up");
        }
        if !is_context_current() {
            bail!("host GL context is no longer current");
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.ready = false;
        self.surface = FrameSize::ZERO;
        debug!("released host GL context");
    }
}
