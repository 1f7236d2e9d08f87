//! [`GlTransferPipeline`]: pass-through/scale pipeline on raw GL.
//!
//! The pipeline owns:
//!
//! - an upload texture, when prepared for host pixel input
//! - an output texture, optionally smaller than the input
//! - two framebuffers used to blit input to output
//!
//! Rows are stored with the top row at `t = 0`, so pixel uploads and readbacks
//! need no vertical flip.

use std::any::Any;
use std::time::Instant;

use anyhow::{bail, Result};
use gl::types::{GLenum, GLuint};
use og_core::{FrameSize, InputFormat, Pipeline, TextureId, TextureKind};
use tracing::{debug, trace, warn};

use crate::{clear_gl_errors, load_gl};

const MIN_OUTPUT_SCALE: f32 = 0.125;
const MAX_OUTPUT_SCALE: f32 = 1.0;

/// Output size for `input` downscaled by `scale` (clamped to
/// `[0.125, 1.0]`). Never smaller than 1x1.
pub fn scaled_size(input: FrameSize, scale: f32) -> FrameSize {
    let scale = scale.clamp(MIN_OUTPUT_SCALE, MAX_OUTPUT_SCALE);
    FrameSize::new(
        ((input.width as f32 * scale) as u32).max(1),
        ((input.height as f32 * scale) as u32).max(1),
    )
}

/// Milliseconds spent in each stage of the last frame.
#[derive(Debug, Default, Clone, Copy)]
struct StageTimings {
    upload_ms: f64,
    process_ms: f64,
    readback_ms: f64,
}

pub struct GlTransferPipeline {
    initialized: bool,
    read_fbo: GLuint,
    draw_fbo: GLuint,
    /// Owned upload target; `0` unless prepared with [`InputFormat::Rgba`].
    upload_texture: GLuint,
    /// Owned output texture.
    output_texture: GLuint,
    input: Option<(TextureId, TextureKind)>,
    input_size: FrameSize,
    output_size: FrameSize,
    output_scale: f32,
    bilinear: bool,
    timings: StageTimings,
}

impl Default for GlTransferPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl GlTransferPipeline {
    /// Create a pipeline. No GL resources are allocated until
    /// [`init`](Pipeline::init) and [`prepare`](Pipeline::prepare).
    pub fn new() -> Self {
        Self {
            initialized: false,
            read_fbo: 0,
            draw_fbo: 0,
            upload_texture: 0,
            output_texture: 0,
            input: None,
            input_size: FrameSize::ZERO,
            output_size: FrameSize::ZERO,
            output_scale: 1.0,
            bilinear: true,
            timings: StageTimings::default(),
        }
    }

    /// Downscale factor applied to the output, clamped to `[0.125, 1.0]`.
    /// Takes effect on the next `prepare`.
    pub fn set_output_scale(&mut self, scale: f32) {
        self.output_scale = scale.clamp(MIN_OUTPUT_SCALE, MAX_OUTPUT_SCALE);
    }

    pub fn output_scale(&self) -> f32 {
        self.output_scale
    }

    /// Use bilinear filtering when scaling (default) or nearest.
    pub fn set_bilinear(&mut self, bilinear: bool) {
        self.bilinear = bilinear;
    }

    pub fn input_size(&self) -> FrameSize {
        self.input_size
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn create_rgba_texture(size: FrameSize) -> GLuint {
        let (w, h) = size.to_host();
        let mut tex = 0;
        unsafe {
            gl::GenTextures(1, &mut tex);
            gl::BindTexture(gl::TEXTURE_2D, tex);
            gl::TexStorage2D(gl::TEXTURE_2D, 1, gl::RGBA8, w, h);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as i32);
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
        tex
    }

    fn delete_texture(tex: &mut GLuint) {
        if *tex != 0 {
            unsafe {
                gl::DeleteTextures(1, tex);
            }
            *tex = 0;
        }
    }

    fn delete_textures(&mut self) {
        if self.input.map(|(id, _)| id) == Some(self.upload_texture) {
            self.input = None;
        }
        Self::delete_texture(&mut self.upload_texture);
        Self::delete_texture(&mut self.output_texture);
    }

    fn delete_fbos(&mut self) {
        unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
            if self.read_fbo != 0 {
                gl::DeleteFramebuffers(1, &self.read_fbo);
                self.read_fbo = 0;
            }
            if self.draw_fbo != 0 {
                gl::DeleteFramebuffers(1, &self.draw_fbo);
                self.draw_fbo = 0;
            }
        }
    }

    /// Block until all submitted GL commands have completed.
    fn wait_for_gpu() {
        unsafe {
            let fence = gl::FenceSync(gl::SYNC_GPU_COMMANDS_COMPLETE, 0);
            gl::ClientWaitSync(fence, gl::SYNC_FLUSH_COMMANDS_BIT, u64::MAX);
            gl::DeleteSync(fence);
        }
    }

    fn release(&mut self) {
        if !self.initialized {
            return;
        }
        self.delete_textures();
        self.delete_fbos();
        self.input = None;
        self.input_size = FrameSize::ZERO;
        self.output_size = FrameSize::ZERO;
        self.initialized = false;
    }
}

impl Pipeline for GlTransferPipeline {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn init(&mut self) -> Result<()> {
        load_gl();
        if !gl::GenFramebuffers::is_loaded() {
            bail!("GL framebuffer functions are not available");
        }
        clear_gl_errors();

        unsafe {
            gl::GenFramebuffers(1, &mut self.read_fbo);
            gl::GenFramebuffers(1, &mut self.draw_fbo);
        }
        self.initialized = true;
        debug!(read_fbo = self.read_fbo, draw_fbo = self.draw_fbo, "transfer pipeline initialized");
        Ok(())
    }

    fn prepare(&mut self, size: FrameSize, format: InputFormat) -> Result<()> {
        if !self.initialized {
            bail!("pipeline prepared before init");
        }
        if size.is_empty() {
            bail!("cannot prepare for an empty frame ({size})");
        }

        self.delete_textures();

        let output_size = scaled_size(size, self.output_scale);
        self.output_texture = Self::create_rgba_texture(output_size);

        if format == InputFormat::Rgba {
            self.upload_texture = Self::create_rgba_texture(size);
            self.input = Some((self.upload_texture, TextureKind::Texture2d));
        }

        self.input_size = size;
        self.output_size = output_size;
        debug!(
            input = %size,
            output = %output_size,
            ?format,
            output_texture = self.output_texture,
            "transfer pipeline prepared"
        );
        Ok(())
    }

    fn process(&mut self) {
        let Some((src, kind)) = self.input else {
            warn!("process called without an input source");
            return;
        };
        if self.output_texture == 0 {
            warn!("process called before prepare");
            return;
        }

        let started = Instant::now();
        let filter: GLenum = if self.bilinear { gl::LINEAR } else { gl::NEAREST };
        let (in_w, in_h) = self.input_size.to_host();
        let (out_w, out_h) = self.output_size.to_host();

        unsafe {
            gl::BindFramebuffer(gl::READ_FRAMEBUFFER, self.read_fbo);
            gl::FramebufferTexture2D(
                gl::READ_FRAMEBUFFER,
                gl::COLOR_ATTACHMENT0,
                kind.gl_target(),
                src,
                0,
            );
            gl::ReadBuffer(gl::COLOR_ATTACHMENT0);

            gl::BindFramebuffer(gl::DRAW_FRAMEBUFFER, self.draw_fbo);
            gl::FramebufferTexture2D(
                gl::DRAW_FRAMEBUFFER,
                gl::COLOR_ATTACHMENT0,
                gl::TEXTURE_2D,
                self.output_texture,
                0,
            );

            gl::BlitFramebuffer(
                0,
                0,
                in_w,
                in_h,
                0,
                0,
                out_w,
                out_h,
                gl::COLOR_BUFFER_BIT,
                filter,
            );

            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        }

        Self::wait_for_gpu();
        self.timings.process_ms = started.elapsed().as_secs_f64() * 1000.0;
        trace!(ms = self.timings.process_ms, "processed frame");
    }

    fn set_input_texture(&mut self, id: TextureId, kind: TextureKind) {
        self.input = Some((id, kind));
    }

    fn set_input_data(&mut self, data: &[u8]) {
        if self.upload_texture == 0 {
            warn!("pipeline was not prepared for pixel input; ignoring upload");
            return;
        }
        let needed = self.input_size.rgba_len().unwrap_or(usize::MAX);
        if data.len() < needed {
            warn!(len = data.len(), needed, "input pixel buffer too small; ignoring upload");
            return;
        }

        let started = Instant::now();
        let (w, h) = self.input_size.to_host();
        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, self.upload_texture);
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TexSubImage2D(
                gl::TEXTURE_2D,
                0,
                0,
                0,
                w,
                h,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                data.as_ptr().cast(),
            );
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
        self.input = Some((self.upload_texture, TextureKind::Texture2d));
        self.timings.upload_ms = started.elapsed().as_secs_f64() * 1000.0;
    }

    fn read_output(&mut self, dst: &mut [u8]) {
        if self.output_texture == 0 {
            warn!("read_output called before prepare");
            return;
        }
        let needed = self.output_size.rgba_len().unwrap_or(usize::MAX);
        if dst.len() < needed {
            warn!(len = dst.len(), needed, "output buffer too small; skipping readback");
            return;
        }

        let started = Instant::now();
        let (w, h) = self.output_size.to_host();
        unsafe {
            gl::BindFramebuffer(gl::READ_FRAMEBUFFER, self.read_fbo);
            gl::FramebufferTexture2D(
                gl::READ_FRAMEBUFFER,
                gl::COLOR_ATTACHMENT0,
                gl::TEXTURE_2D,
                self.output_texture,
                0,
            );
            gl::ReadBuffer(gl::COLOR_ATTACHMENT0);
            gl::PixelStorei(gl::PACK_ALIGNMENT, 1);
            gl::ReadPixels(0, 0, w, h, gl::RGBA, gl::UNSIGNED_BYTE, dst.as_mut_ptr().cast());
            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        }
        self.timings.readback_ms = started.elapsed().as_secs_f64() * 1000.0;
    }

    fn output_texture(&self) -> TextureId {
        self.output_texture
    }

    fn output_size(&self) -> FrameSize {
        self.output_size
    }

    fn time_measurements(&self) -> Vec<f64> {
        vec![
            self.timings.upload_ms,
            self.timings.process_ms,
            self.timings.readback_ms,
        ]
    }
}

impl Drop for GlTransferPipeline {
    fn drop(&mut self) {
        self.release();
    }
}
