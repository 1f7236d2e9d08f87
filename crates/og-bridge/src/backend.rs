//! The OpenGL backend: raw GL pipeline and context, glium display.

use anyhow::{bail, Result};
use og_core::{Backend, Display, FrameSize, GpuContext, Pipeline, PipelineSetup};
use og_glium::GliumDisplay;
use og_interop::{GlTransferPipeline, HostGlContext};
use tracing::debug;

/// Display size used until the host calls `set_render_disp`.
const INITIAL_DISPLAY_SIZE: FrameSize = FrameSize::new(1, 1);

/// Backend that runs in the host's current GL context.
///
/// `S` builds the processing graph on every new [`GlTransferPipeline`]. It
/// receives the pipeline as `&mut dyn Pipeline` and downcasts through
/// [`Pipeline::as_any_mut`].
pub struct GlBackend<S> {
    setup: S,
}

impl<S: PipelineSetup> GlBackend<S> {
    pub fn new(setup: S) -> Self {
        Self { setup }
    }
}

/// Full-size pass-through.
pub fn passthrough() -> GlBackend<impl PipelineSetup> {
    GlBackend::new(|_: &mut dyn Pipeline| -> Result<()> { Ok(()) })
}

/// Pass-through that downscales the output by `scale`.
pub fn scaled(scale: f32) -> GlBackend<impl PipelineSetup> {
    GlBackend::new(move |pipeline: &mut dyn Pipeline| -> Result<()> {
        let Some(transfer) = pipeline.as_any_mut().downcast_mut::<GlTransferPipeline>() else {
            bail!("expected a GL transfer pipeline");
        };
        transfer.set_output_scale(scale);
        Ok(())
    })
}

impl<S: PipelineSetup> Backend for GlBackend<S> {
    fn create_pipeline(&mut self) -> Box<dyn Pipeline> {
        Box::new(GlTransferPipeline::new())
    }

    fn setup_pipeline(&mut self, pipeline: &mut dyn Pipeline) -> Result<()> {
        self.setup.setup(pipeline)
    }

    fn create_display(&mut self, pipeline: &mut dyn Pipeline) -> Result<Box<dyn Display>> {
        let size = match pipeline.output_size() {
            size if size.is_empty() => INITIAL_DISPLAY_SIZE,
            size => size,
        };
        debug!(%size, "creating glium display");
        Ok(Box::new(GliumDisplay::new(size)?))
    }

    fn create_gpu_context(&mut self) -> Box<dyn GpuContext> {
        Box::new(HostGlContext::new())
    }
}
