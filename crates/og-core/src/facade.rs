//! Interfaces of the GPU-side collaborators the bridge drives.
//!
//! The bridge never touches GL directly. It sequences calls into these
//! facades and owns the objects that implement them:
//!
//! - [`GpuContext`] sets up and activates the offscreen rendering context.
//! - [`Pipeline`] is the processing graph: sizing, input, one pass, output.
//! - [`Display`] presents a texture on screen (optional).
//! - [`Backend`] creates all of the above and runs the pipeline-setup
//!   callback that builds the processing graph.
//!
//! All facades are used from the thread that activated the GPU context.

use std::any::Any;

use anyhow::Result;

use crate::inputs::{FrameSize, InputFormat, RenderOrientation, TextureId, TextureKind};

/// Offscreen rendering context.
pub trait GpuContext {
    /// Create the context. Called once per session.
    fn setup(&mut self) -> Result<()>;

    /// (Re)create the offscreen surface for frames of the given size.
    fn create_offscreen_surface(&mut self, size: FrameSize) -> Result<()>;

    /// Make the context current on the calling thread.
    fn activate(&mut self) -> Result<()>;

    /// Destroy the surface and context.
    fn shutdown(&mut self);
}

/// The processing graph.
///
/// `init` allocates the GPU resources the graph needs and is called exactly
/// once per session, before the first `prepare`. `prepare` may be called many
/// times with different sizes.
pub trait Pipeline {
    /// Downcast to the concrete pipeline. Used by the pipeline-setup callback
    /// to add stages or tune parameters.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Ask the pipeline to enable platform-specific fast paths.
    ///
    /// Returns `true` if any were enabled.
    fn enable_platform_optimizations(&mut self) -> bool {
        false
    }

    /// One-time GPU resource allocation.
    fn init(&mut self) -> Result<()>;

    /// Size the graph for input frames of `size`.
    fn prepare(&mut self, size: FrameSize, format: InputFormat) -> Result<()>;

    /// Run one full pass over the current input. Blocks until the GPU is done.
    fn process(&mut self);

    /// Use an existing texture as the frame source.
    fn set_input_texture(&mut self, id: TextureId, kind: TextureKind);

    /// Upload RGBA8 host pixels as the frame source.
    fn set_input_data(&mut self, data: &[u8]);

    /// Read the output frame into `dst` (RGBA8, row-major, top row first).
    /// Blocks until the GPU is done.
    fn read_output(&mut self, dst: &mut [u8]);

    /// Texture holding the last output frame; `0` before `prepare`.
    fn output_texture(&self) -> TextureId;

    /// Output frame size as sized by the last `prepare`.
    fn output_size(&self) -> FrameSize;

    /// Per-stage timings of the last pass in milliseconds.
    fn time_measurements(&self) -> Vec<f64> {
        Vec::new()
    }
}

/// On-screen presentation of a texture.
pub trait Display {
    fn set_output_size(&mut self, size: FrameSize);

    fn set_output_orientation(&mut self, orientation: RenderOrientation);

    /// Present `id`, a texture of `size`, on the next `render`. `unit` is the
    /// texture unit the caller expects it on.
    fn use_texture(&mut self, id: TextureId, unit: u32, kind: TextureKind, size: FrameSize);

    /// Draw the bound texture to the current surface.
    fn render(&mut self);
}

/// Builds the processing graph on a freshly created pipeline.
///
/// Implemented for any `FnMut(&mut dyn Pipeline) -> Result<()>`.
pub trait PipelineSetup {
    fn setup(&mut self, pipeline: &mut dyn Pipeline) -> Result<()>;
}

impl<F> PipelineSetup for F
where
    F: FnMut(&mut dyn Pipeline) -> Result<()>,
{
    fn setup(&mut self, pipeline: &mut dyn Pipeline) -> Result<()> {
        self(pipeline)
    }
}

/// Factory for the facades of one platform.
///
/// The bridge calls into the backend at `init` time. Every object it hands
/// out is owned by the bridge and dropped at `cleanup`.
pub trait Backend {
    fn create_pipeline(&mut self) -> Box<dyn Pipeline>;

    /// Build the processing graph on `pipeline`.
    fn setup_pipeline(&mut self, pipeline: &mut dyn Pipeline) -> Result<()>;

    fn create_display(&mut self, pipeline: &mut dyn Pipeline) -> Result<Box<dyn Display>>;

    fn create_gpu_context(&mut self) -> Box<dyn GpuContext>;
}
