//! Shared vocabulary of the og bridge.
//!
//! - [`ffi`]: constants and C-repr structs that cross the host boundary.
//! - [`inputs`]: frame sizes, formats, texture kinds and display settings.
//! - [`facade`]: traits for the GPU context, pipeline, display and backend.
//! - [`logging`]: `tracing` subscriber setup.

pub mod facade;
pub mod ffi;
pub mod inputs;
pub mod logging;

pub use facade::{Backend, Display, GpuContext, Pipeline, PipelineSetup};
pub use inputs::{FrameSize, InputFormat, RenderOrientation, ShowMode, TextureId, TextureKind};
