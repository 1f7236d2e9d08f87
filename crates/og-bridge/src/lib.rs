//! Lifecycle bridge between a host and a GPU image-processing pipeline.
//!
//! A [`Controller`] owns one pipeline session: the pipeline itself, an
//! optional on-screen display, an optional offscreen GPU context and the
//! host-visible output buffer. It enforces the call order
//! `init -> prepare -> {process, read back, render}* -> cleanup`, keeps the
//! output buffer sized to the pipeline's output frame, and hands out
//! generation-checked [`OutputView`]s so a reallocated buffer can never be
//! read through an old view.
//!
//! The GPU side is reached only through the facades in [`og_core`]. The
//! [`backend`] module wires the OpenGL implementations together, and
//! [`bridge_main!`] exports the whole thing as a C ABI.
//!
//! ```ignore
//! use og_bridge::{backend, Controller, InitOptions};
//!
//! let mut ctrl = Controller::new(Box::new(backend::passthrough()));
//! ctrl.init(InitOptions::default())?;
//! ctrl.prepare(640, 480, true)?;
//! ctrl.set_input_pixels(&pixels)?;
//! ctrl.process();
//! let view = ctrl.get_output_pixels();
//! let rgba = ctrl.output_pixels(&view)?;
//! ctrl.cleanup();
//! ```

pub mod backend;
pub mod buffer;
pub mod bytes;
mod context;
pub mod controller;
pub mod error;
pub mod ffi;

#[cfg(test)]
pub(crate) mod testing;

pub use buffer::{HeapMemory, HostMemory, OutputBufferManager, OutputView};
pub use controller::{Controller, InitOptions, LifecycleState, TextureBinding};
pub use error::{BridgeError, Result};
pub use og_core::ffi::OutputPixelsStruct;
