//! Failures the bridge reports without aborting the process.
//!
//! Contract violations (wrong call order, missing display, unbound textures)
//! are not represented here; they panic.

use og_core::FrameSize;
use thiserror::Error;

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("GPU context setup failed")]
    ContextSetup(#[source] anyhow::Error),

    #[error("offscreen surface {size} could not be created")]
    Surface {
        size: FrameSize,
        #[source]
        source: anyhow::Error,
    },

    #[error("GPU context activation failed")]
    Activation(#[source] anyhow::Error),

    #[error("pipeline setup callback failed")]
    PipelineSetup(#[source] anyhow::Error),

    #[error("pipeline init failed")]
    PipelineInit(#[source] anyhow::Error),

    #[error("pipeline preparation for {size} failed")]
    PipelinePrepare {
        size: FrameSize,
        #[source]
        source: anyhow::Error,
    },

    #[error("display creation failed")]
    Display(#[source] anyhow::Error),

    #[error("invalid frame dimensions {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    #[error("output view generation {view} is stale (current generation {current})")]
    StaleView { view: u64, current: u64 },

    #[error("input holds {actual} pixels, expected {expected}")]
    InputSize { expected: usize, actual: usize },
}

impl BridgeError {
    pub(crate) fn invalid_size(size: FrameSize) -> Self {
        BridgeError::InvalidDimensions {
            width: size.width.into(),
            height: size.height.into(),
        }
    }

    /// The error and all of its sources, joined with `": "`.
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}
