//! Lifecycle of the optional offscreen GPU context.

use std::thread::{self, ThreadId};

use og_core::{FrameSize, GpuContext};
use tracing::debug;

use crate::error::{BridgeError, Result};

/// GPU context as seen by the controller.
///
/// `Active` records the thread that activated the context. From then on all
/// GPU work of the session must happen on that thread.
pub(crate) enum GpuContextState {
    Absent,
    Created(Box<dyn GpuContext>),
    Active {
        ctx: Box<dyn GpuContext>,
        thread: ThreadId,
        surface: FrameSize,
    },
}

impl GpuContextState {
    /// Run `setup` on a fresh context.
    pub(crate) fn create(mut ctx: Box<dyn GpuContext>) -> Result<Self> {
        ctx.setup().map_err(BridgeError::ContextSetup)?;
        debug!("GPU context set up");
        Ok(GpuContextState::Created(ctx))
    }

    pub(crate) fn is_absent(&self) -> bool {
        matches!(self, GpuContextState::Absent)
    }

    pub(crate) fn surface(&self) -> Option<FrameSize> {
        match self {
            GpuContextState::Active { surface, .. } => Some(*surface),
            _ => None,
        }
    }

    fn context_mut(&mut self) -> Option<&mut Box<dyn GpuContext>> {
        match self {
            GpuContextState::Absent => None,
            GpuContextState::Created(ctx) | GpuContextState::Active { ctx, .. } => Some(ctx),
        }
    }

    /// Create an offscreen surface of `size` and activate the context on the
    /// calling thread. Without a context this does nothing.
    ///
    /// On failure the recorded state is left as it was.
    pub(crate) fn prepare_surface(&mut self, size: FrameSize) -> Result<()> {
        let Some(ctx) = self.context_mut() else {
            return Ok(());
        };

        ctx.create_offscreen_surface(size)
            .map_err(|source| BridgeError::Surface { size, source })?;
        ctx.activate().map_err(BridgeError::Activation)?;

        let thread = thread::current().id();
        *self = match std::mem::replace(self, GpuContextState::Absent) {
            GpuContextState::Created(ctx) | GpuContextState::Active { ctx, .. } => {
                GpuContextState::Active {
                    ctx,
                    thread,
                    surface: size,
                }
            }
            GpuContextState::Absent => GpuContextState::Absent,
        };
        debug!(%size, ?thread, "GPU context active");
        Ok(())
    }

    /// Panic unless the calling thread may use the context.
    pub(crate) fn assert_thread(&self, op: &str) {
        if let GpuContextState::Active { thread, .. } = self {
            let current = thread::current().id();
            assert!(
                *thread == current,
                "{op} called on {current:?} but the GPU context is active on {thread:?}"
            );
        }
    }

    pub(crate) fn shutdown(self) {
        match self {
            GpuContextState::Absent => {}
            GpuContextState::Created(mut ctx) | GpuContextState::Active { mut ctx, .. } => {
                ctx.shutdown();
                debug!("GPU context shut down");
            }
        }
    }
}
