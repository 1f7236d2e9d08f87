//! Host-visible output buffer and the views the caller holds into it.
//!
//! [`OutputBufferManager`] owns a single slot. Every reallocation swaps a
//! fresh region into the slot and releases the old one during the swap, so at
//! most one region is live between calls. Each region carries a generation
//! number; an [`OutputView`] is only honored while its generation is the live
//! one, so a view can never reach a released region.

use og_core::FrameSize;
use tracing::debug;

use crate::error::{BridgeError, Result};

/// Allocator for output regions.
///
/// The default is [`HeapMemory`]. Embedders that must hand out pinned or
/// externally registered memory provide their own.
pub trait HostMemory {
    fn allocate(&mut self, len: usize) -> Box<[u8]>;

    fn free(&mut self, region: Box<[u8]>);
}

/// Zero-initialized heap regions.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapMemory;

impl HostMemory for HeapMemory {
    fn allocate(&mut self, len: usize) -> Box<[u8]> {
        vec![0u8; len].into_boxed_slice()
    }

    fn free(&mut self, region: Box<[u8]>) {
        drop(region);
    }
}

/// Caller-held alias of the output buffer.
///
/// A view is a token, not a borrow: it stays `Copy` across the host boundary
/// and is checked against the live generation on every access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputView {
    generation: u64,
    size: FrameSize,
    len: usize,
}

impl OutputView {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Length in bytes (`width * height * 4`).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

struct OutputSlot {
    data: Box<[u8]>,
    size: FrameSize,
    generation: u64,
    /// Views registered through `acquire_view` or `export_view` and not yet
    /// released.
    views: usize,
    /// Whether the host holds the registration made by `export_view`.
    exported: bool,
}

impl OutputSlot {
    fn view(&self) -> OutputView {
        OutputView {
            generation: self.generation,
            size: self.size,
            len: self.data.len(),
        }
    }
}

pub struct OutputBufferManager {
    memory: Box<dyn HostMemory>,
    slot: Option<OutputSlot>,
    generation: u64,
}

impl Default for OutputBufferManager {
    fn default() -> Self {
        Self::new(Box::new(HeapMemory))
    }
}

impl std::fmt::Debug for OutputBufferManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputBufferManager")
            .field("view", &self.current_view())
            .field("generation", &self.generation)
            .finish()
    }
}

impl OutputBufferManager {
    pub fn new(memory: Box<dyn HostMemory>) -> Self {
        Self {
            memory,
            slot: None,
            generation: 0,
        }
    }

    /// Replace the buffer with one of `size * 4` bytes.
    ///
    /// Fails with [`BridgeError::InvalidDimensions`] for an empty or
    /// overflowing size; the current buffer is then left untouched. On
    /// success every view of the previous buffer becomes stale.
    pub fn reallocate(&mut self, size: FrameSize) -> Result<OutputView> {
        let len = match size.rgba_len() {
            Some(len) if !size.is_empty() => len,
            _ => return Err(BridgeError::invalid_size(size)),
        };

        let data = self.memory.allocate(len);
        self.generation += 1;
        let next = OutputSlot {
            data,
            size,
            generation: self.generation,
            views: 0,
            exported: false,
        };
        let view = next.view();

        if let Some(previous) = self.slot.replace(next) {
            self.retire(previous);
        }

        debug!(%size, len, generation = view.generation, "output buffer allocated");
        Ok(view)
    }

    /// Free the buffer and revoke all views. Does nothing when empty.
    pub fn release(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.generation += 1;
            self.retire(slot);
        }
    }

    fn retire(&mut self, slot: OutputSlot) {
        if slot.views > 0 {
            debug!(
                generation = slot.generation,
                views = slot.views,
                "revoking outstanding output views"
            );
        }
        self.memory.free(slot.data);
    }

    /// View of the live buffer, without registering it.
    pub fn current_view(&self) -> Option<OutputView> {
        self.slot.as_ref().map(OutputSlot::view)
    }

    /// Register a caller-held view of the live buffer.
    pub fn acquire_view(&mut self) -> Option<OutputView> {
        let slot = self.slot.as_mut()?;
        slot.views += 1;
        Some(slot.view())
    }

    /// Register the live buffer for the host, at most once per generation.
    ///
    /// Repeated calls on the same generation return the same view and do not
    /// add registrations; [`release_export`](Self::release_export) ends it.
    pub fn export_view(&mut self) -> Option<OutputView> {
        let slot = self.slot.as_mut()?;
        if !slot.exported {
            slot.exported = true;
            slot.views += 1;
        }
        Some(slot.view())
    }

    /// End the host registration of `generation`. Returns `false` when the
    /// generation is stale or not exported.
    pub fn release_export(&mut self, generation: u64) -> bool {
        match self.slot.as_mut() {
            Some(slot) if slot.generation == generation && slot.exported => {
                slot.exported = false;
                slot.views -= 1;
                true
            }
            _ => false,
        }
    }

    /// Unregister a view by generation. Stale or unknown generations are
    /// ignored and return `false`.
    pub fn release_generation(&mut self, generation: u64) -> bool {
        match self.slot.as_mut() {
            Some(slot) if slot.generation == generation && slot.views > 0 => {
                slot.views -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn release_view(&mut self, view: OutputView) -> bool {
        self.release_generation(view.generation)
    }

    pub fn is_generation_live(&self, generation: u64) -> bool {
        self.slot
            .as_ref()
            .is_some_and(|slot| slot.generation == generation)
    }

    pub fn is_valid(&self, view: &OutputView) -> bool {
        self.is_generation_live(view.generation)
    }

    /// Bytes behind `view`, if it is still live.
    pub fn bytes(&self, view: &OutputView) -> Result<&[u8]> {
        match self.slot.as_ref() {
            Some(slot) if slot.generation == view.generation => Ok(&slot.data),
            _ => Err(BridgeError::StaleView {
                view: view.generation,
                current: self.generation,
            }),
        }
    }

    /// Mutable bytes of the live buffer, for readback.
    pub(crate) fn data_mut(&mut self) -> Option<&mut [u8]> {
        self.slot.as_mut().map(|slot| &mut *slot.data)
    }

    /// Size of the live buffer; zero when none is allocated.
    pub fn size(&self) -> FrameSize {
        self.slot.as_ref().map_or(FrameSize::ZERO, |slot| slot.size)
    }

    /// Length of the live buffer in bytes; zero when none is allocated.
    pub fn len(&self) -> usize {
        self.slot.as_ref().map_or(0, |slot| slot.data.len())
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Latest generation handed out (including releases).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn outstanding_views(&self) -> usize {
        self.slot.as_ref().map_or(0, |slot| slot.views)
    }
}

impl Drop for OutputBufferManager {
    fn drop(&mut self) {
        self.release();
    }
}
