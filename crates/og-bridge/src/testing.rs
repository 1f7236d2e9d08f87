//! Test doubles for the facades and the host allocator.
//!
//! Every fake reports into a shared [`Ledger`], which counts live objects and
//! records calls so tests can check ordering and leaks.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{bail, Result};
use og_core::{
    Backend, Display, FrameSize, GpuContext, InputFormat, Pipeline, RenderOrientation, TextureId,
    TextureKind,
};

use crate::buffer::HostMemory;

/// Failures a test can inject.
#[derive(Debug, Default, Clone)]
pub struct Faults {
    pub context_setup: bool,
    pub surface: bool,
    pub activation: bool,
    pub pipeline_setup: bool,
    pub pipeline_init: bool,
    pub pipeline_prepare: bool,
    pub display: bool,
    /// Make the pipeline report an empty output size.
    pub empty_output: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCall {
    OutputSize(FrameSize),
    Orientation(RenderOrientation),
    UseTexture(TextureId, u32, TextureKind, FrameSize),
    Render,
}

#[derive(Debug, Default)]
pub struct Ledger {
    pub faults: Faults,
    /// Output size divisor applied by the fake pipeline.
    pub output_divisor: u32,

    pub pipelines_created: usize,
    pub pipelines_live: usize,
    pub platform_optimizations: usize,
    pub setups_run: usize,
    pub pipeline_inits: usize,
    pub prepares: Vec<(FrameSize, InputFormat)>,
    pub processes: usize,
    pub readbacks: usize,
    pub input_textures: Vec<(TextureId, TextureKind)>,
    pub uploads: Vec<usize>,

    pub displays_created: usize,
    pub displays_live: usize,
    pub display_calls: Vec<DisplayCall>,

    pub contexts_created: usize,
    pub contexts_live: usize,
    pub context_setups: usize,
    pub surfaces: Vec<FrameSize>,
    pub activations: usize,
    pub shutdowns: usize,
}

pub type SharedLedger = Rc<RefCell<Ledger>>;

pub fn ledger() -> SharedLedger {
    Rc::new(RefCell::new(Ledger {
        output_divisor: 1,
        ..Ledger::default()
    }))
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct FakePipeline {
    ledger: SharedLedger,
    output_size: FrameSize,
    output_texture: TextureId,
    next_texture: TextureId,
}

impl FakePipeline {
    /// Value every output byte holds after the `n`-th readback.
    pub fn fill_value(readback: usize) -> u8 {
        (readback % 251) as u8
    }
}

impl Pipeline for FakePipeline {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn enable_platform_optimizations(&mut self) -> bool {
        self.ledger.borrow_mut().platform_optimizations += 1;
        true
    }

    fn init(&mut self) -> Result<()> {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.faults.pipeline_init {
            bail!("shader compilation failed");
        }
        ledger.pipeline_inits += 1;
        Ok(())
    }

    fn prepare(&mut self, size: FrameSize, format: InputFormat) -> Result<()> {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.faults.pipeline_prepare {
            bail!("framebuffer incomplete");
        }
        ledger.prepares.push((size, format));

        self.output_size = if ledger.faults.empty_output {
            FrameSize::ZERO
        } else {
            let divisor = ledger.output_divisor.max(1);
            FrameSize::new(size.width / divisor, size.height / divisor)
        };
        self.next_texture += 1;
        self.output_texture = self.next_texture;
        Ok(())
    }

    fn process(&mut self) {
        self.ledger.borrow_mut().processes += 1;
    }

    fn set_input_texture(&mut self, id: TextureId, kind: TextureKind) {
        self.ledger.borrow_mut().input_textures.push((id, kind));
    }

    fn set_input_data(&mut self, data: &[u8]) {
        self.ledger.borrow_mut().uploads.push(data.len());
    }

    fn read_output(&mut self, dst: &mut [u8]) {
        let mut ledger = self.ledger.borrow_mut();
        ledger.readbacks += 1;
        dst.fill(Self::fill_value(ledger.readbacks));
    }

    fn output_texture(&self) -> TextureId {
        self.output_texture
    }

    fn output_size(&self) -> FrameSize {
        self.output_size
    }

    fn time_measurements(&self) -> Vec<f64> {
        vec![0.5, 1.5]
    }
}

impl Drop for FakePipeline {
    fn drop(&mut self) {
        self.ledger.borrow_mut().pipelines_live -= 1;
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

pub struct FakeDisplay {
    ledger: SharedLedger,
}

impl Display for FakeDisplay {
    fn set_output_size(&mut self, size: FrameSize) {
        self.ledger
            .borrow_mut()
            .display_calls
            .push(DisplayCall::OutputSize(size));
    }

    fn set_output_orientation(&mut self, orientation: RenderOrientation) {
        self.ledger
            .borrow_mut()
            .display_calls
            .push(DisplayCall::Orientation(orientation));
    }

    fn use_texture(&mut self, id: TextureId, unit: u32, kind: TextureKind, size: FrameSize) {
        self.ledger
            .borrow_mut()
            .display_calls
            .push(DisplayCall::UseTexture(id, unit, kind, size));
    }

    fn render(&mut self) {
        self.ledger.borrow_mut().display_calls.push(DisplayCall::Render);
    }
}

impl Drop for FakeDisplay {
    fn drop(&mut self) {
        self.ledger.borrow_mut().displays_live -= 1;
    }
}

// ---------------------------------------------------------------------------
// GPU context
// ---------------------------------------------------------------------------

pub struct FakeContext {
    ledger: SharedLedger,
}

impl GpuContext for FakeContext {
    fn setup(&mut self) -> Result<()> {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.faults.context_setup {
            bail!("eglInitialize failed");
        }
        ledger.context_setups += 1;
        Ok(())
    }

    fn create_offscreen_surface(&mut self, size: FrameSize) -> Result<()> {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.faults.surface {
            bail!("eglCreatePbufferSurface failed");
        }
        ledger.surfaces.push(size);
        Ok(())
    }

    fn activate(&mut self) -> Result<()> {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.faults.activation {
            bail!("eglMakeCurrent failed");
        }
        ledger.activations += 1;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.ledger.borrow_mut().shutdowns += 1;
    }
}

impl Drop for FakeContext {
    fn drop(&mut self) {
        self.ledger.borrow_mut().contexts_live -= 1;
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

pub struct FakeBackend {
    ledger: SharedLedger,
}

impl FakeBackend {
    pub fn new(ledger: SharedLedger) -> Self {
        Self { ledger }
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new(ledger())
    }
}

impl Backend for FakeBackend {
    fn create_pipeline(&mut self) -> Box<dyn Pipeline> {
        let mut ledger = self.ledger.borrow_mut();
        ledger.pipelines_created += 1;
        ledger.pipelines_live += 1;
        Box::new(FakePipeline {
            ledger: self.ledger.clone(),
            output_size: FrameSize::ZERO,
            output_texture: 0,
            next_texture: 100,
        })
    }

    fn setup_pipeline(&mut self, pipeline: &mut dyn Pipeline) -> Result<()> {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.faults.pipeline_setup {
            bail!("unknown filter stage");
        }
        if pipeline.as_any_mut().downcast_mut::<FakePipeline>().is_none() {
            bail!("unexpected pipeline type");
        }
        ledger.setups_run += 1;
        Ok(())
    }

    fn create_display(&mut self, _pipeline: &mut dyn Pipeline) -> Result<Box<dyn Display>> {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.faults.display {
            bail!("no window surface");
        }
        ledger.displays_created += 1;
        ledger.displays_live += 1;
        Ok(Box::new(FakeDisplay {
            ledger: self.ledger.clone(),
        }))
    }

    fn create_gpu_context(&mut self) -> Box<dyn GpuContext> {
        let mut ledger = self.ledger.borrow_mut();
        ledger.contexts_created += 1;
        ledger.contexts_live += 1;
        Box::new(FakeContext {
            ledger: self.ledger.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Host memory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryStats {
    live: usize,
    allocations: usize,
    frees: usize,
    live_bytes: usize,
}

/// [`HostMemory`] that counts regions. Clones share their counters.
#[derive(Debug, Default, Clone)]
pub struct CountingMemory {
    stats: Rc<RefCell<MemoryStats>>,
}

impl CountingMemory {
    pub fn live(&self) -> usize {
        self.stats.borrow().live
    }

    pub fn allocations(&self) -> usize {
        self.stats.borrow().allocations
    }

    pub fn frees(&self) -> usize {
        self.stats.borrow().frees
    }

    pub fn live_bytes(&self) -> usize {
        self.stats.borrow().live_bytes
    }
}

impl HostMemory for CountingMemory {
    fn allocate(&mut self, len: usize) -> Box<[u8]> {
        let mut stats = self.stats.borrow_mut();
        stats.live += 1;
        stats.allocations += 1;
        stats.live_bytes += len;
        vec![0u8; len].into_boxed_slice()
    }

    fn free(&mut self, region: Box<[u8]>) {
        let mut stats = self.stats.borrow_mut();
        stats.live -= 1;
        stats.frees += 1;
        stats.live_bytes -= region.len();
    }
}
