//! The lifecycle controller: one pipeline session, its GPU context, optional
//! display and output buffer.
//!
//! Call grammar:
//!
//! ```text
//! init -> prepare (-> prepare ...) -> { set_input_*, process,
//!         get_output_pixels, set_render_disp*, render_output }* -> cleanup
//! ```
//!
//! Calls outside this grammar are contract violations and panic. Resource
//! failures (context, surface, pipeline, display) are logged and returned as
//! a [`BridgeError`]. They leave the controller as it was before the call,
//! except when `prepare` already re-sized the pipeline (see
//! [`Controller::prepare`]).

use og_core::{
    Backend, Display, FrameSize, InputFormat, Pipeline, RenderOrientation, ShowMode, TextureId,
    TextureKind,
};
use tracing::{debug, error, info, warn};

use crate::buffer::{HeapMemory, HostMemory, OutputBufferManager, OutputView};
use crate::bytes::pixels_as_bytes;
use crate::context::GpuContextState;
use crate::error::{BridgeError, Result};

/// Texture unit the display samples from.
const DISPLAY_TEXTURE_UNIT: u32 = 1;

/// What `init` should set up besides the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitOptions {
    /// Ask the pipeline to enable platform-specific fast paths.
    pub platform_optimizations: bool,
    /// Create and own an offscreen GPU context.
    pub setup_gpu_context: bool,
    /// Create an on-screen display.
    pub create_display: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Prepared,
}

/// Input and output texture names. `0` means unbound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureBinding {
    pub input: TextureId,
    pub output: TextureId,
}

enum RenderTarget {
    Headless,
    Display(Box<dyn Display>),
}

#[derive(Debug, Clone, Copy)]
struct PreparedFrame {
    input: FrameSize,
    format: InputFormat,
}

/// Everything that exists between `init` and `cleanup`.
struct Session {
    pipeline: Box<dyn Pipeline>,
    render: RenderTarget,
    gpu: GpuContextState,
    pipeline_initialized: bool,
    prepared: Option<PreparedFrame>,
    textures: TextureBinding,
}

impl Session {
    fn display_mut(&mut self, op: &str) -> &mut dyn Display {
        match &mut self.render {
            RenderTarget::Display(display) => display.as_mut(),
            RenderTarget::Headless => panic!("{op} requires a display, but init did not create one"),
        }
    }

    fn assert_prepared(&self, op: &str) {
        assert!(self.prepared.is_some(), "{op} called before prepare");
    }
}

fn session_mut<'a>(session: &'a mut Option<Session>, op: &str) -> &'a mut Session {
    let Some(session) = session.as_mut() else {
        panic!("{op} called before init");
    };
    session.gpu.assert_thread(op);
    session
}

fn prepared_mut<'a>(session: &'a mut Option<Session>, op: &str) -> &'a mut Session {
    let session = session_mut(session, op);
    session.assert_prepared(op);
    session
}

fn log_abort(op: &str, err: &BridgeError) {
    error!("{op} aborted: {}", err.report());
}

/// Owns the pipeline session and mediates every call into it.
///
/// One controller is one "process-wide" pipeline: it holds at most one
/// pipeline, one display, one GPU context and one output buffer. The
/// controller is not `Send`; GPU work stays on the thread that drives it.
pub struct Controller {
    backend: Box<dyn Backend>,
    session: Option<Session>,
    output: OutputBufferManager,
    frame_size: FrameSize,
}

impl Controller {
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self::with_memory(backend, Box::new(HeapMemory))
    }

    /// Use `memory` for output buffer allocations.
    pub fn with_memory(backend: Box<dyn Backend>, memory: Box<dyn HostMemory>) -> Self {
        Self {
            backend,
            session: None,
            output: OutputBufferManager::new(memory),
            frame_size: FrameSize::ZERO,
        }
    }

    pub fn state(&self) -> LifecycleState {
        match &self.session {
            None => LifecycleState::Uninitialized,
            Some(session) if session.prepared.is_some() => LifecycleState::Prepared,
            Some(_) => LifecycleState::Initialized,
        }
    }

    pub fn has_display(&self) -> bool {
        matches!(
            self.session.as_ref().map(|s| &s.render),
            Some(RenderTarget::Display(_))
        )
    }

    pub fn has_gpu_context(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.gpu.is_absent())
    }

    /// Size of the offscreen surface, once the GPU context is active.
    pub fn surface_size(&self) -> Option<FrameSize> {
        self.session.as_ref().and_then(|s| s.gpu.surface())
    }

    pub fn texture_binding(&self) -> TextureBinding {
        self.session
            .as_ref()
            .map_or_else(TextureBinding::default, |s| s.textures)
    }

    // -----------------------------------------------------------------------
    // init / cleanup
    // -----------------------------------------------------------------------

    /// Create the pipeline, build its graph and optionally the display and
    /// GPU context.
    ///
    /// # Panics
    ///
    /// If the controller is already initialized.
    pub fn init(&mut self, options: InitOptions) -> Result<()> {
        assert!(self.session.is_none(), "init called twice without cleanup");
        self.try_init(options)
            .inspect_err(|err| log_abort("init", err))
    }

    fn try_init(&mut self, options: InitOptions) -> Result<()> {
        info!(?options, "creating pipeline instance");
        let mut pipeline = self.backend.create_pipeline();

        if options.platform_optimizations && !pipeline.enable_platform_optimizations() {
            warn!("platform optimizations are not available");
        }

        self.backend
            .setup_pipeline(pipeline.as_mut())
            .map_err(BridgeError::PipelineSetup)?;

        let render = if options.create_display {
            let display = self
                .backend
                .create_display(pipeline.as_mut())
                .map_err(BridgeError::Display)?;
            RenderTarget::Display(display)
        } else {
            RenderTarget::Headless
        };

        let gpu = if options.setup_gpu_context {
            GpuContextState::create(self.backend.create_gpu_context())?
        } else {
            GpuContextState::Absent
        };

        self.session = Some(Session {
            pipeline,
            render,
            gpu,
            pipeline_initialized: false,
            prepared: None,
            textures: TextureBinding::default(),
        });
        Ok(())
    }

    /// Tear down the session: display, pipeline, output buffer and GPU
    /// context, in that order. Every view handed out becomes stale.
    ///
    /// # Panics
    ///
    /// If the controller is not initialized, or when called on a thread other
    /// than the one the GPU context is active on.
    pub fn cleanup(&mut self) {
        session_mut(&mut self.session, "cleanup");
        if let Some(session) = self.session.take() {
            self.teardown(session);
        }
    }

    fn teardown(&mut self, session: Session) {
        info!("destroying pipeline instance");
        let Session {
            pipeline,
            render,
            gpu,
            ..
        } = session;

        drop(render);
        drop(pipeline);
        self.output.release();
        gpu.shutdown();
        self.frame_size = FrameSize::ZERO;
    }

    // -----------------------------------------------------------------------
    // prepare
    // -----------------------------------------------------------------------

    /// Size the pipeline for `width` x `height` input frames and allocate a
    /// matching output buffer.
    ///
    /// When the GPU context is owned, a surface of the same size is created
    /// and the context is activated on the calling thread first. The pipeline
    /// is initialized on the first prepare of a session only.
    ///
    /// If the call fails before the pipeline is re-prepared, nothing the
    /// controller records changes: frame size, output buffer, views and
    /// texture binding all keep their previous values. If the pipeline was
    /// re-prepared but no output buffer fits its new output size, the
    /// previous frame is gone with it: the controller drops back to
    /// [`LifecycleState::Initialized`] with no output buffer and an unbound
    /// output texture.
    ///
    /// # Panics
    ///
    /// If the controller is not initialized.
    pub fn prepare(&mut self, width: i32, height: i32, prepare_input: bool) -> Result<()> {
        self.try_prepare(width, height, prepare_input)
            .inspect_err(|err| log_abort("prepare", err))
    }

    fn try_prepare(&mut self, width: i32, height: i32, prepare_input: bool) -> Result<()> {
        let session = session_mut(&mut self.session, "prepare");
        let size = FrameSize::from_host(width, height).ok_or(BridgeError::InvalidDimensions {
            width: width.into(),
            height: height.into(),
        })?;

        session.gpu.prepare_surface(size)?;

        if !session.pipeline_initialized {
            session.pipeline.init().map_err(BridgeError::PipelineInit)?;
            session.pipeline_initialized = true;
            debug!("pipeline initialized");
        }

        let format = InputFormat::from_prepare_input(prepare_input);
        session
            .pipeline
            .prepare(size, format)
            .map_err(|source| BridgeError::PipelinePrepare { size, source })?;

        // From here on the pipeline no longer matches the previous frame.
        let output_size = session.pipeline.output_size();
        if let Err(err) = self.output.reallocate(output_size) {
            session.prepared = None;
            session.textures.output = 0;
            self.output.release();
            self.frame_size = FrameSize::ZERO;
            return Err(err);
        }

        session.textures.output = session.pipeline.output_texture();
        session.prepared = Some(PreparedFrame {
            input: size,
            format,
        });
        self.frame_size = output_size;

        info!(
            "preparation successful. input size is {size}, output size is {output_size}"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // display
    // -----------------------------------------------------------------------

    /// Configure the display surface.
    ///
    /// # Panics
    ///
    /// Before prepare, or without a display.
    pub fn set_render_disp(
        &mut self,
        width: i32,
        height: i32,
        orientation: RenderOrientation,
    ) -> Result<()> {
        let session = prepared_mut(&mut self.session, "set_render_disp");
        let display = session.display_mut("set_render_disp");

        let Some(size) = FrameSize::from_host(width, height) else {
            let err = BridgeError::InvalidDimensions {
                width: width.into(),
                height: height.into(),
            };
            log_abort("set_render_disp", &err);
            return Err(err);
        };

        display.set_output_size(size);
        display.set_output_orientation(orientation);
        Ok(())
    }

    /// Choose whether the display presents the input or the output texture.
    ///
    /// # Panics
    ///
    /// Before prepare, without a display, or while either texture is unbound.
    pub fn set_render_disp_show_mode(&mut self, mode: ShowMode) {
        let session = prepared_mut(&mut self.session, "set_render_disp_show_mode");
        let TextureBinding { input, output } = session.textures;
        assert!(input > 0, "set_render_disp_show_mode: input texture is unbound");
        assert!(output > 0, "set_render_disp_show_mode: output texture is unbound");
        let input_size = session.prepared.map_or(FrameSize::ZERO, |p| p.input);
        let output_size = self.frame_size;

        let display = session.display_mut("set_render_disp_show_mode");
        match mode {
            ShowMode::Input => display.use_texture(
                input,
                DISPLAY_TEXTURE_UNIT,
                TextureKind::External,
                input_size,
            ),
            ShowMode::Output => display.use_texture(
                output,
                DISPLAY_TEXTURE_UNIT,
                TextureKind::Texture2d,
                output_size,
            ),
        }
    }

    /// Draw the selected texture on the display.
    ///
    /// # Panics
    ///
    /// Before prepare, or without a display.
    pub fn render_output(&mut self) {
        let session = prepared_mut(&mut self.session, "render_output");
        session.display_mut("render_output").render();
    }

    // -----------------------------------------------------------------------
    // input
    // -----------------------------------------------------------------------

    /// Use the external (camera/stream) texture `id` as the frame source.
    ///
    /// # Panics
    ///
    /// If the controller is not initialized.
    pub fn set_input_texture(&mut self, id: TextureId) {
        let session = session_mut(&mut self.session, "set_input_texture");
        session.pipeline.set_input_texture(id, TextureKind::External);
        session.textures.input = id;
    }

    /// Upload packed RGBA8 host pixels as the frame source.
    ///
    /// After prepare the array must hold exactly `width * height` pixels of
    /// the prepared input size.
    ///
    /// # Panics
    ///
    /// If the controller is not initialized.
    pub fn set_input_pixels(&mut self, pixels: &[i32]) -> Result<()> {
        let session = session_mut(&mut self.session, "set_input_pixels");

        if let Some(prepared) = session.prepared {
            if prepared.format != InputFormat::Rgba {
                warn!("set_input_pixels called, but prepare did not request pixel input");
            }
            let expected = prepared.input.pixel_count().unwrap_or(usize::MAX);
            if pixels.len() != expected {
                let err = BridgeError::InputSize {
                    expected,
                    actual: pixels.len(),
                };
                log_abort("set_input_pixels", &err);
                return Err(err);
            }
        }

        session.pipeline.set_input_data(pixels_as_bytes(pixels));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // processing and output
    // -----------------------------------------------------------------------

    /// Run one pipeline pass. Blocks until the GPU is done.
    ///
    /// # Panics
    ///
    /// Before prepare.
    pub fn process(&mut self) {
        prepared_mut(&mut self.session, "process").pipeline.process();
    }

    /// Read the output frame into the output buffer and return its view.
    ///
    /// # Panics
    ///
    /// Before prepare.
    pub fn get_output_pixels(&mut self) -> OutputView {
        let session = prepared_mut(&mut self.session, "get_output_pixels");
        let view = self.output.current_view();
        let (Some(view), Some(data)) = (view, self.output.data_mut()) else {
            unreachable!("a prepared session always owns an output buffer");
        };
        session.pipeline.read_output(data);
        view
    }

    /// Bytes behind `view` (RGBA8, row-major, top row first), while it is
    /// still live.
    pub fn output_pixels(&self, view: &OutputView) -> Result<&[u8]> {
        self.output.bytes(view)
    }

    /// Register a caller-held view of the output buffer. The registration
    /// ends with [`release_output_view`](Self::release_output_view) or, at the
    /// latest, at the next prepare or cleanup.
    pub fn acquire_output_view(&mut self) -> Option<OutputView> {
        self.output.acquire_view()
    }

    pub fn release_output_view(&mut self, view: OutputView) -> bool {
        self.output.release_view(view)
    }

    pub(crate) fn output_buffers(&mut self) -> &mut OutputBufferManager {
        &mut self.output
    }

    pub fn output_view(&self) -> Option<OutputView> {
        self.output.current_view()
    }

    pub fn is_view_valid(&self, view: &OutputView) -> bool {
        self.output.is_valid(view)
    }

    /// Output size of the last successful prepare; zero before that and
    /// after cleanup.
    pub fn output_frame_size(&self) -> FrameSize {
        self.frame_size
    }

    pub fn output_frame_w(&self) -> i32 {
        self.frame_size.to_host().0
    }

    pub fn output_frame_h(&self) -> i32 {
        self.frame_size.to_host().1
    }

    /// Per-stage pipeline timings. `None` unless built with the `benchmark`
    /// feature.
    pub fn time_measurements(&self) -> Option<Vec<f64>> {
        #[cfg(feature = "benchmark")]
        {
            Some(
                self.session
                    .as_ref()
                    .map(|s| s.pipeline.time_measurements())
                    .unwrap_or_default(),
            )
        }

        #[cfg(not(feature = "benchmark"))]
        {
            None
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            warn!("controller dropped without cleanup; tearing down");
            self.teardown(session);
        }
    }
}
