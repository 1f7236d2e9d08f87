//! glium-backed display for the og bridge.
//!
//! [`GliumDisplay`] implements [`og_core::Display`]: it draws the bound
//! texture as a fullscreen quad into the host's current surface, rotated by
//! the configured [`RenderOrientation`].
//!
//! ### Warning
//!
//! The display assumes the host keeps its GL context current on the calling
//! thread. It does not create or own a window.

use std::{fmt::Formatter, rc::Rc};

use anyhow::{anyhow, Result};
use glium::{
    backend::Context,
    index::{NoIndices, PrimitiveType},
    texture::{Dimensions, MipmapsOption, UncompressedFloatFormat},
    uniform,
    uniforms::MagnifySamplerFilter,
    DrawParameters, Frame, Program, Surface, Texture2d, VertexBuffer,
};
use og_core::{Display, FrameSize, RenderOrientation, TextureId, TextureKind};
use std::fmt::Debug;
use tracing::{debug, error, trace, warn};

mod gl_backend;
pub mod glsl;
pub mod quad;

use gl_backend::HostSurface;
use quad::{quad_vertices, QuadVertex};

#[derive(Debug, Clone, Copy)]
struct BoundTexture {
    id: TextureId,
    kind: TextureKind,
    size: FrameSize,
}

impl BoundTexture {
    fn dimensions(&self) -> Dimensions {
        Dimensions::Texture2d {
            width: self.size.width,
            height: self.size.height,
        }
    }
}

/// Presents a texture on the host's current surface.
pub struct GliumDisplay {
    ctx: Rc<Context>,
    surface: Rc<HostSurface>,
    program: Program,
    quad: VertexBuffer<QuadVertex>,
    orientation: RenderOrientation,
    output_size: FrameSize,
    texture: Option<BoundTexture>,
}

impl Debug for GliumDisplay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GliumDisplay")
            .field("orientation", &self.orientation)
            .field("output_size", &self.output_size)
            .field("texture", &self.texture)
            .finish()
    }
}

impl GliumDisplay {
    /// Create a display over the current host GL context.
    pub fn new(size: FrameSize) -> Result<Self> {
        let surface = Rc::new(HostSurface::new(size));

        let ctx = unsafe {
            Context::new(
                surface.clone(),
                false,
                glium::debug::DebugCallbackBehavior::Ignore,
            )
        }
        .map_err(|e| anyhow!("glium context creation failed: {e}"))?;

        debug!("OPENGL_VERSION {}", ctx.get_opengl_version_string());

        let version = glsl::best_glsl_version(&ctx)
            .ok_or_else(|| anyhow!("neither GLSL 1.40 nor 1.20 is supported"))?;
        let (vs, fs) = glsl::quad_shaders(version);
        let program = Program::from_source(&ctx, vs, fs, None)?;
        let quad = VertexBuffer::dynamic(&ctx, &quad_vertices(RenderOrientation::Deg0))?;

        debug!(?version, %size, "display created");

        Ok(Self {
            ctx,
            surface,
            program,
            quad,
            orientation: RenderOrientation::Deg0,
            output_size: size,
            texture: None,
        })
    }

    pub fn orientation(&self) -> RenderOrientation {
        self.orientation
    }

    pub fn output_size(&self) -> FrameSize {
        self.output_size
    }

    fn draw(&self, bound: BoundTexture) -> Result<()> {
        unsafe { self.ctx.rebuild(self.surface.clone()) }
            .map_err(|e| anyhow!("glium context rebuild failed: {e}"))?;

        let size = self.surface.size();
        let texture = unsafe {
            Texture2d::from_id(
                &self.ctx,
                UncompressedFloatFormat::U8U8U8U8,
                bound.id,
                false,
                MipmapsOption::NoMipmap,
                bound.dimensions(),
            )
        };

        let mut frame = Frame::new(self.ctx.clone(), (size.width, size.height));
        frame.clear_color(0.0, 0.0, 0.0, 1.0);

        let uniforms = uniform! {
            tex: texture.sampled().magnify_filter(MagnifySamplerFilter::Linear),
        };
        let drawn = frame.draw(
            &self.quad,
            NoIndices(PrimitiveType::TriangleStrip),
            &self.program,
            &uniforms,
            &DrawParameters::default(),
        );

        // A frame must be finished even when drawing failed.
        frame.finish()?;
        drawn?;

        trace!(texture = bound.id, kind = ?bound.kind, %size, "RENDERED");
        Ok(())
    }
}

impl Display for GliumDisplay {
    fn set_output_size(&mut self, size: FrameSize) {
        self.output_size = size;
        glium::backend::Backend::resize(&*self.surface, (size.width, size.height));
    }

    fn set_output_orientation(&mut self, orientation: RenderOrientation) {
        self.quad.write(&quad_vertices(orientation));
        self.orientation = orientation;
    }

    /// glium assigns sampler units on its own, so `unit` is not used.
    fn use_texture(&mut self, id: TextureId, _unit: u32, kind: TextureKind, size: FrameSize) {
        if kind == TextureKind::External {
            warn!(texture = id, "external textures are sampled as 2D textures");
        }
        debug!(texture = id, ?kind, %size, "display texture bound");
        self.texture = Some(BoundTexture { id, kind, size });
    }

    fn render(&mut self) {
        let Some(bound) = self.texture else {
            warn!("render called without a bound texture");
            return;
        };
        if let Err(err) = self.draw(bound) {
            error!("Render ERROR: {err:#}");
        }
    }
}
