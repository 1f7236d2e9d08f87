//! GLSL version detection and the display's quad shaders.

use glium::CapabilitiesSource;

/// Supported GLSL targets for the display program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlslVersion {
    Glsl120,
    Glsl140,
}

/// Pick the best GLSL version for the given capabilities.
///
/// Returns `Glsl140` if supported, otherwise `Glsl120`, or `None` if neither
/// is available.
pub fn best_glsl_version(ctx: &impl CapabilitiesSource) -> Option<GlslVersion> {
    let glsl_versions = &ctx.get_capabilities().supported_glsl_versions;

    if glsl_versions
        .iter()
        .any(|v| matches!(v, glium::Version(glium::Api::Gl, 1, 4)))
    {
        Some(GlslVersion::Glsl140)
    } else if glsl_versions
        .iter()
        .any(|v| matches!(v, glium::Version(glium::Api::Gl, 1, 2)))
    {
        Some(GlslVersion::Glsl120)
    } else {
        None
    }
}

const QUAD_VS_140: &str = r#"#version 140
in vec2 position;
in vec2 tex_coords;
out vec2 v_tex_coords;
void main() {
    v_tex_coords = tex_coords;
    gl_Position = vec4(position, 0.0, 1.0);
}
"#;

const QUAD_FS_140: &str = r#"#version 140
in vec2 v_tex_coords;
out vec4 color;
uniform sampler2D tex;
void main() {
    color = texture(tex, v_tex_coords);
}
"#;

const QUAD_VS_120: &str = r#"#version 120
attribute vec2 position;
attribute vec2 tex_coords;
varying vec2 v_tex_coords;
void main() {
    v_tex_coords = tex_coords;
    gl_Position = vec4(position, 0.0, 1.0);
}
"#;

const QUAD_FS_120: &str = r#"#version 120
varying vec2 v_tex_coords;
uniform sampler2D tex;
void main() {
    gl_FragColor = texture2D(tex, v_tex_coords);
}
"#;

/// Vertex and fragment source of the textured-quad program.
pub fn quad_shaders(version: GlslVersion) -> (&'static str, &'static str) {
    match version {
        GlslVersion::Glsl140 => (QUAD_VS_140, QUAD_FS_140),
        GlslVersion::Glsl120 => (QUAD_VS_120, QUAD_FS_120),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shaders_declare_their_version() {
        let (vs, fs) = quad_shaders(GlslVersion::Glsl140);
        assert!(vs.starts_with("#version 140"));
        assert!(fs.starts_with("#version 140"));

        let (vs, fs) = quad_shaders(GlslVersion::Glsl120);
        assert!(vs.starts_with("#version 120"));
        assert!(fs.contains("gl_FragColor"));
    }
}
