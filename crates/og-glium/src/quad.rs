//! Fullscreen quad with orientation-dependent texture coordinates.

use og_core::RenderOrientation;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

glium::implement_vertex!(QuadVertex, position, tex_coords);

// Corners in clockwise order starting top-left.
const SCREEN_CORNERS: [[f32; 2]; 4] = [[-1.0, 1.0], [1.0, 1.0], [1.0, -1.0], [-1.0, -1.0]];
// The top row of a frame lives at t = 0.
const TEXTURE_CORNERS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Triangle-strip vertices (bottom-left, bottom-right, top-left, top-right)
/// presenting the texture rotated clockwise by `orientation`.
pub fn quad_vertices(orientation: RenderOrientation) -> [QuadVertex; 4] {
    let turns = (orientation.degrees() / 90) as usize;
    let corner = |i: usize| QuadVertex {
        position: SCREEN_CORNERS[i],
        tex_coords: TEXTURE_CORNERS[(i + 4 - turns) % 4],
    };
    [corner(3), corner(2), corner(0), corner(1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tex_at(vertices: &[QuadVertex; 4], position: [f32; 2]) -> [f32; 2] {
        vertices
            .iter()
            .find(|v| v.position == position)
            .map(|v| v.tex_coords)
            .expect("corner present")
    }

    #[test]
    fn upright_quad_maps_top_row_to_top_of_screen() {
        let v = quad_vertices(RenderOrientation::Deg0);
        assert_eq!(tex_at(&v, [-1.0, 1.0]), [0.0, 0.0]);
        assert_eq!(tex_at(&v, [1.0, -1.0]), [1.0, 1.0]);
    }

    #[test]
    fn quarter_turn_moves_top_left_to_top_right() {
        let v = quad_vertices(RenderOrientation::Deg90);
        assert_eq!(tex_at(&v, [1.0, 1.0]), [0.0, 0.0]);
        assert_eq!(tex_at(&v, [-1.0, 1.0]), [0.0, 1.0]);
    }

    #[test]
    fn half_turn_swaps_opposite_corners() {
        let v = quad_vertices(RenderOrientation::Deg180);
        assert_eq!(tex_at(&v, [-1.0, 1.0]), [1.0, 1.0]);
        assert_eq!(tex_at(&v, [1.0, -1.0]), [0.0, 0.0]);
    }

    #[test]
    fn strip_order_is_stable() {
        let v = quad_vertices(RenderOrientation::Deg270);
        let positions: Vec<_> = v.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]]
        );
    }
}
