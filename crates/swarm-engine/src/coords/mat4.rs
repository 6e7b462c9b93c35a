use bytemuck::{Pod, Zeroable};

/// Column-major 4x4 matrix, laid out as WGSL `mat4x4<f32>` expects.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Right-handed orthographic projection onto wgpu clip space (depth in `[0, 1]`).
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let rcp_width = 1.0 / (right - left);
        let rcp_height = 1.0 / (top - bottom);
        let r = 1.0 / (near - far);

        Mat4 {
            cols: [
                [2.0 * rcp_width, 0.0, 0.0, 0.0],
                [0.0, 2.0 * rcp_height, 0.0, 0.0],
                [0.0, 0.0, r, 0.0],
                [
                    -(left + right) * rcp_width,
                    -(top + bottom) * rcp_height,
                    r * near,
                    1.0,
                ],
            ],
        }
    }

    /// Applies the matrix to the point `(x, y, z, 1)` and returns `xyz / w`.
    pub fn transform_point(&self, p: [f32; 3]) -> [f32; 3] {
        let c = &self.cols;
        let mut out = [0.0f32; 4];
        for (row, v) in out.iter_mut().enumerate() {
            *v = c[0][row] * p[0] + c[1][row] * p[1] + c[2][row] * p[2] + c[3][row];
        }
        [out[0] / out[3], out[1] / out[3], out[2] / out[3]]
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}
