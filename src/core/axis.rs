//! Conversion from the right-handed, Y-up glTF frame to the right-handed, Z-up
//! frame of the host. The conversion is a +90° rotation about X and is fixed;
//! vertices and node transforms use the same mapping so both frames agree.

use crate::core::scene::{Quaterniond, Vector3d};

/// `(x, y, z) -> (x, -z, y)`
pub fn position_to_z_up(p: [f32; 3]) -> [f32; 3] {
    [p[0], -p[2], p[1]]
}

/// `(x, y, z) -> (x, z, y)`; scale factors are magnitudes, so no sign flip.
pub fn scale_to_z_up(s: [f32; 3]) -> [f32; 3] {
    [s[0], s[2], s[1]]
}

/// glTF stores `(x, y, z, w)`; the result is `(w, x, -z, y)` in w-first order.
pub fn rotation_to_z_up(q: [f32; 4]) -> Quaterniond {
    Quaterniond::new(q[3] as f64, q[0] as f64, -q[2] as f64, q[1] as f64)
}

pub fn translation_to_z_up(t: [f32; 3]) -> Vector3d {
    let [x, y, z] = position_to_z_up(t);
    Vector3d::new(x as f64, y as f64, z as f64)
}

/// Moves the texture origin from the top-left to the bottom-left corner.
pub fn flip_v(v: f32) -> f32 {
    1.0 - v
}

pub fn flip_uv(uv: [f32; 2]) -> [f32; 2] {
    [uv[0], flip_v(uv[1])]
}
