use glam::Vec4;

pub const OBSTACLE_COLOR: Vec4 = Vec4::new(0.4006, 0.3210, 0.2784, 1.0);
pub const BACKGROUND_COLOR: Vec4 = Vec4::ZERO;
pub const SHALLOW_COLOR: Vec4 = Vec4::new(0.3310, 0.3381, 0.3310, 1.0);
pub const MEDIUM_COLOR: Vec4 = Vec4::new(0.3169, 0.3642, 0.3189, 1.0);
pub const DEEP_COLOR: Vec4 = Vec4::new(0.3091, 0.3758, 0.3152, 1.0);

pub const SHALLOW_THRESHOLD: f32 = 2.0;
pub const MEDIUM_THRESHOLD: f32 = 10.0;
/// Density range over which the deep color fades in past [`MEDIUM_THRESHOLD`].
pub const DEEP_RANGE: f32 = 20.0;

/// Maps a cell to its RGBA color.
///
/// Negative densities are treated as empty. Thin water eases in from the transparent background
/// along `1 - (1 - d / 2)^2`, then blends linearly through the deeper tones.
pub fn shade(density: f32, in_obstacle: bool) -> Vec4 {
    if in_obstacle {
        return OBSTACLE_COLOR;
    }

    let density = density.max(0.0);

    if density <= 0.0 {
        return BACKGROUND_COLOR;
    }

    if density <= SHALLOW_THRESHOLD {
        let t = 1.0 - (1.0 - density / SHALLOW_THRESHOLD).powi(2);
        return BACKGROUND_COLOR.lerp(SHALLOW_COLOR, t);
    }

    if density <= MEDIUM_THRESHOLD {
        let t = (density - SHALLOW_THRESHOLD) / (MEDIUM_THRESHOLD - SHALLOW_THRESHOLD);
        return SHALLOW_COLOR.lerp(MEDIUM_COLOR, t);
    }

    let t = ((density - MEDIUM_THRESHOLD) / DEEP_RANGE).min(1.0);
    MEDIUM_COLOR.lerp(DEEP_COLOR, t)
}

/// Quantizes a color to 8 bits per channel.
pub fn to_rgba8(color: Vec4) -> [u8; 4] {
    let c = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8, c.w as u8]
}
