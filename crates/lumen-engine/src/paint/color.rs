use std::fmt;

/// Straight-alpha RGBA color with normalized `f32` channels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const CYAN: Color = Color::rgb(0.0, 1.0, 1.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const MAGENTA: Color = Color::rgb(1.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from normalized RGB channels.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Creates a color from byte channels (`0`–`255`), dividing each by 255.
    #[inline]
    pub fn from_bytes([r, g, b, a]: [u8; 4]) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Converts back to byte channels, flooring `v * 255` after clamping.
    #[inline]
    pub fn to_bytes(self) -> [u8; 4] {
        [
            channel_to_byte(self.r),
            channel_to_byte(self.g),
            channel_to_byte(self.b),
            channel_to_byte(self.a),
        ]
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// `#rrggbb` form; alpha is dropped.
    pub fn to_rgb_hex(self) -> String {
        format!(
            "#{}{}{}",
            channel_to_hex(self.r),
            channel_to_hex(self.g),
            channel_to_hex(self.b)
        )
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }
}

impl From<Color> for wgpu::Color {
    fn from(c: Color) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: c.a as f64,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rgb_hex())
    }
}

#[inline]
fn channel_to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).floor() as u8
}

/// Formats one normalized channel as two lowercase hex digits.
pub fn channel_to_hex(v: f32) -> String {
    format!("{:02x}", channel_to_byte(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── hex ───────────────────────────────────────────────────────────────

    #[test]
    fn named_colors_format_as_hex() {
        assert_eq!(Color::BLACK.to_rgb_hex(), "#000000");
        assert_eq!(Color::YELLOW.to_rgb_hex(), "#ffff00");
        assert_eq!(Color::MAGENTA.to_rgb_hex(), "#ff00ff");
    }

    #[test]
    fn channel_hex_floors_and_pads() {
        assert_eq!(channel_to_hex(0.0), "00");
        // 0.5 * 255 = 127.5 → 127 = 0x7f
        assert_eq!(channel_to_hex(0.5), "7f");
        assert_eq!(channel_to_hex(0.01), "02");
    }

    #[test]
    fn out_of_range_channels_are_clamped() {
        assert_eq!(channel_to_hex(1.5), "ff");
        assert_eq!(channel_to_hex(-0.2), "00");
    }

    // ── byte conversion ───────────────────────────────────────────────────

    #[test]
    fn from_bytes_normalizes() {
        let c = Color::from_bytes([255, 0, 51, 255]);
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 0.2).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn to_bytes_denormalizes() {
        assert_eq!(Color::CYAN.to_bytes(), [0, 255, 255, 255]);
    }

    #[test]
    fn display_matches_hex() {
        assert_eq!(Color::RED.to_string(), "#ff0000");
    }
}
