//! Row colours: RGBA with unit-range channels, blending, and terminal conversion.

use ratatui::style::Color;

/// RGBA colour, each channel in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const ORANGE: Self = Self::rgb(1.0, 0.5, 0.0);
    pub const YELLOW: Self = Self::rgb(1.0, 1.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    pub const PURPLE: Self = Self::rgb(0.5, 0.0, 0.5);

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Build from channels, clamping each into range.
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: a.clamp(0.0, 1.0),
        }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
        )
    }

    /// Composite over an opaque background with an extra opacity factor (row alpha).
    /// Terminals have no alpha channel, so fading is done by mixing toward `bg`.
    pub fn over(self, bg: Self, opacity: f64) -> Self {
        let k = (self.a * opacity).clamp(0.0, 1.0);
        let mix = |fg: f64, bg: f64| fg * k + bg * (1.0 - k);
        Self::rgb(mix(self.r, bg.r), mix(self.g, bg.g), mix(self.b, bg.b))
    }

    fn channel8(v: f64) -> u8 {
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

impl From<Rgba> for Color {
    fn from(c: Rgba) -> Self {
        Self::Rgb(
            Rgba::channel8(c.r),
            Rgba::channel8(c.g),
            Rgba::channel8(c.b),
        )
    }
}

/// Per-channel arithmetic mean, alpha included.
pub fn average_color(a: Rgba, b: Rgba) -> Rgba {
    Rgba {
        r: (a.r + b.r) / 2.0,
        g: (a.g + b.g) / 2.0,
        b: (a.b + b.b) / 2.0,
        a: (a.a + b.a) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unit_color() -> impl Strategy<Value = Rgba> {
        (0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64)
            .prop_map(|(r, g, b, a)| Rgba { r, g, b, a })
    }

    fn in_range(c: Rgba) -> bool {
        [c.r, c.g, c.b, c.a].iter().all(|v| (0.0..=1.0).contains(v))
    }

    #[test]
    fn red_and_orange_average() {
        let c = average_color(Rgba::RED, Rgba::ORANGE);
        assert_eq!(c, Rgba::rgb(1.0, 0.25, 0.0));
    }

    #[test]
    fn alpha_is_averaged_too() {
        let clear = Rgba::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(average_color(clear, Rgba::WHITE).a, 0.5);
    }

    #[test]
    fn over_with_zero_opacity_is_background() {
        let bg = Rgba::from_rgb8(0x31, 0x35, 0x3F);
        assert_eq!(Rgba::RED.over(bg, 0.0), bg);
    }

    #[test]
    fn converts_to_terminal_rgb() {
        assert_eq!(Color::from(Rgba::ORANGE), Color::Rgb(255, 128, 0));
    }

    proptest! {
        #[test]
        fn average_is_commutative(a in unit_color(), b in unit_color()) {
            prop_assert_eq!(average_color(a, b), average_color(b, a));
        }

        #[test]
        fn average_of_self_is_self(a in unit_color()) {
            let c = average_color(a, a);
            prop_assert!((c.r - a.r).abs() < 1e-12);
            prop_assert!((c.g - a.g).abs() < 1e-12);
            prop_assert!((c.b - a.b).abs() < 1e-12);
            prop_assert!((c.a - a.a).abs() < 1e-12);
        }

        #[test]
        fn average_stays_in_range(a in unit_color(), b in unit_color()) {
            prop_assert!(in_range(average_color(a, b)));
        }
    }
}
