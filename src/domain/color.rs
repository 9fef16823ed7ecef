//! sRGB colour values parsed from theme and content hex strings.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb`; the leading `#` is optional.
    pub fn parse_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            6 => {
                let channel =
                    |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
                Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
            }
            3 => {
                let channel = |index: usize| {
                    u8::from_str_radix(&hex[index..index + 1], 16)
                        .ok()
                        .map(|nibble| nibble * 17)
                };
                Some(Self::new(channel(0)?, channel(1)?, channel(2)?))
            }
            _ => None,
        }
    }

    /// Linear blend toward `target`: `c + (t - c) * factor`, rounded per channel.
    /// `factor` is clamped to `0.0..=1.0`.
    pub fn mix(self, target: Rgb, factor: f64) -> Rgb {
        let factor = if factor.is_nan() {
            0.0
        } else {
            factor.clamp(0.0, 1.0)
        };
        let blend = |from: u8, to: u8| {
            let from = f64::from(from);
            let mixed = from + (f64::from(to) - from) * factor;
            mixed.round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(
            blend(self.r, target.r),
            blend(self.g, target.g),
            blend(self.b, target.b),
        )
    }

    /// Blend toward white: `c + (255 - c) * factor`.
    pub fn lighten(self, factor: f64) -> Rgb {
        self.mix(Rgb::WHITE, factor)
    }

    /// Subtract `offset` from every channel, saturating at zero.
    pub fn darken_by(self, offset: u8) -> Rgb {
        Rgb::new(
            self.r.saturating_sub(offset),
            self.g.saturating_sub(offset),
            self.b.saturating_sub(offset),
        )
    }

    /// Comma-separated channels, the form theme CSS expects inside `rgba(...)`.
    pub fn channels(self) -> String {
        format!("{},{},{}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(Rgb::parse_hex("#6f6254"), Some(Rgb::new(111, 98, 84)));
        assert_eq!(Rgb::parse_hex("FFF"), Some(Rgb::WHITE));
        assert_eq!(Rgb::parse_hex("#12345"), None);
        assert_eq!(Rgb::parse_hex("#zzzzzz"), None);
        assert_eq!(Rgb::parse_hex(""), None);
    }

    #[test]
    fn displays_lowercase_hex() {
        assert_eq!(Rgb::new(226, 220, 13).to_string(), "#e2dc0d");
    }

    #[test]
    fn lighten_zero_is_identity_and_one_is_white() {
        let base = Rgb::new(111, 98, 84);
        assert_eq!(base.lighten(0.0), base);
        assert_eq!(base.lighten(1.0), Rgb::WHITE);
    }

    #[test]
    fn lighten_is_monotonic_per_channel() {
        let base = Rgb::new(10, 128, 250);
        let mut previous = base;
        for step in 1..=20 {
            let next = base.lighten(f64::from(step) / 20.0);
            assert!(next.r >= previous.r);
            assert!(next.g >= previous.g);
            assert!(next.b >= previous.b);
            previous = next;
        }
    }

    #[test]
    fn lighten_follows_mix_toward_white_formula() {
        // 111 + 144 * 0.85 = 233.4, 98 + 157 * 0.85 = 231.45, 84 + 171 * 0.85 = 229.35
        assert_eq!(Rgb::new(111, 98, 84).lighten(0.85), Rgb::new(233, 231, 229));
        // 111 + 144 * 0.30 = 154.2, 98 + 157 * 0.30 = 145.1, 84 + 171 * 0.30 = 135.3
        assert_eq!(Rgb::new(111, 98, 84).lighten(0.30), Rgb::new(154, 145, 135));
    }

    #[test]
    fn darken_saturates_at_zero() {
        assert_eq!(Rgb::new(20, 100, 255).darken_by(30), Rgb::new(0, 70, 225));
    }
}
