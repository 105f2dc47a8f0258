/// Shell colors: random hue, full saturation, 60% lightness.
/// Converted to RGB only at render time; the sim works in HSL.

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Hsl {
    /// Hue in degrees, [0, 360).
    pub h: f32,
    /// Saturation, [0, 1].
    pub s: f32,
    /// Lightness, [0, 1].
    pub l: f32,
}

const SHELL_SATURATION: f32 = 1.0;
const SHELL_LIGHTNESS: f32 = 0.6;

impl Hsl {
    /// Random shell color: any hue, fixed saturation/lightness.
    pub fn shell(rng: &mut fastrand::Rng) -> Self {
        Hsl {
            h: rng.f32() * 360.0,
            s: SHELL_SATURATION,
            l: SHELL_LIGHTNESS,
        }
    }

    pub fn to_rgb(self) -> (u8, u8, u8) {
        let h = self.h.rem_euclid(360.0);
        let c = (1.0 - (2.0 * self.l - 1.0).abs()) * self.s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = self.l - c / 2.0;

        let (r, g, b) = match h as u32 {
            0..=59 => (c, x, 0.0),
            60..=119 => (x, c, 0.0),
            120..=179 => (0.0, c, x),
            180..=239 => (0.0, x, c),
            240..=299 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        (
            ((r + m) * 255.0) as u8,
            ((g + m) * 255.0) as u8,
            ((b + m) * 255.0) as u8,
        )
    }
}
