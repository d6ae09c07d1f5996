/// Sequential colour scales shared by the HTML and PNG maps.
///
/// Anchor colours are the nine-class ColorBrewer ramps, which are also what
/// Plotly's named `Reds`/`Greens`/`Blues` scales interpolate between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    Reds,
    Greens,
    Blues,
}

const REDS: [(u8, u8, u8); 9] = [
    (255, 245, 240),
    (254, 224, 210),
    (252, 187, 161),
    (252, 146, 114),
    (251, 106, 74),
    (239, 59, 44),
    (203, 24, 29),
    (165, 15, 21),
    (103, 0, 13),
];

const GREENS: [(u8, u8, u8); 9] = [
    (247, 252, 245),
    (229, 245, 224),
    (199, 233, 192),
    (161, 217, 155),
    (116, 196, 118),
    (65, 171, 93),
    (35, 139, 69),
    (0, 109, 44),
    (0, 68, 27),
];

const BLUES: [(u8, u8, u8); 9] = [
    (247, 251, 255),
    (222, 235, 247),
    (198, 219, 239),
    (158, 202, 225),
    (107, 174, 214),
    (66, 146, 198),
    (33, 113, 181),
    (8, 81, 156),
    (8, 48, 107),
];

/// Fill for areas with no data
pub const NO_DATA_RGB: (u8, u8, u8) = (217, 217, 217);

impl Colormap {
    fn anchors(&self) -> &'static [(u8, u8, u8); 9] {
        match self {
            Colormap::Reds => &REDS,
            Colormap::Greens => &GREENS,
            Colormap::Blues => &BLUES,
        }
    }

    /// Colour at position `t` in [0, 1]; out-of-range values are clamped
    pub fn sample(&self, t: f64) -> (u8, u8, u8) {
        let anchors = self.anchors();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let scaled = t * (anchors.len() - 1) as f64;
        let lower = scaled.floor() as usize;
        let upper = (lower + 1).min(anchors.len() - 1);
        let frac = scaled - lower as f64;

        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        let (r0, g0, b0) = anchors[lower];
        let (r1, g1, b1) = anchors[upper];
        (lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
    }

    pub fn sample_hex(&self, t: f64) -> String {
        to_hex(self.sample(t))
    }
}

pub fn to_hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Qualitative palette for discrete groups (regions, system types, technologies)
pub const QUALITATIVE: [&str; 10] = [
    "#636efa", "#ef553b", "#00cc96", "#ab63fa", "#ffa15a", "#19d3f3", "#ff6692", "#b6e880",
    "#ff97ff", "#fecb52",
];

pub fn qualitative(index: usize) -> &'static str {
    QUALITATIVE[index % QUALITATIVE.len()]
}
