//! Every visual constant of the card in one place.
//!
//! Lengths are design units of the 2243×341 intrinsic canvas. Line heights are
//! multiples of the font size, letter spacing is in ems.

/// Font family with the average advance used to estimate text width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    pub family: &'static str,
    pub weight: u16,
    /// Average glyph advance as a fraction of the font size.
    pub advance: f32,
}

impl Face {
    /// Estimated width of `text` at `size` with `spacing` ems between glyphs.
    pub fn measure(&self, text: &str, size: f32, spacing: f32) -> f32 {
        let n = text.chars().count() as f32;
        n * size * (self.advance + spacing)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardStyle {
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
    pub padding_x: f32,
    pub padding_y: f32,
    /// Share of the content width taken by the brand zone.
    pub left_ratio: f32,
    pub left_inset: f32,
    pub right_inset: f32,

    pub gradient: [(f32, &'static str); 3],
    pub border: &'static str,
    pub brand: &'static str,
    pub ink: &'static str,
    pub link: &'static str,
    pub cutout_fill: &'static str,
    pub cutout_diameter: f32,
    /// Fraction of the font size between a text box's top and its baseline
    /// for single-line text centred in its line box.
    pub cap_height: f32,

    pub logo_face: Face,
    pub text_face: Face,
    pub text_bold_face: Face,

    pub logo_top: f32,
    pub initial_size: f32,
    pub initial_line: f32,
    pub initial_spacing: f32,
    pub initial_gap: f32,
    pub suffix_size: f32,
    pub suffix_spacing: f32,
    pub suffix_nudge: f32,
    pub rest_size: f32,
    pub rest_line: f32,
    pub rest_overlap: f32,
    pub row_gap: f32,

    pub chevron_path: &'static str,
    pub chevron_width: f32,
    pub chevron_height: f32,
    pub chevron_margin_left: f32,
    pub chevron_margin_right: f32,
    pub chevron_lift: f32,

    pub star_points: &'static str,
    pub star_view: f32,
    pub star_size: f32,
    pub star_gap: f32,
    pub star_count: usize,
    pub star_stroke: f32,
    pub star_margin: f32,
    pub type_size: f32,
    pub type_line: f32,
    pub type_min_width: f32,
    pub type_drop: f32,

    pub slogan_size: f32,
    pub slogan_line: f32,
    pub slogan_gap: f32,
    pub slogan_inset: f32,

    pub body_size: f32,
    pub body_line: f32,
    pub label_size: f32,
    pub address_gap: f32,
    pub link_row_gap: f32,
    pub links_gap: f32,
    pub label_gap: f32,
    pub grid_row_gap: f32,
    pub grid_col_gap: f32,
    pub underline_offset: f32,
    pub underline_width: f32,
}

impl Default for CardStyle {
    fn default() -> Self {
        Self {
            width: 2243.0,
            height: 341.0,
            corner_radius: 30.0,
            padding_x: 16.0,
            padding_y: 8.0,
            left_ratio: 0.4,
            left_inset: 40.0,
            right_inset: 48.0,

            gradient: [(0.0, "#fff0e5"), (0.5, "#ffeadb"), (1.0, "#fa8072")],
            border: "#9ca3af",
            brand: "#ed1c24",
            ink: "#000000",
            link: "#2a3b90",
            cutout_fill: "#f3f4f6",
            cutout_diameter: 72.0,
            cap_height: 0.72,

            logo_face: Face {
                family: "Oswald, 'Arial Narrow', sans-serif",
                weight: 700,
                advance: 0.5,
            },
            text_face: Face {
                family: "'Roboto Condensed', 'Arial Narrow', sans-serif",
                weight: 400,
                advance: 0.42,
            },
            text_bold_face: Face {
                family: "'Roboto Condensed', 'Arial Narrow', sans-serif",
                weight: 700,
                advance: 0.45,
            },

            logo_top: 8.0,
            initial_size: 246.0,
            initial_line: 0.8,
            initial_spacing: -0.05,
            initial_gap: 20.0,
            suffix_size: 82.0,
            suffix_spacing: 0.08,
            suffix_nudge: 4.0,
            rest_size: 130.0,
            rest_line: 0.8,
            rest_overlap: 4.0,
            row_gap: 4.0,

            chevron_path: "M0 0 L70 0 L110 45 L150 0 L220 0 L140 65 L80 65 Z",
            chevron_width: 220.0,
            chevron_height: 65.0,
            chevron_margin_left: 24.0,
            chevron_margin_right: 16.0,
            chevron_lift: 12.0,

            star_points: "12 2 15.09 8.26 22 9.27 17 14.14 18.18 21.02 12 17.77 5.82 21.02 7 14.14 2 9.27 8.91 8.26 12 2",
            star_view: 24.0,
            star_size: 28.0,
            star_gap: 4.0,
            star_count: 5,
            star_stroke: 2.5,
            star_margin: 4.0,
            type_size: 73.0,
            type_line: 0.75,
            type_min_width: 120.0,
            type_drop: 4.0,

            slogan_size: 43.0,
            slogan_line: 1.25,
            slogan_gap: 20.0,
            slogan_inset: 4.0,

            body_size: 34.0,
            body_line: 1.375,
            label_size: 36.0,
            address_gap: 8.0,
            link_row_gap: 4.0,
            links_gap: 12.0,
            label_gap: 12.0,
            grid_row_gap: 4.0,
            grid_col_gap: 12.0,
            underline_offset: 4.0,
            underline_width: 2.0,
        }
    }
}

impl CardStyle {
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.padding_x
    }

    pub fn content_height(&self) -> f32 {
        self.height - 2.0 * self.padding_y
    }

    /// Baseline of one line of `size` text whose line box starts at `top`.
    pub fn baseline(&self, top: f32, size: f32, line: f32) -> f32 {
        top + (size * line) / 2.0 + (size * self.cap_height) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zones_split_forty_sixty() {
        let s = CardStyle::default();
        let left = s.content_width() * s.left_ratio;
        let right = s.content_width() - left;
        assert!((left / (left + right) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn measure_scales_with_length() {
        let face = CardStyle::default().text_face;
        assert_eq!(face.measure("", 34.0, 0.0), 0.0);
        let one = face.measure("a", 34.0, 0.0);
        assert!((face.measure("abcd", 34.0, 0.0) - 4.0 * one).abs() < 1e-3);
        assert!((face.measure("Пламен", 34.0, 0.0) - 6.0 * one).abs() < 1e-3);
    }
}
