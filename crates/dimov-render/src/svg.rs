use std::fmt::Write as _;

use crate::layout::{Anchor, Primitive, Scene, TextRun};

const GRADIENT_ID: &str = "card-bg";

/// Serialize `scene` as a standalone SVG document.
///
/// The viewBox is always the intrinsic canvas; `scale` only sets the outer
/// width and height, so the whole card scales uniformly.
pub fn to_svg(scene: &Scene, scale: f64) -> String {
    let mut out = String::with_capacity(8192);
    let w = scene.width as f64 * scale;
    let h = scene.height as f64 * scale;

    let _ = write!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">\n",
        num64(w),
        num64(h),
        num(scene.width),
        num(scene.height)
    );

    for item in &scene.items {
        write_primitive(&mut out, item);
    }

    out.push_str("</svg>\n");
    out
}

fn write_primitive(out: &mut String, item: &Primitive) {
    match item {
        Primitive::Card {
            width,
            height,
            radius,
            stops,
            border,
        } => {
            let _ = write!(
                out,
                "<defs><linearGradient id=\"{}\" x1=\"0\" y1=\"0\" x2=\"0\" y2=\"1\">",
                GRADIENT_ID
            );
            for (offset, color) in stops {
                let _ = write!(out, "<stop offset=\"{}\" stop-color=\"{}\"/>", num(*offset), color);
            }
            out.push_str("</linearGradient></defs>\n");
            // Inset by half the stroke so the 1-unit border stays on canvas.
            let _ = write!(
                out,
                "<rect x=\"0.5\" y=\"0.5\" width=\"{}\" height=\"{}\" rx=\"{}\" fill=\"url(#{})\" stroke=\"{}\" stroke-width=\"1\"/>\n",
                num(width - 1.0),
                num(height - 1.0),
                num(*radius),
                GRADIENT_ID,
                border
            );
        }
        Primitive::Text(run) => write_text(out, run),
        Primitive::Path { x, y, d, fill } => {
            let _ = write!(
                out,
                "<path transform=\"translate({} {})\" d=\"{}\" fill=\"{}\"/>\n",
                num(*x),
                num(*y),
                d,
                fill
            );
        }
        Primitive::Star {
            x,
            y,
            size,
            view,
            points,
            stroke,
            stroke_width,
        } => {
            let _ = write!(
                out,
                "<polygon transform=\"translate({} {}) scale({})\" points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>\n",
                num(*x),
                num(*y),
                num4(size / view),
                points,
                stroke,
                num(*stroke_width)
            );
        }
        Primitive::Line {
            x1,
            x2,
            y,
            stroke,
            width,
        } => {
            let _ = write!(
                out,
                "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>\n",
                num(*x1),
                num(*y),
                num(*x2),
                num(*y),
                stroke,
                num(*width)
            );
        }
        Primitive::Circle {
            cx,
            cy,
            r,
            fill,
            stroke,
        } => {
            let _ = write!(
                out,
                "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>\n",
                num(*cx),
                num(*cy),
                num(*r),
                fill,
                stroke
            );
        }
    }
}

fn write_text(out: &mut String, run: &TextRun) {
    if let Some(href) = &run.href {
        let _ = write!(out, "<a href=\"{}\">", escape(href));
    }
    let anchor = match run.anchor {
        Anchor::Start => "start",
        Anchor::Middle => "middle",
    };
    let _ = write!(
        out,
        "<text x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"{}\" fill=\"{}\" text-anchor=\"{}\"",
        num(run.x),
        num(run.y),
        run.face.family,
        num(run.size),
        run.face.weight,
        run.fill,
        anchor
    );
    if run.spacing != 0.0 {
        let _ = write!(out, " letter-spacing=\"{}\"", num(run.spacing * run.size));
    }
    let _ = write!(out, " xml:space=\"preserve\">{}</text>", escape(&run.content));
    if run.href.is_some() {
        out.push_str("</a>");
    }
    out.push('\n');
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn trim(s: String) -> String {
    if s.contains('.') {
        let t = s.trim_end_matches('0').trim_end_matches('.');
        if t == "-0" {
            "0".to_string()
        } else {
            t.to_string()
        }
    } else {
        s
    }
}

fn num(v: f32) -> String {
    trim(format!("{:.2}", v))
}

fn num4(v: f32) -> String {
    trim(format!("{:.4}", v))
}

fn num64(v: f64) -> String {
    trim(format!("{:.2}", v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layout;
    use crate::style::CardStyle;
    use dimov_core::{CardField, CardRecord};

    fn svg_for(record: &CardRecord, scale: f64) -> String {
        to_svg(&layout(record, &CardStyle::default()), scale)
    }

    #[test]
    fn numbers_are_compact() {
        assert_eq!(num(2243.0), "2243");
        assert_eq!(num(0.5), "0.5");
        assert_eq!(num(-0.001), "0");
        assert_eq!(num4(28.0 / 24.0), "1.1667");
    }

    #[test]
    fn root_keeps_intrinsic_viewbox_at_any_scale() {
        let half = svg_for(&CardRecord::default(), 0.5);
        assert!(half.starts_with(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"1121.5\" height=\"170.5\" viewBox=\"0 0 2243 341\">"
        ));
        let full = svg_for(&CardRecord::default(), 1.0);
        assert!(full.contains("width=\"2243\" height=\"341\" viewBox=\"0 0 2243 341\""));
    }

    #[test]
    fn text_is_escaped() {
        let record = CardRecord::default().with_field(CardField::CompanyNameSuffix, "A&B <\"co\">");
        let svg = svg_for(&record, 1.0);
        assert!(svg.contains(">A&amp;B &lt;&quot;co&quot;&gt;</text>"));
    }

    #[test]
    fn links_wrap_their_text() {
        let svg = svg_for(&CardRecord::default(), 1.0);
        assert!(svg.contains("<a href=\"https://www.dimovconstruction.com\"><text"));
        assert!(svg.contains(">www.dimovconstruction.com</text></a>"));
    }

    #[test]
    fn blank_record_serializes_without_placeholders() {
        let svg = svg_for(&CardRecord::blank(), 1.0);
        assert!(!svg.contains("undefined"));
        assert!(svg.contains("xml:space=\"preserve\"></text>"));
        assert_eq!(svg.matches("<circle").count(), 4);
        assert_eq!(svg.matches("<polygon").count(), 5);
    }

    #[test]
    fn same_record_same_markup() {
        let a = svg_for(&CardRecord::default(), 1.0);
        let b = svg_for(&CardRecord::default(), 1.0);
        assert_eq!(a, b);
    }
}
