//! Card layout: maps a `CardRecord` to a flat list of positioned primitives.
//!
//! Text widths come from a [`Measure`]. [`Estimate`] uses `Face::advance`
//! and needs no fonts; export passes the loaded `FontSet` so positions follow
//! the faces that will actually be drawn.
use dimov_core::{CardField, CardRecord};

use crate::style::{CardStyle, Face};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// The record field this run displays, `None` for fixed labels.
    pub field: Option<CardField>,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub face: Face,
    pub fill: &'static str,
    pub anchor: Anchor,
    /// Letter spacing in ems.
    pub spacing: f32,
    pub content: String,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Rounded card body with a vertical gradient.
    Card {
        width: f32,
        height: f32,
        radius: f32,
        stops: [(f32, &'static str); 3],
        border: &'static str,
    },
    Text(TextRun),
    Path {
        x: f32,
        y: f32,
        d: &'static str,
        fill: &'static str,
    },
    /// Outlined star polygon `points` in a `view`-sized box, scaled to `size`.
    Star {
        x: f32,
        y: f32,
        size: f32,
        view: f32,
        points: &'static str,
        stroke: &'static str,
        stroke_width: f32,
    },
    Line {
        x1: f32,
        x2: f32,
        y: f32,
        stroke: &'static str,
        width: f32,
    },
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
        fill: &'static str,
        stroke: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    pub items: Vec<Primitive>,
}

impl Scene {
    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.items.iter().filter_map(|p| match p {
            Primitive::Text(t) => Some(t),
            _ => None,
        })
    }

    /// The run displaying `field`, if the layout places one.
    pub fn text_for(&self, field: CardField) -> Option<&TextRun> {
        self.texts().find(|t| t.field == Some(field))
    }
}

/// Width of a run of text, in design units.
pub trait Measure {
    fn width(&self, face: &Face, text: &str, size: f32, spacing: f32) -> f32;
}

/// Average-advance estimate from [`Face::advance`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Estimate;

impl Measure for Estimate {
    fn width(&self, face: &Face, text: &str, size: f32, spacing: f32) -> f32 {
        face.measure(text, size, spacing)
    }
}

/// Lay out `record` in the fixed canvas of `style` with estimated widths.
pub fn layout(record: &CardRecord, style: &CardStyle) -> Scene {
    layout_with(record, style, &Estimate)
}

pub fn layout_with(record: &CardRecord, style: &CardStyle, m: &dyn Measure) -> Scene {
    let mut items = vec![Primitive::Card {
        width: style.width,
        height: style.height,
        radius: style.corner_radius,
        stops: style.gradient,
        border: style.border,
    }];

    brand_zone(record, style, m, &mut items);
    contact_zone(record, style, m, &mut items);
    cutouts(style, &mut items);

    Scene {
        width: style.width,
        height: style.height,
        items,
    }
}

fn text(
    field: Option<CardField>,
    x: f32,
    y: f32,
    size: f32,
    face: Face,
    fill: &'static str,
    content: impl Into<String>,
) -> TextRun {
    TextRun {
        field,
        x,
        y,
        size,
        face,
        fill,
        anchor: Anchor::Start,
        spacing: 0.0,
        content: content.into(),
        href: None,
    }
}

fn split_initial(name: &str) -> (&str, &str) {
    match name.chars().next() {
        Some(c) => name.split_at(c.len_utf8()),
        None => ("", ""),
    }
}

/// Left 40%: big initial, suffix over rest-of-name, chevron, stars over the
/// company type, slogan underneath.
fn brand_zone(record: &CardRecord, s: &CardStyle, m: &dyn Measure, items: &mut Vec<Primitive>) {
    let (initial, rest) = split_initial(&record.company_name_main);
    let logo = s.logo_face;

    let initial_box = s.initial_size * s.initial_line;
    let stack_box = s.suffix_size + s.row_gap + s.rest_size * s.rest_line;
    let logo_row = initial_box.max(stack_box);
    let slogan_box = s.slogan_size * s.slogan_line;
    let block = s.logo_top + logo_row + s.slogan_gap + slogan_box;

    let top = s.padding_y + (s.content_height() - block) / 2.0 + s.logo_top;
    let x0 = s.padding_x + s.left_inset;

    let mut initial_run = text(
        Some(CardField::CompanyNameMain),
        x0,
        s.baseline(top, s.initial_size, s.initial_line),
        s.initial_size,
        logo,
        s.brand,
        initial,
    );
    initial_run.spacing = s.initial_spacing;
    let initial_width = m.width(&logo, initial, s.initial_size, s.initial_spacing);
    items.push(Primitive::Text(initial_run));

    // Stack to the right of the initial.
    let stack_x = x0 + initial_width + s.initial_gap;
    let mut suffix = text(
        Some(CardField::CompanyNameSuffix),
        stack_x,
        s.baseline(top + s.suffix_nudge, s.suffix_size, 1.0),
        s.suffix_size,
        logo,
        s.brand,
        record.company_name_suffix.as_str(),
    );
    suffix.spacing = s.suffix_spacing;
    items.push(Primitive::Text(suffix));

    let row_top = top + s.suffix_size + s.row_gap;
    let row_bottom = row_top + s.rest_size * s.rest_line;

    let rest_x = stack_x - s.rest_overlap;
    items.push(Primitive::Text(text(
        None,
        rest_x,
        s.baseline(row_top, s.rest_size, s.rest_line),
        s.rest_size,
        logo,
        s.brand,
        rest,
    )));

    let chevron_x = rest_x + m.width(&logo, rest, s.rest_size, 0.0) + s.chevron_margin_left;
    items.push(Primitive::Path {
        x: chevron_x,
        y: row_bottom - s.chevron_lift - s.chevron_height,
        d: s.chevron_path,
        fill: s.brand,
    });

    // Stars centred over the company type.
    let stars_width = s.star_count as f32 * s.star_size + (s.star_count - 1) as f32 * s.star_gap;
    let type_width = m.width(&logo, &record.company_type, s.type_size, 0.0);
    let group_width = s.type_min_width.max(stars_width).max(type_width);
    let group_x = chevron_x + s.chevron_width + s.chevron_margin_right;
    let group_cx = group_x + group_width / 2.0;
    let group_bottom = row_bottom + s.type_drop;
    let type_top = group_bottom - s.type_size * s.type_line;

    let star_top = type_top - s.star_margin - s.star_size;
    let star_x0 = group_cx - stars_width / 2.0;
    for i in 0..s.star_count {
        items.push(Primitive::Star {
            x: star_x0 + i as f32 * (s.star_size + s.star_gap),
            y: star_top,
            size: s.star_size,
            view: s.star_view,
            points: s.star_points,
            stroke: s.brand,
            stroke_width: s.star_stroke,
        });
    }

    let mut company_type = text(
        Some(CardField::CompanyType),
        group_cx,
        s.baseline(type_top, s.type_size, s.type_line),
        s.type_size,
        logo,
        s.brand,
        record.company_type.as_str(),
    );
    company_type.anchor = Anchor::Middle;
    items.push(Primitive::Text(company_type));

    let slogan_top = top + logo_row + s.slogan_gap;
    items.push(Primitive::Text(text(
        Some(CardField::Slogan),
        x0 + s.slogan_inset,
        s.baseline(slogan_top, s.slogan_size, s.slogan_line),
        s.slogan_size,
        s.text_bold_face,
        s.brand,
        record.slogan.to_uppercase(),
    )));
}

/// Right 60%: address, email and web links, then the phone/person grid. The
/// block hugs its widest line and sits against the right inset.
fn contact_zone(record: &CardRecord, s: &CardStyle, m: &dyn Measure, items: &mut Vec<Primitive>) {
    let body = s.text_face;
    let bold = s.text_bold_face;
    let line = s.body_size * s.body_line;
    let label_line = s.label_size * s.body_line;

    let email_label = "email:";
    let web_label = "web:";

    let address_w = m.width(&body, &record.address, s.body_size, 0.0);
    let email_label_w = m.width(&body, email_label, s.label_size, 0.0);
    let web_label_w = m.width(&body, web_label, s.label_size, 0.0);
    let email_w = email_label_w + s.label_gap + m.width(&body, &record.email1, s.body_size, 0.0);
    let web_w = web_label_w + s.label_gap + m.width(&body, &record.website, s.body_size, 0.0);

    let pairs = [
        (CardField::Phone1, &record.phone1, CardField::Person1, &record.person1),
        (CardField::Phone2, &record.phone2, CardField::Person2, &record.person2),
        (CardField::Phone3, &record.phone3, CardField::Person3, &record.person3),
    ];
    let person_text = |p: &str| format!("- {}", p);
    let phone_col = pairs
        .iter()
        .map(|(_, phone, _, _)| m.width(&bold, phone, s.body_size, 0.0))
        .fold(0.0_f32, f32::max);
    let person_col = pairs
        .iter()
        .map(|(_, _, _, person)| m.width(&body, &person_text(person.as_str()), s.body_size, 0.0))
        .fold(0.0_f32, f32::max);
    let grid_w = phone_col + s.grid_col_gap + person_col;

    let block_w = address_w.max(email_w).max(web_w).max(grid_w);
    let block_h = line
        + s.address_gap
        + 2.0 * label_line
        + s.link_row_gap
        + s.links_gap
        + 3.0 * line
        + 2.0 * s.grid_row_gap;

    let right = s.width - s.padding_x - s.right_inset;
    let x = right - block_w;
    let mut y = s.padding_y + (s.content_height() - block_h) / 2.0;

    items.push(Primitive::Text(text(
        Some(CardField::Address),
        x,
        s.baseline(y, s.body_size, s.body_line),
        s.body_size,
        body,
        s.ink,
        record.address.as_str(),
    )));
    y += line + s.address_gap;

    let links = [
        (email_label, email_label_w, CardField::Email1, &record.email1, format!("mailto:{}", record.email1)),
        (web_label, web_label_w, CardField::Website, &record.website, format!("https://{}", record.website)),
    ];
    for (i, (label, label_w, field, value, href)) in links.into_iter().enumerate() {
        let baseline = s.baseline(y, s.label_size, s.body_line);
        items.push(Primitive::Text(text(
            None, x, baseline, s.label_size, body, s.ink, label,
        )));

        let link_x = x + label_w + s.label_gap;
        let mut link = text(Some(field), link_x, baseline, s.body_size, body, s.link, value.as_str());
        link.href = Some(href);
        items.push(Primitive::Text(link));

        if !value.is_empty() {
            items.push(Primitive::Line {
                x1: link_x,
                x2: link_x + m.width(&body, value, s.body_size, 0.0),
                y: baseline + s.underline_offset,
                stroke: s.link,
                width: s.underline_width,
            });
        }

        y += label_line;
        if i == 0 {
            y += s.link_row_gap;
        }
    }
    y += s.links_gap;

    let person_x = x + phone_col + s.grid_col_gap;
    for (phone_field, phone, person_field, person) in pairs {
        let baseline = s.baseline(y, s.body_size, s.body_line);
        items.push(Primitive::Text(text(
            Some(phone_field),
            x,
            baseline,
            s.body_size,
            bold,
            s.ink,
            phone.as_str(),
        )));
        items.push(Primitive::Text(text(
            Some(person_field),
            person_x,
            baseline,
            s.body_size,
            body,
            s.ink,
            person_text(person.as_str()),
        )));
        y += line + s.grid_row_gap;
    }
}

/// Four ornamental circles centred on the canvas corners.
fn cutouts(s: &CardStyle, items: &mut Vec<Primitive>) {
    let r = s.cutout_diameter / 2.0;
    for (cx, cy) in [(0.0, 0.0), (s.width, 0.0), (0.0, s.height), (s.width, s.height)] {
        items.push(Primitive::Circle {
            cx,
            cy,
            r,
            fill: s.cutout_fill,
            stroke: s.border,
        });
    }
}
