//! SVG serialization of a sampled scene frame.

use crate::models::PointKind;
use crate::scale::ChartGeometry;
use crate::scene::{Frame, FramePrimitive, Geometry, Style};

/// Colors that aren't per-point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme<'a> {
    pub grid_color: &'a str,
    pub font_color: &'a str,
}

impl Default for Theme<'_> {
    fn default() -> Self {
        Theme {
            grid_color: "rgba(127,127,127,0.5)",
            font_color: "rgba(127,127,127,0.9)",
        }
    }
}

/// Escape text for use in SVG element content and attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap the frame's content in a sized `<svg>` root.
pub fn build_svg(frame: &Frame, geometry: &ChartGeometry, theme: &Theme<'_>) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="radar-chart" viewBox="0 0 {w} {h}" width="{w}" height="{h}">{content}</svg>"#,
        w = geometry.width,
        h = geometry.height,
        content = build_svg_content(frame, geometry, theme)
    )
}

/// Build the chart body, translated so that (0, 0) is the radar center.
pub fn build_svg_content(frame: &Frame, geometry: &ChartGeometry, theme: &Theme<'_>) -> String {
    let mut svg = String::with_capacity(4096);
    let (cx, cy) = geometry.center();
    svg.push_str(&format!(r#"<g transform="translate({cx},{cy})">"#));
    for primitive in &frame.primitives {
        build_primitive(&mut svg, primitive, theme);
    }
    svg.push_str("</g>");
    svg
}

fn build_primitive(svg: &mut String, primitive: &FramePrimitive, theme: &Theme<'_>) {
    let Geometry {
        x,
        y,
        size,
        opacity,
    } = primitive.geometry;
    match &primitive.style {
        Style::Ring => {
            let grid = theme.grid_color;
            svg.push_str(&format!(
                r#"<circle class="grid-ring" cx="0" cy="0" r="{size}" fill="none" stroke="{grid}" stroke-width="1" opacity="{opacity}"/>"#
            ));
        }
        Style::RingLabel { text } => {
            let font = theme.font_color;
            let text = escape_xml(text);
            svg.push_str(&format!(
                r#"<text class="ring-label" x="{x}" y="{y}" fill="{font}" font-size="9" dy="-2" opacity="{opacity}">{text}</text>"#
            ));
        }
        Style::Axis { cardinal } => {
            let grid = theme.grid_color;
            let font = theme.font_color;
            let label = cardinal.label();
            let len = x.hypot(y);
            let (lx, ly) = if len > 0.0 {
                (x + x / len * 10.0, y + y / len * 10.0)
            } else {
                (x, y)
            };
            svg.push_str(&format!(
                r#"<line class="cardinal-axis" x1="0" y1="0" x2="{x}" y2="{y}" stroke="{grid}" stroke-width="1" opacity="{opacity}"/>"#
            ));
            svg.push_str(&format!(
                r#"<text class="cardinal-label" x="{lx}" y="{ly}" fill="{font}" font-size="11" text-anchor="middle" dominant-baseline="central" opacity="{opacity}">{label}</text>"#
            ));
        }
        Style::Ping { point_id, color } => {
            let id = escape_xml(point_id);
            let color = escape_xml(color);
            let grown = size * 2.0;
            svg.push_str(&format!(
                r#"<circle class="moving-ping" data-id="{id}" cx="{x}" cy="{y}" r="{size}" fill="none" stroke="{color}" stroke-width="2" opacity="{opacity}">"#
            ));
            svg.push_str(&format!(
                r#"<animate attributeName="r" from="{size}" to="{grown}" dur="1.5s" repeatCount="indefinite"/><animate attributeName="stroke-opacity" from="1" to="0" dur="1.5s" repeatCount="indefinite"/></circle>"#
            ));
        }
        Style::Point {
            point_id,
            kind,
            label,
            color,
            pulsing,
        } => {
            let id = escape_xml(point_id);
            let color = escape_xml(color);
            let label = escape_xml(label);
            let pulse_class = if *pulsing { " pulsing" } else { "" };
            match kind {
                PointKind::Entity => {
                    svg.push_str(&format!(
                        r#"<circle class="entity-dot{pulse_class}" data-id="{id}" cx="{x}" cy="{y}" r="{size}" style="fill: {color}" opacity="{opacity}" role="button" tabindex="0" aria-label="{label}"/>"#
                    ));
                }
                PointKind::Marker => {
                    let half_w = size * 0.866;
                    let half_h = size * 0.5;
                    svg.push_str(&format!(
                        r#"<polygon class="marker-triangle{pulse_class}" data-id="{id}" points="{},{} {},{} {},{}" style="fill: {color}" opacity="{opacity}" role="button" tabindex="0" aria-label="{label}"/>"#,
                        x,
                        y - size,
                        x - half_w,
                        y + half_h,
                        x + half_w,
                        y + half_h
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DistanceUnit;
    use crate::scale::RadialScale;
    use crate::scene::{Cardinal, PrimitiveKey};

    fn frame_of(primitives: Vec<FramePrimitive>) -> Frame {
        Frame { primitives }
    }

    fn dot(id: &str, kind: PointKind, pulsing: bool) -> FramePrimitive {
        FramePrimitive {
            key: PrimitiveKey::Point(id.to_string()),
            geometry: Geometry::at(10.0, -20.0, 5.0),
            style: Style::Point {
                point_id: id.to_string(),
                kind,
                label: "A & B".to_string(),
                color: "rgb(0, 255, 0)".to_string(),
                pulsing,
            },
        }
    }

    #[test]
    fn test_entity_dot_uses_color_style() {
        let mut svg = String::new();
        build_primitive(&mut svg, &dot("person.a", PointKind::Entity, false), &Theme::default());
        assert!(svg.starts_with(r#"<circle class="entity-dot""#));
        assert!(svg.contains(r#"style="fill: rgb(0, 255, 0)""#));
        assert!(svg.contains(r#"data-id="person.a""#));
        assert!(svg.contains("A &amp; B"));
    }

    #[test]
    fn test_marker_is_triangle_and_pulsing_class() {
        let mut svg = String::new();
        build_primitive(&mut svg, &dot("m1", PointKind::Marker, true), &Theme::default());
        assert!(svg.starts_with(r#"<polygon class="marker-triangle pulsing""#));
    }

    #[test]
    fn test_axis_has_label() {
        let mut svg = String::new();
        let axis = FramePrimitive {
            key: PrimitiveKey::Axis(Cardinal::East),
            geometry: Geometry::at(90.0, 0.0, 90.0),
            style: Style::Axis {
                cardinal: Cardinal::East,
            },
        };
        build_primitive(&mut svg, &axis, &Theme::default());
        assert_eq!(svg.matches("<line").count(), 1);
        assert!(svg.contains(r#"x="100""#));
        assert!(svg.contains(">E</text>"));
    }

    #[test]
    fn test_full_svg_is_centered() {
        let geometry = ChartGeometry::square(220.0, 20.0);
        let scale = RadialScale::new(50.0, geometry.radius());
        let description = crate::scene::describe(
            &[],
            &scale,
            &crate::scene::SceneOptions {
                unit: DistanceUnit::Km,
                default_color: "blue",
                show_ring_labels: true,
                moving_animation: true,
                pulsing: None,
            },
        );
        let mut renderer = crate::scene::SceneRenderer::new();
        renderer.render(
            description,
            crate::scene::AnimationSettings {
                enabled: false,
                duration_ms: 0.0,
            },
            0.0,
            false,
        );
        let svg = build_svg(&renderer.frame(0.0), &geometry, &Theme::default());
        assert!(svg.contains(r#"translate(110,110)"#));
        assert_eq!(svg.matches(r#"class="grid-ring""#).count(), 5);
        assert!(svg.contains(">50 km</text>"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }
}
