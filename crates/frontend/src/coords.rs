use radar_shared::scale::ChartGeometry;
use radar_shared::scene::{Frame, PrimitiveKey};

/// Extra pixels around a point that still count as a hit.
pub const HIT_SLACK: f64 = 4.0;

/// Convert client (viewport) coordinates to container-relative pixel coordinates.
pub fn client_to_container(client_x: f64, client_y: f64, rect_left: f64, rect_top: f64) -> (f64, f64) {
    (client_x - rect_left, client_y - rect_top)
}

/// Container-relative pixels to chart space (origin at the radar center),
/// scaling when the SVG is rendered at a different width than its viewBox.
pub fn container_to_chart(
    container_x: f64,
    container_y: f64,
    rendered_w: f64,
    geometry: &ChartGeometry,
) -> Option<(f64, f64)> {
    if rendered_w <= 0.0 {
        return None;
    }
    let scale = geometry.width / rendered_w;
    let (cx, cy) = geometry.center();
    Some((container_x * scale - cx, container_y * scale - cy))
}

/// Inverse of [`container_to_chart`].
pub fn chart_to_container(chart_point: (f64, f64), rendered_w: f64, geometry: &ChartGeometry) -> Option<(f64, f64)> {
    if geometry.width <= 0.0 {
        return None;
    }
    let scale = rendered_w / geometry.width;
    let (cx, cy) = geometry.center();
    Some(((chart_point.0 + cx) * scale, (chart_point.1 + cy) * scale))
}

/// Container position of a point, used to anchor the tooltip when the point
/// gets keyboard focus instead of a pointer.
pub fn focus_anchor(frame: &Frame, point_id: &str, rendered_w: f64, geometry: &ChartGeometry) -> Option<(f64, f64)> {
    let point = frame.point(point_id)?;
    chart_to_container((point.geometry.x, point.geometry.y), rendered_w, geometry)
}

/// `data-id` of the focused chart point, if any.
pub fn focused_point_id() -> Option<String> {
    let document = web_sys::window()?.document()?;
    document.active_element()?.get_attribute("data-id")
}

/// Topmost point primitive under `chart_point`.
pub fn hit_test(frame: &Frame, chart_point: (f64, f64), slack: f64) -> Option<String> {
    let (x, y) = chart_point;
    frame
        .primitives
        .iter()
        .rev()
        .filter_map(|p| match &p.key {
            PrimitiveKey::Point(id) => Some((id, p.geometry)),
            _ => None,
        })
        .find(|(_, g)| {
            let reach = g.size + slack;
            (g.x - x).powi(2) + (g.y - y).powi(2) <= reach * reach
        })
        .map(|(id, _)| id.clone())
}

pub fn element_rect(id: &str) -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(id)?;
    Some(element.get_bounding_client_rect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_shared::models::PointKind;
    use radar_shared::scene::{FramePrimitive, Geometry, Style};

    fn point(id: &str, x: f64, y: f64) -> FramePrimitive {
        FramePrimitive {
            key: PrimitiveKey::Point(id.to_string()),
            geometry: Geometry::at(x, y, 5.0),
            style: Style::Point {
                point_id: id.to_string(),
                kind: PointKind::Entity,
                label: id.to_string(),
                color: "#fff".to_string(),
                pulsing: false,
            },
        }
    }

    #[test]
    fn test_client_to_container_offset() {
        let (x, y) = client_to_container(450.0, 350.0, 320.0, 50.0);
        assert!((x - 130.0).abs() < 1e-9);
        assert!((y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_container_to_chart_center() {
        let geometry = ChartGeometry::square(220.0, 20.0);
        let (x, y) = container_to_chart(110.0, 110.0, 220.0, &geometry).unwrap();
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_container_to_chart_scaled() {
        // Rendered at twice the viewBox width.
        let geometry = ChartGeometry::square(220.0, 20.0);
        let (x, y) = container_to_chart(440.0, 0.0, 440.0, &geometry).unwrap();
        assert!((x - 110.0).abs() < 1e-9);
        assert!((y + 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_container_to_chart_invalid_width() {
        let geometry = ChartGeometry::square(220.0, 20.0);
        assert!(container_to_chart(10.0, 10.0, 0.0, &geometry).is_none());
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let frame = Frame {
            primitives: vec![point("below", 10.0, 10.0), point("above", 12.0, 10.0)],
        };
        assert_eq!(hit_test(&frame, (11.0, 10.0), HIT_SLACK).as_deref(), Some("above"));
        assert_eq!(hit_test(&frame, (0.0, 0.0), HIT_SLACK).as_deref(), None);
    }

    #[test]
    fn test_chart_to_container_undoes_container_to_chart() {
        let geometry = ChartGeometry::square(220.0, 20.0);
        let chart = container_to_chart(300.0, 40.0, 440.0, &geometry).unwrap();
        let (x, y) = chart_to_container(chart, 440.0, &geometry).unwrap();
        assert!((x - 300.0).abs() < 1e-9);
        assert!((y - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_focus_anchor_places_tooltip_at_point() {
        let geometry = ChartGeometry::square(220.0, 20.0);
        let frame = Frame {
            primitives: vec![point("a", 30.0, -20.0)],
        };
        let (x, y) = focus_anchor(&frame, "a", 220.0, &geometry).unwrap();
        assert!((x - 140.0).abs() < 1e-9);
        assert!((y - 90.0).abs() < 1e-9);
        assert!(focus_anchor(&frame, "missing", 220.0, &geometry).is_none());
    }

    #[test]
    fn test_hit_test_uses_slack() {
        let frame = Frame {
            primitives: vec![point("a", 0.0, 0.0)],
        };
        assert!(hit_test(&frame, (8.0, 0.0), HIT_SLACK).is_some());
        assert!(hit_test(&frame, (8.0, 0.0), 0.0).is_none());
    }
}
