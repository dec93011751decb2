//! Placement of transient popups next to the panel.

use qmpanel_types::{Edge, Point, Rect, Size};

/// Where the panel sits, shared by every popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelGeometry {
    /// Panel strip in screen coordinates
    pub panel: Rect,
    pub edge: Edge,
    /// Available screen area popups are clamped into
    pub screen: Rect,
}

impl PanelGeometry {
    #[must_use]
    pub fn popup_rect(&self, anchor: Rect, size: Size) -> Rect {
        calc_popup_pos(self.panel, self.edge, anchor, size, self.screen)
    }
}

/// Place a popup of `size` flush against the panel's inner edge, aligned
/// with `anchor` along the panel, then clamp it into `screen`.
#[must_use]
pub fn calc_popup_pos(panel: Rect, edge: Edge, anchor: Rect, size: Size, screen: Rect) -> Rect {
    let origin = match edge {
        Edge::Bottom => Point::new(anchor.x, panel.y - size.height),
        Edge::Top => Point::new(anchor.x, panel.bottom()),
        Edge::Left => Point::new(panel.right(), anchor.y),
        Edge::Right => Point::new(panel.x - size.width, anchor.y),
    };

    Rect::from_origin(origin, size).clamped_to(screen)
}
