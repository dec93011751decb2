//! Rendering of the panel strip and its popups.

mod menu;
mod popup;
mod strip;

use crate::app::App;
use crate::colors;
use qmpanel_core::Panel;
use ratatui::{Frame, layout::Rect as TermRect, style::Style, widgets::Block};

pub use menu::render_menu;
pub use popup::{render_calendar, render_task_menu};
pub use strip::render_strip;

/// Draw the whole frame. Popups go last so they cover the strip.
pub fn ui(f: &mut Frame, panel: &Panel, app: &App) {
    let bg_block = Block::default().style(Style::default().bg(colors::BG));
    f.render_widget(bg_block, f.area());

    render_strip(f, panel);

    if panel.menu().is_visible() {
        render_menu(f, panel.menu());
    }
    if let Some(task_menu) = panel.task_menu() {
        render_task_menu(f, task_menu, app.task_menu_selected);
    }
    if let (Some(calendar), Some(rect)) = (
        panel.clock().calendar(),
        panel.clock().calendar_rect(panel.geometry()),
    ) {
        render_calendar(f, calendar, rect);
    }
}

/// Terminal area of a panel rectangle, cut to `frame`. `None` when nothing
/// of it is visible.
fn term_rect(rect: qmpanel_core::Rect, frame: TermRect) -> Option<TermRect> {
    let x = u16::try_from(rect.x.max(0)).ok()?;
    let y = u16::try_from(rect.y.max(0)).ok()?;
    let width = u16::try_from(rect.width.max(0)).ok()?;
    let height = u16::try_from(rect.height.max(0)).ok()?;

    let area = TermRect::new(x, y, width, height).intersection(frame);
    (!area.is_empty()).then_some(area)
}

/// Cut `text` to `width` columns, marking the cut with an ellipsis.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::panel_geometry;
    use qmpanel_core::config::Config;
    use qmpanel_core::menu::InMemoryDatabase;
    use qmpanel_core::window::HeadlessWindowSystem;
    use qmpanel_core::{CalendarKey, PanelEvent};
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};

    fn panel() -> Panel {
        let mut db = InMemoryDatabase::new();
        db.add("foot.desktop", "Foot", "System");
        db.add("firefox.desktop", "Firefox", "Internet");

        let mut config = Config::default();
        config.quick_launch = vec!["foot.desktop".to_string()];
        let geometry = panel_geometry(80, 24, &config.panel);

        let (mut panel, _updates) =
            Panel::new(config, Box::new(db), Box::new(HeadlessWindowSystem));
        panel.start();
        panel.process(PanelEvent::GeometryChanged(geometry));
        panel
    }

    fn draw(panel: &Panel) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| ui(f, panel, &App::new())).unwrap();
        terminal.backend().buffer().clone()
    }

    fn row_text(buffer: &Buffer, y: u16) -> String {
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol())
            .collect()
    }

    fn screen_text(buffer: &Buffer) -> String {
        (0..buffer.area.height)
            .map(|y| row_text(buffer, y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Firefox", 10), "Firefox");
        assert_eq!(truncate("Firefox", 7), "Firefox");
        assert_eq!(truncate("Firefox", 4), "Fir…");
        assert_eq!(truncate("Firefox", 0), "");
    }

    #[test]
    fn test_term_rect_cuts_to_frame() {
        let frame = TermRect::new(0, 0, 80, 24);
        assert_eq!(
            term_rect(qmpanel_core::Rect::new(70, 20, 20, 10), frame),
            Some(TermRect::new(70, 20, 10, 4))
        );
        assert_eq!(term_rect(qmpanel_core::Rect::new(90, 0, 5, 5), frame), None);
    }

    #[test]
    fn test_strip_on_bottom_row() {
        let panel = panel();
        let buffer = draw(&panel);

        let strip = row_text(&buffer, 23);
        assert!(strip.starts_with(" Menu "));
        assert!(strip.contains(panel.clock().text()));
        assert!(!screen_text(&buffer).contains("Search"));
    }

    #[test]
    fn test_menu_popup_lists_categories() {
        let mut panel = panel();
        panel.process(PanelEvent::MenuToggle);
        let text = screen_text(&draw(&panel));

        assert!(text.contains("Search"));
        assert!(text.contains("▸ Internet"));
        assert!(text.contains("▸ System"));
    }

    #[test]
    fn test_calendar_popup_shows_month() {
        let mut panel = panel();
        panel.process(PanelEvent::ClockClicked);
        let title = panel.clock().calendar().unwrap().title();
        let text = screen_text(&draw(&panel));
        assert!(text.contains(&title));

        panel.process(PanelEvent::CalendarKey(CalendarKey::Escape));
        assert!(!screen_text(&draw(&panel)).contains(&title));
    }
}
