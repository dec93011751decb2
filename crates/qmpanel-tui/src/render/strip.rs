//! Panel strip: menu button, quick launch, taskbar and clock.

use super::{term_rect, truncate};
use crate::colors;
use qmpanel_core::{ButtonView, ItemView, Panel};
use ratatui::{
    Frame,
    layout::{Alignment, Rect as TermRect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Paragraph},
};

pub fn render_strip(f: &mut Frame, panel: &Panel) {
    let frame = f.area();
    let Some(strip) = term_rect(panel.geometry().panel, frame) else {
        return;
    };
    f.render_widget(
        Block::default().style(Style::default().bg(colors::SURFACE_HIGH)),
        strip,
    );

    let ctx = panel.layout_context();
    for (item, rect) in panel.items().into_iter().zip(panel.item_rects()) {
        let Some(area) = term_rect(rect, frame) else {
            continue;
        };
        let slots: Vec<TermRect> = item
            .slot_rects(rect, &ctx)
            .into_iter()
            .filter_map(|slot| term_rect(slot, frame))
            .collect();

        match item.render() {
            ItemView::MenuButton { label, open } => {
                let style = Style::default()
                    .fg(colors::PRIMARY)
                    .bg(if open {
                        colors::PRIMARY_CONTAINER
                    } else {
                        colors::SURFACE_HIGH
                    })
                    .add_modifier(Modifier::BOLD);
                render_label(f, area, &label, style, Alignment::Center);
            }
            ItemView::QuickLaunch { buttons } => {
                for (button, slot) in buttons.iter().zip(slots) {
                    // One letter per launcher
                    let letter: String = button.label.chars().take(1).collect();
                    render_label(
                        f,
                        slot,
                        &letter,
                        Style::default().fg(colors::SECONDARY),
                        Alignment::Center,
                    );
                }
            }
            ItemView::Taskbar { buttons } => {
                for (button, slot) in buttons.iter().zip(slots) {
                    render_label(f, slot, &button.label, task_style(button), Alignment::Left);
                }
            }
            ItemView::Clock {
                text,
                calendar_open,
            } => {
                let mut style = Style::default().fg(colors::ON_SURFACE);
                if calendar_open {
                    style = style.bg(colors::PRIMARY_CONTAINER);
                }
                render_label(f, area, &text, style, Alignment::Center);
            }
        }
    }
}

fn task_style(button: &ButtonView) -> Style {
    let mut style = Style::default().fg(colors::SUBTEXT);
    if button.active {
        style = style
            .fg(colors::PRIMARY)
            .bg(colors::PRIMARY_CONTAINER)
            .add_modifier(Modifier::BOLD);
    }
    if button.minimized {
        style = style.fg(colors::OUTLINE).add_modifier(Modifier::ITALIC);
    }
    if button.urgent {
        style = style.fg(colors::WARNING);
    }
    if button.drag_hover {
        style = style.fg(colors::SECONDARY).bg(colors::SURFACE);
    }
    style
}

/// Single-line label padded by one column on each side where room allows.
fn render_label(f: &mut Frame, area: TermRect, text: &str, style: Style, align: Alignment) {
    let width = usize::from(area.width);
    let text = if width > 2 {
        format!(" {} ", truncate(text, width - 2))
    } else {
        truncate(text, width)
    };
    let paragraph = Paragraph::new(Span::styled(text, style))
        .style(style)
        .alignment(align);
    f.render_widget(paragraph, area);
}
