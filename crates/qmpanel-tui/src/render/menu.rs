//! Main menu popup.

use super::{term_rect, truncate};
use crate::app::scroll_offset;
use crate::colors;
use qmpanel_core::menu::{MainMenu, MenuEntry};
use ratatui::{
    Frame,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

pub fn render_menu(f: &mut Frame, menu: &MainMenu) {
    let Some(area) = menu.geometry().and_then(|rect| term_rect(rect, f.area())) else {
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Applications ")
        .style(Style::default().bg(colors::SURFACE))
        .border_style(Style::default().fg(colors::OUTLINE));
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let rows = menu.rows();
    let selected = menu.selected_row();
    let visible = usize::from(inner.height);
    let offset = scroll_offset(rows.len(), selected, visible);
    let width = usize::from(inner.width);

    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, entry)| entry_line(menu, entry, width, selected == Some(i)))
        .collect();
    f.render_widget(Paragraph::new(lines), inner);

    // Typing always goes to the search field on the first row.
    if offset == 0 {
        let typed = u16::try_from(menu.query().chars().count()).unwrap_or(u16::MAX);
        let x = inner.x.saturating_add(2).saturating_add(typed);
        if x < inner.right() {
            f.set_cursor_position((x, inner.y));
        }
    }
}

fn entry_line<'a>(menu: &'a MainMenu, entry: &MenuEntry, width: usize, selected: bool) -> Line<'a> {
    let highlight = Style::default()
        .fg(colors::PRIMARY)
        .bg(colors::PRIMARY_CONTAINER)
        .add_modifier(Modifier::BOLD);

    let line = match entry {
        MenuEntry::SearchField { query } => {
            let text = if query.is_empty() {
                Span::styled(menu.placeholder(), Style::default().fg(colors::OUTLINE))
            } else {
                Span::styled(
                    truncate(query, width.saturating_sub(2)),
                    Style::default().fg(colors::ON_SURFACE),
                )
            };
            return Line::from(vec![Span::styled("> ", Style::default().fg(colors::PRIMARY)), text]);
        }
        MenuEntry::Category { name, expanded, .. } => {
            let marker = if *expanded { '▾' } else { '▸' };
            Line::from(Span::styled(
                truncate(&format!("{marker} {name}"), width),
                Style::default()
                    .fg(colors::PRIMARY)
                    .add_modifier(Modifier::BOLD),
            ))
        }
        MenuEntry::Action { action } => Line::from(Span::styled(
            truncate(&format!("  {}", action.display_name), width),
            Style::default().fg(colors::ON_SURFACE),
        )),
        MenuEntry::SearchResult { action } => {
            let name = truncate(&action.display_name, width);
            let room = width.saturating_sub(name.chars().count() + 2);
            let mut spans = vec![Span::styled(name, Style::default().fg(colors::ON_SURFACE))];
            if room > 0 {
                spans.push(Span::styled(
                    format!("  {}", truncate(&action.category, room)),
                    Style::default().fg(colors::SUBTEXT),
                ));
            }
            Line::from(spans)
        }
    };

    if selected {
        line.style(highlight)
    } else {
        line
    }
}
