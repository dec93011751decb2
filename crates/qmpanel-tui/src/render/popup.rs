//! Task context menu and calendar popups.

use super::{term_rect, truncate};
use crate::colors;
use qmpanel_core::{Calendar, Rect, TaskMenu};
use ratatui::{
    Frame,
    layout::Alignment,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

pub fn render_task_menu(f: &mut Frame, menu: &TaskMenu, selected: usize) {
    let Some(area) = term_rect(menu.rect, f.area()) else {
        return;
    };
    let width = usize::from(area.width.saturating_sub(2));

    let items: Vec<ListItem> = menu
        .actions
        .iter()
        .map(|action| {
            ListItem::new(truncate(&action.label(), width))
                .style(Style::default().fg(colors::ON_SURFACE))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().bg(colors::SURFACE))
                .border_style(Style::default().fg(colors::OUTLINE)),
        )
        .highlight_style(
            Style::default()
                .fg(colors::PRIMARY)
                .bg(colors::PRIMARY_CONTAINER)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default().with_selected(Some(selected));
    f.render_widget(Clear, area);
    f.render_stateful_widget(list, area, &mut state);
}

pub fn render_calendar(f: &mut Frame, calendar: &Calendar, rect: Rect) {
    let Some(area) = term_rect(rect, f.area()) else {
        return;
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(colors::SURFACE))
        .border_style(Style::default().fg(colors::OUTLINE));
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let width = usize::from(inner.width);
    let arrow = Style::default().fg(colors::SECONDARY);
    // Arrows sit at both ends of the title row.
    let title = format!("{:^w$}", calendar.title(), w = width.saturating_sub(2));
    let mut lines = vec![Line::from(vec![
        Span::styled("<", arrow),
        Span::styled(
            title,
            Style::default()
                .fg(colors::PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(">", arrow),
    ])];

    let header: String = calendar
        .weekday_header()
        .iter()
        .map(|day| format!("{day:>2} "))
        .collect();
    lines.push(Line::from(Span::styled(
        format!(" {header}"),
        Style::default().fg(colors::SUBTEXT),
    )));

    for week in calendar.weeks() {
        let mut spans = vec![Span::raw(" ")];
        for day in week {
            let span = match day {
                Some(day) if calendar.is_today(day) => Span::styled(
                    format!("{day:>2}"),
                    Style::default()
                        .fg(colors::WARNING)
                        .bg(colors::PRIMARY_CONTAINER)
                        .add_modifier(Modifier::BOLD),
                ),
                Some(day) => {
                    Span::styled(format!("{day:>2}"), Style::default().fg(colors::ON_SURFACE))
                }
                None => Span::raw("  "),
            };
            spans.push(span);
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }

    f.render_widget(Paragraph::new(lines).alignment(Alignment::Left), inner);
}
