use chrono::Local;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
};
use takatrack_core::model::{CanonicalState, DisplayToken, FleetSummary};

use crate::app::{App, Pane};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let header = Paragraph::new(format!("takatrack – live bin levels from {}", app.endpoint))
        .block(Block::default().borders(Borders::ALL).title("TakaTrack"));
    frame.render_widget(header, *header_area);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(*content_area);
    let [bins_area, side_area] = content_chunks.as_ref() else {
        return;
    };

    let side_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // summary + viewport
            Constraint::Min(0),    // alert log
        ])
        .split(*side_area);
    let [overview_area, alerts_area] = side_chunks.as_ref() else {
        return;
    };

    draw_bins(frame, app, *bins_area);
    draw_overview(frame, app, *overview_area);
    draw_alerts(frame, app, *alerts_area);

    let nav_hint = "↑/↓ move · Tab switch pane · c clear alerts · q/Ctrl-C quit";

    let status_text = if app.is_loading() {
        format!("Loading… · {nav_hint}")
    } else if let Some(msg) = &app.error_message {
        format!("{msg} · {nav_hint}")
    } else if let Some(refreshed) = app.last_refresh {
        let local = refreshed.with_timezone(&Local);
        format!("Updated {} · {nav_hint}", local.format("%H:%M:%S"))
    } else {
        nav_hint.to_owned()
    };

    let status_style = if app.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title)
}

fn draw_bins(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let title = format!("Bins ({})", app.bins.len());
    let block = pane_block(title, app.focus == Pane::Bins);

    if app.bins.is_empty() {
        let text = if app.is_loading() {
            "Waiting for the first refresh…"
        } else {
            "The registry reported no bins."
        };
        let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = app.bins.iter().map(|bin| {
        Row::new(vec![
            Cell::from(bin.entity.id.to_string()),
            Cell::from(bin.entity.area_label().to_owned()),
            Cell::from(state_label(bin.state)),
            Cell::from(format!(
                "{:.4}, {:.4}",
                bin.entity.location.lat, bin.entity.location.lng
            )),
        ])
        .style(Style::default().fg(token_color(bin.token)))
    });

    let column_widths = [
        Constraint::Length(10),
        Constraint::Min(12),
        Constraint::Length(9),
        Constraint::Length(22),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Bin", "Area", "Status", "Location"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(block)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .column_spacing(1);

    let mut state = TableState::default();
    state.select(Some(app.bin_index));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_overview(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let mut lines = summary_lines(&app.summary);

    let viewport_line = match app.viewport {
        Some(viewport) => format!(
            "View: {:.4}, {:.4} (±{:.4}° × ±{:.4}°)",
            viewport.center.lat,
            viewport.center.lng,
            viewport.span.lat_delta / 2.0,
            viewport.span.lng_delta / 2.0
        ),
        None => String::from("View: keeping previous viewport"),
    };
    lines.push(Line::from(viewport_line));

    if app.dropped > 0 {
        lines.push(Line::styled(
            format!("{} record(s) skipped: bad id or location", app.dropped),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let title = app
        .cycle
        .map_or_else(|| String::from("Fleet"), |cycle| format!("Fleet · cycle {cycle}"));
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn summary_lines(summary: &FleetSummary) -> Vec<Line<'static>> {
    CanonicalState::ALL
        .iter()
        .map(|state| {
            let color = token_color(takatrack_core::classify::display_token(*state));
            Line::from(vec![
                Span::styled(format!("{:<8}", state_label(*state)), Style::default().fg(color)),
                Span::raw(summary.count(*state).to_string()),
            ])
        })
        .collect()
}

fn draw_alerts(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items = if app.alerts.is_empty() {
        vec![ListItem::new("No full bins reported yet.")]
    } else {
        app.alerts
            .iter()
            .map(|logged| {
                ListItem::new(format!(
                    "{} Bin {} in {} is full",
                    logged.received_at.format("%H:%M:%S"),
                    logged.event.id,
                    logged.event.area
                ))
                .style(Style::default().fg(Color::Red))
            })
            .collect()
    };

    let title = format!("Alerts ({})", app.alerts.len());
    let list = List::new(items)
        .block(pane_block(title, app.focus == Pane::Alerts))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.alerts.is_empty() {
        state.select(Some(app.alert_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn state_label(state: CanonicalState) -> &'static str {
    match state {
        CanonicalState::Full => "Full",
        CanonicalState::Pending => "Half",
        CanonicalState::Empty => "Empty",
        CanonicalState::Unknown => "Unknown",
    }
}

fn token_color(token: DisplayToken) -> Color {
    match token {
        DisplayToken::Red => Color::Red,
        DisplayToken::Yellow => Color::Yellow,
        DisplayToken::Green => Color::Green,
    }
}
