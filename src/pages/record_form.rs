use crate::app::{App, FieldKind, FormField};
use crate::common::utils::format_timestamp;
use crate::form::record::AddressPreview;
use std::fmt::Display;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};

pub fn render_record_form(app: &mut App, frame: &mut Frame, area: Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(5)])
        .split(area);

    let rows: Vec<Row> = FormField::ALL
        .iter()
        .map(|field| {
            let section = field.section().unwrap_or("");
            let (value, style) = field_value(app, *field);
            Row::new(vec![
                Cell::from(Span::styled(
                    section,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Cell::from(field.label()),
                Cell::from(Span::styled(value, style)),
            ])
        })
        .collect();

    let title = match app.created {
        Some(created) => format!("Change record (created {})", format_timestamp(created)),
        None => "Add record".to_string(),
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(22),
            Constraint::Min(20),
        ],
    )
    .header(
        Row::new(vec!["", "Field", "Value"]).style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(title))
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .highlight_symbol(">> ");

    frame.render_stateful_widget(table, layout[0], &mut app.table_state);

    render_effective_addresses(app, frame, layout[1]);
}

fn field_value(app: &App, field: FormField) -> (String, Style) {
    match field.kind() {
        FieldKind::Select => {
            let label = app.text_value(field);
            (format!("< {} >", label), Style::default().fg(Color::Cyan))
        }
        FieldKind::Toggle => {
            let on = match field {
                FormField::Ipv4Enabled => app.draft.ipv4_enabled,
                _ => app.draft.ipv6_enabled,
            };
            let text = if on { "[x]" } else { "[ ]" };
            (text.to_string(), Style::default())
        }
        FieldKind::Text => match field {
            FormField::Password => ("*".repeat(app.draft.password.chars().count()), Style::default()),
            FormField::Username if !app.form.username().enabled => (
                format!("{} (same as FQDN)", app.form.username().value),
                Style::default().fg(Color::DarkGray),
            ),
            _ => (app.text_value(field).to_string(), Style::default()),
        },
    }
}

fn preview_span<A: Display>(enabled: bool, preview: AddressPreview<A>) -> Span<'static> {
    if !enabled {
        return Span::raw("disabled");
    }
    match preview {
        AddressPreview::Address(addr) => Span::raw(addr.to_string()),
        AddressPreview::NoHostAddress => Span::raw("None"),
        AddressPreview::InvalidNetmask => {
            Span::styled("invalid netmask", Style::default().fg(Color::Red))
        }
        AddressPreview::InvalidHostId => {
            Span::styled("invalid host identifier", Style::default().fg(Color::Red))
        }
    }
}

fn render_effective_addresses(app: &App, frame: &mut Frame, area: Rect) {
    let mut lines = Vec::new();

    match app.form.host().selected() {
        Some(host) => {
            let (v4, v6) = app.draft.preview(host);
            lines.push(Line::from(vec![
                Span::styled("IPv4: ", Style::default().add_modifier(Modifier::BOLD)),
                preview_span(app.draft.ipv4_enabled, v4),
            ]));
            lines.push(Line::from(vec![
                Span::styled("IPv6: ", Style::default().add_modifier(Modifier::BOLD)),
                preview_span(app.draft.ipv6_enabled, v6),
            ]));
        }
        None => lines.push(Line::from("Select a host to preview addresses")),
    }

    if let Some(warning) = app.form.warning() {
        lines.push(Line::from(Span::styled(
            warning,
            Style::default().fg(Color::Yellow),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Effective addresses");
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}
