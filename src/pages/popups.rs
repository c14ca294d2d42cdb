use crate::app::{App, FormField};
use crate::common::utils::centered_rect;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

pub fn render_input_modal(app: &mut App, frame: &mut Frame) {
    let area = centered_rect(60, 20, frame.area());
    frame.render_widget(Clear, area);

    let label = app.input_state.field.map_or("Value", |f| f.label());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Edit {}", label))
        .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(block, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let shown = if app.input_state.field == Some(FormField::Password) {
        "*".repeat(app.input_state.buffer.chars().count())
    } else {
        app.input_state.buffer.clone()
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .title(label)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(Paragraph::new(shown).block(input_block), layout[0]);

    let instructions = Paragraph::new("Enter: submit | Esc: cancel").alignment(Alignment::Center);
    frame.render_widget(instructions, layout[1]);
}

pub fn render_help_popup(frame: &mut Frame) {
    let area = centered_rect(60, 50, frame.area());
    frame.render_widget(Clear, area);

    let text = vec![
        Line::from("j/k, Up/Down, Tab: move between fields"),
        Line::from("h/l, Left/Right: change host or service"),
        Line::from("Enter/e: edit text, toggle checkbox"),
        Line::from("s: save record"),
        Line::from("q/Esc: quit"),
        Line::from(""),
        Line::from("The FQDN follows the host until you edit it."),
        Line::from("Services that use the FQDN as username lock the username field."),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help (any key to close)")
        .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}
