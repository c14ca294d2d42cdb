use crate::app::{App, InputMode};
use crate::pages::{popups, record_form};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

pub fn render(app: &mut App, frame: &mut Frame) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let lookup = if app.form.lookup_pending() {
        " | Checking service..."
    } else {
        ""
    };
    let status_text = format!(
        "DDNS Broker | Record: {} | Your IP: {}{}",
        app.record_path.display(),
        app.remote_ip.as_deref().unwrap_or("unknown"),
        lookup
    );
    frame.render_widget(
        Paragraph::new(status_text).block(Block::default().borders(Borders::ALL).title("Status")),
        layout[0],
    );

    record_form::render_record_form(app, frame, layout[1]);

    let footer_block = Block::default().borders(Borders::ALL);
    let footer = if let Some(err) = &app.error {
        Paragraph::new(format!("Error: {}", err)).style(Style::default().fg(Color::Red))
    } else if let Some(status) = &app.status {
        Paragraph::new(status.as_str()).style(Style::default().fg(Color::Green))
    } else {
        Paragraph::new(
            "'q': quit, 'j/k': move, 'h/l': change selection, 'Enter': edit/toggle, 's': save, '?': help",
        )
    };
    frame.render_widget(footer.block(footer_block), layout[2]);

    if app.input_state.mode == InputMode::Editing {
        popups::render_input_modal(app, frame);
    } else if app.show_help {
        popups::render_help_popup(frame);
    }
}
