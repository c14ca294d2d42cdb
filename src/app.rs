use crate::api::BrokerClient;
use crate::api::remote_ip::RemoteIpApi;
use crate::api::types::FormOptions;
use crate::api::update_service::UpdateServiceApi;
use crate::event::{Event, EventHandler};
use crate::form::controller::{FormSyncController, LookupOutcome, LookupRequest};
use crate::form::record::{Record, RecordDraft, build_record};
use crate::store;
use crate::tui::Tui;
use crate::ui;
use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::TableState;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Host,
    Fqdn,
    Ipv4Enabled,
    Ipv6Enabled,
    Ipv4Netmask,
    Ipv4HostId,
    Ipv6Netmask,
    Ipv6HostId,
    Service,
    Username,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Select,
    Toggle,
    Text,
}

impl FormField {
    /// Rows in the order the admin form lays them out.
    pub const ALL: [FormField; 11] = [
        FormField::Host,
        FormField::Fqdn,
        FormField::Ipv4Enabled,
        FormField::Ipv6Enabled,
        FormField::Ipv4Netmask,
        FormField::Ipv4HostId,
        FormField::Ipv6Netmask,
        FormField::Ipv6HostId,
        FormField::Service,
        FormField::Username,
        FormField::Password,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Host => "Host",
            FormField::Fqdn => "FQDN",
            FormField::Ipv4Enabled => "IPv4 enabled",
            FormField::Ipv6Enabled => "IPv6 enabled",
            FormField::Ipv4Netmask => "IPv4 netmask",
            FormField::Ipv4HostId => "IPv4 host identifier",
            FormField::Ipv6Netmask => "IPv6 netmask",
            FormField::Ipv6HostId => "IPv6 host identifier",
            FormField::Service => "Service",
            FormField::Username => "Username",
            FormField::Password => "Password",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FormField::Host | FormField::Service => FieldKind::Select,
            FormField::Ipv4Enabled | FormField::Ipv6Enabled => FieldKind::Toggle,
            _ => FieldKind::Text,
        }
    }

    /// Fieldset heading for the first row of each group.
    pub fn section(&self) -> Option<&'static str> {
        match self {
            FormField::Host => Some("Record"),
            FormField::Ipv4Netmask => Some("Record composition"),
            FormField::Service => Some("Update service"),
            _ => None,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

#[derive(Debug, Default)]
pub struct InputState {
    pub mode: InputMode,
    pub field: Option<FormField>,
    pub buffer: String,
}

#[derive(Debug)]
pub struct App {
    pub should_quit: bool,
    pub client: BrokerClient,
    pub form: FormSyncController,
    pub draft: RecordDraft,
    pub created: Option<DateTime<Utc>>,
    pub record_path: PathBuf,
    pub table_state: TableState,
    pub input_state: InputState,
    pub show_help: bool,
    pub remote_ip: Option<String>,
    pub status: Option<String>,
    pub error: Option<String>,
}

impl App {
    pub fn new(
        client: BrokerClient,
        options: FormOptions,
        existing: Option<Record>,
        record_path: PathBuf,
    ) -> Self {
        let lookup_by_id = client.config.lookup_by_id;
        let form = FormSyncController::bind(options, existing.as_ref(), lookup_by_id);
        let draft = existing
            .as_ref()
            .map(RecordDraft::from_record)
            .unwrap_or_default();

        let mut table_state = TableState::default();
        table_state.select(Some(0));

        Self {
            should_quit: false,
            client,
            form,
            draft,
            created: existing.and_then(|r| r.created),
            record_path,
            table_state,
            input_state: InputState::default(),
            show_help: false,
            remote_ip: None,
            status: None,
            error: None,
        }
    }

    pub async fn run(&mut self, tui: &mut Tui, events: &mut EventHandler) -> Result<()> {
        self.fetch_remote_ip(events.sender());
        if let Some(request) = self.form.initial_lookup() {
            self.fetch_username_is_fqdn(request, events.sender());
        }

        while !self.should_quit {
            tui.draw(|f| {
                ui::render(self, f);
            })?;

            let event = events.next().await?;
            self.handle_event(event, events.sender());
        }
        Ok(())
    }

    pub fn handle_event(&mut self, event: Event, tx: UnboundedSender<Event>) {
        match event {
            Event::Tick | Event::Resize(_, _) => {}
            Event::Key(key) => self.handle_key_event(key, tx),
            Event::UsernameIsFqdnFetched(seq, result) => {
                if let LookupOutcome::Applied(flag) = self.form.apply_lookup(seq, result) {
                    tracing::info!(
                        service = self.form.service().selected_label(),
                        username_is_fqdn = flag,
                        "username field updated"
                    );
                }
            }
            Event::RemoteIpFetched(result) => match result {
                Ok(ip) => self.remote_ip = Some(ip),
                Err(e) => tracing::warn!(error = %e, "remote ip lookup failed"),
            },
        }
    }

    fn fetch_username_is_fqdn(&self, request: LookupRequest, tx: UnboundedSender<Event>) {
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client
                .get_username_is_fqdn(request.service_id)
                .await
                .map_err(|e| format!("{e:#}"));
            let _ = tx.send(Event::UsernameIsFqdnFetched(request.seq, result));
        });
    }

    fn fetch_remote_ip(&self, tx: UnboundedSender<Event>) {
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.get_remote_ip().await.map_err(|e| e.to_string());
            let _ = tx.send(Event::RemoteIpFetched(result));
        });
    }

    pub fn focused_field(&self) -> FormField {
        let idx = self.table_state.selected().unwrap_or(0);
        FormField::ALL[idx.min(FormField::ALL.len() - 1)]
    }

    fn handle_key_event(&mut self, key: KeyEvent, tx: UnboundedSender<Event>) {
        if self.input_state.mode == InputMode::Editing {
            self.handle_editing_key(key);
            return;
        }
        if self.show_help {
            self.show_help = false;
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('s') => self.save(),
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => self.next_row(),
            KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => self.previous_row(),
            KeyCode::Char('l') | KeyCode::Right => self.cycle_selection(true, tx),
            KeyCode::Char('h') | KeyCode::Left => self.cycle_selection(false, tx),
            KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Char('e') => self.activate(tx),
            _ => {}
        }
    }

    fn handle_editing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.input_state = InputState::default(),
            KeyCode::Enter => self.commit_edit(),
            KeyCode::Backspace => {
                self.input_state.buffer.pop();
            }
            KeyCode::Char(c) => self.input_state.buffer.push(c),
            _ => {}
        }
    }

    fn next_row(&mut self) {
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < FormField::ALL.len() => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    fn previous_row(&mut self) {
        let i = match self.table_state.selected() {
            Some(0) | None => FormField::ALL.len() - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    fn cycle_selection(&mut self, forward: bool, tx: UnboundedSender<Event>) {
        match self.focused_field() {
            FormField::Host => {
                let host = self.form.host();
                let index = if forward { host.next_index() } else { host.prev_index() };
                self.form.select_host(index);
            }
            FormField::Service => {
                let service = self.form.service();
                let index = if forward {
                    service.next_index()
                } else {
                    service.prev_index()
                };
                if let Some(request) = self.form.select_service(index) {
                    self.fetch_username_is_fqdn(request, tx);
                }
            }
            _ => {}
        }
    }

    fn activate(&mut self, tx: UnboundedSender<Event>) {
        let field = self.focused_field();
        match field.kind() {
            FieldKind::Select => self.cycle_selection(true, tx),
            FieldKind::Toggle => {
                let flag = match field {
                    FormField::Ipv4Enabled => &mut self.draft.ipv4_enabled,
                    _ => &mut self.draft.ipv6_enabled,
                };
                *flag = !*flag;
            }
            FieldKind::Text => self.open_edit(field),
        }
    }

    fn open_edit(&mut self, field: FormField) {
        if field == FormField::Username && !self.form.username().enabled {
            self.status = Some("Username follows the FQDN for this service".to_string());
            return;
        }
        self.input_state = InputState {
            mode: InputMode::Editing,
            field: Some(field),
            buffer: self.text_value(field).to_string(),
        };
    }

    pub fn text_value(&self, field: FormField) -> &str {
        match field {
            FormField::Fqdn => &self.form.fqdn().value,
            FormField::Username => &self.form.username().value,
            FormField::Password => &self.draft.password,
            FormField::Ipv4Netmask => &self.draft.ipv4_netmask,
            FormField::Ipv4HostId => &self.draft.ipv4_host_id,
            FormField::Ipv6Netmask => &self.draft.ipv6_netmask,
            FormField::Ipv6HostId => &self.draft.ipv6_host_id,
            FormField::Host => self.form.host().selected_label(),
            FormField::Service => self.form.service().selected_label(),
            FormField::Ipv4Enabled | FormField::Ipv6Enabled => "",
        }
    }

    /// Applies the edit buffer, like a browser "change" event when the input
    /// loses focus.
    fn commit_edit(&mut self) {
        let state = std::mem::take(&mut self.input_state);
        let Some(field) = state.field else {
            return;
        };
        let value = state.buffer;

        match field {
            FormField::Fqdn => self.form.edit_fqdn(value),
            FormField::Username => {
                self.form.edit_username(value);
            }
            FormField::Password => self.draft.password = value,
            FormField::Ipv4Netmask => self.draft.ipv4_netmask = value,
            FormField::Ipv4HostId => self.draft.ipv4_host_id = value,
            FormField::Ipv6Netmask => self.draft.ipv6_netmask = value,
            FormField::Ipv6HostId => self.draft.ipv6_host_id = value,
            FormField::Host
            | FormField::Service
            | FormField::Ipv4Enabled
            | FormField::Ipv6Enabled => {}
        }
    }

    fn save(&mut self) {
        let result = build_record(&self.form, &self.draft, self.created)
            .and_then(|record| store::save_record(&self.record_path, &record).map(|_| record));

        match result {
            Ok(record) => {
                self.created = record.created;
                self.error = None;
                self.status = Some(format!(
                    "Saved {} at {}",
                    record.fqdn,
                    chrono::Local::now().format("%H:%M:%S")
                ));
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "save failed");
                self.status = None;
                self.error = Some(format!("{e:#}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server;
    use crate::api::types::{HostOption, ServiceOption};
    use crate::config::BrokerConfig;
    use crossterm::event::{KeyEventKind, KeyEventState, KeyModifiers};
    use tokio::sync::mpsc;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn options() -> FormOptions {
        FormOptions {
            hosts: vec![HostOption {
                id: 1,
                fqdn: "host-a.example.com".into(),
                ipv4: Some("192.0.2.10".parse().unwrap()),
                ipv6: None,
            }],
            services: vec![ServiceOption {
                id: 4,
                name: "dyndns".into(),
            }],
        }
    }

    fn app(base_url: &str, record_path: PathBuf) -> App {
        let client = BrokerClient::new(BrokerConfig {
            base_url: base_url.to_string(),
            session_id: None,
            lookup_by_id: false,
        })
        .unwrap();
        App::new(client, options(), None, record_path)
    }

    fn send_keys(app: &mut App, tx: &UnboundedSender<Event>, codes: &[KeyCode]) {
        for code in codes {
            app.handle_event(key(*code), tx.clone());
        }
    }

    fn type_text(app: &mut App, tx: &UnboundedSender<Event>, text: &str) {
        for c in text.chars() {
            app.handle_event(key(KeyCode::Char(c)), tx.clone());
        }
    }

    #[tokio::test]
    async fn host_then_service_disables_username() {
        let server = test_server::spawn("200 OK", "true").await;
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&server.base_url, dir.path().join("record.json"));
        let (tx, mut rx) = mpsc::unbounded_channel();

        // Host row is focused; pick the first real host.
        send_keys(&mut app, &tx, &[KeyCode::Right]);
        assert_eq!(app.form.fqdn().value, "host-a.example.com");

        // Down to the service row and select it.
        for _ in 0..8 {
            send_keys(&mut app, &tx, &[KeyCode::Down]);
        }
        assert_eq!(app.focused_field(), FormField::Service);
        send_keys(&mut app, &tx, &[KeyCode::Enter]);
        assert!(app.form.lookup_pending());

        let event = rx.recv().await.unwrap();
        app.handle_event(event, tx.clone());
        assert!(!app.form.username().enabled);
        assert_eq!(app.form.username().value, "host-a.example.com");
        assert!(server.request(0).starts_with("GET /updateservice/1/get/usernameisfqdn"));

        // Editing a disabled username does not open the editor.
        send_keys(&mut app, &tx, &[KeyCode::Down, KeyCode::Enter]);
        assert_eq!(app.input_state.mode, InputMode::Normal);
    }

    #[tokio::test]
    async fn failed_lookup_shows_warning() {
        let server = test_server::spawn("403 Forbidden", "").await;
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&server.base_url, dir.path().join("record.json"));
        let (tx, mut rx) = mpsc::unbounded_channel();

        send_keys(&mut app, &tx, &[KeyCode::Right, KeyCode::BackTab, KeyCode::BackTab, KeyCode::BackTab]);
        assert_eq!(app.focused_field(), FormField::Service);
        send_keys(&mut app, &tx, &[KeyCode::Right]);

        let event = rx.recv().await.unwrap();
        app.handle_event(event, tx.clone());
        assert!(app.form.username().enabled);
        assert!(app.form.warning().unwrap().contains("403"));
    }

    #[tokio::test]
    async fn edit_and_save_record() {
        let server = test_server::spawn("200 OK", "false").await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        let mut app = app(&server.base_url, path.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();

        send_keys(&mut app, &tx, &[KeyCode::Right, KeyCode::Down, KeyCode::Enter]);
        assert_eq!(app.input_state.mode, InputMode::Editing);
        assert_eq!(app.input_state.buffer, "host-a.example.com");
        for _ in 0.."host-a.example.com".len() {
            send_keys(&mut app, &tx, &[KeyCode::Backspace]);
        }
        type_text(&mut app, &tx, "vpn.example.com");
        send_keys(&mut app, &tx, &[KeyCode::Enter]);
        assert_eq!(app.form.fqdn().value, "vpn.example.com");

        // Saving without a service fails and keeps the form.
        send_keys(&mut app, &tx, &[KeyCode::Char('s')]);
        assert_eq!(app.error.as_deref(), Some("Select an update service"));
        assert!(!path.exists());

        // Service row, then password row.
        send_keys(&mut app, &tx, &[KeyCode::BackTab, KeyCode::BackTab, KeyCode::BackTab, KeyCode::BackTab]);
        assert_eq!(app.focused_field(), FormField::Service);
        send_keys(&mut app, &tx, &[KeyCode::Enter]);
        let event = rx.recv().await.unwrap();
        app.handle_event(event, tx.clone());

        send_keys(&mut app, &tx, &[KeyCode::Down, KeyCode::Down, KeyCode::Enter]);
        assert_eq!(app.input_state.field, Some(FormField::Password));
        type_text(&mut app, &tx, "s3cret");
        send_keys(&mut app, &tx, &[KeyCode::Enter, KeyCode::Char('s')]);

        assert_eq!(app.error, None);
        let saved = store::load_record(&path).unwrap().unwrap();
        assert_eq!(saved.fqdn, "vpn.example.com");
        // The lookup copied the fqdn into the still-enabled username.
        assert_eq!(saved.username, "vpn.example.com");
        assert_eq!(saved.service, 4);
        assert_eq!(saved.password, "s3cret");
    }

    #[tokio::test]
    async fn save_waits_for_service_check() {
        let server = test_server::spawn("200 OK", "true").await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        let mut app = app(&server.base_url, path.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();
        app.draft.password = "pw".into();

        // Host, then jump to the service row and pick the service.
        send_keys(&mut app, &tx, &[KeyCode::Right, KeyCode::BackTab, KeyCode::BackTab, KeyCode::BackTab]);
        send_keys(&mut app, &tx, &[KeyCode::Right]);
        assert!(app.form.lookup_pending());

        send_keys(&mut app, &tx, &[KeyCode::Char('s')]);
        assert_eq!(
            app.error.as_deref(),
            Some("Checking the update service, try again in a moment")
        );
        assert!(!path.exists());

        let event = rx.recv().await.unwrap();
        app.handle_event(event, tx.clone());
        send_keys(&mut app, &tx, &[KeyCode::Char('s')]);

        assert_eq!(app.error, None);
        let saved = store::load_record(&path).unwrap().unwrap();
        assert_eq!(saved.username, "host-a.example.com");
    }

    #[tokio::test]
    async fn escape_cancels_edit_and_toggle_flips() {
        let server = test_server::spawn("200 OK", "false").await;
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&server.base_url, dir.path().join("record.json"));
        let (tx, _rx) = mpsc::unbounded_channel();

        send_keys(&mut app, &tx, &[KeyCode::Down, KeyCode::Enter]);
        type_text(&mut app, &tx, "ignored");
        send_keys(&mut app, &tx, &[KeyCode::Esc]);
        assert_eq!(app.form.fqdn().value, "");
        assert!(!app.should_quit);

        send_keys(&mut app, &tx, &[KeyCode::Down, KeyCode::Char(' ')]);
        assert!(!app.draft.ipv4_enabled);

        send_keys(&mut app, &tx, &[KeyCode::Char('q')]);
        assert!(app.should_quit);
    }
}
