use super::fields::{Selector, TextField};
use super::record::Record;
use crate::api::types::{FormOptions, HostOption, ServiceOption};

/// A `usernameisfqdn` lookup the caller has to perform. The answer goes back
/// through [`FormSyncController::apply_lookup`] together with `seq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupRequest {
    pub seq: u64,
    pub service_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Applied(bool),
    /// A newer service selection superseded this lookup.
    Stale,
    Failed,
}

/// Keeps the fqdn and username fields of a record form in step with the host
/// and service selections.
///
/// The fqdn follows the selected host label until the operator types
/// something else into it. Whether it has diverged is decided by comparing
/// the current fqdn with the last host label; an fqdn edited to exactly match
/// a later host label is treated as not diverged.
///
/// The username is disabled and mirrors the fqdn while the selected service
/// reports `usernameisfqdn`.
#[derive(Debug)]
pub struct FormSyncController {
    host: Selector<HostOption>,
    fqdn: TextField,
    service: Selector<ServiceOption>,
    username: TextField,
    host_old_value: String,
    username_is_fqdn: bool,
    active: bool,
    lookup_by_id: bool,
    latest_seq: u64,
    pending: bool,
    /// Service index the pending lookup was issued for.
    requested_service: usize,
    /// Service index `username_is_fqdn` was last answered for.
    resolved_service: Option<usize>,
    warning: Option<String>,
}

impl FormSyncController {
    /// Binds a controller to a fresh form, or to one pre-filled from an
    /// existing record. Without host options the controller is inert: values
    /// still change but nothing reacts.
    pub fn bind(options: FormOptions, existing: Option<&Record>, lookup_by_id: bool) -> Self {
        let mut host = Selector::new(options.hosts);
        let mut service = Selector::new(options.services);
        let mut fqdn = TextField::default();
        let mut username = TextField::default();

        if let Some(record) = existing {
            if let Some(index) = host.position(|h| h.id == record.host) {
                host.select(index);
            }
            if let Some(index) = service.position(|s| s.id == record.service) {
                service.select(index);
            }
            fqdn.value = record.fqdn.clone();
            username.value = record.username.clone();
        }

        let active = host.has_options();
        let host_old_value = host.selected_label().to_string();

        Self {
            host,
            fqdn,
            service,
            username,
            host_old_value,
            username_is_fqdn: false,
            active,
            lookup_by_id,
            latest_seq: 0,
            pending: false,
            requested_service: 0,
            resolved_service: None,
            warning: None,
        }
    }

    pub fn host(&self) -> &Selector<HostOption> {
        &self.host
    }

    pub fn service(&self) -> &Selector<ServiceOption> {
        &self.service
    }

    pub fn fqdn(&self) -> &TextField {
        &self.fqdn
    }

    pub fn username(&self) -> &TextField {
        &self.username
    }

    pub fn host_old_value(&self) -> &str {
        &self.host_old_value
    }

    pub fn username_is_fqdn(&self) -> bool {
        self.username_is_fqdn
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn lookup_pending(&self) -> bool {
        self.pending
    }

    /// True when `username_is_fqdn` was answered for the service selected
    /// right now and no newer lookup is outstanding.
    pub fn service_resolved(&self) -> bool {
        !self.pending && self.resolved_service == Some(self.service.selected_index())
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn select_host(&mut self, index: usize) {
        self.host.select(index);
        if !self.active || self.host.selected_index() == 0 {
            return;
        }

        let label = self.host.selected_label().to_string();
        if self.fqdn.value.is_empty() || self.fqdn.value == self.host_old_value {
            tracing::debug!(fqdn = %label, "fqdn follows host");
            self.set_fqdn(label.clone());
        }
        self.host_old_value = label;
    }

    pub fn select_service(&mut self, index: usize) -> Option<LookupRequest> {
        self.service.select(index);
        if !self.active {
            return None;
        }
        self.lookup_for_selected_service()
    }

    /// Lookup for a service that was already selected when the form was
    /// bound, so an edited record starts with the right username state.
    pub fn initial_lookup(&mut self) -> Option<LookupRequest> {
        if !self.active {
            return None;
        }
        self.lookup_for_selected_service()
    }

    fn lookup_for_selected_service(&mut self) -> Option<LookupRequest> {
        let index = self.service.selected_index();
        if index == 0 {
            return None;
        }

        let service_id = if self.lookup_by_id {
            self.service.selected()?.id
        } else {
            u32::try_from(index).ok()?
        };

        self.latest_seq += 1;
        self.pending = true;
        self.requested_service = index;
        Some(LookupRequest {
            seq: self.latest_seq,
            service_id,
        })
    }

    pub fn apply_lookup(&mut self, seq: u64, result: Result<bool, String>) -> LookupOutcome {
        if seq != self.latest_seq {
            tracing::debug!(seq, latest = self.latest_seq, "dropping stale usernameisfqdn response");
            return LookupOutcome::Stale;
        }
        self.pending = false;

        match result {
            Ok(username_is_fqdn) => {
                self.username.enabled = !username_is_fqdn;
                self.username.value = self.fqdn.value.clone();
                self.username_is_fqdn = username_is_fqdn;
                self.resolved_service = Some(self.requested_service);
                self.warning = None;
                LookupOutcome::Applied(username_is_fqdn)
            }
            Err(e) => {
                tracing::warn!(error = %e, "usernameisfqdn lookup failed");
                self.resolved_service = None;
                self.warning = Some(format!(
                    "Could not check whether the service uses the FQDN as username: {e}"
                ));
                LookupOutcome::Failed
            }
        }
    }

    pub fn edit_fqdn(&mut self, value: impl Into<String>) {
        self.set_fqdn(value.into());
    }

    fn set_fqdn(&mut self, value: String) {
        if self.active && self.username_is_fqdn {
            self.username.value = value.clone();
        }
        self.fqdn.value = value;
    }

    /// Returns `false` and leaves the value alone while the field is disabled.
    pub fn edit_username(&mut self, value: impl Into<String>) -> bool {
        if !self.username.enabled {
            return false;
        }
        self.username.value = value.into();
        true
    }
}
