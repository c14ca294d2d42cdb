use super::controller::FormSyncController;
use crate::api::types::HostOption;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// A DNS record as the broker stores it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Record {
    pub host: u32,
    pub fqdn: String,
    pub ipv4_enabled: bool,
    pub ipv6_enabled: bool,
    pub ipv4_netmask: u8,
    pub ipv4_host_id: Ipv4Addr,
    pub ipv6_netmask: u8,
    pub ipv6_host_id: Ipv6Addr,
    pub service: u32,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            host: 0,
            fqdn: String::new(),
            ipv4_enabled: true,
            ipv6_enabled: true,
            ipv4_netmask: 32,
            ipv4_host_id: Ipv4Addr::UNSPECIFIED,
            ipv6_netmask: 128,
            ipv6_host_id: Ipv6Addr::UNSPECIFIED,
            service: 0,
            username: String::new(),
            password: String::new(),
            created: None,
        }
    }
}

/// The "record composition" and password fields, kept as typed text until
/// the record is built.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub ipv4_enabled: bool,
    pub ipv6_enabled: bool,
    pub ipv4_netmask: String,
    pub ipv4_host_id: String,
    pub ipv6_netmask: String,
    pub ipv6_host_id: String,
    pub password: String,
}

impl Default for RecordDraft {
    fn default() -> Self {
        Self::from_record(&Record::default())
    }
}

impl RecordDraft {
    pub fn from_record(record: &Record) -> Self {
        Self {
            ipv4_enabled: record.ipv4_enabled,
            ipv6_enabled: record.ipv6_enabled,
            ipv4_netmask: record.ipv4_netmask.to_string(),
            ipv4_host_id: record.ipv4_host_id.to_string(),
            ipv6_netmask: record.ipv6_netmask.to_string(),
            ipv6_host_id: record.ipv6_host_id.to_string(),
            password: record.password.clone(),
        }
    }

    /// Effective addresses the record would get on the given host.
    pub fn preview(&self, host: &HostOption) -> (AddressPreview<Ipv4Addr>, AddressPreview<Ipv6Addr>) {
        let v4 = preview_address(
            host.ipv4,
            parse_netmask(&self.ipv4_netmask, 32).ok(),
            self.ipv4_host_id.trim().parse().ok(),
            effective_ipv4,
        );
        let v6 = preview_address(
            host.ipv6,
            parse_netmask(&self.ipv6_netmask, 128).ok(),
            self.ipv6_host_id.trim().parse().ok(),
            effective_ipv6,
        );
        (v4, v6)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressPreview<A> {
    Address(A),
    /// The host has no address of this family.
    NoHostAddress,
    InvalidNetmask,
    InvalidHostId,
}

fn preview_address<A: Copy>(
    host_ip: Option<A>,
    netmask: Option<u8>,
    host_id: Option<A>,
    combine: fn(A, u8, A) -> A,
) -> AddressPreview<A> {
    let Some(netmask) = netmask else {
        return AddressPreview::InvalidNetmask;
    };
    let Some(host_id) = host_id else {
        return AddressPreview::InvalidHostId;
    };
    match host_ip {
        Some(ip) => AddressPreview::Address(combine(ip, netmask, host_id)),
        None => AddressPreview::NoHostAddress,
    }
}

/// Combines the synced fields and the draft into a record, applying the
/// broker's save rules: an empty fqdn falls back to the host's fqdn, and a
/// service that uses the fqdn as username gets the fqdn as username.
pub fn build_record(
    form: &FormSyncController,
    draft: &RecordDraft,
    created: Option<DateTime<Utc>>,
) -> Result<Record> {
    let host = form.host().selected().context("Select a host")?;
    let service = form.service().selected().context("Select an update service")?;
    // The username rule below depends on the answer for this exact service.
    if form.lookup_pending() {
        bail!("Checking the update service, try again in a moment");
    }
    if !form.service_resolved() {
        bail!("Service lookup failed, reselect the update service");
    }

    if draft.password.is_empty() {
        bail!("Password is required");
    }

    let ipv4_netmask = parse_netmask(&draft.ipv4_netmask, 32).context("Invalid IPv4 netmask")?;
    let ipv6_netmask = parse_netmask(&draft.ipv6_netmask, 128).context("Invalid IPv6 netmask")?;
    let ipv4_host_id = draft
        .ipv4_host_id
        .trim()
        .parse::<Ipv4Addr>()
        .context("Invalid IPv4 host identifier")?;
    let ipv6_host_id = draft
        .ipv6_host_id
        .trim()
        .parse::<Ipv6Addr>()
        .context("Invalid IPv6 host identifier")?;

    let fqdn = if form.fqdn().value.is_empty() {
        host.fqdn.clone()
    } else {
        form.fqdn().value.clone()
    };
    let username = if form.username_is_fqdn() {
        fqdn.clone()
    } else {
        form.username().value.clone()
    };

    Ok(Record {
        host: host.id,
        fqdn,
        ipv4_enabled: draft.ipv4_enabled,
        ipv6_enabled: draft.ipv6_enabled,
        ipv4_netmask,
        ipv4_host_id,
        ipv6_netmask,
        ipv6_host_id,
        service: service.id,
        username,
        password: draft.password.clone(),
        created: created.or_else(|| Some(Utc::now())),
    })
}

fn parse_netmask(raw: &str, max: u8) -> Result<u8> {
    let value: u8 = raw
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a number", raw.trim()))?;
    if value > max {
        bail!("must be at most {max}, got {value}");
    }
    Ok(value)
}

/// Network prefix of `host_ip/netmask` combined with the host part of
/// `host_id`.
pub fn effective_ipv4(host_ip: Ipv4Addr, netmask: u8, host_id: Ipv4Addr) -> Ipv4Addr {
    let host_mask = u32::MAX.checked_shr(u32::from(netmask)).unwrap_or(0);
    let network = u32::from(host_ip) & !host_mask;
    Ipv4Addr::from(network | (u32::from(host_id) & host_mask))
}

pub fn effective_ipv6(host_ip: Ipv6Addr, netmask: u8, host_id: Ipv6Addr) -> Ipv6Addr {
    let host_mask = u128::MAX.checked_shr(u32::from(netmask)).unwrap_or(0);
    let network = u128::from(host_ip) & !host_mask;
    Ipv6Addr::from(network | (u128::from(host_id) & host_mask))
}

/// IPv4-mapped IPv6 addresses are reported as plain IPv4; anything that
/// does not parse is returned unchanged.
pub fn normalize_ip(raw: &str) -> String {
    let raw = raw.trim();
    match raw.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        Ok(ip) => ip.to_string(),
        Err(_) => raw.to_string(),
    }
}
