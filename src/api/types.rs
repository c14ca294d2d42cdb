use crate::form::fields::Labeled;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HostOption {
    pub id: u32,
    pub fqdn: String,
    #[serde(default)]
    pub ipv4: Option<Ipv4Addr>,
    #[serde(default)]
    pub ipv6: Option<Ipv6Addr>,
}

impl Labeled for HostOption {
    fn label(&self) -> &str {
        &self.fqdn
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServiceOption {
    pub id: u32,
    pub name: String,
}

impl Labeled for ServiceOption {
    fn label(&self) -> &str {
        &self.name
    }
}

/// Option lists for the record form's host and service drop-downs, in the
/// order the admin page renders them.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FormOptions {
    #[serde(default)]
    pub hosts: Vec<HostOption>,
    #[serde(default)]
    pub services: Vec<ServiceOption>,
}

impl FormOptions {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read form options {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse form options {}", path.display()))
    }
}
