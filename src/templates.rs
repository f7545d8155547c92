// src/templates.rs

//! Configuration and zone data payloads
//!
//! The text of each file lives under `templates/` and is rendered by plain
//! `%(name)s` substitution, so output matches the shipped files byte for
//! byte. Only `named.conf` carries paths; the zone files are fixed.

use std::path::Path;

const NAMED_CONF: &str = include_str!("../templates/named.conf.in");
const LOCALHOST_ZONE: &str = include_str!("../templates/localhost.zone.in");
const NAMED_LOCAL: &str = include_str!("../templates/named.local.in");

/// File name of the main server configuration
pub const NAMED_CONF_FILE: &str = "named.conf";
/// File name of the control-channel key
pub const RNDC_KEY_FILE: &str = "rndc.key";
/// Forward zone for `localhost`
pub const LOCALHOST_ZONE_FILE: &str = "localhost.zone";
/// Reverse zone for `127.0.0.0/8`
pub const NAMED_LOCAL_FILE: &str = "named.local";

/// Paths embedded in `named.conf`
#[derive(Debug, Clone, Copy)]
pub struct NamedConfParams<'a> {
    /// Directory holding `rndc.key`
    pub etc: &'a Path,
    /// Parent of the zone directory and the log directory
    pub var: &'a Path,
}

/// Render the server configuration
///
/// Includes the key file from `etc`, sets the data directory to
/// `<var>/named` and logs to `<var>/log/named/named.log`.
pub fn named_conf(params: &NamedConfParams<'_>) -> String {
    NAMED_CONF
        .replace("%(etc)s", &params.etc.to_string_lossy())
        .replace("%(var)s", &params.var.to_string_lossy())
}

pub fn localhost_zone() -> String {
    LOCALHOST_ZONE.to_string()
}

pub fn named_local() -> String {
    NAMED_LOCAL.to_string()
}
