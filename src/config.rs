use crate::error::Error;
use std::borrow::Cow;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use trust_dns_proto::rr::Name;

pub type Shared = Arc<Config>;

const DEFAULT_DNS_PORT: u16 = 53;
const DEFAULT_API_BIND_ADDR: &str = "0.0.0.0:8443";
const DEFAULT_API_TIMEOUT_SECS: u64 = 10;
const DEFAULT_EXTERNAL_SERVER_ADDRESS: &str = "localhost.";

/// Process configuration. Built once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Webhook API group this solver is registered under.
    pub group_name: String,
    pub dns_udp_bind_addr: SocketAddr,
    /// Publicly reachable name of this server, used as the `NS` target and `SOA` mname.
    pub external_server_address: Name,
    /// Zone apex this server answers authoritatively for, if any.
    pub authoritative_zone: Option<Name>,
    pub hostmaster_email: String,
    pub api_bind_addr: SocketAddr,
    pub api_timeout: Duration,
}

impl Config {
    /// Build a [`Config`] from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::try_from_vars`].
    pub fn try_from_env() -> Result<Self, Error> {
        Self::try_from_vars(|key| std::env::var(key).ok())
    }

    /// Build a [`Config`] from the variables returned by `var`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfig`] if `GROUP_NAME` is unset, or if
    /// `AUTHORITATIVE_ZONE_NAME` is set without `EXTERNAL_SERVER_ADDRESS`.
    ///
    /// Returns [`Error::InvalidConfig`] if a port, address, timeout or DNS name can't be parsed.
    pub fn try_from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let var = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let group_name = var("GROUP_NAME").ok_or(Error::MissingConfig("GROUP_NAME"))?;

        let port = match var("PORT") {
            None => DEFAULT_DNS_PORT,
            Some(port) => port.parse().map_err(|_| Error::InvalidConfig {
                key: "PORT",
                value: port,
            })?,
        };

        let authoritative_zone = var("AUTHORITATIVE_ZONE_NAME")
            .map(|zone| fqdn("AUTHORITATIVE_ZONE_NAME", &zone))
            .transpose()?;

        let external_server_address = match var("EXTERNAL_SERVER_ADDRESS") {
            Some(addr) => fqdn("EXTERNAL_SERVER_ADDRESS", &addr)?,
            None if authoritative_zone.is_some() => {
                return Err(Error::MissingConfig("EXTERNAL_SERVER_ADDRESS"))
            }
            None => fqdn("EXTERNAL_SERVER_ADDRESS", DEFAULT_EXTERNAL_SERVER_ADDRESS)?,
        };

        let api_bind_addr = var("API_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_API_BIND_ADDR.to_string());
        let api_bind_addr = api_bind_addr.parse().map_err(|_| Error::InvalidConfig {
            key: "API_BIND_ADDR",
            value: api_bind_addr,
        })?;

        let api_timeout = match var("API_TIMEOUT_SECS") {
            None => DEFAULT_API_TIMEOUT_SECS,
            Some(secs) => secs.parse().map_err(|_| Error::InvalidConfig {
                key: "API_TIMEOUT_SECS",
                value: secs,
            })?,
        };

        let conf = Config {
            group_name,
            dns_udp_bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
            external_server_address,
            authoritative_zone,
            hostmaster_email: var("HOSTMASTER_EMAIL_ADDRESS").unwrap_or_default(),
            api_bind_addr,
            api_timeout: Duration::from_secs(api_timeout),
        };
        conf.ns_admin().map_err(|_| Error::InvalidConfig {
            key: "HOSTMASTER_EMAIL_ADDRESS",
            value: conf.hostmaster_email.clone(),
        })?;
        Ok(conf)
    }

    /// The `SOA` rname derived from the hostmaster email address, falling back to the external
    /// server address when no email is configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DNSError`] if the derived name is not a valid DNS name.
    pub fn ns_admin(&self) -> Result<Name, Error> {
        if self.hostmaster_email.is_empty() {
            return Ok(self.external_server_address.clone());
        }
        let admin = self.sanitized_ns_admin();
        let admin = admin.trim_end_matches('.');
        Ok(Name::from_ascii(format!("{admin}."))?.to_lowercase())
    }

    fn sanitized_ns_admin(&self) -> Cow<str> {
        match self.hostmaster_email.split_once('@') {
            Some((user, domain)) => {
                let user = user.replace('.', "\\.");
                Cow::Owned(format!("{user}.{domain}"))
            }
            _ => Cow::Borrowed(&self.hostmaster_email),
        }
    }
}

/// Parse `name` as a lower-cased, fully qualified DNS name, tolerating any number of leading or
/// trailing dots.
fn fqdn(key: &'static str, name: &str) -> Result<Name, Error> {
    let trimmed = name.trim_matches('.');
    Name::from_ascii(format!("{trimmed}."))
        .map(|n| n.to_lowercase())
        .map_err(|_| Error::InvalidConfig {
            key,
            value: name.to_string(),
        })
}
