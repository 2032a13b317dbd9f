use crate::config::Config;

pub(crate) const ACME_CHALLENGE_PREFIX: &str = "_acme-challenge.";

/// How a single question relates to what this server is responsible for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Classification {
    /// A direct `_acme-challenge.` lookup. `key` is the store key to consult.
    AcmeChallenge { key: String },
    /// A name under the authoritative zone, reached through `CNAME`/`NS` delegation. `key` is
    /// the `_acme-challenge.` form of the name with the zone suffix removed.
    DelegatedUnderZone { key: String },
    /// The authoritative zone apex itself.
    ZoneApex,
    OutOfScope,
}

/// Classify the lower-cased, fully qualified query name `qname`.
pub(crate) fn classify(qname: &str, config: &Config) -> Classification {
    if qname.starts_with(ACME_CHALLENGE_PREFIX) {
        return Classification::AcmeChallenge {
            key: qname.to_string(),
        };
    }

    let Some(zone) = &config.authoritative_zone else {
        return Classification::OutOfScope;
    };
    let zone = zone.to_lowercase().to_ascii();

    if qname == zone {
        return Classification::ZoneApex;
    }

    match qname.strip_suffix(&zone).and_then(|n| n.strip_suffix('.')) {
        Some(delegated) if !delegated.is_empty() => Classification::DelegatedUnderZone {
            key: format!("{ACME_CHALLENGE_PREFIX}{delegated}."),
        },
        _ => Classification::OutOfScope,
    }
}
