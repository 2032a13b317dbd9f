//! DNS server answering [RFC-8555][RFC-8555] [DNS-01] challenge lookups over UDP.
//!
//! Each question in a query is classified by name, then answered from the
//! [TXT store][crate::txt_store] or from the zone settings in the [`Config`][crate::config::Config].
//! Every synthesized record has a TTL of 5 seconds.
//!
//! # Challenge Lookups
//!
//! Names starting with `_acme-challenge.` are looked up in the TXT store as-is. If a value has
//! been [presented][crate::solver::Solver::present] for the name a `TXT` query returns it:
//!
//! ```bash
//! ❯ dig @127.0.0.1 -p 5353 +short _acme-challenge.test1.example.com TXT
//! "LPsIwTo7o8BoG0-vjCyGQGBWSVIPxI-i_X336eUOQZo"
//! ```
//!
//! Otherwise the response is `NXDOMAIN`. A name that has a value but is queried for another type
//! gets an empty `NOERROR` response with the zone `SOA` in the authority section.
//!
//! # Authoritative Zone
//!
//! When [`Config::authoritative_zone`][crate::config::Config::authoritative_zone] is set, e.g.
//! to `acme.example.org`, the server also answers for that zone:
//!
//! * `NS` queries for the apex return
//!   [`Config::external_server_address`][crate::config::Config::external_server_address].
//! * `SOA` queries for the apex, or any name under it, return a synthesized `SOA` with the
//!   external server address as mname, the hostmaster email as rname and the current Unix
//!   timestamp as serial:
//!
//! ```bash
//! ❯ dig @127.0.0.1 -p 5353 +short acme.example.org SOA
//! ns.example.org. hostmaster.example.org. 1678630522 5 5 1209600 5
//! ```
//!
//! * Names under the zone are treated as delegated challenge lookups. The zone suffix is removed
//!   and `_acme-challenge.` prepended before consulting the TXT store, so a parent zone can
//!   `CNAME` `_acme-challenge.test1.example.com` to `test1.example.com.acme.example.org`. `A` and
//!   `AAAA` queries for such names that have no value are answered `FORMERR`.
//!
//! # Everything Else
//!
//! Questions for any other name are answered `NXDOMAIN` without the authoritative flag, so
//! resolvers don't wait for a timeout. Messages that aren't standard queries get no reply.
//!
//! [RFC-8555]: https://www.rfc-editor.org/rfc/rfc8555
//! [DNS-01]: https://www.rfc-editor.org/rfc/rfc8555#section-8.4

pub(crate) mod classify;
mod handlers;
pub mod server;

pub use server::new;
