//! HTTP webhook the certificate controller uses to drive the [solver][crate::solver].
//!
//! # API Endpoints
//!
//! ## `/healthcheck` (GET)
//!
//!   Returns HTTP 200 (OK) and the JSON body `{"ok":"healthy"}` when the service is operational.
//!
//! ## `/apis/:group/:version/:solver` (POST)
//!
//!   Expects a JSON challenge payload of the form:
//!
//!   ```json
//!   {
//!     "apiVersion": "webhook.acme.cert-manager.io/v1alpha1",
//!     "kind": "ChallengePayload",
//!     "request": {
//!       "uid": "6d9a5e8b",
//!       "action": "Present",
//!       "type": "dns-01",
//!       "dnsName": "example.com",
//!       "key": "LPsIwTo7o8BoG0-vjCyGQGBWSVIPxI-i_X336eUOQZo",
//!       "resolvedFQDN": "_acme-challenge.example.com.",
//!       "resolvedZone": "example.com."
//!     }
//!   }
//!   ```
//!
//!  Where `:group` must match [`Config::group_name`][crate::config::Config::group_name] and
//!  `:solver` the solver's [name][crate::solver::Solver::name], otherwise HTTP 404 (Not Found)
//!  is returned. `action` is either `Present` or `CleanUp`.
//!
//!  Returns HTTP 200 (OK) and the payload with its `request` replaced by a `response`:
//!
//!  ```json
//!  {
//!    "apiVersion": "webhook.acme.cert-manager.io/v1alpha1",
//!    "kind": "ChallengePayload",
//!    "response": { "uid": "6d9a5e8b", "success": true }
//!  }
//!  ```
//!
//!  When the solver fails `success` is `false` and `status.message` holds the error.

mod api_error;
mod model;
mod routes;
pub mod server;

pub use server::{new, router};
