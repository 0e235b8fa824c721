//! Captive portal: SoftAP, wildcard DNS and the login web pages.
//!
//! `routes`, `html` and `dns` have no hardware dependencies; `server` and
//! `handlers` wire them into esp-idf.

pub mod dns;
pub mod html;
pub mod routes;

#[cfg(target_os = "espidf")]
mod handlers;
#[cfg(target_os = "espidf")]
mod server;

#[cfg(target_os = "espidf")]
pub use server::CaptivePortal;
