//! Build-time configuration.
//!
//! Secrets and network names can be overridden when building, e.g.
//! `CAPTIVE_GATE_AUTH_SECRET=4711 cargo build --release`.

use std::{net::Ipv4Addr, time::Duration};

const fn env_or(value: Option<&'static str>, default: &'static str) -> &'static str {
    match value {
        Some(v) => v,
        None => default,
    }
}

/// SSID of the access point hosted by the device.
pub const AP_SSID: &str = env_or(option_env!("CAPTIVE_GATE_AP_SSID"), "ESP32-Access-Point");

/// WPA2 passphrase of the access point. Empty means an open network.
pub const AP_PASSWORD: &str = env_or(option_env!("CAPTIVE_GATE_AP_PASSWORD"), "123456789");

/// The single password accepted by the login form.
pub const AUTH_SECRET: &str = env_or(option_env!("CAPTIVE_GATE_AUTH_SECRET"), "1234");

pub const AP_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);
pub const AP_GATEWAY: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);
/// 255.255.255.0
pub const AP_NETMASK_BITS: u8 = 24;
pub const AP_CHANNEL: u8 = 1;
pub const AP_MAX_CONNECTIONS: u16 = 4;

pub const HTTP_PORT: u16 = 80;
pub const DNS_PORT: u16 = 53;
pub const DNS_TTL_SECS: u32 = 60;

/// How long the LED stays on after a successful login.
pub const SESSION_DURATION_MS: u32 = 15_000;
/// Delay before the failure page sends the browser back to the login form.
pub const FAILED_REDIRECT_MS: u32 = 5_000;

/// Largest form body the HTTP handler is willing to buffer.
pub const MAX_FORM_BYTES: usize = 512;

pub const LOOP_INTERVAL: Duration = Duration::from_millis(10);

/// Output pin driving the LED (GPIO15).
#[cfg(target_os = "espidf")]
pub type LedPin = esp_idf_svc::hal::gpio::Gpio15;
