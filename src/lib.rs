//! Captive-portal login gate for the ESP32.
//!
//! Clients joining the device's access point land on a login page; the
//! right password switches an LED on for a fixed session.

pub mod actuator;
pub mod captive_portal;
pub mod clock;
pub mod config;
pub mod gate;
