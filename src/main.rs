#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use captive_gate::{
        actuator::LedActuator,
        captive_portal::CaptivePortal,
        clock::MonotonicClock,
        config::{self, LedPin},
        gate::{self, AuthGate},
    };
    use esp_idf_svc::eventloop::EspSystemEventLoop;

    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    let peripherals = esp_idf_svc::hal::prelude::Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let clock = MonotonicClock::start();

    let led_pin: LedPin = peripherals.pins.gpio15;
    let led = LedActuator::new(led_pin)?;
    let gate = AuthGate::new(led, config::AUTH_SECRET, config::SESSION_DURATION_MS).shared();

    let mut portal = CaptivePortal::start(peripherals.modem, sysloop, gate.clone(), clock)?;

    log::info!("ESP32 captive portal started");
    log::info!("AP SSID: {}", config::AP_SSID);
    log::info!("AP IP address: {}", CaptivePortal::ap_ip());
    log_heap();

    // HTTP requests are served by the httpd task; DNS and expiry run here.
    loop {
        portal.poll_dns();
        gate::lock(&gate)?.tick(clock.now_ms());
        std::thread::sleep(config::LOOP_INTERVAL);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("captive-gate is ESP-IDF firmware; run `cargo test --lib` on the host")
}

#[cfg(target_os = "espidf")]
fn log_heap() {
    unsafe {
        use esp_idf_svc::sys::{heap_caps_get_free_size, MALLOC_CAP_INTERNAL};

        log::info!(
            "Free INTERNAL heap size: {}KB",
            heap_caps_get_free_size(MALLOC_CAP_INTERNAL) / 1024
        );
    }
}
