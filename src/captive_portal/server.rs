//! SoftAP, HTTP server and DNS responder
//!
//! The AP is WPA2 protected with `AP_PASSWORD`; a firmware built with an empty
//! `CAPTIVE_GATE_AP_PASSWORD` runs an open network instead. DHCP hands out the
//! device itself as DNS server so the wildcard responder sees every lookup.

use std::net::{Ipv4Addr, SocketAddr};

use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    http::server::{Configuration, EspHttpServer},
    ipv4::{self, Mask, Subnet},
    netif::{EspNetif, NetifConfiguration, NetifStack},
    wifi::{
        AccessPointConfiguration, AuthMethod, BlockingWifi, Configuration as WifiConfig, EspWifi,
        WifiDriver,
    },
};

use super::{dns::DnsResponder, handlers};
use crate::{
    actuator::Actuator,
    clock::MonotonicClock,
    config::{
        AP_CHANNEL, AP_GATEWAY, AP_IP, AP_MAX_CONNECTIONS, AP_NETMASK_BITS, AP_PASSWORD, AP_SSID,
        DNS_PORT, HTTP_PORT,
    },
    gate::SharedGate,
};

/// The running portal. Dropping it stops the access point and the HTTP server.
pub struct CaptivePortal {
    _wifi: BlockingWifi<EspWifi<'static>>,
    _server: EspHttpServer<'static>,
    dns: DnsResponder,
}

impl CaptivePortal {
    pub fn start<A>(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        gate: SharedGate<A>,
        clock: MonotonicClock,
    ) -> anyhow::Result<Self>
    where
        A: Actuator + Send + 'static,
    {
        // 1. SoftAP with a fixed address
        let wifi = Self::start_ap(modem, sysloop)?;
        log::info!("SoftAP started: {}", AP_SSID);

        // 2. wildcard DNS so every hostname resolves to us
        let dns = DnsResponder::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, DNS_PORT)), AP_IP)?;

        // 3. HTTP server
        let server = Self::start_http_server(gate, clock)?;
        log::info!("HTTP server started on {}:{}", AP_IP, HTTP_PORT);

        Ok(Self {
            _wifi: wifi,
            _server: server,
            dns,
        })
    }

    /// Answers at most one pending DNS query.
    pub fn poll_dns(&mut self) -> bool {
        self.dns.poll()
    }

    pub fn ap_ip() -> Ipv4Addr {
        AP_IP
    }

    fn start_ap(
        modem: Modem,
        sysloop: EspSystemEventLoop,
    ) -> anyhow::Result<BlockingWifi<EspWifi<'static>>> {
        let ap_netif_config = NetifConfiguration {
            ip_configuration: Some(ipv4::Configuration::Router(ipv4::RouterConfiguration {
                subnet: Subnet {
                    gateway: ipv4::Ipv4Addr::from(AP_GATEWAY.octets()),
                    mask: Mask(AP_NETMASK_BITS),
                },
                dhcp_enabled: true,
                dns: Some(ipv4::Ipv4Addr::from(AP_IP.octets())),
                secondary_dns: None,
            })),
            ..NetifConfiguration::wifi_default_router()
        };
        let ap_netif = EspNetif::new_with_conf(&ap_netif_config)?;

        let driver = WifiDriver::new(modem, sysloop.clone(), None)?;

        // AP-only, the STA interface is never started
        let sta_netif = EspNetif::new(NetifStack::Sta)?;

        let mut wifi = BlockingWifi::wrap(
            EspWifi::wrap_all(driver, sta_netif, ap_netif)?,
            sysloop,
        )?;

        let auth_method = if AP_PASSWORD.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let ap_config = AccessPointConfiguration {
            ssid: AP_SSID
                .try_into()
                .map_err(|_| anyhow::anyhow!("SSID too long: {}", AP_SSID))?,
            password: AP_PASSWORD
                .try_into()
                .map_err(|_| anyhow::anyhow!("AP password too long"))?,
            ssid_hidden: false,
            channel: AP_CHANNEL,
            auth_method,
            max_connections: AP_MAX_CONNECTIONS,
            ..Default::default()
        };

        wifi.set_configuration(&WifiConfig::AccessPoint(ap_config))?;
        wifi.start()?;

        Ok(wifi)
    }

    fn start_http_server<A>(
        gate: SharedGate<A>,
        clock: MonotonicClock,
    ) -> anyhow::Result<EspHttpServer<'static>>
    where
        A: Actuator + Send + 'static,
    {
        let config = Configuration {
            http_port: HTTP_PORT,
            stack_size: 8192,
            max_uri_handlers: 4,
            uri_match_wildcard: true,
            ..Default::default()
        };

        let mut server = EspHttpServer::new(&config)?;

        handlers::register_routes(&mut server, gate, clock)?;

        Ok(server)
    }
}
