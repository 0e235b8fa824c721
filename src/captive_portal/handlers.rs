//! HTTP handlers: bridge esp-idf requests to the route dispatcher

use esp_idf_svc::{
    http::{
        server::{EspHttpConnection, EspHttpServer, Request},
        Method,
    },
    io::{Read, Write},
};

use super::routes;
use crate::{
    actuator::Actuator,
    clock::MonotonicClock,
    config::MAX_FORM_BYTES,
    gate::{self, SharedGate},
};

/// Registers a catch-all GET and POST handler; routing happens in [`routes::dispatch`].
///
/// The server must be created with `uri_match_wildcard` enabled.
pub fn register_routes<A>(
    server: &mut EspHttpServer<'static>,
    gate: SharedGate<A>,
    clock: MonotonicClock,
) -> anyhow::Result<()>
where
    A: Actuator + Send + 'static,
{
    let gate_get = gate.clone();
    server.fn_handler::<anyhow::Error, _>("/*", Method::Get, move |req| {
        handle(req, http::Method::GET, &gate_get, clock)
    })?;

    server.fn_handler::<anyhow::Error, _>("/*", Method::Post, move |req| {
        handle(req, http::Method::POST, &gate, clock)
    })?;

    Ok(())
}

fn handle<A: Actuator>(
    mut req: Request<&mut EspHttpConnection<'_>>,
    method: http::Method,
    gate: &SharedGate<A>,
    clock: MonotonicClock,
) -> anyhow::Result<()> {
    let uri = req.uri().to_string();
    let body = if method == http::Method::POST {
        match routes::read_limited(|buf| req.read(buf), MAX_FORM_BYTES)? {
            Some(body) => body,
            None => {
                // dispatched without a form, so a login attempt lands on /failed
                log::warn!(
                    "{} {}: body exceeds {} bytes, ignored",
                    method,
                    uri,
                    MAX_FORM_BYTES
                );
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let (response, remaining_ms) = {
        let mut gate = gate::lock(gate)?;
        let now = clock.now_ms();
        let response = routes::dispatch(&mut gate, now, &method, &uri, &body);
        (response, gate.remaining_ms(now))
    };
    match remaining_ms {
        Some(ms) => log::info!(
            "{} {} -> {} (session: {} ms left)",
            method,
            uri,
            response.status,
            ms
        ),
        None => log::info!("{} {} -> {}", method, uri, response.status),
    }

    let mut resp = req.into_response(
        response.status.as_u16(),
        response.status.canonical_reason(),
        &response.headers(),
    )?;
    resp.write_all(response.body.as_bytes())?;
    Ok(())
}
