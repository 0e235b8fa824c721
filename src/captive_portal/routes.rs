//! Route table and request dispatch, independent of the HTTP server.

use std::borrow::Cow;

use http::{Method, StatusCode};

use super::html;
use crate::{actuator::Actuator, gate::AuthGate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Login page, or a redirect to `/success` while authenticated.
    Portal,
    Authenticate,
    Logout,
    Success,
    Failed,
}

/// Every OS probe path is served exactly like `/`:
/// Android `/generate_204`, Windows `/fwlink`, Apple `/hotspot-detect.html`.
static ROUTES: [(Method, &str, Route); 8] = [
    (Method::GET, "/", Route::Portal),
    (Method::GET, "/generate_204", Route::Portal),
    (Method::GET, "/fwlink", Route::Portal),
    (Method::GET, "/hotspot-detect.html", Route::Portal),
    (Method::POST, "/authenticate", Route::Authenticate),
    (Method::POST, "/logout", Route::Logout),
    (Method::GET, "/success", Route::Success),
    (Method::GET, "/failed", Route::Failed),
];

pub fn lookup(method: &Method, uri: &str) -> Option<Route> {
    let (path, _) = split_query(uri);
    ROUTES
        .iter()
        .find(|(m, p, _)| m == method && *p == path)
        .map(|(_, _, route)| *route)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub location: Option<&'static str>,
    pub body: Cow<'static, str>,
}

impl Response {
    fn html(body: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "text/html",
            location: None,
            body: body.into(),
        }
    }

    fn redirect(location: &'static str) -> Self {
        Self {
            status: StatusCode::FOUND,
            content_type: "text/plain",
            location: Some(location),
            body: Cow::Borrowed("Redirecting..."),
        }
    }

    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            content_type: "text/plain",
            location: None,
            body: Cow::Borrowed("Not found"),
        }
    }

    pub fn headers(&self) -> Vec<(&'static str, &'static str)> {
        let mut headers = vec![("Content-Type", self.content_type)];
        if let Some(location) = self.location {
            headers.push(("Location", location));
        }
        headers
    }
}

/// Serves one request against the gate.
///
/// `uri` may carry a query string; `body` is the raw request body.
pub fn dispatch<A: Actuator>(
    gate: &mut AuthGate<A>,
    now_ms: u32,
    method: &Method,
    uri: &str,
    body: &[u8],
) -> Response {
    let Some(route) = lookup(method, uri) else {
        log::warn!("No route for {} {}", method, uri);
        return Response::not_found();
    };

    match route {
        Route::Portal => {
            if gate.is_authenticated() {
                Response::redirect("/success")
            } else {
                Response::html(html::LOGIN_HTML)
            }
        }
        Route::Authenticate => {
            let password = submitted_password(uri, body);
            // a missing field counts as a wrong password
            let ok = password.is_some_and(|p| gate.authenticate(&p, now_ms));
            if ok {
                Response::redirect("/success")
            } else {
                Response::redirect("/failed")
            }
        }
        Route::Logout => {
            gate.logout();
            Response::redirect("/")
        }
        Route::Success => Response::html(html::success_page()),
        Route::Failed => Response::html(html::failed_page()),
    }
}

/// Reads a request body through `read` in chunks, giving up once it grows past `limit`.
///
/// An oversized body yields `Ok(None)` and the remainder is left unread.
pub fn read_limited<E>(
    mut read: impl FnMut(&mut [u8]) -> Result<usize, E>,
    limit: usize,
) -> Result<Option<Vec<u8>>, E> {
    let mut body = Vec::new();
    let mut buf = [0u8; 128];
    loop {
        let len = read(&mut buf)?;
        if len == 0 {
            return Ok(Some(body));
        }
        if body.len() + len > limit {
            return Ok(None);
        }
        body.extend_from_slice(&buf[..len]);
    }
}

/// `password` from the form body, falling back to the query string.
fn submitted_password(uri: &str, body: &[u8]) -> Option<String> {
    let from_body = std::str::from_utf8(body)
        .ok()
        .and_then(|body| form_field(body, "password"));
    from_body.or_else(|| split_query(uri).1.and_then(|q| form_field(q, "password")))
}

fn split_query(uri: &str) -> (&str, Option<&str>) {
    match uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (uri, None),
    }
}

/// Value of the first `name` pair in an `application/x-www-form-urlencoded` string.
pub fn form_field(encoded: &str, name: &str) -> Option<String> {
    encoded
        .split('&')
        .filter_map(|pair| match pair.split_once('=') {
            Some((k, v)) => Some((k, v)),
            None if !pair.is_empty() => Some((pair, "")),
            None => None,
        })
        .find(|(k, _)| url_decode(k) == name)
        .map(|(_, v)| url_decode(v))
}

/// `+` becomes a space and `%XX` a byte; malformed escapes are kept literally.
fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .filter(|h| h.iter().all(u8::is_ascii_hexdigit))
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                match hex {
                    Some(b) => {
                        out.push(b);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}
