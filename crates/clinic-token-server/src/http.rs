//! 🏗 HTTP request implementation

use std::io;
use std::io::Read;

use clinic_token_core::{RequestKind, SessionCookie};
use tiny_http::{Header, Response};
use tracing::error;

/// Booking form and administrator view
const INDEX_HTML: &str = include_str!("../static/index.html");
/// Token lookup page
const MY_TOKEN_HTML: &str = include_str!("../static/my-token.html");

struct HTTPRequest(tiny_http::Request);

impl clinic_token_core::RawRequest for HTTPRequest {
    fn url(&self) -> &str {
        self.0.url()
    }

    fn method(&self) -> clinic_token_core::RequestMethod {
        match self.0.method() {
            tiny_http::Method::Get => clinic_token_core::RequestMethod::Get,
            tiny_http::Method::Post => clinic_token_core::RequestMethod::Post,
            _ => unreachable!(),
        }
    }

    fn read_string(&mut self) -> io::Result<String> {
        let mut s = String::with_capacity(self.0.body_length().unwrap_or(0));
        self.0.as_reader().read_to_string(&mut s)?;
        Ok(s)
    }

    fn respond_with_json(self: Box<Self>, status: u16, body: String) {
        let mut res = Response::from_string(body).with_status_code(status);
        res.add_header(header("Content-Type", "application/json"));
        respond(self.0, res);
    }

    fn respond_with_redirect(self: Box<Self>, location: &str, cookie: SessionCookie) {
        let mut res = Response::empty(303);
        res.add_header(header("Location", location));
        if let Some(value) = cookie.header_value() {
            res.add_header(header("Set-Cookie", &value));
        }
        respond(self.0, res);
    }
}

/// Parse the given HTTP request
///
/// If [`None`] is returned, the request was already answered, either with a
/// static page or with a corresponding error message.
pub fn parse(rq: tiny_http::Request) -> Option<clinic_token_core::Request> {
    use tiny_http::Method::*;

    let path = rq.url().split('?').next().unwrap_or_default();
    let kind = match (rq.method(), path) {
        (Options, _) => {
            respond(rq, Response::empty(204));
            return None;
        }
        (Get, "/") => {
            respond_with_page(rq, INDEX_HTML);
            return None;
        }
        (Get, "/my-token") => {
            respond_with_page(rq, MY_TOKEN_HTML);
            return None;
        }
        (Post, "/api/book") => RequestKind::Book,
        (Post, "/api/close-today") => RequestKind::CloseToday,
        (Post, "/api/check-token") => RequestKind::CheckToken,
        (Get, "/api/bookings") => RequestKind::ListBookings,
        (Post, "/admin/login") => RequestKind::AdminLogin,
        (Get, "/admin/logout") => RequestKind::AdminLogout,
        (Get, _) | (Post, _) => {
            let res = Response::from_string(
                "🦀 could not find the page you are looking for!

Valid requests are:
  GET  /
  GET  /my-token
  POST /api/book
  POST /api/close-today
  POST /api/check-token
  GET  /api/bookings
  POST /admin/login
  GET  /admin/logout",
            )
            .with_status_code(404);
            respond(rq, res);
            return None;
        }
        _ => {
            respond(rq, Response::empty(405));
            return None;
        }
    };

    let session = rq
        .headers()
        .iter()
        .filter(|hdr| hdr.field.equiv("cookie"))
        .find_map(|hdr| SessionCookie::parse_header(hdr.value.as_str()));

    Some(clinic_token_core::Request::from_raw(
        kind,
        session,
        Box::new(HTTPRequest(rq)),
    ))
}

fn respond_with_page(rq: tiny_http::Request, page: &'static str) {
    let mut res = Response::from_string(page);
    res.add_header(header("Content-Type", "text/html; charset=utf-8"));
    respond(rq, res);
}

/// Add CORS headers to `res` and send it
fn respond<R: Read>(rq: tiny_http::Request, mut res: Response<R>) {
    add_response_cors_headers(&mut res);
    if let Err(err) = rq.respond(res) {
        error!("HTTP response failed: {err}");
    }
}

/// Build a header from ASCII `field` and `value`
fn header(field: &str, value: &str) -> Header {
    Header::from_bytes(field.as_bytes(), value.as_bytes())
        .expect("header fields and values are ASCII")
}

/// Add CORS headers to `res`
fn add_response_cors_headers<R: Read>(res: &mut Response<R>) {
    res.add_header(header("Access-Control-Request-Method", "*"));
    res.add_header(header("Access-Control-Allow-Origin", "*"));
    res.add_header(header("Access-Control-Allow-Headers", "*"));
    res.add_header(header("Access-Control-Expose-Headers", "*"));
}
