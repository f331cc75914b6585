use std::io;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::api::StatusReply;

/// Name of the cookie carrying the administrator session id
pub const SESSION_COOKIE: &str = "clinic_session";

/// Kind of the request
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum RequestKind {
    /// Book a token for a date
    ///
    /// The payload is a JSON object with `name`, `phone` and `date`.
    Book,

    /// Emergency-close today's bookings
    CloseToday,

    /// Look up the first token booked with a phone number
    ///
    /// The payload is a JSON object with `phone`.
    CheckToken,

    /// Start an administrator session
    ///
    /// The payload is a URL-encoded form with `username` and `password`.
    AdminLogin,

    /// End the administrator session
    AdminLogout,

    /// List all bookings (administrators only)
    ListBookings,
}

impl RequestKind {
    /// Path this kind of request is served at
    pub fn path(&self) -> &'static str {
        match self {
            RequestKind::Book => "/api/book",
            RequestKind::CloseToday => "/api/close-today",
            RequestKind::CheckToken => "/api/check-token",
            RequestKind::AdminLogin => "/admin/login",
            RequestKind::AdminLogout => "/admin/logout",
            RequestKind::ListBookings => "/api/bookings",
        }
    }

    /// Method this kind of request is served with
    pub fn method(&self) -> RequestMethod {
        match self {
            RequestKind::AdminLogout | RequestKind::ListBookings => RequestMethod::Get,
            _ => RequestMethod::Post,
        }
    }
}

/// HTTP request method
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum RequestMethod {
    /// GET request
    Get,
    /// POST request, may have a payload
    Post,
}

/// Change to the session cookie sent along with a response
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionCookie {
    /// Leave the client's cookie as it is
    Unchanged,
    /// Hand out a new session id
    Set {
        /// The session id
        id: Uuid,
        /// Lifetime of the cookie in seconds
        max_age: u32,
    },
    /// Expire the client's cookie
    Clear,
}

impl SessionCookie {
    /// Value of the `Set-Cookie` header, if any
    pub fn header_value(&self) -> Option<String> {
        match self {
            SessionCookie::Unchanged => None,
            SessionCookie::Set { id, max_age } => Some(format!(
                "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}",
                id.hyphenated()
            )),
            SessionCookie::Clear => Some(format!(
                "{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0"
            )),
        }
    }

    /// Extract the session id from a `Cookie` request header
    pub fn parse_header(header: &str) -> Option<Uuid> {
        header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name == SESSION_COOKIE {
                Uuid::parse_str(value.trim()).ok()
            } else {
                None
            }
        })
    }
}

/// Failure to read a request payload
#[derive(Debug, Error)]
pub enum BodyError {
    /// Communication error
    #[error("Invalid request body")]
    Io(#[from] io::Error),
    /// The payload does not have the expected shape
    #[error("Invalid request body")]
    Json(#[from] serde_json::Error),
}

/// Request sent from a web browser
pub struct Request {
    kind: RequestKind,
    session: Option<Uuid>,
    raw: Box<dyn RawRequest + Send>,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("kind", &self.kind)
            .field("session", &self.session)
            .field("raw", &format_args!(".."))
            .finish()
    }
}

/// Interface for handling requests from a web browser
pub trait RequestHandler {
    /// Handle a request from a web browser
    ///
    /// This method may be called concurrently from different threads.
    fn handle(&self, request: Request);

    /// Shut the handler down
    fn shutdown(self);
}

/// A raw request, implemented by the HTTP server
///
/// 📌 Hint: You should not need to interact with this trait (unless you create
/// your own testing infrastructure).
pub trait RawRequest {
    /// Get the URL
    fn url(&self) -> &str;
    /// Get the request method
    fn method(&self) -> RequestMethod;

    /// Read the request body as string
    fn read_string(&mut self) -> io::Result<String>;

    /// Respond with a JSON document
    fn respond_with_json(self: Box<Self>, status: u16, body: String);
    /// Respond with a redirect to `location`
    fn respond_with_redirect(self: Box<Self>, location: &str, cookie: SessionCookie);
}

impl Request {
    /// Get the request's kind
    #[inline]
    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    /// Get the session id sent by the client, if present
    #[inline]
    pub fn session_id(&self) -> Option<Uuid> {
        self.session
    }

    /// Get the request URL
    #[inline]
    #[allow(unused)]
    pub fn url(&self) -> &str {
        self.raw.url()
    }

    /// Get the request method
    #[inline]
    #[allow(unused)]
    pub fn method(&self) -> RequestMethod {
        self.raw.method()
    }

    /// Read the payload provided by the web browser as a UTF-8 string
    ///
    /// 📌 Hint: This method has side effects and should be called only once
    /// per request.
    #[inline]
    pub fn read_string(&mut self) -> io::Result<String> {
        self.raw.read_string()
    }

    /// Read the payload as a JSON document of type `T`
    ///
    /// Like [`Self::read_string()`], this method has side effects and should
    /// be called only once per request.
    pub fn read_json<T: DeserializeOwned>(&mut self) -> Result<T, BodyError> {
        let body = self.raw.read_string()?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Respond with `body` serialized as JSON
    ///
    /// This method blocks until the response has been sent.
    pub fn respond_with_json<T: Serialize>(self, status: u16, body: &T) {
        match serde_json::to_string(body) {
            Ok(body) => self.raw.respond_with_json(status, body),
            Err(_) => self.raw.respond_with_json(
                500,
                String::from(r#"{"success":false,"message":"Internal error"}"#),
            ),
        }
    }

    /// Respond with `{"success": false, "message": msg}`
    ///
    /// This method blocks until the response has been sent.
    #[inline]
    pub fn respond_with_err(self, status: u16, msg: impl Into<String>) {
        self.respond_with_json(status, &StatusReply::failure(msg))
    }

    /// Redirect the browser to `location`, updating its session cookie
    ///
    /// This method blocks until the response has been sent.
    #[inline]
    pub fn respond_with_redirect(self, location: &str, cookie: SessionCookie) {
        self.raw.respond_with_redirect(location, cookie)
    }

    /// Create a new request from a [`RawRequest`]
    ///
    /// 📌 Hint: Normally, there should not be a need to use this function
    /// (unless you create your own testing infrastructure).
    #[inline]
    pub fn from_raw(
        kind: RequestKind,
        session: Option<Uuid>,
        raw: Box<dyn RawRequest + Send>,
    ) -> Self {
        Self { kind, session, raw }
    }
}
