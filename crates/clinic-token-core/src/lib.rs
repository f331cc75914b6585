//! 🏗 Infrastructure for handling requests, configuration and wire payloads
#![warn(missing_docs)]

pub mod api;
mod config;
mod request;

pub use config::{parse_time, Config, ConfigError};
pub use request::{
    BodyError, RawRequest, Request, RequestHandler, RequestKind, RequestMethod, SessionCookie,
    SESSION_COOKIE,
};
