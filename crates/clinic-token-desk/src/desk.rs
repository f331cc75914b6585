//! Implementation of the front desk
use clinic_token_core::api::{
    BookForm, BookReply, BookingsReply, CheckTokenForm, DayReport, StatusReply, TokenReply,
};
use clinic_token_core::{Request, RequestHandler, RequestKind, SessionCookie};
use tracing::{debug, info, warn};

use crate::service::BookingService;
use crate::sessions::AdminSessions;

/// Where the browser is sent after logging in or out
const HOME: &str = "/";

/// Implementation of the front desk
///
/// Answers every request kind by consulting the [`BookingService`] and the
/// [`AdminSessions`]. Requests may be handled concurrently.
pub struct Desk {
    service: BookingService,
    sessions: AdminSessions,
    close_requires_admin: bool,
}

impl Desk {
    /// Create a new [`Desk`]
    pub fn new(
        service: BookingService,
        sessions: AdminSessions,
        close_requires_admin: bool,
    ) -> Self {
        Self {
            service,
            sessions,
            close_requires_admin,
        }
    }

    /// The booking service behind this desk
    pub fn service(&self) -> &BookingService {
        &self.service
    }

    fn book(&self, mut rq: Request) {
        let form: BookForm = match rq.read_json() {
            Ok(form) => form,
            Err(err) => return rq.respond_with_err(400, err.to_string()),
        };
        match self.service.book(&form.name, &form.phone, &form.date) {
            Ok(grant) => rq.respond_with_json(
                200,
                &BookReply {
                    success: true,
                    message: String::from("Token booked successfully"),
                    token: grant.token,
                    date: grant.date,
                },
            ),
            Err(err) => {
                debug!(reason = err.tag(), "booking rejected");
                rq.respond_with_err(400, err.to_string())
            }
        }
    }

    fn check_token(&self, mut rq: Request) {
        let form: CheckTokenForm = match rq.read_json() {
            Ok(form) => form,
            Err(err) => return rq.respond_with_err(400, err.to_string()),
        };
        let reply = match self.service.check_token(&form.phone) {
            Some((date, booking)) => TokenReply {
                success: true,
                found: true,
                name: Some(booking.name),
                date: Some(date),
                token: Some(booking.token),
                status: Some(booking.status),
                booked_at: Some(booking.booked_at),
            },
            None => TokenReply {
                success: true,
                found: false,
                ..TokenReply::default()
            },
        };
        rq.respond_with_json(200, &reply);
    }

    fn login(&self, mut rq: Request) {
        let body = match rq.read_string() {
            Ok(body) => body,
            Err(err) => {
                warn!("could not read login form: {err}");
                String::new()
            }
        };
        let mut username = String::new();
        let mut password = String::new();
        for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
            match key.as_ref() {
                "username" => username = value.into_owned(),
                "password" => password = value.into_owned(),
                _ => {}
            }
        }

        // The browser is sent home either way.
        let cookie = match self.sessions.login(&username, &password) {
            Some(id) => SessionCookie::Set {
                id,
                max_age: self.sessions.ttl_secs(),
            },
            None => SessionCookie::Unchanged,
        };
        rq.respond_with_redirect(HOME, cookie);
    }

    fn list_bookings(&self, rq: Request) {
        let days = self
            .service
            .bookings()
            .into_iter()
            .map(|day| DayReport {
                date: day.date,
                available: day.availability.available,
                booked_count: day.availability.booked_count,
                bookings: day.bookings.into_iter().map(Into::into).collect(),
            })
            .collect();
        rq.respond_with_json(
            200,
            &BookingsReply {
                success: true,
                today: self.service.today(),
                days,
            },
        );
    }
}

impl RequestHandler for Desk {
    fn handle(&self, rq: Request) {
        match rq.kind() {
            RequestKind::Book => self.book(rq),
            RequestKind::CheckToken => self.check_token(rq),
            RequestKind::CloseToday => {
                if self.close_requires_admin && !self.sessions.is_admin(rq.session_id()) {
                    rq.respond_with_err(401, "Admin login required");
                } else {
                    self.service.close_today();
                    rq.respond_with_json(200, &StatusReply::ok("Today's OPD closed"));
                }
            }
            RequestKind::AdminLogin => self.login(rq),
            RequestKind::AdminLogout => {
                self.sessions.logout(rq.session_id());
                rq.respond_with_redirect(HOME, SessionCookie::Clear);
            }
            RequestKind::ListBookings => {
                if self.sessions.is_admin(rq.session_id()) {
                    self.list_bookings(rq);
                } else {
                    rq.respond_with_err(401, "Admin login required");
                }
            }
        }
    }

    fn shutdown(self) {
        info!("desk shut down");
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use clinic_token_core::{Config, RawRequest, RequestMethod};
    use parking_lot::Mutex;

    use super::*;
    use crate::clock::ManualClock;

    /// Reply recorded by [`BrokenBody`]
    #[derive(Debug, PartialEq, Eq)]
    enum Reply {
        Json(u16),
        Redirect(String, SessionCookie),
    }

    /// A request whose body can never be read
    struct BrokenBody {
        kind: RequestKind,
        reply: Arc<Mutex<Option<Reply>>>,
    }

    impl RawRequest for BrokenBody {
        fn url(&self) -> &str {
            self.kind.path()
        }

        fn method(&self) -> RequestMethod {
            self.kind.method()
        }

        fn read_string(&mut self) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
        }

        fn respond_with_json(self: Box<Self>, status: u16, _body: String) {
            *self.reply.lock() = Some(Reply::Json(status));
        }

        fn respond_with_redirect(self: Box<Self>, location: &str, cookie: SessionCookie) {
            *self.reply.lock() = Some(Reply::Redirect(location.into(), cookie));
        }
    }

    fn desk() -> Desk {
        let clock = Arc::new(ManualClock::new(
            NaiveDate::from_ymd_opt(2024, 5, 20)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        ));
        crate::launch_with_clock(&Config::default(), clock)
    }

    fn send(desk: &Desk, kind: RequestKind) -> Option<Reply> {
        let reply = Arc::new(Mutex::new(None));
        let raw = BrokenBody {
            kind,
            reply: reply.clone(),
        };
        desk.handle(Request::from_raw(kind, None, Box::new(raw)));
        let reply = reply.lock().take();
        reply
    }

    #[test]
    fn unreadable_login_form_redirects_without_session() {
        assert_eq!(
            send(&desk(), RequestKind::AdminLogin),
            Some(Reply::Redirect(HOME.into(), SessionCookie::Unchanged))
        );
    }

    #[test]
    fn unreadable_bodies_are_rejected() {
        let desk = desk();
        assert_eq!(send(&desk, RequestKind::Book), Some(Reply::Json(400)));
        assert_eq!(send(&desk, RequestKind::CheckToken), Some(Reply::Json(400)));
        assert!(desk.service().bookings().is_empty());
    }
}
