//! Administrator sessions

use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};
use clinic_token_core::Config;
use dashmap::DashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;

/// Hash `password` into an Argon2 PHC string suitable for
/// [`Config::admin_password_hash`]
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::rand_core::OsRng;
    use argon2::password_hash::SaltString;
    use argon2::{Argon2, PasswordHasher};
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Logged-in administrators, keyed by session id
pub struct AdminSessions {
    username: String,
    password_hash: Option<String>,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    /// Session id to login time
    sessions: DashMap<Uuid, NaiveDateTime>,
}

impl AdminSessions {
    /// Create a new [`AdminSessions`] without any sessions
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        if config.admin_password_hash.is_none() {
            warn!("no administrator password hash configured, logins are disabled");
        }
        Self {
            username: config.admin_username.clone(),
            password_hash: config.admin_password_hash.clone(),
            ttl: TimeDelta::seconds(config.admin_session_ttl.into()),
            clock,
            sessions: DashMap::new(),
        }
    }

    /// Lifetime of a session in seconds
    pub fn ttl_secs(&self) -> u32 {
        self.ttl.num_seconds() as u32
    }

    /// Check the credentials and open a session
    pub fn login(&self, username: &str, password: &str) -> Option<Uuid> {
        let Some(hash) = &self.password_hash else {
            warn!(username, "administrator login rejected: logins are disabled");
            return None;
        };
        if username != self.username || !verify_password(password, hash) {
            warn!(username, "administrator login rejected: invalid credentials");
            return None;
        }

        self.clear_expired();
        let id = Uuid::new_v4();
        self.sessions.insert(id, self.clock.now());
        info!(username, "administrator logged in");
        Some(id)
    }

    /// Whether `session` belongs to a logged-in administrator
    pub fn is_admin(&self, session: Option<Uuid>) -> bool {
        self.clear_expired();
        session.is_some_and(|id| self.sessions.contains_key(&id))
    }

    /// End `session`
    ///
    /// Returns whether the session existed.
    pub fn logout(&self, session: Option<Uuid>) -> bool {
        let removed = session.and_then(|id| self.sessions.remove(&id)).is_some();
        if removed {
            info!("administrator logged out");
        }
        removed
    }

    /// Remove sessions older than the configured lifetime
    fn clear_expired(&self) {
        let now = self.clock.now();
        self.sessions
            .retain(|_, logged_in_at| now - *logged_in_at < self.ttl);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::clock::ManualClock;

    fn sessions(hash: Option<String>) -> (AdminSessions, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            NaiveDate::from_ymd_opt(2024, 5, 20)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        ));
        let config = Config {
            admin_password_hash: hash,
            admin_session_ttl: 60,
            ..Config::default()
        };
        (AdminSessions::new(&config, clock.clone()), clock)
    }

    #[test]
    fn login_checks_credentials() {
        let (sessions, _) = sessions(Some(hash_password("s3cret").unwrap()));
        assert_eq!(sessions.login("admin", "wrong"), None);
        assert_eq!(sessions.login("root", "s3cret"), None);

        let id = sessions.login("admin", "s3cret").unwrap();
        assert!(sessions.is_admin(Some(id)));
        assert!(!sessions.is_admin(Some(Uuid::new_v4())));
        assert!(!sessions.is_admin(None));

        assert!(sessions.logout(Some(id)));
        assert!(!sessions.is_admin(Some(id)));
        assert!(!sessions.logout(Some(id)));
    }

    #[test]
    fn logins_disabled_without_hash() {
        let (sessions, _) = sessions(None);
        assert_eq!(sessions.login("admin", ""), None);
        assert_eq!(sessions.login("admin", "admin123"), None);
    }

    #[test]
    fn malformed_hash_rejects_everything() {
        let (sessions, _) = sessions(Some("not a phc string".into()));
        assert_eq!(sessions.login("admin", "not a phc string"), None);
    }

    #[test]
    fn sessions_expire() {
        let (sessions, clock) = sessions(Some(hash_password("pw").unwrap()));
        let id = sessions.login("admin", "pw").unwrap();
        clock.advance(TimeDelta::seconds(59));
        assert!(sessions.is_admin(Some(id)));
        clock.advance(TimeDelta::seconds(1));
        assert!(!sessions.is_admin(Some(id)));
    }
}
