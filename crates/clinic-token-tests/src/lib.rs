use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use clinic_token_core::Config;
use clinic_token_desk::{BookingService, ManualClock};
use eyre::{eyre, Result};

mod api;
pub use api::{AdminSession, Api, ApiError, ApiResult, RequestOptions, Response};

pub struct TestCtxBuilder {
    /// Configuration of the token desk
    pub config: Config,
    /// Count of worker threads
    pub worker_threads: u16,
    /// Local date and time the desk's clock starts at
    pub now: NaiveDateTime,
}

impl TestCtxBuilder {
    /// Create a new test context builder with the default configuration,
    /// standing at 10:00 on 2024-05-20
    pub fn new() -> Self {
        TestCtxBuilder {
            config: Config::default(),
            worker_threads: 2,
            now: NaiveDate::from_ymd_opt(2024, 5, 20)
                .and_then(|d| d.and_hms_opt(10, 0, 0))
                .expect("valid start time"),
        }
    }

    /// Set the number of tokens per day
    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens_per_day = tokens;
        self
    }

    /// Set the number of worker threads to use
    pub fn with_worker_threads(mut self, threads: u16) -> Self {
        assert_ne!(threads, 0);
        self.worker_threads = threads;
        self
    }

    /// Start the clock at `now`, given as `YYYY-MM-DD HH:MM:SS`
    pub fn at(mut self, now: &str) -> Result<Self> {
        self.now = parse_datetime(now)?;
        Ok(self)
    }

    /// Enable administrator logins with `password`
    pub fn with_admin_password(mut self, password: &str) -> Result<Self> {
        let hash = clinic_token_desk::hash_password(password)
            .map_err(|err| eyre!("could not hash password: {err}"))?;
        self.config.admin_password_hash = Some(hash);
        Ok(self)
    }

    /// Require an administrator session for closing today
    pub fn with_close_requires_admin(mut self) -> Self {
        self.config.close_requires_admin = true;
        self
    }

    /// Keep today's booked count when closing today
    pub fn keep_count_on_close(mut self) -> Self {
        self.config.close_resets_count = false;
        self
    }

    /// Build the test context
    pub async fn build(self) -> Result<TestCtx> {
        let clock = Arc::new(ManualClock::new(self.now));
        let desk = clinic_token_desk::launch_with_clock(&self.config, clock.clone());
        let (desk, api) = api::mock::start(self.worker_threads, desk).await;

        Ok(TestCtx {
            api,
            desk,
            clock,
            config: self.config,
            drop_bomb: DropBomb,
        })
    }
}

impl Default for TestCtxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Test context
pub struct TestCtx {
    /// API allowing to interact with the token desk
    pub api: Api,
    desk: api::mock::MockDesk,
    clock: Arc<ManualClock>,
    /// Configuration the desk was launched with
    pub config: Config,

    drop_bomb: DropBomb,
}

impl TestCtx {
    /// The booking service behind the desk, for inspecting its state
    pub fn service(&self) -> &BookingService {
        self.desk.service()
    }

    /// Move the desk's clock to `now`, given as `YYYY-MM-DD HH:MM:SS`
    pub fn set_now(&self, now: &str) -> Result<()> {
        self.clock.set(parse_datetime(now)?);
        Ok(())
    }

    /// Move the desk's clock forward
    pub fn advance(&self, delta: TimeDelta) {
        self.clock.advance(delta);
    }

    /// Shut the token desk down and finish the test
    pub async fn finish(self) {
        std::mem::forget(self.drop_bomb);
        drop(self.api);
        self.desk.shutdown().await;
    }
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    Ok(NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")?)
}

struct DropBomb;

impl Drop for DropBomb {
    fn drop(&mut self) {
        eprintln!("@TestAuthor: You should call `ctx.finish().await` to shut the token desk down");
    }
}
