use std::sync::Arc;

use clinic_token_core::api::{
    BookForm, BookReply, BookingsReply, CheckTokenForm, StatusReply, TokenReply,
};
use clinic_token_core::{RequestKind, SessionCookie};
use eyre::{eyre, Result};
use flume::Sender;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

pub mod mock;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Error {status}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, PartialEq, Eq)]
pub enum Response {
    Json { status: u16, body: String },
    Redirect { location: String, cookie: SessionCookie },
}

impl Response {
    fn into_api_result<T: DeserializeOwned>(self, kind: RequestKind) -> Result<ApiResult<T>> {
        match self {
            Response::Json { status: 200, body } => Ok(Ok(serde_json::from_str(&body)?)),
            Response::Json { status, body } => {
                let reply: StatusReply = serde_json::from_str(&body)?;
                if reply.success {
                    return Err(eyre!("{kind:?} answered {status} with success"));
                }
                Ok(Err(ApiError {
                    status,
                    message: reply.message,
                }))
            }
            resp => panic!("{kind:?} must not be answered by {resp:?}"),
        }
    }

    fn into_redirect(self, kind: RequestKind) -> SessionCookie {
        match self {
            Response::Redirect { location, cookie } => {
                assert_eq!(location, "/", "{kind:?} must redirect to the home page");
                cookie
            }
            resp => panic!("{kind:?} must not be answered by {resp:?}"),
        }
    }
}

struct RequestMsg {
    kind: RequestKind,
    payload: Option<String>,
    session: Option<Uuid>,
    response_channel: oneshot::Sender<Response>,
}

pub struct Api {
    /// One channel per worker thread
    channels: Arc<Vec<Sender<RequestMsg>>>,

    my_channel: Sender<RequestMsg>,
    my_index: usize,
}

impl Api {
    fn new(channels: Vec<Sender<RequestMsg>>) -> Self {
        let my_channel = channels[0].clone();
        Self {
            channels: Arc::new(channels),
            my_channel,
            my_index: 0,
        }
    }
}

impl Clone for Api {
    fn clone(&self) -> Self {
        let my_index = (self.my_index + 1) % self.channels.len();
        Self {
            channels: self.channels.clone(),
            my_channel: self.channels[my_index].clone(),
            my_index,
        }
    }
}

const NO_REQUEST_OPTIONS: RequestOptions = RequestOptions { session: None };

impl Api {
    /// Send a raw request and wait for its response
    pub async fn make_request(
        &self,
        kind: RequestKind,
        payload: Option<String>,
        options: &RequestOptions,
    ) -> Result<Response> {
        let (sender, receiver) = oneshot::channel();
        let msg = RequestMsg {
            kind,
            payload,
            session: options.session,
            response_channel: sender,
        };
        self.my_channel.send_async(msg).await?;
        Ok(receiver.await?)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        kind: RequestKind,
        body: &B,
        options: &RequestOptions,
    ) -> Result<ApiResult<T>> {
        let payload = serde_json::to_string(body)?;
        let response = self.make_request(kind, Some(payload), options);
        response.await?.into_api_result(kind)
    }

    pub async fn book(&self, name: &str, phone: &str, date: &str) -> Result<ApiResult<BookReply>> {
        let form = BookForm {
            name: name.into(),
            phone: phone.into(),
            date: date.into(),
        };
        self.post_json(RequestKind::Book, &form, &NO_REQUEST_OPTIONS)
            .await
    }

    pub async fn check_token(&self, phone: &str) -> Result<ApiResult<TokenReply>> {
        let form = CheckTokenForm {
            phone: phone.into(),
        };
        self.post_json(RequestKind::CheckToken, &form, &NO_REQUEST_OPTIONS)
            .await
    }

    pub async fn close_today(&self, options: &RequestOptions) -> Result<ApiResult<StatusReply>> {
        let kind = RequestKind::CloseToday;
        let response = self.make_request(kind, None, options);
        response.await?.into_api_result(kind)
    }

    pub async fn bookings(&self, options: &RequestOptions) -> Result<ApiResult<BookingsReply>> {
        let kind = RequestKind::ListBookings;
        let response = self.make_request(kind, None, options);
        response.await?.into_api_result(kind)
    }

    /// Submit the login form, returning the cookie change
    pub async fn admin_login(&self, username: &str, password: &str) -> Result<SessionCookie> {
        let kind = RequestKind::AdminLogin;
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", username)
            .append_pair("password", password)
            .finish();
        let response = self.make_request(kind, Some(form), &NO_REQUEST_OPTIONS);
        Ok(response.await?.into_redirect(kind))
    }

    pub async fn admin_logout(&self, options: &RequestOptions) -> Result<SessionCookie> {
        let kind = RequestKind::AdminLogout;
        let response = self.make_request(kind, None, options);
        Ok(response.await?.into_redirect(kind))
    }

    /// Log in and keep the session
    pub async fn create_admin_session(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminSession> {
        match self.admin_login(username, password).await? {
            SessionCookie::Set { id, .. } => Ok(AdminSession {
                api: self,
                session: id,
            }),
            cookie => Err(eyre!("login did not hand out a session: {cookie:?}")),
        }
    }
}

pub struct AdminSession<'a> {
    pub api: &'a Api,
    pub session: Uuid,
}

impl<'a> AdminSession<'a> {
    fn request_options(&self) -> RequestOptions {
        RequestOptions {
            session: Some(self.session),
        }
    }

    pub async fn close_today(&self) -> Result<ApiResult<StatusReply>> {
        self.api.close_today(&self.request_options()).await
    }

    pub async fn bookings(&self) -> Result<ApiResult<BookingsReply>> {
        self.api.bookings(&self.request_options()).await
    }

    pub async fn logout(self) -> Result<SessionCookie> {
        self.api.admin_logout(&self.request_options()).await
    }
}

#[derive(Copy, Clone, Default)]
pub struct RequestOptions {
    pub session: Option<Uuid>,
}
