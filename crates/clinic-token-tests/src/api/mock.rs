//! Mock API implementation directly using the `clinic-token-desk` crate

use std::sync::Arc;

use clinic_token_core::{RawRequest, Request, RequestHandler, RequestKind, SessionCookie};
use clinic_token_desk::{BookingService, Desk};
use tokio::sync::oneshot;
use tokio::task::{self, JoinHandle};

use super::{Api, RequestMsg, Response};

pub struct MockDesk {
    desk: Arc<Desk>,
    join_handles: Vec<JoinHandle<()>>,
}

struct MockRawRequest {
    payload: Option<String>,
    kind: RequestKind,
    response_channel: oneshot::Sender<Response>,
}

pub async fn start(threads: u16, desk: Desk) -> (MockDesk, Api) {
    let desk = Arc::new(desk);

    let it = (0..threads).map(|_| {
        let (sender, receiver) = flume::bounded::<RequestMsg>(65536);
        let desk = desk.clone();
        let handle = task::spawn_blocking(move || {
            let desk = &*desk;
            for msg in receiver.into_iter() {
                let raw = Box::new(MockRawRequest {
                    payload: msg.payload,
                    kind: msg.kind,
                    response_channel: msg.response_channel,
                });
                desk.handle(Request::from_raw(msg.kind, msg.session, raw))
            }
        });
        (sender, handle)
    });
    let (senders, join_handles) = it.unzip();

    let mock_desk = MockDesk { desk, join_handles };
    (mock_desk, Api::new(senders))
}

impl MockDesk {
    pub fn service(&self) -> &BookingService {
        self.desk.service()
    }

    pub async fn shutdown(self) {
        for handle in self.join_handles {
            handle.await.unwrap()
        }
        task::spawn_blocking(move || Arc::into_inner(self.desk).unwrap().shutdown())
            .await
            .unwrap();
    }
}

impl RawRequest for MockRawRequest {
    fn url(&self) -> &str {
        self.kind.path()
    }

    fn method(&self) -> clinic_token_core::RequestMethod {
        self.kind.method()
    }

    fn read_string(&mut self) -> std::io::Result<String> {
        Ok(self.payload.take().unwrap_or_default())
    }

    fn respond_with_json(self: Box<Self>, status: u16, body: String) {
        let response = Response::Json { status, body };
        self.response_channel.send(response).unwrap()
    }

    fn respond_with_redirect(self: Box<Self>, location: &str, cookie: SessionCookie) {
        let response = Response::Redirect {
            location: location.into(),
            cookie,
        };
        self.response_channel.send(response).unwrap()
    }
}
