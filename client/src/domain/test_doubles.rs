//! Hand-written doubles shared by the domain service tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::Session;
use super::ports::{
    ApiTransport, ApiTransportError, InMemorySessionStore, OutboundRequest, TransportResponse,
};

type ScriptedReply = Result<TransportResponse, ApiTransportError>;

/// Transport that replays canned replies in order and records every request.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<ScriptedReply>>,
    sent: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn sent(&self) -> Vec<OutboundRequest> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub(crate) fn sent_paths(&self) -> Vec<String> {
        self.sent().into_iter().map(|request| request.path).collect()
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn send(
        &self,
        request: &OutboundRequest,
    ) -> Result<TransportResponse, ApiTransportError> {
        self.sent.lock().expect("sent lock").push(request.clone());
        self.replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| Err(ApiTransportError::transport("no scripted reply left")))
    }
}

pub(crate) fn ok(body: &Value) -> ScriptedReply {
    Ok(TransportResponse::json(200, body))
}

pub(crate) fn status(status: u16, body: &Value) -> ScriptedReply {
    Ok(TransportResponse::json(status, body))
}

pub(crate) fn session(access: &str, refresh: &str) -> Session {
    Session::try_from_parts(access, refresh).expect("valid session")
}

pub(crate) fn store_with(access: &str, refresh: &str) -> Arc<InMemorySessionStore> {
    Arc::new(InMemorySessionStore::with_session(session(access, refresh)))
}
