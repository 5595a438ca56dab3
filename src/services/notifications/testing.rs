//! In-memory protocol client recording every call in order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::xmpp::{ChatMessage, CloseMode, Connector, Jid, ProtocolClient, SessionSignal, XmppError};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Establish,
    Presence,
    Roster,
    Send(ChatMessage),
    Disconnect(CloseMode),
}

/// How `establish` behaves
#[derive(Debug, Clone)]
pub(crate) enum Establish {
    Ready,
    AuthFailed,
    Refused,
    Hang,
    /// Ready after the given delay
    Slow(Duration),
}

pub(crate) type CallLog = Arc<Mutex<Vec<Call>>>;

/// Counts connections open at the same time
#[derive(Debug, Clone, Default)]
pub(crate) struct Gauge {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl Gauge {
    fn open(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn close(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub(crate) struct FakeClient {
    pub(crate) establish: Establish,
    pub(crate) roster_hangs: bool,
    pub(crate) fail_send: bool,
    calls: CallLog,
    gauge: Gauge,
    open: bool,
}

impl FakeClient {
    pub(crate) fn new(establish: Establish) -> (Self, CallLog) {
        let calls = CallLog::default();
        let client = Self {
            establish,
            roster_hangs: false,
            fail_send: false,
            calls: Arc::clone(&calls),
            gauge: Gauge::default(),
            open: false,
        };
        (client, calls)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ProtocolClient for FakeClient {
    async fn establish(&mut self) -> Result<SessionSignal, XmppError> {
        self.record(Call::Establish);
        self.gauge.open();
        self.open = true;
        match self.establish.clone() {
            Establish::Ready => {}
            Establish::AuthFailed => {
                return Ok(SessionSignal::AuthFailed {
                    condition: "not-authorized".to_string(),
                });
            }
            Establish::Refused => {
                return Err(XmppError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )));
            }
            Establish::Hang => std::future::pending::<()>().await,
            Establish::Slow(delay) => tokio::time::sleep(delay).await,
        }
        Ok(SessionSignal::Ready {
            bound_jid: Jid::parse("bot@example.com/home-assistant").unwrap(),
        })
    }

    async fn send_presence(&mut self) -> Result<(), XmppError> {
        self.record(Call::Presence);
        Ok(())
    }

    async fn fetch_roster(&mut self) -> Result<Vec<Jid>, XmppError> {
        self.record(Call::Roster);
        if self.roster_hangs {
            std::future::pending::<()>().await;
        }
        Ok(vec![Jid::parse("alice@example.com").unwrap()])
    }

    async fn send_message(&mut self, message: &ChatMessage) -> Result<(), XmppError> {
        self.record(Call::Send(message.clone()));
        if self.fail_send {
            return Err(XmppError::Closed);
        }
        Ok(())
    }

    async fn disconnect(&mut self, mode: CloseMode) -> Result<(), XmppError> {
        self.record(Call::Disconnect(mode));
        if std::mem::take(&mut self.open) {
            self.gauge.close();
        }
        Ok(())
    }
}

/// Hands out [`FakeClient`]s sharing one call log
#[derive(Clone)]
pub(crate) struct FakeConnector {
    pub(crate) establish: Establish,
    pub(crate) calls: CallLog,
    pub(crate) gauge: Gauge,
    /// Address each client was created for
    pub(crate) clients: Arc<Mutex<Vec<Jid>>>,
}

impl FakeConnector {
    pub(crate) fn new(establish: Establish) -> Self {
        Self {
            establish,
            calls: CallLog::default(),
            gauge: Gauge::default(),
            clients: Arc::default(),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn sent(&self) -> Vec<ChatMessage> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl Connector for FakeConnector {
    type Client = FakeClient;

    fn client(&self, jid: Jid, _password: &str) -> FakeClient {
        self.clients.lock().unwrap().push(jid);
        FakeClient {
            establish: self.establish.clone(),
            roster_hangs: false,
            fail_send: false,
            calls: Arc::clone(&self.calls),
            gauge: self.gauge.clone(),
            open: false,
        }
    }
}
