//! Network implementation of [`ProtocolClient`].

use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, lookup_host};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tracing::{debug, trace};
use uuid::Uuid;

use super::protocol::{ChatMessage, CloseMode, ProtocolClient, SessionSignal};
use super::{DEFAULT_PORT, Element, Jid, XmlStream, XmppError, stanza};

type Transport = XmlStream<TlsStream<TcpStream>>;

/// TLS client configuration shared by every session
static TLS_CONFIG: LazyLock<Arc<ClientConfig>> = LazyLock::new(|| {
    let roots = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    Arc::new(
        ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth(),
    )
});

/// Where to connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// `host` or `host:port` to use instead of the account's domain
    pub server: Option<String>,
    /// Port used when `server` does not name one
    pub port: u16,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            server: None,
            port: DEFAULT_PORT,
        }
    }
}

impl ConnectOptions {
    /// Host and port to dial for an account on `domain`
    pub fn target(&self, domain: &str) -> (String, u16) {
        match self.server.as_deref() {
            None => (domain.to_string(), self.port),
            Some(server) => match server.rsplit_once(':') {
                Some((host, port)) => match port.parse() {
                    Ok(port) => (host.to_string(), port),
                    Err(_) => (server.to_string(), self.port),
                },
                None => (server.to_string(), self.port),
            },
        }
    }
}

/// Jabber client for a single connection.
///
/// Uses mandatory STARTTLS, SASL PLAIN and IPv4 only.
pub struct XmppClient {
    jid: Jid,
    password: String,
    options: ConnectOptions,
    /// Suffix shared by this connection's stanza ids
    id_seed: String,
    stream: Option<Transport>,
    bound_jid: Option<Jid>,
}

impl std::fmt::Debug for XmppClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmppClient")
            .field("jid", &self.jid)
            .field("options", &self.options)
            .field("connected", &self.stream.is_some())
            .field("bound_jid", &self.bound_jid)
            .finish_non_exhaustive()
    }
}

impl XmppClient {
    /// `jid` should carry the resource to bind
    pub fn new(jid: Jid, password: &str, options: ConnectOptions) -> Self {
        Self {
            jid,
            password: password.to_string(),
            options,
            id_seed: Uuid::new_v4().simple().to_string(),
            stream: None,
            bound_jid: None,
        }
    }

    fn stream(&mut self) -> Result<&mut Transport, XmppError> {
        self.stream.as_mut().ok_or(XmppError::NotConnected)
    }

    /// Each kind of request goes out at most once per connection
    fn stanza_id(&self, kind: &str) -> String {
        format!("{}-{}", kind, self.id_seed)
    }

    async fn open_tcp(&self) -> Result<TcpStream, XmppError> {
        let (host, port) = self.options.target(self.jid.domain());

        // IPv6 is disabled for this client
        let addrs: Vec<SocketAddr> = lookup_host((host.as_str(), port))
            .await
            .map_err(|e| XmppError::Resolve(format!("{}: {}", host, e)))?
            .filter(SocketAddr::is_ipv4)
            .collect();

        if addrs.is_empty() {
            return Err(XmppError::Resolve(format!("no IPv4 address for {}", host)));
        }

        let mut last_error = None;
        for addr in addrs {
            debug!(%addr, "connecting");
            match TcpStream::connect(addr).await {
                Ok(tcp) => {
                    tcp.set_nodelay(true)?;
                    return Ok(tcp);
                }
                Err(e) => {
                    debug!(%addr, error = %e, "connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .map(XmppError::Io)
            .unwrap_or_else(|| XmppError::Resolve(format!("no reachable address for {}", host))))
    }

    async fn start_tls(&self, tcp: TcpStream) -> Result<Transport, XmppError> {
        let domain = self.jid.domain();
        let mut plain = XmlStream::new(tcp);
        request_starttls(&mut plain, domain).await?;

        let server_name = ServerName::try_from(domain.to_string())
            .map_err(|e| XmppError::Tls(format!("invalid server name {}: {}", domain, e)))?;
        let tls = TlsConnector::from(Arc::clone(&TLS_CONFIG))
            .connect(server_name, plain.into_inner())
            .await
            .map_err(|e| XmppError::Tls(e.to_string()))?;

        trace!("TLS established");
        Ok(XmlStream::new(tls))
    }

    /// Authenticates and binds on an encrypted stream
    async fn login<S>(&self, stream: &mut XmlStream<S>) -> Result<SessionSignal, XmppError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        if let Some(condition) = self.authenticate(stream).await? {
            return Ok(SessionSignal::AuthFailed { condition });
        }
        let bound_jid = self.bind(stream).await?;
        Ok(SessionSignal::Ready { bound_jid })
    }

    /// Runs SASL PLAIN; `Some(condition)` when the server rejects the credentials
    async fn authenticate<S>(&self, stream: &mut XmlStream<S>) -> Result<Option<String>, XmppError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let features = stream.open(self.jid.domain()).await?;
        let offers_plain = features
            .child("mechanisms")
            .map(|m| {
                m.children
                    .iter()
                    .any(|c| c.is("mechanism") && c.text.eq_ignore_ascii_case("PLAIN"))
            })
            .unwrap_or(false);
        if !offers_plain {
            return Err(XmppError::protocol("server does not offer SASL PLAIN"));
        }

        let username = self.jid.node().unwrap_or_default();
        stream
            .send(&stanza::sasl_plain(username, &self.password))
            .await?;

        let reply = stream.next_element().await?;
        match reply.name.as_str() {
            "success" => Ok(None),
            "failure" => Ok(Some(reply.condition())),
            other => Err(XmppError::protocol(format!(
                "unexpected <{}> in SASL negotiation",
                other
            ))),
        }
    }

    async fn bind<S>(&self, stream: &mut XmlStream<S>) -> Result<Jid, XmppError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let features = stream.open(self.jid.domain()).await?;
        if !features.has_child("bind") {
            return Err(XmppError::protocol("server does not offer resource binding"));
        }

        let resource = self.jid.resource().unwrap_or(super::DEFAULT_RESOURCE);
        let id = self.stanza_id("bind");
        stream.send(&stanza::bind_request(&id, resource)).await?;
        let reply = stream.await_iq(&id).await?;
        if reply.attr("type") != Some("result") {
            return Err(XmppError::protocol(format!(
                "resource binding rejected: {}",
                reply.child("error").map(Element::condition).unwrap_or_default()
            )));
        }

        let bound = match reply.child("bind").and_then(|b| b.child("jid")) {
            Some(jid) => Jid::parse(jid.text.trim())?,
            None => self.jid.clone(),
        };

        // RFC 3921 session establishment, unless the server marks it optional
        if let Some(session) = features.child("session")
            && !session.has_child("optional")
        {
            let id = self.stanza_id("sess");
            stream.send(&stanza::session_request(&id)).await?;
            let reply = stream.await_iq(&id).await?;
            if reply.attr("type") != Some("result") {
                return Err(XmppError::protocol("session establishment rejected"));
            }
        }

        Ok(bound)
    }
}

/// Asks for the TLS upgrade on a plaintext stream; Ok once the server sent `<proceed/>`
async fn request_starttls<S>(stream: &mut XmlStream<S>, domain: &str) -> Result<(), XmppError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let features = stream.open(domain).await?;
    if !features.has_child("starttls") {
        return Err(XmppError::Tls("server does not offer STARTTLS".to_string()));
    }

    stream.send(&stanza::starttls()).await?;
    let reply = stream.next_element().await?;
    match reply.name.as_str() {
        "proceed" => Ok(()),
        "failure" => Err(XmppError::Tls("server refused STARTTLS".to_string())),
        other => Err(XmppError::protocol(format!(
            "unexpected <{}> in STARTTLS negotiation",
            other
        ))),
    }
}

#[async_trait]
impl ProtocolClient for XmppClient {
    async fn establish(&mut self) -> Result<SessionSignal, XmppError> {
        let tcp = self.open_tcp().await?;
        let mut stream = self.start_tls(tcp).await?;
        let signal = self.login(&mut stream).await?;

        if let SessionSignal::Ready { bound_jid } = &signal {
            debug!(jid = %bound_jid, "session ready");
            self.bound_jid = Some(bound_jid.clone());
        }
        // Kept after an auth failure too so disconnect can close it cleanly
        self.stream = Some(stream);
        Ok(signal)
    }

    async fn send_presence(&mut self) -> Result<(), XmppError> {
        self.stream()?.send(stanza::PRESENCE).await
    }

    async fn fetch_roster(&mut self) -> Result<Vec<Jid>, XmppError> {
        let id = self.stanza_id("roster");
        let stream = self.stream()?;
        stream.send(&stanza::roster_request(&id)).await?;
        let reply = stream.await_iq(&id).await?;

        if reply.attr("type") != Some("result") {
            return Err(XmppError::protocol("roster request rejected"));
        }

        Ok(reply
            .child("query")
            .map(|query| {
                query
                    .children
                    .iter()
                    .filter(|item| item.is("item"))
                    .filter_map(|item| item.attr("jid"))
                    .filter_map(|jid| Jid::parse(jid).ok())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn send_message(&mut self, message: &ChatMessage) -> Result<(), XmppError> {
        let from = self.bound_jid.clone().ok_or(XmppError::NotConnected)?;
        let xml = stanza::chat_message(&self.stanza_id("msg"), &from, &message.to, &message.body);
        self.stream()?.send(&xml).await
    }

    async fn disconnect(&mut self, mode: CloseMode) -> Result<(), XmppError> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        self.bound_jid = None;

        let wait = match mode {
            CloseMode::Graceful(wait) => Some(wait),
            CloseMode::Abort => None,
        };
        stream.close(wait).await
    }
}
