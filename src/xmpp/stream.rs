use std::time::Duration;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use super::{Element, XmppError, stanza};

/// What the server sent at the top level of the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A `<stream:stream>` header; its attributes, no children
    Opened(Element),
    /// A complete first-level element (stanza, features, SASL reply...)
    Element(Element),
    /// `</stream:stream>` or end of input
    Closed,
}

/// An XML stream over any byte transport, read one top-level element at a time.
///
/// Reads and writes are sequential; a one-shot client never needs to do both
/// at once, which lets the same value be unwrapped for the STARTTLS upgrade.
pub struct XmlStream<S> {
    reader: Reader<BufReader<S>>,
    /// Elements opened but not yet closed. Reads are not cancel-safe: a read
    /// dropped mid-element loses bytes already taken from the reader, so after
    /// a timeout the stream is only fit for writing and closing.
    stack: Vec<Element>,
}

impl<S> XmlStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(io: S) -> Self {
        let mut reader = Reader::from_reader(BufReader::new(io));
        let config = reader.config_mut();
        config.trim_text(true);
        // Restarted streams re-open <stream:stream> without closing the old one
        config.check_end_names = false;
        Self {
            reader,
            stack: Vec::new(),
        }
    }

    pub fn into_inner(self) -> S {
        self.reader.into_inner().into_inner()
    }

    pub async fn send(&mut self, xml: &str) -> Result<(), XmppError> {
        let io = self.reader.get_mut();
        io.write_all(xml.as_bytes()).await?;
        io.flush().await?;
        Ok(())
    }

    /// Opens (or restarts) the stream and returns the server's `<features/>`
    pub async fn open(&mut self, domain: &str) -> Result<Element, XmppError> {
        self.send(&stanza::stream_header(domain)).await?;

        match self.next_event().await? {
            StreamEvent::Opened(_) => {}
            StreamEvent::Element(el) => {
                return Err(XmppError::protocol(format!(
                    "expected stream header, got <{}>",
                    el.name
                )));
            }
            StreamEvent::Closed => return Err(XmppError::Closed),
        }

        let features = self.next_element().await?;
        if !features.is("features") {
            return Err(XmppError::protocol(format!(
                "expected stream features, got <{}>",
                features.name
            )));
        }
        Ok(features)
    }

    /// Next first-level element; stream errors and closes become errors
    pub async fn next_element(&mut self) -> Result<Element, XmppError> {
        match self.next_event().await? {
            StreamEvent::Element(el) if el.is("error") => Err(XmppError::Stream {
                condition: el.condition(),
            }),
            StreamEvent::Element(el) => Ok(el),
            StreamEvent::Opened(_) => Err(XmppError::protocol("unexpected stream restart")),
            StreamEvent::Closed => Err(XmppError::Closed),
        }
    }

    /// Skips unrelated stanzas until the `<iq/>` answering `id` arrives
    pub async fn await_iq(&mut self, id: &str) -> Result<Element, XmppError> {
        loop {
            let el = self.next_element().await?;
            if el.is("iq") && el.attr("id") == Some(id) {
                return Ok(el);
            }
            tracing::trace!(element = %el.name, "skipping while waiting for iq {}", id);
        }
    }

    /// Closes our side of the stream, optionally waiting for the server's
    /// closing tag, then shuts the transport down.
    pub async fn close(&mut self, wait: Option<Duration>) -> Result<(), XmppError> {
        self.send(stanza::STREAM_CLOSE).await?;

        if let Some(wait) = wait {
            let drained = tokio::time::timeout(wait, async {
                loop {
                    match self.next_event().await {
                        Ok(StreamEvent::Closed) | Err(_) => break,
                        Ok(_) => continue,
                    }
                }
            })
            .await;
            if drained.is_err() {
                tracing::debug!("server did not close the stream within {:?}", wait);
            }
        }

        self.reader.get_mut().shutdown().await?;
        Ok(())
    }

    pub async fn next_event(&mut self) -> Result<StreamEvent, XmppError> {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let event = self
                .reader
                .read_event_into_async(&mut buf)
                .await
                .map_err(XmppError::xml)?;

            match event {
                Event::Start(start) => {
                    let el = element_from(&start)?;
                    if self.stack.is_empty() && el.is("stream") {
                        return Ok(StreamEvent::Opened(el));
                    }
                    self.stack.push(el);
                }
                Event::Empty(start) => {
                    let el = element_from(&start)?;
                    match self.stack.last_mut() {
                        Some(parent) => parent.children.push(el),
                        None => return Ok(StreamEvent::Element(el)),
                    }
                }
                Event::Text(text) => {
                    if let Some(top) = self.stack.last_mut() {
                        top.text.push_str(&text.unescape().map_err(XmppError::xml)?);
                    }
                }
                Event::CData(data) => {
                    if let Some(top) = self.stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::End(_) => match self.stack.pop() {
                    // Closing tag at depth 0 is </stream:stream>
                    None => return Ok(StreamEvent::Closed),
                    Some(el) => match self.stack.last_mut() {
                        Some(parent) => parent.children.push(el),
                        None => return Ok(StreamEvent::Element(el)),
                    },
                },
                Event::Eof => {
                    if !self.stack.is_empty() {
                        return Err(XmppError::xml("connection ended inside an element"));
                    }
                    return Ok(StreamEvent::Closed);
                }
                _ => {}
            }
        }
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, XmppError> {
    let mut el = Element::new(String::from_utf8_lossy(start.local_name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(XmppError::xml)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(XmppError::xml)?.into_owned();
        el.attrs.push((key, value));
    }
    Ok(el)
}
