use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::http::parser::{parse_http_request, ParseError};
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::rest::router::Router;

/// Upper bound on buffered, still-unparsed request bytes.
const MAX_PENDING_BYTES: usize = 64 * 1024;

pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    router: Arc<Router>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, router: Arc<Router>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            router,
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    match self.read_request().await {
                        Ok(Some(req)) => {
                            self.state = ConnectionState::Processing(req);
                        }
                        Ok(None) => {
                            self.state = ConnectionState::Closed;
                        }
                        Err(e) => {
                            // Answer once, then drop the connection
                            tracing::warn!(error = %e, "Rejecting malformed request");
                            let response = Response::error(StatusCode::BadRequest, "malformed request");
                            let writer = ResponseWriter::new(&response);
                            self.state = ConnectionState::Writing(writer, false);
                        }
                    }
                }

                ConnectionState::Processing(req) => {
                    let keep_alive = req.keep_alive();
                    let mut response = self.router.dispatch(req).await;
                    if !keep_alive {
                        response.headers.insert("Connection".to_string(), "close".to_string());
                    }

                    let writer = ResponseWriter::new(&response);
                    self.state = ConnectionState::Writing(writer, keep_alive);
                }

                ConnectionState::Writing(writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    if *keep_alive {
                        self.state = ConnectionState::Reading; // go back for next request
                    } else {
                        self.state = ConnectionState::Closed;
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    pub async fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.advance(consumed);
                    return Ok(Some(request));
                }

                Err(ParseError::Incomplete) => {
                    if self.buffer.len() > MAX_PENDING_BYTES {
                        anyhow::bail!("request exceeds {} bytes", MAX_PENDING_BYTES);
                    }
                }

                Err(e) => {
                    return Err(anyhow::anyhow!("HTTP parse error: {:?}", e));
                }
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                // Client closed connection
                return Ok(None);
            }
        }
    }
}
