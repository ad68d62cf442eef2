use bytes::BytesMut;
use net::{Inbound, PacketDecoder, PacketEncode, PacketEncoder, PacketFrame};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::SessionError;

const MAX_CHUNK_SIZE: usize = 1024;

/// Result of waiting for the next frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Frame(PacketFrame),
    /// Zero-length frame.
    EndOfSession,
    /// The peer closed the stream between frames.
    Closed,
}

/// A byte stream speaking length-prefixed frames.
pub struct EncodedConnection<S> {
    stream: S,
    enc: PacketEncoder,
    dec: PacketDecoder,
    buf: BytesMut,
}

impl<S> EncodedConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            enc: PacketEncoder::new(),
            dec: PacketDecoder::new(),
            buf: BytesMut::with_capacity(MAX_CHUNK_SIZE),
        }
    }

    pub async fn recv(&mut self) -> Result<Received, SessionError> {
        loop {
            match self.dec.try_next_packet()? {
                Some(Inbound::Packet(frame)) => return Ok(Received::Frame(frame)),
                Some(Inbound::EndOfSession) => return Ok(Received::EndOfSession),
                None => {}
            }

            self.buf.clear();
            self.buf.reserve(MAX_CHUNK_SIZE);
            if self.stream.read_buf(&mut self.buf).await? == 0 {
                // EOF mid-frame is a decode error, between frames a clean close
                self.dec.finish()?;
                return Ok(Received::Closed);
            }

            self.dec.queue_slice(&self.buf);
        }
    }

    /// Frames `pkt` and hands it to the socket in a single write.
    pub async fn send<P>(&mut self, pkt: &P) -> Result<(), SessionError>
    where
        P: PacketEncode,
    {
        self.enc.write_packet(pkt)?;
        let bytes = self.enc.take();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }
}
