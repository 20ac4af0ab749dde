//! Wire messages and stream framing.
//!
//! Every message on the byte stream is one frame: a 4-byte little-endian payload
//! length followed by that many bytes of bincode. A stream read never has to guess
//! where one message ends.

use bincode::{deserialize, serialize};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec::WorldSnapshot;
use crate::intent::Intent;
use crate::physics::Arena;

pub const HEADER_LEN: usize = 4;
/// Largest payload accepted from a peer.
pub const MAX_FRAME_LEN: usize = 1 << 20;

const READ_CHUNK: usize = 4096;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    /// Server -> client handshake: "this is your player".
    Join { uuid: u64, arena: Arena },
    /// Server -> client, in place of `Join` when the server is full.
    Rejected { reason: String },
    /// Server -> client, periodic full world state.
    Snapshot(WorldSnapshot),
    /// Client -> server, the client's current control intent.
    Intent(Intent),
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("connection closed by peer")]
    Closed,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame of {0} bytes exceeds the frame size limit")]
    TooLarge(usize),
    #[error("malformed payload: {0}")]
    Malformed(#[from] bincode::Error),
}

impl FrameError {
    /// Fatal errors leave the stream unusable. A malformed payload is skipped and
    /// the next frame still lines up.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FrameError::Malformed(_))
    }
}

/// Serializes `packet` into one length-prefixed frame.
pub fn encode_frame(packet: &Packet) -> Result<Vec<u8>, FrameError> {
    let payload = serialize(packet)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(payload.len()));
    }

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

pub async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(packet)?;
    write_frame(writer, &frame).await
}

/// Buffered frame decoder over any async byte stream.
///
/// Partially received frames stay in the reader's own buffer, so
/// [`FrameReader::read_packet`] can be wrapped in a timeout and abandoned without
/// losing stream alignment.
pub struct FrameReader<R> {
    inner: R,
    buffer: Vec<u8>,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: Vec::with_capacity(READ_CHUNK),
        }
    }

    /// Waits for the next complete frame and decodes it.
    pub async fn read_packet(&mut self) -> Result<Packet, FrameError> {
        loop {
            if let Some(result) = self.next_buffered() {
                return result;
            }

            self.buffer.reserve(READ_CHUNK);
            let read = self.inner.read_buf(&mut self.buffer).await?;
            if read == 0 {
                return Err(FrameError::Closed);
            }
        }
    }

    /// Decodes one frame that is already fully buffered, without touching the stream.
    pub fn next_buffered(&mut self) -> Option<Result<Packet, FrameError>> {
        if self.buffer.len() < HEADER_LEN {
            return None;
        }

        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&self.buffer[..HEADER_LEN]);
        let len = u32::from_le_bytes(header) as usize;
        if len > MAX_FRAME_LEN {
            return Some(Err(FrameError::TooLarge(len)));
        }
        if self.buffer.len() < HEADER_LEN + len {
            return None;
        }

        let frame: Vec<u8> = self.buffer.drain(..HEADER_LEN + len).collect();
        Some(deserialize(&frame[HEADER_LEN..]).map_err(FrameError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::Vector2;
    use tokio_test::io::Builder;

    fn intent_packet() -> Packet {
        Packet::Intent(Intent {
            move_left: true,
            shoot: true,
            look_target: Vector2::new(12.0, 34.0),
            ..Intent::default()
        })
    }

    #[test]
    fn test_frame_header_matches_payload() {
        let packet = Packet::Join {
            uuid: 42,
            arena: Arena::default(),
        };
        let frame = encode_frame(&packet).unwrap();

        let len = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(len, frame.len() - HEADER_LEN);
        assert_eq!(deserialize::<Packet>(&frame[HEADER_LEN..]).unwrap(), packet);
    }

    #[test]
    fn test_frame_split_across_reads() {
        let packet = intent_packet();
        let frame = encode_frame(&packet).unwrap();
        let mock = Builder::new()
            .read(&frame[..2])
            .read(&frame[2..7])
            .read(&frame[7..])
            .build();

        let mut reader = FrameReader::new(mock);
        let received = tokio_test::block_on(reader.read_packet()).unwrap();
        assert_eq!(received, packet);
    }

    #[test]
    fn test_two_frames_in_one_read() {
        let first = Packet::Join {
            uuid: 1,
            arena: Arena::default(),
        };
        let second = intent_packet();
        let mut bytes = encode_frame(&first).unwrap();
        bytes.extend(encode_frame(&second).unwrap());
        let mock = Builder::new().read(&bytes).build();

        let mut reader = FrameReader::new(mock);
        assert_eq!(tokio_test::block_on(reader.read_packet()).unwrap(), first);
        // The second frame arrived with the first and is already buffered.
        assert_eq!(reader.next_buffered().unwrap().unwrap(), second);
        assert!(reader.next_buffered().is_none());
    }

    #[test]
    fn test_oversized_header_is_fatal() {
        let header = ((MAX_FRAME_LEN + 1) as u32).to_le_bytes();
        let mock = Builder::new().read(&header).build();

        let mut reader = FrameReader::new(mock);
        let err = tokio_test::block_on(reader.read_packet()).unwrap_err();
        assert!(matches!(err, FrameError::TooLarge(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_malformed_payload_is_skipped() {
        let garbage = [0xFFu8; 6];
        let mut bytes = (garbage.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(&garbage);
        bytes.extend(encode_frame(&intent_packet()).unwrap());
        let mock = Builder::new().read(&bytes).build();

        let mut reader = FrameReader::new(mock);
        let err = tokio_test::block_on(reader.read_packet()).unwrap_err();
        assert!(matches!(err, FrameError::Malformed(_)));
        assert!(!err.is_fatal());

        let next = tokio_test::block_on(reader.read_packet()).unwrap();
        assert_eq!(next, intent_packet());
    }

    #[test]
    fn test_eof_is_closed() {
        let mock = Builder::new().build();
        let mut reader = FrameReader::new(mock);

        let err = tokio_test::block_on(reader.read_packet()).unwrap_err();
        assert!(matches!(err, FrameError::Closed));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_eof_mid_frame_is_closed() {
        let frame = encode_frame(&intent_packet()).unwrap();
        let mock = Builder::new().read(&frame[..frame.len() - 1]).build();
        let mut reader = FrameReader::new(mock);

        let err = tokio_test::block_on(reader.read_packet()).unwrap_err();
        assert!(matches!(err, FrameError::Closed));
    }

    #[test]
    fn test_write_packet_produces_one_frame() {
        let packet = intent_packet();
        let frame = encode_frame(&packet).unwrap();
        let mut mock = Builder::new().write(&frame).build();

        tokio_test::block_on(write_packet(&mut mock, &packet)).unwrap();
    }
}
