//! Self-delimiting snapshot framing for `tokio_util`.
//!
//! Each record is one JSON object followed by a newline. The decoder does
//! not rely on the newline: it parses exactly one complete JSON value from
//! the buffered bytes and leaves the rest for the next call, so any
//! whitespace between records is accepted.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::NetError;
use crate::snapshot::Snapshot;

/// Default cap on the bytes a single pending record may occupy.
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct SnapshotCodec {
    max_frame_len: usize,
}

impl SnapshotCodec {
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            max_frame_len: max_frame_len.max(1),
        }
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }
}

impl Default for SnapshotCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn skip_whitespace(src: &mut BytesMut) {
    let blank = src.iter().take_while(|b| b.is_ascii_whitespace()).count();
    src.advance(blank);
}

impl Decoder for SnapshotCodec {
    type Item = Snapshot;
    type Error = NetError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        skip_whitespace(src);
        if src.is_empty() {
            return Ok(None);
        }

        let mut records = serde_json::Deserializer::from_slice(&src[..]).into_iter::<Snapshot>();
        match records.next() {
            Some(Ok(snapshot)) => {
                let consumed = records.byte_offset();
                src.advance(consumed);
                Ok(Some(snapshot))
            }
            Some(Err(e)) if e.is_eof() => {
                if src.len() > self.max_frame_len {
                    return Err(NetError::FrameTooLarge {
                        size: src.len(),
                        max: self.max_frame_len,
                    });
                }
                src.reserve(256);
                Ok(None)
            }
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(snapshot) => Ok(Some(snapshot)),
            None if src.is_empty() => Ok(None),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("stream ended inside a record ({} bytes pending)", src.len()),
            )
            .into()),
        }
    }
}

impl Encoder<Snapshot> for SnapshotCodec {
    type Error = NetError;

    fn encode(&mut self, item: Snapshot, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if !item.is_finite() {
            return Err(NetError::Encoding(
                "snapshot contains a non-finite float".to_string(),
            ));
        }
        serde_json::to_writer((&mut *dst).writer(), &item)?;
        dst.put_u8(b'\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{BulletState, PlayerState};

    fn snapshot(x: f64) -> Snapshot {
        Snapshot::new(
            PlayerState {
                x,
                y: 2.0,
                facing_right: true,
                ..Default::default()
            },
            vec![BulletState { x: x + 1.0, y: 2.0, vx: 4.5 }],
        )
    }

    /// Offset that lands inside the `"Bullets"` key of the first record.
    fn mid_record(buf: &[u8]) -> usize {
        buf.windows(9).position(|w| w == b"\"Bullets\"").unwrap() + 3
    }

    fn encoded(items: &[Snapshot]) -> BytesMut {
        let mut codec = SnapshotCodec::new();
        let mut buf = BytesMut::new();
        for item in items {
            codec.encode(item.clone(), &mut buf).unwrap();
        }
        buf
    }

    #[test]
    fn records_are_newline_terminated() {
        let buf = encoded(&[snapshot(1.0)]);
        assert_eq!(buf.last(), Some(&b'\n'));
        assert_eq!(buf.iter().filter(|b| **b == b'\n').count(), 1);
    }

    #[test]
    fn decodes_one_record_per_call() {
        let mut buf = encoded(&[snapshot(1.0), snapshot(2.0)]);
        let mut codec = SnapshotCodec::new();

        assert_eq!(codec.decode(&mut buf).unwrap(), Some(snapshot(1.0)));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(snapshot(2.0)));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_record_waits_for_more_bytes() {
        let full = encoded(&[snapshot(3.0)]);
        let split = mid_record(&full);
        let mut buf = BytesMut::from(&full[..split]);
        let mut codec = SnapshotCodec::new();

        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(buf.len(), split);

        buf.extend_from_slice(&full[split..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(snapshot(3.0)));
    }

    #[test]
    fn records_without_newline_separator() {
        let mut buf = BytesMut::from(
            &br#"{"Player":{"X":1},"Bullets":[]}  {"Player":{"X":2},"Bullets":null}"#[..],
        );
        let mut codec = SnapshotCodec::new();

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().player.x, 1.0);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().player.x, 2.0);
    }

    #[test]
    fn malformed_record_is_an_encoding_error() {
        let mut buf = BytesMut::from(&b"{\"Player\": nonsense}\n"[..]);
        let err = SnapshotCodec::new().decode(&mut buf).unwrap_err();
        assert!(matches!(err, NetError::Encoding(_)));
        assert!(err.is_transport());
    }

    #[test]
    fn oversized_pending_record_is_rejected() {
        let mut codec = SnapshotCodec::with_max_frame_len(16);
        let mut buf = BytesMut::from(&br#"{"Player":{"X":1,"Y":2,"VelocityX":"#[..]);
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, NetError::FrameTooLarge { max: 16, .. }));
    }

    #[test]
    fn trailing_whitespace_at_eof_is_a_clean_end() {
        let mut buf = BytesMut::from(&b"\n  \n"[..]);
        assert_eq!(SnapshotCodec::new().decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn truncated_record_at_eof_is_a_transport_error() {
        let full = encoded(&[snapshot(4.0)]);
        let mut buf = BytesMut::from(&full[..mid_record(&full)]);
        let err = SnapshotCodec::new().decode_eof(&mut buf).unwrap_err();
        match err {
            NetError::Transport(io) => assert_eq!(io.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_finite_snapshot_fails_to_encode() {
        let mut bad = snapshot(1.0);
        bad.player.vx = f64::NAN;
        let mut buf = BytesMut::new();
        let err = SnapshotCodec::new().encode(bad, &mut buf).unwrap_err();
        assert!(matches!(err, NetError::Encoding(_)));
        assert!(buf.is_empty());
    }

    #[test]
    fn floats_survive_bit_exact() {
        let mut tricky = snapshot(0.1 + 0.2);
        tricky.player.vy = -1.0e-308;
        tricky.bullets.push(BulletState { x: f64::MAX, y: f64::MIN_POSITIVE, vx: 1.0 / 3.0 });
        let mut buf = encoded(&[tricky.clone()]);
        let decoded = SnapshotCodec::new().decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.player.x.to_bits(), tricky.player.x.to_bits());
        assert_eq!(decoded.player.vy.to_bits(), tricky.player.vy.to_bits());
        assert_eq!(decoded.bullets, tricky.bullets);
    }
}
