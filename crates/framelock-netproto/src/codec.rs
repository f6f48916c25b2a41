use serde::{Serialize, de::DeserializeOwned};

use crate::{
    constants::{HEADER_LEN, LEN_PREFIX, MAGIC, MAX_FRAME, VERSION},
    error::WireError,
    messages::{InputMsg, Message, PingReq, PingResp, StateMsg},
    msg_id::MsgId,
};

/// Serialize a payload (an input or a simulation state) to its
/// wire-transmissible form. Lossless round-trip with [`decode_payload`].
pub fn encode_payload<T: Serialize>(value: &T) -> Result<Vec<u8>, WireError> {
    Ok(postcard::to_stdvec(value)?)
}

/// Inverse of [`encode_payload`]. Malformed bytes fail with
/// [`WireError::Postcard`].
pub fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    Ok(postcard::from_bytes(bytes)?)
}

/// Encode a message into a framed buffer ready to hand to the channel.
///
/// Layout: `[u16 frame_len_le][magic][version][msg_id][postcard body]`,
/// where `frame_len` counts everything after the length prefix.
pub fn encode_message(message: &Message) -> Result<Vec<u8>, WireError> {
    let body = match message {
        Message::Input(m) => postcard::to_stdvec(m)?,
        Message::State(m) => postcard::to_stdvec(m)?,
        Message::PingReq(m) => postcard::to_stdvec(m)?,
        Message::PingResp(m) => postcard::to_stdvec(m)?,
    };

    let frame_len = HEADER_LEN + body.len();
    if frame_len > MAX_FRAME {
        return Err(WireError::FrameTooLarge(frame_len));
    }

    let mut out = Vec::with_capacity(LEN_PREFIX + frame_len);
    out.extend_from_slice(&(frame_len as u16).to_le_bytes());
    out.extend_from_slice(&MAGIC);
    out.push(VERSION);
    out.push(message.msg_id() as u8);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a buffer containing exactly one framed message.
pub fn decode_frame(buf: &[u8]) -> Result<Message, WireError> {
    if buf.len() < LEN_PREFIX + HEADER_LEN {
        return Err(WireError::TooShort);
    }
    let frame_len =
        u16::from_le_bytes(buf[..LEN_PREFIX].try_into().expect("slice length is 2")) as usize;
    if frame_len > MAX_FRAME {
        return Err(WireError::FrameTooLarge(frame_len));
    }
    if buf.len() != LEN_PREFIX + frame_len {
        return Err(WireError::LengthMismatch);
    }
    decode_frame_body(&buf[LEN_PREFIX..])
}

/// Split a byte stream into complete messages.
///
/// Returns the decoded messages and the number of bytes consumed; a trailing
/// partial frame is left unconsumed for the next read.
pub fn try_decode_stream(in_buf: &[u8]) -> Result<(Vec<Message>, usize), WireError> {
    let mut messages = Vec::new();
    let mut offset = 0usize;

    loop {
        if in_buf.len().saturating_sub(offset) < LEN_PREFIX {
            break;
        }
        let len_bytes = &in_buf[offset..offset + LEN_PREFIX];
        let frame_len =
            u16::from_le_bytes(len_bytes.try_into().expect("slice length is 2")) as usize;

        if frame_len < HEADER_LEN {
            return Err(WireError::LengthMismatch);
        }
        if frame_len > MAX_FRAME {
            return Err(WireError::FrameTooLarge(frame_len));
        }

        let total_needed = LEN_PREFIX + frame_len;
        if in_buf.len().saturating_sub(offset) < total_needed {
            break;
        }

        let frame = &in_buf[offset + LEN_PREFIX..offset + total_needed];
        messages.push(decode_frame_body(frame)?);
        offset += total_needed;
    }

    Ok((messages, offset))
}

fn decode_frame_body(frame: &[u8]) -> Result<Message, WireError> {
    if frame.len() < HEADER_LEN {
        return Err(WireError::TooShort);
    }
    if frame[0..2] != MAGIC {
        return Err(WireError::BadMagic);
    }
    let version = frame[2];
    if version != VERSION {
        return Err(WireError::UnsupportedVersion(version));
    }
    let msg_id = MsgId::from_repr(frame[3]).ok_or(WireError::UnknownMsgId(frame[3]))?;

    let body = &frame[HEADER_LEN..];
    let message = match msg_id {
        MsgId::Input => Message::Input(postcard::from_bytes::<InputMsg>(body)?),
        MsgId::State => Message::State(postcard::from_bytes::<StateMsg>(body)?),
        MsgId::PingReq => Message::PingReq(postcard::from_bytes::<PingReq>(body)?),
        MsgId::PingResp => Message::PingResp(postcard::from_bytes::<PingResp>(body)?),
    };
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> Message {
        Message::Input(InputMsg {
            frame: 42,
            player: 1,
            input: vec![0xAA, 0xBB],
        })
    }

    #[test]
    fn framing_offsets_are_locked() {
        let encoded = encode_message(&sample_input()).unwrap();

        let frame_len = u16::from_le_bytes(encoded[0..2].try_into().unwrap()) as usize;
        assert_eq!(encoded.len(), LEN_PREFIX + frame_len);
        assert_eq!(&encoded[2..4], &MAGIC);
        assert_eq!(encoded[4], VERSION);
        assert_eq!(encoded[5], MsgId::Input as u8);
    }

    #[test]
    fn message_round_trip() {
        let messages = [
            sample_input(),
            Message::State(StateMsg {
                frame: 7,
                state: vec![1, 2, 3, 4],
            }),
            Message::PingReq(PingReq { sent_ms: 123456 }),
            Message::PingResp(PingResp { sent_ms: 123456 }),
        ];
        for message in messages {
            let encoded = encode_message(&message).unwrap();
            let decoded = decode_frame(&encoded).unwrap();
            assert_eq!(decoded, message);
        }
    }

    #[test]
    fn payload_round_trip() {
        let bytes = encode_payload(&(3u32, String::from("left"))).unwrap();
        let value: (u32, String) = decode_payload(&bytes).unwrap();
        assert_eq!(value, (3, String::from("left")));
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let result: Result<(u32, String), _> = decode_payload(&[0xFF]);
        assert!(matches!(result, Err(WireError::Postcard(_))));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut encoded = encode_message(&sample_input()).unwrap();
        encoded[2] = b'X';
        assert!(matches!(decode_frame(&encoded), Err(WireError::BadMagic)));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut encoded = encode_message(&sample_input()).unwrap();
        encoded[4] = VERSION + 1;
        assert!(matches!(
            decode_frame(&encoded),
            Err(WireError::UnsupportedVersion(v)) if v == VERSION + 1
        ));
    }

    #[test]
    fn unknown_msg_id_is_rejected() {
        let mut encoded = encode_message(&sample_input()).unwrap();
        encoded[5] = 0xEE;
        assert!(matches!(
            decode_frame(&encoded),
            Err(WireError::UnknownMsgId(0xEE))
        ));
    }

    #[test]
    fn decode_frame_requires_exact_length() {
        let encoded = encode_message(&sample_input()).unwrap();

        let mut too_long = encoded.clone();
        too_long.push(9);
        assert!(matches!(
            decode_frame(&too_long),
            Err(WireError::LengthMismatch)
        ));

        let too_short = &encoded[..encoded.len() - 1];
        assert!(matches!(
            decode_frame(too_short),
            Err(WireError::LengthMismatch)
        ));
    }

    #[test]
    fn stream_splits_concatenated_frames() {
        let a = encode_message(&sample_input()).unwrap();
        let b = encode_message(&Message::PingReq(PingReq { sent_ms: 5 })).unwrap();

        let mut stream = Vec::new();
        stream.extend_from_slice(&a);
        stream.extend_from_slice(&b);
        // Trailing partial frame stays unconsumed.
        stream.extend_from_slice(&a[..3]);

        let (messages, consumed) = try_decode_stream(&stream).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(consumed, a.len() + b.len());
        assert_eq!(messages[0], sample_input());
        assert_eq!(messages[1], Message::PingReq(PingReq { sent_ms: 5 }));
    }

    #[test]
    fn stream_with_only_partial_prefix_consumes_nothing() {
        let encoded = encode_message(&sample_input()).unwrap();
        let (messages, consumed) = try_decode_stream(&encoded[..1]).unwrap();
        assert!(messages.is_empty());
        assert_eq!(consumed, 0);
    }
}
