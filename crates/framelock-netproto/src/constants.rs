/// Magic bytes at the beginning of every frame.
/// Used to quickly reject unrelated or corrupted data.
pub const MAGIC: [u8; 2] = *b"FL";

/// Wire-format protocol version.
/// Bump this only for breaking changes to the framing layout or message formats.
pub const VERSION: u8 = 1;

/// Fixed frame header length in bytes: magic (2) + version (1) + msg id (1).
pub const HEADER_LEN: usize = 4;

/// Framing prefix length in bytes.
///
/// The channel is a byte stream, so each message is framed as
/// `[u16 frame_len_le][Header][Payload]`, where `frame_len_le` is the length
/// of `[Header][Payload]` in bytes.
pub const LEN_PREFIX: usize = 2;

/// Maximum size of a single framed message (header + payload), in bytes.
/// Bounded by the u16 length prefix; enforced to avoid unbounded
/// allocations.
pub const MAX_FRAME: usize = u16::MAX as usize;

/// Interval between RTT probes (`ping_req`), in milliseconds.
pub const PING_INTERVAL_MS: u64 = 100;
