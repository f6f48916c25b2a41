use strum::FromRepr;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
pub enum MsgId {
    Input = 1,
    State = 2,

    PingReq = 10,
    PingResp = 11,
}
