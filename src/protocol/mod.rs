//! Serial protocol: frame extraction, command grammar and reply queue.

mod command;
mod frame;
mod reply;

pub use command::{parse, Command};
pub use frame::{FrameDecoder, FramePayload, MAX_FRAME_LEN};
pub use reply::{Outbox, ReplyLine, MAX_REPLY_LEN};
