//! SnapSync TCP transfer layer.
//!
//! One TCP connection carries exactly one offer:
//!
//! ```text
//! sender                         receiver
//!   │── HELLO ────────────────────▶│
//!   │── OFFER {name, size} ───────▶│  acceptance gate + landing path
//!   │◀──────────── ACCEPT / ERROR ─│
//!   │── DATA* ────────────────────▶│  byte budget enforced
//!   │── DONE ─────────────────────▶│
//! ```
//!
//! Both endpoints run as one sequential async task each: one connection,
//! one state machine, strictly ordered reads and writes. Before aborting on
//! a fault that occurs after HELLO, the offended side attempts a courtesy
//! ERROR frame so the peer learns why; failure to deliver it is swallowed.

mod receiver;
mod sender;
mod wire;

pub use receiver::{ListeningCallback, ReceiveOptions, StopHandle, receive_once};
pub use sender::{SendOptions, send_file};
pub use wire::{read_frame, write_frame};
