//! DVBのMPEG2-TSからSDTとEITを読み取り、チャンネルと番組情報を取り出すためのクレート。
//!
//! 入力は188バイトのTSパケットが連続したものとし、
//! SDT（PID 0x0011）からサービス名を、EIT（PID 0x0012）からイベントを読み取る。
//! セクションは1つのパケットに収まる範囲でのみ扱う。

#![deny(missing_docs)]

pub mod lang;
pub mod packet;
pub mod pid;
pub mod psi;
pub mod registry;
pub mod scan;
pub mod text;
pub mod time;
mod utils;

#[cfg(test)]
mod testing;

pub use packet::Packet;
pub use pid::Pid;
pub use registry::{ChannelKey, ChannelRecord, EventKey, EventRecord, ScanContext};
pub use scan::{scan, scan_reader, ScanResult, ScanStats, Scanner};
pub use time::{decode_date, decode_duration};
