//! TSパケットを順に走査し、SDTとEITからチャンネルとイベントを取り出す。
//!
//! # サンプル
//!
//! ```
//! # fn main() -> Result<(), dvbsi::scan::ScanError> {
//! # let file = &mut (&[] as &[u8]);
//! let result = dvbsi::scan_reader(file)?;
//! for channel in result.context.channels.iter() {
//!     println!("{}: {}", channel.key, channel.name);
//! }
//! println!("{} events", result.context.events.len());
//! # Ok(())
//! # }
//! ```

use std::io::{self, Read};

use thiserror::Error;

use crate::packet::{CellError, Packet, PACKET_SIZE};
use crate::pid::Pid;
use crate::psi::table::{eit, sdt};
use crate::registry::ScanContext;

/// 走査で発生するエラー。
#[derive(Debug, Error)]
pub enum ScanError {
    /// 入力の読み込みに失敗した。
    #[error("failed to read the transport stream")]
    Io(#[from] io::Error),
}

/// パケットを渡したテーブル。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// SDT（PID 0x0011）。
    Sdt,
    /// EIT（PID 0x0012）。
    Eit,
}

/// 走査の統計。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    /// 読み込んだパケット数。
    pub cells: u64,
    /// 末尾で読み捨てた、188バイトに満たない部分のバイト数。
    pub trailing_bytes: usize,
    /// 同期バイトが不正なパケット数。
    pub bad_sync: u64,
    /// トランスポートエラーインジケーターが立っていたパケット数。
    pub transport_errors: u64,
    /// スクランブルされていたパケット数。
    pub scrambled: u64,
    /// SDT・EIT以外のPIDで読み捨てたパケット数。
    pub filtered: u64,
    /// SDTのPIDのパケット数。
    pub sdt_cells: u64,
    /// EITのPIDのパケット数。
    pub eit_cells: u64,
    /// 追加したイベント数。
    pub events_inserted: u64,
    /// 重複により破棄したイベント数。
    pub duplicate_events: u64,
}

/// 走査の結果。
#[derive(Debug, Default, Clone)]
pub struct ScanResult {
    /// 見つかったチャンネルとイベント。
    pub context: ScanContext,
    /// 統計。
    pub stats: ScanStats,
}

/// パケットを1つずつ受け取り、SDTとEITを処理する。
///
/// 先着優先でイベントを保持するため、パケットは入力での順番通りに渡す必要がある。
#[derive(Debug, Default)]
pub struct Scanner {
    context: ScanContext,
    stats: ScanStats,
}

impl Scanner {
    /// 空の`Scanner`を生成する。
    #[inline]
    pub fn new() -> Scanner {
        Scanner::default()
    }

    /// これまでに見つかったチャンネルとイベントを返す。
    #[inline]
    pub fn context(&self) -> &ScanContext {
        &self.context
    }

    /// これまでの統計を返す。
    #[inline]
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// 入力の`offset`バイト目から始まるパケットを処理する。
    ///
    /// パケットをSDTまたはEITとして処理した場合はそのテーブルを返す。
    pub fn feed(&mut self, offset: u64, packet: &Packet) -> Option<Table> {
        self.stats.cells += 1;

        if let Err(e) = packet.check() {
            log::trace!("packet at {} rejected: {}", offset, e);
            match e {
                CellError::SyncByte(_) => self.stats.bad_sync += 1,
                CellError::TransportError => self.stats.transport_errors += 1,
                CellError::Scrambled(_) => self.stats.scrambled += 1,
            }
            return None;
        }

        match packet.pid() {
            Pid::SDT => {
                self.stats.sdt_cells += 1;
                sdt::decode(packet, offset, &mut self.context.channels);
                Some(Table::Sdt)
            }
            Pid::EIT => {
                self.stats.eit_cells += 1;
                let ScanContext { channels, events } = &mut self.context;
                match eit::decode(packet, offset, channels, events) {
                    eit::Decoded::Inserted(_) => self.stats.events_inserted += 1,
                    eit::Decoded::Duplicate(_) => self.stats.duplicate_events += 1,
                    eit::Decoded::Skipped | eit::Decoded::NoEvent => {}
                }
                Some(Table::Eit)
            }
            _ => {
                self.stats.filtered += 1;
                None
            }
        }
    }

    /// 走査を終了し結果を返す。
    ///
    /// `trailing_bytes`には末尾で読み捨てた部分のバイト数を指定する。
    pub fn finish(mut self, trailing_bytes: usize) -> ScanResult {
        if trailing_bytes != 0 {
            log::debug!("ignored {} trailing bytes", trailing_bytes);
        }
        self.stats.trailing_bytes = trailing_bytes;

        ScanResult {
            context: self.context,
            stats: self.stats,
        }
    }
}

/// メモリ上のTSを走査する。
pub fn scan(data: &[u8]) -> ScanResult {
    let mut scanner = Scanner::new();
    let chunks = data.chunks_exact(PACKET_SIZE);
    let trailing_bytes = chunks.remainder().len();
    for (i, chunk) in chunks.enumerate() {
        let Ok(bytes) = <[u8; PACKET_SIZE]>::try_from(chunk) else {
            continue;
        };
        scanner.feed((i * PACKET_SIZE) as u64, &Packet(bytes));
    }

    scanner.finish(trailing_bytes)
}

/// `r`から読み込んだTSを走査する。
pub fn scan_reader<R: Read>(r: R) -> Result<ScanResult, ScanError> {
    let mut scanner = Scanner::new();
    let mut packets = Packet::iter(r);
    let mut offset = 0;
    for packet in &mut packets {
        scanner.feed(offset, &packet?);
        offset += PACKET_SIZE as u64;
    }

    Ok(scanner.finish(packets.trailing()))
}
