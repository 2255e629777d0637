//! パケットの16進ダンプ。

use std::fmt;

use colored::{Color, Colorize};
use dvbsi::packet::PACKET_SIZE;

const BYTES_PER_LINE: usize = 16;

/// 先頭から`i`バイト目に付ける色を返す。
fn byte_color(data: &[u8], i: usize) -> Option<Color> {
    match i {
        0 if data[0] == 0x47 => Some(Color::Green),
        1 | 3 => Some(Color::Green),
        2 if data[2] == 0x12 => Some(Color::Red),
        // ポインターフィールドとテーブルID
        4 | 5 => Some(Color::Blue),
        // 最初のイベントの先頭記述子のタグ
        31 if matches!(data[31], 0x4D | 0x4E) => Some(Color::Magenta),
        33..=35 if data[31] == 0x4D => Some(Color::Cyan),
        _ => None,
    }
}

#[inline]
fn is_printable(b: u8) -> bool {
    matches!(b, 0x20..=0x7E | 0xC0..=0xFF)
}

/// パケットを16バイトずつ、オフセット・16進表記・文字の列に分けて表示する。
pub struct HexDump<'a> {
    data: &'a [u8; PACKET_SIZE],
    offset: u64,
}

impl<'a> HexDump<'a> {
    /// 入力の`offset`バイト目から始まるパケット`data`のダンプを生成する。
    pub fn new(data: &'a [u8; PACKET_SIZE], offset: u64) -> HexDump<'a> {
        HexDump { data, offset }
    }
}

impl<'a> fmt::Display for HexDump<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (line, chunk) in self.data.chunks(BYTES_PER_LINE).enumerate() {
            let base = line * BYTES_PER_LINE;
            let offset = format!("{:07x}", self.offset + base as u64);
            write!(f, "{} ", offset.blue())?;

            for (j, &b) in chunk.iter().enumerate() {
                if j == BYTES_PER_LINE / 2 {
                    f.write_str(" ")?;
                }
                let hex = format!("{:02x}", b);
                match byte_color(self.data, base + j) {
                    Some(color) => write!(f, "{} ", hex.color(color))?,
                    None => write!(f, "{} ", hex)?,
                }
            }

            // 最終行の桁揃え
            for j in chunk.len()..BYTES_PER_LINE {
                if j == BYTES_PER_LINE / 2 {
                    f.write_str(" ")?;
                }
                f.write_str("   ")?;
            }

            f.write_str(" ")?;
            for &b in chunk {
                if is_printable(b) {
                    write!(f, "{}", char::from(b))?;
                } else {
                    write!(f, "{}", ".".yellow())?;
                }
            }
            f.write_str("\n")?;
        }

        Ok(())
    }
}
