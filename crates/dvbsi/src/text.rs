//! SIで使われる8ビット文字列の扱い。
//!
//! 文字列はISO/IEC 8859-1（Latin-1）として扱う。
//! 先頭に文字符号表の選択バイト（ETSI EN 300 468 付録A）がある場合は読み飛ばす。

/// 表示可能な文字の代わりに使う文字。
pub const FILLER: char = '.';

/// 先頭の文字符号表選択を取り除いた文字列本体を返す。
fn strip_table_selector(data: &[u8]) -> &[u8] {
    match data {
        // 3バイト形式（0x10, 0x00, n）
        [0x10, rem @ ..] => rem.get(2..).unwrap_or(&[]),
        // 2バイト形式（0x1F, encoding_type_id）
        [0x1F, rem @ ..] => rem.get(1..).unwrap_or(&[]),
        [0x01..=0x1F, rem @ ..] => rem,
        _ => data,
    }
}

/// 表示可能なLatin-1の文字かどうかを返す。
#[inline]
fn is_printable(b: u8) -> bool {
    matches!(b, 0x20..=0x7E | 0xC0..=0xFE)
}

/// `data`をLatin-1として文字列に変換する。
///
/// 制御文字は取り除く。
pub fn decode_latin1(data: &[u8]) -> String {
    strip_table_selector(data)
        .iter()
        .filter(|&&b| !matches!(b, 0x00..=0x1F | 0x7F..=0x9F))
        .map(|&b| b as char)
        .collect()
}

/// `data`をLatin-1として表示用の文字列に変換する。
///
/// 表示できないバイトは[`FILLER`]に置き換えるため、
/// 文字数は（文字符号表選択を除いた）バイト数と一致する。
pub fn decode_printable(data: &[u8]) -> String {
    strip_table_selector(data)
        .iter()
        .map(|&b| if is_printable(b) { b as char } else { FILLER })
        .collect()
}

/// `text`の文字数が`len`に満たない場合、[`FILLER`]で埋める。
pub fn pad_with_filler(text: &mut String, len: usize) {
    let count = text.chars().count();
    text.extend(std::iter::repeat(FILLER).take(len.saturating_sub(count)));
}
