//! テスト用のパケットとセクションの組み立て。

use crate::packet::{Packet, PACKET_SIZE, SYNC_BYTE};
use crate::registry::ChannelKey;

/// バイト列を連結してパケットを生成する。
macro_rules! packet {
    ($($part:expr),*$(,)?) => {{
        $crate::packet::Packet([
            $(
                std::convert::identity::<&[u8]>(&$part),
            )*
        ].concat().try_into().unwrap())
    }};
}
pub(crate) use packet;

/// 実際の放送から取り出したEITのパケット。
///
/// セクションはパケットに収まらず、最後の記述子（タグ0xC4）は途中で切れている。
pub const PACKET_EIT: Packet = Packet(hex_literal::hex!(
    "
47 40 12 18 00 4F F0 CC 01 26 FF 01 01 43 11 00
04 01 4F 44 4D DA 15 17 25 00 00 05 00 10 B1 4D
78 6A 70 6E 10 AA A6 C1 CE 3F 40 4D 4D 1B 24 2A
3B 1B 7D FA D6 63 30 61 42 58 A8 CE 35 28 40 61
21 22 32 46 49 7E F2 3C 7D 47 3C B9 EB 41 30 CB
E4 EB B3 C8 C8 CF 1B 7E BF 1B 7D E4 E9 BA CB 3C
7D 47 3C B9 EB C8 33 32 43 6E AC 49 7E F2 39 53
E9 B7 C6 B7 DE A6 B3 C8 E2 21 26 21 26 21 26 40
35 B7 A4 32 46 49 7E 3C 7D 47 3C 4A 7D 4B 21 F2
3E 52 32 70 B7 DE B9 21 23 50 06 F1 03 00 6A 70
6E 54 06 22 FF 2F FF 84 FF C1 02 A4 01 C4 11 F2
03 10 0F FF 6F 6A 70 6E 25 39 25 46
"
));

/// ポインターフィールドを0として`section`を格納したパケットを生成する。
///
/// `section`がパケットに収まらない場合は切り捨て、余りは0xFFで埋める。
pub fn cell(pid: u16, unit_start: bool, continuity_counter: u8, section: &[u8]) -> Packet {
    let mut packet = Packet([0xFF; PACKET_SIZE]);
    packet.0[0] = SYNC_BYTE;
    packet.0[1] = ((unit_start as u8) << 6) | ((pid >> 8) as u8 & 0x1F);
    packet.0[2] = pid as u8;
    packet.0[3] = 0b00010000 | (continuity_counter & 0x0F);
    packet.0[4] = 0;

    let len = std::cmp::min(section.len(), PACKET_SIZE - 5);
    packet.0[5..5 + len].copy_from_slice(&section[..len]);
    packet
}

/// 拡張形式のヘッダーを付け、末尾にCRC（値は検証されないため0）を付けたセクションを生成する。
fn section(table_id: u8, table_id_extension: u16, body: &[u8]) -> Vec<u8> {
    let section_length = 5 + body.len() + 4;
    assert!(section_length <= 0x0FFF);

    let [ext_hi, ext_lo] = table_id_extension.to_be_bytes();
    [
        &[
            table_id,
            0xF0 | (section_length >> 8) as u8,
            section_length as u8,
            ext_hi,
            ext_lo,
            0xC1,
            0x00,
            0x00,
        ][..],
        body,
        &[0x00; 4],
    ]
    .concat()
}

/// 12ビットの長さを、上位4ビットを`flags`として書き込む。
fn length_12(flags: u8, len: usize) -> [u8; 2] {
    assert!(len <= 0x0FFF);
    [(flags & 0xF0) | (len >> 8) as u8, len as u8]
}

/// SDTのセクションを生成する。
///
/// 各サービスは実行中として、記述子の塊をそのまま格納する。
pub fn sdt_section(
    table_id: u8,
    transport_stream_id: u16,
    original_network_id: u16,
    services: &[(u16, Vec<u8>)],
) -> Vec<u8> {
    let mut body = original_network_id.to_be_bytes().to_vec();
    body.push(0xFF);
    for (service_id, descriptors) in services {
        body.extend_from_slice(&service_id.to_be_bytes());
        body.push(0xFF);
        body.extend_from_slice(&length_12(0x80, descriptors.len()));
        body.extend_from_slice(descriptors);
    }

    section(table_id, transport_stream_id, &body)
}

/// イベントを1つだけ含むEITのセクションを生成する。
///
/// イベントは実行中、スクランブルなしとする。
pub fn eit_section(
    table_id: u8,
    channel: ChannelKey,
    event_id: u16,
    start_time: [u8; 5],
    duration: [u8; 3],
    descriptors: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&channel.transport_stream_id.to_be_bytes());
    body.extend_from_slice(&channel.original_network_id.to_be_bytes());
    body.push(0x00);
    body.push(table_id);
    body.extend_from_slice(&event_id.to_be_bytes());
    body.extend_from_slice(&start_time);
    body.extend_from_slice(&duration);
    body.extend_from_slice(&length_12(0x80, descriptors.len()));
    body.extend_from_slice(descriptors);

    section(table_id, channel.service_id, &body)
}

/// タグと長さを付けた記述子を生成する。
fn descriptor(tag: u8, body: &[u8]) -> Vec<u8> {
    let len = u8::try_from(body.len()).unwrap();
    [&[tag, len][..], body].concat()
}

/// サービス記述子を生成する。
pub fn service_descriptor(service_type: u8, provider_name: &[u8], service_name: &[u8]) -> Vec<u8> {
    let mut body = vec![service_type, provider_name.len() as u8];
    body.extend_from_slice(provider_name);
    body.push(service_name.len() as u8);
    body.extend_from_slice(service_name);
    descriptor(0x48, &body)
}

/// 短形式イベント記述子を生成する。
pub fn short_event_descriptor(lang_code: &[u8; 3], event_name: &[u8], text: &[u8]) -> Vec<u8> {
    let mut body = lang_code.to_vec();
    body.push(event_name.len() as u8);
    body.extend_from_slice(event_name);
    body.push(text.len() as u8);
    body.extend_from_slice(text);
    descriptor(0x4D, &body)
}

/// 拡張形式イベント記述子を生成する。
///
/// `number`の上位4ビットが記述子番号、下位4ビットが最終記述子番号となる。
pub fn extended_event_descriptor(
    number: u8,
    lang_code: &[u8; 3],
    items: &[(&str, &str)],
    text: &[u8],
) -> Vec<u8> {
    let mut item_bytes = Vec::new();
    for (item_description, item) in items {
        item_bytes.push(item_description.len() as u8);
        item_bytes.extend_from_slice(item_description.as_bytes());
        item_bytes.push(item.len() as u8);
        item_bytes.extend_from_slice(item.as_bytes());
    }

    let mut body = vec![number];
    body.extend_from_slice(lang_code);
    body.push(item_bytes.len() as u8);
    body.extend_from_slice(&item_bytes);
    body.push(text.len() as u8);
    body.extend_from_slice(text);
    descriptor(0x4E, &body)
}
