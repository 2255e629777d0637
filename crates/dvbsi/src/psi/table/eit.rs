//! EIT（Event Information Table）。

use std::ops::RangeInclusive;

use crate::lang::LangCode;
use crate::packet::Packet;
use crate::psi::desc::{AnyDescriptor, DescriptorBlock};
use crate::psi::{PsiSection, PsiTable};
use crate::registry::{ChannelKey, ChannelRegistry, EventKey, EventRecord, EventStore};
use crate::text;
use crate::time::{DateTime, Duration};
use crate::utils::BytesExt;

use super::RunningStatus;

/// EITの種類。
///
/// 他TSにおけるイベント［スケジュール］（0x60～0x6F）は扱わない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EitKind {
    /// 自TSにおけるイベント［現在／次］。
    ActualPf,
    /// 他TSにおけるイベント［現在／次］。
    OtherPf,
    /// 自TSにおけるイベント［スケジュール］。
    ActualSchedule,
}

impl EitKind {
    /// テーブル識別から`EitKind`を得る。
    pub fn from_table_id(table_id: u8) -> Option<EitKind> {
        match table_id {
            // 0x4Dも自TSの［現在／次］として扱う
            0x4D | Eit::TABLE_ID_PF_ACTUAL => Some(EitKind::ActualPf),
            Eit::TABLE_ID_PF_OTHER => Some(EitKind::OtherPf),
            0x50..=0x5F => Some(EitKind::ActualSchedule),
            _ => None,
        }
    }
}

/// セクションに含まれるイベント。
#[derive(Debug, PartialEq, Eq)]
pub struct EitEvent<'a> {
    /// イベント識別。
    pub event_id: u16,
    /// 開始時間。
    pub start_time: DateTime,
    /// 継続時間。
    pub duration: Duration,
    /// 進行状態。
    pub running_status: RunningStatus,
    /// スクランブル。
    pub free_ca_mode: bool,
    /// 記述子ループ長。
    pub descriptors_loop_length: u16,
    /// 記述子の塊。パケットに含まれる分のみ。
    pub descriptors: DescriptorBlock<'a>,
}

impl<'a> EitEvent<'a> {
    /// `data`の先頭からイベントを読み取る。
    ///
    /// 記述子の塊は`data`に含まれる分のみとなる。
    pub fn read(data: &'a [u8]) -> Option<EitEvent<'a>> {
        if data.len() < 12 {
            log::debug!("invalid EitEvent");
            return None;
        }

        let event_id = data[0..=1].read_be_16();
        let start_time = DateTime::read(data[2..=6].try_into().ok()?);
        let duration = Duration::read(data[7..=9].try_into().ok()?);
        let running_status = ((data[10] & 0b11100000) >> 5).into();
        let free_ca_mode = data[10] & 0b00010000 != 0;
        let descriptors_loop_length = data[10..=11].read_length_12();
        let (descriptors, _) = DescriptorBlock::read_clamped(&data[12..], descriptors_loop_length);

        Some(EitEvent {
            event_id,
            start_time,
            duration,
            running_status,
            free_ca_mode,
            descriptors_loop_length,
            descriptors,
        })
    }

    /// 記述子ループがパケット末尾またはセクション末尾で切れているかどうかを返す。
    #[inline]
    pub fn is_clipped(&self) -> bool {
        self.descriptors.len() < self.descriptors_loop_length as usize
    }

    /// 記述子ループ内のイベント記述子を順に返す。
    ///
    /// 末尾で切れている記述子も、読み取れる範囲で含める。
    pub fn event_descriptors(&self) -> impl Iterator<Item = AnyDescriptor<'a>> + 'a {
        self.descriptors
            .parsed()
            .chain(self.descriptors.truncated().map(AnyDescriptor::read_clipped))
            .filter(|d| d.lang_code().is_some())
    }

    /// 最初のイベント記述子の言語コードと、最初に見つかった空でない番組の説明を返す。
    pub fn summary(&self) -> (Option<LangCode>, Option<&'a [u8]>) {
        let mut lang_code = None;
        let mut summary = None;
        for desc in self.event_descriptors() {
            lang_code = lang_code.or_else(|| desc.lang_code());
            summary = summary.or_else(|| desc.summary());
            if lang_code.is_some() && summary.is_some() {
                break;
            }
        }

        (lang_code, summary)
    }
}

/// EIT（Event Information Table）。
///
/// 1つのパケットに含まれる最初のイベントのみを保持する。
#[derive(Debug, PartialEq, Eq)]
pub struct Eit<'a> {
    /// EITの種類。
    pub kind: EitKind,
    /// テーブル識別。
    pub table_id: u8,
    /// セクションシンタクス指示。
    pub section_syntax_indicator: bool,
    /// セクション長。
    pub section_length: u16,
    /// サービス識別。
    pub service_id: u16,
    /// バージョン番号。
    pub version_number: u8,
    /// カレントネクスト指示。
    pub current_next_indicator: bool,
    /// セクション番号。
    pub section_number: u8,
    /// 最終セクション番号。
    pub last_section_number: u8,
    /// トランスポートストリーム識別。
    pub transport_stream_id: u16,
    /// オリジナルネットワーク識別。
    pub original_network_id: u16,
    /// セグメント最終セクション番号。
    pub segment_last_section_number: u8,
    /// 最終テーブル識別。
    pub last_table_id: u8,
    /// イベント。
    pub event: Option<EitEvent<'a>>,
}

impl<'a> Eit<'a> {
    /// 自TSにおけるイベント［現在／次］を格納するEITのテーブルID。
    pub const TABLE_ID_PF_ACTUAL: u8 = 0x4E;
    /// 他TSにおけるイベント［現在／次］を格納するEITのテーブルID。
    pub const TABLE_ID_PF_OTHER: u8 = 0x4F;
    /// 自TSにおけるイベント［スケジュール］を格納するEITのテーブルID。
    pub const TABLE_ID_SCHEDULE_ACTUAL: RangeInclusive<u8> = 0x50..=0x5F;
    /// 他TSにおけるイベント［スケジュール］を格納するEITのテーブルID。
    pub const TABLE_ID_SCHEDULE_OTHER: RangeInclusive<u8> = 0x60..=0x6F;

    /// イベントが属するチャンネルの識別を返す。
    #[inline]
    pub fn channel_key(&self) -> ChannelKey {
        ChannelKey {
            service_id: self.service_id,
            transport_stream_id: self.transport_stream_id,
            original_network_id: self.original_network_id,
        }
    }
}

impl<'a> PsiTable<'a> for Eit<'a> {
    fn read(psi: &PsiSection<'a>) -> Option<Eit<'a>> {
        let Some(kind) = EitKind::from_table_id(psi.table_id) else {
            log::debug!("invalid Eit::table_id");
            return None;
        };

        let data = psi.data;
        if data.len() < 6 {
            log::debug!("invalid Eit");
            return None;
        }

        let transport_stream_id = data[0..=1].read_be_16();
        let original_network_id = data[2..=3].read_be_16();
        let segment_last_section_number = data[4];
        let last_table_id = data[5];
        let event = match &data[6..] {
            [] => None,
            data => EitEvent::read(data),
        };

        Some(Eit {
            kind,
            table_id: psi.table_id,
            section_syntax_indicator: psi.section_syntax_indicator,
            section_length: psi.section_length,
            service_id: psi.table_id_extension,
            version_number: psi.version_number,
            current_next_indicator: psi.current_next_indicator,
            section_number: psi.section_number,
            last_section_number: psi.last_section_number,
            transport_stream_id,
            original_network_id,
            segment_last_section_number,
            last_table_id,
            event,
        })
    }
}

/// [`decode`]の結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// EITのセクションを含まないパケットだった。
    Skipped,
    /// EITだがイベントを含まなかった。
    NoEvent,
    /// イベントを追加した。
    Inserted(EventKey),
    /// 既に同じイベントがあったため破棄した。
    Duplicate(EventKey),
}

/// `packet`に含まれるEITを読み取り、チャンネルとイベントを追加する。
///
/// `offset`は`packet`の入力先頭からのバイト位置で、イベントと共に記録する。
pub fn decode(
    packet: &Packet,
    offset: u64,
    registry: &mut ChannelRegistry,
    store: &mut EventStore,
) -> Decoded {
    let psi = match PsiSection::locate(packet) {
        Ok(psi) => psi,
        Err(e) => {
            log::trace!("EIT packet at {}: {}", offset, e);
            return Decoded::Skipped;
        }
    };
    if EitKind::from_table_id(psi.table_id).is_none() {
        log::debug!("unknown table 0x{:02X} on EIT PID at {}", psi.table_id, offset);
        return Decoded::Skipped;
    }
    let Some(eit) = Eit::read(&psi) else {
        return Decoded::Skipped;
    };

    let channel = eit.channel_key();
    registry.ensure_channel(channel);

    let Some(event) = eit.event else {
        return Decoded::NoEvent;
    };

    let key = EventKey {
        event_id: event.event_id,
        service_id: channel.service_id,
        transport_stream_id: channel.transport_stream_id,
        original_network_id: channel.original_network_id,
    };
    log::debug!(
        "EIT at {}: event={} start={} duration={} running_status={:?} free_ca={} loop_length={}",
        offset,
        key,
        event.start_time,
        event.duration,
        event.running_status,
        event.free_ca_mode,
        event.descriptors_loop_length,
    );

    let (language, summary) = event.summary();
    let mut description = summary.map(text::decode_printable).unwrap_or_default();
    text::pad_with_filler(&mut description, eit.section_length as usize);

    let record = EventRecord {
        key,
        offset,
        continuity_counter: packet.continuity_counter(),
        section_length: eit.section_length,
        table_id: eit.table_id,
        start_time: event.start_time,
        duration: event.duration,
        running_status: event.running_status,
        free_ca_mode: event.free_ca_mode,
        language,
        description,
    };
    match store.insert(record) {
        Ok(()) => Decoded::Inserted(key),
        Err(_) => {
            log::warn!("EIT already received at {}: {}", offset, key);
            Decoded::Duplicate(key)
        }
    }
}
