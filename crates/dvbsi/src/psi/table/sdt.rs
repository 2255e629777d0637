//! SDT（Service Description Table）。

use crate::packet::Packet;
use crate::psi::desc::{DescriptorBlock, ServiceDescriptor};
use crate::psi::{PsiSection, PsiTable};
use crate::registry::{ChannelKey, ChannelRegistry};
use crate::utils::BytesExt;

use super::RunningStatus;

/// SDTの種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdtKind {
    /// 現在のTSにおけるSDT。
    Actual,
    /// 他のTSにおけるSDT。
    Other,
    /// BAT（Bouquet Association Table）。
    ///
    /// SDTと同じ形式のサービスループとして読み取るため、
    /// トランスポートストリーム識別にはブーケ識別が入る。
    Bouquet,
}

impl SdtKind {
    /// テーブル識別から`SdtKind`を得る。
    pub fn from_table_id(table_id: u8) -> Option<SdtKind> {
        match table_id {
            Sdt::TABLE_ID_ACTUAL => Some(SdtKind::Actual),
            Sdt::TABLE_ID_OTHER => Some(SdtKind::Other),
            Sdt::TABLE_ID_BAT => Some(SdtKind::Bouquet),
            _ => None,
        }
    }
}

/// 特定のトランスポートストリームに含まれるサービス。
#[derive(Debug, PartialEq, Eq)]
pub struct SdtService<'a> {
    /// サービス識別。
    pub service_id: u16,
    /// EIT［スケジュール］フラグ。
    pub eit_schedule_flag: bool,
    /// EIT［現在／次］フラグ。
    pub eit_present_following_flag: bool,
    /// 進行状態。
    pub running_status: RunningStatus,
    /// スクランブル。
    pub free_ca_mode: bool,
    /// 記述子ループ長。
    pub descriptors_loop_length: u16,
    /// 記述子の塊。パケットに含まれる分のみ。
    pub descriptors: DescriptorBlock<'a>,
}

impl<'a> SdtService<'a> {
    /// 記述子ループがパケット末尾またはセクション末尾で切れているかどうかを返す。
    #[inline]
    pub fn is_clipped(&self) -> bool {
        self.descriptors.len() < self.descriptors_loop_length as usize
    }
}

/// SDT（Service Description Table）。
#[derive(Debug, PartialEq, Eq)]
pub struct Sdt<'a> {
    /// SDTの種類。
    pub kind: SdtKind,
    /// テーブル識別。
    pub table_id: u8,
    /// セクションシンタクス指示。
    pub section_syntax_indicator: bool,
    /// セクション長。
    pub section_length: u16,
    /// トランスポートストリーム識別。
    pub transport_stream_id: u16,
    /// バージョン番号。
    pub version_number: u8,
    /// カレントネクスト指示。
    pub current_next_indicator: bool,
    /// セクション番号。
    pub section_number: u8,
    /// 最終セクション番号。
    pub last_section_number: u8,
    /// オリジナルネットワーク識別。
    pub original_network_id: u16,
    /// TSのサービスを格納する配列。
    pub services: Vec<SdtService<'a>>,
}

impl<'a> Sdt<'a> {
    /// 現在のTSにおけるSDTのテーブルID。
    pub const TABLE_ID_ACTUAL: u8 = 0x42;
    /// 他のTSにおけるSDTのテーブルID。
    pub const TABLE_ID_OTHER: u8 = 0x46;
    /// BATのテーブルID。
    pub const TABLE_ID_BAT: u8 = 0x4A;

    /// サービス`service`の[`ChannelKey`]を返す。
    #[inline]
    pub fn channel_key(&self, service: &SdtService) -> ChannelKey {
        ChannelKey {
            service_id: service.service_id,
            transport_stream_id: self.transport_stream_id,
            original_network_id: self.original_network_id,
        }
    }
}

impl<'a> PsiTable<'a> for Sdt<'a> {
    fn read(psi: &PsiSection<'a>) -> Option<Sdt<'a>> {
        let Some(kind) = SdtKind::from_table_id(psi.table_id) else {
            log::debug!("invalid Sdt::table_id");
            return None;
        };

        let data = psi.data;
        if data.len() < 3 {
            log::debug!("invalid Sdt");
            return None;
        }

        let original_network_id = data[0..=1].read_be_16();

        // データはセクション末尾（CRCを除く）とパケット末尾のうち短い方までに制限されており、
        // 消費した長さがそこに達するまでサービスを読む
        let mut data = &data[3..];
        let mut services = Vec::new();
        while !data.is_empty() {
            if data.len() < 5 {
                log::debug!("invalid SdtService");
                break;
            }

            let service_id = data[0..=1].read_be_16();
            let eit_schedule_flag = data[2] & 0b00000010 != 0;
            let eit_present_following_flag = data[2] & 0b00000001 != 0;
            let running_status = ((data[3] & 0b11100000) >> 5).into();
            let free_ca_mode = data[3] & 0b00010000 != 0;
            let descriptors_loop_length = data[3..=4].read_length_12();
            let (descriptors, rem) = DescriptorBlock::read_clamped(&data[5..], descriptors_loop_length);
            data = rem;

            services.push(SdtService {
                service_id,
                eit_schedule_flag,
                eit_present_following_flag,
                running_status,
                free_ca_mode,
                descriptors_loop_length,
                descriptors,
            });
        }

        Some(Sdt {
            kind,
            table_id: psi.table_id,
            section_syntax_indicator: psi.section_syntax_indicator,
            section_length: psi.section_length,
            transport_stream_id: psi.table_id_extension,
            version_number: psi.version_number,
            current_next_indicator: psi.current_next_indicator,
            section_number: psi.section_number,
            last_section_number: psi.last_section_number,
            original_network_id,
            services,
        })
    }
}

/// `packet`に含まれるSDTを読み取り、サービス記述子の名前を`registry`に設定する。
///
/// SDTのセクションを含まないパケットであれば何もせず`None`を返す。
/// そうでなければ見つかったサービス名の数を返す。
pub fn decode(packet: &Packet, offset: u64, registry: &mut ChannelRegistry) -> Option<usize> {
    let psi = match PsiSection::locate(packet) {
        Ok(psi) => psi,
        Err(e) => {
            log::trace!("SDT packet at {}: {}", offset, e);
            return None;
        }
    };
    if SdtKind::from_table_id(psi.table_id).is_none() {
        log::debug!("unknown table 0x{:02X} on SDT PID at {}", psi.table_id, offset);
        return None;
    }
    let sdt = Sdt::read(&psi)?;

    log::debug!(
        "SDT at {}: table_id=0x{:02X} section_length={} version={} section={}/{} tsid={} onid={}",
        offset,
        sdt.table_id,
        sdt.section_length,
        sdt.version_number,
        sdt.section_number,
        sdt.last_section_number,
        sdt.transport_stream_id,
        sdt.original_network_id,
    );

    let mut named = 0;
    for service in &sdt.services {
        let key = sdt.channel_key(service);
        for desc in service.descriptors.get_all::<ServiceDescriptor>() {
            let name = desc.name();
            log::debug!(
                "service {}: type=0x{:02X} provider={:?} name={:?}",
                key,
                desc.service_type,
                desc.provider_name(),
                name,
            );
            registry.name_channel(key, name);
            named += 1;
        }
        if service.is_clipped() {
            log::debug!("SDT service {} overruns the packet", key);
        }
    }

    Some(named)
}
