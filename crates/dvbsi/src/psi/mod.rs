//! PSI/SI用のモジュール。
//!
//! セクションは1つのTSパケット内で完結するものとして扱い、
//! 複数パケットにまたがるセクションの再構成は行わない。
//! パケットに収まらない部分は切り捨てられ、[`PsiSection::truncated`]で確認できる。

pub mod desc;
pub mod table;

use thiserror::Error;

use crate::packet::Packet;
use crate::utils::BytesExt;

/// CRC32の長さ。
const CRC32_LENGTH: usize = 4;

/// [`PsiSection::locate`]で発生するエラー。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PsiError {
    /// パケットにペイロードがない。
    #[error("no payload in the packet")]
    NoPayload,

    /// ペイロードユニット開始インジケーターが立っておらず、セクションの先頭を含まない。
    #[error("packet does not start a section")]
    NotUnitStart,

    /// PSIセクションの長さが足りない。
    #[error("insufficient length of a PSI section")]
    InsufficientLength,

    /// スタッフィングに到達した。
    #[error("reached to stuffing bytes")]
    EndOfPsi,

    /// セクション長がヘッダーとCRCの長さに満たず、壊れたセクションである。
    #[error("corrupt section")]
    Corrupted,
}

/// 拡張形式のヘッダーを持つPSIのセクション。
///
/// SDT・EITはいずれも拡張形式のヘッダーを持つため、
/// セクションシンタクス指示の値に関わらず拡張形式として読み取る。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsiSection<'a> {
    /// テーブル識別。
    pub table_id: u8,
    /// セクションシンタクス指示。
    pub section_syntax_indicator: bool,
    /// セクション長（12ビット）。CRCを含む。
    pub section_length: u16,
    /// テーブル識別拡張。
    pub table_id_extension: u16,
    /// バージョン番号（5ビット）。
    pub version_number: u8,
    /// カレントネクスト指示。
    pub current_next_indicator: bool,
    /// セクション番号。
    pub section_number: u8,
    /// 最終セクション番号。
    pub last_section_number: u8,
    /// ヘッダー以降、CRCまたはパケット末尾までのデータ。
    pub data: &'a [u8],
    /// セクションがパケット内に収まらず途中で切れているかどうか。
    pub truncated: bool,
}

impl<'a> PsiSection<'a> {
    /// `packet`のペイロードからセクションの先頭を探し、[`PsiSection`]として読み取る。
    ///
    /// ペイロードユニット開始インジケーターが立っている場合のみ、
    /// ポインターフィールドに従ってセクションの先頭を求める。
    pub fn locate(packet: &'a Packet) -> Result<PsiSection<'a>, PsiError> {
        let Some(payload) = packet.payload() else {
            return Err(PsiError::NoPayload);
        };
        if !packet.unit_start_indicator() {
            return Err(PsiError::NotUnitStart);
        }
        let [pointer_field, ref rem @ ..] = *payload else {
            return Err(PsiError::InsufficientLength);
        };
        let Some(section) = rem.get(pointer_field as usize..) else {
            return Err(PsiError::InsufficientLength);
        };

        PsiSection::parse(section)
    }

    /// `buf`の先頭からセクションを読み取る。
    ///
    /// `buf`はセクションの先頭からパケット末尾までとする。
    pub fn parse(buf: &'a [u8]) -> Result<PsiSection<'a>, PsiError> {
        if buf.len() < 3 {
            return Err(PsiError::InsufficientLength);
        }

        let table_id = buf[0];
        if table_id == 0xFF {
            return Err(PsiError::EndOfPsi);
        }
        let section_syntax_indicator = buf[1] & 0b10000000 != 0;
        let section_length = buf[1..=2].read_length_12();
        if (section_length as usize) < 5 + CRC32_LENGTH {
            return Err(PsiError::Corrupted);
        }
        if buf.len() < 3 + 5 {
            return Err(PsiError::InsufficientLength);
        }

        let table_id_extension = buf[3..=4].read_be_16();
        let version_number = (buf[5] & 0b00111110) >> 1;
        let current_next_indicator = buf[5] & 0b00000001 != 0;
        let section_number = buf[6];
        let last_section_number = buf[7];

        // CRCの手前まで、ただしパケットに含まれる分のみ
        let section_end = 3 + section_length as usize;
        let data_end = std::cmp::min(section_end - CRC32_LENGTH, buf.len());
        let data = &buf[8..data_end];
        let truncated = section_end > buf.len();

        Ok(PsiSection {
            table_id,
            section_syntax_indicator,
            section_length,
            table_id_extension,
            version_number,
            current_next_indicator,
            section_number,
            last_section_number,
            data,
            truncated,
        })
    }
}

/// PSIテーブルを表すトレイト。
pub trait PsiTable<'a>: Sized {
    /// PSIテーブルを読み取る。
    fn read(psi: &PsiSection<'a>) -> Option<Self>;
}
