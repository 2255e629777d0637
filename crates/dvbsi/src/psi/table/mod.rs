//! PSIテーブルの定義。

pub mod eit;
pub mod sdt;

pub use eit::{Eit, EitEvent, EitKind};
pub use sdt::{Sdt, SdtKind, SdtService};

/// 進行状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RunningStatus {
    /// 未定義。
    Undefined,
    /// 非実行中。
    NotRunning,
    /// 数秒以内に開始（例：映像記録用）。
    StartsSoon,
    /// 停止中。
    Pausing,
    /// 実行中。
    Running,
    /// サービス休止中。
    OffAir,
    /// 予約。
    Reserved(u8),
}

impl From<u8> for RunningStatus {
    #[inline]
    fn from(value: u8) -> RunningStatus {
        match value {
            0 => RunningStatus::Undefined,
            1 => RunningStatus::NotRunning,
            2 => RunningStatus::StartsSoon,
            3 => RunningStatus::Pausing,
            4 => RunningStatus::Running,
            5 => RunningStatus::OffAir,
            v => RunningStatus::Reserved(v),
        }
    }
}

impl From<RunningStatus> for u8 {
    #[inline]
    fn from(value: RunningStatus) -> u8 {
        match value {
            RunningStatus::Undefined => 0,
            RunningStatus::NotRunning => 1,
            RunningStatus::StartsSoon => 2,
            RunningStatus::Pausing => 3,
            RunningStatus::Running => 4,
            RunningStatus::OffAir => 5,
            RunningStatus::Reserved(v) => v,
        }
    }
}
