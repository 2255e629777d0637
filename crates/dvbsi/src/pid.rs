//! PID関連。

use std::fmt;

use crate::utils::BytesExt;

/// MPEG2-TSのPID（13ビット）。
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(u16);

// 定数はETSI EN 300 468による。
impl Pid {
    /// PIDの最大値。
    pub const MAX: u16 = 0x1FFF;

    /// プログラムアソシエーションテーブル（Program Association Table）。
    pub const PAT: Pid = Pid::new(0x0000);
    /// ネットワーク情報テーブル（Network Information Table）。
    pub const NIT: Pid = Pid::new(0x0010);
    /// サービス記述テーブル（Service Description Table）。
    pub const SDT: Pid = Pid::new(0x0011);
    /// ブーケアソシエーションテーブル（Bouquet Association Table）。
    pub const BAT: Pid = Pid::new(0x0011);
    /// イベント情報テーブル（Event Information Table）。
    pub const EIT: Pid = Pid::new(0x0012);
    /// ヌルパケット（Null packet）。
    pub const NULL: Pid = Pid::new(0x1FFF);

    /// `Pid`を生成する。
    ///
    /// # パニック
    ///
    /// `pid`の値が範囲外の際はパニックする。
    #[inline]
    pub const fn new(pid: u16) -> Pid {
        assert!(pid <= Pid::MAX);
        Pid(pid)
    }

    /// `pid`がPIDとして範囲内であれば`Pid`を生成する。
    #[inline]
    pub const fn try_new(pid: u16) -> Option<Pid> {
        if pid > Pid::MAX {
            None
        } else {
            Some(Pid(pid))
        }
    }

    /// `data`からPIDを読み出す。
    ///
    /// 上位バイトの下位5ビットを上位、次のバイトを下位とする13ビットの値である。
    ///
    /// # パニック
    ///
    /// `data`の長さが2未満の場合、このメソッドはパニックする。
    #[inline]
    pub fn read(data: &[u8]) -> Pid {
        Pid(data[0..=1].read_be_16() & Pid::MAX)
    }

    /// PIDを`u16`で返す。
    #[inline]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

impl Default for Pid {
    fn default() -> Self {
        Pid::NULL
    }
}

impl From<Pid> for u16 {
    fn from(value: Pid) -> Self {
        value.get()
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pid(0x{:04X})", self.0)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}
