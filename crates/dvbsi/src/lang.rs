//! 言語コード。

use std::fmt;

/// ISO 639-2で規定される3文字の言語コード。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LangCode(pub [u8; 3]);

impl LangCode {
    /// 英語。
    pub const ENG: LangCode = LangCode(*b"eng");
    /// ドイツ語。
    pub const DEU: LangCode = LangCode(*b"deu");
    /// フランス語。
    pub const FRA: LangCode = LangCode(*b"fra");
    /// イタリア語。
    pub const ITA: LangCode = LangCode(*b"ita");
    /// スペイン語。
    pub const SPA: LangCode = LangCode(*b"spa");
    /// 日本語。
    pub const JPN: LangCode = LangCode(*b"jpn");

    /// `data`の先頭3バイトから`LangCode`を読み取る。
    ///
    /// # パニック
    ///
    /// `data`の長さが3未満の場合、このメソッドはパニックする。
    #[inline]
    pub fn read(data: &[u8]) -> LangCode {
        LangCode([data[0], data[1], data[2]])
    }
}

impl fmt::Display for LangCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0.escape_ascii(), f)
    }
}
