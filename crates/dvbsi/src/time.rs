//! MPEG2-TSにおける日付時刻。
//!
//! 開始時間はMJD（修正ユリウス日）16ビットとBCDの時分秒24ビット、
//! 継続時間はBCDの時分秒24ビットで符号化される。

use std::fmt::{self, Write};

use crate::utils::BytesExt;

/// BCD（4ビット×2桁）のバイトを、そのまま2桁の文字として書き込む。
///
/// 各ニブルは0～9であることを想定しているが、それ以外の値も16進数として書き込む。
fn write_bcd<W: Write>(w: &mut W, bcd: u8) -> fmt::Result {
    write!(w, "{:02x}", bcd)
}

/// BCDで符号化されたバイトを数値に変換する。
///
/// 各ニブルが0～9でなければ`None`を返す。
#[inline]
fn bcd_value(bcd: u8) -> Option<u8> {
    let (h, l) = (bcd >> 4, bcd & 0x0F);
    (h < 10 && l < 10).then(|| h * 10 + l)
}

/// 修正ユリウス日から求めた年月日。
///
/// ETSI EN 300 468 付録Cの変換式による。
/// 変換式が正しい結果を返すのは1900年3月1日から2100年2月28日までである。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MjdDate {
    /// 年（西暦）。
    pub year: i32,
    /// 月（1月＝1、12月＝12）。
    pub month: i32,
    /// 日（1～31）。
    pub day: i32,
}

impl MjdDate {
    /// 修正ユリウス日`mjd`から`MjdDate`を求める。
    pub fn from_mjd(mjd: u16) -> MjdDate {
        let mjd = mjd as f64;
        // 途中の切り捨てはすべてゼロ方向
        let y = ((mjd - 15078.2) / 365.25).trunc();
        let m = ((mjd - 14956.1 - (y * 365.25).trunc()) / 30.6001).trunc();
        let d = mjd - 14956. - (y * 365.25).trunc() - (m * 30.6001).trunc();
        let k = if m == 14. || m == 15. { 1. } else { 0. };

        MjdDate {
            year: (y + k + 1900.) as i32,
            month: (m - 1. - k * 12.) as i32,
            day: d as i32,
        }
    }

    /// `data`から`MjdDate`を読み取る。
    #[inline]
    pub fn read(data: &[u8; 2]) -> MjdDate {
        MjdDate::from_mjd(data[..].read_be_16())
    }
}

impl fmt::Display for MjdDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// 修正ユリウス日とBCDの時分秒からなる日付時刻。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateTime {
    /// 修正ユリウス日の生の値。
    pub mjd: u16,
    /// 修正ユリウス日から求めた年月日。
    pub date: MjdDate,
    /// BCDで符号化された時分秒。
    pub bcd_time: [u8; 3],
}

impl DateTime {
    /// `data`から`DateTime`を読み取る。
    pub fn read(data: &[u8; 5]) -> DateTime {
        let mjd = data[0..=1].read_be_16();

        DateTime {
            mjd,
            date: MjdDate::from_mjd(mjd),
            bcd_time: [data[2], data[3], data[4]],
        }
    }

    /// 時刻部分が正しいBCDであれば、時・分・秒を返す。
    pub fn hms(&self) -> Option<(u8, u8, u8)> {
        let [h, m, s] = self.bcd_time;
        Some((bcd_value(h)?, bcd_value(m)?, bcd_value(s)?))
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.date, f)?;
        f.write_char(' ')?;

        let [h, m, s] = self.bcd_time;
        write_bcd(f, h)?;
        f.write_char(':')?;
        write_bcd(f, m)?;
        f.write_char(':')?;
        write_bcd(f, s)
    }
}

/// BCDの時分秒で表される継続時間。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Duration(pub [u8; 3]);

impl Duration {
    /// `data`から`Duration`を読み取る。
    #[inline]
    pub fn read(data: &[u8; 3]) -> Duration {
        Duration(*data)
    }

    /// 継続時間を秒単位で返す。
    ///
    /// BCDとして不正なニブルを含む場合は`None`を返す。
    pub fn as_secs(&self) -> Option<u32> {
        let [h, m, s] = self.0;
        let (h, m, s) = (bcd_value(h)?, bcd_value(m)?, bcd_value(s)?);
        Some(h as u32 * 3600 + m as u32 * 60 + s as u32)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [h, m, s] = self.0;
        write_bcd(f, h)?;
        f.write_char(':')?;
        write_bcd(f, m)?;
        f.write_char(':')?;
        write_bcd(f, s)
    }
}

/// BCDで符号化された継続時間3バイトを`HH:MM:SS`形式の文字列にする。
#[inline]
pub fn decode_duration(data: &[u8; 3]) -> String {
    Duration::read(data).to_string()
}

/// MJDとBCDの時分秒からなる5バイトを`YYYY-MM-DD HH:MM:SS`形式の文字列にする。
#[inline]
pub fn decode_date(data: &[u8; 5]) -> String {
    DateTime::read(data).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_time() {
        // MJD = 45218, HMS = 12:34:56
        let date = MjdDate::read(&[0xB0, 0xA2]);
        assert_eq!(date.year, 1982);
        assert_eq!(date.month, 9);
        assert_eq!(date.day, 6);
        assert_eq!(date.to_string(), "1982-09-06");

        let dt = DateTime::read(&[0xB0, 0xA2, 0x12, 0x34, 0x56]);
        assert_eq!(dt.mjd, 45218);
        assert_eq!(dt.date, date);
        assert_eq!(dt.hms(), Some((12, 34, 56)));
        assert_eq!(dt.to_string(), "1982-09-06 12:34:56");
    }

    #[test]
    fn test_decode_date() {
        let [hi, lo] = 51543_u16.to_be_bytes();
        assert_eq!(decode_date(&[hi, lo, 0x13, 0x30, 0x00]), "1999-12-31 13:30:00");

        // 閏日（月が14となりk=1の分岐を通る）
        let [hi, lo] = 51603_u16.to_be_bytes();
        assert_eq!(decode_date(&[hi, lo, 0x13, 0x30, 0x00]), "2000-02-29 13:30:00");

        let [hi, lo] = 51544_u16.to_be_bytes();
        assert_eq!(decode_date(&[hi, lo, 0x00, 0x00, 0x00]), "2000-01-01 00:00:00");
    }

    #[test]
    fn test_mjd_matches_calendar() {
        let epoch = chrono::NaiveDate::from_ymd_opt(1858, 11, 17).unwrap();
        // 1900-03-01から、16ビットで表せる最後の日まで
        for mjd in 15079..=u16::MAX {
            let expected = epoch + chrono::Duration::days(mjd as i64);
            let date = MjdDate::from_mjd(mjd);

            use chrono::Datelike;
            assert_eq!(
                (date.year, date.month, date.day),
                (
                    expected.year(),
                    expected.month() as i32,
                    expected.day() as i32
                ),
                "mjd = {}",
                mjd,
            );
        }
    }

    #[test]
    fn test_decode_duration() {
        assert_eq!(decode_duration(&[0x01, 0x30, 0x00]), "01:30:00");
        assert_eq!(decode_duration(&[0x00, 0x05, 0x00]), "00:05:00");
        assert_eq!(decode_duration(&[0x23, 0x59, 0x59]), "23:59:59");

        assert_eq!(Duration::read(&[0x01, 0x30, 0x00]).as_secs(), Some(5400));
        // 不正なBCDはそのまま表示し、秒数には変換しない
        let invalid = Duration::read(&[0x1A, 0x00, 0x00]);
        assert_eq!(invalid.to_string(), "1a:00:00");
        assert_eq!(invalid.as_secs(), None);
    }

    #[test]
    fn test_out_of_range_mjd_does_not_panic() {
        // 変換式の範囲外では暦として正しくないが、値は返る
        let _ = MjdDate::from_mjd(0).to_string();
        let _ = MjdDate::from_mjd(15078).to_string();
    }
}
