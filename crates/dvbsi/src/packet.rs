//! MPEG2-TSのパケット。

use std::fmt;
use std::io::{self, Read};

use thiserror::Error;

use crate::pid::Pid;

/// 同期バイト。
pub const SYNC_BYTE: u8 = 0x47;
/// TSパケットの大きさ。
pub const PACKET_SIZE: usize = 188;

/// [`Packet::check`]で検出される、処理対象外のパケット。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CellError {
    /// 同期バイトが`0x47`ではない。
    #[error("invalid sync byte 0x{0:02X}")]
    SyncByte(u8),

    /// トランスポートエラーインジケーターが立っている。
    #[error("transport error indicator is set")]
    TransportError,

    /// スクランブル制御がゼロではない。
    ///
    /// 内包する`u8`にはトランスポートスクランブル制御（2ビット）が入る。
    #[error("scrambled packet (scrambling control {0:#04b})")]
    Scrambled(u8),
}

/// MPEG2-TSのパケット。
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Packet(pub [u8; PACKET_SIZE]);

impl Packet {
    /// `r`からTSパケットを順次読み込むイテレーターを生成する。
    ///
    /// 入力は188バイト単位で区切られているものとし、同期の取り直しは行わない。
    /// 末尾の188バイトに満たない部分は読み捨て、その長さは[`PacketIter::trailing`]で得られる。
    ///
    /// # サンプル
    ///
    /// ```
    /// # fn main() -> std::io::Result<()> {
    /// # let file = &mut (&[] as &[u8]);
    /// for packet in dvbsi::Packet::iter(file) {
    ///     let packet = packet?;
    ///     println!("{:?}: {:?}", packet.pid(), packet.check());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[inline]
    #[must_use]
    pub fn iter<R: Read>(r: R) -> PacketIter<R> {
        PacketIter { r, trailing: 0 }
    }

    /// `r`から188バイトを読み込みTSパケットとする。
    ///
    /// 入力の終端に達した場合、また188バイトに満たないまま終端に達した場合は`None`を返す。
    pub fn read<R: Read>(r: R) -> io::Result<Option<Packet>> {
        Ok(read_cell(r)?.ok())
    }

    /// パケットが処理対象として正常かどうかを確認する。
    ///
    /// 同期バイト、トランスポートエラーインジケーター、スクランブル制御の順に確認する。
    pub fn check(&self) -> Result<(), CellError> {
        if self.sync_byte() != SYNC_BYTE {
            return Err(CellError::SyncByte(self.sync_byte()));
        }
        if self.error_indicator() {
            return Err(CellError::TransportError);
        }
        if self.scrambling_control() != 0 {
            return Err(CellError::Scrambled(self.scrambling_control()));
        }

        Ok(())
    }

    /// 同期バイトを返す。
    #[inline]
    pub fn sync_byte(&self) -> u8 {
        self.0[0]
    }

    /// トランスポートエラーインジケーターを返す。
    #[inline]
    pub fn error_indicator(&self) -> bool {
        self.0[1] & 0b10000000 != 0
    }

    /// ペイロードユニット開始インジケーターを返す。
    #[inline]
    pub fn unit_start_indicator(&self) -> bool {
        self.0[1] & 0b01000000 != 0
    }

    /// トランスポート優先度を返す。
    #[inline]
    pub fn priority(&self) -> bool {
        self.0[1] & 0b00100000 != 0
    }

    /// PIDを返す。
    #[inline]
    pub fn pid(&self) -> Pid {
        Pid::read(&self.0[1..])
    }

    /// トランスポートスクランブル制御（2ビット）を返す。
    #[inline]
    pub fn scrambling_control(&self) -> u8 {
        (self.0[3] & 0b11000000) >> 6
    }

    /// パケットがスクランブル処理されているかを返す。
    #[inline]
    pub fn is_scrambled(&self) -> bool {
        self.scrambling_control() != 0
    }

    /// アダプテーションフィールド制御（2ビット）を返す。
    #[inline]
    pub fn adaptation_field_control(&self) -> u8 {
        (self.0[3] & 0b00110000) >> 4
    }

    /// 連続性指標（4ビット）を返す。
    #[inline]
    pub fn continuity_counter(&self) -> u8 {
        self.0[3] & 0b00001111
    }

    /// パケットがアダプテーションフィールドを含むかどうかを返す。
    #[inline]
    pub fn has_adaptation_field(&self) -> bool {
        self.adaptation_field_control() & 0b10 != 0
    }

    /// アダプテーションフィールドがある場合、adaptation_field_lengthを返す。
    #[inline]
    pub fn adaptation_field_length(&self) -> Option<u8> {
        self.has_adaptation_field().then(|| self.0[4])
    }

    /// パケットがペイロードを含むかどうかを返す。
    #[inline]
    pub fn has_payload(&self) -> bool {
        self.adaptation_field_control() & 0b01 != 0
    }

    /// ペイロードの開始位置を返す。
    ///
    /// ペイロードがない場合や、アダプテーションフィールド長が異常な場合は`None`を返す。
    pub fn payload_offset(&self) -> Option<usize> {
        if !self.has_payload() {
            return None;
        }

        let offset = match self.adaptation_field_length() {
            Some(afl) => 4 + 1 + afl as usize,
            None => 4,
        };
        (offset <= PACKET_SIZE).then_some(offset)
    }

    /// ペイロードを返す。
    #[inline]
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload_offset().map(|offset| &self.0[offset..])
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Packet")
            .field("sync_byte", &self.sync_byte())
            .field("error_indicator", &self.error_indicator())
            .field("unit_start_indicator", &self.unit_start_indicator())
            .field("priority", &self.priority())
            .field("pid", &self.pid())
            .field("scrambling_control", &self.scrambling_control())
            .field("adaptation_field_control", &self.adaptation_field_control())
            .field("continuity_counter", &self.continuity_counter())
            .finish_non_exhaustive()
    }
}

/// `r`から1パケット分を読み込む。
///
/// 188バイトに満たないまま終端に達した場合は、読み込めたバイト数を`Err`で返す。
fn read_cell<R: Read>(mut r: R) -> io::Result<Result<Packet, usize>> {
    let mut packet = Packet([0; PACKET_SIZE]);
    let mut filled = 0;
    while filled < PACKET_SIZE {
        match r.read(&mut packet.0[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
    }

    if filled == PACKET_SIZE {
        Ok(Ok(packet))
    } else {
        Ok(Err(filled))
    }
}

/// [`Packet::iter`]から返される。TSパケットを順次読み込むイテレーター。
#[derive(Debug)]
pub struct PacketIter<R> {
    r: R,
    trailing: usize,
}

impl<R> PacketIter<R> {
    /// 末尾で読み捨てた、188バイトに満たない部分の長さを返す。
    ///
    /// イテレーターが終端に達する前は0を返す。
    #[inline]
    pub fn trailing(&self) -> usize {
        self.trailing
    }
}

impl<R: Read> Iterator for PacketIter<R> {
    type Item = io::Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        match read_cell(&mut self.r) {
            Ok(Ok(packet)) => Some(Ok(packet)),
            Ok(Err(trailing)) => {
                self.trailing = trailing;
                None
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{packet, PACKET_EIT};
    use assert_matches::assert_matches;

    #[test]
    fn test_packet_read() {
        let pkt: &[u8] = &PACKET_EIT.0;

        assert_eq!(Packet::read(&mut &pkt[..0]).unwrap(), None);
        assert_eq!(Packet::read(&mut &pkt[1..]).unwrap(), None);
        assert_eq!(Packet::read(&mut &*pkt).unwrap(), Some(PACKET_EIT));
    }

    #[test]
    fn test_packet_read_err() {
        struct ReadErr(io::ErrorKind);
        impl Read for ReadErr {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(self.0.into())
            }
        }

        assert_matches!(
            Packet::read(ReadErr(io::ErrorKind::UnexpectedEof)),
            Ok(None)
        );
        assert_matches!(
            Packet::read(ReadErr(io::ErrorKind::BrokenPipe)),
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe
        );
    }

    #[test]
    fn test_packet_check() {
        let pkt = packet!([0x00], [0; 187]);
        assert_eq!(pkt.check(), Err(CellError::SyncByte(0x00)));

        let pkt = packet!([SYNC_BYTE, 0b10000000, 0x12, 0x10], [0; 184]);
        assert!(pkt.error_indicator());
        assert_eq!(pkt.check(), Err(CellError::TransportError));

        for sc in 1..=3 {
            let pkt = packet!([SYNC_BYTE, 0x00, 0x12, (sc << 6) | 0x10], [0; 184]);
            assert!(pkt.is_scrambled());
            assert_eq!(pkt.check(), Err(CellError::Scrambled(sc)));
        }

        assert_eq!(PACKET_EIT.check(), Ok(()));
    }

    #[test]
    fn test_packet_accessor() {
        assert!(!PACKET_EIT.error_indicator());
        assert!(PACKET_EIT.unit_start_indicator());
        assert!(!PACKET_EIT.priority());
        assert_eq!(PACKET_EIT.pid(), Pid::EIT);
        assert_eq!(PACKET_EIT.scrambling_control(), 0b00);
        assert_eq!(PACKET_EIT.adaptation_field_control(), 0b01);
        assert_eq!(PACKET_EIT.continuity_counter(), 8);
        assert_eq!(PACKET_EIT.adaptation_field_length(), None);
        assert_eq!(PACKET_EIT.payload(), Some(&PACKET_EIT.0[4..]));
    }

    #[test]
    fn test_packet_payload_with_adaptation_field() {
        let pkt = packet!([SYNC_BYTE, 0x40, 0x11, 0b00110101, 3], [0xFF; 3], [0xAB; 180]);
        assert!(pkt.has_adaptation_field());
        assert_eq!(pkt.adaptation_field_length(), Some(3));
        assert_eq!(pkt.payload_offset(), Some(8));
        assert_eq!(pkt.payload(), Some(&[0xABu8; 180][..]));

        // アダプテーションフィールドのみ
        let pkt = packet!([SYNC_BYTE, 0x00, 0x11, 0b00100000, 183], [0xFF; 183]);
        assert_eq!(pkt.payload(), None);

        // アダプテーションフィールド長がパケットを超える
        let pkt = packet!([SYNC_BYTE, 0x00, 0x11, 0b00110000, 200], [0xFF; 183]);
        assert_eq!(pkt.payload(), None);
    }

    #[test]
    fn test_packet_iter() {
        let data = [&PACKET_EIT.0[..], &PACKET_EIT.0[..], &[SYNC_BYTE; 10][..]].concat();
        let mut iter = Packet::iter(&*data);
        assert_eq!(iter.next().unwrap().unwrap(), PACKET_EIT);
        assert_eq!(iter.next().unwrap().unwrap(), PACKET_EIT);
        assert_matches!(iter.next(), None);
        assert_eq!(iter.trailing(), 10);
    }
}
