/// バイト列用拡張トレイト。
pub trait BytesExt {
    /// ビッグエンディアンで16ビット符号無し整数を読み込む。
    ///
    /// 事前に長さが2以上あると分かるようなコードであれば最適化が期待できる。
    fn read_be_16(&self) -> u16;

    /// 下位12ビットの長さフィールドを読み込む。
    ///
    /// セクション長や記述子ループ長など、上位4ビットにフラグや予約ビットを持つ長さに使う。
    #[inline]
    fn read_length_12(&self) -> u16 {
        self.read_be_16() & 0b0000_1111_1111_1111
    }
}

impl BytesExt for [u8] {
    #[inline]
    fn read_be_16(&self) -> u16 {
        u16::from_be_bytes([self[0], self[1]])
    }
}

/// スライス型用拡張トレイト。
pub trait SliceExt {
    /// スライスの要素型。
    type Item;

    /// スライスを`mid`の位置で分割する。
    ///
    /// `mid`が要素数より大きい場合は`None`を返す。
    fn split_at_opt(&self, mid: usize) -> Option<(&[Self::Item], &[Self::Item])>;

    /// 先頭から最大`len`個の要素と残りに分割する。
    ///
    /// 要素数が足りない場合は全体を先頭側として返す。
    fn split_at_clamped(&self, len: usize) -> (&[Self::Item], &[Self::Item]);
}

impl<T> SliceExt for [T] {
    type Item = T;

    #[inline]
    fn split_at_opt(&self, mid: usize) -> Option<(&[T], &[T])> {
        if mid > self.len() {
            None
        } else {
            Some(self.split_at(mid))
        }
    }

    #[inline]
    fn split_at_clamped(&self, len: usize) -> (&[T], &[T]) {
        self.split_at(std::cmp::min(len, self.len()))
    }
}

/// `{:02X}`形式で表示するためのラッパー。
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct UpperHex(pub u8);

impl std::fmt::Debug for UpperHex {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_be_u16() {
        assert_eq!(b"\x12\x34\x56\x78"[..].read_be_16(), 0x1234);
    }

    #[test]
    fn test_read_length_12() {
        assert_eq!(b"\xF1\x23"[..].read_length_12(), 0x123);
        assert_eq!(b"\x0F\xFF"[..].read_length_12(), 0xFFF);
    }

    #[test]
    fn test_slice_ext_split_at_opt() {
        assert_eq!(
            [0, 1, 2].split_at_opt(0),
            Some((&[] as &[_], &[0, 1, 2] as &[_])),
        );
        assert_eq!(
            [0, 1, 2].split_at_opt(2),
            Some((&[0, 1] as &[_], &[2] as &[_])),
        );
        assert_eq!(
            [0, 1, 2].split_at_opt(3),
            Some((&[0, 1, 2] as &[_], &[] as &[_])),
        );
        assert_eq!([0, 1, 2].split_at_opt(4), None);
    }

    #[test]
    fn test_slice_ext_split_at_clamped() {
        assert_eq!(
            [0, 1, 2].split_at_clamped(1),
            (&[0] as &[_], &[1, 2] as &[_]),
        );
        assert_eq!(
            [0, 1, 2].split_at_clamped(5),
            (&[0, 1, 2] as &[_], &[] as &[_]),
        );
    }
}
