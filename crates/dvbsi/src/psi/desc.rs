//! 記述子。
//!
//! 記述子ループはTSパケットの範囲内でのみ読み取る。
//! 本体がパケットに収まらない末尾の記述子は[`DescriptorBlock::iter`]では返さず、
//! [`DescriptorBlock::truncated`]で切り詰められた状態のまま得られる。

use std::fmt;

use crate::lang::LangCode;
use crate::text;
use crate::utils::{BytesExt, SliceExt, UpperHex};

/// 記述子を表すトレイト。
pub trait Descriptor<'a>: Sized {
    /// この記述子のタグ。
    const TAG: u8;

    /// `data`から記述子を読み取る。
    ///
    /// `data`には`descriptor_tag`と`descriptor_length`は含まない。
    fn read(data: &'a [u8]) -> Option<Self>;
}

/// パース前の記述子。
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawDescriptor<'a> {
    /// 記述子のタグ。
    pub tag: u8,

    /// 記述子の内容。
    ///
    /// [`DescriptorBlock::truncated`]から得た場合はパケット内に含まれる分のみとなる。
    pub data: &'a [u8],
}

impl<'a> fmt::Debug for RawDescriptor<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        struct PrintBytes<'a>(&'a [u8]);
        impl<'a> fmt::Debug for PrintBytes<'a> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{} bytes", self.0.len())
            }
        }

        f.debug_struct("RawDescriptor")
            .field("tag", &UpperHex(self.tag))
            .field("data", &PrintBytes(self.data))
            .finish()
    }
}

/// 複数の記述子からなる記述子群。
#[derive(Clone, PartialEq, Eq)]
pub struct DescriptorBlock<'a>(&'a [u8]);

impl<'a> DescriptorBlock<'a> {
    /// `data`全体を記述子群とする。
    #[inline]
    pub fn new(data: &'a [u8]) -> DescriptorBlock<'a> {
        DescriptorBlock(data)
    }

    /// `data`から`length`バイト分の記述子群を読み取り後続データと共に返す。
    ///
    /// データ長が不足している場合は`None`を返す。
    pub fn read_with_len(data: &'a [u8], length: u16) -> Option<(DescriptorBlock<'a>, &'a [u8])> {
        let (block, rem) = data.split_at_opt(length as usize)?;
        Some((DescriptorBlock(block), rem))
    }

    /// `data`から最大`length`バイト分の記述子群を読み取り後続データと共に返す。
    ///
    /// データ長が不足している場合は`data`全体を記述子群とし、後続データは空となる。
    /// 不足していたかどうかは[`DescriptorBlock::len`]と`length`を比べて判断する。
    #[inline]
    pub fn read_clamped(data: &'a [u8], length: u16) -> (DescriptorBlock<'a>, &'a [u8]) {
        let (block, rem) = data.split_at_clamped(length as usize);
        (DescriptorBlock(block), rem)
    }

    /// `data`から12ビットの長さを前置した記述子群を読み取り後続データと共に返す。
    ///
    /// データ長が不足している場合は`None`を返す。
    #[inline]
    pub fn read(data: &'a [u8]) -> Option<(DescriptorBlock<'a>, &'a [u8])> {
        if data.len() < 2 {
            return None;
        }

        let length = data[0..=1].read_length_12();
        DescriptorBlock::read_with_len(&data[2..], length)
    }

    /// 記述子群のバイト数を返す。
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 記述子群が空かどうかを返す。
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 内包する記述子群のイテレーターを返す。
    ///
    /// 本体が記述子群に収まらない記述子に到達した時点で終了する。
    #[inline]
    pub fn iter(&self) -> DescriptorIter<'a> {
        DescriptorIter(self.0)
    }

    /// 記述子群の末尾で、本体が収まらずに切れている記述子を返す。
    ///
    /// 返される記述子の`data`は記述子群に含まれる分のみとなる。
    /// タグと長さすら読み取れない場合や、切れている記述子がない場合は`None`を返す。
    pub fn truncated(&self) -> Option<RawDescriptor<'a>> {
        let mut iter = self.iter();
        iter.by_ref().for_each(drop);

        match *iter.0 {
            [tag, _, ref data @ ..] => Some(RawDescriptor { tag, data }),
            _ => None,
        }
    }

    /// 内包する記述子群から`T`のタグと一致する記述子を読み取って返す。
    ///
    /// `T`のタグと一致する記述子がない場合は`None`を返す。
    pub fn get<T: Descriptor<'a>>(&self) -> Option<T> {
        self.iter()
            .find(|d| d.tag == T::TAG)
            .and_then(|d| T::read(d.data))
    }

    /// 内包する記述子群から`T`のタグと一致する記述子をすべて読み取って返す。
    pub fn get_all<T: Descriptor<'a>>(&self) -> impl Iterator<Item = T> + 'a {
        self.iter().filter_map(|d| {
            if d.tag == T::TAG {
                T::read(d.data)
            } else {
                None
            }
        })
    }

    /// 内包する記述子群をパースしながら返すイテレーターを返す。
    #[inline]
    pub fn parsed(&self) -> impl Iterator<Item = AnyDescriptor<'a>> + 'a {
        self.iter().map(AnyDescriptor::read)
    }
}

impl<'a> fmt::Debug for DescriptorBlock<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("DescriptorBlock(")?;
        f.debug_list().entries(self).finish()?;
        f.write_str(")")
    }
}

impl<'a> IntoIterator for &DescriptorBlock<'a> {
    type Item = RawDescriptor<'a>;
    type IntoIter = DescriptorIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// [`DescriptorBlock`]のイテレーター。
#[derive(Clone)]
pub struct DescriptorIter<'a>(&'a [u8]);

impl<'a> Iterator for DescriptorIter<'a> {
    type Item = RawDescriptor<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let [tag, length, ref rem @ ..] = *self.0 else {
            return None;
        };
        let Some((data, tail)) = rem.split_at_opt(length as usize) else {
            log::debug!("descriptor 0x{:02X} overruns the block", tag);
            return None;
        };

        self.0 = tail;
        Some(RawDescriptor { tag, data })
    }
}

impl<'a> std::iter::FusedIterator for DescriptorIter<'a> {}

impl<'a> fmt::Debug for DescriptorIter<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DescriptorIter(")?;
        f.debug_list().entries(self.clone()).finish()?;
        f.write_str(")")
    }
}

/// サービス記述子。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor<'a> {
    /// サービス形式種別。
    pub service_type: u8,
    /// 事業者名。
    pub service_provider_name: &'a [u8],
    /// サービス名。
    pub service_name: &'a [u8],
}

impl<'a> ServiceDescriptor<'a> {
    /// 事業者名を文字列として返す。
    #[inline]
    pub fn provider_name(&self) -> String {
        text::decode_latin1(self.service_provider_name)
    }

    /// サービス名を文字列として返す。
    #[inline]
    pub fn name(&self) -> String {
        text::decode_latin1(self.service_name)
    }
}

impl<'a> Descriptor<'a> for ServiceDescriptor<'a> {
    const TAG: u8 = 0x48;

    fn read(data: &'a [u8]) -> Option<ServiceDescriptor<'a>> {
        let [service_type, service_provider_name_length, ref rem @ ..] = *data else {
            log::debug!("invalid ServiceDescriptor");
            return None;
        };
        let Some((service_provider_name, rem)) =
            rem.split_at_opt(service_provider_name_length as usize)
        else {
            log::debug!("invalid ServiceDescriptor::service_provider_name");
            return None;
        };
        let [service_name_length, ref rem @ ..] = *rem else {
            log::debug!("invalid ServiceDescriptor::service_name_length");
            return None;
        };
        let Some((service_name, _)) = rem.split_at_opt(service_name_length as usize) else {
            log::debug!("invalid ServiceDescriptor::service_name");
            return None;
        };

        Some(ServiceDescriptor {
            service_type,
            service_provider_name,
            service_name,
        })
    }
}

/// 短形式イベント記述子。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortEventDescriptor<'a> {
    /// 言語コード。
    pub lang_code: LangCode,
    /// 番組名。
    pub event_name: &'a [u8],
    /// 番組記述。
    pub text: &'a [u8],
}

impl<'a> ShortEventDescriptor<'a> {
    /// パケット末尾で切れた本体から、含まれる範囲の番組名と番組記述を読み取る。
    ///
    /// 言語コードすら含まれない場合は`None`を返す。
    pub fn read_clipped(data: &'a [u8]) -> Option<ShortEventDescriptor<'a>> {
        if data.len() < 3 {
            return None;
        }

        let lang_code = LangCode::read(data);
        let (event_name, text) = match data[3..] {
            [event_name_length, ref rem @ ..] => {
                let (event_name, rem) = rem.split_at_clamped(event_name_length as usize);
                let text = match *rem {
                    [text_length, ref rem @ ..] => rem.split_at_clamped(text_length as usize).0,
                    [] => &[][..],
                };
                (event_name, text)
            }
            [] => (&[][..], &[][..]),
        };

        Some(ShortEventDescriptor {
            lang_code,
            event_name,
            text,
        })
    }

    /// 番組名、番組名が空であれば番組記述を返す。
    ///
    /// どちらも空であれば`None`を返す。
    pub fn summary(&self) -> Option<&'a [u8]> {
        [self.event_name, self.text]
            .into_iter()
            .find(|s| !s.is_empty())
    }
}

impl<'a> Descriptor<'a> for ShortEventDescriptor<'a> {
    const TAG: u8 = 0x4D;

    fn read(data: &'a [u8]) -> Option<ShortEventDescriptor<'a>> {
        if data.len() < 4 {
            log::debug!("invalid ShortEventDescriptor");
            return None;
        }

        let lang_code = LangCode::read(data);
        let event_name_length = data[3];
        let Some((event_name, data)) = data[4..].split_at_opt(event_name_length as usize) else {
            log::debug!("invalid ShortEventDescriptor::event_name");
            return None;
        };
        let [text_length, ref text @ ..] = *data else {
            log::debug!("invalid ShortEventDescriptor::text_length");
            return None;
        };
        if text.len() != text_length as usize {
            log::debug!("invalid ShortEventDescriptor::text");
            return None;
        }

        Some(ShortEventDescriptor {
            lang_code,
            event_name,
            text,
        })
    }
}

/// 拡張形式イベント記述子における項目。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedEventItem<'a> {
    /// 項目名。
    pub item_description: &'a [u8],
    /// 項目記述。
    pub item: &'a [u8],
}

/// 拡張形式イベント記述子。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedEventDescriptor<'a> {
    /// 記述子番号（4ビット）。
    pub descriptor_number: u8,
    /// 最終記述子番号（4ビット）。
    pub last_descriptor_number: u8,
    /// 言語コード。
    pub lang_code: LangCode,
    /// 項目を格納する配列。
    pub items: Vec<ExtendedEventItem<'a>>,
    /// 拡張記述。
    pub text: &'a [u8],
}

impl<'a> ExtendedEventDescriptor<'a> {
    /// パケット末尾で切れた本体から、含まれる範囲の項目と拡張記述を読み取る。
    ///
    /// 言語コードすら含まれない場合は`None`を返す。
    pub fn read_clipped(data: &'a [u8]) -> Option<ExtendedEventDescriptor<'a>> {
        if data.len() < 4 {
            return None;
        }

        let descriptor_number = (data[0] & 0b11110000) >> 4;
        let last_descriptor_number = data[0] & 0b00001111;
        let lang_code = LangCode::read(&data[1..]);
        let (items, text) = match data[4..] {
            [length_of_items, ref rem @ ..] => {
                let (items, rem) = rem.split_at_clamped(length_of_items as usize);
                let text = match *rem {
                    [text_length, ref rem @ ..] => rem.split_at_clamped(text_length as usize).0,
                    [] => &[][..],
                };
                (read_items(items).unwrap_or_else(|items| items), text)
            }
            [] => (Vec::new(), &[][..]),
        };

        Some(ExtendedEventDescriptor {
            descriptor_number,
            last_descriptor_number,
            lang_code,
            items,
            text,
        })
    }

    /// 拡張記述、拡張記述が空であれば最初の項目記述を返す。
    ///
    /// どちらも空であれば`None`を返す。
    pub fn summary(&self) -> Option<&'a [u8]> {
        std::iter::once(self.text)
            .chain(self.items.first().map(|item| item.item))
            .find(|s| !s.is_empty())
    }
}

/// 項目を読み取る。
///
/// 途中で切れている項目があった場合は、それまでに読み取れた項目を`Err`で返す。
fn read_items(
    mut data: &[u8],
) -> Result<Vec<ExtendedEventItem<'_>>, Vec<ExtendedEventItem<'_>>> {
    let mut items = Vec::new();
    while let [item_description_length, ref rem @ ..] = *data {
        let Some((item_description, rem)) = rem.split_at_opt(item_description_length as usize)
        else {
            log::debug!("invalid ExtendedEventDescriptor::item_description");
            return Err(items);
        };
        let [item_length, ref rem @ ..] = *rem else {
            log::debug!("invalid ExtendedEventDescriptor::item_length");
            return Err(items);
        };
        let Some((item, rem)) = rem.split_at_opt(item_length as usize) else {
            log::debug!("invalid ExtendedEventDescriptor::item");
            return Err(items);
        };
        data = rem;

        items.push(ExtendedEventItem {
            item_description,
            item,
        });
    }

    Ok(items)
}

impl<'a> Descriptor<'a> for ExtendedEventDescriptor<'a> {
    const TAG: u8 = 0x4E;

    fn read(data: &'a [u8]) -> Option<ExtendedEventDescriptor<'a>> {
        if data.len() < 5 {
            log::debug!("invalid ExtendedEventDescriptor");
            return None;
        }

        let descriptor_number = (data[0] & 0b11110000) >> 4;
        let last_descriptor_number = data[0] & 0b00001111;
        let lang_code = LangCode::read(&data[1..]);
        let length_of_items = data[4];
        let Some((items, rem)) = data[5..].split_at_opt(length_of_items as usize) else {
            log::debug!("invalid ExtendedEventDescriptor::length_of_items");
            return None;
        };
        let items = read_items(items).ok()?;

        let [text_length, ref text @ ..] = *rem else {
            log::debug!("invalid ExtendedEventDescriptor::text_length");
            return None;
        };
        if text.len() != text_length as usize {
            log::debug!("invalid ExtendedEventDescriptor::text");
            return None;
        }

        Some(ExtendedEventDescriptor {
            descriptor_number,
            last_descriptor_number,
            lang_code,
            items,
            text,
        })
    }
}

/// 記述子ループ内で意味を持つ記述子。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyDescriptor<'a> {
    /// サービス記述子（タグ0x48）。
    Service(ServiceDescriptor<'a>),
    /// 短形式イベント記述子（タグ0x4D）。
    ShortEvent(ShortEventDescriptor<'a>),
    /// 拡張形式イベント記述子（タグ0x4E）。
    ExtendedEvent(ExtendedEventDescriptor<'a>),
    /// その他、またはパースに失敗した記述子。
    Other(RawDescriptor<'a>),
}

impl<'a> AnyDescriptor<'a> {
    /// `raw`をタグに応じてパースする。
    pub fn read(raw: RawDescriptor<'a>) -> AnyDescriptor<'a> {
        let parsed = match raw.tag {
            0x48 => ServiceDescriptor::read(raw.data).map(AnyDescriptor::Service),
            0x4D => ShortEventDescriptor::read(raw.data).map(AnyDescriptor::ShortEvent),
            0x4E => ExtendedEventDescriptor::read(raw.data).map(AnyDescriptor::ExtendedEvent),
            _ => None,
        };
        parsed.unwrap_or(AnyDescriptor::Other(raw))
    }

    /// パケット末尾で切れた記述子`raw`から、読み取れる範囲でイベント記述子を得る。
    pub fn read_clipped(raw: RawDescriptor<'a>) -> AnyDescriptor<'a> {
        let parsed = match raw.tag {
            0x4D => ShortEventDescriptor::read_clipped(raw.data).map(AnyDescriptor::ShortEvent),
            0x4E => {
                ExtendedEventDescriptor::read_clipped(raw.data).map(AnyDescriptor::ExtendedEvent)
            }
            _ => None,
        };
        parsed.unwrap_or(AnyDescriptor::Other(raw))
    }

    /// 記述子のタグを返す。
    pub fn tag(&self) -> u8 {
        match self {
            AnyDescriptor::Service(_) => ServiceDescriptor::TAG,
            AnyDescriptor::ShortEvent(_) => ShortEventDescriptor::TAG,
            AnyDescriptor::ExtendedEvent(_) => ExtendedEventDescriptor::TAG,
            AnyDescriptor::Other(raw) => raw.tag,
        }
    }

    /// イベント記述子であれば言語コードを返す。
    pub fn lang_code(&self) -> Option<LangCode> {
        match self {
            AnyDescriptor::ShortEvent(d) => Some(d.lang_code),
            AnyDescriptor::ExtendedEvent(d) => Some(d.lang_code),
            _ => None,
        }
    }

    /// イベント記述子であれば、番組の説明として使う文字列を返す。
    pub fn summary(&self) -> Option<&'a [u8]> {
        match self {
            AnyDescriptor::ShortEvent(d) => d.summary(),
            AnyDescriptor::ExtendedEvent(d) => d.summary(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{extended_event_descriptor, service_descriptor, short_event_descriptor};
    use assert_matches::assert_matches;

    #[test]
    fn test_descriptor_block() {
        let data = [
            &service_descriptor(0x01, b"Provider", b"Demo Channel")[..],
            &[0x5F, 0x04, 0x00, 0x00, 0x00, 0x01],
            &short_event_descriptor(b"eng", b"News", b""),
        ]
        .concat();
        let block = DescriptorBlock::new(&data);
        assert_eq!(block.iter().count(), 3);
        assert_eq!(block.truncated(), None);

        let service = block.get::<ServiceDescriptor>().unwrap();
        assert_eq!(service.service_type, 0x01);
        assert_eq!(service.provider_name(), "Provider");
        assert_eq!(service.name(), "Demo Channel");

        let tags: Vec<_> = block.parsed().map(|d| d.tag()).collect();
        assert_eq!(tags, [0x48, 0x5F, 0x4D]);
        assert_matches!(block.parsed().nth(1), Some(AnyDescriptor::Other(_)));
    }

    #[test]
    fn test_descriptor_block_read() {
        let data = [0xF0, 0x03, 0x52, 0x01, 0x00, 0xAA];
        let (block, rem) = DescriptorBlock::read(&data).unwrap();
        assert_eq!(block.len(), 3);
        assert_eq!(rem, &[0xAA]);

        assert_eq!(DescriptorBlock::read(&[0xF0, 0x05, 0x52]), None);

        let (block, rem) = DescriptorBlock::read_clamped(&data[2..], 0x100);
        assert_eq!(block.len(), 4);
        assert!(rem.is_empty());
    }

    #[test]
    fn test_descriptor_block_truncated() {
        let full = short_event_descriptor(b"eng", b"News", b"Headlines");
        let data = [&[0x52, 0x01, 0x00][..], &full[..full.len() - 4]].concat();
        let block = DescriptorBlock::new(&data);

        // 切れた記述子はイテレーターに含まれない
        assert_eq!(block.iter().count(), 1);
        let raw = block.truncated().unwrap();
        assert_eq!(raw.tag, ShortEventDescriptor::TAG);
        assert_eq!(ShortEventDescriptor::read(raw.data), None);

        let d = AnyDescriptor::read_clipped(raw);
        assert_eq!(d.lang_code(), Some(LangCode::ENG));
        assert_eq!(d.summary(), Some(&b"News"[..]));
        assert_matches!(d, AnyDescriptor::ShortEvent(ShortEventDescriptor { text, .. }) => {
            assert_eq!(text, b"Headl");
        });

        // タグのみ
        assert_eq!(DescriptorBlock::new(&[0x4D]).truncated(), None);
    }

    #[test]
    fn test_short_event_descriptor() {
        let data = short_event_descriptor(b"deu", b"", b"Nachrichten");
        let d = ShortEventDescriptor::read(&data[2..]).unwrap();
        assert_eq!(d.lang_code, LangCode::DEU);
        assert_eq!(d.event_name, b"");
        assert_eq!(d.text, b"Nachrichten");
        assert_eq!(d.summary(), Some(&b"Nachrichten"[..]));

        let data = short_event_descriptor(b"eng", b"", b"");
        let d = ShortEventDescriptor::read(&data[2..]).unwrap();
        assert_eq!(d.summary(), None);

        assert_eq!(ShortEventDescriptor::read(b"eng"), None);
        assert_eq!(ShortEventDescriptor::read(b"eng\x05ab"), None);
    }

    #[test]
    fn test_extended_event_descriptor() {
        let data = extended_event_descriptor(
            0x10,
            b"fra",
            &[("Acteurs", "Jean"), ("Genre", "Drame")],
            b"",
        );
        let d = ExtendedEventDescriptor::read(&data[2..]).unwrap();
        assert_eq!(d.descriptor_number, 1);
        assert_eq!(d.last_descriptor_number, 0);
        assert_eq!(d.lang_code, LangCode::FRA);
        assert_eq!(
            d.items,
            [
                ExtendedEventItem {
                    item_description: b"Acteurs",
                    item: b"Jean",
                },
                ExtendedEventItem {
                    item_description: b"Genre",
                    item: b"Drame",
                },
            ]
        );
        assert_eq!(d.summary(), Some(&b"Jean"[..]));

        let data = extended_event_descriptor(0x00, b"ita", &[], b"Telegiornale");
        let d = ExtendedEventDescriptor::read(&data[2..]).unwrap();
        assert!(d.items.is_empty());
        assert_eq!(d.summary(), Some(&b"Telegiornale"[..]));

        // 拡張記述の途中で切れている
        let d = ExtendedEventDescriptor::read_clipped(&data[2..10]).unwrap();
        assert_eq!(d.lang_code, LangCode::ITA);
        assert_eq!(d.text, b"Te");
        assert_eq!(ExtendedEventDescriptor::read_clipped(b"\x00it"), None);
    }

    #[test]
    fn test_service_descriptor_invalid() {
        assert_eq!(ServiceDescriptor::read(&[0x01]), None);
        assert_eq!(ServiceDescriptor::read(&[0x01, 0x05, b'a']), None);
        assert_eq!(ServiceDescriptor::read(&[0x01, 0x00, 0x03, b'a']), None);

        let d = ServiceDescriptor::read(&[0x19, 0x00, 0x02, b'H', b'D']).unwrap();
        assert_eq!(d.service_type, 0x19);
        assert_eq!(d.provider_name(), "");
        assert_eq!(d.name(), "HD");
    }
}
