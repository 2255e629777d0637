//! 走査中に見つかったチャンネルとイベントの保持。

use std::fmt;

use fxhash::{FxBuildHasher, FxHashMap};
use indexmap::IndexMap;

use crate::lang::LangCode;
use crate::psi::table::RunningStatus;
use crate::time::{DateTime, Duration};

/// サービス識別、トランスポートストリーム識別、オリジナルネットワーク識別の組。
///
/// SDTとEITの両方でサービスを一意に識別する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelKey {
    /// サービス識別。
    pub service_id: u16,
    /// トランスポートストリーム識別。
    pub transport_stream_id: u16,
    /// オリジナルネットワーク識別。
    pub original_network_id: u16,
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.service_id, self.transport_stream_id, self.original_network_id
        )
    }
}

/// チャンネル。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    /// チャンネルの識別。
    pub key: ChannelKey,
    /// サービス名。SDTで名前が与えられるまでは空。
    pub name: String,
}

/// 見つかったチャンネルを、最初に見つかった順で保持する。
///
/// チャンネルはEITで初めて見つかった時に作成され、SDTでは名前のみが設定される。
#[derive(Debug, Default, Clone)]
pub struct ChannelRegistry {
    channels: IndexMap<ChannelKey, ChannelRecord, FxBuildHasher>,
    // チャンネルが作成される前にSDTで見つかった名前
    pending_names: FxHashMap<ChannelKey, String>,
}

impl ChannelRegistry {
    /// 空の`ChannelRegistry`を生成する。
    #[inline]
    pub fn new() -> ChannelRegistry {
        ChannelRegistry::default()
    }

    /// `key`に対応するチャンネルを返す。
    #[inline]
    pub fn find(&self, key: &ChannelKey) -> Option<&ChannelRecord> {
        self.channels.get(key)
    }

    /// `key`に対応するチャンネルがあるかどうかを返す。
    #[inline]
    pub fn contains(&self, key: &ChannelKey) -> bool {
        self.channels.contains_key(key)
    }

    /// チャンネル数を返す。
    #[inline]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// チャンネルがひとつもないかどうかを返す。
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// チャンネルを見つかった順に返すイテレーター。
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &ChannelRecord> + '_ {
        self.channels.values()
    }

    /// `key`に対応するチャンネルがなければ作成する。
    ///
    /// 作成した場合は`true`を返す。
    /// 作成時の名前は、先にSDTで見つかっていればその名前、なければ空となる。
    pub fn ensure_channel(&mut self, key: ChannelKey) -> bool {
        if self.channels.contains_key(&key) {
            return false;
        }

        let name = self.pending_names.remove(&key).unwrap_or_default();
        log::debug!("new channel {} {:?}", key, name);
        self.channels.insert(key, ChannelRecord { key, name });
        true
    }

    /// `key`に対応するチャンネルに名前を設定する。
    ///
    /// チャンネルがまだなければ作成はせず、後で作成された時に使う名前として覚えておく。
    /// 既存のチャンネルに名前を設定した場合は`true`を返す。
    pub fn name_channel(&mut self, key: ChannelKey, name: String) -> bool {
        match self.channels.get_mut(&key) {
            Some(channel) => {
                channel.name = name;
                true
            }
            None => {
                self.pending_names.insert(key, name);
                false
            }
        }
    }
}

/// イベント識別とチャンネルの識別の組。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    /// イベント識別。
    pub event_id: u16,
    /// サービス識別。
    pub service_id: u16,
    /// トランスポートストリーム識別。
    pub transport_stream_id: u16,
    /// オリジナルネットワーク識別。
    pub original_network_id: u16,
}

impl EventKey {
    /// イベントが属するチャンネルの識別を返す。
    #[inline]
    pub fn channel(&self) -> ChannelKey {
        ChannelKey {
            service_id: self.service_id,
            transport_stream_id: self.transport_stream_id,
            original_network_id: self.original_network_id,
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.event_id, self.service_id, self.transport_stream_id, self.original_network_id
        )
    }
}

/// イベント。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// イベントの識別。
    pub key: EventKey,
    /// イベントを含むパケットの、入力先頭からのバイト位置。
    pub offset: u64,
    /// イベントを含むパケットの連続性指標。
    pub continuity_counter: u8,
    /// セクション長。
    pub section_length: u16,
    /// テーブル識別。
    pub table_id: u8,
    /// 開始時間。
    pub start_time: DateTime,
    /// 継続時間。
    pub duration: Duration,
    /// 進行状態。
    pub running_status: RunningStatus,
    /// スクランブル。
    pub free_ca_mode: bool,
    /// 最初に見つかったイベント記述子の言語コード。
    pub language: Option<LangCode>,
    /// 番組の説明。セクション長まで埋め文字で埋められる。
    pub description: String,
}

/// 見つかったイベントを、見つかった順で保持する。
///
/// 同じ識別のイベントは最初のものだけを保持する。
#[derive(Debug, Default, Clone)]
pub struct EventStore {
    events: IndexMap<EventKey, EventRecord, FxBuildHasher>,
}

impl EventStore {
    /// 空の`EventStore`を生成する。
    #[inline]
    pub fn new() -> EventStore {
        EventStore::default()
    }

    /// イベントを追加する。
    ///
    /// 同じ識別のイベントが既にある場合は何もせず、`record`を`Err`で返す。
    pub fn insert(&mut self, record: EventRecord) -> Result<(), EventRecord> {
        match self.events.entry(record.key) {
            indexmap::map::Entry::Occupied(_) => Err(record),
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(record);
                Ok(())
            }
        }
    }

    /// `key`に対応するイベントを返す。
    #[inline]
    pub fn get(&self, key: &EventKey) -> Option<&EventRecord> {
        self.events.get(key)
    }

    /// `key`に対応するイベントがあるかどうかを返す。
    #[inline]
    pub fn contains(&self, key: &EventKey) -> bool {
        self.events.contains_key(key)
    }

    /// イベント数を返す。
    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// イベントがひとつもないかどうかを返す。
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// イベントを追加された順に返すイテレーター。
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &EventRecord> + '_ {
        self.events.values()
    }
}

/// 1回の走査で得られたチャンネルとイベント。
#[derive(Debug, Default, Clone)]
pub struct ScanContext {
    /// チャンネル。
    pub channels: ChannelRegistry,
    /// イベント。
    pub events: EventStore,
}
