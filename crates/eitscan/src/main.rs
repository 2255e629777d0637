//! DVBのTSファイルからチャンネルと番組情報を抽出する。

mod dump;
mod report;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use dvbsi::packet::PACKET_SIZE;
use dvbsi::{Packet, Scanner};

struct AppArgs {
    dump: bool,
    list: bool,
    path: PathBuf,
}

impl AppArgs {
    const HELP: &str = "\
TSファイルからチャンネルと番組情報を抽出するコマンド

USAGE:
  eitscan [OPTIONS] PATH

FLAGS:
  -h, --help  このヘルプを表示する
  --dump      SDTとEITのパケットを16進ダンプとして標準エラー出力に表示する
  --list      見つかったチャンネルと番組を一覧表示する

ARGS:
  <PATH>      チャンネルと番組情報を抽出するTSファイルのパス
";

    fn parse() -> Result<AppArgs, pico_args::Error> {
        let mut args = pico_args::Arguments::from_env();

        if args.contains(["-h", "--help"]) {
            print!("{}", Self::HELP);
            std::process::exit(0);
        }

        let dump = args.contains("--dump");
        let list = args.contains("--list");
        let Some(path) = args.opt_free_from_str()? else {
            eprint!("{}", Self::HELP);
            std::process::exit(1);
        };

        let remaining = args.finish();
        if !remaining.is_empty() {
            log::warn!("unused arguments: {:?}", remaining);
        }

        Ok(AppArgs { dump, list, path })
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = AppArgs::parse()?;
    let started = Instant::now();

    let file = File::open(&args.path)
        .with_context(|| format!("failed to open {}", args.path.display()))?;
    let file = BufReader::with_capacity(PACKET_SIZE * 1024, file);

    let mut scanner = Scanner::new();
    let mut packets = Packet::iter(file);
    let mut offset = 0;
    for packet in &mut packets {
        let packet = packet.with_context(|| format!("failed to read at {}", offset))?;
        let table = scanner.feed(offset, &packet);
        if args.dump && table.is_some() {
            eprint!("{}", dump::HexDump::new(&packet.0, offset));
        }
        offset += PACKET_SIZE as u64;
    }

    let result = scanner.finish(packets.trailing());
    log::debug!("{:?}", result.stats);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.list {
        report::write_channels(&mut out, &result.context.channels)?;
        report::write_events(&mut out, &result.context.events)?;
    }
    report::write_summary(&mut out, &result.context, started.elapsed())?;

    Ok(())
}
