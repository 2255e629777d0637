//! 走査結果の表示。

use std::io::{self, Write};
use std::time::Duration;

use colored::Colorize;
use dvbsi::registry::{ChannelRegistry, EventStore};
use dvbsi::text::FILLER;
use dvbsi::ScanContext;

/// チャンネルを1行ずつ書き込む。
pub fn write_channels<W: Write>(w: &mut W, channels: &ChannelRegistry) -> io::Result<()> {
    for channel in channels.iter() {
        let name = if channel.name.is_empty() {
            "(unnamed)".dimmed()
        } else {
            channel.name.as_str().bold()
        };
        writeln!(w, "{} {}", channel.key.to_string().green(), name)?;
    }
    Ok(())
}

/// イベントを1行ずつ書き込む。
pub fn write_events<W: Write>(w: &mut W, events: &EventStore) -> io::Result<()> {
    for event in events.iter() {
        let language = match event.language {
            Some(lang) => lang.to_string(),
            None => "---".to_owned(),
        };
        writeln!(
            w,
            "{} {} {} {:?} {} {}",
            event.key.to_string().green(),
            event.start_time,
            event.duration,
            event.running_status,
            language.cyan(),
            event.description.trim_end_matches(FILLER),
        )?;
    }
    Ok(())
}

/// 見つかったチャンネル数・イベント数と所要時間を書き込む。
pub fn write_summary<W: Write>(
    w: &mut W,
    context: &ScanContext,
    elapsed: Duration,
) -> io::Result<()> {
    let lines = [
        format!("TOTAL number of services found: {}", context.channels.len()),
        format!("TOTAL number of EIT found: {}", context.events.len()),
        format!("TOTAL time spent: {}s", elapsed.as_secs_f64().round()),
    ];
    for line in lines {
        writeln!(w, "{}", line.on_blue())?;
    }
    Ok(())
}
