//! Master playlist generation, filtering, and quality sorting.

use std::fmt::Write as _;

use crate::error::Result;
use crate::model::{Format, Video};

/// Build a master playlist from a video's format list.
///
/// One variant per non-storyboard video format, each pointing back at the
/// variant-generation endpoint with the format serialized as `format_json`;
/// audio-only formats become renditions of a single audio group.
pub fn master_playlist(variant_api: &str, video: &Video) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(out, "#EXTM3U");
    let _ = writeln!(out, "#EXT-X-VERSION:6");

    let audio_formats: Vec<&Format> = video
        .formats
        .iter()
        .filter(|f| !f.is_storyboard() && f.is_audio_only())
        .collect();

    for (i, format) in audio_formats.iter().enumerate() {
        let mut line = format!(
            "#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"audio\",NAME=\"{}\"",
            format.name.as_deref().unwrap_or(&format.id),
        );
        if let Some(language) = &format.language {
            let _ = write!(line, ",LANGUAGE=\"{language}\"");
        }
        let _ = write!(
            line,
            ",DEFAULT={},URI=\"{}\"",
            if i == 0 { "YES" } else { "NO" },
            variant_uri(variant_api, format)?,
        );
        let _ = writeln!(out, "{line}");
    }

    for format in &video.formats {
        if format.is_storyboard() || format.vcodec().is_none() {
            continue;
        }

        let bandwidth = format
            .average_bitrate
            .map(|kbps| (kbps * 1000.0) as u64)
            .unwrap_or(1_000_000);
        let mut line = format!("#EXT-X-STREAM-INF:BANDWIDTH={bandwidth}");
        if let (Some(w), Some(h)) = (format.width, format.height) {
            let _ = write!(line, ",RESOLUTION={w}x{h}");
        }
        let codecs = match (format.vcodec(), format.acodec()) {
            (Some(v), Some(a)) => format!("{v},{a}"),
            (Some(v), None) => v.to_owned(),
            _ => unreachable!("variant formats always carry a video codec"),
        };
        let _ = write!(line, ",CODECS=\"{codecs}\"");
        if let Some(fps) = format.fps {
            let _ = write!(line, ",FRAME-RATE={fps:.3}");
        }
        if !audio_formats.is_empty() && format.acodec().is_none() {
            let _ = write!(line, ",AUDIO=\"audio\"");
        }

        let _ = writeln!(out, "{line}");
        let _ = writeln!(out, "{}", variant_uri(variant_api, format)?);
    }

    Ok(out)
}

fn variant_uri(variant_api: &str, format: &Format) -> Result<String> {
    let serialized = serde_json::to_string(format)?;
    Ok(format!(
        "{variant_api}?format_json={}",
        urlencoding::encode(&serialized)
    ))
}

/// Drop every variant above the given height or frame-rate ceiling.
/// Variants without the relevant attribute are kept; surviving content is
/// passed through byte-for-byte, line endings included.
pub fn filter_master_playlist(content: &str, max_height: u32, max_fps: f64) -> String {
    let mut out = String::with_capacity(content.len());
    let mut lines = content.split_inclusive('\n');

    while let Some(line) = lines.next() {
        if !line.starts_with("#EXT-X-STREAM-INF") {
            out.push_str(line);
            continue;
        }

        let info = trimmed(line);
        let keep = variant_height(info).map_or(true, |h| h <= max_height)
            && variant_fps(info).map_or(true, |f| f <= max_fps);
        if keep {
            out.push_str(line);
            if let Some(uri) = lines.next() {
                out.push_str(uri);
            }
        } else {
            lines.next();
        }
    }

    out
}

/// Sort a master playlist's variants by descending quality: height, then
/// frame rate, then bandwidth. Non-variant lines keep their positions and
/// their original line endings around the variant block.
pub fn sort_master_playlist(content: &str) -> String {
    let mut ordered: Vec<&str> = Vec::new();
    let mut suffix: Vec<&str> = Vec::new();
    let mut variants: Vec<(&str, &str)> = Vec::new();

    let mut lines = content.split_inclusive('\n');
    while let Some(line) = lines.next() {
        if line.starts_with("#EXT-X-STREAM-INF") {
            let uri = lines.next().unwrap_or_default();
            variants.push((line, uri));
        } else if variants.is_empty() {
            ordered.push(line);
        } else {
            suffix.push(line);
        }
    }

    variants.sort_by_key(|(info, _)| {
        let info = trimmed(info);
        std::cmp::Reverse((
            variant_height(info).unwrap_or(0),
            variant_fps(info).map(|f| (f * 1000.0) as u64).unwrap_or(0),
            variant_bandwidth(info).unwrap_or(0),
        ))
    });

    for (info, uri) in variants {
        ordered.push(info);
        ordered.push(uri);
    }
    ordered.append(&mut suffix);

    let mut out = String::with_capacity(content.len() + 1);
    let last = ordered.len().saturating_sub(1);
    for (i, segment) in ordered.iter().enumerate() {
        out.push_str(segment);
        // Reordering can move an unterminated final line; restore its break.
        if i != last && !segment.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Strip the line terminator off a `split_inclusive` segment.
fn trimmed(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Split an attribute list, respecting quoted values (CODECS contains
/// commas).
fn attribute<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let list = line.split_once(':')?.1;
    let mut rest = list;
    while !rest.is_empty() {
        let eq = rest.find('=')?;
        let key = &rest[..eq];
        rest = &rest[eq + 1..];

        let (value, remainder) = if let Some(stripped) = rest.strip_prefix('"') {
            let close = stripped.find('"')?;
            (
                &stripped[..close],
                stripped[close + 1..].strip_prefix(',').unwrap_or(""),
            )
        } else {
            match rest.find(',') {
                Some(comma) => (&rest[..comma], &rest[comma + 1..]),
                None => (rest, ""),
            }
        };

        if key == name {
            return Some(value);
        }
        rest = remainder;
    }
    None
}

fn variant_height(info: &str) -> Option<u32> {
    let resolution = attribute(info, "RESOLUTION")?;
    resolution.split_once('x')?.1.parse().ok()
}

fn variant_fps(info: &str) -> Option<f64> {
    attribute(info, "FRAME-RATE")?.parse().ok()
}

fn variant_bandwidth(info: &str) -> Option<u64> {
    attribute(info, "BANDWIDTH")?.parse().ok()
}
