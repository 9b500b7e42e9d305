//! Variant playlist generation.
//!
//! DASH formats already carry their fragment list; progressive formats are
//! probed for internal segment boundaries by walking top-level MP4 boxes
//! from a live byte stream until the `sidx` index box is found.

use std::fmt::Write as _;

use bytes::{Buf, BytesMut};
use futures::{Stream, StreamExt};

use crate::error::{Error, Result};
use crate::model::Format;

/// Upper bound on buffered probe data; a well-formed faststart file keeps
/// its sidx within the first few megabytes.
const MAX_PROBE_BYTES: usize = 32 * 1024 * 1024;

/// Build a variant playlist for a DASH format from its fragment list.
pub fn dash_variant_playlist(proxy_api: &str, format: &Format) -> Result<String> {
    if format.fragments.is_empty() {
        return Err(Error::validation(format!(
            "DASH format {} has no fragments",
            format.id
        )));
    }

    let target = format
        .fragments
        .iter()
        .filter_map(|f| f.duration)
        .fold(0.0_f64, f64::max)
        .ceil() as u64;

    let mut out = String::new();
    let _ = writeln!(out, "#EXTM3U");
    let _ = writeln!(out, "#EXT-X-VERSION:3");
    let _ = writeln!(out, "#EXT-X-TARGETDURATION:{target}");
    let _ = writeln!(out, "#EXT-X-MEDIA-SEQUENCE:0");
    let _ = writeln!(out, "#EXT-X-PLAYLIST-TYPE:VOD");

    for fragment in &format.fragments {
        let upstream = match (&fragment.url, &fragment.path) {
            (Some(url), _) => url.clone(),
            (None, Some(path)) => {
                let base = format.dash_fragments_base_url.as_deref().ok_or_else(|| {
                    Error::validation(format!(
                        "fragment of format {} has a path but no base url",
                        format.id
                    ))
                })?;
                format!("{base}{path}")
            }
            (None, None) => {
                return Err(Error::validation(format!(
                    "fragment of format {} has neither url nor path",
                    format.id
                )))
            }
        };

        let _ = writeln!(out, "#EXTINF:{:.6},", fragment.duration.unwrap_or(0.0));
        let _ = writeln!(
            out,
            "{proxy_api}?url={}",
            urlencoding::encode(&upstream)
        );
    }

    let _ = writeln!(out, "#EXT-X-ENDLIST");
    Ok(out)
}

/// Build a variant playlist for a progressive format by probing segment
/// boundaries from its byte stream.
///
/// `media_url` is the already-proxied URL every byte range points at.
pub async fn variant_playlist<S, E>(media_url: &str, mut body: S) -> Result<String>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    Error: From<E>,
{
    let index = probe_segment_index(&mut body).await?;

    let target = index
        .segments
        .iter()
        .map(|s| s.duration)
        .fold(0.0_f64, f64::max)
        .ceil() as u64;

    let mut out = String::new();
    let _ = writeln!(out, "#EXTM3U");
    let _ = writeln!(out, "#EXT-X-VERSION:4");
    let _ = writeln!(out, "#EXT-X-TARGETDURATION:{target}");
    let _ = writeln!(out, "#EXT-X-MEDIA-SEQUENCE:0");
    let _ = writeln!(out, "#EXT-X-PLAYLIST-TYPE:VOD");
    let _ = writeln!(
        out,
        "#EXT-X-MAP:URI=\"{media_url}\",BYTERANGE=\"{}@0\"",
        index.init_len
    );

    let mut offset = index.data_start;
    for segment in &index.segments {
        let _ = writeln!(out, "#EXTINF:{:.6},", segment.duration);
        let _ = writeln!(out, "#EXT-X-BYTERANGE:{}@{offset}", segment.size);
        let _ = writeln!(out, "{media_url}");
        offset += segment.size;
    }

    let _ = writeln!(out, "#EXT-X-ENDLIST");
    Ok(out)
}

struct SegmentIndex {
    /// Bytes before the sidx box: the init segment (ftyp + moov).
    init_len: u64,
    /// Absolute offset of the first media segment.
    data_start: u64,
    segments: Vec<Segment>,
}

struct Segment {
    size: u64,
    duration: f64,
}

/// Walk top-level boxes until `sidx`, buffering only what the walk needs.
async fn probe_segment_index<S, E>(body: &mut S) -> Result<SegmentIndex>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    Error: From<E>,
{
    let mut buf = BytesMut::new();
    let mut base: u64 = 0; // absolute offset of buf[0]
    let mut at: u64 = 0; // absolute offset of the current box header
    let mut eof = false;

    loop {
        while !eof && (buf.len() as u64) < at - base + 16 {
            match body.next().await {
                Some(chunk) => buf.extend_from_slice(&chunk?),
                None => eof = true,
            }
            if buf.len() > MAX_PROBE_BYTES {
                return Err(Error::UnsupportedContainer(
                    "segment index not found within probe window".into(),
                ));
            }
        }
        let rel = (at - base) as usize;
        if buf.len() < rel + 8 {
            return Err(Error::UnsupportedContainer(
                "stream ended before a segment index was found".into(),
            ));
        }

        let size32 = u32::from_be_bytes([buf[rel], buf[rel + 1], buf[rel + 2], buf[rel + 3]]);
        let box_type: [u8; 4] = [buf[rel + 4], buf[rel + 5], buf[rel + 6], buf[rel + 7]];
        let (box_size, header_size) = match size32 {
            0 => {
                // Box extends to end of file; nothing indexed can follow.
                return Err(Error::UnsupportedContainer(
                    "unterminated box before segment index".into(),
                ));
            }
            1 => {
                if buf.len() < rel + 16 {
                    return Err(Error::UnsupportedContainer(
                        "truncated extended box header".into(),
                    ));
                }
                let mut large = [0u8; 8];
                large.copy_from_slice(&buf[rel + 8..rel + 16]);
                (u64::from_be_bytes(large), 16u64)
            }
            n => (n as u64, 8u64),
        };
        if box_size < header_size {
            return Err(Error::UnsupportedContainer("malformed box size".into()));
        }

        match &box_type {
            b"sidx" => {
                while !eof && (buf.len() as u64) < at - base + box_size {
                    match body.next().await {
                        Some(chunk) => buf.extend_from_slice(&chunk?),
                        None => eof = true,
                    }
                    if buf.len() > MAX_PROBE_BYTES {
                        return Err(Error::UnsupportedContainer(
                            "segment index too large".into(),
                        ));
                    }
                }
                if (buf.len() as u64) < at - base + box_size {
                    return Err(Error::UnsupportedContainer(
                        "truncated segment index".into(),
                    ));
                }
                let payload =
                    &buf[(at - base + header_size) as usize..(at - base + box_size) as usize];
                return parse_sidx(payload, at, at + box_size);
            }
            b"mdat" | b"moof" => {
                // Media data reached without an index; ranged playback is
                // impossible for this container.
                return Err(Error::UnsupportedContainer(
                    "no segment index before media data".into(),
                ));
            }
            _ => {
                // Skip the box; drop buffered bytes we no longer need.
                at += box_size;
                if at > base {
                    let drop = ((at - base) as usize).min(buf.len());
                    buf.advance(drop);
                    base += drop as u64;
                }
            }
        }
    }
}

/// Decode a sidx payload (ISO 14496-12 §8.16.3).
fn parse_sidx(payload: &[u8], sidx_start: u64, sidx_end: u64) -> Result<SegmentIndex> {
    let fail = || Error::UnsupportedContainer("malformed segment index".into());

    if payload.len() < 12 {
        return Err(fail());
    }
    let version = payload[0];
    let timescale = u32::from_be_bytes(payload[8..12].try_into().map_err(|_| fail())?);
    if timescale == 0 {
        return Err(fail());
    }

    let (first_offset, mut cursor) = if version == 0 {
        if payload.len() < 20 {
            return Err(fail());
        }
        let off = u32::from_be_bytes(payload[16..20].try_into().map_err(|_| fail())?) as u64;
        (off, 20usize)
    } else {
        if payload.len() < 32 {
            return Err(fail());
        }
        let off = u64::from_be_bytes(payload[24..32].try_into().map_err(|_| fail())?);
        (off, 32usize)
    };

    if payload.len() < cursor + 4 {
        return Err(fail());
    }
    let count = u16::from_be_bytes(payload[cursor + 2..cursor + 4].try_into().map_err(|_| fail())?);
    cursor += 4;

    let mut segments = Vec::with_capacity(count as usize);
    for _ in 0..count {
        if payload.len() < cursor + 12 {
            return Err(fail());
        }
        let sized = u32::from_be_bytes(payload[cursor..cursor + 4].try_into().map_err(|_| fail())?);
        let duration_ticks =
            u32::from_be_bytes(payload[cursor + 4..cursor + 8].try_into().map_err(|_| fail())?);
        cursor += 12;

        // Top bit marks a reference to another sidx; those never occur in
        // the progressive files we probe.
        let size = (sized & 0x7fff_ffff) as u64;
        segments.push(Segment {
            size,
            duration: duration_ticks as f64 / timescale as f64,
        });
    }

    Ok(SegmentIndex {
        init_len: sidx_start,
        data_start: sidx_end + first_offset,
        segments,
    })
}
