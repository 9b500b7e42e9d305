//! WebVTT cue generation for chapters and storyboards.
//!
//! Both producers emit the literal `WEBVTT` header followed by
//! blank-line-separated cues, with `HH:MM:SS.mmm` timestamps.

use crate::model::{Format, Video};

/// Format seconds as a WebVTT timestamp, e.g. `00:03:22.067`.
pub fn timestamp(seconds: f64) -> String {
    let mut s = seconds;
    let h = (s / 3600.0).floor();
    s -= h * 3600.0;
    let m = (s / 60.0).floor();
    s -= m * 60.0;
    format!("{h:02.0}:{m:02.0}:{s:06.3}")
}

/// Chapter cues: a 1-based index, a timestamp range, and the title per cue.
pub fn chapters(video: &Video) -> String {
    let mut lines = vec!["WEBVTT".to_owned()];

    for (i, chapter) in video.chapters.iter().flatten().enumerate() {
        lines.push(String::new());
        lines.push((i + 1).to_string());
        lines.push(format!(
            "{} --> {}",
            timestamp(chapter.start_sec),
            timestamp(chapter.end_sec)
        ));
        lines.push(chapter.title.clone());
    }

    lines.join("\n")
}

/// Storyboard cues: one per grid cell of the tallest storyboard format,
/// addressed with `#xywh=` media fragment locators.
///
/// Emission stops once the running time reaches the summed fragment
/// duration, even mid-fragment.
pub fn storyboard(video: &Video) -> String {
    let mut lines = vec!["WEBVTT".to_owned()];

    let board = video
        .formats
        .iter()
        .filter(|f| f.is_storyboard())
        .max_by_key(|f| f.height.unwrap_or(0));
    let Some(board) = board else {
        return lines.join("\n");
    };
    if board.fragments.is_empty() {
        return lines.join("\n");
    }

    let max_sec: f64 = board.fragments.iter().filter_map(|f| f.duration).sum();
    let mut now = 0.0_f64;

    for fragment in &board.fragments {
        let cells = cells_per_fragment(board);
        let sec_per_cell = fragment.duration.unwrap_or(0.0) / cells as f64;

        for row in 0..board.rows.unwrap_or(0) {
            for col in 0..board.columns.unwrap_or(0) {
                let end = now + sec_per_cell;
                lines.push(String::new());
                lines.push(format!("{} --> {}", timestamp(now), timestamp(end)));

                let (w, h) = (board.width.unwrap_or(0), board.height.unwrap_or(0));
                lines.push(format!(
                    "/proxy/get?url={}#xywh={},{},{},{}",
                    urlencoding::encode(fragment.url.as_deref().unwrap_or_default()),
                    w * col,
                    h * row,
                    w,
                    h,
                ));

                now = end;
                if now >= max_sec {
                    return lines.join("\n");
                }
            }
        }
    }

    lines.join("\n")
}

fn cells_per_fragment(board: &Format) -> u32 {
    board.columns.unwrap_or(1).max(1) * board.rows.unwrap_or(1).max(1)
}
