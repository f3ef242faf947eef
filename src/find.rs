//! バイト列のチャンク検索
//!
//! ファイル全体を読み込まず、固定サイズのチャンクを
//! パターン長-1だけ重ねて走査する。チャンク境界をまたぐ
//! マッチも重なり部分で検出される。

use crate::error::{HxdError, Result};
use crate::source::ByteSource;

/// 1回の読み出しサイズ
const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// 検索の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindOutcome {
    /// マッチ先頭のオフセット
    Found(u64),
    /// 一周走査して見つからなかった
    NoMatch,
    /// 中断された(見つからなかったとは区別する)
    Cancelled,
}

/// パターンを検索する
///
/// 前方検索は`from + 1`から始めて現在位置の再マッチを避け、
/// wrap時は先頭に折り返して`from`まで走査して一周を検出する。
/// 後方検索はその鏡像で、wrap時はオフセット0から末尾へ折り返す。
/// `cancel`はチャンクごとに確認され、trueで打ち切る。
pub fn find(
    source: &ByteSource,
    pattern: &[u8],
    from: u64,
    direction: Direction,
    wrap: bool,
    cancel: &mut dyn FnMut() -> bool,
) -> Result<FindOutcome> {
    if pattern.is_empty() {
        return Err(HxdError::FinderEmptyString);
    }
    find_chunked(source, pattern, from, direction, wrap, cancel, CHUNK_SIZE)
}

fn find_chunked(
    source: &ByteSource,
    pattern: &[u8],
    from: u64,
    direction: Direction,
    wrap: bool,
    cancel: &mut dyn FnMut() -> bool,
    chunk: usize,
) -> Result<FindOutcome> {
    let length = source.len();
    if pattern.len() as u64 > length {
        return Ok(FindOutcome::NoMatch);
    }

    let from = from.min(length - 1);
    // マッチ開始位置として取り得る上限(この先頭ならパターンが収まる)
    let start_limit = length - pattern.len() as u64 + 1;

    // 走査するマッチ開始位置の区間 [a, b)
    let mut segments: Vec<(u64, u64)> = Vec::new();
    match direction {
        Direction::Forward => {
            if from + 1 < start_limit {
                segments.push((from + 1, start_limit));
            }
            if wrap {
                segments.push((0, (from + 1).min(start_limit)));
            }
        }
        Direction::Backward => {
            if from > 0 {
                segments.push((0, from.min(start_limit)));
            }
            if wrap && from < start_limit {
                segments.push((from, start_limit));
            }
        }
    }

    for (a, b) in segments {
        let hit = match direction {
            Direction::Forward => scan_forward(source, pattern, a, b, cancel, chunk)?,
            Direction::Backward => scan_backward(source, pattern, a, b, cancel, chunk)?,
        };
        match hit {
            FindOutcome::NoMatch => continue,
            other => return Ok(other),
        }
    }
    Ok(FindOutcome::NoMatch)
}

/// [a, b)の開始位置を前から走査し、最初のマッチを返す
fn scan_forward(
    source: &ByteSource,
    pattern: &[u8],
    a: u64,
    b: u64,
    cancel: &mut dyn FnMut() -> bool,
    chunk: usize,
) -> Result<FindOutcome> {
    let mut cs = a;
    while cs < b {
        if cancel() {
            return Ok(FindOutcome::Cancelled);
        }

        let cell_end = (cs + chunk as u64).min(b);
        // 境界またぎ検出のためパターン長-1だけ余分に読む
        let hay = source.read_range(cs, (cell_end - cs) as usize + pattern.len() - 1);
        if let Some(rel) = hay.windows(pattern.len()).position(|w| w == pattern) {
            return Ok(FindOutcome::Found(cs + rel as u64));
        }
        cs = cell_end;
    }
    Ok(FindOutcome::NoMatch)
}

/// [a, b)の開始位置を後ろから走査し、最後のマッチを返す
fn scan_backward(
    source: &ByteSource,
    pattern: &[u8],
    a: u64,
    b: u64,
    cancel: &mut dyn FnMut() -> bool,
    chunk: usize,
) -> Result<FindOutcome> {
    let mut end = b;
    while end > a {
        if cancel() {
            return Ok(FindOutcome::Cancelled);
        }

        let cs = end.saturating_sub(chunk as u64).max(a);
        let hay = source.read_range(cs, (end - cs) as usize + pattern.len() - 1);
        if let Some(rel) = hay.windows(pattern.len()).rposition(|w| w == pattern) {
            return Ok(FindOutcome::Found(cs + rel as u64));
        }
        end = cs;
    }
    Ok(FindOutcome::NoMatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fixture(data: &[u8]) -> (NamedTempFile, ByteSource) {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(data).expect("write fixture");
        file.flush().expect("flush fixture");
        let source = ByteSource::open(file.path()).expect("open fixture");
        (file, source)
    }

    fn no_cancel() -> impl FnMut() -> bool {
        || false
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let (_f, source) = fixture(b"data");
        let err = find(&source, b"", 0, Direction::Forward, true, &mut no_cancel()).unwrap_err();
        assert!(matches!(err, HxdError::FinderEmptyString));
    }

    #[test]
    fn single_occurrence_found_from_either_side_with_wrap() {
        let mut data = vec![0u8; 100];
        data[10..13].copy_from_slice(b"XYZ");
        let (_f, source) = fixture(&data);

        // fromがマッチより手前でも後ろでも、wrapがあれば同じ位置に当たる
        for from in [0, 3, 10, 50, 99] {
            let hit = find(&source, b"XYZ", from, Direction::Forward, true, &mut no_cancel()).unwrap();
            assert_eq!(hit, FindOutcome::Found(10), "forward from {from}");

            let hit = find(&source, b"XYZ", from, Direction::Backward, true, &mut no_cancel()).unwrap();
            assert_eq!(hit, FindOutcome::Found(10), "backward from {from}");
        }
    }

    #[test]
    fn absent_pattern_scans_once_and_stops() {
        let (_f, source) = fixture(&[0u8; 4096]);
        let hit = find(&source, b"missing", 100, Direction::Forward, true, &mut no_cancel()).unwrap();
        assert_eq!(hit, FindOutcome::NoMatch);

        let hit = find(&source, b"missing", 100, Direction::Backward, true, &mut no_cancel()).unwrap();
        assert_eq!(hit, FindOutcome::NoMatch);
    }

    #[test]
    fn forward_skips_current_position_until_wrap() {
        let mut data = vec![0u8; 40];
        data[20..23].copy_from_slice(b"abc");
        let (_f, source) = fixture(&data);

        // 現在位置のマッチは折り返しの最後にだけ再訪される
        let hit = find(&source, b"abc", 20, Direction::Forward, true, &mut no_cancel()).unwrap();
        assert_eq!(hit, FindOutcome::Found(20));

        let hit = find(&source, b"abc", 20, Direction::Forward, false, &mut no_cancel()).unwrap();
        assert_eq!(hit, FindOutcome::NoMatch);
    }

    #[test]
    fn nearest_occurrence_wins_in_each_direction() {
        let mut data = vec![0u8; 100];
        data[10..12].copy_from_slice(b"hi");
        data[50..52].copy_from_slice(b"hi");
        let (_f, source) = fixture(&data);

        let hit = find(&source, b"hi", 20, Direction::Forward, true, &mut no_cancel()).unwrap();
        assert_eq!(hit, FindOutcome::Found(50));

        let hit = find(&source, b"hi", 20, Direction::Backward, true, &mut no_cancel()).unwrap();
        assert_eq!(hit, FindOutcome::Found(10));
    }

    #[test]
    fn backward_from_zero_wraps_to_end() {
        let mut data = vec![0u8; 100];
        data[90..93].copy_from_slice(b"end");
        let (_f, source) = fixture(&data);

        let hit = find(&source, b"end", 0, Direction::Backward, true, &mut no_cancel()).unwrap();
        assert_eq!(hit, FindOutcome::Found(90));

        let hit = find(&source, b"end", 0, Direction::Backward, false, &mut no_cancel()).unwrap();
        assert_eq!(hit, FindOutcome::NoMatch);
    }

    #[test]
    fn match_straddling_chunk_boundary_is_found() {
        let mut data = vec![0u8; 64];
        data[14..18].copy_from_slice(b"SEAM");
        let (_f, source) = fixture(&data);
        let mut cancel = no_cancel();

        // チャンク16の境界(16)をまたぐ
        let hit =
            find_chunked(&source, b"SEAM", 0, Direction::Forward, false, &mut cancel, 16).unwrap();
        assert_eq!(hit, FindOutcome::Found(14));

        let hit =
            find_chunked(&source, b"SEAM", 60, Direction::Backward, false, &mut cancel, 16).unwrap();
        assert_eq!(hit, FindOutcome::Found(14));
    }

    #[test]
    fn match_at_end_of_file_is_found() {
        let mut data = vec![0u8; 32];
        data[29..32].copy_from_slice(b"EOF");
        let (_f, source) = fixture(&data);

        let hit = find(&source, b"EOF", 0, Direction::Forward, false, &mut no_cancel()).unwrap();
        assert_eq!(hit, FindOutcome::Found(29));
    }

    #[test]
    fn pattern_longer_than_file_never_matches() {
        let (_f, source) = fixture(b"ab");
        let hit = find(&source, b"abcdef", 0, Direction::Forward, true, &mut no_cancel()).unwrap();
        assert_eq!(hit, FindOutcome::NoMatch);
    }

    #[test]
    fn cancellation_is_reported_between_chunks() {
        let (_f, source) = fixture(&[0u8; 256]);
        let mut calls = 0;
        let mut cancel = || {
            calls += 1;
            calls > 1
        };

        let hit =
            find_chunked(&source, b"gone", 0, Direction::Forward, false, &mut cancel, 16).unwrap();
        assert_eq!(hit, FindOutcome::Cancelled);
    }

    #[test]
    fn large_file_with_default_chunking() {
        let mut data = vec![0u8; 200_000];
        data[150_000..150_004].copy_from_slice(b"DEEP");
        let (_f, source) = fixture(&data);

        let hit = find(&source, b"DEEP", 0, Direction::Forward, false, &mut no_cancel()).unwrap();
        assert_eq!(hit, FindOutcome::Found(150_000));
    }
}
