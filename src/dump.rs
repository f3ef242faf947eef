//! ファイル全体のテキストダンプ
//!
//! ウィンドウを介さず、先頭から行単位でソースを歩いて
//! 整形済みの行を書き出す。対話モードと同じ整形を通る。

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{HxdError, Result};
use crate::render::{self, OffsetMode};
use crate::source::ByteSource;

/// 出力先のパス(`<file>.hexdmp`)
pub fn dump_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".hexdmp");
    PathBuf::from(name)
}

/// ファイル全体をダンプする
///
/// 行ごとに書き出すため、途中で失敗すると部分的な出力が残る。
/// 失敗はそのまま呼び出し側へ返す。
pub fn dump(path: &Path, row_width: usize, mode: OffsetMode) -> Result<PathBuf> {
    let source = ByteSource::open(path)?;
    let row_width = row_width.max(1);

    let out_path = dump_path(path);
    let file = File::create(&out_path).map_err(|e| HxdError::DumpCannotWrite { source: e })?;
    let mut sink = BufWriter::new(file);

    let width = render::offset_width(source.len(), mode);
    let mut offset = 0u64;
    while offset < source.len() {
        let row = source.read_range(offset, row_width);
        writeln!(
            sink,
            "{}",
            render::render_row(row, offset, row_width, mode, width)
        )
        .map_err(|e| HxdError::DumpCannotWrite { source: e })?;
        offset += row_width as u64;
    }

    sink.flush()
        .map_err(|e| HxdError::DumpCannotWrite { source: e })?;
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::TempDir;

    fn fixture(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).expect("create fixture");
        file.write_all(data).expect("write fixture");
        path
    }

    #[test]
    fn five_byte_file_dumps_one_matching_line() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "tiny.bin", &[0x41, 0x42, 0x43, 0x0A, 0xFF]);

        let out = dump(&path, 16, OffsetMode::Hexadecimal).unwrap();
        assert_eq!(out, dir.path().join("tiny.bin.hexdmp"));

        let text = std::fs::read_to_string(&out).unwrap();
        let expected = format!("00000000  {:<48}  ABC..\n", "41 42 43 0A FF");
        assert_eq!(text, expected);
    }

    #[test]
    fn multi_row_dump_walks_whole_file() {
        let dir = TempDir::new().unwrap();
        let data: Vec<u8> = (0..=255).collect();
        let path = fixture(&dir, "all.bin", &data);

        let out = dump(&path, 16, OffsetMode::Hexadecimal).unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 16);
        assert!(lines[0].starts_with("00000000  00 01 02"));
        assert!(lines[15].starts_with("000000F0  F0 F1 F2"));
    }

    #[test]
    fn missing_file_reports_not_found() {
        let err = dump(
            Path::new("/nonexistent/hxd-dump-input"),
            16,
            OffsetMode::Hexadecimal,
        )
        .unwrap_err();
        assert!(matches!(err, HxdError::FileNotFound { .. }));
    }

    #[test]
    fn empty_file_produces_empty_dump() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "empty.bin", b"");

        let out = dump(&path, 16, OffsetMode::Hexadecimal).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "");
    }
}
