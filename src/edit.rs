//! カーソル位置のバイト編集
//!
//! すべて境界チェックしてから書き込み、範囲外はファイルに
//! 触れず失敗する。成功した書き込みはウィンドウのバッファにも
//! 反映され、表示の取り直しは不要。

use crate::error::{HxdError, Result};
use crate::source::ByteSource;
use crate::view::ViewWindow;

/// 1バイト上書き
pub fn set_byte(
    source: &mut ByteSource,
    window: &mut ViewWindow,
    offset: u64,
    value: u8,
) -> Result<()> {
    source.write_byte(offset, value)?;
    window.apply_edit(offset, value);
    Ok(())
}

/// 片方のニブルだけ書き換える(HEXカラムの1桁編集)
pub fn set_nibble(
    source: &mut ByteSource,
    window: &mut ViewWindow,
    offset: u64,
    high: bool,
    nibble: u8,
) -> Result<()> {
    let length = source.len();
    let Some(current) = source.byte_at(offset) else {
        return Err(HxdError::PositionOutOfBound { offset, length });
    };

    let nibble = nibble & 0x0F;
    let value = if high {
        (nibble << 4) | (current & 0x0F)
    } else {
        (current & 0xF0) | nibble
    };
    set_byte(source, window, offset, value)
}

/// ASCIIカラムでの1文字上書き(ASCII範囲外の文字は無視)
pub fn set_ascii_char(
    source: &mut ByteSource,
    window: &mut ViewWindow,
    offset: u64,
    ch: char,
) -> Result<()> {
    let length = source.len();
    if offset >= length {
        return Err(HxdError::PositionOutOfBound { offset, length });
    }
    if !ch.is_ascii() {
        return Ok(());
    }
    set_byte(source, window, offset, ch as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fixture(data: &[u8]) -> (NamedTempFile, ByteSource, ViewWindow) {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(data).expect("write fixture");
        file.flush().expect("flush fixture");
        let source = ByteSource::open(file.path()).expect("open fixture");
        let window = ViewWindow::new(&source, 16, 4);
        (file, source, window)
    }

    #[test]
    fn set_byte_commits_and_patches_window() {
        let (_f, mut source, mut window) = fixture(b"hello");

        set_byte(&mut source, &mut window, 1, b'a').unwrap();
        assert_eq!(source.read_range(0, 5), b"hallo");
        assert_eq!(window.buffer(), b"hallo");
    }

    #[test]
    fn out_of_bounds_edits_leave_file_untouched() {
        let (_f, mut source, mut window) = fixture(b"abc");

        assert!(matches!(
            set_byte(&mut source, &mut window, 3, 0xFF),
            Err(HxdError::PositionOutOfBound { .. })
        ));
        assert!(matches!(
            set_nibble(&mut source, &mut window, 3, true, 0xF),
            Err(HxdError::PositionOutOfBound { .. })
        ));
        assert!(matches!(
            set_ascii_char(&mut source, &mut window, 3, 'x'),
            Err(HxdError::PositionOutOfBound { .. })
        ));
        assert_eq!(source.read_range(0, 3), b"abc");
    }

    #[test]
    fn nibble_edit_preserves_the_other_half() {
        let (_f, mut source, mut window) = fixture(&[0xAB]);

        set_nibble(&mut source, &mut window, 0, true, 0x5).unwrap();
        assert_eq!(source.byte_at(0), Some(0x5B));

        set_nibble(&mut source, &mut window, 0, false, 0xC).unwrap();
        assert_eq!(source.byte_at(0), Some(0x5C));
    }

    #[test]
    fn ascii_edit_writes_byte_and_ignores_non_ascii() {
        let (_f, mut source, mut window) = fixture(b"....");

        set_ascii_char(&mut source, &mut window, 0, 'Z').unwrap();
        assert_eq!(source.byte_at(0), Some(b'Z'));

        // マルチバイト文字は1バイトに収まらないので書かない
        set_ascii_char(&mut source, &mut window, 1, 'あ').unwrap();
        assert_eq!(source.byte_at(1), Some(b'.'));
    }

    #[test]
    fn empty_file_edit_is_out_of_bound() {
        let (_f, mut source, mut window) = fixture(b"");
        assert!(matches!(
            set_byte(&mut source, &mut window, 0, 0x00),
            Err(HxdError::PositionOutOfBound { .. })
        ));
    }
}
