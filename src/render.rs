//! オフセット/HEX/ASCIIのグリッド整形
//!
//! 純粋な文字列整形のみを行い、I/Oや端末の知識は持たない。
//! TUIウィジェットとダンプ出力の両方がここを通る。

/// オフセット表示の基数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetMode {
    #[default]
    Hexadecimal,
    Decimal,
    Octal,
}

impl OffsetMode {
    /// CLI引数(h/d/o)からパース
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "h" => Some(OffsetMode::Hexadecimal),
            "d" => Some(OffsetMode::Decimal),
            "o" => Some(OffsetMode::Octal),
            _ => None,
        }
    }

    /// 次のモード(表示切替用)
    pub fn next(self) -> Self {
        match self {
            OffsetMode::Hexadecimal => OffsetMode::Decimal,
            OffsetMode::Decimal => OffsetMode::Octal,
            OffsetMode::Octal => OffsetMode::Hexadecimal,
        }
    }

    pub fn base(self) -> u64 {
        match self {
            OffsetMode::Hexadecimal => 16,
            OffsetMode::Decimal => 10,
            OffsetMode::Octal => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OffsetMode::Hexadecimal => "HEX",
            OffsetMode::Decimal => "DEC",
            OffsetMode::Octal => "OCT",
        }
    }
}

/// 1行のバイト数の指定方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowWidth {
    Fixed(usize),
    /// 端末幅から毎回計算する
    Auto,
}

/// グループ区切りを入れるバイト数
const GROUP: usize = 8;

/// オフセットラベルの桁数
///
/// ファイル末尾のオフセットが収まる桁数を基数ごとの下限
/// (hex 8 / dec 10 / oct 11)に切り上げる。ページではなく
/// ファイル全体で桁が揃う。
pub fn offset_width(length: u64, mode: OffsetMode) -> usize {
    let floor = match mode {
        OffsetMode::Hexadecimal => 8,
        OffsetMode::Decimal => 10,
        OffsetMode::Octal => 11,
    };

    let mut digits = 1;
    let mut rest = length.saturating_sub(1);
    while rest >= mode.base() {
        rest /= mode.base();
        digits += 1;
    }
    floor.max(digits)
}

/// オフセットラベルを整形(ゼロ詰め、hexは大文字・接頭辞なし)
pub fn format_offset(offset: u64, mode: OffsetMode, width: usize) -> String {
    match mode {
        OffsetMode::Hexadecimal => format!("{offset:0width$X}"),
        OffsetMode::Decimal => format!("{offset:0width$}"),
        OffsetMode::Octal => format!("{offset:0width$o}"),
    }
}

/// HEXカラムの固定幅(8バイトごとのグループ区切り込み)
pub fn hex_col_width(row_width: usize) -> usize {
    row_width * 3 - 1 + (row_width - 1) / GROUP
}

/// 1行の表示幅の合計
pub fn row_total_width(row_width: usize, offset_width: usize) -> usize {
    offset_width + 2 + hex_col_width(row_width) + 2 + row_width
}

/// 表示可能なバイトはそのまま、それ以外はプレースホルダ
pub fn ascii_cell(byte: u8) -> char {
    match byte {
        0x20..=0x7E => byte as char,
        _ => '.',
    }
}

/// HEXカラムを整形
///
/// bytesがrow_widthより短い行(EOF直前)は残りのセルを空白にする。
pub fn hex_cells(bytes: &[u8], row_width: usize) -> String {
    let mut out = String::with_capacity(hex_col_width(row_width));
    for i in 0..row_width {
        match bytes.get(i) {
            Some(b) => out.push_str(&format!("{b:02X}")),
            None => out.push_str("  "),
        }
        if i + 1 < row_width {
            out.push(' ');
            if (i + 1) % GROUP == 0 {
                out.push(' ');
            }
        }
    }
    out
}

/// ASCIIカラムを整形(EOF以降のセルは出力しない)
pub fn ascii_cells(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| ascii_cell(b)).collect()
}

/// 1行分のテキストを整形
pub fn render_row(
    bytes: &[u8],
    row_offset: u64,
    row_width: usize,
    mode: OffsetMode,
    offset_width: usize,
) -> String {
    format!(
        "{}  {}  {}",
        format_offset(row_offset, mode, offset_width),
        hex_cells(bytes, row_width),
        ascii_cells(bytes),
    )
}

/// 端末幅から1行のバイト数を計算する
pub fn auto_row_width(term_width: u16, offset_width: usize) -> usize {
    let total = term_width as usize;
    let mut rw = total.saturating_sub(offset_width + 4) / 4;
    while rw > 1 && row_total_width(rw, offset_width) > total {
        rw -= 1;
    }
    rw.max(1)
}

const SIZE_KB: u64 = 1024;
const SIZE_MB: u64 = SIZE_KB * 1024;
const SIZE_GB: u64 = SIZE_MB * 1024;
const SIZE_TB: u64 = SIZE_GB * 1024;

/// ファイルサイズの読みやすい表記
pub fn format_size(size: u64) -> String {
    if size < SIZE_KB {
        format!("{size} B")
    } else if size < SIZE_MB {
        format!("{:.2} KB", size as f64 / SIZE_KB as f64)
    } else if size < SIZE_GB {
        format!("{:.2} MB", size as f64 / SIZE_MB as f64)
    } else if size < SIZE_TB {
        format!("{:.2} GB", size as f64 / SIZE_GB as f64)
    } else {
        format!("{:.2} TB", size as f64 / SIZE_TB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_byte_file_renders_one_row() {
        let bytes = [0x41, 0x42, 0x43, 0x0A, 0xFF];
        let width = offset_width(5, OffsetMode::Hexadecimal);
        assert_eq!(width, 8);

        let row = render_row(&bytes, 0, 16, OffsetMode::Hexadecimal, width);
        let expected = format!("00000000  {:<48}  ABC..", "41 42 43 0A FF");
        assert_eq!(row, expected);
    }

    #[test]
    fn hex_cells_group_gap_every_eight_bytes() {
        let bytes: Vec<u8> = (0..16).collect();
        let cells = hex_cells(&bytes, 16);
        assert_eq!(
            cells,
            "00 01 02 03 04 05 06 07  08 09 0A 0B 0C 0D 0E 0F"
        );
        assert_eq!(cells.len(), hex_col_width(16));

        // ちょうど1グループなら区切りは入らない
        assert_eq!(hex_cells(&bytes[..8], 8), "00 01 02 03 04 05 06 07");
    }

    #[test]
    fn offset_width_grows_with_file_length() {
        assert_eq!(offset_width(0, OffsetMode::Hexadecimal), 8);
        assert_eq!(offset_width(5, OffsetMode::Hexadecimal), 8);
        assert_eq!(offset_width(1 << 32, OffsetMode::Hexadecimal), 8);
        assert_eq!(offset_width((1 << 32) + 1, OffsetMode::Hexadecimal), 9);

        assert_eq!(offset_width(5, OffsetMode::Decimal), 10);
        assert_eq!(offset_width(5, OffsetMode::Octal), 11);
    }

    #[test]
    fn format_offset_by_mode() {
        assert_eq!(format_offset(255, OffsetMode::Hexadecimal, 8), "000000FF");
        assert_eq!(format_offset(255, OffsetMode::Decimal, 10), "0000000255");
        assert_eq!(format_offset(255, OffsetMode::Octal, 11), "00000000377");
    }

    #[test]
    fn auto_width_fits_terminal() {
        // 80桁端末では定番の16バイト/行になる
        assert_eq!(auto_row_width(80, 8), 16);
        assert!(row_total_width(auto_row_width(80, 8), 8) <= 80);

        // どんなに狭くても1バイトは表示する
        assert_eq!(auto_row_width(1, 8), 1);
    }

    #[test]
    fn ascii_cells_use_placeholder_for_non_printable() {
        assert_eq!(ascii_cells(&[0x41, 0x0A, 0x20, 0x7E, 0x7F, 0x00]), "A. ~..");
    }

    #[test]
    fn mode_cycle_and_parse() {
        assert_eq!(OffsetMode::parse("h"), Some(OffsetMode::Hexadecimal));
        assert_eq!(OffsetMode::parse("d"), Some(OffsetMode::Decimal));
        assert_eq!(OffsetMode::parse("o"), Some(OffsetMode::Octal));
        assert_eq!(OffsetMode::parse("x"), None);

        assert_eq!(OffsetMode::Hexadecimal.next(), OffsetMode::Decimal);
        assert_eq!(OffsetMode::Octal.next(), OffsetMode::Hexadecimal);
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * SIZE_MB), "5.00 MB");
        assert_eq!(format_size(3 * SIZE_GB), "3.00 GB");
        assert_eq!(format_size(2 * SIZE_TB), "2.00 TB");
    }
}
