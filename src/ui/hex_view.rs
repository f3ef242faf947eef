use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};

use super::Colors;
use crate::render::{self, OffsetMode};
use crate::view::CursorPane;

/// HEX/ASCII表示ウィジェット
///
/// ウィンドウのバッファを受け取って1画面分を描画するだけで、
/// ファイルにもウィンドウ状態にも触れない。
pub struct HexView<'a> {
    /// 表示するデータ(ウィンドウのバッファ)
    buffer: &'a [u8],
    /// ファイル全長
    length: u64,
    /// バッファ先頭の絶対オフセット
    top_offset: u64,
    /// 1行あたりのバイト数
    row_width: usize,
    /// オフセットラベルの桁数
    offset_width: usize,
    /// カーソル位置(絶対オフセット)
    cursor: u64,
    /// カーソルのあるカラム
    pane: CursorPane,
    /// オフセット表示の基数
    mode: OffsetMode,
    /// 検索ヒットのハイライト範囲
    match_at: Option<(u64, u64)>,
}

impl<'a> HexView<'a> {
    pub fn new(buffer: &'a [u8], length: u64) -> Self {
        Self {
            buffer,
            length,
            top_offset: 0,
            row_width: 16,
            offset_width: 8,
            cursor: 0,
            pane: CursorPane::HexHigh,
            mode: OffsetMode::Hexadecimal,
            match_at: None,
        }
    }

    pub fn top_offset(mut self, top_offset: u64) -> Self {
        self.top_offset = top_offset;
        self
    }

    pub fn row_width(mut self, row_width: usize) -> Self {
        self.row_width = row_width.max(1);
        self
    }

    pub fn offset_width(mut self, offset_width: usize) -> Self {
        self.offset_width = offset_width;
        self
    }

    pub fn cursor(mut self, cursor: u64) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn pane(mut self, pane: CursorPane) -> Self {
        self.pane = pane;
        self
    }

    pub fn mode(mut self, mode: OffsetMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn match_at(mut self, match_at: Option<(u64, u64)>) -> Self {
        self.match_at = match_at;
        self
    }

    /// バイト値に応じた色を取得
    fn byte_color(byte: u8) -> ratatui::style::Color {
        match byte {
            0x00 => Colors::HEX_ZERO,
            0xFF => Colors::HEX_HIGH,
            0x20..=0x7E => Colors::HEX_PRINTABLE,
            _ => Colors::HEX_NORMAL,
        }
    }

    fn in_match(&self, offset: u64) -> bool {
        self.match_at
            .is_some_and(|(start, len)| offset >= start && offset < start + len)
    }

    /// 1行分のデータを描画
    fn render_row(&self, row: usize, area: Rect, buf: &mut Buffer) {
        let row_start = row * self.row_width;
        if row_start >= self.buffer.len() {
            return;
        }
        let row_end = (row_start + self.row_width).min(self.buffer.len());
        let bytes = &self.buffer[row_start..row_end];
        let row_offset = self.top_offset + row_start as u64;

        let mut x = area.x;
        let y = area.y;

        // オフセットラベル
        let label = render::format_offset(row_offset, self.mode, self.offset_width);
        buf.set_string(x, y, &label, Style::default().fg(Colors::ADDR));
        x += self.offset_width as u16 + 2;

        // HEXカラム
        for i in 0..self.row_width {
            if x >= area.right() {
                return;
            }
            if let Some(&byte) = bytes.get(i) {
                let abs = row_offset + i as u64;
                let mut style = Style::default().fg(Self::byte_color(byte));
                if abs == self.cursor && self.pane.is_hex() {
                    style = style.bg(Colors::CURSOR_BG).fg(Colors::CURSOR);
                } else if self.in_match(abs) {
                    style = style.bg(Colors::MATCH_BG);
                }
                buf.set_string(x, y, format!("{byte:02X}"), style);
            }
            // EOF以降のセルは空白のまま
            x += 3;
            if (i + 1) % 8 == 0 && i + 1 < self.row_width {
                x += 1;
            }
        }
        x += 1;

        // ASCIIカラム
        for (i, &byte) in bytes.iter().enumerate() {
            if x >= area.right() {
                return;
            }
            let abs = row_offset + i as u64;
            let mut style = Style::default().fg(Colors::ASCII_NORMAL);
            if abs == self.cursor && self.pane == CursorPane::Ascii {
                style = style.bg(Colors::CURSOR_BG).fg(Colors::CURSOR);
            } else if self.in_match(abs) {
                style = style.bg(Colors::MATCH_BG);
            }
            buf.set_string(x, y, render::ascii_cell(byte).to_string(), style);
            x += 1;
        }
    }
}

impl Widget for HexView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        // ヘッダー行
        let columns: Vec<u8> = (0..self.row_width).map(|i| i as u8).collect();
        let header = format!(
            "{:<width$}  {}  ASCII",
            "Offset",
            render::hex_cells(&columns, self.row_width),
            width = self.offset_width,
        );
        buf.set_string(
            area.x,
            area.y,
            &header,
            Style::default()
                .fg(Colors::HEADER)
                .add_modifier(Modifier::BOLD),
        );

        // 空ファイルはプレースホルダ行だけ描く
        if self.length == 0 {
            if area.height > 1 {
                let label = render::format_offset(0, self.mode, self.offset_width);
                buf.set_string(area.x, area.y + 1, &label, Style::default().fg(Colors::ADDR));
                buf.set_string(
                    area.x + self.offset_width as u16 + 2,
                    area.y + 1,
                    "(no data)",
                    Style::default().fg(Colors::EMPTY),
                );
            }
            return;
        }

        // データ行
        let visible_rows = (area.height as usize).saturating_sub(1);
        for row in 0..visible_rows {
            let row_area = Rect {
                x: area.x,
                y: area.y + 1 + row as u16,
                width: area.width,
                height: 1,
            };
            self.render_row(row, row_area, buf);
        }
    }
}
