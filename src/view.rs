use crate::source::ByteSource;

/// カーソルが次の入力で編集するセル
///
/// HEX側は上位ニブル→下位ニブルの2打で1バイト。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorPane {
    #[default]
    HexHigh,
    HexLow,
    Ascii,
}

impl CursorPane {
    pub fn is_hex(self) -> bool {
        matches!(self, CursorPane::HexHigh | CursorPane::HexLow)
    }
}

/// 表示中のウィンドウ
///
/// 不変条件: `top_offset`は常に`row_width`の倍数で、`buffer`は
/// `source[top_offset .. top_offset + buffer.len())`を写す。
/// EOF近くではbufferが短くなる。
#[derive(Debug)]
pub struct ViewWindow {
    top_offset: u64,
    row_width: usize,
    visible_rows: usize,
    cursor: u64,
    pane: CursorPane,
    buffer: Vec<u8>,
}

impl ViewWindow {
    pub fn new(source: &ByteSource, row_width: usize, visible_rows: usize) -> Self {
        let mut window = Self {
            top_offset: 0,
            row_width: row_width.max(1),
            visible_rows: visible_rows.max(1),
            cursor: 0,
            pane: CursorPane::default(),
            buffer: Vec::new(),
        };
        window.refresh(source);
        window
    }

    pub fn top_offset(&self) -> u64 {
        self.top_offset
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn pane(&self) -> CursorPane {
        self.pane
    }

    pub fn set_pane(&mut self, pane: CursorPane) {
        self.pane = pane;
    }

    /// HEX側とASCII側を切り替える(入力途中のニブルは破棄)
    pub fn toggle_pane(&mut self) {
        self.pane = if self.pane.is_hex() {
            CursorPane::Ascii
        } else {
            CursorPane::HexHigh
        };
    }

    pub fn row_width(&self) -> usize {
        self.row_width
    }

    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// バッファをソースから取り直す
    pub fn refresh(&mut self, source: &ByteSource) {
        let span = self.row_width * self.visible_rows;
        self.buffer = source.read_range(self.top_offset, span).to_vec();
    }

    /// 少なくとも1バイト見える最後の行の先頭
    fn max_top(&self, length: u64) -> u64 {
        if length == 0 {
            0
        } else {
            (length - 1) / self.row_width as u64 * self.row_width as u64
        }
    }

    fn clamp_top(&self, top: i128, length: u64) -> u64 {
        top.clamp(0, self.max_top(length) as i128) as u64
    }

    /// ウィンドウを行単位でスクロールする
    ///
    /// 上端0と末尾行でクランプ。カーソルは列を保ったまま
    /// ウィンドウ内に引き戻す。
    pub fn scroll(&mut self, delta_rows: i64, source: &ByteSource) {
        let length = source.len();
        if length == 0 {
            return;
        }

        let step = self.row_width as i128;
        let top = self.top_offset as i128 + delta_rows as i128 * step;
        self.top_offset = self.clamp_top(top, length);
        self.refresh(source);
        self.enclose_cursor(length);
    }

    /// カーソルをバイト単位で動かす
    ///
    /// `[0, length-1]`にクランプし、ウィンドウ外に出たら
    /// 最小限のスクロールで追従する。
    pub fn move_cursor(&mut self, delta: i64, source: &ByteSource) {
        let length = source.len();
        if length == 0 {
            return;
        }

        let cursor = self.cursor as i128 + delta as i128;
        self.cursor = cursor.clamp(0, length as i128 - 1) as u64;
        self.ensure_visible(source);
    }

    /// カーソルを行単位で動かす(端の行からはみ出す移動は無視)
    pub fn move_rows(&mut self, delta_rows: i64, source: &ByteSource) {
        let length = source.len();
        if length == 0 {
            return;
        }

        let target = self.cursor as i128 + delta_rows as i128 * self.row_width as i128;
        if target >= 0 && target < length as i128 {
            self.cursor = target as u64;
            self.ensure_visible(source);
        }
    }

    /// ページ単位の移動(画面とカーソルを同じだけ動かす)
    pub fn page(&mut self, delta_pages: i64, source: &ByteSource) {
        let length = source.len();
        if length == 0 {
            return;
        }

        let jump = delta_pages as i128 * (self.row_width * self.visible_rows) as i128;
        self.top_offset = self.clamp_top(self.top_offset as i128 + jump, length);
        self.cursor = (self.cursor as i128 + jump).clamp(0, length as i128 - 1) as u64;
        self.ensure_visible(source);
    }

    /// 絶対オフセットへジャンプ
    pub fn goto(&mut self, offset: u64, source: &ByteSource) {
        let length = source.len();
        if length == 0 {
            return;
        }

        self.cursor = offset.min(length - 1);
        self.ensure_visible(source);
    }

    /// 行頭へ
    pub fn cursor_home(&mut self, source: &ByteSource) {
        if source.is_empty() {
            return;
        }
        self.cursor = self.cursor / self.row_width as u64 * self.row_width as u64;
        self.ensure_visible(source);
    }

    /// 行末へ(EOFの手前まで)
    pub fn cursor_end(&mut self, source: &ByteSource) {
        let length = source.len();
        if length == 0 {
            return;
        }
        let row_start = self.cursor / self.row_width as u64 * self.row_width as u64;
        self.cursor = (row_start + self.row_width as u64 - 1).min(length - 1);
        self.ensure_visible(source);
    }

    /// 行幅・行数の変更
    ///
    /// カーソルを含む行を先頭に取り直し、バッファは全面入れ替え
    /// (列割りが変わるため部分再利用はしない)。
    pub fn resize(&mut self, row_width: usize, visible_rows: usize, source: &ByteSource) {
        let row_width = row_width.max(1);
        let visible_rows = visible_rows.max(1);
        if row_width == self.row_width && visible_rows == self.visible_rows {
            return;
        }

        self.row_width = row_width;
        self.visible_rows = visible_rows;
        self.top_offset = self.cursor / row_width as u64 * row_width as u64;
        self.top_offset = self.clamp_top(self.top_offset as i128, source.len());
        self.refresh(source);
    }

    /// 編集結果をバッファへ反映する(全面取り直しはしない)
    pub fn apply_edit(&mut self, offset: u64, value: u8) {
        if offset >= self.top_offset {
            let index = (offset - self.top_offset) as usize;
            if index < self.buffer.len() {
                self.buffer[index] = value;
            }
        }
    }

    /// カーソルが見える位置まで最小限スクロールする
    fn ensure_visible(&mut self, source: &ByteSource) {
        let rw = self.row_width as u64;
        let cursor_row = self.cursor / rw;
        let top_row = self.top_offset / rw;

        if cursor_row < top_row {
            self.top_offset = cursor_row * rw;
        } else if cursor_row >= top_row + self.visible_rows as u64 {
            self.top_offset = (cursor_row - self.visible_rows as u64 + 1) * rw;
        }
        self.refresh(source);
    }

    /// スクロール後、カーソルを列を保ってウィンドウ内に収める
    fn enclose_cursor(&mut self, length: u64) {
        let rw = self.row_width as u64;
        let col = self.cursor % rw;
        let window_rows = self.visible_rows as u64;
        let top_row = self.top_offset / rw;
        let cursor_row = self.cursor / rw;

        let new_row = if cursor_row < top_row {
            top_row
        } else if cursor_row >= top_row + window_rows {
            top_row + window_rows - 1
        } else {
            return;
        };
        self.cursor = (new_row * rw + col).min(length - 1);
    }
}
