use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Direction as LayoutDirection, Layout},
    style::{Color, Style},
    widgets::Paragraph,
};

use super::{Action, KeyMod, PrefixKey, ViewConfig};
use crate::edit;
use crate::error::HxdError;
use crate::find::{self, Direction, FindOutcome};
use crate::render::{self, OffsetMode, RowWidth};
use crate::source::ByteSource;
use crate::ui::HexView;
use crate::view::{CursorPane, ViewWindow};

/// プロンプト入力モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptMode {
    #[default]
    Off,
    /// 前方検索パターン入力中
    Search,
    /// 後方検索パターン入力中
    SearchBack,
    /// アドレスジャンプ入力中
    GotoAddress,
}

/// アプリケーション状態
#[derive(Debug)]
pub struct App {
    /// 開いているファイル
    source: ByteSource,
    /// 表示中のウィンドウ
    window: ViewWindow,
    /// オフセット表示の基数
    offset_mode: OffsetMode,
    /// 1行のバイト数の指定
    row_width: RowWidth,
    /// プレフィックスキー状態(C-x等)
    prefix_key: PrefixKey,
    /// 終了フラグ
    should_quit: bool,
    /// ステータスメッセージ
    status_message: Option<String>,
    /// プロンプト入力モード
    prompt_mode: PromptMode,
    /// プロンプト入力内容
    prompt_input: String,
    /// 前回の検索パターン(再検索用)
    last_pattern: Vec<u8>,
    /// 直近の検索ヒット(ハイライト用)
    match_at: Option<(u64, u64)>,
}

impl App {
    /// ファイルを開いてアプリケーションを作る
    pub fn open(path: impl AsRef<Path>, config: ViewConfig) -> crate::error::Result<Self> {
        let source = ByteSource::open(path)?;

        // 長さ0は致命的ではない。空表示に切り替えて知らせるだけ
        let mut status_message = source.is_empty().then(|| HxdError::FileZero.to_string());
        if source.is_read_only() && status_message.is_none() {
            status_message = Some("Opened read-only".to_string());
        }

        let initial_width = match config.row_width {
            RowWidth::Fixed(n) => n,
            // autoは最初のdrawで端末幅から確定する
            RowWidth::Auto => 16,
        };
        let window = ViewWindow::new(&source, initial_width, 24);

        Ok(Self {
            source,
            window,
            offset_mode: config.offset_mode,
            row_width: config.row_width,
            prefix_key: PrefixKey::None,
            should_quit: false,
            status_message,
            prompt_mode: PromptMode::Off,
            prompt_input: String::new(),
            last_pattern: Vec::new(),
            match_at: None,
        })
    }

    /// 終了すべきかどうか
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// ファイル名を取得
    pub fn filename(&self) -> Option<&str> {
        self.source.filename()
    }

    /// オフセットを現在の基数で整形
    fn format_offset(&self, offset: u64) -> String {
        let width = render::offset_width(self.source.len(), self.offset_mode);
        render::format_offset(offset, self.offset_mode, width)
    }

    /// アクションを実行
    pub fn execute(&mut self, action: Action) {
        // ステータスメッセージをクリア(プレフィックス表示を除く)
        if !matches!(action, Action::EnterCtrlX) {
            self.status_message = None;
        }

        match action {
            Action::Quit => self.should_quit = true,

            // カーソル移動
            Action::CursorUp => self.window.move_rows(-1, &self.source),
            Action::CursorDown => self.window.move_rows(1, &self.source),
            Action::CursorLeft => self.window.move_cursor(-1, &self.source),
            Action::CursorRight => self.window.move_cursor(1, &self.source),
            Action::CursorHome => self.window.cursor_home(&self.source),
            Action::CursorEnd => self.window.cursor_end(&self.source),
            Action::PageUp => self.window.page(-1, &self.source),
            Action::PageDown => self.window.page(1, &self.source),
            Action::GotoBeginning => self.window.goto(0, &self.source),
            Action::GotoEnd => {
                let length = self.source.len();
                self.window.goto(length.saturating_sub(1), &self.source);
            }

            // 入力
            Action::InputHex(ch) => self.input_hex(ch),
            Action::InputAscii(ch) => self.input_ascii(ch),

            // 表示切替
            Action::TogglePane => self.window.toggle_pane(),
            Action::CycleOffsetMode => {
                self.offset_mode = self.offset_mode.next();
                self.status_message = Some(format!("Offset view: {}", self.offset_mode.name()));
            }

            // プロンプト
            Action::StartSearch => {
                self.prompt_mode = PromptMode::Search;
                self.prompt_input.clear();
            }
            Action::StartSearchBack => {
                self.prompt_mode = PromptMode::SearchBack;
                self.prompt_input.clear();
            }
            Action::StartGoto => {
                self.prompt_mode = PromptMode::GotoAddress;
                self.prompt_input.clear();
            }

            // プレフィックスキー
            Action::EnterCtrlX => {
                self.prefix_key = PrefixKey::CtrlX;
                self.status_message = Some("C-x-".to_string());
            }
            Action::Cancel => {
                self.prefix_key = PrefixKey::None;
                self.window.set_pane(match self.window.pane() {
                    CursorPane::HexLow => CursorPane::HexHigh,
                    other => other,
                });
                self.match_at = None;
            }

            Action::None => {}
        }
    }

    /// HEXカラムでの1桁入力
    ///
    /// 上位ニブル→下位ニブルの順に書き、下位で1バイト確定して
    /// カーソルを進める。
    fn input_hex(&mut self, ch: char) {
        let Some(digit) = ch.to_digit(16) else {
            return;
        };
        if self.source.is_empty() {
            return;
        }
        if self.source.is_read_only() {
            self.status_message = Some("Read-only file".to_string());
            return;
        }

        let offset = self.window.cursor();
        let high = self.window.pane() == CursorPane::HexHigh;
        match edit::set_nibble(&mut self.source, &mut self.window, offset, high, digit as u8) {
            Ok(()) => {
                if high {
                    self.window.set_pane(CursorPane::HexLow);
                } else {
                    self.window.set_pane(CursorPane::HexHigh);
                    self.window.move_cursor(1, &self.source);
                }
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    /// ASCIIカラムでの1文字入力
    fn input_ascii(&mut self, ch: char) {
        if !ch.is_ascii() || ch.is_ascii_control() {
            return;
        }
        if self.source.is_empty() {
            return;
        }
        if self.source.is_read_only() {
            self.status_message = Some("Read-only file".to_string());
            return;
        }

        let offset = self.window.cursor();
        match edit::set_ascii_char(&mut self.source, &mut self.window, offset, ch) {
            Ok(()) => self.window.move_cursor(1, &self.source),
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    /// 入力文字列をバイトパターンへ
    ///
    /// HEX表記らしければ("DE AD", "0xBEEF"等)バイト列として、
    /// それ以外はUTF-8のバイト列として解釈する。
    fn parse_pattern(query: &str) -> Vec<u8> {
        let trimmed = query.trim();
        match Self::hex_query_to_bytes(trimmed) {
            Some(bytes) => bytes,
            None => trimmed.as_bytes().to_vec(),
        }
    }

    /// HEX表記をバイト列に変換(区切り文字と0x接頭辞は無視)
    fn hex_query_to_bytes(s: &str) -> Option<Vec<u8>> {
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let digits: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | ',' | '\t' | 'x' | 'X'))
            .collect();
        if digits.is_empty()
            || digits.len() % 2 != 0
            || !digits.chars().all(|c| c.is_ascii_hexdigit())
        {
            return None;
        }

        let chars: Vec<char> = digits.chars().collect();
        let mut bytes = Vec::with_capacity(chars.len() / 2);
        for pair in chars.chunks(2) {
            let high = pair[0].to_digit(16)?;
            let low = pair[1].to_digit(16)?;
            bytes.push(((high << 4) | low) as u8);
        }
        Some(bytes)
    }

    /// アドレス文字列をパース(0x接頭辞/hサフィックスは16進)
    fn parse_address(input: &str) -> Option<u64> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if let Some(hex) = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16).ok()
        } else if let Some(hex) = input.strip_suffix('h').or_else(|| input.strip_suffix('H')) {
            u64::from_str_radix(hex, 16).ok()
        } else if input.chars().all(|c| c.is_ascii_hexdigit())
            && input.chars().any(|c| c.is_ascii_alphabetic())
        {
            // A-Fを含むなら16進として解釈
            u64::from_str_radix(input, 16).ok()
        } else {
            input.parse().ok()
        }
    }

    /// 検索を実行してカーソルを移動する
    fn run_search(&mut self, direction: Direction) {
        let pattern = std::mem::take(&mut self.last_pattern);
        // チャンクの合間に入力が来たら中断する(協調キャンセル)
        let mut cancel = || event::poll(Duration::ZERO).unwrap_or(false);

        let outcome = find::find(
            &self.source,
            &pattern,
            self.window.cursor(),
            direction,
            true,
            &mut cancel,
        );
        self.last_pattern = pattern;

        match outcome {
            Ok(FindOutcome::Found(offset)) => {
                self.window.goto(offset, &self.source);
                self.match_at = Some((offset, self.last_pattern.len() as u64));
                self.status_message = Some(format!("Found at {}", self.format_offset(offset)));
            }
            Ok(FindOutcome::NoMatch) => {
                self.match_at = None;
                self.status_message = Some(HxdError::FinderNoResult.to_string());
            }
            Ok(FindOutcome::Cancelled) => {
                self.status_message = Some("Search cancelled".to_string());
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    /// アドレスにジャンプ
    fn goto_address(&mut self, input: &str) {
        let Some(address) = Self::parse_address(input) else {
            self.status_message = Some("Invalid address".to_string());
            return;
        };

        let length = self.source.len();
        if address < length {
            self.window.goto(address, &self.source);
            self.status_message = Some(format!("Jumped to {}", self.format_offset(address)));
        } else {
            self.status_message = Some(
                HxdError::PositionOutOfBound {
                    offset: address,
                    length,
                }
                .to_string(),
            );
        }
    }

    /// プロンプトモード中のキー処理
    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            // Escape / C-g: キャンセル
            KeyCode::Esc => self.close_prompt("Cancelled"),
            KeyCode::Char('g') if ctrl => self.close_prompt("Cancelled"),

            // Enter: 確定
            KeyCode::Enter => {
                let mode = self.prompt_mode;
                let input = std::mem::take(&mut self.prompt_input);
                self.prompt_mode = PromptMode::Off;
                self.status_message = None;

                match mode {
                    PromptMode::Search | PromptMode::SearchBack => {
                        // 空入力なら前回のパターンで再検索
                        if !input.trim().is_empty() {
                            self.last_pattern = Self::parse_pattern(&input);
                        }
                        if self.last_pattern.is_empty() {
                            self.status_message =
                                Some(HxdError::FinderEmptyString.to_string());
                        } else {
                            let direction = if mode == PromptMode::Search {
                                Direction::Forward
                            } else {
                                Direction::Backward
                            };
                            self.run_search(direction);
                        }
                    }
                    PromptMode::GotoAddress => self.goto_address(&input),
                    PromptMode::Off => {}
                }
            }

            KeyCode::Backspace => {
                self.prompt_input.pop();
            }
            KeyCode::Char(ch) if !ctrl => {
                self.prompt_input.push(ch);
            }
            _ => {}
        }
    }

    fn close_prompt(&mut self, message: &str) {
        self.prompt_mode = PromptMode::Off;
        self.prompt_input.clear();
        self.status_message = Some(message.to_string());
    }

    /// イベントを処理
    pub fn handle_event(&mut self) -> Result<()> {
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        return Ok(());
                    }

                    // プロンプトモード中は専用の処理
                    if self.prompt_mode != PromptMode::Off {
                        self.handle_prompt_key(key);
                        return Ok(());
                    }

                    let mods = KeyMod {
                        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
                        shift: key.modifiers.contains(KeyModifiers::SHIFT),
                        alt: key.modifiers.contains(KeyModifiers::ALT),
                    };

                    // プレフィックスキー状態に応じて分岐
                    let action = match self.prefix_key {
                        PrefixKey::None => Action::from_key(key.code, mods),
                        PrefixKey::CtrlX => {
                            self.prefix_key = PrefixKey::None;
                            Action::from_key_after_ctrl_x(key.code, mods)
                        }
                    };

                    if action != Action::None {
                        self.execute(action);
                    } else if let KeyCode::Char(ch) = key.code {
                        // 修飾キーなしの文字はカーソルのカラムで解釈
                        if !mods.ctrl && !mods.alt {
                            if self.window.pane().is_hex() {
                                self.execute(Action::InputHex(ch));
                            } else {
                                self.execute(Action::InputAscii(ch));
                            }
                        }
                    }
                }
                // リサイズは次のdrawで吸収される
                _ => {}
            }
        }
        Ok(())
    }

    /// ステータス行の文字列を組み立てる
    fn status_line(&self) -> String {
        let filename = self.filename().unwrap_or("[No Name]");
        let ro = if self.source.is_read_only() { " [RO]" } else { "" };

        match self.prompt_mode {
            PromptMode::Search => return format!("Search: {}_", self.prompt_input),
            PromptMode::SearchBack => return format!("Search backward: {}_", self.prompt_input),
            PromptMode::GotoAddress => return format!("Goto address: {}_", self.prompt_input),
            PromptMode::Off => {}
        }

        if let Some(ref message) = self.status_message {
            return format!(" {}{} | {}", filename, ro, message);
        }

        let pane = if self.window.pane().is_hex() { "HEX" } else { "ASC" };
        format!(
            " {}{} | {} | {}/{} | {} | {}",
            filename,
            ro,
            render::format_size(self.source.len()),
            self.format_offset(self.window.cursor()),
            self.format_offset(self.source.len()),
            pane,
            self.offset_mode.name(),
        )
    }

    /// UIを描画
    pub fn draw(&mut self, frame: &mut Frame) {
        let size = frame.area();
        let layout = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([
                Constraint::Min(1),    // メイン
                Constraint::Length(1), // ステータス
            ])
            .split(size);
        let body = layout[0];

        // ヘッダー1行を除いた行数でウィンドウを合わせる
        let offset_width = render::offset_width(self.source.len(), self.offset_mode);
        let visible_rows = (body.height as usize).saturating_sub(1).max(1);
        let row_width = match self.row_width {
            RowWidth::Fixed(n) => n,
            RowWidth::Auto => render::auto_row_width(body.width, offset_width),
        };
        self.window.resize(row_width, visible_rows, &self.source);

        let hex_view = HexView::new(self.window.buffer(), self.source.len())
            .top_offset(self.window.top_offset())
            .row_width(self.window.row_width())
            .cursor(self.window.cursor())
            .pane(self.window.pane())
            .mode(self.offset_mode)
            .offset_width(offset_width)
            .match_at(self.match_at);
        frame.render_widget(hex_view, body);

        let status = Paragraph::new(self.status_line())
            .style(Style::default().bg(Color::DarkGray).fg(Color::White));
        frame.render_widget(status, layout[1]);
    }
}
