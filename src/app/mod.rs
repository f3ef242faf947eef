mod state;

pub use state::App;

use crossterm::event::KeyCode;

use crate::render::{OffsetMode, RowWidth};

/// 起動時の表示設定
///
/// CLI側で解決してから渡す。起動後に変わるのは表示モードの
/// 切替操作だけで、この構造体自体は書き換えない。
#[derive(Debug, Clone, Copy)]
pub struct ViewConfig {
    pub offset_mode: OffsetMode,
    pub row_width: RowWidth,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            offset_mode: OffsetMode::Hexadecimal,
            row_width: RowWidth::Fixed(16),
        }
    }
}

/// プレフィックスキー状態(Emacs 2ストローク用)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrefixKey {
    #[default]
    None,
    /// C-x を押した状態
    CtrlX,
}

/// アプリケーションアクション
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,

    // カーソル移動
    CursorUp,
    CursorDown,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    PageUp,
    PageDown,
    GotoBeginning, // M-< ファイル先頭
    GotoEnd,       // M-> ファイル末尾
    StartGoto,

    // 編集(カーソルのあるカラムで解釈が変わる)
    InputHex(char),
    InputAscii(char),

    // 表示
    TogglePane,      // HEX <-> ASCII
    CycleOffsetMode, // オフセット基数の切替

    // 検索
    StartSearch,     // C-s: 前方検索
    StartSearchBack, // C-r: 後方検索

    // プレフィックスキー
    EnterCtrlX,
    Cancel, // C-g でキャンセル

    None,
}

/// キー修飾子
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyMod {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Action {
    /// キーコードからアクションに変換(Emacsキーバインド)
    pub fn from_key(key: KeyCode, mods: KeyMod) -> Self {
        let KeyMod { ctrl, shift, alt } = mods;

        match (key, ctrl, alt, shift) {
            // C-x: プレフィックスキーモードへ
            (KeyCode::Char('x'), true, false, false) => Action::EnterCtrlX,

            // C-g: キャンセル
            (KeyCode::Char('g'), true, false, false) => Action::Cancel,
            (KeyCode::Esc, _, _, _) => Action::Cancel,

            // === Emacsカーソル移動 ===
            (KeyCode::Char('f'), true, false, false) => Action::CursorRight,
            (KeyCode::Char('b'), true, false, false) => Action::CursorLeft,
            (KeyCode::Char('n'), true, false, false) => Action::CursorDown,
            (KeyCode::Char('p'), true, false, false) => Action::CursorUp,
            (KeyCode::Char('a'), true, false, false) => Action::CursorHome,
            (KeyCode::Char('e'), true, false, false) => Action::CursorEnd,
            (KeyCode::Char('v'), true, false, false) => Action::PageDown,
            (KeyCode::Char('v'), false, true, false) => Action::PageUp,
            // M-< / M-> : ファイル先頭・末尾
            (KeyCode::Char('<'), false, true, _) => Action::GotoBeginning,
            (KeyCode::Char('>'), false, true, _) => Action::GotoEnd,
            // M-g : アドレスジャンプ
            (KeyCode::Char('g'), false, true, false) => Action::StartGoto,

            // 矢印キーほか
            (KeyCode::Up, false, false, false) => Action::CursorUp,
            (KeyCode::Down, false, false, false) => Action::CursorDown,
            (KeyCode::Left, false, false, false) => Action::CursorLeft,
            (KeyCode::Right, false, false, false) => Action::CursorRight,
            (KeyCode::Home, _, _, _) => Action::CursorHome,
            (KeyCode::End, _, _, _) => Action::CursorEnd,
            (KeyCode::PageUp, _, _, _) => Action::PageUp,
            (KeyCode::PageDown, _, _, _) => Action::PageDown,

            // カラム・表示切替
            (KeyCode::Tab, false, false, _) => Action::TogglePane,
            (KeyCode::F(2), false, false, _) => Action::CycleOffsetMode,

            // 検索: C-s (前方), C-r (後方)
            (KeyCode::Char('s'), true, false, false) => Action::StartSearch,
            (KeyCode::Char('r'), true, false, false) => Action::StartSearchBack,

            _ => Action::None,
        }
    }

    /// C-x の後のキーを処理
    pub fn from_key_after_ctrl_x(key: KeyCode, mods: KeyMod) -> Self {
        let KeyMod { ctrl, .. } = mods;

        match (key, ctrl) {
            // C-x C-c: 終了
            (KeyCode::Char('c'), true) => Action::Quit,
            // C-x g: アドレスジャンプ
            (KeyCode::Char('g'), false) => Action::StartGoto,

            // その他は無効
            _ => Action::Cancel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl() -> KeyMod {
        KeyMod {
            ctrl: true,
            ..KeyMod::default()
        }
    }

    #[test]
    fn emacs_and_arrow_keys_map_to_same_actions() {
        assert_eq!(
            Action::from_key(KeyCode::Char('f'), ctrl()),
            Action::CursorRight
        );
        assert_eq!(
            Action::from_key(KeyCode::Right, KeyMod::default()),
            Action::CursorRight
        );
        assert_eq!(
            Action::from_key(KeyCode::PageDown, KeyMod::default()),
            Action::PageDown
        );
    }

    #[test]
    fn plain_chars_fall_through_for_editing() {
        // 文字入力はアクションにせず、カラム側で解釈する
        assert_eq!(
            Action::from_key(KeyCode::Char('a'), KeyMod::default()),
            Action::None
        );
        assert_eq!(
            Action::from_key(KeyCode::Char('5'), KeyMod::default()),
            Action::None
        );
    }

    #[test]
    fn ctrl_x_prefix_sequences() {
        assert_eq!(
            Action::from_key(KeyCode::Char('x'), ctrl()),
            Action::EnterCtrlX
        );
        assert_eq!(
            Action::from_key_after_ctrl_x(KeyCode::Char('c'), ctrl()),
            Action::Quit
        );
        assert_eq!(
            Action::from_key_after_ctrl_x(KeyCode::Char('g'), KeyMod::default()),
            Action::StartGoto
        );
        assert_eq!(
            Action::from_key_after_ctrl_x(KeyCode::Char('z'), KeyMod::default()),
            Action::Cancel
        );
    }
}
