pub mod hex_view;

pub use hex_view::HexView;

use ratatui::style::Color;

/// カラーテーマ
pub struct Colors;

impl Colors {
    pub const ADDR: Color = Color::DarkGray;
    pub const HEADER: Color = Color::Cyan;

    pub const HEX_ZERO: Color = Color::DarkGray;
    pub const HEX_HIGH: Color = Color::Yellow;
    pub const HEX_PRINTABLE: Color = Color::Green;
    pub const HEX_NORMAL: Color = Color::Gray;
    pub const ASCII_NORMAL: Color = Color::White;

    pub const CURSOR: Color = Color::Black;
    pub const CURSOR_BG: Color = Color::White;
    pub const MATCH_BG: Color = Color::Blue;

    pub const EMPTY: Color = Color::DarkGray;
}
