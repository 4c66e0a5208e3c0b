use ratatui::style::{Color, Modifier, Style};

pub const COLOR_SAND: Color = Color::Rgb(0xEB, 0xDB, 0xB2);
pub const COLOR_OLIVE: Color = Color::Rgb(0x98, 0x97, 0x1A);
pub const COLOR_MOSS: Color = Color::Rgb(0x67, 0x67, 0x1C);
pub const COLOR_MUTED: Color = Color::Rgb(0x92, 0x83, 0x74);
pub const COLOR_DIM: Color = Color::Rgb(0x50, 0x49, 0x45);
pub const COLOR_RED: Color = Color::Rgb(0xFB, 0x49, 0x34);
pub const COLOR_GREEN: Color = Color::Rgb(0xB8, 0xBB, 0x26);
pub const COLOR_YELLOW: Color = Color::Rgb(0xFA, 0xBD, 0x2F);
pub const COLOR_BLUE: Color = Color::Rgb(0x83, 0xA5, 0x98);
pub const COLOR_PEACH: Color = Color::Rgb(0xFE, 0x80, 0x19);
pub const COLOR_AQUA: Color = Color::Rgb(0x8E, 0xC0, 0x7C);

pub const CURSOR: &str = "▸ ";
pub const NO_CURSOR: &str = "  ";
pub const MASK: &str = "••••••••";

pub fn text() -> Style {
    Style::default().fg(COLOR_SAND)
}

pub fn accent() -> Style {
    Style::default().fg(COLOR_OLIVE).add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(COLOR_MUTED)
}

pub fn dim() -> Style {
    Style::default().fg(COLOR_DIM)
}

pub fn label() -> Style {
    Style::default().fg(COLOR_MOSS)
}

pub fn error() -> Style {
    Style::default().fg(COLOR_RED)
}

pub fn ok() -> Style {
    Style::default().fg(COLOR_GREEN)
}

pub fn warn() -> Style {
    Style::default().fg(COLOR_YELLOW)
}
