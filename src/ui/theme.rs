use ratatui::style::Color;

pub const BG_PRIMARY: Color = Color::Rgb(0, 0, 0);
pub const BG_PANEL: Color = Color::Rgb(12, 12, 12);
pub const FG_PRIMARY: Color = Color::Rgb(190, 190, 190);
pub const FG_DIM: Color = Color::Rgb(128, 128, 128);

pub const BAR_BG: Color = Color::Rgb(23, 52, 127);
pub const BAR_TEXT: Color = Color::Rgb(235, 240, 255);
pub const BAR_HIGHLIGHT_BG: Color = Color::Rgb(73, 102, 177);
pub const BAR_HIGHLIGHT_TEXT: Color = Color::Rgb(255, 255, 255);

pub const MENU_BG: Color = Color::Rgb(79, 79, 79);
pub const MENU_BORDER: Color = Color::Rgb(208, 208, 208);

pub const BORDER_IDLE: Color = Color::Rgb(61, 120, 120);
pub const BORDER_FOCUS: Color = Color::Rgb(187, 94, 0);
pub const PANEL_HIGHLIGHT_BG: Color = Color::Rgb(120, 160, 255);

pub const ERROR_FG: Color = Color::Rgb(255, 110, 110);
pub const SUCCESS_FG: Color = Color::Rgb(120, 220, 140);
pub const EXTRA_SHARE_FG: Color = Color::Rgb(255, 196, 0);

pub const STATUS_PENDING: Color = Color::Rgb(230, 200, 80);
pub const STATUS_ACTIVE: Color = Color::Rgb(90, 200, 120);
pub const STATUS_COMPLETED: Color = Color::Rgb(110, 160, 255);
pub const STATUS_ARCHIVED: Color = Color::Rgb(150, 150, 150);
pub const STATUS_CANCELLED: Color = Color::Rgb(230, 100, 100);
