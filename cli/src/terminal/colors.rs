use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 94, g: 186, b: 125 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;
pub const POSITIVE: Color = Color::Green;
pub const NEGATIVE: Color = Color::Red;
