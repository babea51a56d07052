use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Color as CtColor, Stylize};
use unicode_width::UnicodeWidthStr;

const SECTION_WIDTH: usize = 60;
const WELCOME_WIDTH: usize = 64;

// ═══════════════════════════════════════════════════════════════════════════════
// Clap Styles
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_styles() -> Styles {
    let heading = Style::new()
        .bold()
        .underline()
        .fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
    let good = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Green)));
    let bad = Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red)));

    Styles::styled()
        .usage(heading)
        .header(heading)
        .literal(good)
        .valid(good)
        .invalid(bad)
        .error(bad)
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Color Palette
// ═══════════════════════════════════════════════════════════════════════════════

pub mod colors {
    use crossterm::style::Color;

    const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color::Rgb { r, g, b }
    }

    pub const RED: Color = rgb(230, 57, 70);
    pub const CORAL: Color = rgb(255, 127, 80);
    pub const AMBER: Color = rgb(255, 191, 0);
    pub const GREEN: Color = rgb(80, 200, 120);
    pub const TEAL: Color = rgb(64, 180, 190);
    pub const DIM: Color = rgb(128, 128, 128);
    pub const WHITE: Color = rgb(255, 255, 255);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Box Drawing Characters
// ═══════════════════════════════════════════════════════════════════════════════

pub mod box_chars {
    pub const DOUBLE_TOP_LEFT: &str = "╔";
    pub const DOUBLE_TOP_RIGHT: &str = "╗";
    pub const DOUBLE_BOTTOM_LEFT: &str = "╚";
    pub const DOUBLE_BOTTOM_RIGHT: &str = "╝";
    pub const DOUBLE_HORIZONTAL: &str = "═";
    pub const DOUBLE_VERTICAL: &str = "║";

    pub const SINGLE_HORIZONTAL: &str = "─";
    pub const SINGLE_VERTICAL: &str = "│";

    pub const ROUND_TOP_LEFT: &str = "╭";
    pub const ROUND_TOP_RIGHT: &str = "╮";
    pub const ROUND_BOTTOM_LEFT: &str = "╰";
    pub const ROUND_BOTTOM_RIGHT: &str = "╯";

    pub const T_LEFT: &str = "├";
    pub const T_RIGHT: &str = "┤";
    pub const T_TOP: &str = "┬";
    pub const T_BOTTOM: &str = "┴";
    pub const CROSS: &str = "┼";

    pub const PLAY: &str = "▶";
    pub const BULLET: &str = "●";
    pub const BULLET_EMPTY: &str = "○";
    pub const DIAMOND: &str = "◆";
}

/// Prints `left`, `fill` repeated `width` times, then `right`, all in `color`.
fn print_rule(indent: &str, left: &str, fill: &str, width: usize, right: &str, color: CtColor) {
    println!(
        "{}{}{}{}",
        indent,
        left.with(color),
        fill.repeat(width).with(color),
        right.with(color)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Status Indicators
// ═══════════════════════════════════════════════════════════════════════════════

fn print_status(symbol: &str, color: CtColor, message: &str) {
    println!(" {} {}", symbol.with(color).bold(), message.with(color));
}

pub fn print_success(message: &str) {
    print_status("✓", colors::GREEN, message);
}

pub fn print_error(message: &str) {
    print_status("✗", colors::RED, message);
}

pub fn print_warning(message: &str) {
    print_status("⚠", colors::AMBER, message);
}

pub fn print_info(message: &str) {
    print_status("ℹ", colors::TEAL, message);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Sections
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_section_header(title: &str) {
    let title_len = title.width();
    let left = SECTION_WIDTH.saturating_sub(title_len + 4) / 2;
    let right = SECTION_WIDTH.saturating_sub(title_len + 4 + left);

    println!();
    println!(
        "{}{} {} {}{}",
        box_chars::ROUND_TOP_LEFT.with(colors::CORAL),
        box_chars::SINGLE_HORIZONTAL.repeat(left).with(colors::CORAL),
        title.with(colors::CORAL).bold().attribute(Attribute::Italic),
        box_chars::SINGLE_HORIZONTAL.repeat(right).with(colors::CORAL),
        box_chars::ROUND_TOP_RIGHT.with(colors::CORAL)
    );
}

pub fn print_section_footer() {
    print_rule(
        "",
        box_chars::ROUND_BOTTOM_LEFT,
        box_chars::SINGLE_HORIZONTAL,
        SECTION_WIDTH,
        box_chars::ROUND_BOTTOM_RIGHT,
        colors::CORAL,
    );
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        box_chars::BULLET.with(colors::CORAL),
        format!("{}:", key).with(colors::DIM),
        value.with(colors::WHITE)
    );
}

pub fn print_key_value_highlight(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        box_chars::DIAMOND.with(colors::RED),
        format!("{}:", key).with(colors::CORAL).bold(),
        value.with(colors::GREEN).bold()
    );
}

pub fn print_list_item(item: &str, indent: usize) {
    println!(
        "{}{}  {}",
        "  ".repeat(indent),
        box_chars::PLAY.with(colors::RED),
        item.with(colors::WHITE)
    );
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {} {}",
        box_chars::BULLET_EMPTY.with(colors::DIM),
        message.with(colors::DIM).attribute(Attribute::Italic)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tables
// ═══════════════════════════════════════════════════════════════════════════════

pub struct TableBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    col_widths: Vec<usize>,
}

impl TableBuilder {
    pub fn new(headers: Vec<&str>) -> Self {
        TableBuilder {
            col_widths: headers.iter().map(|h| h.width()).collect(),
            headers: headers.into_iter().map(String::from).collect(),
            rows: Vec::new(),
        }
    }

    /// Cells past the number of headers are dropped.
    pub fn add_row(&mut self, mut row: Vec<String>) {
        row.truncate(self.headers.len());
        for (width, cell) in self.col_widths.iter_mut().zip(&row) {
            *width = (*width).max(cell.width());
        }
        self.rows.push(row);
    }

    fn print_border(&self, left: &str, junction: &str, right: &str) {
        let segments: Vec<String> = self
            .col_widths
            .iter()
            .map(|width| box_chars::SINGLE_HORIZONTAL.repeat(width + 2))
            .collect();
        println!(
            "{}",
            format!("{}{}{}", left, segments.join(junction), right).with(colors::CORAL)
        );
    }

    fn print_cells(&self, cells: &[String], color: CtColor, bold: bool) {
        let separator = box_chars::SINGLE_VERTICAL.with(colors::CORAL);
        print!("{}", separator);
        for (cell, width) in cells.iter().zip(&self.col_widths) {
            let styled = if bold {
                cell.as_str().with(color).bold()
            } else {
                cell.as_str().with(color)
            };
            let padding = width.saturating_sub(cell.width());
            print!(" {}{} {}", styled, " ".repeat(padding), separator);
        }
        println!();
    }

    pub fn print(&self) {
        if self.col_widths.is_empty() {
            return;
        }
        self.print_border(
            box_chars::ROUND_TOP_LEFT,
            box_chars::T_TOP,
            box_chars::ROUND_TOP_RIGHT,
        );
        self.print_cells(&self.headers, colors::CORAL, true);
        self.print_border(box_chars::T_LEFT, box_chars::CROSS, box_chars::T_RIGHT);
        for row in &self.rows {
            self.print_cells(row, colors::WHITE, false);
        }
        self.print_border(
            box_chars::ROUND_BOTTOM_LEFT,
            box_chars::T_BOTTOM,
            box_chars::ROUND_BOTTOM_RIGHT,
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Prompt, Welcome and Goodbye
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_prompt(handle: Option<&str>) -> String {
    format!(
        "{} {} ",
        handle.unwrap_or("anonymous").with(colors::DIM),
        box_chars::PLAY.with(colors::RED).bold(),
    )
}

/// One line inside the welcome box. `visible_len` is the printed width of
/// `content` without its color codes.
fn print_welcome_line(content: String, visible_len: usize) {
    let border = box_chars::DOUBLE_VERTICAL.with(colors::RED);
    println!(
        "  {}{}{}{}",
        border,
        content,
        " ".repeat(WELCOME_WIDTH.saturating_sub(visible_len)),
        border
    );
}

pub fn print_welcome(storage: &str, catalog: &str) {
    print_rule(
        "  ",
        box_chars::DOUBLE_TOP_LEFT,
        box_chars::DOUBLE_HORIZONTAL,
        WELCOME_WIDTH,
        box_chars::DOUBLE_TOP_RIGHT,
        colors::RED,
    );

    let title = "tubeshelf";
    print_welcome_line(
        format!("  {}", title.with(colors::CORAL).bold()),
        title.width() + 2,
    );
    for (key, value) in [
        ("Storage", storage),
        ("Catalog", catalog),
        ("Version", env!("APP_VERSION")),
    ] {
        print_welcome_line(
            format!("  {} {}", format!("{}:", key).with(colors::DIM), value),
            key.width() + value.width() + 4,
        );
    }
    let help = "Type 'help' for available commands";
    print_welcome_line(format!("  {}", help.with(colors::DIM)), help.width() + 2);

    print_rule(
        "  ",
        box_chars::DOUBLE_BOTTOM_LEFT,
        box_chars::DOUBLE_HORIZONTAL,
        WELCOME_WIDTH,
        box_chars::DOUBLE_BOTTOM_RIGHT,
        colors::RED,
    );
    println!();
}

pub fn print_goodbye() {
    println!();
    println!(
        "  {}",
        "Bye! Your shelf is saved where you left it."
            .with(colors::CORAL)
            .bold()
    );
    println!();
}
