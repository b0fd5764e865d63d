// Text measurement for the two built-in fonts the report uses.
//
// Built-in PDF fonts ship without metrics, so widths come from the Helvetica AFM
// tables (1/1000 em). Anything outside printable ASCII falls back to an average width.

/// The report only ever draws Helvetica and Helvetica-Bold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Font {
    Regular,
    Bold,
}

/// Helvetica advance widths for ASCII 32..=126.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :;<=>?@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [\]^_`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {|}~
];

/// Helvetica-Bold advance widths for ASCII 32..=126.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    333, 333, 584, 584, 584, 611, 975, // :;<=>?@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    333, 278, 333, 584, 556, 333, // [\]^_`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a-m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n-z
    389, 280, 389, 584, // {|}~
];

pub fn char_width_1000(ch: char, font: Font) -> u16 {
    let table = match font {
        Font::Regular => &HELVETICA,
        Font::Bold => &HELVETICA_BOLD,
    };
    let code = ch as u32;
    if (32..=126).contains(&code) {
        table[(code - 32) as usize]
    } else {
        match font {
            Font::Regular => 556,
            Font::Bold => 611,
        }
    }
}

/// Width of `text` in points at `size`.
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    text.chars()
        .map(|ch| char_width_1000(ch, font) as f32)
        .sum::<f32>()
        * size
        / 1000.0
}

/// Replace characters the built-in fonts cannot encode.
///
/// Built-in fonts are WinAnsi encoded; characters outside Latin-1 would come out as
/// garbage, so the common ones are transliterated and the rest become `?`.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{20b9}' => out.push_str("Rs."),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201c}' | '\u{201d}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{2022}' => out.push('-'),
            '\t' => out.push(' '),
            '\r' => {}
            '\n' => out.push('\n'),
            c if (c as u32) < 32 => {}
            c if (c as u32) <= 0xff => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// One line of wrapped text.
#[derive(Clone, Debug, PartialEq)]
pub struct WrappedLine {
    pub text: String,
    /// Natural width at the font size it was wrapped with.
    pub width: f32,
    /// Number of inter-word gaps, used for justification.
    pub gaps: usize,
    /// Last line of a paragraph. Never stretched when justifying.
    pub ends_paragraph: bool,
}

/// Greedy word wrap. Explicit newlines start new paragraphs and blank lines are kept.
/// Words wider than `max_width` are broken by character so no line overflows.
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<WrappedLine> {
    let space = text_width(" ", font, size);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0.0_f32;
        let mut gaps = 0;

        for word in paragraph.split_whitespace() {
            for piece in split_long_word(word, font, size, max_width) {
                let piece_width = text_width(&piece, font, size);
                if current.is_empty() {
                    current = piece;
                    current_width = piece_width;
                } else if current_width + space + piece_width <= max_width {
                    current.push(' ');
                    current.push_str(&piece);
                    current_width += space + piece_width;
                    gaps += 1;
                } else {
                    lines.push(WrappedLine {
                        text: std::mem::take(&mut current),
                        width: current_width,
                        gaps,
                        ends_paragraph: false,
                    });
                    current = piece;
                    current_width = piece_width;
                    gaps = 0;
                }
            }
        }

        lines.push(WrappedLine {
            text: current,
            width: current_width,
            gaps,
            ends_paragraph: true,
        });
    }

    // Trailing blank paragraphs add height without content.
    while lines.len() > 1 && lines.last().is_some_and(|l| l.text.is_empty()) {
        lines.pop();
    }
    if let Some(last) = lines.last_mut() {
        last.ends_paragraph = true;
    }
    lines
}

fn split_long_word(word: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    if text_width(word, font, size) <= max_width {
        return vec![word.to_string()];
    }
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0;
    for ch in word.chars() {
        let w = char_width_1000(ch, font) as f32 * size / 1000.0;
        if !piece.is_empty() && width + w > max_width {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(ch);
        width += w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Shorten `text` with a trailing ellipsis so it fits `max_width`.
pub fn truncate_to_width(text: &str, font: Font, size: f32, max_width: f32) -> String {
    if text_width(text, font, size) <= max_width {
        return text.to_string();
    }
    let ellipsis = "...";
    let budget = max_width - text_width(ellipsis, font, size);
    let mut out = String::new();
    let mut width = 0.0;
    for ch in text.chars() {
        let w = char_width_1000(ch, font) as f32 * size / 1000.0;
        if width + w > budget {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push_str(ellipsis);
    out
}
