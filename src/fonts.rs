//! Text measurement and word wrapping for the builtin Helvetica faces.
//!
//! The PDF uses the standard Helvetica fonts, so no font file is embedded.
//! Widths come from a per-character-class approximation of the Helvetica AFM
//! advances, which is close enough to keep centred lines visually centred.

use crate::compose::Inline;

/// Approximate Helvetica advance for `c`, in em units.
fn char_advance(c: char, bold: bool) -> f32 {
    let base = match c {
        ' ' => 0.278,
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' | 'í' | 'ì' | 'ï' => 0.25,
        'f' | 't' | 'r' | '(' | ')' | '-' | '/' | 'I' => 0.333,
        'm' | 'M' | 'W' => 0.833,
        'w' => 0.722,
        '0'..='9' => 0.556,
        c if c.is_uppercase() => 0.667,
        _ => 0.53,
    };
    if bold {
        base * 1.06
    } else {
        base
    }
}

/// Width of `text` in px at `font_size`.
pub fn measure_text_width(text: &str, font_size: f32, bold: bool) -> f32 {
    text.chars().map(|c| char_advance(c, bold)).sum::<f32>() * font_size
}

/// A same-weight piece of a wrapped line.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub bold: bool,
    /// Offset from the start of the line, in px.
    pub x: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrappedLine {
    pub segments: Vec<Segment>,
    pub width: f32,
    /// The line as plain text, spaces included.
    pub plain: String,
}

impl WrappedLine {
    pub fn text(&self) -> String {
        self.plain.clone()
    }
}

/// A word made of one or more same-weight pieces glued without whitespace.
struct Word {
    pieces: Vec<(String, bool)>,
    space_before: bool,
}

fn split_words(runs: &[Inline]) -> Vec<Word> {
    let mut words: Vec<Word> = Vec::new();
    let mut pending_space = false;
    let mut in_word = false;

    for run in runs {
        let bold = run.is_strong();
        for c in run.text().chars() {
            if c.is_whitespace() {
                pending_space = true;
                in_word = false;
                continue;
            }
            if !in_word {
                words.push(Word {
                    pieces: Vec::new(),
                    space_before: pending_space && !words.is_empty(),
                });
                in_word = true;
                pending_space = false;
            }
            // `in_word` implies a word was pushed above.
            if let Some(word) = words.last_mut() {
                match word.pieces.last_mut() {
                    Some((text, b)) if *b == bold => text.push(c),
                    _ => word.pieces.push((c.to_string(), bold)),
                }
            }
        }
    }
    words
}

/// Wrap mixed-weight runs into lines no wider than `max_width`.
///
/// A single word wider than the line is kept whole on its own line.
pub fn wrap_runs(runs: &[Inline], font_size: f32, max_width: f32) -> Vec<WrappedLine> {
    let mut lines = Vec::new();
    let mut line = WrappedLine::default();
    let space_width = |bold| measure_text_width(" ", font_size, bold);

    for word in split_words(runs) {
        let word_width: f32 = word
            .pieces
            .iter()
            .map(|(t, b)| measure_text_width(t, font_size, *b))
            .sum();
        let first_bold = word.pieces.first().map(|(_, b)| *b).unwrap_or(false);
        let gap = if word.space_before && !line.segments.is_empty() {
            space_width(first_bold)
        } else {
            0.0
        };

        if !line.segments.is_empty() && line.width + gap + word_width > max_width {
            lines.push(std::mem::take(&mut line));
        }

        let mut first = true;
        for (text, bold) in word.pieces {
            let with_space = first && word.space_before && !line.segments.is_empty();
            let piece_gap = if with_space { space_width(bold) } else { 0.0 };
            if with_space {
                line.plain.push(' ');
            }
            line.plain.push_str(&text);
            match line.segments.last_mut() {
                Some(seg) if seg.bold == bold => {
                    if with_space {
                        seg.text.push(' ');
                    }
                    seg.text.push_str(&text);
                }
                _ => line.segments.push(Segment {
                    text: text.clone(),
                    bold,
                    x: line.width + piece_gap,
                }),
            }
            line.width += piece_gap + measure_text_width(&text, font_size, bold);
            first = false;
        }
    }

    if !line.segments.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}
