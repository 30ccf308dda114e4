//! Life-standard run-length-encoded pattern files.
//!
//! ```text
//! #C a glider
//! x = 3, y = 3, rule = B3/S23
//! bob$2bo$3o!
//! ```
//!
//! Tokens are `[count]tag` with a default count of 1: `b` a dead run, `o`
//! an alive run, `$` one or more end-of-lines, `!` end of pattern. The
//! in-memory form keeps one entry per non-empty row, each a sequence of
//! `(value, repeat)` runs with trailing dead cells trimmed, the shape the
//! run-length zip consumes directly. The token payload is generic: parsing
//! produces cell bits, and the zip replaces them with quadtree handles
//! pass by pass.

use core::fmt;
use std::fmt::Write as _;

use crate::codec::matrix::Matrix;
use crate::rule::{Rule, RuleError};

/// Soft output width: a body line is wrapped before it would pass this.
const WRAP_COLUMN: usize = 70;

/// One run: `repeat` consecutive copies of `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RleToken<V> {
    pub value: V,
    pub repeat: usize,
}

/// One non-empty row of runs, trailing dead cells omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RleLine<V> {
    /// 0-based row; rows absent from the map are implicitly all-dead.
    pub line_num: usize,
    pub tokens: Vec<RleToken<V>>,
}

/// A parsed pattern: declared extent, rule, and the non-empty rows in
/// ascending `line_num` order.
#[derive(Debug, Clone, PartialEq)]
pub struct RleMap<V> {
    pub x: usize,
    pub y: usize,
    pub rule: Rule,
    pub lines: Vec<RleLine<V>>,
}

/// RLE text rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RleError {
    /// No header line before end of input.
    MissingHeader,
    /// Header line present but not `x = …, y = …[, rule = …]`.
    BadHeader(String),
    BadRule(RuleError),
    /// A body tag outside `b o $ !`.
    UnknownTag(char),
    /// Input ended before the `!` terminator.
    MissingTerminator,
}

impl fmt::Display for RleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RleError::MissingHeader => write!(f, "no RLE header line found"),
            RleError::BadHeader(h) => write!(f, "malformed RLE header {h:?}"),
            RleError::BadRule(e) => write!(f, "bad rule in RLE header: {e}"),
            RleError::UnknownTag(c) => write!(f, "unrecognised RLE tag {c:?}"),
            RleError::MissingTerminator => write!(f, "pattern not terminated by '!'"),
        }
    }
}

impl std::error::Error for RleError {}

impl From<RuleError> for RleError {
    fn from(e: RuleError) -> Self {
        RleError::BadRule(e)
    }
}

// ── Tokenizer ────────────────────────────────────────────────────────────────

/// Streaming `[count]tag` reader over the pattern body.
struct TokenReader<'a> {
    bytes: &'a [u8],
    at: usize,
}

/// One body token, or the pattern terminator.
enum Tok {
    Run { count: usize, tag: u8 },
    End,
}

impl<'a> TokenReader<'a> {
    fn new(body: &'a str) -> TokenReader<'a> {
        TokenReader { bytes: body.as_bytes(), at: 0 }
    }

    fn next(&mut self) -> Result<Tok, RleError> {
        while self.at < self.bytes.len() && self.bytes[self.at].is_ascii_whitespace() {
            self.at += 1;
        }
        if self.at == self.bytes.len() {
            return Err(RleError::MissingTerminator);
        }
        let mut count = 0usize;
        let mut have_digits = false;
        while self.at < self.bytes.len() && self.bytes[self.at].is_ascii_digit() {
            count = count * 10 + (self.bytes[self.at] - b'0') as usize;
            have_digits = true;
            self.at += 1;
        }
        if self.at == self.bytes.len() {
            return Err(RleError::MissingTerminator);
        }
        let tag = self.bytes[self.at];
        self.at += 1;
        let count = if have_digits { count.max(1) } else { 1 };
        match tag {
            b'!' => Ok(Tok::End),
            b'b' | b'o' | b'$' => Ok(Tok::Run { count, tag }),
            other => Err(RleError::UnknownTag(other as char)),
        }
    }
}

// ── Parse ────────────────────────────────────────────────────────────────────

/// Parse an RLE pattern file.
pub fn read_rle(input: &str) -> Result<RleMap<u8>, RleError> {
    let mut rest = input;
    let header = loop {
        let (line, tail) = match rest.split_once('\n') {
            Some((l, t)) => (l, t),
            None => (rest, ""),
        };
        let trimmed = line.trim();
        if trimmed.starts_with('#') || trimmed.is_empty() {
            if tail.is_empty() {
                return Err(RleError::MissingHeader);
            }
            rest = tail;
            continue;
        }
        rest = tail;
        break trimmed;
    };

    let (x, y, rule) = parse_header(header)?;
    let lines = parse_body(rest)?;
    Ok(RleMap { x, y, rule, lines })
}

/// `x = <int>, y = <int>[, rule = <rulestring>]`; the rule key may also be
/// spelled `r`, and a missing rule defaults to Conway's Life.
fn parse_header(header: &str) -> Result<(usize, usize, Rule), RleError> {
    let bad = || RleError::BadHeader(header.to_owned());
    let mut x = None;
    let mut y = None;
    let mut rule = None;
    for field in header.split(',') {
        let (key, value) = field.split_once('=').ok_or_else(bad)?;
        match (key.trim(), value.trim()) {
            ("x", v) => x = Some(v.parse::<usize>().map_err(|_| bad())?),
            ("y", v) => y = Some(v.parse::<usize>().map_err(|_| bad())?),
            ("rule" | "r", v) => rule = Some(Rule::parse(v)?),
            _ => return Err(bad()),
        }
    }
    match (x, y) {
        (Some(x), Some(y)) => Ok((x, y, rule.unwrap_or_else(Rule::conway))),
        _ => Err(bad()),
    }
}

fn parse_body(body: &str) -> Result<Vec<RleLine<u8>>, RleError> {
    let mut reader = TokenReader::new(body);
    let mut lines = Vec::new();
    let mut line_num = 0usize;
    let mut tokens: Vec<RleToken<u8>> = Vec::new();

    fn push_run(tokens: &mut Vec<RleToken<u8>>, value: u8, repeat: usize) {
        match tokens.last_mut() {
            Some(last) if last.value == value => last.repeat += repeat,
            _ => tokens.push(RleToken { value, repeat }),
        }
    }

    fn flush(lines: &mut Vec<RleLine<u8>>, tokens: &mut Vec<RleToken<u8>>, line_num: usize) {
        if let Some(last) = tokens.last() {
            if last.value == 0 {
                tokens.pop();
            }
        }
        if !tokens.is_empty() {
            lines.push(RleLine { line_num, tokens: std::mem::take(tokens) });
        }
    }

    loop {
        match reader.next()? {
            Tok::Run { count, tag: b'b' } => push_run(&mut tokens, 0, count),
            Tok::Run { count, tag: b'o' } => push_run(&mut tokens, 1, count),
            Tok::Run { count, .. } => {
                // '$': close the current row and skip count - 1 blank rows.
                flush(&mut lines, &mut tokens, line_num);
                line_num += count;
            }
            Tok::End => {
                flush(&mut lines, &mut tokens, line_num);
                return Ok(lines);
            }
        }
    }
}

// ── Emit ─────────────────────────────────────────────────────────────────────

/// Render a cell map back to RLE text.
///
/// Inverse of [`read_rle`] up to run normalisation: the output parses back
/// to an identical map. Body lines wrap before [`WRAP_COLUMN`] characters.
pub fn write_rle(map: &RleMap<u8>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "x = {}, y = {}, rule = {}", map.x, map.y, map.rule);

    let mut column = 0usize;
    let mut emit = |out: &mut String, count: usize, tag: char| {
        if count == 0 {
            return;
        }
        let mut run = String::new();
        if count > 1 {
            let _ = write!(run, "{count}");
        }
        run.push(tag);
        if column + run.len() > WRAP_COLUMN {
            out.push('\n');
            column = 0;
        }
        column += run.len();
        out.push_str(&run);
    };

    // `cursor` is the row the output is positioned on; each stored line is
    // reached with a `$` run first (strictly ascending line numbers make
    // the gap positive for every line after the first).
    let mut cursor = 0usize;
    for line in &map.lines {
        emit(&mut out, line.line_num - cursor, '$');
        for tok in &line.tokens {
            emit(&mut out, tok.repeat, if tok.value != 0 { 'o' } else { 'b' });
        }
        cursor = line.line_num;
    }
    out.push_str("!\n");
    out
}

// ── Matrix conversions ───────────────────────────────────────────────────────

impl RleMap<u8> {
    /// Total column extent of the widest stored row.
    pub fn width(&self) -> usize {
        self.lines
            .iter()
            .map(|l| l.tokens.iter().map(|t| t.repeat).sum())
            .fold(self.x, usize::max)
    }

    /// Row extent including implicit trailing blank rows.
    pub fn height(&self) -> usize {
        self.lines.last().map_or(self.y, |l| self.y.max(l.line_num + 1))
    }

    /// Render the runs into a dense grid.
    pub fn to_matrix(&self) -> Matrix {
        let mut mat = Matrix::new(self.height(), self.width(), self.rule.clone());
        for line in &self.lines {
            let mut col = 0;
            for tok in &line.tokens {
                for _ in 0..tok.repeat {
                    mat.set(line.line_num, col, tok.value);
                    col += 1;
                }
            }
        }
        mat
    }

    /// Scan a dense grid into run form.
    pub fn from_matrix(mat: &Matrix) -> RleMap<u8> {
        let mut lines = Vec::new();
        for r in 0..mat.rows() {
            let mut tokens: Vec<RleToken<u8>> = Vec::new();
            for c in 0..mat.cols() {
                let v = mat.get(r, c);
                match tokens.last_mut() {
                    Some(last) if last.value == v => last.repeat += 1,
                    _ => tokens.push(RleToken { value: v, repeat: 1 }),
                }
            }
            while tokens.last().is_some_and(|t| t.value == 0) {
                tokens.pop();
            }
            if !tokens.is_empty() {
                lines.push(RleLine { line_num: r, tokens });
            }
        }
        RleMap { x: mat.cols(), y: mat.rows(), rule: mat.rule().clone(), lines }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLIDER: &str = "x = 3, y = 3, rule = B3/S23\nbob$2bo$3o!\n";

    fn runs(line: &RleLine<u8>) -> Vec<(u8, usize)> {
        line.tokens.iter().map(|t| (t.value, t.repeat)).collect()
    }

    #[test]
    fn parses_glider() {
        let map = read_rle(GLIDER).unwrap();
        assert_eq!((map.x, map.y), (3, 3));
        assert_eq!(map.rule, Rule::conway());
        assert_eq!(map.lines.len(), 3);
        assert_eq!(map.lines[0].line_num, 0);
        assert_eq!(runs(&map.lines[0]), vec![(0, 1), (1, 1)]);
        assert_eq!(runs(&map.lines[1]), vec![(0, 2), (1, 1)]);
        assert_eq!(runs(&map.lines[2]), vec![(1, 3)]);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let text = "#N Glider\n#C travels diagonally\n\nx = 3, y = 3, rule = B3/S23\nbob$2bo$3o!\n";
        assert_eq!(read_rle(text).unwrap(), read_rle(GLIDER).unwrap());
    }

    #[test]
    fn multi_dollar_skips_rows_and_blank_rows_are_dropped() {
        let map = read_rle("x = 1, y = 4, rule = B3/S23\no3$o!\n").unwrap();
        assert_eq!(map.lines.len(), 2);
        assert_eq!(map.lines[0].line_num, 0);
        assert_eq!(map.lines[1].line_num, 3);
    }

    #[test]
    fn trailing_dead_cells_are_trimmed() {
        let map = read_rle("x = 5, y = 1, rule = B3/S23\nob2o2b!\n").unwrap();
        assert_eq!(runs(&map.lines[0]), vec![(1, 1), (0, 1), (1, 2)]);
    }

    #[test]
    fn consecutive_equal_runs_merge() {
        let map = read_rle("x = 5, y = 1, rule = B3/S23\n2o3o!\n").unwrap();
        assert_eq!(runs(&map.lines[0]), vec![(1, 5)]);
    }

    #[test]
    fn header_variants() {
        assert!(read_rle("x = 2, y = 1, r = B3/S23\n2o!\n").is_ok());
        let defaulted = read_rle("x = 2, y = 1\n2o!\n").unwrap();
        assert_eq!(defaulted.rule, Rule::conway());
        assert!(matches!(
            read_rle("x = 2\n2o!\n"),
            Err(RleError::BadHeader(_))
        ));
        assert!(matches!(
            read_rle("x = a, y = 1\no!\n"),
            Err(RleError::BadHeader(_))
        ));
        assert!(matches!(read_rle(""), Err(RleError::MissingHeader)));
    }

    #[test]
    fn rejects_unknown_tags_and_missing_bang() {
        assert!(matches!(
            read_rle("x = 1, y = 1, rule = B3/S23\noz!\n"),
            Err(RleError::UnknownTag('z'))
        ));
        assert!(matches!(
            read_rle("x = 1, y = 1, rule = B3/S23\n3o\n"),
            Err(RleError::MissingTerminator)
        ));
    }

    #[test]
    fn emit_round_trips() {
        let map = read_rle(GLIDER).unwrap();
        let text = write_rle(&map);
        assert_eq!(read_rle(&text).unwrap(), map);
    }

    #[test]
    fn emit_preserves_leading_blank_rows() {
        let map = read_rle("x = 1, y = 3, rule = B3/S23\n2$o!\n").unwrap();
        assert_eq!(map.lines[0].line_num, 2);
        let text = write_rle(&map);
        assert_eq!(read_rle(&text).unwrap(), map);
    }

    #[test]
    fn emit_wraps_long_bodies() {
        // A sparse diagonal produces many short runs; every emitted body
        // line must stay within the wrap column.
        let mut mat = Matrix::new(60, 60, Rule::conway());
        for i in 0..60 {
            mat.set(i, i, 1);
        }
        let text = write_rle(&RleMap::from_matrix(&mat));
        for line in text.lines().skip(1) {
            assert!(line.len() <= WRAP_COLUMN, "line too long: {line:?}");
        }
        assert_eq!(read_rle(&text).unwrap(), RleMap::from_matrix(&mat));
    }

    #[test]
    fn matrix_round_trip() {
        let map = read_rle(GLIDER).unwrap();
        let mat = map.to_matrix();
        assert_eq!(mat.rows(), 3);
        assert_eq!(mat.get(0, 1), 1);
        assert_eq!(mat.get(2, 2), 1);
        assert_eq!(RleMap::from_matrix(&mat), map);
    }
}
