//! Game record (PGN) text handling
//!
//! Import is deliberately forgiving. Raw text goes through four steps before
//! any move is played:
//!
//! 1. Comments (`{...}` and `;` to end of line) are removed
//! 2. Line endings are normalised and unsupported characters dropped
//! 3. Lines are split into header tags and movetext
//! 4. Movetext is tokenised, skipping move numbers, results, variations and
//!    annotation glyphs
//!
//! Legality is decided later by [`crate::game::GameState`], which accepts
//! both SAN and long algebraic tokens.

use crate::game::GameRecordError;
use tracing::warn;

/// Characters kept by [`sanitize`] besides ASCII letters and digits
const ALLOWED_PUNCTUATION: &str = " \n[]().#+-=/:?*!\"'";

/// Tokens that end a game in movetext
const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// One `[Name "Value"]` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A segmented game record, not yet checked for legality
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameRecord {
    /// Header tags in file order
    pub headers: Vec<Tag>,
    /// Movetext lines joined by single spaces
    pub movetext: String,
    /// `headers + "\n\n" + movetext`, or whichever part exists
    pub normalized: String,
}

impl GameRecord {
    /// Value of the first tag called `name`
    pub fn tag(&self, name: &str) -> Option<&str> {
        find_tag(&self.headers, name)
    }

    /// Movetext split into move tokens
    pub fn move_tokens(&self) -> Vec<String> {
        movetext_tokens(&self.movetext)
    }
}

pub(crate) fn find_tag<'a>(headers: &'a [Tag], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|tag| tag.name.eq_ignore_ascii_case(name))
        .map(|tag| tag.value.as_str())
}

/// Clean and segment raw game-record text
///
/// Fails with [`GameRecordError::EmptyAfterSanitize`] when the input had
/// content but none of it survived cleaning. Blank input yields an empty
/// record (a game with no moves).
///
/// # Examples
///
/// ```
/// use chessdesk::game::record::parse_game_record;
///
/// let record = parse_game_record("[Event \"Casual\"]\r\n\r\n1. e4 e5 2. Nf3 *").unwrap();
/// assert_eq!(record.tag("Event"), Some("Casual"));
/// assert_eq!(record.move_tokens(), vec!["e4", "e5", "Nf3"]);
/// ```
pub fn parse_game_record(raw: &str) -> Result<GameRecord, GameRecordError> {
    let cleaned = sanitize(&strip_comments(raw));
    let record = segment(&cleaned);

    if record.normalized.is_empty() && !raw.trim().is_empty() {
        return Err(GameRecordError::EmptyAfterSanitize);
    }
    Ok(record)
}

/// Remove brace comments and `;` rest-of-line comments
///
/// Header tag lines are kept whole, so a `;` or `{` inside a tag value
/// does not start a comment.
pub fn strip_comments(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut out = String::with_capacity(text.len());
    let mut in_brace = false;

    for line in text.split_inclusive('\n') {
        if !in_brace && is_tag_line(line) {
            out.push_str(line);
            continue;
        }

        let mut in_line = false;
        for c in line.chars() {
            match c {
                '\n' => out.push(c),
                _ if in_line => {}
                '}' if in_brace => {
                    in_brace = false;
                    out.push(' ');
                }
                _ if in_brace => {}
                '{' => in_brace = true,
                ';' => in_line = true,
                _ => out.push(c),
            }
        }
    }
    out
}

fn is_tag_line(line: &str) -> bool {
    let line = line.trim();
    line.starts_with('[') && line.ends_with(']')
}

/// Normalise line endings and drop unsupported characters
///
/// `\r\n` and lone `\r` become `\n`. Everything except ASCII letters,
/// digits and `` \n[]().#+-=/:?*!"'`` (and the space) is removed.
pub fn sanitize(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || ALLOWED_PUNCTUATION.contains(*c))
        .collect()
}

/// Split sanitised text into header tags and movetext
///
/// A trimmed line that starts with `[` and ends with `]` is a tag; any other
/// non-empty line is movetext. A tag after movetext is still accepted.
pub fn segment(sanitized: &str) -> GameRecord {
    let mut header_lines: Vec<&str> = Vec::new();
    let mut movetext_lines: Vec<&str> = Vec::new();

    for line in sanitized.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            if !movetext_lines.is_empty() {
                warn!("[PGN] Header tag after movetext: {}", line);
            }
            header_lines.push(line);
        } else {
            movetext_lines.push(line);
        }
    }

    let headers_text = header_lines.join("\n");
    let movetext = movetext_lines
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let normalized = match (headers_text.is_empty(), movetext.is_empty()) {
        (false, false) => format!("{}\n\n{}", headers_text, movetext),
        (false, true) => headers_text.clone(),
        (true, _) => movetext.clone(),
    };

    GameRecord {
        headers: header_lines.into_iter().filter_map(parse_tag).collect(),
        movetext,
        normalized,
    }
}

/// Parse one `[Name "Value"]` line
pub fn parse_tag(line: &str) -> Option<Tag> {
    let inner = line.trim().strip_prefix('[')?.strip_suffix(']')?.trim();
    let (name, value) = inner.split_once(char::is_whitespace)?;
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);

    if name.is_empty() {
        return None;
    }
    Some(Tag::new(name, value))
}

/// Split movetext into candidate move tokens
///
/// Drops move numbers (`12.`, `12...`), results, parenthesised variations,
/// numeric annotation glyphs and `!`/`?` suffixes. Castling written with
/// zeros is rewritten with letters.
pub fn movetext_tokens(movetext: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    for c in movetext.chars() {
        match c {
            '(' => {
                flush_token(&mut current, depth, &mut tokens);
                depth += 1;
            }
            ')' => {
                flush_token(&mut current, depth, &mut tokens);
                depth = depth.saturating_sub(1);
            }
            c if c.is_whitespace() => flush_token(&mut current, depth, &mut tokens),
            c => current.push(c),
        }
    }
    flush_token(&mut current, depth, &mut tokens);
    tokens
}

fn flush_token(current: &mut String, depth: usize, tokens: &mut Vec<String>) {
    let raw = std::mem::take(current);
    if depth > 0 {
        return;
    }
    if let Some(token) = clean_token(&raw) {
        tokens.push(token);
    }
}

fn clean_token(raw: &str) -> Option<String> {
    if RESULT_TOKENS.contains(&raw) || raw.starts_with('$') {
        return None;
    }

    // "12." / "12...Nf6" / "1.e4"
    let mut token = raw;
    let after_number = token.trim_start_matches(|c: char| c.is_ascii_digit());
    if after_number.len() < token.len() && after_number.starts_with('.') {
        token = after_number.trim_start_matches('.');
    }

    let token = token.trim_end_matches(['!', '?']);
    if token.is_empty()
        || token.chars().all(|c| c.is_ascii_digit())
        || token.chars().all(|c| c == '.')
        || token == "e.p."
    {
        return None;
    }

    if token.starts_with("0-0") {
        return Some(token.replace('0', "O"));
    }
    Some(token.to_string())
}

/// Render a game as PGN
///
/// `first_fullmove` and `black_first` describe the starting position so
/// that numbering continues from a `FEN` tag. Movetext lines are wrapped
/// below 80 columns.
pub fn write_pgn(
    headers: &[Tag],
    first_fullmove: u32,
    black_first: bool,
    sans: &[String],
    result: &str,
) -> String {
    let mut out = String::new();
    for tag in headers {
        out.push_str(&format!("[{} \"{}\"]\n", tag.name, tag.value.replace('"', "'")));
    }
    if !headers.is_empty() {
        out.push('\n');
    }

    let mut words = Vec::with_capacity(sans.len() * 2 + 1);
    for (ply, san) in sans.iter().enumerate() {
        let offset = ply + usize::from(black_first);
        let number = first_fullmove as usize + offset / 2;
        if offset % 2 == 0 {
            words.push(format!("{}.", number));
        } else if ply == 0 {
            words.push(format!("{}...", number));
        }
        words.push(san.clone());
    }
    words.push(result.to_string());

    let mut line_len = 0;
    for word in words {
        if line_len > 0 && line_len + 1 + word.len() > 79 {
            out.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        line_len += word.len();
        out.push_str(&word);
    }
    out.push('\n');
    out
}
