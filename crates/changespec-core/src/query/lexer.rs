use super::{QuerySyntaxError, Special};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    LParen,
    RParen,
    And,
    Or,
    /// `bang` is true for `!`, false for the `NOT` keyword.
    Not { bang: bool },
    /// `!!`, shorthand for `NOT !!!`.
    NotError,
    Special(Special),
    Term { text: String, case_sensitive: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub pos: usize,
}

fn is_boundary(chars: &[char], i: usize) -> bool {
    chars
        .get(i)
        .is_none_or(|&c| c.is_whitespace() || c == '(' || c == ')')
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && c != '(' && c != ')' && c != '"'
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, QuerySyntaxError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let pos = i;
        let kind = match c {
            '(' => {
                i += 1;
                TokenKind::LParen
            }
            ')' => {
                i += 1;
                TokenKind::RParen
            }
            '!' => {
                let next = |k: usize| chars.get(pos + k).copied();
                if next(1) == Some('!') && next(2) == Some('!') && is_boundary(&chars, i + 3) {
                    i += 3;
                    TokenKind::Special(Special::Error)
                } else if next(1) == Some('@') && next(2) == Some('$') && is_boundary(&chars, i + 3)
                {
                    i += 3;
                    TokenKind::Special(Special::Any)
                } else if next(1) == Some('!') && is_boundary(&chars, i + 2) {
                    i += 2;
                    TokenKind::NotError
                } else {
                    i += 1;
                    TokenKind::Not { bang: true }
                }
            }
            '"' => {
                let (text, end) = read_string(&chars, i)?;
                i = end;
                TokenKind::Term {
                    text,
                    case_sensitive: false,
                }
            }
            'c' if chars.get(i + 1) == Some(&'"') => {
                let (text, end) = read_string(&chars, i + 1)?;
                i = end;
                TokenKind::Term {
                    text,
                    case_sensitive: true,
                }
            }
            _ => {
                let start = i;
                while i < chars.len() && is_word_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                word_kind(word)
            }
        };
        tokens.push(Token { kind, pos });
    }

    Ok(tokens)
}

fn word_kind(word: String) -> TokenKind {
    match word.to_ascii_uppercase().as_str() {
        "AND" => TokenKind::And,
        "OR" => TokenKind::Or,
        "NOT" => TokenKind::Not { bang: false },
        "@" | "@@@" => TokenKind::Special(Special::RunningAgent),
        "$" | "$$$" => TokenKind::Special(Special::RunningProcess),
        _ => TokenKind::Term {
            text: word,
            case_sensitive: false,
        },
    }
}

/// Read a quoted literal whose opening quote is at `open`. Returns the
/// decoded text and the index just past the closing quote.
fn read_string(chars: &[char], open: usize) -> Result<(String, usize), QuerySyntaxError> {
    let mut text = String::new();
    let mut i = open + 1;
    while i < chars.len() {
        match chars[i] {
            '"' => return Ok((text, i + 1)),
            '\\' => {
                let Some(&escaped) = chars.get(i + 1) else {
                    break;
                };
                match escaped {
                    '"' => text.push('"'),
                    '\\' => text.push('\\'),
                    'n' => text.push('\n'),
                    't' => text.push('\t'),
                    'r' => text.push('\r'),
                    other => {
                        text.push('\\');
                        text.push(other);
                    }
                }
                i += 2;
            }
            c => {
                text.push(c);
                i += 1;
            }
        }
    }
    Err(QuerySyntaxError::new("unterminated string literal", open))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn term(text: &str) -> TokenKind {
        TokenKind::Term {
            text: text.to_string(),
            case_sensitive: false,
        }
    }

    #[test]
    fn keywords_case_insensitive() {
        assert_eq!(
            kinds("a and b Or not c"),
            vec![
                term("a"),
                TokenKind::And,
                term("b"),
                TokenKind::Or,
                TokenKind::Not { bang: false },
                term("c"),
            ]
        );
    }

    #[test]
    fn bang_forms() {
        assert_eq!(kinds("!!!"), vec![TokenKind::Special(Special::Error)]);
        assert_eq!(kinds("!!"), vec![TokenKind::NotError]);
        assert_eq!(kinds("!@$"), vec![TokenKind::Special(Special::Any)]);
        assert_eq!(kinds("!"), vec![TokenKind::Not { bang: true }]);
        assert_eq!(
            kinds("!foo"),
            vec![TokenKind::Not { bang: true }, term("foo")]
        );
        assert_eq!(
            kinds("(!!!)"),
            vec![
                TokenKind::LParen,
                TokenKind::Special(Special::Error),
                TokenKind::RParen
            ]
        );
    }

    #[test]
    fn quoted_and_case_sensitive_literals() {
        assert_eq!(
            kinds(r#"c"Foo Bar" "x y""#),
            vec![
                TokenKind::Term {
                    text: "Foo Bar".to_string(),
                    case_sensitive: true
                },
                term("x y"),
            ]
        );
        assert_eq!(kinds("cat"), vec![term("cat")]);
    }

    #[test]
    fn escapes_decoded() {
        assert_eq!(kinds(r#""a\"b\nc""#), vec![term("a\"b\nc")]);
        assert_eq!(kinds(r#""\z""#), vec![term("\\z")]);
    }

    #[test]
    fn unterminated_string_position() {
        let err = tokenize(r#"foo "bar"#).unwrap_err();
        assert_eq!(err.position, 4);
        let err = tokenize(r#"c"trailing\"#).unwrap_err();
        assert_eq!(err.position, 1);
    }

    #[test]
    fn positions_are_char_offsets() {
        let tokens = tokenize("é OR b").unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.pos).collect();
        assert_eq!(positions, [0, 2, 5]);
    }
}
