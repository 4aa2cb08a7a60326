//! Rule string tokenizer

use crate::error::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Lexical token of a rule string
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    OpenParen,
    CloseParen,
    And,
    Or,
    /// Any run of `<`, `>`, `=`, `!`
    Operator(String),
    /// Bare word (field name or unquoted value)
    Identifier(String),
    /// Single-quoted string with the quotes stripped
    Str(String),
    Number(f64),
}

/// Alternatives are tried leftmost-first at each position, so the order here
/// decides which class wins: quoted strings before words, numbers before
/// words unless the digits run into letters.
static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"'(?P<str>[^']*)'|(?P<num>-?\d+(?:\.\d+)?)\b|(?P<open>\()|(?P<close>\))|(?P<op>[<>=!]+)|(?P<word>\w+)")
        .expect("token pattern is a valid regex")
});

/// Split a rule string into tokens.
///
/// Whitespace and characters that belong to no token class are skipped.
pub fn tokenize(rule: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();

    for caps in TOKEN_PATTERN.captures_iter(rule) {
        let token = if let Some(m) = caps.name("str") {
            Token::Str(m.as_str().to_string())
        } else if let Some(m) = caps.name("num") {
            match m.as_str().parse::<f64>() {
                Ok(n) => Token::Number(n),
                Err(_) => Token::Identifier(m.as_str().to_string()),
            }
        } else if caps.name("open").is_some() {
            Token::OpenParen
        } else if caps.name("close").is_some() {
            Token::CloseParen
        } else if let Some(m) = caps.name("op") {
            Token::Operator(m.as_str().to_string())
        } else if let Some(m) = caps.name("word") {
            match m.as_str() {
                "AND" => Token::And,
                "OR" => Token::Or,
                word => Token::Identifier(word.to_string()),
            }
        } else {
            continue;
        };
        tokens.push(token);
    }

    if tokens.is_empty() {
        return Err(ParseError::EmptyOrInvalid);
    }

    Ok(tokens)
}

/// Whether `name` reads back as exactly one identifier token
pub fn is_field_name(name: &str) -> bool {
    matches!(tokenize(name).as_deref(), Ok([Token::Identifier(word)]) if word == name)
}

/// Whether `symbol` reads back as exactly one comparison operator token
pub fn is_operator_symbol(symbol: &str) -> bool {
    matches!(tokenize(symbol).as_deref(), Ok([Token::Operator(op)]) if op == symbol)
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::OpenParen => f.write_str("("),
            Token::CloseParen => f.write_str(")"),
            Token::And => f.write_str("AND"),
            Token::Or => f.write_str("OR"),
            Token::Operator(op) => f.write_str(op),
            Token::Identifier(word) => f.write_str(word),
            Token::Str(s) => write!(f, "'{}'", s),
            Token::Number(n) => write!(f, "{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(s: &str) -> Token {
        Token::Identifier(s.to_string())
    }

    fn op(s: &str) -> Token {
        Token::Operator(s.to_string())
    }

    #[test]
    fn test_tokenize_simple_comparison() {
        let tokens = tokenize("age > 30").unwrap();
        assert_eq!(tokens, vec![ident("age"), op(">"), Token::Number(30.0)]);
    }

    #[test]
    fn test_tokenize_without_whitespace() {
        let tokens = tokenize("(age>=30)AND(dept!='HR')").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::OpenParen,
                ident("age"),
                op(">="),
                Token::Number(30.0),
                Token::CloseParen,
                Token::And,
                Token::OpenParen,
                ident("dept"),
                op("!="),
                Token::Str("HR".to_string()),
                Token::CloseParen,
            ]
        );
    }

    #[test]
    fn test_quoted_string_keeps_inner_text() {
        let tokens = tokenize("city = 'New York'").unwrap();
        assert_eq!(tokens[2], Token::Str("New York".to_string()));

        let tokens = tokenize("code = ''").unwrap();
        assert_eq!(tokens[2], Token::Str(String::new()));
    }

    #[test]
    fn test_quoted_keyword_is_a_string() {
        let tokens = tokenize("flag = 'AND'").unwrap();
        assert_eq!(tokens[2], Token::Str("AND".to_string()));
    }

    #[test]
    fn test_keywords_are_whole_words() {
        let tokens = tokenize("ORDER > 1 AND ANDROID = 2").unwrap();
        assert_eq!(tokens[0], ident("ORDER"));
        assert_eq!(tokens[3], Token::And);
        assert_eq!(tokens[4], ident("ANDROID"));
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        let tokens = tokenize("a > 1 and b > 2").unwrap();
        assert_eq!(tokens[3], ident("and"));
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("x > -5 AND y < 2.75").unwrap();
        assert_eq!(tokens[2], Token::Number(-5.0));
        assert_eq!(tokens[6], Token::Number(2.75));
    }

    #[test]
    fn test_digits_followed_by_letters_form_a_word() {
        let tokens = tokenize("code = 30abc").unwrap();
        assert_eq!(tokens[2], ident("30abc"));
    }

    #[test]
    fn test_unrecognized_characters_are_skipped() {
        let tokens = tokenize("age > 30 ; # @").unwrap();
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_operator_runs_are_greedy() {
        let tokens = tokenize("a <>= 1").unwrap();
        assert_eq!(tokens[1], op("<>="));
    }

    #[test]
    fn test_single_token_checks() {
        assert!(is_field_name("department"));
        assert!(is_field_name("first_name"));
        assert!(!is_field_name("first name"));
        assert!(!is_field_name("OR"));
        assert!(!is_field_name("30"));
        assert!(!is_field_name(""));

        assert!(is_operator_symbol(">="));
        assert!(is_operator_symbol("=="));
        assert!(!is_operator_symbol("gt"));
        assert!(!is_operator_symbol("> ="));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(tokenize(""), Err(ParseError::EmptyOrInvalid));
        assert_eq!(tokenize("   "), Err(ParseError::EmptyOrInvalid));
        assert_eq!(tokenize("#@;"), Err(ParseError::EmptyOrInvalid));
    }
}
