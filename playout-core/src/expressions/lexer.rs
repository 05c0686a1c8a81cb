use super::{ExpressionError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),
    Text(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Not,
    Like,
}

pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        let next = chars.get(pos + 1).copied();
        match c {
            c if c.is_whitespace() => pos += 1,
            '0'..='9' | '.' => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                    pos += 1;
                }
                let text: String = chars[start..pos].iter().collect();
                let value = text
                    .parse()
                    .map_err(|_| ExpressionError::InvalidNumber(text.clone()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                    pos += 1;
                }
                let word: String = chars[start..pos].iter().collect();
                tokens.push(match word.to_ascii_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "like" => Token::Like,
                    _ => Token::Ident(word),
                });
            }
            '\'' | '"' => {
                let quote = c;
                let start = pos + 1;
                pos = start;
                while pos < chars.len() && chars[pos] != quote {
                    pos += 1;
                }
                if pos >= chars.len() {
                    return Err(ExpressionError::UnterminatedString(start - 1));
                }
                tokens.push(Token::Text(chars[start..pos].iter().collect()));
                pos += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                pos += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                pos += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                pos += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                pos += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                pos += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            '<' => match next {
                Some('=') => {
                    tokens.push(Token::Le);
                    pos += 2;
                }
                Some('>') => {
                    tokens.push(Token::Ne);
                    pos += 2;
                }
                _ => {
                    tokens.push(Token::Lt);
                    pos += 1;
                }
            },
            '>' => {
                if next == Some('=') {
                    tokens.push(Token::Ge);
                    pos += 2;
                } else {
                    tokens.push(Token::Gt);
                    pos += 1;
                }
            }
            '=' => {
                tokens.push(Token::Eq);
                pos += if next == Some('=') { 2 } else { 1 };
            }
            '!' => {
                if next == Some('=') {
                    tokens.push(Token::Ne);
                    pos += 2;
                } else {
                    tokens.push(Token::Not);
                    pos += 1;
                }
            }
            '&' if next == Some('&') => {
                tokens.push(Token::And);
                pos += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Or);
                pos += 2;
            }
            other => return Err(ExpressionError::UnexpectedCharacter(other, pos)),
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators_and_keywords() {
        let tokens = tokenize("a <> 'x' && not (b >= 2.5) || c == \"y\"").expect("tokens");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("a".into()),
                Token::Ne,
                Token::Text("x".into()),
                Token::And,
                Token::Not,
                Token::LParen,
                Token::Ident("b".into()),
                Token::Ge,
                Token::Number(2.5),
                Token::RParen,
                Token::Or,
                Token::Ident("c".into()),
                Token::Eq,
                Token::Text("y".into()),
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        assert!(matches!(
            tokenize("title = 'open"),
            Err(ExpressionError::UnterminatedString(8))
        ));
        assert!(matches!(
            tokenize("count # 2"),
            Err(ExpressionError::UnexpectedCharacter('#', 6))
        ));
    }
}
