use std::fmt::Display;

use logos::Logos;

/// Raw token produced by logos, before line/column tracking and literal extraction.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\f]+")] // Skip horizontal whitespace
enum RawToken {
    #[regex(r"//[^\n]*")]
    LineComment,
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,
    #[token("\n")]
    Newline,

    // Keywords
    #[token("var")]
    Var,
    #[token("const")]
    Const,
    #[token("fn")]
    Fn,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("display")]
    Display,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Built-in type names
    #[token("int")]
    IntType,
    #[token("float")]
    FloatType,
    #[token("string")]
    StringType,
    #[token("boolean")]
    BooleanType,
    #[token("void")]
    VoidType,

    // Operators
    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("++")]
    Increment,
    #[token("--")]
    Decrement,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    NotEqual,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("<=")]
    LessEq,
    #[token(">=")]
    GreaterEq,
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("?")]
    Question,

    // Delimiters
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // Literals and identifiers
    #[regex("[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,
    #[regex("[0-9]+")]
    Int,
    #[regex(r"[0-9]+\.[0-9]+")]
    Float,
    #[regex(r#""[^"]*""#)]
    #[regex(r"'[^']*'")]
    String,
}

/// The kind of a token handed to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Var,
    Const,
    Fn,
    Return,
    If,
    Else,
    For,
    While,
    Do,
    Display,
    True,
    False,

    IntType,
    FloatType,
    StringType,
    BooleanType,
    VoidType,

    Assign,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Bang,
    Increment,
    Decrement,
    EqualEqual,
    NotEqual,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    And,
    Or,
    Question,

    Colon,
    Semicolon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,

    Identifier,
    Int,
    Float,
    String,

    Illegal,
    Eof,
}

impl TokenKind {
    /// Whether this kind names one of the built-in types.
    pub fn is_type_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::IntType
                | TokenKind::FloatType
                | TokenKind::StringType
                | TokenKind::BooleanType
                | TokenKind::VoidType
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            TokenKind::Var => "var",
            TokenKind::Const => "const",
            TokenKind::Fn => "fn",
            TokenKind::Return => "return",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::Display => "display",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::IntType => "int",
            TokenKind::FloatType => "float",
            TokenKind::StringType => "string",
            TokenKind::BooleanType => "boolean",
            TokenKind::VoidType => "void",
            TokenKind::Assign => "=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Asterisk => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Bang => "!",
            TokenKind::Increment => "++",
            TokenKind::Decrement => "--",
            TokenKind::EqualEqual => "==",
            TokenKind::NotEqual => "!=",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::LessEq => "<=",
            TokenKind::GreaterEq => ">=",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Int => "INT",
            TokenKind::Float => "FLOAT",
            TokenKind::String => "STRING",
            TokenKind::Illegal => "ILLEGAL",
            TokenKind::Eof => "EOF",
        };
        write!(f, "{}", text)
    }
}

/// A token with the text it was read from and its 1-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind,
            literal: literal.into(),
            line,
            column,
        }
    }

    /// A token that did not come from source text, positioned at `origin`.
    pub fn synthetic(kind: TokenKind, literal: impl Into<String>, origin: &Token) -> Self {
        Self::new(kind, literal, origin.line, origin.column)
    }
}

/// Anything the parser can pull tokens from.
///
/// Once the input is exhausted the source keeps returning an [`TokenKind::Eof`] token.
pub trait TokenSource {
    fn next_token(&mut self) -> Token;
}

pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, RawToken>,
    line: u32,
    line_start: usize,
    eof_emitted: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: RawToken::lexer(source),
            line: 1,
            line_start: 0,
            eof_emitted: false,
        }
    }

    /// Lex the whole input, including the trailing EOF token.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    fn column_at(&self, offset: usize) -> u32 {
        self.source[self.line_start..offset].chars().count() as u32 + 1
    }

    fn skip_lines(&mut self, text: &str, start: usize) {
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                self.line += 1;
                self.line_start = start + i + 1;
            }
        }
    }

    fn eof(&self) -> Token {
        Token::new(
            TokenKind::Eof,
            "",
            self.line,
            self.column_at(self.source.len()),
        )
    }
}

impl TokenSource for Lexer<'_> {
    fn next_token(&mut self) -> Token {
        loop {
            let Some(result) = self.inner.next() else {
                return self.eof();
            };
            let span = self.inner.span();
            let slice = self.inner.slice();

            let raw = match result {
                Ok(RawToken::Newline) => {
                    self.line += 1;
                    self.line_start = span.end;
                    continue;
                }
                Ok(RawToken::LineComment) => continue,
                Ok(RawToken::BlockComment) => {
                    self.skip_lines(slice, span.start);
                    continue;
                }
                Ok(raw) => raw,
                Err(()) => {
                    return Token::new(
                        TokenKind::Illegal,
                        slice,
                        self.line,
                        self.column_at(span.start),
                    );
                }
            };

            let (line, column) = (self.line, self.column_at(span.start));
            let literal = match raw {
                // Drop the surrounding quotes; strings may span lines
                RawToken::String => {
                    self.skip_lines(slice, span.start);
                    &slice[1..slice.len() - 1]
                }
                _ => slice,
            };
            return Token::new(convert_token(raw), literal, line, column);
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof_emitted {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.eof_emitted = true;
        }
        Some(token)
    }
}

fn convert_token(raw: RawToken) -> TokenKind {
    match raw {
        RawToken::Var => TokenKind::Var,
        RawToken::Const => TokenKind::Const,
        RawToken::Fn => TokenKind::Fn,
        RawToken::Return => TokenKind::Return,
        RawToken::If => TokenKind::If,
        RawToken::Else => TokenKind::Else,
        RawToken::For => TokenKind::For,
        RawToken::While => TokenKind::While,
        RawToken::Do => TokenKind::Do,
        RawToken::Display => TokenKind::Display,
        RawToken::True => TokenKind::True,
        RawToken::False => TokenKind::False,
        RawToken::IntType => TokenKind::IntType,
        RawToken::FloatType => TokenKind::FloatType,
        RawToken::StringType => TokenKind::StringType,
        RawToken::BooleanType => TokenKind::BooleanType,
        RawToken::VoidType => TokenKind::VoidType,
        RawToken::Assign => TokenKind::Assign,
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Asterisk => TokenKind::Asterisk,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,
        RawToken::Bang => TokenKind::Bang,
        RawToken::Increment => TokenKind::Increment,
        RawToken::Decrement => TokenKind::Decrement,
        RawToken::EqualEqual => TokenKind::EqualEqual,
        RawToken::NotEqual => TokenKind::NotEqual,
        RawToken::Less => TokenKind::Less,
        RawToken::Greater => TokenKind::Greater,
        RawToken::LessEq => TokenKind::LessEq,
        RawToken::GreaterEq => TokenKind::GreaterEq,
        RawToken::And => TokenKind::And,
        RawToken::Or => TokenKind::Or,
        RawToken::Question => TokenKind::Question,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Semicolon => TokenKind::Semicolon,
        RawToken::Comma => TokenKind::Comma,
        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::Identifier => TokenKind::Identifier,
        RawToken::Int => TokenKind::Int,
        RawToken::Float => TokenKind::Float,
        RawToken::String => TokenKind::String,
        // Trivia never reaches conversion
        RawToken::LineComment | RawToken::BlockComment | RawToken::Newline => TokenKind::Illegal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_single_character_operators() {
        let tokens = Lexer::tokenize("= : ; ( ) , + - * / % < > !");
        let expected = [
            (TokenKind::Assign, "=", 1),
            (TokenKind::Colon, ":", 3),
            (TokenKind::Semicolon, ";", 5),
            (TokenKind::LParen, "(", 7),
            (TokenKind::RParen, ")", 9),
            (TokenKind::Comma, ",", 11),
            (TokenKind::Plus, "+", 13),
            (TokenKind::Minus, "-", 15),
            (TokenKind::Asterisk, "*", 17),
            (TokenKind::Slash, "/", 19),
            (TokenKind::Percent, "%", 21),
            (TokenKind::Less, "<", 23),
            (TokenKind::Greater, ">", 25),
            (TokenKind::Bang, "!", 27),
        ];

        assert_eq!(tokens.len(), expected.len() + 1);
        for (token, (kind, literal, column)) in tokens.iter().zip(expected) {
            assert_eq!(token.kind, kind);
            assert_eq!(token.literal, literal);
            assert_eq!(token.line, 1);
            assert_eq!(token.column, column);
        }
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn test_keywords_and_types() {
        assert_eq!(
            kinds("var const fn return if else for while do display true false myVar"),
            vec![
                TokenKind::Var,
                TokenKind::Const,
                TokenKind::Fn,
                TokenKind::Return,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::For,
                TokenKind::While,
                TokenKind::Do,
                TokenKind::Display,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("int float string boolean void integer"),
            vec![
                TokenKind::IntType,
                TokenKind::FloatType,
                TokenKind::StringType,
                TokenKind::BooleanType,
                TokenKind::VoidType,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_two_character_operators() {
        assert_eq!(
            kinds("== != <= >= ++ -- && ||"),
            vec![
                TokenKind::EqualEqual,
                TokenKind::NotEqual,
                TokenKind::LessEq,
                TokenKind::GreaterEq,
                TokenKind::Increment,
                TokenKind::Decrement,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_number_and_string_literals() {
        let tokens = Lexer::tokenize(r#"123 3.14 "hello world" 'rubric lang'"#);
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[0].literal, "123");
        assert_eq!(tokens[1].kind, TokenKind::Float);
        assert_eq!(tokens[1].literal, "3.14");
        assert_eq!(tokens[2].kind, TokenKind::String);
        assert_eq!(tokens[2].literal, "hello world");
        assert_eq!(tokens[2].column, 10);
        assert_eq!(tokens[3].kind, TokenKind::String);
        assert_eq!(tokens[3].literal, "rubric lang");
    }

    #[test]
    fn test_comments_are_skipped_and_lines_tracked() {
        let input = "// line comment\nvar a=1;\n/* block\ncomment */\nvar b=2;";
        let tokens = Lexer::tokenize(input);
        let vars: Vec<&Token> = tokens.iter().filter(|t| t.kind == TokenKind::Var).collect();

        assert_eq!(tokens.len(), 11);
        assert_eq!(vars[0].line, 2);
        assert_eq!(vars[1].line, 5);
        assert_eq!(vars[1].column, 1);
    }

    #[test]
    fn test_multiline_string_advances_line() {
        let tokens = Lexer::tokenize("var s = \"first\nsecond\";\nvar t = 1;");

        assert_eq!(tokens[3].kind, TokenKind::String);
        assert_eq!(tokens[3].literal, "first\nsecond");
        assert_eq!(tokens[3].line, 1);
        assert_eq!(tokens[3].column, 9);
        assert_eq!(tokens[5].kind, TokenKind::Var);
        assert_eq!(tokens[5].line, 3);
        assert_eq!(tokens[5].column, 1);
    }

    #[test]
    fn test_illegal_characters() {
        let tokens = Lexer::tokenize("@ $");
        assert_eq!(tokens[0].kind, TokenKind::Illegal);
        assert_eq!(tokens[0].literal, "@");
        assert_eq!(tokens[1].kind, TokenKind::Illegal);
        assert_eq!(tokens[1].column, 3);
    }

    #[test]
    fn test_eof_is_repeated() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }
}
