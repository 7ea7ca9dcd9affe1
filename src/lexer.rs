use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Lexical analyzer for Grishex source text.
///
/// Scans a full source string into tokens terminated by a single `Eof`
/// token. The lexer never fails: unknown characters become `Illegal`
/// tokens carrying the offending character, and the parser rejects them
/// on sight. Line and block comments are consumed as whitespace.
pub struct Lexer<'src> {
    src: &'src str,
    /// (byte offset, char) for every character in the source.
    chars: Vec<(u32, char)>,
    /// Index of the current character.
    pos: usize,
    /// Index of the next character to read.
    read_pos: usize,
    /// Current character; '\0' once the input is exhausted.
    ch: char,
    line: u32,
    column: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        let mut lexer = Self {
            src,
            chars: src.char_indices().map(|(i, c)| (i as u32, c)).collect(),
            pos: 0,
            read_pos: 0,
            ch: '\0',
            line: 1,
            column: 0,
        };
        lexer.read_char();
        lexer
    }

    /// Scan the whole input. The returned stream always ends with `Eof`.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Advance the cursor by one character, updating (line, column).
    ///
    /// The column counter is pre-incremented for the character being
    /// loaded and reset to 0 when that character is a newline, so the
    /// first character of every line lands on column 1.
    fn read_char(&mut self) {
        self.ch = self
            .chars
            .get(self.read_pos)
            .map(|&(_, c)| c)
            .unwrap_or('\0');
        self.pos = self.read_pos;
        self.read_pos += 1;
        self.column += 1;
        if self.ch == '\n' {
            self.line += 1;
            self.column = 0;
        }
    }

    fn peek_char(&self) -> char {
        self.chars
            .get(self.read_pos)
            .map(|&(_, c)| c)
            .unwrap_or('\0')
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Byte offset of the current character (source length at EOF).
    fn byte_offset(&self) -> u32 {
        self.chars
            .get(self.pos)
            .map(|&(off, _)| off)
            .unwrap_or(self.src.len() as u32)
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.ch.is_whitespace() {
            self.read_char();
        }
    }

    /// Skip one `//` line comment or one `/* */` block comment.
    /// Unterminated block comments are consumed to EOF silently.
    fn skip_comment(&mut self) {
        if self.ch == '/' && self.peek_char() == '/' {
            while self.ch != '\n' && !self.is_at_end() {
                self.read_char();
            }
        } else if self.ch == '/' && self.peek_char() == '*' {
            self.read_char(); // consume '/'
            self.read_char(); // consume '*'
            while !(self.ch == '*' && self.peek_char() == '/') {
                if self.is_at_end() {
                    return;
                }
                self.read_char();
            }
            self.read_char(); // consume '*'
            self.read_char(); // consume '/'
        }
    }

    /// Read an identifier or keyword lexeme: a leading letter or `_`
    /// followed by letters, digits, or `_`.
    fn read_identifier(&mut self) -> String {
        let start = self.pos;
        while self.ch.is_ascii_alphanumeric() || self.ch == '_' {
            self.read_char();
        }
        self.chars[start..self.pos].iter().map(|&(_, c)| c).collect()
    }

    /// Read an integer or float lexeme. A dot only continues the number
    /// when a digit follows it, so `a.0` and range-style `1..` stay
    /// separate tokens.
    fn read_number(&mut self) -> (String, bool) {
        let start = self.pos;
        let mut is_float = false;
        while self.ch.is_ascii_digit() {
            self.read_char();
        }
        if self.ch == '.' && self.peek_char().is_ascii_digit() {
            is_float = true;
            self.read_char(); // consume '.'
            while self.ch.is_ascii_digit() {
                self.read_char();
            }
        }
        let text = self.chars[start..self.pos].iter().map(|&(_, c)| c).collect();
        (text, is_float)
    }

    /// Read a string literal's interior. Escape prefixes (`\"`, `\\`,
    /// `\n`, `\t`, `\r`) are scanned through without interpretation; an
    /// unterminated string yields the partial content without error.
    fn read_string(&mut self) -> String {
        self.read_char(); // consume opening quote
        let start = self.pos;
        while self.ch != '"' && !self.is_at_end() {
            if self.ch == '\\' && matches!(self.peek_char(), '"' | '\\' | 'n' | 't' | 'r') {
                self.read_char(); // consume the backslash
            }
            self.read_char();
        }
        let interior: String = self.chars[start..self.pos].iter().map(|&(_, c)| c).collect();
        if !self.is_at_end() {
            self.read_char(); // consume closing quote
        }
        interior
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        while self.ch == '/' && matches!(self.peek_char(), '/' | '*') {
            self.skip_comment();
            self.skip_whitespace();
        }

        let line = self.line;
        let column = self.column;
        let start = self.byte_offset();

        if self.is_at_end() {
            return Token::new(TokenKind::Eof, "", line, column, Span::new(start, start));
        }

        macro_rules! simple {
            ($kind:expr, $text:expr) => {{
                self.read_char();
                Token::new($kind, $text, line, column, Span::new(start, self.byte_offset()))
            }};
        }
        macro_rules! two_char {
            ($two_kind:expr, $two_text:expr) => {{
                self.read_char();
                self.read_char();
                Token::new(
                    $two_kind,
                    $two_text,
                    line,
                    column,
                    Span::new(start, self.byte_offset()),
                )
            }};
        }

        match self.ch {
            '=' if self.peek_char() == '=' => two_char!(TokenKind::Eq, "=="),
            '=' => simple!(TokenKind::Assign, "="),
            '+' => simple!(TokenKind::Plus, "+"),
            '-' if self.peek_char() == '>' => two_char!(TokenKind::Arrow, "->"),
            '-' => simple!(TokenKind::Minus, "-"),
            '!' if self.peek_char() == '=' => two_char!(TokenKind::Neq, "!="),
            '!' => simple!(TokenKind::Bang, "!"),
            '*' => simple!(TokenKind::Asterisk, "*"),
            '/' => simple!(TokenKind::Slash, "/"),
            '%' => simple!(TokenKind::Percent, "%"),
            '<' if self.peek_char() == '=' => two_char!(TokenKind::Lte, "<="),
            '<' => simple!(TokenKind::Lt, "<"),
            '>' if self.peek_char() == '=' => two_char!(TokenKind::Gte, ">="),
            '>' => simple!(TokenKind::Gt, ">"),
            '&' if self.peek_char() == '&' => two_char!(TokenKind::AndAnd, "&&"),
            '|' if self.peek_char() == '|' => two_char!(TokenKind::OrOr, "||"),
            ';' => simple!(TokenKind::Semicolon, ";"),
            ':' => simple!(TokenKind::Colon, ":"),
            ',' => simple!(TokenKind::Comma, ","),
            '(' => simple!(TokenKind::LParen, "("),
            ')' => simple!(TokenKind::RParen, ")"),
            '{' => simple!(TokenKind::LBrace, "{"),
            '}' => simple!(TokenKind::RBrace, "}"),
            '[' => simple!(TokenKind::LBracket, "["),
            ']' => simple!(TokenKind::RBracket, "]"),
            '.' => simple!(TokenKind::Dot, "."),
            '"' => {
                let interior = self.read_string();
                Token::new(
                    TokenKind::Str,
                    interior,
                    line,
                    column,
                    Span::new(start, self.byte_offset()),
                )
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let text = self.read_identifier();
                let kind = TokenKind::from_keyword(&text).unwrap_or(TokenKind::Ident);
                Token::new(kind, text, line, column, Span::new(start, self.byte_offset()))
            }
            c if c.is_ascii_digit() => {
                let (text, is_float) = self.read_number();
                let kind = if is_float { TokenKind::Float } else { TokenKind::Int };
                Token::new(kind, text, line, column, Span::new(start, self.byte_offset()))
            }
            c => {
                self.read_char();
                Token::new(
                    TokenKind::Illegal,
                    c.to_string(),
                    line,
                    column,
                    Span::new(start, self.byte_offset()),
                )
            }
        }
    }
}

/// Scan a full source string into a token stream ending with `Eof`.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}
