use crate::error::{Error, Result};

/// Represents the smallest meaningful units (atoms) of the SQL language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // --- SQL Keywords ---
    Create,
    Table,
    Drop,
    If,
    Exists,
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    Update,
    Set,
    Delete,
    Join,
    Inner,
    Left,
    Right,
    Outer,
    On,
    And,
    Or,
    Group,
    Order,
    By,
    Asc,
    Desc,
    Primary,
    Key,
    Unique,
    References,

    // --- Identifiers & Literals ---
    /// A name representing a table, a column, an alias or a type (e.g. `users`, `INT`).
    Ident(String),
    /// A numeric literal as written (e.g. `42`, `-3.5`).
    Number(String),
    /// A string literal, defined between single or double quotes (e.g. `'Alice'`).
    String(String),
    /// The boolean literal `TRUE`.
    True,
    /// The boolean literal `FALSE`.
    False,
    /// The `NULL` literal.
    Null,

    // --- Symbols ---
    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// Comma `,`
    Comma,
    /// Semicolon `;`
    Semicolon,
    /// Wildcard symbol `*`
    Star,
    /// Qualifier separator `.`
    Dot,
    /// Equal to `=`
    Equal,
    /// Not equal, `!=` or `<>`
    NotEqual,
    /// Greater than `>`
    Greater,
    /// Lower than `<`
    Lower,
    /// `>=`
    GreaterEqual,
    /// `<=`
    LowerEqual,

    // --- Special ---
    /// Represents the End Of File/Input.
    Eof,
}

impl Token {
    /// The operator symbol for comparison tokens.
    pub fn comparison_symbol(&self) -> Option<&'static str> {
        match self {
            Token::Equal => Some("="),
            Token::NotEqual => Some("!="),
            Token::Greater => Some(">"),
            Token::Lower => Some("<"),
            Token::GreaterEqual => Some(">="),
            Token::LowerEqual => Some("<="),
            _ => None,
        }
    }

    /// Keywords that never start a clause where a column name is expected, so
    /// they can double as column names. Returned in lowercase.
    pub fn soft_keyword_name(&self) -> Option<&'static str> {
        match self {
            Token::Key => Some("key"),
            Token::Left => Some("left"),
            Token::Right => Some("right"),
            Token::Outer => Some("outer"),
            Token::Set => Some("set"),
            Token::Asc => Some("asc"),
            Token::Desc => Some("desc"),
            Token::If => Some("if"),
            Token::Exists => Some("exists"),
            Token::Values => Some("values"),
            Token::Unique => Some("unique"),
            Token::Primary => Some("primary"),
            Token::References => Some("references"),
            _ => None,
        }
    }
}

/// A lexical scanner (lexer) that converts a raw SQL string into a sequence of [Token]s.
pub struct Tokenizer {
    /// The input string stored as a vector of characters for easy iteration.
    input: Vec<char>,
    /// The current position in the character vector.
    position: usize,
}

impl Tokenizer {
    /// Creates a new Tokenizer for the given input string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Processes the entire input and returns a vector of tokens.
    ///
    /// # Errors
    /// Returns a syntax error if an invalid character is encountered or if a
    /// string literal is not terminated.
    ///
    /// # Example
    /// ```
    /// # use flatdb::tokenizer::{Tokenizer, Token};
    /// let mut t = Tokenizer::new("SELECT *");
    /// let tokens = t.tokenize().unwrap();
    /// assert_eq!(tokens[0], Token::Select);
    /// ```
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            self.skip_whitespace();

            if self.is_at_end() {
                break;
            }

            let token = self.next_token()?;
            tokens.push(token);
        }

        tokens.push(Token::Eof);
        Ok(tokens)
    }

    /// Identifies the next token based on the character at the current position.
    fn next_token(&mut self) -> Result<Token> {
        let ch = self.current_char();

        match ch {
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            ',' => self.single(Token::Comma),
            ';' => self.single(Token::Semicolon),
            '*' => self.single(Token::Star),
            '.' => self.single(Token::Dot),
            '=' => self.single(Token::Equal),
            '!' => {
                self.advance();
                if self.peek_is('=') {
                    self.single(Token::NotEqual)
                } else {
                    Err(Error::Syntax("expected '=' after '!'".into()))
                }
            }
            '<' => {
                self.advance();
                if self.peek_is('=') {
                    self.single(Token::LowerEqual)
                } else if self.peek_is('>') {
                    self.single(Token::NotEqual)
                } else {
                    Ok(Token::Lower)
                }
            }
            '>' => {
                self.advance();
                if self.peek_is('=') {
                    self.single(Token::GreaterEqual)
                } else {
                    Ok(Token::Greater)
                }
            }
            '-' if self.next_is_digit() => self.read_number(),
            c if c.is_alphabetic() || c == '_' => Ok(self.read_identifier()),
            c if c.is_ascii_digit() => self.read_number(),
            '\'' | '"' => self.read_string(ch),
            _ => Err(Error::Syntax(format!("character {ch:?} is not supported"))),
        }
    }

    // --- Navigation Helpers ---

    /// Returns the character at the current position.
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    /// Moves the cursor forward by one character.
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Checks if the cursor has reached the end of the input.
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn peek_is(&self, expected: char) -> bool {
        !self.is_at_end() && self.current_char() == expected
    }

    fn next_is_digit(&self) -> bool {
        self.input
            .get(self.position + 1)
            .is_some_and(|c| c.is_ascii_digit())
    }

    /// Consumes one character and returns `token`.
    fn single(&mut self, token: Token) -> Result<Token> {
        self.advance();
        Ok(token)
    }

    /// Consumes any whitespace characters (spaces, tabs, newlines).
    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    // --- Extraction Logic ---

    /// Reads a sequence of alphanumeric characters and determines if it's
    /// a reserved SQL keyword or a user-defined identifier.
    ///
    /// Keywords are matched case-insensitively; identifiers keep their case.
    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while !self.is_at_end()
            && (self.current_char().is_alphanumeric() || self.current_char() == '_')
        {
            ident.push(self.current_char());
            self.advance();
        }

        match ident.to_uppercase().as_str() {
            "CREATE" => Token::Create,
            "TABLE" => Token::Table,
            "DROP" => Token::Drop,
            "IF" => Token::If,
            "EXISTS" => Token::Exists,
            "INSERT" => Token::Insert,
            "INTO" => Token::Into,
            "VALUES" => Token::Values,
            "SELECT" => Token::Select,
            "FROM" => Token::From,
            "WHERE" => Token::Where,
            "UPDATE" => Token::Update,
            "SET" => Token::Set,
            "DELETE" => Token::Delete,
            "JOIN" => Token::Join,
            "INNER" => Token::Inner,
            "LEFT" => Token::Left,
            "RIGHT" => Token::Right,
            "OUTER" => Token::Outer,
            "ON" => Token::On,
            "AND" => Token::And,
            "OR" => Token::Or,
            "GROUP" => Token::Group,
            "ORDER" => Token::Order,
            "BY" => Token::By,
            "ASC" => Token::Asc,
            "DESC" => Token::Desc,
            "PRIMARY" => Token::Primary,
            "KEY" => Token::Key,
            "UNIQUE" => Token::Unique,
            "REFERENCES" => Token::References,
            "TRUE" => Token::True,
            "FALSE" => Token::False,
            "NULL" => Token::Null,
            _ => Token::Ident(ident),
        }
    }

    /// Reads a numeric literal, keeping its text. At most one `.` is allowed.
    fn read_number(&mut self) -> Result<Token> {
        let mut number = String::new();
        let mut has_dot = false;

        if self.current_char() == '-' {
            number.push('-');
            self.advance();
        }

        while !self.is_at_end()
            && (self.current_char().is_ascii_digit() || (self.current_char() == '.' && !has_dot))
        {
            if self.current_char() == '.' {
                has_dot = true;
            }
            number.push(self.current_char());
            self.advance();
        }

        if !self.is_at_end() && self.current_char() == '.' {
            return Err(Error::Syntax(
                "multiple dots are not allowed for a float".into(),
            ));
        }

        Ok(Token::Number(number))
    }

    /// Reads a string literal enclosed in `quote`.
    fn read_string(&mut self, quote: char) -> Result<Token> {
        self.advance(); // Skip the opening quote

        let mut string = String::new();
        while !self.is_at_end() && self.current_char() != quote {
            string.push(self.current_char());
            self.advance();
        }

        if self.is_at_end() {
            return Err(Error::Syntax("Unterminated string".into()));
        }

        // Skip the closing quote
        self.advance();

        Ok(Token::String(string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple() {
        let mut tokenizer = Tokenizer::new("CREATE TABLE users");
        let tokens = tokenizer.tokenize().unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Create,
                Token::Table,
                Token::Ident("users".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let tokens = Tokenizer::new("select From wHeRe").tokenize().unwrap();
        assert_eq!(tokens, vec![Token::Select, Token::From, Token::Where, Token::Eof]);
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        let tokens = Tokenizer::new("selected fromage").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("selected".into()),
                Token::Ident("fromage".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_qualified_names() {
        let tokens = Tokenizer::new("u.name, u.*").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("u".into()),
                Token::Dot,
                Token::Ident("name".into()),
                Token::Comma,
                Token::Ident("u".into()),
                Token::Dot,
                Token::Star,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_operators() {
        let tokens = Tokenizer::new("= != <> < > <= >=").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Equal,
                Token::NotEqual,
                Token::NotEqual,
                Token::Lower,
                Token::Greater,
                Token::LowerEqual,
                Token::GreaterEqual,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        let tokens = Tokenizer::new("42, -7, 3.50").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number("42".into()),
                Token::Comma,
                Token::Number("-7".into()),
                Token::Comma,
                Token::Number("3.50".into()),
                Token::Eof,
            ]
        );
        assert!(Tokenizer::new("1.2.3").tokenize().is_err());
    }

    #[test]
    fn test_tokenize_strings() {
        let tokens = Tokenizer::new("'Alice', \"Bob Dylan\", ''").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::String("Alice".into()),
                Token::Comma,
                Token::String("Bob Dylan".into()),
                Token::Comma,
                Token::String(String::new()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_keyword_inside_string_stays_literal() {
        let tokens = Tokenizer::new("'x WHERE y'").tokenize().unwrap();
        assert_eq!(tokens, vec![Token::String("x WHERE y".into()), Token::Eof]);
    }

    #[test]
    fn test_unterminated_string() {
        let mut tokenizer = Tokenizer::new("'hello");
        let result = tokenizer.tokenize();

        assert!(result.is_err());
    }

    #[test]
    fn test_unsupported_character() {
        assert!(Tokenizer::new("SELECT # FROM t").tokenize().is_err());
    }
}
