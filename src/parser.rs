use std::collections::HashMap;

use tracing::debug;

use crate::ast::*;
use crate::error::{Error, Result};
use crate::tokenizer::{Token, Tokenizer};
use crate::{Column, CompareOp, Condition, DataType, Value};

/// Parses one SQL statement. Returns `None` on any syntax error; use
/// [Parser::parse_sql] to get the reason.
pub fn parse(sql: &str) -> Option<Query> {
    match Parser::parse_sql(sql) {
        Ok(query) => Some(query),
        Err(e) => {
            debug!(sql, error = %e, "statement rejected by parser");
            None
        }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Tokenizes and parses `sql` in one go.
    pub fn parse_sql(sql: &str) -> Result<Query> {
        let tokens = Tokenizer::new(sql).tokenize()?;
        Parser::new(tokens).parse()
    }

    pub fn parse(&mut self) -> Result<Query> {
        let query = match self.current_token() {
            Token::Select => self.parse_select(),
            Token::Insert => self.parse_insert(),
            Token::Update => self.parse_update(),
            Token::Delete => self.parse_delete(),
            Token::Create => self.parse_create_table(),
            Token::Drop => self.parse_drop_table(),
            _ => Err(Error::Syntax(format!(
                "Unexpected token: {:?}",
                self.current_token()
            ))),
        }?;

        // semicolon is optionnal in SQL so skip it
        if matches!(self.current_token(), Token::Semicolon) {
            self.advance();
        }

        // Check we are at the end of the statement
        if !self.is_at_end() {
            return Err(Error::Syntax(format!(
                "Unexpected token after statement: {:?}",
                self.current_token()
            )));
        }

        Ok(query)
    }

    //helpers
    fn current_token(&self) -> &Token {
        // the tokenizer always terminates the stream with Eof
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn peek_token(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.position + offset)
            .unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_token(), Token::Eof)
    }

    fn consume(&mut self, expected: Token) -> Result<()> {
        if *self.current_token() == expected {
            self.advance();
            Ok(())
        } else {
            Err(Error::Syntax(format!(
                "Expected {:?}, found {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    /// Advances past `expected` if it is the current token.
    fn eat(&mut self, expected: &Token) -> bool {
        if self.current_token() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume_ident(&mut self) -> Result<String> {
        match self.current_token() {
            Token::Ident(string) => {
                let string = string.clone();
                self.advance();
                Ok(string)
            }
            _ => Err(Error::Syntax(format!(
                "Expected identifier, found {:?}",
                self.current_token()
            ))),
        }
    }

    /// An identifier usable as a table or column name.
    fn consume_name(&mut self) -> Result<String> {
        let name = self.consume_ident()?;
        if !is_valid_identifier(&name) {
            return Err(Error::Syntax(format!("Invalid identifier: {name}")));
        }
        Ok(name)
    }

    /// A column name. Besides identifiers, keywords such as `key` or `desc`
    /// are accepted here and read back in lowercase.
    fn consume_column_name(&mut self) -> Result<String> {
        if let Some(word) = self.current_token().soft_keyword_name() {
            self.advance();
            return Ok(word.to_string());
        }
        self.consume_ident()
    }

    /// `column` or `qualifier.column`, returned as written.
    fn consume_qualified_name(&mut self) -> Result<String> {
        let (qualifier, column) = self.consume_column_ref()?;
        Ok(match qualifier {
            Some(q) => format!("{q}.{column}"),
            None => column,
        })
    }

    fn consume_column_ref(&mut self) -> Result<(Option<String>, String)> {
        let first = self.consume_column_name()?;
        if self.eat(&Token::Dot) {
            let column = self.consume_column_name()?;
            Ok((Some(first), column))
        } else {
            Ok((None, first))
        }
    }

    /// Table name with an optional alias: `users` or `users u`.
    fn consume_table_ref(&mut self) -> Result<(String, Option<String>)> {
        let table = self.consume_name()?;
        let alias = match self.current_token() {
            Token::Ident(_) => Some(self.consume_ident()?),
            _ => None,
        };
        Ok((table, alias))
    }

    fn parse_comma_list<T>(&mut self, mut item: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        let mut items = vec![item(self)?];
        while self.eat(&Token::Comma) {
            items.push(item(self)?);
        }
        Ok(items)
    }

    /// A literal value. The type is inferred from the literal's form: quoted
    /// text is `String`, numbers are `Integer` or `Float` depending on a
    /// decimal point, `TRUE`/`FALSE` are `Boolean`, bare words are `String`.
    fn parse_literal(&mut self) -> Result<Value> {
        let value = match self.current_token() {
            Token::String(s) => Value::new(DataType::String, s.clone()),
            Token::Number(n) if n.contains('.') => Value::new(DataType::Float, n.clone()),
            Token::Number(n) => Value::new(DataType::Integer, n.clone()),
            Token::True => Value::boolean(true),
            Token::False => Value::boolean(false),
            Token::Null => Value::null(DataType::Unknown),
            Token::Ident(word) => Value::new(DataType::String, word.clone()),
            other => {
                return Err(Error::Syntax(format!("Expected a value, found {other:?}")));
            }
        };
        self.advance();
        Ok(value)
    }

    // --- WHERE ---

    /// OR binds loosest, then AND. Both are right-nested:
    /// `a OR b AND c` is `a OR (b AND c)`.
    fn parse_condition(&mut self) -> Result<Condition> {
        let left = self.parse_and()?;
        if self.eat(&Token::Or) {
            let right = self.parse_condition()?;
            return Ok(Condition::or(left, right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Condition> {
        let left = self.parse_comparison()?;
        if self.eat(&Token::And) {
            let right = self.parse_and()?;
            return Ok(Condition::and(left, right));
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Condition> {
        let column = self.consume_qualified_name()?;
        let op = self
            .current_token()
            .comparison_symbol()
            .and_then(CompareOp::from_symbol)
            .ok_or_else(|| {
                Error::Syntax(format!(
                    "Expected comparison operator, found {:?}",
                    self.current_token()
                ))
            })?;
        self.advance();
        let value = self.parse_literal()?;
        Ok(Condition::leaf(column, op, value))
    }

    fn parse_optional_where(&mut self) -> Result<Condition> {
        if self.eat(&Token::Where) {
            self.parse_condition()
        } else {
            Ok(Condition::All)
        }
    }

    // --- SELECT ---

    fn parse_select(&mut self) -> Result<Query> {
        self.consume(Token::Select)?;
        let items = self.parse_comma_list(Self::parse_select_item)?;

        self.consume(Token::From)?;
        let (table, alias) = self.consume_table_ref()?;
        let mut aliases = HashMap::new();
        if let Some(alias) = &alias {
            aliases.insert(alias.clone(), table.clone());
        }

        let mut joins = Vec::new();
        while let Some(join) = self.parse_join()? {
            if let Some(alias) = &join.alias {
                aliases.insert(alias.clone(), join.table.clone());
            }
            joins.push(join);
        }

        let where_clause = self.parse_optional_where()?;

        let mut group_by = Vec::new();
        if self.eat(&Token::Group) {
            self.consume(Token::By)?;
            group_by = self.parse_comma_list(Self::consume_qualified_name)?;
        }

        let mut order_by = Vec::new();
        if self.eat(&Token::Order) {
            self.consume(Token::By)?;
            order_by = self.parse_comma_list(Self::parse_order_by_item)?;
        }

        Ok(Query::Select(Select {
            items,
            table,
            alias,
            aliases,
            joins,
            where_clause,
            group_by,
            order_by,
        }))
    }

    fn parse_select_item(&mut self) -> Result<SelectItem> {
        if self.eat(&Token::Star) {
            return Ok(SelectItem::Star);
        }
        if let Some(agg) = self.parse_aggregate()? {
            return Ok(SelectItem::Aggregate(agg));
        }
        if matches!(self.current_token(), Token::Ident(_))
            && matches!(self.peek_token(1), Token::Dot)
            && matches!(self.peek_token(2), Token::Star)
        {
            let qualifier = self.consume_ident()?;
            self.advance(); // .
            self.advance(); // *
            return Ok(SelectItem::QualifiedStar(qualifier));
        }
        Ok(SelectItem::Column(self.consume_qualified_name()?))
    }

    /// `NAME(column)` or `COUNT(*)`. Returns `None` without consuming anything
    /// when the current tokens are not a function call.
    fn parse_aggregate(&mut self) -> Result<Option<AggregateFunction>> {
        let Token::Ident(name) = self.current_token() else {
            return Ok(None);
        };
        if !matches!(self.peek_token(1), Token::LeftParen) {
            return Ok(None);
        }
        let name = name.clone();
        let function = AggregateKind::from_name(&name)
            .ok_or_else(|| Error::Syntax(format!("Unknown function: {name}")))?;
        self.advance();
        self.consume(Token::LeftParen)?;
        let column = if self.eat(&Token::Star) {
            "*".to_string()
        } else {
            self.consume_qualified_name()?
        };
        self.consume(Token::RightParen)?;

        Ok(Some(AggregateFunction {
            function,
            alias: format!("{name}({column})"),
            column,
        }))
    }

    /// `[INNER | LEFT [OUTER] | RIGHT [OUTER]] JOIN table [alias] ON a = b`
    fn parse_join(&mut self) -> Result<Option<JoinClause>> {
        let join_type = match self.current_token() {
            Token::Join => JoinType::Inner,
            Token::Inner => {
                self.advance();
                JoinType::Inner
            }
            Token::Left => {
                self.advance();
                self.eat(&Token::Outer);
                JoinType::Left
            }
            Token::Right => {
                self.advance();
                self.eat(&Token::Outer);
                JoinType::Right
            }
            _ => return Ok(None),
        };
        self.consume(Token::Join)?;

        let (table, alias) = self.consume_table_ref()?;
        self.consume(Token::On)?;
        let (left_qualifier, left_column) = self.consume_column_ref()?;
        self.consume(Token::Equal)?;
        let (right_qualifier, right_column) = self.consume_column_ref()?;

        Ok(Some(JoinClause {
            join_type,
            table,
            alias,
            left_column,
            right_column,
            left_qualifier,
            right_qualifier,
        }))
    }

    fn parse_order_by_item(&mut self) -> Result<OrderByClause> {
        let column = match self.parse_aggregate()? {
            Some(agg) => agg.alias,
            None => self.consume_qualified_name()?,
        };
        let direction = if self.eat(&Token::Desc) {
            SortDirection::Desc
        } else {
            self.eat(&Token::Asc);
            SortDirection::Asc
        };
        Ok(OrderByClause { column, direction })
    }

    // --- DML ---

    fn parse_insert(&mut self) -> Result<Query> {
        self.consume(Token::Insert)?;
        self.consume(Token::Into)?;
        let table = self.consume_name()?;

        let columns = if self.eat(&Token::LeftParen) {
            let names = self.parse_comma_list(Self::consume_column_name)?;
            self.consume(Token::RightParen)?;
            Some(names)
        } else {
            None
        };

        self.consume(Token::Values)?;
        self.consume(Token::LeftParen)?;
        let values = self.parse_comma_list(Self::parse_literal)?;
        self.consume(Token::RightParen)?;

        Ok(Query::InsertInto(InsertInto {
            table,
            columns,
            values,
        }))
    }

    fn parse_update(&mut self) -> Result<Query> {
        self.consume(Token::Update)?;
        let (table, alias) = self.consume_table_ref()?;
        self.consume(Token::Set)?;
        let assignments = self.parse_comma_list(|p| {
            let column = p.consume_qualified_name()?;
            p.consume(Token::Equal)?;
            let value = p.parse_literal()?;
            Ok((column, value))
        })?;
        let where_clause = self.parse_optional_where()?;

        Ok(Query::Update(Update {
            table,
            alias,
            assignments,
            where_clause,
        }))
    }

    fn parse_delete(&mut self) -> Result<Query> {
        self.consume(Token::Delete)?;
        self.consume(Token::From)?;
        let (table, alias) = self.consume_table_ref()?;
        let where_clause = self.parse_optional_where()?;

        Ok(Query::Delete(Delete {
            table,
            alias,
            where_clause,
        }))
    }

    // --- DDL ---

    fn consume_data_type(&mut self) -> Result<DataType> {
        let name = self.consume_ident()?;
        let data_type = DataType::from_sql_name(&name)
            .ok_or_else(|| Error::Syntax(format!("Unknown data type: {name}")))?;

        // size suffix such as VARCHAR(255) or DECIMAL(10, 2) is accepted and ignored
        if self.eat(&Token::LeftParen) {
            self.parse_comma_list(|p| match p.current_token() {
                Token::Number(_) => {
                    p.advance();
                    Ok(())
                }
                other => Err(Error::Syntax(format!("Expected type size, found {other:?}"))),
            })?;
            self.consume(Token::RightParen)?;
        }
        Ok(data_type)
    }

    fn parse_column_def(&mut self) -> Result<Column> {
        let name = self.consume_column_name()?;
        if !is_valid_identifier(&name) {
            return Err(Error::Syntax(format!("Invalid identifier: {name}")));
        }
        let data_type = self.consume_data_type()?;
        let mut column = Column::new(name, data_type);

        loop {
            match self.current_token() {
                Token::Primary => {
                    self.advance();
                    self.consume(Token::Key)?;
                    column = column.primary_key();
                }
                Token::Unique => {
                    self.advance();
                    column = column.unique();
                }
                Token::References => {
                    self.advance();
                    let table = self.consume_name()?;
                    self.consume(Token::LeftParen)?;
                    let foreign_column = self.consume_column_name()?;
                    self.consume(Token::RightParen)?;
                    column = column.references(table, foreign_column);
                }
                _ => break,
            }
        }
        Ok(column)
    }

    fn parse_create_table(&mut self) -> Result<Query> {
        self.consume(Token::Create)?; // advance if CREATE
        self.consume(Token::Table)?; // advance if TABLE
        let name = self.consume_name()?;
        self.consume(Token::LeftParen)?;
        let columns = self.parse_comma_list(Self::parse_column_def)?;
        self.consume(Token::RightParen)?;
        Ok(Query::CreateTable(CreateTable { name, columns }))
    }

    fn parse_drop_table(&mut self) -> Result<Query> {
        self.consume(Token::Drop)?;
        self.consume(Token::Table)?;
        let if_exists = if self.eat(&Token::If) {
            self.consume(Token::Exists)?;
            true
        } else {
            false
        };
        let names = self.parse_comma_list(Self::consume_name)?;
        Ok(Query::DropTable(DropTable { names, if_exists }))
    }
}

/// Starts with an ASCII letter or underscore, continues with ASCII
/// alphanumerics or underscores.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
