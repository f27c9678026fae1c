use super::{Expression, FunctionRegistry, Operator, VariableScope};
use crate::Error;

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
    Question,
    Colon,
}

const SYMBOLS: [&str; 15] = [
    "&&", "||", "<=", ">=", "==", "!=", "+", "-", "*", "/", "%", "^", "<", ">", "!",
];

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, Error> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        if c.is_ascii_digit() || (c == '.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit))
        {
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            // Trailing float suffix, e.g. `0.5f`.
            let text = &source[start..i];
            if i < bytes.len() && (bytes[i] == b'f' || bytes[i] == b'F') {
                i += 1;
            }
            let value = text
                .parse::<f64>()
                .map_err(|_| parse_error(source, start, format!("invalid number '{text}'")))?;
            tokens.push((start, Token::Number(value)));
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.')
            {
                i += 1;
            }
            let ident = source[start..i].to_ascii_lowercase();
            tokens.push((start, Token::Ident(ident)));
            continue;
        }
        let single = match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            '?' => Some(Token::Question),
            ':' => Some(Token::Colon),
            _ => None,
        };
        if let Some(token) = single {
            tokens.push((start, token));
            i += 1;
            continue;
        }
        let rest = &source[i..];
        let Some(symbol) = SYMBOLS.iter().find(|s| rest.starts_with(**s)) else {
            return Err(parse_error(source, i, format!("unexpected character '{c}'")));
        };
        tokens.push((start, Token::Op(*symbol)));
        i += symbol.len();
    }
    Ok(tokens)
}

fn parse_error(source: &str, position: usize, message: String) -> Error {
    Error::ExpressionParse {
        source_text: source.to_string(),
        position,
        message,
    }
}

pub(super) fn parse(
    source: &str,
    scope: &mut VariableScope,
    registry: &FunctionRegistry,
) -> Result<Expression, Error> {
    // Molang allows a trailing statement terminator.
    let tokens = tokenize(source.trim_end().trim_end_matches(';'))?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        scope,
        registry,
    };
    let expression = parser.ternary()?;
    if let Some((position, token)) = parser.tokens.get(parser.pos) {
        return Err(parse_error(
            source,
            *position,
            format!("unexpected trailing token {token:?}"),
        ));
    }
    Ok(expression)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<(usize, Token)>,
    pos: usize,
    scope: &'a mut VariableScope,
    registry: &'a FunctionRegistry,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(p, _)| *p)
            .unwrap_or(self.source.len())
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> Result<(), Error> {
        if self.eat(&token) {
            return Ok(());
        }
        Err(parse_error(
            self.source,
            self.position(),
            format!("expected {token:?}"),
        ))
    }

    fn eat_op(&mut self, ops: &[(&'static str, Operator)]) -> Option<Operator> {
        let Some(Token::Op(symbol)) = self.peek() else {
            return None;
        };
        let op = ops.iter().find(|(s, _)| s == symbol).map(|(_, op)| *op)?;
        self.pos += 1;
        Some(op)
    }

    fn ternary(&mut self) -> Result<Expression, Error> {
        let condition = self.binary(0)?;
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }
        let if_true = self.ternary()?;
        self.expect(Token::Colon)?;
        let if_false = self.ternary()?;
        Ok(Expression::ternary(condition, if_true, if_false))
    }

    /// Precedence climbing over the binary operator levels, lowest first.
    fn binary(&mut self, level: usize) -> Result<Expression, Error> {
        const LEVELS: [&[(&str, Operator)]; 6] = [
            &[("||", Operator::Or)],
            &[("&&", Operator::And)],
            &[("==", Operator::Equal), ("!=", Operator::NotEqual)],
            &[
                ("<=", Operator::LessEqual),
                (">=", Operator::GreaterEqual),
                ("<", Operator::Less),
                (">", Operator::Greater),
            ],
            &[("+", Operator::Add), ("-", Operator::Sub)],
            &[("*", Operator::Mul), ("/", Operator::Div), ("%", Operator::Mod)],
        ];

        if level == LEVELS.len() {
            return self.power();
        }
        let mut left = self.binary(level + 1)?;
        while let Some(op) = self.eat_op(LEVELS[level]) {
            let right = self.binary(level + 1)?;
            left = Expression::binary(op, left, right);
        }
        Ok(left)
    }

    fn power(&mut self) -> Result<Expression, Error> {
        let base = self.unary()?;
        if self.eat_op(&[("^", Operator::Pow)]).is_some() {
            // Right associative.
            let exponent = self.power()?;
            return Ok(Expression::binary(Operator::Pow, base, exponent));
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<Expression, Error> {
        if self.eat(&Token::Op("-")) {
            let inner = self.unary()?;
            return Ok(match inner {
                Expression::Constant(value) => Expression::Constant(-value),
                other => Expression::Negate(Box::new(other)),
            });
        }
        if self.eat(&Token::Op("!")) {
            return Ok(Expression::Not(Box::new(self.unary()?)));
        }
        if self.eat(&Token::Op("+")) {
            return self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expression, Error> {
        let position = self.position();
        let Some(token) = self.peek().cloned() else {
            return Err(parse_error(
                self.source,
                position,
                "unexpected end of expression".to_string(),
            ));
        };
        self.pos += 1;
        match token {
            Token::Number(value) => Ok(Expression::Constant(value)),
            Token::LParen => {
                let inner = self.ternary()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) => {
                if self.eat(&Token::LParen) {
                    let args = self.arguments()?;
                    return Expression::function(self.registry, &name, args);
                }
                if name == "math.pi" {
                    return Ok(Expression::Constant(std::f64::consts::PI));
                }
                Ok(Expression::Variable(self.scope.get_or_create(&name)))
            }
            other => Err(parse_error(
                self.source,
                position,
                format!("unexpected token {other:?}"),
            )),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expression>, Error> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.ternary()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(Token::RParen)?;
            return Ok(args);
        }
    }
}
