use super::ParseError;

/// Events pushed by the tokenizer, in document order.
#[derive(Debug, PartialEq)]
pub(crate) enum Event {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Key(String),
    StartMap,
    EndMap,
    StartArray,
    EndArray,
}

/// Receives tokenizer events. The tokenizer stops at the first error a handler returns.
pub(crate) trait Handler {
    fn handle(&mut self, event: Event) -> Result<(), ParseError>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Container {
    Map,
    Array,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
    Value,
    ValueOrClose,
    KeyOrClose,
    Key,
    Colon,
    CommaOrClose,
    Done,
}

/// Syntax-level scanner. It validates punctuation and lexes scalars; building the tree is left to
/// the [`Handler`].
pub(crate) struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    containers: Vec<Container>,
    state: State,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            containers: Vec::new(),
            state: State::Value,
        }
    }

    pub(crate) fn run(mut self, handler: &mut impl Handler) -> Result<(), ParseError> {
        loop {
            // Whitespace is only meaningful between tokens of an open container.
            if !self.containers.is_empty() {
                self.skip_whitespace();
            }

            let Some(byte) = self.peek() else {
                return match self.state {
                    State::Done => Ok(()),
                    _ => Err(ParseError::UnexpectedEnd),
                };
            };

            match self.state {
                State::Value => self.value(handler)?,
                State::ValueOrClose if byte == b']' => self.close(Container::Array, handler)?,
                State::ValueOrClose => self.value(handler)?,
                State::KeyOrClose if byte == b'}' => self.close(Container::Map, handler)?,
                State::KeyOrClose | State::Key if byte == b'"' => {
                    let key = self.string()?;
                    handler.handle(Event::Key(key))?;
                    self.state = State::Colon;
                }
                State::Colon if byte == b':' => {
                    self.pos += 1;
                    self.state = State::Value;
                }
                State::CommaOrClose => match (byte, self.containers.last().copied()) {
                    (b',', Some(Container::Map)) => {
                        self.pos += 1;
                        self.state = State::Key;
                    }
                    (b',', Some(Container::Array)) => {
                        self.pos += 1;
                        self.state = State::Value;
                    }
                    (b'}', Some(Container::Map)) => self.close(Container::Map, handler)?,
                    (b']', Some(Container::Array)) => self.close(Container::Array, handler)?,
                    _ => return Err(self.unexpected(byte)),
                },
                _ => return Err(self.unexpected(byte)),
            }
        }
    }

    fn value(&mut self, handler: &mut impl Handler) -> Result<(), ParseError> {
        let byte = self.peek().ok_or(ParseError::UnexpectedEnd)?;

        let event = match byte {
            b'{' => {
                self.pos += 1;
                self.containers.push(Container::Map);
                self.state = State::KeyOrClose;
                return handler.handle(Event::StartMap);
            }
            b'[' => {
                self.pos += 1;
                self.containers.push(Container::Array);
                self.state = State::ValueOrClose;
                return handler.handle(Event::StartArray);
            }
            b'"' => Event::String(self.string()?),
            b't' => self.literal("true", Event::Bool(true))?,
            b'f' => self.literal("false", Event::Bool(false))?,
            b'n' => self.literal("null", Event::Null)?,
            b'-' | b'0'..=b'9' => self.number()?,
            byte => return Err(self.unexpected(byte)),
        };

        handler.handle(event)?;
        self.after_value();
        Ok(())
    }

    fn close(&mut self, container: Container, handler: &mut impl Handler) -> Result<(), ParseError> {
        self.pos += 1;
        match self.containers.pop() {
            Some(open) if open == container => {}
            _ => return Err(ParseError::UnbalancedClose),
        }
        handler.handle(match container {
            Container::Map => Event::EndMap,
            Container::Array => Event::EndArray,
        })?;
        self.after_value();
        Ok(())
    }

    fn after_value(&mut self) {
        self.state = if self.containers.is_empty() {
            State::Done
        } else {
            State::CommaOrClose
        };
    }

    fn literal(&mut self, word: &str, event: Event) -> Result<Event, ParseError> {
        let rest = &self.src[self.pos..];
        if rest.starts_with(word) {
            self.pos += word.len();
            return Ok(event);
        }
        if word.starts_with(rest) {
            return Err(ParseError::UnexpectedEnd);
        }

        let offset = self.pos
            + rest
                .bytes()
                .zip(word.bytes())
                .take_while(|(a, b)| a == b)
                .count();
        Err(ParseError::UnexpectedByte {
            byte: self.src.as_bytes()[offset],
            offset,
        })
    }

    fn number(&mut self) -> Result<Event, ParseError> {
        let start = self.pos;
        let mut is_double = false;

        self.eat(b'-');

        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => self.digits(),
            _ => return Err(ParseError::InvalidNumber(start)),
        }

        if self.eat(b'.') {
            is_double = true;
            if !self.peek().is_some_and(|b| b.is_ascii_digit()) {
                return Err(ParseError::InvalidNumber(start));
            }
            self.digits();
        }

        if self.eat(b'e') || self.eat(b'E') {
            is_double = true;
            if !self.eat(b'+') {
                self.eat(b'-');
            }
            if !self.peek().is_some_and(|b| b.is_ascii_digit()) {
                return Err(ParseError::InvalidNumber(start));
            }
            self.digits();
        }

        let text = &self.src[start..self.pos];
        if is_double {
            text.parse::<f64>()
                .map(Event::Double)
                .map_err(|_| ParseError::InvalidNumber(start))
        } else {
            // The digits are already validated, so the only failure left is overflow.
            text.parse::<i64>()
                .map(Event::Integer)
                .map_err(|_| ParseError::NumberOutOfRange(start))
        }
    }

    fn string(&mut self) -> Result<String, ParseError> {
        // Skip the opening quote.
        self.pos += 1;
        let mut out = String::new();

        loop {
            let run = self.src.as_bytes()[self.pos..]
                .iter()
                .position(|&b| b == b'"' || b == b'\\' || b < 0x20)
                .ok_or(ParseError::UnexpectedEnd)?;
            out.push_str(&self.src[self.pos..self.pos + run]);
            self.pos += run;

            match self.src.as_bytes()[self.pos] {
                b'"' => {
                    self.pos += 1;
                    return Ok(out);
                }
                b'\\' => out.push(self.escape()?),
                byte => return Err(self.unexpected(byte)),
            }
        }
    }

    fn escape(&mut self) -> Result<char, ParseError> {
        let start = self.pos;
        // Skip the backslash.
        self.pos += 1;
        let byte = self.peek().ok_or(ParseError::UnexpectedEnd)?;
        self.pos += 1;

        let c = match byte {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{08}',
            b'f' => '\u{0c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let high = self.hex4(start)?;
                let code = match high {
                    0xD800..=0xDBFF => {
                        if !(self.eat(b'\\') && self.eat(b'u')) {
                            return Err(ParseError::InvalidEscape(start));
                        }
                        let low = self.hex4(start)?;
                        if !(0xDC00..=0xDFFF).contains(&low) {
                            return Err(ParseError::InvalidEscape(start));
                        }
                        0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                    }
                    0xDC00..=0xDFFF => return Err(ParseError::InvalidEscape(start)),
                    code => code,
                };
                char::from_u32(code).ok_or(ParseError::InvalidEscape(start))?
            }
            _ => return Err(ParseError::InvalidEscape(start)),
        };

        Ok(c)
    }

    fn hex4(&mut self, start: usize) -> Result<u32, ParseError> {
        let digits = self
            .src
            .get(self.pos..self.pos + 4)
            .ok_or(ParseError::UnexpectedEnd)?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseError::InvalidEscape(start));
        }
        self.pos += 4;
        u32::from_str_radix(digits, 16).map_err(|_| ParseError::InvalidEscape(start))
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn unexpected(&self, byte: u8) -> ParseError {
        ParseError::UnexpectedByte {
            byte,
            offset: self.pos,
        }
    }
}
