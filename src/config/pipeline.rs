//! Pipeline definition syntax check.
//!
//! Accepts the sectioned format:
//!
//! ```text
//! input  { stdin { type => "stdin" } }
//! filter { mutate { add_tag => ["seen"] } }
//! output { stdout { codec => rubydebug } }
//! ```
//!
//! Only structure is checked (sections, plugin blocks, balanced brackets,
//! terminated strings). Plugin options are not interpreted.

use crate::config::loader::ConfigError;

/// Plugin names declared per section, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineDefinition {
    pub inputs: Vec<String>,
    pub filters: Vec<String>,
    pub outputs: Vec<String>,
}

impl PipelineDefinition {
    /// Parse configuration text. A pipeline needs at least one input and
    /// one output plugin.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let tokens = tokenize(text)?;
        let mut parser = Parser { tokens, pos: 0 };
        let mut def = PipelineDefinition::default();

        while let Some(tok) = parser.next() {
            let section = match &tok.kind {
                Kind::Word(w) if w == "input" => &mut def.inputs,
                Kind::Word(w) if w == "filter" => &mut def.filters,
                Kind::Word(w) if w == "output" => &mut def.outputs,
                other => return Err(parse_error(tok.line, format!("expected a section, found {other}"))),
            };
            parser.expect_open(tok.line)?;
            parser.plugins(section)?;
        }

        let last_line = text.lines().count().max(1);
        if def.inputs.is_empty() {
            return Err(parse_error(last_line, "pipeline declares no input plugin"));
        }
        if def.outputs.is_empty() {
            return Err(parse_error(last_line, "pipeline declares no output plugin"));
        }
        Ok(def)
    }

    pub fn plugin_count(&self) -> usize {
        self.inputs.len() + self.filters.len() + self.outputs.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Kind {
    Word(String),
    Str,
    Open(char),
    Close(char),
    Arrow,
    Comma,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Word(w) => write!(f, "`{}`", w),
            Kind::Str => f.write_str("a string"),
            Kind::Open(c) | Kind::Close(c) => write!(f, "`{}`", c),
            Kind::Arrow => f.write_str("`=>`"),
            Kind::Comma => f.write_str("`,`"),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: Kind,
    line: usize,
}

fn parse_error(line: usize, message: impl Into<String>) -> ConfigError {
    ConfigError::Parse {
        line,
        message: message.into(),
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, ConfigError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let kind = match c {
            '\n' => {
                line += 1;
                continue;
            }
            c if c.is_whitespace() => continue,
            '#' => {
                while chars.peek().is_some_and(|&n| n != '\n') {
                    chars.next();
                }
                continue;
            }
            '{' | '[' => Kind::Open(c),
            '}' | ']' => Kind::Close(c),
            ',' => Kind::Comma,
            '=' if chars.peek() == Some(&'>') => {
                chars.next();
                Kind::Arrow
            }
            '"' | '\'' => {
                let start = line;
                let mut closed = false;
                while let Some(n) = chars.next() {
                    match n {
                        '\\' => {
                            if chars.next() == Some('\n') {
                                line += 1;
                            }
                        }
                        '\n' => line += 1,
                        n if n == c => {
                            closed = true;
                            break;
                        }
                        _ => {}
                    }
                }
                if !closed {
                    return Err(parse_error(start, "unterminated string"));
                }
                Kind::Str
            }
            c if is_word_char(c) => {
                let mut word = c.to_string();
                while let Some(&n) = chars.peek() {
                    if !is_word_char(n) {
                        break;
                    }
                    word.push(n);
                    chars.next();
                }
                Kind::Word(word)
            }
            other => return Err(parse_error(line, format!("unexpected character `{other}`"))),
        };
        tokens.push(Token { kind, line });
    }
    Ok(tokens)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '@' | ':' | '/' | '%' | '+')
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect_open(&mut self, line: usize) -> Result<(), ConfigError> {
        match self.next() {
            Some(Token { kind: Kind::Open('{'), .. }) => Ok(()),
            Some(tok) => Err(parse_error(tok.line, format!("expected `{{`, found {}", tok.kind))),
            None => Err(parse_error(line, "expected `{` at end of input")),
        }
    }

    /// Plugin blocks of one section, up to and including its closing brace.
    fn plugins(&mut self, names: &mut Vec<String>) -> Result<(), ConfigError> {
        loop {
            let tok = self
                .next()
                .ok_or_else(|| parse_error(self.last_line(), "unclosed section"))?;
            match tok.kind {
                Kind::Close('}') => return Ok(()),
                Kind::Word(name) => {
                    self.expect_open(tok.line)?;
                    self.skip_block(tok.line)?;
                    names.push(name);
                }
                other => {
                    return Err(parse_error(tok.line, format!("expected a plugin name, found {other}")))
                }
            }
        }
    }

    /// Consume a plugin body whose `{` was already read.
    fn skip_block(&mut self, opened_at: usize) -> Result<(), ConfigError> {
        let mut stack = vec!['{'];
        while let Some(tok) = self.next() {
            match tok.kind {
                Kind::Open(c) => stack.push(c),
                Kind::Close(c) => {
                    let expected = if c == '}' { '{' } else { '[' };
                    if stack.pop() != Some(expected) {
                        return Err(parse_error(tok.line, format!("unbalanced `{c}`")));
                    }
                    if stack.is_empty() {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Err(parse_error(opened_at, "unclosed plugin block"))
    }

    fn last_line(&self) -> usize {
        self.tokens.last().map_or(1, |t| t.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::{DEFAULT_INPUT, DEFAULT_OUTPUT};

    #[test]
    fn test_parse_full_pipeline() {
        let text = r#"
            # ingest
            input { generator { lines => ["a", "b"] count => 3 } }
            filter {
              mutate { add_field => { "seen" => "yes" } }
              drop {}
            }
            output { stdout { codec => rubydebug } }
        "#;
        let def = PipelineDefinition::parse(text).unwrap();
        assert_eq!(def.inputs, vec!["generator"]);
        assert_eq!(def.filters, vec!["mutate", "drop"]);
        assert_eq!(def.outputs, vec!["stdout"]);
        assert_eq!(def.plugin_count(), 4);
    }

    #[test]
    fn test_default_sections_parse() {
        let text = format!("{}{}", DEFAULT_INPUT, DEFAULT_OUTPUT);
        let def = PipelineDefinition::parse(&text).unwrap();
        assert_eq!(def.inputs, vec!["stdin"]);
        assert_eq!(def.outputs, vec!["stdout"]);
    }

    #[test]
    fn test_unknown_section() {
        let err = PipelineDefinition::parse("inputs { stdin {} }").unwrap_err();
        assert!(err.to_string().contains("expected a section"));
    }

    #[test]
    fn test_unbalanced_and_unterminated() {
        let err = PipelineDefinition::parse("input { stdin { tags => [\"a\"} }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 1, .. }));

        let err = PipelineDefinition::parse("input {\n stdin { type => \"x }\n}").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 2, .. }));

        let err = PipelineDefinition::parse("input { stdin {").unwrap_err();
        assert!(err.to_string().contains("unclosed"));
    }

    #[test]
    fn test_requires_input_and_output() {
        let err = PipelineDefinition::parse("output { stdout {} }").unwrap_err();
        assert!(err.to_string().contains("no input"));
        let err = PipelineDefinition::parse("input { stdin {} }").unwrap_err();
        assert!(err.to_string().contains("no output"));
    }
}
