use std::sync::LazyLock;

use log::{debug, trace};
use regex::Regex;
use serde::Serialize;

use crate::block::*;
use crate::compiler::NO_VALUE;
use crate::error::Diagnostic;
use crate::value::Value;

static FUNCTION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*def\s+(\w+)\s*\((.*?)\)\s*:").unwrap());
static CONDITIONAL_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:if|elif)\s+(.+):").unwrap());
static LOOP_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^for\s+(\w+)\s+in\s+(.+):").unwrap());
/// A plain name, dotted attribute or subscript: what may sit left of `=`.
static ASSIGN_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][\w.]*(?:\[.*\])?$").unwrap());
static CALL_STATEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_][\w.]*)\((.*)\)$").unwrap());

/// Blocks recovered from source text, plus what the parser had to skip or guess.
#[derive(Debug, Clone, Serialize)]
pub struct ParseOutput {
    pub blocks: Vec<Block>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse indented Python source into blocks.
///
/// Lines that match no statement form are skipped. Every block gets a fresh id.
pub fn parse(source: &str) -> Vec<Block> {
    parse_with_diagnostics(source).blocks
}

/// Like [`parse`], also reporting skipped lines and malformed headers.
pub fn parse_with_diagnostics(source: &str) -> ParseOutput {
    let mut parser = Parser {
        lines: source.split('\n').map(Line::new).collect(),
        diagnostics: Vec::new(),
    };
    let (blocks, _) = parser.parse_block_list(0, None);
    ParseOutput {
        blocks,
        diagnostics: parser.diagnostics,
    }
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    /// Count of leading whitespace characters.
    indent: usize,
    /// The line with surrounding whitespace removed.
    text: &'a str,
}

impl<'a> Line<'a> {
    fn new(raw: &'a str) -> Self {
        Line {
            indent: raw.chars().take_while(|c| c.is_whitespace()).count(),
            text: raw.trim(),
        }
    }

    fn is_skippable(&self) -> bool {
        self.text.is_empty() || self.text.starts_with('#')
    }
}

struct Parser<'a> {
    lines: Vec<Line<'a>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    /// Parse statements from `start` until a line indented at or left of
    /// `parent_indent` (never, at top level).
    ///
    /// Returns the blocks and the index of the first line not consumed.
    fn parse_block_list(&mut self, start: usize, parent_indent: Option<usize>) -> (Vec<Block>, usize) {
        let mut blocks = Vec::new();
        let mut i = start;

        while i < self.lines.len() {
            let line = self.lines[i];
            if line.is_skippable() {
                i += 1;
                continue;
            }
            if parent_indent.is_some_and(|parent| line.indent <= parent) {
                break;
            }

            let text = line.text;
            if text.starts_with("def ") {
                let (block, next) = self.parse_function(i);
                blocks.push(block);
                i = next;
            } else if text.starts_with("if ") {
                let (block, next) = self.parse_conditional(i);
                blocks.push(Block::Conditional(block));
                i = next;
            } else if text.starts_with("for ") {
                let (block, next) = self.parse_loop(i);
                blocks.push(block);
                i = next;
            } else if text == "return" || text.starts_with("return ") {
                let value = text["return".len()..].trim();
                let value = if value.is_empty() { NO_VALUE } else { value };
                blocks.push(Block::ret(value));
                i += 1;
            } else if let Some(block) = parse_assignment(text).or_else(|| parse_call(text)) {
                blocks.push(block);
                i += 1;
            } else {
                debug!("line {}: skipping unrecognized statement `{}`", i + 1, text);
                self.diagnostics.push(Diagnostic::unrecognized(i, text));
                i += 1;
                continue;
            }
            trace!("parsed `{}`", text);
        }

        (blocks, i)
    }

    fn malformed(&mut self, index: usize, keyword: &str) {
        let text = self.lines[index].text;
        debug!("line {}: malformed `{}` header `{}`", index + 1, keyword, text);
        self.diagnostics
            .push(Diagnostic::malformed_header(index, keyword, text));
    }

    fn parse_function(&mut self, index: usize) -> (Block, usize) {
        let header = self.lines[index];
        let (name, parameters) = match FUNCTION_HEADER.captures(header.text) {
            Some(caps) => (caps[1].to_string(), split_list(&caps[2])),
            None => {
                self.malformed(index, "def");
                (DEFAULT_FUNCTION_NAME.to_string(), Vec::new())
            }
        };
        let (body, next) = self.parse_block_list(index + 1, Some(header.indent));
        (Block::function(name, parameters, body), next)
    }

    /// Parses an `if` (or, when chained, an `elif`) with everything that
    /// follows it at the same indentation: further `elif`s nest as the single
    /// else-branch conditional, a final `else:` becomes the else body.
    fn parse_conditional(&mut self, index: usize) -> (ConditionalBlock, usize) {
        let header = self.lines[index];
        let condition = match CONDITIONAL_HEADER.captures(header.text) {
            Some(caps) => caps[1].trim().to_string(),
            None => {
                self.malformed(index, "if");
                DEFAULT_CONDITION.to_string()
            }
        };
        let (true_body, mut next) = self.parse_block_list(index + 1, Some(header.indent));
        let mut block = ConditionalBlock::new(condition, true_body);

        if let Some(line) = self.lines.get(next).copied() {
            if line.indent == header.indent {
                if line.text.starts_with("elif ") {
                    let (chained, after) = self.parse_conditional(next);
                    block = block.with_elif(chained);
                    next = after;
                } else if line.text == "else:" {
                    let (else_body, after) = self.parse_block_list(next + 1, Some(header.indent));
                    block = block.with_else(else_body);
                    next = after;
                }
            }
        }

        (block, next)
    }

    fn parse_loop(&mut self, index: usize) -> (Block, usize) {
        let header = self.lines[index];
        let (iterator, iterable) = match LOOP_HEADER.captures(header.text) {
            Some(caps) => (caps[1].trim().to_string(), caps[2].trim().to_string()),
            None => {
                self.malformed(index, "for");
                (DEFAULT_ITERATOR.to_string(), DEFAULT_ITERABLE.to_string())
            }
        };
        let (body, next) = self.parse_block_list(index + 1, Some(header.indent));
        (Block::for_loop(iterator, iterable, body), next)
    }
}

/// `target = expression`, where the line holds no `==` anywhere.
fn parse_assignment(text: &str) -> Option<Block> {
    if text.contains("==") {
        return None;
    }
    let (target, value) = text.split_once('=')?;
    let target = target.trim();
    if !ASSIGN_TARGET.is_match(target) {
        return None;
    }
    Some(Block::variable(target, Value::simple(value.trim())))
}

/// `name(arg, ...)` used as a statement.
fn parse_call(text: &str) -> Option<Block> {
    let caps = CALL_STATEMENT.captures(text)?;
    Some(Block::call(&caps[1], split_list(&caps[2])))
}

/// Split on every comma. Commas nested inside brackets are not special.
fn split_list(list: &str) -> Vec<String> {
    let list = list.trim();
    if list.is_empty() {
        return Vec::new();
    }
    list.split(',').map(|item| item.trim().to_string()).collect()
}
