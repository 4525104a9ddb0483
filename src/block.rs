use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::Value;

/// Opaque, stable identity of a block. Unique within one tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

pub const DEFAULT_FUNCTION_NAME: &str = "new_function";
pub const DEFAULT_CONDITION: &str = "True";
pub const DEFAULT_ITERATOR: &str = "i";
pub const DEFAULT_ITERABLE: &str = "range(10)";

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        BlockId(id.into())
    }

    /// A never-before-issued id of the form `<kind>-<n>`.
    pub fn fresh(kind: BlockKind) -> Self {
        let n = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        BlockId(format!("{}-{}", kind.tag(), n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        BlockId(id.to_string())
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        BlockId(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Function,
    Variable,
    Conditional,
    Loop,
    Return,
    Call,
}

impl BlockKind {
    /// The wire tag the editor uses for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            BlockKind::Function => "function",
            BlockKind::Variable => "variable",
            BlockKind::Conditional => "if",
            BlockKind::Loop => "for",
            BlockKind::Return => "return",
            BlockKind::Call => "function-call",
        }
    }
}

impl FromStr for BlockKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "function" => Ok(BlockKind::Function),
            "variable" => Ok(BlockKind::Variable),
            "if" => Ok(BlockKind::Conditional),
            "for" => Ok(BlockKind::Loop),
            "return" => Ok(BlockKind::Return),
            "function-call" | "call" => Ok(BlockKind::Call),
            other => Err(Error::UnknownBlockKind(other.to_string())),
        }
    }
}

/// What follows the true branch of a conditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElseKind {
    #[default]
    None,
    /// `else_body` holds exactly one [`ConditionalBlock`], rendered as `elif`.
    Elif,
    Else,
}

/// One statement node of the visual program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    #[serde(rename = "function")]
    Function(FunctionBlock),
    #[serde(rename = "variable")]
    Variable(VariableBlock),
    #[serde(rename = "if")]
    Conditional(ConditionalBlock),
    #[serde(rename = "for")]
    Loop(LoopBlock),
    #[serde(rename = "return")]
    Return(ReturnBlock),
    #[serde(rename = "function-call")]
    Call(CallBlock),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionBlock {
    pub id: BlockId,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(rename = "children", default)]
    pub body: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableBlock {
    pub id: BlockId,
    pub name: String,
    #[serde(deserialize_with = "crate::value::deserialize_migrating")]
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalBlock {
    pub id: BlockId,
    pub condition: String,
    #[serde(rename = "ifBody", default)]
    pub true_body: Vec<Block>,
    #[serde(rename = "elseType", default)]
    pub else_kind: ElseKind,
    #[serde(rename = "elseBody", default)]
    pub else_body: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopBlock {
    pub id: BlockId,
    pub iterator: String,
    pub iterable: String,
    #[serde(rename = "children", default)]
    pub body: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnBlock {
    pub id: BlockId,
    pub value: String,
}

/// A call used as a statement. Arguments are opaque expression text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallBlock {
    pub id: BlockId,
    #[serde(rename = "functionName")]
    pub function_name: String,
    #[serde(default)]
    pub arguments: Vec<String>,
}

impl Block {
    /// A block of `kind` filled with the editor's placeholder values and a fresh id.
    pub fn new_default(kind: BlockKind) -> Block {
        match kind {
            BlockKind::Function => Block::function(DEFAULT_FUNCTION_NAME, Vec::new(), Vec::new()),
            BlockKind::Variable => Block::variable("new_var", Value::simple("0")),
            BlockKind::Conditional => Block::conditional(DEFAULT_CONDITION, Vec::new()),
            BlockKind::Loop => Block::for_loop(DEFAULT_ITERATOR, DEFAULT_ITERABLE, Vec::new()),
            BlockKind::Return => Block::ret("None"),
            BlockKind::Call => Block::call("print", Vec::new()),
        }
    }

    pub fn function(name: impl Into<String>, parameters: Vec<String>, body: Vec<Block>) -> Block {
        Block::Function(FunctionBlock {
            id: BlockId::fresh(BlockKind::Function),
            name: name.into(),
            parameters,
            body,
        })
    }

    pub fn variable(name: impl Into<String>, value: Value) -> Block {
        Block::Variable(VariableBlock {
            id: BlockId::fresh(BlockKind::Variable),
            name: name.into(),
            value,
        })
    }

    pub fn conditional(condition: impl Into<String>, true_body: Vec<Block>) -> Block {
        Block::Conditional(ConditionalBlock::new(condition, true_body))
    }

    pub fn for_loop(
        iterator: impl Into<String>,
        iterable: impl Into<String>,
        body: Vec<Block>,
    ) -> Block {
        Block::Loop(LoopBlock {
            id: BlockId::fresh(BlockKind::Loop),
            iterator: iterator.into(),
            iterable: iterable.into(),
            body,
        })
    }

    pub fn ret(value: impl Into<String>) -> Block {
        Block::Return(ReturnBlock {
            id: BlockId::fresh(BlockKind::Return),
            value: value.into(),
        })
    }

    pub fn call(function_name: impl Into<String>, arguments: Vec<String>) -> Block {
        Block::Call(CallBlock {
            id: BlockId::fresh(BlockKind::Call),
            function_name: function_name.into(),
            arguments,
        })
    }

    pub fn id(&self) -> &BlockId {
        match self {
            Block::Function(b) => &b.id,
            Block::Variable(b) => &b.id,
            Block::Conditional(b) => &b.id,
            Block::Loop(b) => &b.id,
            Block::Return(b) => &b.id,
            Block::Call(b) => &b.id,
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Function(_) => BlockKind::Function,
            Block::Variable(_) => BlockKind::Variable,
            Block::Conditional(_) => BlockKind::Conditional,
            Block::Loop(_) => BlockKind::Loop,
            Block::Return(_) => BlockKind::Return,
            Block::Call(_) => BlockKind::Call,
        }
    }

    /// Deep copy for copy/paste: the copy and every block inside it get new ids.
    pub fn clone_with_fresh_ids(&self) -> Block {
        let kind = self.kind();
        let mut copy = self.clone();
        match &mut copy {
            Block::Function(b) => {
                b.id = BlockId::fresh(kind);
                b.body = fresh_ids(&b.body);
            }
            Block::Variable(b) => b.id = BlockId::fresh(kind),
            Block::Conditional(b) => {
                b.id = BlockId::fresh(kind);
                b.true_body = fresh_ids(&b.true_body);
                b.else_body = fresh_ids(&b.else_body);
            }
            Block::Loop(b) => {
                b.id = BlockId::fresh(kind);
                b.body = fresh_ids(&b.body);
            }
            Block::Return(b) => b.id = BlockId::fresh(kind),
            Block::Call(b) => b.id = BlockId::fresh(kind),
        }
        copy
    }
}

fn fresh_ids(blocks: &[Block]) -> Vec<Block> {
    blocks.iter().map(Block::clone_with_fresh_ids).collect()
}

impl ConditionalBlock {
    pub fn new(condition: impl Into<String>, true_body: Vec<Block>) -> Self {
        ConditionalBlock {
            id: BlockId::fresh(BlockKind::Conditional),
            condition: condition.into(),
            true_body,
            else_kind: ElseKind::None,
            else_body: Vec::new(),
        }
    }

    /// Chain `next` as this conditional's `elif`.
    pub fn with_elif(mut self, next: ConditionalBlock) -> Self {
        self.else_kind = ElseKind::Elif;
        self.else_body = vec![Block::Conditional(next)];
        self
    }

    pub fn with_else(mut self, else_body: Vec<Block>) -> Self {
        self.else_kind = ElseKind::Else;
        self.else_body = else_body;
        self
    }

    /// The chained conditional of an `Elif`, after checking the branch shape.
    pub fn elif_branch(&self) -> Result<Option<&ConditionalBlock>> {
        self.check_else_shape()?;
        match (self.else_kind, self.else_body.first()) {
            (ElseKind::Elif, Some(Block::Conditional(next))) => Ok(Some(next)),
            _ => Ok(None),
        }
    }

    /// Elif holds exactly one conditional; None holds nothing.
    pub(crate) fn check_else_shape(&self) -> Result<()> {
        match self.else_kind {
            ElseKind::None if !self.else_body.is_empty() => Err(Error::StrayElseBody {
                id: self.id.clone(),
            }),
            ElseKind::Elif
                if !matches!(self.else_body.as_slice(), [Block::Conditional(_)]) =>
            {
                Err(Error::MalformedElif {
                    id: self.id.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl From<ConditionalBlock> for Block {
    fn from(block: ConditionalBlock) -> Self {
        Block::Conditional(block)
    }
}

/// Verify the structural invariants of a whole tree: unique ids and
/// well-formed else branches.
pub fn check_tree(blocks: &[Block]) -> Result<()> {
    check_unique_ids(blocks)?;
    check_shapes(blocks)
}

/// Fails with the first id that occurs twice, in document order.
pub(crate) fn check_unique_ids(blocks: &[Block]) -> Result<()> {
    fn walk<'a>(blocks: &'a [Block], seen: &mut HashSet<&'a BlockId>) -> Result<()> {
        for block in blocks {
            if !seen.insert(block.id()) {
                return Err(Error::DuplicateId(block.id().clone()));
            }
            match block {
                Block::Function(b) => walk(&b.body, seen)?,
                Block::Conditional(b) => {
                    walk(&b.true_body, seen)?;
                    walk(&b.else_body, seen)?;
                }
                Block::Loop(b) => walk(&b.body, seen)?,
                Block::Variable(_) | Block::Return(_) | Block::Call(_) => {}
            }
        }
        Ok(())
    }
    walk(blocks, &mut HashSet::new())
}

fn check_shapes(blocks: &[Block]) -> Result<()> {
    for block in blocks {
        match block {
            Block::Function(b) => check_shapes(&b.body)?,
            Block::Conditional(b) => {
                b.check_else_shape()?;
                check_shapes(&b.true_body)?;
                check_shapes(&b.else_body)?;
            }
            Block::Loop(b) => check_shapes(&b.body)?,
            Block::Variable(_) | Block::Return(_) | Block::Call(_) => {}
        }
    }
    Ok(())
}
