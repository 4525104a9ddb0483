use crate::block::*;
use crate::error::Result;

/// Statement emitted for a body that has no statements.
pub const PLACEHOLDER: &str = "pass";

/// Return token used when a return block carries no value.
pub const NO_VALUE: &str = "None";

pub const DEFAULT_INDENT: usize = 4;

/// Renders block trees as Python source.
#[derive(Debug, Clone, Copy)]
pub struct Compiler {
    indent_width: usize,
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new(DEFAULT_INDENT)
    }
}

/// Compile with the default indentation.
pub fn compile(blocks: &[Block]) -> Result<String> {
    Compiler::default().compile(blocks)
}

impl Compiler {
    pub fn new(indent_width: usize) -> Self {
        Compiler { indent_width }
    }

    /// Top-level statements are separated by a blank line.
    ///
    /// Fails only when the tree breaks the else-branch invariants.
    pub fn compile(&self, blocks: &[Block]) -> Result<String> {
        let mut parts = Vec::with_capacity(blocks.len());
        for block in blocks {
            let mut out = Vec::new();
            self.write_block(&mut out, block, 0)?;
            parts.push(out.join("\n"));
        }
        Ok(parts.join("\n\n"))
    }

    fn pad(&self, depth: usize) -> String {
        " ".repeat(self.indent_width * depth)
    }

    fn write_block(&self, out: &mut Vec<String>, block: &Block, depth: usize) -> Result<()> {
        let pad = self.pad(depth);
        match block {
            Block::Function(b) => {
                out.push(format!("{}def {}({}):", pad, b.name, b.parameters.join(", ")));
                self.write_body(out, &b.body, depth + 1)?;
            }
            Block::Variable(b) => {
                out.push(format!("{}{} = {}", pad, b.name, b.value.to_source()));
            }
            Block::Conditional(b) => self.write_conditional(out, b, depth, "if")?,
            Block::Loop(b) => {
                out.push(format!("{}for {} in {}:", pad, b.iterator, b.iterable));
                self.write_body(out, &b.body, depth + 1)?;
            }
            Block::Return(b) => {
                let value = b.value.trim();
                let value = if value.is_empty() { NO_VALUE } else { value };
                out.push(format!("{}return {}", pad, value));
            }
            Block::Call(b) => {
                out.push(format!("{}{}({})", pad, b.function_name, b.arguments.join(", ")));
            }
        }
        Ok(())
    }

    /// One statement per line, or the placeholder when empty.
    fn write_body(&self, out: &mut Vec<String>, body: &[Block], depth: usize) -> Result<()> {
        if body.is_empty() {
            out.push(format!("{}{}", self.pad(depth), PLACEHOLDER));
            return Ok(());
        }
        for block in body {
            self.write_block(out, block, depth)?;
        }
        Ok(())
    }

    /// Chained conditionals come out as a flat `if/elif/.../else` ladder at
    /// the depth of the first `if`.
    fn write_conditional(
        &self,
        out: &mut Vec<String>,
        block: &ConditionalBlock,
        depth: usize,
        keyword: &str,
    ) -> Result<()> {
        let pad = self.pad(depth);
        out.push(format!("{}{} {}:", pad, keyword, block.condition));
        self.write_body(out, &block.true_body, depth + 1)?;

        if let Some(next) = block.elif_branch()? {
            return self.write_conditional(out, next, depth, "elif");
        }
        if block.else_kind == ElseKind::Else {
            out.push(format!("{}else:", pad));
            self.write_body(out, &block.else_body, depth + 1)?;
        }
        Ok(())
    }
}
