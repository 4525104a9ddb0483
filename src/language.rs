use crate::block::Block;
use crate::compiler::{Compiler, DEFAULT_INDENT};
use crate::error::Result;
use crate::parser::{self, ParseOutput};

/// A target language the editor can translate block trees to and from.
pub trait LanguageService {
    /// Display name, e.g. "Python".
    fn name(&self) -> &str;

    fn compile(&self, blocks: &[Block]) -> Result<String>;

    fn parse_with_diagnostics(&self, source: &str) -> ParseOutput;

    fn parse(&self, source: &str) -> Vec<Block> {
        self.parse_with_diagnostics(source).blocks
    }
}

/// Python-flavoured source: `def`, `if`/`elif`/`else`, `for ... in`, `return`.
#[derive(Debug, Clone, Copy)]
pub struct Python {
    compiler: Compiler,
}

impl Python {
    pub fn with_indent(indent_width: usize) -> Self {
        Python {
            compiler: Compiler::new(indent_width),
        }
    }
}

impl Default for Python {
    fn default() -> Self {
        Python::with_indent(DEFAULT_INDENT)
    }
}

impl LanguageService for Python {
    fn name(&self) -> &str {
        "Python"
    }

    fn compile(&self, blocks: &[Block]) -> Result<String> {
        self.compiler.compile(blocks)
    }

    fn parse_with_diagnostics(&self, source: &str) -> ParseOutput {
        parser::parse_with_diagnostics(source)
    }
}
