//! Which variable names are in scope at a point of the block tree.

use std::collections::HashSet;

use crate::block::{Block, BlockId, FunctionBlock};

/// Ordered, de-duplicated name collector.
#[derive(Default)]
struct Names {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl Names {
    fn push(&mut self, name: &str) {
        if self.seen.insert(name.to_string()) {
            self.order.push(name.to_string());
        }
    }
}

/// Names visible before `stop_before` in `blocks`.
///
/// The result starts with `enclosing_params`, then follows document order:
/// a variable becomes visible after its own block, a loop iterator from its
/// loop onwards (including later siblings). The walk descends into every
/// body and halts as soon as it reaches `stop_before`. Each name is listed
/// once, at its first occurrence.
pub fn visible_names(
    blocks: &[Block],
    stop_before: Option<&BlockId>,
    enclosing_params: &[String],
) -> Vec<String> {
    let mut names = Names::default();
    for param in enclosing_params {
        names.push(param);
    }
    collect(blocks, stop_before, &mut names);
    names.order
}

/// Returns true once `stop_before` has been reached.
fn collect(blocks: &[Block], stop_before: Option<&BlockId>, names: &mut Names) -> bool {
    for block in blocks {
        if stop_before == Some(block.id()) {
            return true;
        }
        let stopped = match block {
            Block::Variable(b) => {
                names.push(&b.name);
                false
            }
            Block::Loop(b) => {
                names.push(&b.iterator);
                collect(&b.body, stop_before, names)
            }
            Block::Conditional(b) => {
                collect(&b.true_body, stop_before, names)
                    || collect(&b.else_body, stop_before, names)
            }
            Block::Function(b) => collect(&b.body, stop_before, names),
            Block::Return(_) | Block::Call(_) => false,
        };
        if stopped {
            return true;
        }
    }
    false
}

/// Every name a function can see anywhere in its body: its parameters plus
/// all variables and loop iterators declared inside it, at any depth.
pub fn variables_in_function(function: &FunctionBlock) -> Vec<String> {
    visible_names(&function.body, None, &function.parameters)
}

/// Names visible just before block `target`, seeded with the parameters of
/// the innermost function that contains it.
pub fn names_visible_at(blocks: &[Block], target: &BlockId) -> Vec<String> {
    let params = enclosing_function(blocks, target)
        .map(|f| f.parameters.as_slice())
        .unwrap_or(&[]);
    visible_names(blocks, Some(target), params)
}

fn enclosing_function<'a>(blocks: &'a [Block], target: &BlockId) -> Option<&'a FunctionBlock> {
    fn search<'a>(
        blocks: &'a [Block],
        target: &BlockId,
        current: Option<&'a FunctionBlock>,
    ) -> Option<Option<&'a FunctionBlock>> {
        for block in blocks {
            if block.id() == target {
                return Some(current);
            }
            let found = match block {
                Block::Function(b) => search(&b.body, target, Some(b)),
                Block::Conditional(b) => search(&b.true_body, target, current)
                    .or_else(|| search(&b.else_body, target, current)),
                Block::Loop(b) => search(&b.body, target, current),
                Block::Variable(_) | Block::Return(_) | Block::Call(_) => None,
            };
            if found.is_some() {
                return found;
            }
        }
        None
    }
    search(blocks, target, None).flatten()
}
