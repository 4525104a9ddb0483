//! Copy-on-write edits of a block tree.
//!
//! Every operation takes the current tree by reference and returns a new
//! one; the input is never touched. Targets are found by [`BlockId`] at any
//! depth.

use crate::block::{
    check_unique_ids, Block, BlockId, ConditionalBlock, ElseKind, FunctionBlock, LoopBlock,
    DEFAULT_CONDITION,
};
use crate::error::{Error, Result};

/// Suffix addressing a conditional's else branch in [`append_child`].
pub const ELSE_SUFFIX: &str = "-else";

/// What to do with one block while rebuilding a list.
enum Edit {
    /// Copy it, descending into its bodies.
    Keep,
    /// Put this block in its place, without descending.
    Replace(Block),
    Remove,
}

/// Rebuild `blocks`, asking `edit` about every block in document order.
///
/// An elif branch left empty by a removal collapses back to no else clause.
fn rewrite<F>(blocks: &[Block], edit: &mut F) -> Result<Vec<Block>>
where
    F: FnMut(&Block) -> Result<Edit>,
{
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        match edit(block)? {
            Edit::Replace(replacement) => out.push(replacement),
            Edit::Remove => {}
            Edit::Keep => out.push(descend(block, edit)?),
        }
    }
    Ok(out)
}

fn descend<F>(block: &Block, edit: &mut F) -> Result<Block>
where
    F: FnMut(&Block) -> Result<Edit>,
{
    Ok(match block {
        Block::Function(b) => Block::Function(FunctionBlock {
            id: b.id.clone(),
            name: b.name.clone(),
            parameters: b.parameters.clone(),
            body: rewrite(&b.body, edit)?,
        }),
        Block::Conditional(b) => {
            let mut copy = ConditionalBlock {
                id: b.id.clone(),
                condition: b.condition.clone(),
                true_body: rewrite(&b.true_body, edit)?,
                else_kind: b.else_kind,
                else_body: rewrite(&b.else_body, edit)?,
            };
            if copy.else_kind == ElseKind::Elif && copy.else_body.is_empty() {
                copy.else_kind = ElseKind::None;
            }
            // A replacement must not put anything but a conditional into an elif branch.
            copy.check_else_shape()?;
            Block::Conditional(copy)
        }
        Block::Loop(b) => Block::Loop(LoopBlock {
            id: b.id.clone(),
            iterator: b.iterator.clone(),
            iterable: b.iterable.clone(),
            body: rewrite(&b.body, edit)?,
        }),
        Block::Variable(_) | Block::Return(_) | Block::Call(_) => block.clone(),
    })
}

/// Find a block anywhere in the tree.
pub fn find_by_id<'a>(blocks: &'a [Block], id: &BlockId) -> Option<&'a Block> {
    for block in blocks {
        if block.id() == id {
            return Some(block);
        }
        let found = match block {
            Block::Function(b) => find_by_id(&b.body, id),
            Block::Conditional(b) => {
                find_by_id(&b.true_body, id).or_else(|| find_by_id(&b.else_body, id))
            }
            Block::Loop(b) => find_by_id(&b.body, id),
            Block::Variable(_) | Block::Return(_) | Block::Call(_) => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Put `replacement` where the block `id` was.
///
/// The replacement may reuse the id of the block it replaces but no other id
/// already in the tree. The block held by an elif branch can only be
/// replaced by another conditional.
pub fn replace_by_id(blocks: &[Block], id: &BlockId, replacement: Block) -> Result<Vec<Block>> {
    let mut replacement = Some(replacement);
    let tree = rewrite(blocks, &mut |block| {
        if block.id() == id {
            if let Some(new_block) = replacement.take() {
                return Ok(Edit::Replace(new_block));
            }
        }
        Ok(Edit::Keep)
    })?;
    if replacement.is_some() {
        return Err(Error::BlockNotFound(id.to_string()));
    }
    check_unique_ids(&tree)?;
    Ok(tree)
}

/// Drop the block `id` (and everything inside it) from its owning list.
///
/// Removing the chained conditional of an elif returns its parent to having
/// no else clause.
pub fn delete_by_id(blocks: &[Block], id: &BlockId) -> Result<Vec<Block>> {
    let mut found = false;
    let tree = rewrite(blocks, &mut |block| {
        if block.id() == id {
            found = true;
            return Ok(Edit::Remove);
        }
        Ok(Edit::Keep)
    })?;
    if !found {
        return Err(Error::BlockNotFound(id.to_string()));
    }
    Ok(tree)
}

/// Append `child` to the body of `parent`.
///
/// `parent` is a block id, or a conditional's id followed by [`ELSE_SUFFIX`]
/// to target its else branch. Appending to the else branch of a conditional
/// without one turns it into an `else`.
pub fn append_child(blocks: &[Block], parent: &str, child: Block) -> Result<Vec<Block>> {
    let else_target = parent.strip_suffix(ELSE_SUFFIX);
    let mut child = Some(child);
    let tree = rewrite(blocks, &mut |block| {
        let exact = block.id().as_str() == parent;
        let into_else = !exact && else_target == Some(block.id().as_str());
        if !exact && !into_else {
            return Ok(Edit::Keep);
        }
        let Some(new_child) = child.take() else {
            return Ok(Edit::Keep);
        };
        let updated = match block {
            Block::Function(b) if exact => {
                let mut copy = b.clone();
                copy.body.push(new_child);
                Block::Function(copy)
            }
            Block::Loop(b) if exact => {
                let mut copy = b.clone();
                copy.body.push(new_child);
                Block::Loop(copy)
            }
            Block::Conditional(b) if exact => {
                let mut copy = b.clone();
                copy.true_body.push(new_child);
                Block::Conditional(copy)
            }
            Block::Conditional(b) => {
                if b.else_kind == ElseKind::Elif {
                    return Err(Error::ElifBranchOccupied(b.id.clone()));
                }
                let mut copy = b.clone();
                copy.else_kind = ElseKind::Else;
                copy.else_body.push(new_child);
                Block::Conditional(copy)
            }
            _ if exact => return Err(Error::NotAContainer(block.id().clone())),
            _ => {
                // `<id>-else` on something that is not a conditional
                child = Some(new_child);
                return Ok(Edit::Keep);
            }
        };
        Ok(Edit::Replace(updated))
    })?;
    if child.is_some() {
        return Err(Error::BlockNotFound(parent.to_string()));
    }
    check_unique_ids(&tree)?;
    Ok(tree)
}

/// Switch the else clause of conditional `id`.
///
/// `None` drops the else branch, `Else` starts an empty else body and `Elif`
/// chains a fresh default conditional. Asking for the kind it already has
/// keeps the branch as is.
pub fn set_else_kind(blocks: &[Block], id: &BlockId, kind: ElseKind) -> Result<Vec<Block>> {
    let mut found = false;
    let tree = rewrite(blocks, &mut |block| {
        if block.id() != id {
            return Ok(Edit::Keep);
        }
        found = true;
        let Block::Conditional(b) = block else {
            return Err(Error::NotAConditional(id.clone()));
        };
        if b.else_kind == kind {
            return Ok(Edit::Replace(block.clone()));
        }
        let mut copy = b.clone();
        copy.else_kind = kind;
        copy.else_body = match kind {
            ElseKind::None | ElseKind::Else => Vec::new(),
            ElseKind::Elif => vec![Block::Conditional(ConditionalBlock::new(DEFAULT_CONDITION, Vec::new()))],
        };
        Ok(Edit::Replace(Block::Conditional(copy)))
    })?;
    if !found {
        return Err(Error::BlockNotFound(id.to_string()));
    }
    Ok(tree)
}
