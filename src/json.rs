//! JSON form of block trees, as exchanged with the editor.

use crate::block::{check_tree, Block};
use crate::error::Result;

/// Serialize to compact JSON.
pub fn to_json(blocks: &[Block]) -> Result<String> {
    Ok(serde_json::to_string(blocks)?)
}

/// Serialize to pretty-printed JSON.
pub fn to_json_pretty(blocks: &[Block]) -> Result<String> {
    Ok(serde_json::to_string_pretty(blocks)?)
}

/// Deserialize a block list and check its invariants.
///
/// Variable values stored as bare strings (the older scalar-only format)
/// are migrated to simple values.
pub fn from_json(input: &str) -> Result<Vec<Block>> {
    let blocks: Vec<Block> = serde_json::from_str(input)?;
    check_tree(&blocks)?;
    Ok(blocks)
}
