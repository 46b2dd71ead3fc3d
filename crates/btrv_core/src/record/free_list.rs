//! v5 deleted-record chain.

use crate::bytes::{record_pointer, slice};
use crate::error::BtrieveResult;
use std::collections::HashSet;
use tracing::warn;

/// Terminates the chain.
pub const END_OF_CHAIN: u32 = 0xFFFF_FFFF;

/// Offsets found on the free-record chain.
#[derive(Debug, Default)]
pub(crate) struct FreeList {
    pub offsets: HashSet<u32>,
    /// Offset at which a revisit was detected, if the chain loops.
    pub cycle_at: Option<u32>,
}

/// Follows the chain from `head` until [`END_OF_CHAIN`].
///
/// Each link is the first four bytes of a free slot. A loop ends the walk.
pub(crate) fn walk(data: &[u8], head: u32) -> BtrieveResult<FreeList> {
    let mut list = FreeList::default();
    let mut next = head;
    while next != END_OF_CHAIN {
        if !list.offsets.insert(next) {
            warn!(offset = next, "free record chain loops");
            list.cycle_at = Some(next);
            break;
        }
        next = record_pointer(slice(data, next as usize, 4)?);
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(data: &mut [u8], at: usize, next: u32) {
        data[at..at + 2].copy_from_slice(&((next >> 16) as u16).to_le_bytes());
        data[at + 2..at + 4].copy_from_slice(&(next as u16).to_le_bytes());
    }

    #[test]
    fn empty_chain() {
        let list = walk(&[0u8; 16], END_OF_CHAIN).unwrap();
        assert!(list.offsets.is_empty());
        assert!(list.cycle_at.is_none());
    }

    #[test]
    fn follows_links() {
        let mut data = vec![0u8; 64];
        link(&mut data, 8, 40);
        link(&mut data, 40, 20);
        link(&mut data, 20, END_OF_CHAIN);
        let list = walk(&data, 8).unwrap();
        assert_eq!(list.offsets, HashSet::from([8, 40, 20]));
    }

    #[test]
    fn stops_on_cycle() {
        let mut data = vec![0u8; 64];
        link(&mut data, 8, 40);
        link(&mut data, 40, 8);
        let list = walk(&data, 8).unwrap();
        assert_eq!(list.offsets.len(), 2);
        assert_eq!(list.cycle_at, Some(8));
    }

    #[test]
    fn out_of_range_link_fails() {
        let mut data = vec![0u8; 64];
        link(&mut data, 8, 0x1000);
        assert!(walk(&data, 8).is_err());
    }
}
