//! Optional side-indexes that give the main list a closer entry point than
//! `head`, trading memory and insert-time bookkeeping for shorter descents.
//! Each is an alternative operation mode selected per call, not a separate
//! list — see `SkipList::insert_tree_accel`/`insert_rb_accel` and their
//! `contains_*` counterparts.

pub mod bucketed;
pub mod redblack;
pub mod tree;
