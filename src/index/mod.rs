//! Skip-list index core: an arena-backed, ordered map over an opaque key
//! type, plus optional accelerator side-indexes that shorten lookups.

pub mod accel;
pub mod arena;
pub mod comparator;
pub mod height;
pub mod node;
pub mod rng;
pub mod skiplist;

pub use accel::bucketed::BucketedSkipList;
pub use arena::Arena;
pub use comparator::{Comparator, NaturalOrder};
pub use rng::{RandomSource, SeededRng, ThreadRng};
pub use skiplist::{ListIterator, SkipList, DEFAULT_BRANCHING, DEFAULT_MAX_HEIGHT};
