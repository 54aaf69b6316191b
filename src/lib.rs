pub mod error;
pub mod index;
pub mod util;

pub use crate::error::IndexError;
pub use crate::index::{
    BucketedSkipList, Comparator, ListIterator, NaturalOrder, RandomSource, SeededRng, SkipList,
    ThreadRng,
};
pub use crate::util::ListConfig;
