use std::path::PathBuf;

use skipindex::util::load_list_config;
use skipindex::{NaturalOrder, SkipList};

fn main() {
    env_logger::init();

    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    let config = load_list_config(&dir).unwrap_or_else(|e| {
        log::warn!("falling back to default list config: {e}");
        skipindex::ListConfig::default()
    });
    log::info!(
        "starting demo list: max_height={} branching_factor={}",
        config.max_height,
        config.branching_factor
    );

    let list = SkipList::with_params(NaturalOrder, config.max_height, config.branching_factor)
        .expect("valid list configuration");

    for key in [42, 7, 19, 3, 88, 15] {
        list.insert(key);
    }

    println!("contains(19) = {}", list.contains(&19));
    println!("contains(100) = {}", list.contains(&100));

    print!("sorted keys:");
    let mut it = list.iterator();
    it.seek_to_first();
    while it.valid() {
        print!(" {}", it.key());
        it.next();
    }
    println!();

    println!("arena bytes allocated: {}", list.arena_allocated_bytes());
}
