pub mod arena;
pub mod recency_list;

pub use arena::{Arena, Handle};
pub use recency_list::RecencyList;
