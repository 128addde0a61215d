pub mod valyu;

pub use valyu::ValyuClient;
