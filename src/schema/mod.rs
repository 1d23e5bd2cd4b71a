pub mod adventure;
pub mod item;
pub mod passage;
