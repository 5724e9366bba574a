pub mod capacity;
pub mod child_array;
