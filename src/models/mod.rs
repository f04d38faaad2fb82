pub mod gallery_item;
pub mod row_model;

pub use gallery_item::*;
pub use row_model::*;
