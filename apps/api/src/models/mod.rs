pub mod screening;
pub mod selection;
