pub mod form;
pub mod routing;
pub mod types;
