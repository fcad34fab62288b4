pub mod owned_css;
pub mod selector;
pub mod stylesheet;
pub mod used_css;
