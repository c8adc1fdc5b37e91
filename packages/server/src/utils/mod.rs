pub mod filename;
pub mod html;
