pub mod fs;
pub mod settings;
pub mod text;
