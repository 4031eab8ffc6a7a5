pub mod loader;
pub mod settings;
pub mod validator;
pub mod vehicles;
