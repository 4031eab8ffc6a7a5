pub mod server;
pub mod vehicles;
