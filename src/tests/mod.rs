pub mod common;

mod registry_and_poller;
