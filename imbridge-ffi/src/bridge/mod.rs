pub mod abi;
pub mod callback;
pub mod envelope;
pub mod main_thread;
pub mod native;
