pub mod channel;
pub mod worker;

pub use worker::DiffWorker;
