pub mod capture;
pub mod replica;
pub mod sql;

pub use capture::{CaptureTable, PollSummary};
pub use replica::ReplicaTable;
