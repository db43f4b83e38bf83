pub mod init;

pub use init::WeightInit;
