pub mod statements;

pub use statements::StatementTransport;
