pub mod snapshot;
pub mod csv_writer;
