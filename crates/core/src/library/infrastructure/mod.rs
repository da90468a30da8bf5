pub mod durable_ledger_writer;
pub mod ledger_fs;
pub mod library_ledger;
pub mod video_scanner;
