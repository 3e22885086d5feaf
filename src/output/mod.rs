pub mod csv_file;
pub mod presenter;
pub mod run_directory;
