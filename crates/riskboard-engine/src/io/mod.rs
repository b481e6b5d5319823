pub mod csv_dataset;

pub use csv_dataset::{read_dataset_csv, read_dataset_csv_with_config, DatasetReaderConfig};
