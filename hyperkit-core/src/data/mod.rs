//! Reference datasets and their train/test preparation.

pub mod loader;
pub mod split;

pub use loader::{BUNDLED_DATASETS, RawDataset, Task, available_datasets, load_dataset};
pub use split::{DatasetSplit, SplitOptions, get_dataset, prepare_split, train_size};
