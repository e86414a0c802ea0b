// wms2parquet-writer - Snapshot persistence and verification
//
// Encodes entity batches to Parquet, writes them into the data directory
// through OpenDAL, and reads them back for the run-log row-count summary.

mod encoding;
mod error;
mod storage;
mod verify;
mod write;

pub use encoding::set_parquet_row_group_size;
pub use error::{Result, WriterError};
pub use storage::init_operator;
pub use verify::{verify_snapshots, SnapshotReport};
pub use write::SnapshotWriter;
