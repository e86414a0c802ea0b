// wms2parquet-runner - Pipeline orchestration
//
// Linear collection-and-commit pipeline: collect -> verify -> commit ->
// archive. Steps communicate only through the shared data directory; a
// single flat timeout bounds the whole run.

pub mod archive;
pub mod commit;
pub mod init;
pub mod pipeline;
