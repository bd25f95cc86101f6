pub mod fetcher;
pub mod invocation;
pub mod phash;
pub mod scratch;
pub mod storage;
