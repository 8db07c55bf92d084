pub mod convert;
pub mod engine;
pub mod errors;
pub mod file_set;

pub use convert::convert_heic_to_png;
pub use engine::{
    concurrency_degree, BatchOutcome, BatchReport, CancelToken, Engine, ProgressSink,
};
pub use errors::{ConvertError, EngineError, Result};
pub use file_set::FileSet;
