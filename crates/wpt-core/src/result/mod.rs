pub mod model;
pub mod normalize;

pub use model::{
    Images, NormalizedResult, Pages, RawData, RawEnvelope, RawRunSet, Run, RunMetrics, RunView,
    TestInfo, TestResult, Thumbnails, VideoFrame,
};
pub use normalize::{normalize, normalize_envelope, order_runs};
