// Public modules
pub mod collector;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod normalizer;
pub mod report;
pub mod sentiment;
pub mod sink;
pub mod stream;
pub mod timeline;

// Re-export commonly used types
pub use collector::{
    BoundedStreamCollector, CollectionOutcome, PartialBatchPolicy, StreamListener,
    TRANSPORT_FAILURE_CODE,
};
pub use config::{Authenticator, Config, Credentials};
pub use error::{ParseError, SinkWriteError, StreamError, TimelineError};
pub use io::{batch_filename, export_text, list_batch_files, load_batch, BatchFile};
pub use models::{CollectedBatch, PolarityVerdict, RawRecord, SentimentLabel};
pub use normalizer::TextNormalizer;
pub use report::{ReportRenderer, ScoredPost, SentimentSummary};
pub use sentiment::{PolarityScorer, SentimentClassifier, VaderScorer};
pub use sink::{BatchSink, JsonFileSink, MemorySink};
pub use stream::{drive_listener, parse_keywords, StreamClient, StreamEnd, MAX_RECORD_BYTES};
pub use timeline::{HttpTimelineSource, TimelineFetcher, TimelinePost, TimelineSource};
