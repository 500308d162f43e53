pub mod config;
pub mod confirm;
pub mod encoder;
pub mod error;
pub mod formats;
pub mod packager;
pub mod pipeline;
pub mod seen;
pub mod testing;
pub mod tracker;
pub mod validator;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DetectorConfig,
    LibraryConfig, PublishConfig, TrackerConfig,
};
pub use confirm::{AutoConfirm, Confirmer, StdinConfirmer};
pub use encoder::{EncodeJob, Encoder, EncoderConfig, EncoderError, FfmpegEncoder};
pub use error::FatalError;
pub use formats::{FormatDescriptor, SourceEncoding, TargetFormat, KNOWN_MEDIA};
pub use packager::{PackageJob, Packager, PackagerError, TorrentPackage, TorrentPackager};
pub use pipeline::{
    Candidate, FormatProcessor, PipelineDeps, PipelineDriver, ProcessSummary, RunOptions,
    RunSummary,
};
pub use seen::{SeenError, SeenSet};
pub use tracker::{
    GazelleClient, OwnedRelease, Release, ReleaseGroup, SubmitRequest, Tracker, TrackerError,
};
pub use validator::{
    select_detector, ContainerDetector, DetectorError, FfprobeTagChecker, LocalDetector,
    SourceScan, TagChecker, TranscodeDetector, ValidatorError,
};
