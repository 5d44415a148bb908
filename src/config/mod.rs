//! Configuration module for Stemme.
//!
//! Handles loading and managing pipeline settings.

mod settings;

pub use settings::{
    parse_url_list, read_url_file, DownloadSettings, GeneralSettings, LayoutSettings,
    PreprocessSettings, QualitySettings, SegmentationSettings, Settings, SourceSettings,
    TranscriptionSettings,
};
