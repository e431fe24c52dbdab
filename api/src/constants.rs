//! Application constants

/// Maximum request body size for uploads (200 MB)
pub const MAX_UPLOAD_SIZE: usize = 200 * 1024 * 1024;

/// Folder under the public dir (or bucket prefix) holding uploaded and trimmed media
pub const UPLOADS_FOLDER: &str = "uploads";

/// Extension used when neither the upload nor the trim input names one
pub const DEFAULT_EXTENSION: &str = "webm";

/// Name recorded for uploads whose multipart field carries no file name
pub const DEFAULT_RECORDING_NAME: &str = "recording.webm";

/// Prefix prepended to the input basename for trimmed clips
pub const TRIMMED_NAME_PREFIX: &str = "trimmed-";

/// Stored media is never rewritten (paths embed a fresh id), so it can be cached forever
pub const MEDIA_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";
