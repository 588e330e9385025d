/**
 * Buckets: directory namespaces under a storage root.
 *  - Path resolution and root containment
 *  - Directory lifecycle, enumeration, upload placement
 *    and download with content sniffing
 */
pub mod bucket;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::bucket::{
        Bucket, BucketError, BucketFile, BucketStore, Download, Downloader, Enumerator, Ownership,
        PathResolver, ResolvedPath, UploadReceipt, Uploader,
    };
    pub use crate::version::{build_info, BuildInfo};
}
