pub mod bucket;
pub mod daemon;
pub mod health;
pub mod init;
pub mod version;

pub use bucket::Bucket;
pub use daemon::Daemon;
pub use health::Health;
pub use init::Init;
pub use version::Version;
