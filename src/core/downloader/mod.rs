mod client;

pub use client::{sha1_hex, verify_sha1, Downloader, Fetcher};
