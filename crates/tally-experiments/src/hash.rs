//! Bucket hashing shared with the server and every other client.

use md5::{Digest, Md5};

/// Number of buckets users are spread over.
pub const BUCKET_COUNT: u32 = 100;

/// Map `key` to a bucket in `0..100`.
///
/// MD5 of the UTF-8 bytes, first four digest bytes read as a big-endian
/// unsigned integer, reduced modulo 100. Changing any step reassigns users.
pub fn stable_hash(key: &str) -> u32 {
    let digest = Md5::digest(key.as_bytes());
    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    prefix % BUCKET_COUNT
}
