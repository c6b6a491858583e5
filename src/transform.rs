//! The rewrite hook applied to every eligible class.
//!
//! The pipeline treats a transform as a pure function of the class bytes. It
//! is called from several worker threads at once and in no particular order.

use tracing::warn;

const CLASS_MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

pub trait ClassTransform: Send + Sync {
    fn transform(&self, class_bytes: &[u8]) -> Vec<u8>;
}

impl<F> ClassTransform for F
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync,
{
    fn transform(&self, class_bytes: &[u8]) -> Vec<u8> {
        self(class_bytes)
    }
}

/// Returns the bytes unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl ClassTransform for Identity {
    fn transform(&self, class_bytes: &[u8]) -> Vec<u8> {
        class_bytes.to_vec()
    }
}

/// Passes bytes through, warning about anything that is not a class file.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyMagic;

impl ClassTransform for VerifyMagic {
    fn transform(&self, class_bytes: &[u8]) -> Vec<u8> {
        if !class_bytes.starts_with(&CLASS_MAGIC) {
            warn!(len = class_bytes.len(), "class bytes do not start with 0xCAFEBABE");
        }
        class_bytes.to_vec()
    }
}
