#[cfg(feature = "serde")]
use serde::Deserialize;

/// What the decoder does after a corrupt frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Recovery {
    /// Report the error once, then stop decoding.
    #[default]
    Abort,
    /// Report the error, then look for the next frame sync code on the following call.
    Resync,
}

/// What the decoder does when the CRC-16 footer of a frame does not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ChecksumPolicy {
    /// Drop the frame and return [`FlacError::FrameChecksum`](crate::FlacError::FrameChecksum).
    #[default]
    Reject,
    /// Keep the samples, log a warning and mark the block.
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct DecoderOptions {
    pub recovery: Recovery,
    pub checksum_policy: ChecksumPolicy,
    /// Compare the MD5 of the decoded audio with STREAMINFO at end of stream.
    pub verify_md5: bool,
}

impl DecoderOptions {
    pub fn recovery(mut self, recovery: Recovery) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn checksum_policy(mut self, policy: ChecksumPolicy) -> Self {
        self.checksum_policy = policy;
        self
    }

    pub fn verify_md5(mut self, verify: bool) -> Self {
        self.verify_md5 = verify;
        self
    }
}
