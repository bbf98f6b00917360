//! Per-subsystem error enums: hand-written `Debug + Display + Error` impls,
//! no `thiserror`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressError {
    /// A single compressor call (one block) was handed more input than a
    /// block is ever allowed to hold.
    InputTooLarge { len: usize, max: usize },
}

impl fmt::Display for CompressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressError::InputTooLarge { len, max } => {
                write!(f, "input of {len} bytes exceeds the {max}-byte block limit")
            }
        }
    }
}
impl std::error::Error for CompressError {}

/// Decoder failure kinds, named after the bounds the safe decompressor
/// checks before every memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The token stream asked to read past the end of the compressed input.
    InputOverrun,
    /// A literal run or match copy would write past the end of the output
    /// buffer.
    OutputOverrun,
    /// A match's back-reference points before the start of the output
    /// produced so far (a corrupt or adversarial offset).
    LookbehindOverrun,
    /// Decoding reached the EOF marker with unconsumed input bytes
    /// remaining.
    InputNotConsumed,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecodeError::InputOverrun => "input overrun",
            DecodeError::OutputOverrun => "output overrun",
            DecodeError::LookbehindOverrun => "lookbehind overrun",
            DecodeError::InputNotConsumed => "input not fully consumed",
        };
        f.write_str(s)
    }
}
impl std::error::Error for DecodeError {}

/// Container rejection conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    BadMagic,
    TruncatedHeader,
    TruncatedLengthTable,
    TruncatedPayload,
    /// The length table's sum doesn't add up to the payload actually
    /// present, or `block_count` disagrees with `original_size`/`block_size`.
    InconsistentHeader,
    /// `original_size` exceeds the 4 GiB input-size limit.
    OriginalSizeTooLarge,
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContainerError::BadMagic => "bad magic number",
            ContainerError::TruncatedHeader => "truncated container header",
            ContainerError::TruncatedLengthTable => "truncated compressed-length table",
            ContainerError::TruncatedPayload => "truncated block payload",
            ContainerError::InconsistentHeader => "inconsistent container header",
            ContainerError::OriginalSizeTooLarge => "original size exceeds 4 GiB limit",
        };
        f.write_str(s)
    }
}
impl std::error::Error for ContainerError {}

/// Driver errors: I/O plus any codec/container failure surfaced up to the
/// CLI boundary.
#[derive(Debug)]
pub enum DriverError {
    Io(std::io::Error),
    Compress(CompressError),
    Decode(DecodeError),
    Container(ContainerError),
    /// `--verify` re-decoded a just-compressed block and it didn't match the
    /// original input.
    VerifyMismatch { block_index: usize },
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Io(e) => write!(f, "i/o error: {e}"),
            DriverError::Compress(e) => write!(f, "compress error: {e}"),
            DriverError::Decode(e) => write!(f, "decode error: {e}"),
            DriverError::Container(e) => write!(f, "container error: {e}"),
            DriverError::VerifyMismatch { block_index } => {
                write!(f, "verify mismatch in block {block_index}")
            }
        }
    }
}
impl std::error::Error for DriverError {}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        DriverError::Io(e)
    }
}
impl From<CompressError> for DriverError {
    fn from(e: CompressError) -> Self {
        DriverError::Compress(e)
    }
}
impl From<DecodeError> for DriverError {
    fn from(e: DecodeError) -> Self {
        DriverError::Decode(e)
    }
}
impl From<ContainerError> for DriverError {
    fn from(e: ContainerError) -> Self {
        DriverError::Container(e)
    }
}

/// Daemon errors.
#[derive(Debug)]
pub enum DaemonError {
    Io(std::io::Error),
    /// A request record didn't parse (wrong size, bad level byte, etc).
    Protocol(&'static str),
    Driver(DriverError),
    Accel(crate::accel::AccelError),
}

impl fmt::Display for DaemonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaemonError::Io(e) => write!(f, "i/o error: {e}"),
            DaemonError::Protocol(msg) => write!(f, "protocol error: {msg}"),
            DaemonError::Driver(e) => write!(f, "{e}"),
            DaemonError::Accel(e) => write!(f, "accelerator error: {e}"),
        }
    }
}
impl std::error::Error for DaemonError {}

impl From<std::io::Error> for DaemonError {
    fn from(e: std::io::Error) -> Self {
        DaemonError::Io(e)
    }
}
impl From<DriverError> for DaemonError {
    fn from(e: DriverError) -> Self {
        DaemonError::Driver(e)
    }
}
impl From<crate::accel::AccelError> for DaemonError {
    fn from(e: crate::accel::AccelError) -> Self {
        DaemonError::Accel(e)
    }
}
