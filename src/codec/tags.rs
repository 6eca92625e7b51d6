//! CBOR tags with a meaning for repository records.

/// Positive bignum (byte string payload).
pub const TAG_POS_BIGNUM: u64 = 2;
/// Negative bignum (byte string payload), encoded as `-1 - n`.
pub const TAG_NEG_BIGNUM: u64 = 3;
/// Content link: byte string holding `0x00` followed by a binary CID.
pub const TAG_CID: u64 = 42;

/// Multibase identity prefix in front of the CID bytes under [`TAG_CID`].
pub const CID_IDENTITY_PREFIX: u8 = 0x00;
