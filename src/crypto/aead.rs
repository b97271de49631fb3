use crate::error::Error;
use crate::record::{ProtocolVersion, Record};

/// Authentication tag length shared by both AEAD families.
pub const TAG_LEN: usize = 16;

/// In-place protection of a record payload.
///
/// One implementation per record family. Callers go through
/// [`Record::seal`] and [`Record::open`], which reject a record whose
/// declared version differs from [`RecordCipher::VERSION`] before the
/// cipher ever sees it.
pub trait RecordCipher {
    /// Record family this cipher protects.
    const VERSION: ProtocolVersion;

    /// Encrypt `record`'s payload in place. The payload grows by [`TAG_LEN`].
    ///
    /// `seq` is the sender's sequence number for this record and must
    /// never repeat under the same key.
    fn seal(&self, record: &mut Record, seq: u32) -> Result<(), Error>;

    /// Decrypt and authenticate `record`'s payload in place.
    ///
    /// Fails with [`Error::AuthenticationFailure`] if the tag does not
    /// verify; the payload is left unspecified in that case.
    fn open(&self, record: &mut Record, seq: u32) -> Result<(), Error>;
}
