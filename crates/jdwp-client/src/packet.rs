use crate::codec::{DecodeJdwpDataError, JdwpDecodable, JdwpEncodable};
use crate::raw::packet::CommandData;

/// used for representing a JDWP command
pub trait JdwpCommand: JdwpEncodable {
    type Reply: JdwpDecodable<Err = DecodeJdwpDataError>;

    /// The dotted name used in log and error messages, e.g. `VirtualMachine.IDSizes`
    const NAME: &'static str;

    /// Commands the VM never answers are written and forgotten; everything else registers a
    /// pending reply before the packet goes out
    const EXPECTS_REPLY: bool = true;

    fn command_data() -> CommandData;
}
