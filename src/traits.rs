use crate::error::Result;
use crate::tools::ToolCommand;

/// Something that can carry out an external tool invocation.
pub trait ToolRunner {
    fn run(&mut self, command: &ToolCommand) -> Result<()>;

    /// Whether commands really execute. A runner that only records or prints them
    /// returns `false`, and callers must not expect any outputs to appear on disk.
    fn executes(&self) -> bool {
        true
    }
}
