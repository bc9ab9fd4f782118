use std::io::{self, Read, Write};

/// Input stream for programs run without input: every read hits end of input.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

impl Read for NoInput {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }
}

/// Output stream for programs run without output: every write fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClosedOutput;

impl Write for ClosedOutput {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "write to closed output stream"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
