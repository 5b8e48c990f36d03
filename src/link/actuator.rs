// Actuator output: one ASCII byte per command, no acknowledgment

use std::io::{self, Write};

use crate::control::Command;

/// Destination for actuator commands
pub trait CommandSink {
    fn send(&mut self, command: Command) -> io::Result<()>;
}

/// Writes each command as its wire byte and flushes immediately
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> CommandSink for WriterSink<W> {
    fn send(&mut self, command: Command) -> io::Result<()> {
        self.writer.write_all(&[command.as_byte()])?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_single_bytes() {
        let mut sink = WriterSink::new(Vec::new());
        sink.send(Command::Move).unwrap();
        sink.send(Command::Stop).unwrap();
        assert_eq!(sink.into_inner(), b"FS".to_vec());
    }
}
