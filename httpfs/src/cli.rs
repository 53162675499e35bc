//! Command-line surface: `httpfs [-t N] <port>`.
//!
//! Argument shape is deliberately small and maps directly onto the external
//! interface contract: a thread-pool size defaulting to 4, and a mandatory
//! port. Both are range-checked beyond what clap's type parsing alone gives
//! us, so a bad value always produces the same kind of diagnostic regardless
//! of which bound it violates.

use clap::Parser;

use crate::error::ArgsError;

/// Multi-threaded HTTP/1.1 file server.
#[derive(Debug, Parser)]
#[command(name = "httpfs", about = "A multi-threaded HTTP/1.1 GET/PUT file server")]
pub struct Args {
    /// Number of worker threads.
    #[arg(short = 't', long = "threads", default_value_t = 4)]
    pub threads: u32,

    /// TCP port to listen on.
    pub port: u32,
}

impl Args {
    /// Validates the parsed arguments against the bounds the contract
    /// requires, beyond what clap's integer parsing alone enforces.
    pub fn validate(&self) -> Result<(), ArgsError> {
        if self.threads < 1 {
            return Err(ArgsError::ThreadCount(self.threads));
        }
        if self.port < 1 || self.port > 65535 {
            return Err(ArgsError::Port(self.port));
        }
        Ok(())
    }

    #[must_use]
    pub fn port_u16(&self) -> u16 {
        self.port as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_threads() {
        let args = Args { threads: 0, port: 8080 };
        assert!(args.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_port() {
        let args = Args { threads: 4, port: 70000 };
        assert!(args.validate().is_err());
        let args = Args { threads: 4, port: 0 };
        assert!(args.validate().is_err());
    }

    #[test]
    fn accepts_defaults_with_valid_port() {
        let args = Args { threads: 4, port: 8080 };
        assert!(args.validate().is_ok());
        assert_eq!(args.port_u16(), 8080);
    }
}
