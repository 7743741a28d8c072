use std::sync::{Arc, Mutex};

use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, Operation};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("i2c transfer to {address:#04x} failed: {kind:?}")]
    Transfer { address: u8, kind: ErrorKind },
    #[error("i2c bus lock poisoned")]
    Poisoned,
}

impl i2c::Error for BusError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Transfer { kind, .. } => *kind,
            Self::Poisoned => ErrorKind::Other,
        }
    }
}

/// Single owner of the physical I2C bus. Clones are handles onto the same
/// bus; each transaction holds the lock from first byte to last, so the
/// sensor and display drivers never interleave on the wire.
#[derive(Debug)]
pub struct SharedBus<I> {
    inner: Arc<Mutex<I>>,
}

impl<I> Clone for SharedBus<I> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<I: I2c> SharedBus<I> {
    pub fn new(i2c: I) -> Self {
        Self {
            inner: Arc::new(Mutex::new(i2c)),
        }
    }
}

impl<I: I2c> ErrorType for SharedBus<I> {
    type Error = BusError;
}

impl<I: I2c> I2c for SharedBus<I> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut bus = self.inner.lock().map_err(|_| BusError::Poisoned)?;
        bus.transaction(address, operations)
            .map_err(|err| BusError::Transfer {
                address,
                kind: i2c::Error::kind(&err),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use embedded_hal::i2c::NoAcknowledgeSource;

    use super::*;

    #[derive(Default)]
    struct CountingBus {
        transactions: u32,
    }

    impl ErrorType for CountingBus {
        type Error = ErrorKind;
    }

    impl I2c for CountingBus {
        fn transaction(
            &mut self,
            address: u8,
            _operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if address == 0x7F {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            self.transactions += 1;
            Ok(())
        }
    }

    #[test]
    fn handles_share_one_bus() {
        let bus = SharedBus::new(CountingBus::default());
        let workers: Vec<_> = (0..4)
            .map(|n| {
                let mut handle = bus.clone();
                thread::spawn(move || {
                    for _ in 0..250 {
                        handle.write(0x38 + n, &[0xAC, 0x33, 0x00]).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(bus.inner.lock().unwrap().transactions, 1_000);
    }

    #[test]
    fn transfer_failure_names_the_address() {
        let mut bus = SharedBus::new(CountingBus::default());
        let err = bus.write(0x7F, &[0x00]).unwrap_err();
        assert_eq!(
            err,
            BusError::Transfer {
                address: 0x7F,
                kind: ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            }
        );
    }

    #[test]
    fn poisoned_lock_is_reported() {
        let bus = SharedBus::new(CountingBus::default());
        let poisoner = bus.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.inner.lock().unwrap();
            panic!("holder died mid-transfer");
        })
        .join();

        let mut handle = bus.clone();
        assert_eq!(handle.write(0x38, &[0x00]), Err(BusError::Poisoned));
    }
}
