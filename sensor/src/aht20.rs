use embedded_hal::i2c::I2c;
use thermostat_common::Reading;
use thiserror::Error;

pub const AHT20_ADDRESS: u8 = 0x38;

const CMD_INITIALIZE: [u8; 3] = [0xBE, 0x08, 0x00];
const CMD_MEASURE: [u8; 3] = [0xAC, 0x33, 0x00];

/// 2^20, the full scale of both 20-bit raw channels.
const RAW_SCALE: f64 = 1_048_576.0;

#[derive(Debug, Error)]
pub enum Aht20Error<E> {
    #[error("aht20 bus transfer failed: {0:?}")]
    Bus(E),
    #[error("aht20 used before initialize()")]
    NotInitialized,
}

/// Blocking AHT20 driver. Measurement is split into trigger and read so the
/// caller decides how to spend the conversion time (at least 80 ms).
#[derive(Debug)]
pub struct Aht20<I> {
    i2c: I,
    initialized: bool,
    temperature: i32,
    humidity: i32,
}

impl<I: I2c> Aht20<I> {
    pub fn new(i2c: I) -> Self {
        Self {
            i2c,
            initialized: false,
            temperature: 0,
            humidity: 0,
        }
    }

    /// The device must have been powered for 20 ms before this is called.
    pub fn initialize(&mut self) -> Result<(), Aht20Error<I::Error>> {
        self.i2c
            .write(AHT20_ADDRESS, &CMD_INITIALIZE)
            .map_err(Aht20Error::Bus)?;
        self.initialized = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn start_measurement(&mut self) -> Result<(), Aht20Error<I::Error>> {
        if !self.initialized {
            return Err(Aht20Error::NotInitialized);
        }
        self.i2c
            .write(AHT20_ADDRESS, &CMD_MEASURE)
            .map_err(Aht20Error::Bus)
    }

    pub fn read_measurement(&mut self) -> Result<Reading, Aht20Error<I::Error>> {
        if !self.initialized {
            return Err(Aht20Error::NotInitialized);
        }
        let mut raw = [0_u8; 6];
        self.i2c
            .read(AHT20_ADDRESS, &mut raw)
            .map_err(Aht20Error::Bus)?;

        let reading = decode(&raw);
        self.temperature = reading.temperature;
        self.humidity = reading.humidity;
        Ok(reading)
    }

    /// Last decoded temperature, tenths of a degree Fahrenheit.
    pub fn get_temperature(&self) -> i32 {
        self.temperature
    }

    /// Last decoded relative humidity, percent.
    pub fn get_humidity(&self) -> i32 {
        self.humidity
    }

    pub fn release(self) -> I {
        self.i2c
    }
}

/// Converts a raw 6-byte frame (status, 20-bit humidity, 20-bit temperature)
/// into tenths of a degree Fahrenheit and whole percent. Both truncate.
pub fn decode(raw: &[u8; 6]) -> Reading {
    let humidity_raw =
        (u32::from(raw[1]) << 12) | (u32::from(raw[2]) << 4) | (u32::from(raw[3]) >> 4);
    let temperature_raw =
        ((u32::from(raw[3]) & 0x0F) << 16) | (u32::from(raw[4]) << 8) | u32::from(raw[5]);

    let humidity = (f64::from(humidity_raw) / RAW_SCALE * 100.0) as i32;

    let celsius = f64::from(temperature_raw) / RAW_SCALE * 200.0 - 50.0;
    let fahrenheit = celsius * 9.0 / 5.0 + 32.0;
    let temperature = (fahrenheit * 10.0) as i32;

    Reading {
        temperature,
        humidity,
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    use super::*;

    #[derive(Default)]
    struct FakeBus {
        writes: Vec<(u8, Vec<u8>)>,
        response: [u8; 6],
        fail: bool,
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err(ErrorKind::Other);
            }
            for operation in operations {
                match operation {
                    Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                    Operation::Read(buffer) => {
                        let len = buffer.len().min(self.response.len());
                        buffer[..len].copy_from_slice(&self.response[..len]);
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn decodes_reference_frame() {
        // humidity raw 0x80000 -> 50 %, temperature raw 0x60000 -> 25 C
        let reading = decode(&[0x1C, 0x80, 0x00, 0x06, 0x00, 0x00]);
        assert_eq!(reading.humidity, 50);
        assert_eq!(reading.temperature, 770);
    }

    #[test]
    fn decodes_scale_extremes() {
        let floor = decode(&[0x1C, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(floor.humidity, 0);
        assert_eq!(floor.temperature, -580);

        // temperature raw 0x40000 -> 0 C
        let freezing = decode(&[0x1C, 0x00, 0x00, 0x04, 0x00, 0x00]);
        assert_eq!(freezing.temperature, 320);
    }

    #[test]
    fn sends_command_sequences() {
        let mut sensor = Aht20::new(FakeBus::default());
        sensor.initialize().unwrap();
        sensor.start_measurement().unwrap();

        let bus = sensor.release();
        assert_eq!(
            bus.writes,
            vec![
                (AHT20_ADDRESS, vec![0xBE, 0x08, 0x00]),
                (AHT20_ADDRESS, vec![0xAC, 0x33, 0x00]),
            ]
        );
    }

    #[test]
    fn read_updates_last_values() {
        let bus = FakeBus {
            response: [0x1C, 0x80, 0x00, 0x06, 0x00, 0x00],
            ..FakeBus::default()
        };
        let mut sensor = Aht20::new(bus);
        sensor.initialize().unwrap();
        sensor.read_measurement().unwrap();

        assert_eq!(sensor.get_temperature(), 770);
        assert_eq!(sensor.get_humidity(), 50);
    }

    #[test]
    fn measurement_before_initialize_is_refused() {
        let mut sensor = Aht20::new(FakeBus::default());
        assert!(matches!(
            sensor.start_measurement(),
            Err(Aht20Error::NotInitialized)
        ));
        assert!(sensor.release().writes.is_empty());
    }

    #[test]
    fn bus_failure_is_reported() {
        let bus = FakeBus {
            fail: true,
            ..FakeBus::default()
        };
        let mut sensor = Aht20::new(bus);
        assert!(matches!(
            sensor.initialize(),
            Err(Aht20Error::Bus(ErrorKind::Other))
        ));
        assert!(!sensor.is_initialized());
    }
}
