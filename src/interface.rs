//! Register transport seam

/// Single register read/write over whatever bus the board wires the chip to.
///
/// Addresses are 7 bit (0x00 to 0x7F), values are 8 bit. Implementations do
/// the bus framing (SPI read/write flag, chip select, USB tunneling, ...).
/// Failures are reported as-is; the driver never retries a transaction.
pub trait RegisterInterface {
    type Error;

    fn read_register(&mut self, addr: u8) -> Result<u8, Self::Error>;

    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), Self::Error>;
}

impl<T> RegisterInterface for &mut T
where
    T: RegisterInterface + ?Sized,
{
    type Error = T::Error;

    #[inline]
    fn read_register(&mut self, addr: u8) -> Result<u8, Self::Error> {
        T::read_register(self, addr)
    }

    #[inline]
    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), Self::Error> {
        T::write_register(self, addr, value)
    }
}
