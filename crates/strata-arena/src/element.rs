//! Fixed-width element encoding for typed stacks.

/// A value with a fixed little-endian byte encoding.
///
/// [`Stack<T>`](crate::stack::Stack) stores elements as `SIZE`-byte slots in
/// region memory. Implemented for the primitive integers and floats.
pub trait Element: Copy {
    /// Encoded width in bytes. Must be non-zero.
    const SIZE: usize;

    /// Write the encoding into `out` (exactly `SIZE` bytes).
    fn write_to(&self, out: &mut [u8]);

    /// Decode from `bytes` (exactly `SIZE` bytes).
    fn read_from(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($t:ty),* $(,)?) => {
        $(
            impl Element for $t {
                const SIZE: usize = std::mem::size_of::<$t>();

                fn write_to(&self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }

                fn read_from(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(bytes);
                    <$t>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_element!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, usize, isize, f32, f64);
