use embassy_time::Duration;

/// A macro to implement the `From` trait for a specified enum variant.
///
/// Handy for driver error types which do not implement `core::error::Error` and therefore
/// cannot be wrapped with `thiserror`'s `#[from]`.
///
/// # Parameters
/// - `$dst_enum`: The destination enum type for which the `From` implementation is generated.
/// - `$variant`: The variant of the enum that will wrap the payload.
/// - `$payload`: The type that the specified enum variant will wrap.
///
/// # Examples
///
/// ```
/// use world_clock::impl_from_variant;
///
/// #[derive(Debug)]
/// struct BusFault;
///
/// #[derive(Debug)]
/// enum ScreenError {
///     Bus(BusFault),
/// }
///
/// impl_from_variant!(ScreenError, Bus, BusFault);
///
/// let err: ScreenError = BusFault.into();
/// assert!(matches!(err, ScreenError::Bus(_)));
/// ```
#[macro_export]
macro_rules! impl_from_variant {
    ($dst_enum:ident, $variant:ident, $payload:ty) => {
        impl From<$payload> for $dst_enum {
            fn from(value: $payload) -> Self {
                Self::$variant(value)
            }
        }
    };
}

// When you are okay with using a nightly compiler it's better to use https://docs.rs/static_cell/2.1.0/static_cell/macro.make_static.html
#[macro_export]
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write(($val));
        x
    }};
}

/// Milliseconds of `duration`, saturated to what `DelayNs::delay_ms` accepts.
pub fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_saturates() {
        assert_eq!(millis(Duration::from_secs(2)), 2_000);
        assert_eq!(millis(Duration::from_secs(u64::from(u32::MAX))), u32::MAX);
    }
}
