//! Error handling foundation for the Roleypoly API.
//!
//! Only the `Result` alias lives here. Each crate defines its own domain
//! error enum and wraps it in a rootcause `Report` as it propagates.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_type_works() {
        let ok: Result<&str> = Ok("state");
        assert_eq!(ok.expect("should be ok"), "state");
    }
}
