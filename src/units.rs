use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A whole-second duration as configured by the user, e.g. the batch pause.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Clone, Copy)]
pub struct Seconds(u16);

impl Seconds {
    pub fn as_u64(&self) -> u64 {
        self.0 as u64
    }
}

impl Display for Seconds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for Seconds {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<Seconds> for u64 {
    fn from(value: Seconds) -> Self {
        value.0 as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0")]
    #[case(60, "60")]
    #[case(600, "600")]
    fn seconds_display(#[case] value: u16, #[case] expected: &str) {
        let actual = Seconds::from(value);
        assert_eq!(format!("{actual}"), expected);
    }
}
