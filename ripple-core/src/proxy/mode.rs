//! Proxy modes.

/// The four interception variants: mutable or readonly, deep or shallow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyMode {
    /// Tracks reads, notifies on writes, wraps nested objects.
    Mutable,
    /// Rejects writes, wraps nested objects as readonly.
    Readonly,
    /// Tracks and notifies on the first level only.
    ShallowMutable,
    /// Rejects writes on the first level, returns nested values as-is.
    ShallowReadonly,
}

impl ProxyMode {
    pub fn new(readonly: bool, shallow: bool) -> Self {
        match (readonly, shallow) {
            (false, false) => ProxyMode::Mutable,
            (true, false) => ProxyMode::Readonly,
            (false, true) => ProxyMode::ShallowMutable,
            (true, true) => ProxyMode::ShallowReadonly,
        }
    }

    pub fn is_readonly(self) -> bool {
        matches!(self, ProxyMode::Readonly | ProxyMode::ShallowReadonly)
    }

    pub fn is_shallow(self) -> bool {
        matches!(self, ProxyMode::ShallowMutable | ProxyMode::ShallowReadonly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_round_trip() {
        for readonly in [false, true] {
            for shallow in [false, true] {
                let mode = ProxyMode::new(readonly, shallow);
                assert_eq!(mode.is_readonly(), readonly);
                assert_eq!(mode.is_shallow(), shallow);
            }
        }
    }
}
