//! CSI parameter accumulation

use heapless::Vec;

/// Maximum number of parameters kept per control sequence
///
/// Further parameters are parsed but dropped; [`Params::dropped`] counts
/// them.
pub const MAX_PARAMS: usize = 16;

/// Parameters of the control sequence being parsed
///
/// Each slot is either explicitly given (`Some`) or absent (`None`);
/// [`Params::fill_defaults`] turns absent slots into the command's defaults
/// before dispatch.
#[derive(Debug, Clone, Default)]
pub struct Params {
    slots: Vec<Option<u32>, MAX_PARAMS>,
    pending: Option<u32>,
    dropped: usize,
}

impl Params {
    /// Create an empty parameter list
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all parameters and any digits in progress
    pub fn clear(&mut self) {
        self.slots.clear();
        self.pending = None;
        self.dropped = 0;
    }

    /// Accumulate one decimal digit (0..=9) into the current parameter
    pub fn push_digit(&mut self, digit: u8) {
        let value = self.pending.unwrap_or(0);
        self.pending = Some(value.saturating_mul(10).saturating_add(digit as u32));
    }

    /// Whether digits have been read for the current parameter
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// End the current parameter
    ///
    /// Without digits the parameter is recorded as absent.
    pub fn terminate(&mut self) {
        let value = self.pending.take();
        if self.slots.push(value).is_err() {
            self.dropped += 1;
        }
    }

    /// Fill absent leading slots with `defaults`
    pub fn fill_defaults(&mut self, defaults: &[u32]) {
        for (i, &default) in defaults.iter().enumerate() {
            match self.slots.get_mut(i) {
                Some(slot @ None) => *slot = Some(default),
                Some(Some(_)) => {}
                None => {
                    let _ = self.slots.push(Some(default));
                }
            }
        }
    }

    /// Value of slot `index`, 0 if absent
    pub fn get(&self, index: usize) -> u32 {
        self.slots.get(index).copied().flatten().unwrap_or(0)
    }

    /// Number of slots recorded (given or absent)
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slots were recorded
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Parameters that did not fit
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Explicitly given values, in sequence order
    pub fn given(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots.iter().filter_map(|slot| *slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Params {
        let mut params = Params::new();
        for b in s.bytes() {
            if b == b';' {
                params.terminate();
            } else {
                params.push_digit(b - b'0');
            }
        }
        if params.has_pending() {
            params.terminate();
        }
        params
    }

    #[test]
    fn test_digits_and_separators() {
        let params = parse("5;10");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get(0), 5);
        assert_eq!(params.get(1), 10);
    }

    #[test]
    fn test_empty_parameter_is_absent() {
        let mut params = parse(";7");
        assert_eq!(params.len(), 2);
        assert_eq!(params.given().collect::<std::vec::Vec<_>>(), [7]);

        params.fill_defaults(&[1, 1]);
        assert_eq!(params.get(0), 1);
        assert_eq!(params.get(1), 7);
    }

    #[test]
    fn test_defaults_extend_missing_slots() {
        let mut params = Params::new();
        params.fill_defaults(&[1, 1]);
        assert_eq!(params.len(), 2);
        assert_eq!(params.get(0), 1);
        assert_eq!(params.get(1), 1);
    }

    #[test]
    fn test_explicit_zero_is_kept() {
        let mut params = parse("0");
        params.fill_defaults(&[6]);
        assert_eq!(params.get(0), 0);
    }

    #[test]
    fn test_overflow_saturates() {
        let params = parse("99999999999999");
        assert_eq!(params.get(0), u32::MAX);
    }

    #[test]
    fn test_excess_parameters_are_dropped() {
        let text = vec!["1"; MAX_PARAMS + 4].join(";");
        let params = parse(&text);
        assert_eq!(params.len(), MAX_PARAMS);
        assert_eq!(params.dropped(), 4);
        assert_eq!(params.get(MAX_PARAMS - 1), 1);
    }

    #[test]
    fn test_clear() {
        let mut params = parse("1;2");
        params.push_digit(3);
        params.clear();
        assert!(params.is_empty());
        assert_eq!(params.dropped(), 0);
        assert!(!params.has_pending());
    }
}
