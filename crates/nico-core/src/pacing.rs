//! Character pacing for slow serial receivers
//!
//! The target's UART has almost no receive buffering, so every transmitted
//! character is followed by roughly the time it takes to clock out one
//! 8N1 frame (10 bit times) at the configured speed.

use std::time::Duration;

/// Bit times per transmitted character (start + 8 data + stop)
const BITS_PER_CHAR: u64 = 10;

/// Inter-character delay policy for a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pacing {
    speed: u32,
}

impl Pacing {
    /// No pacing (sockets and emulators)
    pub const NONE: Pacing = Pacing { speed: 0 };

    /// Pacing for a link running at `speed` bits per second (0 disables it)
    pub fn new(speed: u32) -> Self {
        Self { speed }
    }

    /// Configured link speed
    pub fn speed(&self) -> u32 {
        self.speed
    }

    /// Delay to insert after each character, if any
    pub fn char_delay(&self) -> Option<Duration> {
        if self.speed == 0 {
            return None;
        }
        Some(Duration::from_micros(
            BITS_PER_CHAR * 1_000_000 / self.speed as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_pacing_at_zero_speed() {
        assert_eq!(Pacing::new(0).char_delay(), None);
        assert_eq!(Pacing::NONE.char_delay(), None);
    }

    #[test]
    fn test_delay_is_ten_bit_times() {
        assert_eq!(
            Pacing::new(9600).char_delay(),
            Some(Duration::from_micros(1041))
        );
        assert_eq!(
            Pacing::new(57600).char_delay(),
            Some(Duration::from_micros(173))
        );
        assert_eq!(
            Pacing::new(115200).char_delay(),
            Some(Duration::from_micros(86))
        );
    }

    #[test]
    fn test_slower_links_wait_longer() {
        let slow = Pacing::new(1200).char_delay().unwrap();
        let fast = Pacing::new(38400).char_delay().unwrap();
        assert!(slow > fast);
    }
}
