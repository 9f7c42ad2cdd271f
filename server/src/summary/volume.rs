use std::collections::VecDeque;

const HOUR_MS: u64 = 3_600_000;

/// Volume readings of one series, trimmed to what it takes to look an hour back.
#[derive(Debug, Default, Clone)]
pub struct VolumeHistory {
    readings: VecDeque<(u64, f64)>,
}

impl VolumeHistory {
    /// Records a reading and returns the one taken about an hour earlier.
    /// Until an hour of readings exists, the oldest one stands in.
    pub fn record(&mut self, observed_at: u64, volume: f64) -> f64 {
        self.readings.push_back((observed_at, volume));

        // keep the newest reading that is at least an hour old at the front
        while let Some(&(next_at, _)) = self.readings.get(1) {
            if observed_at.saturating_sub(next_at) < HOUR_MS {
                break;
            }
            self.readings.pop_front();
        }

        self.readings
            .front()
            .map(|&(_, past)| past)
            .unwrap_or(volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: u64 = 60_000;

    #[test]
    fn first_reading_is_its_own_past() {
        let mut history = VolumeHistory::default();
        assert_eq!(history.record(0, 50.0), 50.0);
    }

    #[test]
    fn oldest_reading_stands_in_for_the_first_hour() {
        let mut history = VolumeHistory::default();

        history.record(0, 10.0);
        history.record(30 * MIN, 20.0);

        assert_eq!(history.record(59 * MIN, 30.0), 10.0);
    }

    #[test]
    fn looks_back_one_hour_once_enough_readings_exist() {
        let mut history = VolumeHistory::default();

        for (minute, volume) in [(0, 10.0), (30, 20.0), (60, 30.0), (90, 40.0)] {
            history.record(minute * MIN, volume);
        }

        assert_eq!(history.record(120 * MIN, 50.0), 30.0);
        assert_eq!(history.readings.len(), 3);
    }
}
