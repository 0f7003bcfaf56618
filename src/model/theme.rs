use chrono::{NaiveTime, Timelike};

/// Palette picked from the local time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Warm,
    Day,
}

impl ThemeMode {
    pub fn for_time(time: NaiveTime) -> Self {
        let minutes = time.hour() * 60 + time.minute();
        let at = |h: u32, m: u32| h * 60 + m;

        if minutes >= at(18, 30) || minutes <= at(5, 30) {
            ThemeMode::Dark
        } else if (at(5, 31)..=at(7, 0)).contains(&minutes)
            || (at(16, 31)..=at(18, 29)).contains(&minutes)
        {
            ThemeMode::Warm
        } else {
            ThemeMode::Day
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThemeMode::Dark => "Dark",
            ThemeMode::Warm => "Warm",
            ThemeMode::Day => "Day",
        }
    }

    pub fn is_dark(self) -> bool {
        self == ThemeMode::Dark
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_theme_boundaries() {
        assert_eq!(ThemeMode::for_time(at(0, 0)), ThemeMode::Dark);
        assert_eq!(ThemeMode::for_time(at(5, 30)), ThemeMode::Dark);
        assert_eq!(ThemeMode::for_time(at(5, 31)), ThemeMode::Warm);
        assert_eq!(ThemeMode::for_time(at(7, 0)), ThemeMode::Warm);
        assert_eq!(ThemeMode::for_time(at(7, 1)), ThemeMode::Day);
        assert_eq!(ThemeMode::for_time(at(16, 30)), ThemeMode::Day);
        assert_eq!(ThemeMode::for_time(at(16, 31)), ThemeMode::Warm);
        assert_eq!(ThemeMode::for_time(at(18, 29)), ThemeMode::Warm);
        assert_eq!(ThemeMode::for_time(at(18, 30)), ThemeMode::Dark);
    }

    #[test]
    fn test_only_dark_uses_dark_visuals() {
        assert!(ThemeMode::Dark.is_dark());
        assert!(!ThemeMode::Warm.is_dark());
        assert_eq!(ThemeMode::Day.label(), "Day");
    }
}
