use crate::config::ClockConfig;
use crate::popup::PanelGeometry;
use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Timelike, Weekday};
use qmpanel_types::{Rect, Size};
use std::fmt::{self, Write};
use std::time::Duration;
use tracing::warn;

const FALLBACK_FORMAT: &str = "%H:%M";

/// Specifiers whose output changes every second.
const SECOND_SPECIFIERS: &[&str] = &["%S", "%T", "%X", "%r", "%s", "%+", "%c"];

/// Panel clock text plus its calendar popup.
#[derive(Debug, Clone)]
pub struct Clock {
    format: String,
    first_weekday: Weekday,
    text: String,
    calendar: Option<Calendar>,
    anchor: Rect,
}

impl Clock {
    #[must_use]
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            format: config.format.clone(),
            first_weekday: config.first_weekday.into(),
            text: String::new(),
            calendar: None,
            anchor: Rect::default(),
        }
    }

    pub fn set_config(&mut self, config: &ClockConfig) {
        config.format.clone_into(&mut self.format);
        self.first_weekday = config.first_weekday.into();
        if let Some(calendar) = &mut self.calendar {
            calendar.first_weekday = self.first_weekday;
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Reformat for `now`. Returns whether the text changed.
    pub fn tick<Tz>(&mut self, now: &DateTime<Tz>) -> bool
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let text = match format_time(now, &self.format) {
            Ok(text) => text,
            Err(fmt::Error) => {
                warn!(
                    "Invalid clock format {:?}, using {}",
                    self.format, FALLBACK_FORMAT
                );
                FALLBACK_FORMAT.clone_into(&mut self.format);
                format_time(now, FALLBACK_FORMAT).unwrap_or_default()
            }
        };

        if text == self.text {
            return false;
        }
        self.text = text;
        true
    }

    #[must_use]
    pub fn shows_seconds(&self) -> bool {
        SECOND_SPECIFIERS.iter().any(|s| self.format.contains(s))
    }

    /// Delay until the displayed text can next change.
    #[must_use]
    pub fn next_refresh<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Duration {
        let into_second = Duration::from_nanos(u64::from(now.nanosecond() % 1_000_000_000));
        let to_second = Duration::from_secs(1).saturating_sub(into_second);

        if self.shows_seconds() {
            return to_second;
        }

        let remaining_seconds = 59 - u64::from(now.second().min(59));
        to_second + Duration::from_secs(remaining_seconds)
    }

    #[must_use]
    pub fn calendar(&self) -> Option<&Calendar> {
        self.calendar.as_ref()
    }

    #[must_use]
    pub fn is_calendar_open(&self) -> bool {
        self.calendar.is_some()
    }

    /// Open the calendar on `today`'s month, or close it when open.
    /// Returns the popup rectangle when it was opened.
    pub fn toggle_calendar(
        &mut self,
        today: NaiveDate,
        anchor: Rect,
        geometry: &PanelGeometry,
    ) -> Option<Rect> {
        if self.calendar.take().is_some() {
            return None;
        }
        let calendar = Calendar::new(today, self.first_weekday);
        self.anchor = anchor;
        let rect = geometry.popup_rect(anchor, calendar.preferred_size());
        self.calendar = Some(calendar);
        Some(rect)
    }

    pub fn close_calendar(&mut self) -> bool {
        self.calendar.take().is_some()
    }

    /// Placement of the open calendar.
    #[must_use]
    pub fn calendar_rect(&self, geometry: &PanelGeometry) -> Option<Rect> {
        self.calendar
            .as_ref()
            .map(|c| geometry.popup_rect(self.anchor, c.preferred_size()))
    }

    pub fn calendar_mut(&mut self) -> Option<&mut Calendar> {
        self.calendar.as_mut()
    }
}

fn format_time<Tz>(now: &DateTime<Tz>, format: &str) -> Result<String, fmt::Error>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut text = String::new();
    write!(text, "{}", now.format(format))?;
    Ok(text)
}

/// Month grid shown by the clock popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    /// First day of the displayed month
    first: NaiveDate,
    today: NaiveDate,
    first_weekday: Weekday,
}

impl Calendar {
    #[must_use]
    pub fn new(today: NaiveDate, first_weekday: Weekday) -> Self {
        Self {
            first: today.with_day(1).unwrap_or(today),
            today,
            first_weekday,
        }
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.first.year()
    }

    #[must_use]
    pub fn month(&self) -> u32 {
        self.first.month()
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.first.format("%B %Y").to_string()
    }

    /// Two-letter weekday names starting at the configured first weekday.
    #[must_use]
    pub fn weekday_header(&self) -> Vec<String> {
        let mut day = self.first_weekday;
        (0..7)
            .map(|_| {
                let name: String = day.to_string().chars().take(2).collect();
                day = day.succ();
                name
            })
            .collect()
    }

    /// Day numbers laid out in week rows; `None` pads the first and last week.
    #[must_use]
    pub fn weeks(&self) -> Vec<[Option<u32>; 7]> {
        let offset = (self.first.weekday().num_days_from_monday() + 7
            - self.first_weekday.num_days_from_monday())
            % 7;

        let mut weeks = Vec::new();
        let mut week = [None; 7];
        let mut column = offset as usize;

        for day in 1..=self.days_in_month() {
            week[column] = Some(day);
            column += 1;
            if column == 7 {
                weeks.push(week);
                week = [None; 7];
                column = 0;
            }
        }
        if column != 0 {
            weeks.push(week);
        }
        weeks
    }

    fn days_in_month(&self) -> u32 {
        self.first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .map_or(31, |last| last.day())
    }

    #[must_use]
    pub fn is_today(&self, day: u32) -> bool {
        self.today.year() == self.year() && self.today.month() == self.month() && self.today.day() == day
    }

    pub fn prev_month(&mut self) {
        if let Some(prev) = self.first.checked_sub_months(Months::new(1)) {
            self.first = prev;
        }
    }

    pub fn next_month(&mut self) {
        if let Some(next) = self.first.checked_add_months(Months::new(1)) {
            self.first = next;
        }
    }

    /// Title, weekday header and six week rows inside a frame.
    #[must_use]
    pub fn preferred_size(&self) -> Size {
        Size::new(7 * 3 + 1 + 2, 2 + 6 + 2)
    }
}
