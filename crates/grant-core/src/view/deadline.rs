use chrono::NaiveDate;

/// Calendar days from `today` until `deadline`; negative once it has passed.
#[must_use]
pub fn days_until(deadline: NaiveDate, today: NaiveDate) -> i64 {
    (deadline - today).num_days()
}

/// Countdown text for the header, `None` when no deadline is set.
#[must_use]
pub fn deadline_message(deadline: Option<NaiveDate>, today: NaiveDate) -> Option<String> {
    let days = days_until(deadline?, today);
    let text = match days {
        d if d > 1 => format!("{d} days remaining"),
        1 => "Due tomorrow".to_string(),
        0 => "Due today".to_string(),
        d => format!("{} days past due", d.abs()),
    };
    Some(text)
}
